use saju_calendar::FourPillarChart;
use serde::{Deserialize, Serialize};

/// Persona voice profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Display name (e.g., "청룡 도사")
    pub display_name_kr: String,

    /// Internal persona name
    pub internal_name: String,

    pub tone_identity: String,

    pub base_tone: String,

    pub speech_rules: SpeechRules,

    #[serde(default)]
    pub forbiddens: Forbiddens,

    #[serde(default)]
    pub signature_lines_pool: Vec<String>,

    /// Opening lines, one is picked per report
    pub opener_variants: Vec<String>,

    /// Preferred metaphor palette key from the variation rules
    pub metaphor_palette: String,

    #[serde(default)]
    pub cta: String,
}

/// Sentence ending and addressing rules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechRules {
    #[serde(default)]
    pub basic_endings: Vec<String>,

    #[serde(default)]
    pub variation_endings: Vec<String>,

    /// How the reader is addressed
    #[serde(default)]
    pub second_person: String,

    #[serde(default)]
    pub second_person_variations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Forbiddens {
    #[serde(default)]
    pub words: Vec<String>,

    #[serde(default)]
    pub styles: Vec<String>,
}

/// One choice on a lever
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeverChoice {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Global definition of one lever
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    pub choices: Vec<LeverChoice>,
    #[serde(default)]
    pub instruction: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Levers {
    pub metaphor_palette: LeverDefinition,
    pub emphasis_axis: LeverDefinition,
    pub sentence_rhythm: LeverDefinition,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyRules {
    #[serde(default)]
    pub forbidden_phrases: Vec<String>,
    #[serde(default)]
    pub required_hedges: Vec<String>,
    #[serde(default)]
    pub money_investing_disclaimer_required: bool,
    #[serde(default)]
    pub mental_health_disclaimer_required: bool,
}

/// Global lever table (`variation_rules.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationRules {
    #[serde(default)]
    pub schema_version: String,
    pub levers: Levers,
    #[serde(default)]
    pub safety_and_claims: SafetyRules,
}

/// Trait keywords per pillar, used in the user context block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SajuTraits {
    #[serde(default)]
    pub day: Vec<String>,
    #[serde(default)]
    pub month: Vec<String>,
    #[serde(default)]
    pub hour: Vec<String>,
}

/// Everything the prompt layer knows about one report request.
/// The only seed material for lever selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptBuilderInput {
    pub persona_id: String,
    pub question_id: String,
    /// User or guest id
    pub subject_id: String,
    /// Purchase count or session counter
    pub counter: u64,
    /// YYYY-MM-DD
    pub date: String,
    pub question_text: String,
    #[serde(default)]
    pub concern_text: Option<String>,
    #[serde(default)]
    pub subject_name: Option<String>,
    pub chart: FourPillarChart,
    #[serde(default)]
    pub traits: SajuTraits,
}

/// Levers chosen once per report and reused for every section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeverSelection {
    pub opener_variant: LeverChoice,
    pub metaphor_palette: LeverChoice,
    /// Primary (from the concern text) then secondary
    pub emphasis_axis: [LeverChoice; 2],
    pub sentence_rhythm: LeverChoice,
    /// Hex seed the selection was derived from
    pub seed: String,
}
