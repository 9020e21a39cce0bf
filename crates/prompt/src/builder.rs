//! Section prompt assembly

use saju_common::Result;
use serde::Serialize;
use std::sync::Arc;

use crate::catalog::PromptCatalog;
use crate::contract::{ReportContract, SectionDefinition};
use crate::payload::enrich_chart;
use crate::types::{LeverSelection, PromptBuilderInput, VoiceProfile};

/// Characters of the previous attempt quoted in a repair prompt
const REPAIR_SNIPPET_CHARS: usize = 1000;

/// Section definition with its generation instructions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedSection {
    pub id: u32,
    pub title: String,
    pub min_chars: usize,
    pub max_chars: usize,
    pub marker: String,
    pub closing_marker: String,
    pub description: String,
    pub must_include_data: bool,
    pub instructions: Vec<String>,
}

impl ExtendedSection {
    fn from_definition(section: &SectionDefinition) -> Self {
        let mut instructions = vec![
            format!("Write Section {} using marker {}", section.id, section.marker),
            format!("Minimum {} characters (no spaces).", section.min_chars),
        ];
        if section.must_include_data {
            instructions.push(
                "MUST include specific Saju evidence (Han-ja + Korean) provided in the context."
                    .to_string(),
            );
        }

        Self {
            id: section.id,
            title: section.title.clone(),
            min_chars: section.min_chars,
            max_chars: section.min_chars + 1000,
            marker: section.marker.clone(),
            closing_marker: section.closing_marker(),
            description: section.role.clone(),
            must_include_data: section.must_include_data,
            instructions,
        }
    }
}

/// Builds generation prompts. Holds only read-only tables; every call is
/// independent and continuity comes from the `prior_text` argument.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    catalog: Arc<PromptCatalog>,
    contract: Arc<ReportContract>,
    sections: Vec<ExtendedSection>,
}

impl PromptBuilder {
    pub fn new(catalog: Arc<PromptCatalog>, contract: Arc<ReportContract>) -> Self {
        let sections = contract
            .sections
            .iter()
            .map(ExtendedSection::from_definition)
            .collect();
        Self {
            catalog,
            contract,
            sections,
        }
    }

    pub fn catalog(&self) -> &PromptCatalog {
        &self.catalog
    }

    pub fn contract(&self) -> &ReportContract {
        &self.contract
    }

    /// Sections in contract order
    pub fn sections(&self) -> &[ExtendedSection] {
        &self.sections
    }

    /// Prompt for one section.
    ///
    /// `prior_text` is the report generated so far (empty for the first
    /// section, and for every section in parallel mode).
    pub fn build_section_prompt(
        &self,
        input: &PromptBuilderInput,
        levers: &LeverSelection,
        section: &ExtendedSection,
        prior_text: &str,
    ) -> Result<String> {
        let (_, profile) = self.catalog.profile(&input.persona_id)?;
        let is_first = self
            .sections
            .first()
            .map(|s| s.marker == section.marker)
            .unwrap_or(false);

        let mut prompt = String::new();
        prompt.push_str(&format!(
            "\n[SYSTEM_META]\n\
             Target_Persona: {} ({})\n\
             Tone_Identity: {}\n\
             Task_Type: Creative Writing / Roleplay (Deep Analysis)\n\
             Language: Korean (Natural, immersive, Webtoon/Essay style)\n\
             Current_Section: [{}] {}\n\
             Target_Length: {} ~ {} characters (MUST BE LONG AND DETAILED)\n",
            profile.display_name_kr,
            profile.internal_name,
            profile.tone_identity,
            section.id,
            section.title,
            section.min_chars,
            section.max_chars
        ));
        prompt.push_str(&voice_block(profile, input.subject_name.as_deref()));
        prompt.push_str(&levers_block(levers, is_first));
        prompt.push_str(&self.safety_block());
        prompt.push_str(&context_block(input)?);

        prompt.push_str(&format!(
            "\n[IMMUTABLE_CONTRACT]\n\
             1. OUTPUT STRUCTURE: You must output ONLY the content for the requested section.\n\
             2. LENGTH: Total report must be {}+ chars. This section MUST be at least {} chars long.\n\
             3. FORMAT:\n   \
                - Narrative flow (Webtoon Scroll style).\n   \
                - NO bullet points (\"- \", \"1.\").\n   \
                - NO numbered lists.\n   \
                - Prefer natural paragraph breaks.\n\
             4. TONE:\n   \
                - Use \"{}\".\n   \
                - Avoid repetitive endings like \"~다.\" or \"~입니다.\". Use diverse endings (~군, ~네, ~지, ~구나).\n\
             5. MARKERS: Start the text with {} and end with {}.\n",
            self.contract.total_min_chars_no_space,
            section.min_chars,
            profile.base_tone,
            section.marker,
            section.closing_marker
        ));

        if prior_text.trim().is_empty() {
            prompt.push_str("\n[START OF REPORT]\n");
        } else {
            prompt.push_str(&format!(
                "\n[PREVIOUS_SECTIONS_CONTENT (For Context Continuity)]\n{}\n\
                 (End of previous context. Continue naturally from here.)\n",
                prior_text
            ));
        }

        let rules = section
            .instructions
            .iter()
            .map(|r| format!("- {}", r))
            .collect::<Vec<_>>()
            .join("\n");
        prompt.push_str(&format!(
            "\n[SECTION_INSTRUCTION]\n\
             You are writing Section [{id}] \"{title}\" of a long-form Saju report.\n\
             Role: {role}\n\
             Goal: Write a deep, immersive analysis specifically for this section.\n\n\
             Specific Rules for this Section:\n{rules}\n\n\
             [WRITING_RULES]\n\
             1. **Length Requirement**: You MUST write at least {min} characters for this section alone.\n\
             2. **Style**: Use the Persona's voice. Do not sound like a generic AI.\n\
             3. **Continuity**: Connect naturally with the previous sections. Do not repeat the same introductions.\n\
             4. **Format**: Output purely the text for this section. Do NOT output JSON.\n\n\
             NOW, WRITE SECTION {id} ONLY.\n",
            id = section.id,
            title = section.title,
            role = section.description,
            rules = rules,
            min = section.min_chars
        ));

        Ok(prompt)
    }

    /// Single-shot prompt for the whole report
    pub fn build_full_report_prompt(
        &self,
        input: &PromptBuilderInput,
        levers: &LeverSelection,
    ) -> Result<String> {
        let (_, profile) = self.catalog.profile(&input.persona_id)?;

        let mut prompt = String::new();
        prompt.push_str(&format!(
            "\n[SYSTEM_META]\n\
             Target_Persona: {} ({})\n\
             Tone_Identity: {}\n\
             Language: Korean (Natural, immersive, Webtoon/Essay style)\n",
            profile.display_name_kr, profile.internal_name, profile.tone_identity
        ));
        prompt.push_str(&voice_block(profile, input.subject_name.as_deref()));
        prompt.push_str(&levers_block(levers, true));
        prompt.push_str(&self.safety_block());
        prompt.push_str(&context_block(input)?);

        let markers = self.contract.section_markers.join(", ");
        prompt.push_str(&format!(
            "\n[IMMUTABLE_CONTRACT]\n\
             1. LENGTH: Total report must be {}+ chars, every section at least {} chars.\n\
             2. FORMAT: Narrative flow. NO bullet points, NO numbered lists.\n\
             3. SECTIONS: You must include all {} sections marked by {}.\n",
            self.contract.total_min_chars_no_space,
            self.contract.section_min_chars_no_space,
            self.sections.len(),
            markers
        ));

        prompt.push_str("\n[SECTION_INSTRUCTIONS]\n");
        for section in &self.sections {
            prompt.push_str(&format!(
                "\n{} {}\n- Role: {}\n- Min Length: {} chars\n",
                section.marker, section.title, section.description, section.min_chars
            ));
            if section.must_include_data {
                prompt.push_str("- MUST include Saju evidence (Han-ja + Korean).\n");
            }
        }

        let first = self
            .sections
            .first()
            .map(|s| s.marker.as_str())
            .unwrap_or_default();
        prompt.push_str(&format!("\nWrite the full report now. Start with {}.\n", first));
        Ok(prompt)
    }

    /// Repair instruction after a failed validation pass
    pub fn build_repair_prompt(&self, errors: &[String], previous_text: &str) -> String {
        let error_list = errors
            .iter()
            .map(|e| format!("- {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "\n[SYSTEM_REPAIR_MODE]\n\
             The previous generation failed validation checks.\n\
             ERRORS:\n{}\n\n\
             TASK:\n\
             Regenerate the content.\n\
             1. FIX the errors listed above.\n\
             2. MAINTAIN the original Persona and Tone.\n\
             3. EXTEND the content if length was insufficient (Target: {}+ chars).\n\
             4. REMOVE any bullet points or numbered lists.\n\
             5. ENSURE the structure follows the contract ({} markers).\n\n\
             [PREVIOUS_ATTEMPT (For Reference)]\n{}... (truncated)\n\n\
             [RE-GENERATE NOW]\n",
            error_list,
            self.contract.total_min_chars_no_space,
            self.contract.section_markers.join(" "),
            truncate_chars(previous_text, REPAIR_SNIPPET_CHARS)
        )
    }

    fn safety_block(&self) -> String {
        let safety = &self.catalog.rules().safety_and_claims;
        let mut block = String::from("\n[SAFETY_GUIDELINES]\n- No medical/legal/financial advice.\n");
        if !safety.required_hedges.is_empty() {
            block.push_str(&format!("- Use hedges: {}\n", safety.required_hedges.join(", ")));
        }
        if !safety.forbidden_phrases.is_empty() {
            block.push_str(&format!(
                "- Never write: {}\n",
                safety.forbidden_phrases.join(", ")
            ));
        }
        if safety.money_investing_disclaimer_required {
            block.push_str("- When money or investing comes up, add a short disclaimer that this is not financial advice.\n");
        }
        if safety.mental_health_disclaimer_required {
            block.push_str("- When mental health comes up, gently suggest talking to a professional.\n");
        }
        block
    }
}

fn voice_block(profile: &VoiceProfile, subject_name: Option<&str>) -> String {
    let rules = &profile.speech_rules;
    let mut block = format!(
        "\n[VOICE_PROFILE]\n\
         Base_Tone: {}\n\
         Speech_Rules:\n\
         - Basic Endings: {}\n\
         - Variation Endings: {}\n",
        profile.base_tone,
        rules.basic_endings.join(", "),
        rules.variation_endings.join(", ")
    );

    match subject_name.filter(|n| !n.trim().is_empty()) {
        Some(name) => block.push_str(&format!(
            "- Addressing: always by name, \"{}\" or \"{} 님\"\n",
            name, name
        )),
        None => block.push_str(&format!("- Addressing: \"{}\"\n", rules.second_person)),
    }

    block.push_str(&format!(
        "- Forbidden Words: {}\n- Forbidden Styles: {}\n",
        profile.forbiddens.words.join(", "),
        profile.forbiddens.styles.join(", ")
    ));
    if !profile.signature_lines_pool.is_empty() {
        block.push_str(&format!(
            "- Signature Lines (use at most one): {}\n",
            profile.signature_lines_pool.join(" / ")
        ));
    }
    block
}

fn levers_block(levers: &LeverSelection, include_opener: bool) -> String {
    let mut block = format!(
        "\n[VARIATION_LEVERS]\n\
         1. Metaphor: {} (\"{}\")\n\
         2. Emphasis: {} & {}\n\
         3. Rhythm: {} (\"{}\")\n",
        levers.metaphor_palette.label,
        levers.metaphor_palette.instruction,
        levers.emphasis_axis[0].label,
        levers.emphasis_axis[1].label,
        levers.sentence_rhythm.label,
        levers.sentence_rhythm.instruction
    );
    if include_opener {
        block.push_str(&format!("4. Opener: {}\n", levers.opener_variant.instruction));
    }
    block
}

fn context_block(input: &PromptBuilderInput) -> Result<String> {
    let payload = enrich_chart(&input.chart);
    let concern = input
        .concern_text
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or("없음");

    let mut block = format!(
        "\n[USER_CONTEXT]\n\
         User Question: \"{}\"\n\
         User Concern: \"{}\"\n\
         Saju Info: {}\n\
         Saju Analysis Summary: {}\n",
        input.question_text,
        concern,
        serde_json::to_string_pretty(&payload.basic)?,
        serde_json::to_string_pretty(&payload.analysis)?
    );
    if !payload.analysis.hour_known {
        block.push_str("Birth Time: unknown. Do NOT guess or describe an hour pillar.\n");
    }

    let traits = &input.traits;
    for (label, values) in [("Day", &traits.day), ("Month", &traits.month), ("Hour", &traits.hour)] {
        if !values.is_empty() {
            block.push_str(&format!("{} Traits: {}\n", label, values.join(", ")));
        }
    }
    Ok(block)
}

/// First `max` characters, cut on a char boundary
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::bundled;
    use crate::levers::{select_levers, tests::sample_input};

    fn builder() -> PromptBuilder {
        let contract =
            ReportContract::from_json(include_str!("../../../data/report_contract.json")).unwrap();
        PromptBuilder::new(Arc::new(bundled()), Arc::new(contract))
    }

    #[test]
    fn test_extended_sections() {
        let builder = builder();
        let sections = builder.sections();
        assert_eq!(sections.len(), 8);
        for section in sections {
            assert_eq!(section.max_chars, section.min_chars + 1000);
            assert!(section.instructions[0].contains(&section.marker));
        }
    }

    #[test]
    fn test_section_prompt_blocks() {
        let builder = builder();
        let input = sample_input();
        let levers = select_levers(builder.catalog(), &input).unwrap();
        let first = &builder.sections()[0];

        let prompt = builder.build_section_prompt(&input, &levers, first, "").unwrap();
        for block in [
            "[SYSTEM_META]",
            "[VOICE_PROFILE]",
            "[VARIATION_LEVERS]",
            "[SAFETY_GUIDELINES]",
            "[USER_CONTEXT]",
            "[IMMUTABLE_CONTRACT]",
            "[START OF REPORT]",
            "[SECTION_INSTRUCTION]",
        ] {
            assert!(prompt.contains(block), "missing {}", block);
        }
        assert!(prompt.contains("<SECTION_0>"));
        assert!(prompt.contains("</SECTION_0>"));
        assert!(prompt.contains(&levers.opener_variant.instruction));
        assert!(prompt.contains("癸"));
        assert!(prompt.contains("서연"));
    }

    #[test]
    fn test_prior_text_and_opener_only_first() {
        let builder = builder();
        let input = sample_input();
        let levers = select_levers(builder.catalog(), &input).unwrap();
        let second = &builder.sections()[1];

        let prompt = builder
            .build_section_prompt(&input, &levers, second, "<SECTION_0>\n앞 이야기")
            .unwrap();
        assert!(prompt.contains("[PREVIOUS_SECTIONS_CONTENT"));
        assert!(prompt.contains("앞 이야기"));
        assert!(!prompt.contains("[START OF REPORT]"));
        assert!(!prompt.contains(&levers.opener_variant.instruction));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let builder = builder();
        let input = sample_input();
        let levers = select_levers(builder.catalog(), &input).unwrap();
        let section = &builder.sections()[2];
        assert_eq!(
            builder.build_section_prompt(&input, &levers, section, "x").unwrap(),
            builder.build_section_prompt(&input, &levers, section, "x").unwrap()
        );
    }

    #[test]
    fn test_unknown_hour_is_flagged() {
        let builder = builder();
        let mut input = sample_input();
        input.chart.hour = None;
        input.chart.time_slot = None;
        let levers = select_levers(builder.catalog(), &input).unwrap();
        let prompt = builder
            .build_section_prompt(&input, &levers, &builder.sections()[0], "")
            .unwrap();
        assert!(prompt.contains("Birth Time: unknown"));
    }

    #[test]
    fn test_full_report_prompt_lists_every_section() {
        let builder = builder();
        let input = sample_input();
        let levers = select_levers(builder.catalog(), &input).unwrap();
        let prompt = builder.build_full_report_prompt(&input, &levers).unwrap();
        for marker in &builder.contract().section_markers {
            assert!(prompt.contains(marker.as_str()));
        }
        assert!(prompt.contains("Start with <SECTION_0>"));
    }

    #[test]
    fn test_repair_prompt_truncates_on_char_boundary() {
        let builder = builder();
        let previous = "가".repeat(1500);
        let prompt = builder.build_repair_prompt(&["Missing section marker: <SECTION_3>".to_string()], &previous);
        assert!(prompt.contains("- Missing section marker: <SECTION_3>"));
        assert!(prompt.contains(&"가".repeat(1000)));
        assert!(!prompt.contains(&"가".repeat(1001)));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("가나다", 2), "가나");
        assert_eq!(truncate_chars("", 2), "");
    }
}
