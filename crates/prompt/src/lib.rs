//! Saju prompt layer
//!
//! Seeded lever selection, section prompt assembly and report contract validation

mod builder;
mod catalog;
mod contract;
mod levers;
mod payload;
mod seed;
mod types;
mod validator;

pub use builder::{ExtendedSection, PromptBuilder};
pub use catalog::PromptCatalog;
pub use contract::{closing_marker, ReportContract, SectionDefinition, ToneRule};
pub use levers::{detect_category, select_levers, ConcernCategory};
pub use payload::{enrich_chart, BasicPillars, ChartAnalysis, PillarInfo, SajuPayload};
pub use seed::{generate_seed, unit_float};
pub use types::{
    Forbiddens, LeverChoice, LeverDefinition, LeverSelection, Levers, PromptBuilderInput,
    SafetyRules, SajuTraits, SpeechRules, VariationRules, VoiceProfile,
};
pub use validator::{count_chars_no_space, ContractValidator, SectionStat, ValidationResult, ValidationStats};
