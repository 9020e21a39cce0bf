//! Seeded lever selection

use regex::Regex;
use saju_common::{Result, SajuError};
use std::sync::OnceLock;
use tracing::debug;

use crate::catalog::PromptCatalog;
use crate::seed::{generate_seed, pick, pick_index};
use crate::types::{LeverChoice, LeverSelection, PromptBuilderInput};

/// Topic category of a free-text concern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcernCategory {
    Relationship,
    Work,
    Direction,
    SelfCare,
}

impl ConcernCategory {
    /// Emphasis lever key
    pub fn key(self) -> &'static str {
        match self {
            ConcernCategory::Relationship => "relationship",
            ConcernCategory::Work => "work",
            ConcernCategory::Direction => "direction",
            ConcernCategory::SelfCare => "self",
        }
    }
}

fn keyword_table() -> &'static [(ConcernCategory, Regex)] {
    static TABLE: OnceLock<Vec<(ConcernCategory, Regex)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        [
            (ConcernCategory::Relationship, "연애|사랑|이별|재회|남친|여친|결혼|썸"),
            (ConcernCategory::Work, "직장|이직|사업|돈|취업|합격|승진|면접"),
            (ConcernCategory::Direction, "방향|선택|이사|이동|진로"),
        ]
        .into_iter()
        .filter_map(|(category, pattern)| Regex::new(pattern).ok().map(|re| (category, re)))
        .collect()
    })
}

/// Classify a concern by keyword; first matching category wins, empty text is `SelfCare`
pub fn detect_category(text: &str) -> ConcernCategory {
    if text.trim().is_empty() {
        return ConcernCategory::SelfCare;
    }
    keyword_table()
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(category, _)| *category)
        .unwrap_or(ConcernCategory::SelfCare)
}

/// Pick every lever for a report. Pure function of `input` and the catalog.
pub fn select_levers(catalog: &PromptCatalog, input: &PromptBuilderInput) -> Result<LeverSelection> {
    let seed = generate_seed(input);
    let (_, profile) = catalog.profile(&input.persona_id)?;
    let levers = &catalog.rules().levers;

    // Opener
    let opener_index = pick_index(profile.opener_variants.len(), &seed, "opener")
        .ok_or_else(|| SajuError::contract("Persona has no opener variants"))?;
    let opener_variant = LeverChoice {
        key: format!("opener_{}", opener_index + 1),
        label: format!("Opener Variant {}", opener_index + 1),
        instruction: format!(
            "오프닝 문구로 다음을 변주하여 사용: \"{}\"",
            profile.opener_variants[opener_index]
        ),
        examples: Vec::new(),
    };

    // Metaphor: the persona's own palette when the rule table has it
    let metaphor_choices = &levers.metaphor_palette.choices;
    let metaphor_palette = metaphor_choices
        .iter()
        .find(|c| c.key == profile.metaphor_palette)
        .or_else(|| pick(metaphor_choices, &seed, "metaphor"))
        .cloned()
        .ok_or_else(|| SajuError::contract("metaphor_palette has no choices"))?;

    // Emphasis: primary from the concern, secondary seeded from the rest
    let concern = input
        .concern_text
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(&input.question_text);
    let category = detect_category(concern);
    let emphasis_choices = &levers.emphasis_axis.choices;
    let primary = emphasis_choices
        .iter()
        .find(|c| c.key == category.key())
        .or_else(|| emphasis_choices.first())
        .cloned()
        .ok_or_else(|| SajuError::contract("emphasis_axis has no choices"))?;
    let others: Vec<&LeverChoice> = emphasis_choices
        .iter()
        .filter(|c| c.key != primary.key)
        .collect();
    let secondary = pick(&others, &seed, "emphasis_secondary")
        .map(|c| (*c).clone())
        .ok_or_else(|| SajuError::contract("emphasis_axis needs at least two choices"))?;

    // Rhythm
    let sentence_rhythm = pick(&levers.sentence_rhythm.choices, &seed, "rhythm")
        .cloned()
        .ok_or_else(|| SajuError::contract("sentence_rhythm has no choices"))?;

    debug!(
        "Levers for seed {}: opener={}, metaphor={}, emphasis={}+{}, rhythm={}",
        &seed[..12],
        opener_variant.key,
        metaphor_palette.key,
        primary.key,
        secondary.key,
        sentence_rhythm.key
    );

    Ok(LeverSelection {
        opener_variant,
        metaphor_palette,
        emphasis_axis: [primary, secondary],
        sentence_rhythm,
        seed,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::tests::bundled;
    use chrono::NaiveDate;
    use saju_calendar::{compute_chart, LunarCalendar, TimeSlot};

    pub(crate) fn sample_input() -> PromptBuilderInput {
        let calendar = LunarCalendar::bundled();
        let date = NaiveDate::from_ymd_opt(1998, 2, 25).unwrap();
        let chart = compute_chart(&calendar, date, Some(TimeSlot::Tiger)).unwrap();
        PromptBuilderInput {
            persona_id: "dragon-sage".to_string(),
            question_id: "q-love".to_string(),
            subject_id: "guest-42".to_string(),
            counter: 1,
            date: "2024-06-01".to_string(),
            question_text: "올해 제 흐름은 어떤가요?".to_string(),
            concern_text: Some("헤어진 사람과 재회할 수 있을까요".to_string()),
            subject_name: Some("서연".to_string()),
            chart,
            traits: Default::default(),
        }
    }

    #[test]
    fn test_detect_category() {
        assert_eq!(detect_category(""), ConcernCategory::SelfCare);
        assert_eq!(detect_category("   "), ConcernCategory::SelfCare);
        assert_eq!(detect_category("결혼해도 될까요"), ConcernCategory::Relationship);
        assert_eq!(detect_category("이직 고민"), ConcernCategory::Work);
        assert_eq!(detect_category("진로를 못 정하겠어요"), ConcernCategory::Direction);
        assert_eq!(detect_category("요즘 잠이 안 와요"), ConcernCategory::SelfCare);
        // relationship keywords are checked first
        assert_eq!(detect_category("사랑과 직장"), ConcernCategory::Relationship);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let catalog = bundled();
        let input = sample_input();
        let first = select_levers(&catalog, &input).unwrap();
        let second = select_levers(&catalog, &input).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(first.seed.len(), 64);
    }

    #[test]
    fn test_counter_changes_selection() {
        let catalog = bundled();
        let mut input = sample_input();
        let base = select_levers(&catalog, &input).unwrap();

        let changed = (2..20u64).any(|counter| {
            input.counter = counter;
            let other = select_levers(&catalog, &input).unwrap();
            other.opener_variant != base.opener_variant
                || other.emphasis_axis[1] != base.emphasis_axis[1]
                || other.sentence_rhythm != base.sentence_rhythm
        });
        assert!(changed);
    }

    #[test]
    fn test_primary_emphasis_follows_concern() {
        let catalog = bundled();
        let mut input = sample_input();
        let levers = select_levers(&catalog, &input).unwrap();
        assert_eq!(levers.emphasis_axis[0].key, "relationship");
        assert_ne!(levers.emphasis_axis[1].key, "relationship");

        input.concern_text = None;
        input.question_text = String::new();
        let levers = select_levers(&catalog, &input).unwrap();
        assert_eq!(levers.emphasis_axis[0].key, "self");

        input.concern_text = Some(String::new());
        input.question_text = "면접 결과가 궁금해요".to_string();
        let levers = select_levers(&catalog, &input).unwrap();
        assert_eq!(levers.emphasis_axis[0].key, "work");
    }

    #[test]
    fn test_persona_metaphor_palette() {
        let catalog = bundled();
        let input = sample_input();
        let (_, profile) = catalog.profile("dragon-sage").unwrap();
        let levers = select_levers(&catalog, &input).unwrap();
        assert_eq!(levers.metaphor_palette.key, profile.metaphor_palette);
        assert!(levers.opener_variant.key.starts_with("opener_"));
    }
}
