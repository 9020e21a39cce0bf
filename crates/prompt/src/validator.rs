//! Report contract validation

use regex::Regex;
use saju_common::{Result, SajuError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::contract::{closing_marker, ReportContract};

/// Characters counted by the contract: Unicode scalars, whitespace excluded
pub fn count_chars_no_space(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionStat {
    pub marker: String,
    pub chars: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidationStats {
    pub total_chars: usize,
    /// Present sections in contract order
    pub sections: Vec<SectionStat>,
}

impl ValidationStats {
    pub fn section_chars(&self, marker: &str) -> Option<usize> {
        self.sections.iter().find(|s| s.marker == marker).map(|s| s.chars)
    }
}

/// Outcome of one validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: ValidationStats,
}

struct ForbidPattern {
    source: String,
    regex: Regex,
    /// Line-start patterns are hard failures, the rest only warn
    anchored: bool,
}

/// Checks generated text against a report contract
pub struct ContractValidator {
    contract: Arc<ReportContract>,
    patterns: Vec<ForbidPattern>,
}

impl ContractValidator {
    /// Compile the contract's forbidden patterns (multiline mode)
    pub fn new(contract: Arc<ReportContract>) -> Result<Self> {
        let patterns = contract
            .forbid_patterns
            .iter()
            .map(|source| {
                Regex::new(&format!("(?m){}", source))
                    .map(|regex| ForbidPattern {
                        source: source.clone(),
                        regex,
                        anchored: source.contains('^'),
                    })
                    .map_err(|e| {
                        SajuError::contract(format!("Invalid forbid pattern '{}': {}", source, e))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { contract, patterns })
    }

    pub fn contract(&self) -> &ReportContract {
        &self.contract
    }

    /// Validate `text`. Does not mutate anything; repeated calls give the same result.
    pub fn validate(&self, text: &str) -> ValidationResult {
        let contract = &self.contract;
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut stats = ValidationStats {
            total_chars: count_chars_no_space(text),
            sections: Vec::new(),
        };

        // Total length
        if stats.total_chars < contract.total_min_chars_no_space {
            errors.push(format!(
                "Total length insufficient: {} / {}",
                stats.total_chars, contract.total_min_chars_no_space
            ));
        }

        // Sections
        for (index, marker) in contract.section_markers.iter().enumerate() {
            let Some(position) = text.find(marker.as_str()) else {
                errors.push(format!("Missing section marker: {}", marker));
                continue;
            };

            let start = position + marker.len();
            let rest = &text[start..];
            let end = contract
                .section_markers
                .iter()
                .filter(|other| *other != marker)
                .filter_map(|other| rest.find(other.as_str()))
                .min()
                .unwrap_or(rest.len());

            let content = rest[..end].replace(&closing_marker(marker), "");
            let chars = count_chars_no_space(&content);
            stats.sections.push(SectionStat {
                marker: marker.clone(),
                chars,
            });

            if chars < contract.section_min_chars_no_space {
                errors.push(format!(
                    "Section {} ({}) too short: {} / {}",
                    index, marker, chars, contract.section_min_chars_no_space
                ));
            }
        }

        // Forbidden patterns
        for pattern in &self.patterns {
            if pattern.regex.is_match(text) {
                let message = format!("Forbidden pattern detected: {}", pattern.source);
                if pattern.anchored {
                    errors.push(message);
                } else {
                    warnings.push(message);
                }
            }
        }

        // Sentence ending diversity
        let sentences = text.matches('.').count();
        if sentences > 0 {
            let plain = text.matches("다.").count();
            let ratio = plain as f64 / sentences as f64;
            if ratio > contract.tone.max_plain_ending_ratio {
                let message = format!(
                    "Tone check failed: Too many '다.' endings ({:.1}%). Use diverse endings.",
                    ratio * 100.0
                );
                if contract.tone.strict {
                    errors.push(message);
                } else {
                    warnings.push(message);
                }
            }
        }

        ValidationResult {
            ok: errors.is_empty(),
            errors,
            warnings,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{SectionDefinition, ToneRule};

    fn contract(total: usize, section: usize, patterns: &[&str], strict: bool) -> Arc<ReportContract> {
        let markers = ["<SECTION_0>", "<SECTION_1>"];
        Arc::new(ReportContract {
            total_min_chars_no_space: total,
            section_markers: markers.iter().map(|m| m.to_string()).collect(),
            section_min_chars_no_space: section,
            forbid_patterns: patterns.iter().map(|p| p.to_string()).collect(),
            sections: markers
                .iter()
                .enumerate()
                .map(|(i, m)| SectionDefinition {
                    id: i as u32,
                    title: format!("섹션 {}", i),
                    min_chars: section,
                    marker: m.to_string(),
                    role: "역할".to_string(),
                    must_include_data: false,
                })
                .collect(),
            tone: ToneRule {
                max_plain_ending_ratio: 0.8,
                strict,
            },
        })
    }

    #[test]
    fn test_section_boundaries() {
        let validator = ContractValidator::new(contract(0, 0, &[], false)).unwrap();
        let result = validator.validate("<SECTION_0>content0<SECTION_1>content1");
        assert!(result.ok);
        assert_eq!(result.stats.section_chars("<SECTION_0>"), Some("content0".len()));
        assert_eq!(result.stats.section_chars("<SECTION_1>"), Some("content1".len()));
    }

    #[test]
    fn test_whitespace_and_unicode_counting() {
        assert_eq!(count_chars_no_space(" 가 나\n다\t"), 3);
        let validator = ContractValidator::new(contract(0, 0, &[], false)).unwrap();
        let result = validator.validate("<SECTION_0>\n가나 다\n</SECTION_0>\n<SECTION_1>라");
        assert_eq!(result.stats.section_chars("<SECTION_0>"), Some(3));
        assert_eq!(result.stats.section_chars("<SECTION_1>"), Some(1));
    }

    #[test]
    fn test_missing_marker_does_not_abort() {
        let validator = ContractValidator::new(contract(0, 3, &[], false)).unwrap();
        let result = validator.validate("<SECTION_1>ab");
        assert!(!result.ok);
        assert_eq!(result.errors[0], "Missing section marker: <SECTION_0>");
        assert_eq!(result.errors[1], "Section 1 (<SECTION_1>) too short: 2 / 3");
    }

    #[test]
    fn test_out_of_order_markers() {
        let validator = ContractValidator::new(contract(0, 0, &[], false)).unwrap();
        let result = validator.validate("<SECTION_1>뒤쪽<SECTION_0>앞쪽");
        assert_eq!(result.stats.section_chars("<SECTION_0>"), Some(2));
        assert_eq!(result.stats.section_chars("<SECTION_1>"), Some(2));
    }

    #[test]
    fn test_total_length() {
        let validator = ContractValidator::new(contract(100, 0, &[], false)).unwrap();
        let result = validator.validate("<SECTION_0>a<SECTION_1>b");
        assert!(!result.ok);
        assert!(result.errors[0].starts_with("Total length insufficient: 24 / 100"));
    }

    #[test]
    fn test_only_anchored_patterns_fail() {
        let validator =
            ContractValidator::new(contract(0, 0, &[r"^\s*[-*•]\s", "AI"], false)).unwrap();
        let result = validator.validate("<SECTION_0>\n- 목록\n<SECTION_1>AI 같은 말");
        assert!(!result.ok);
        assert_eq!(result.errors, vec![r"Forbidden pattern detected: ^\s*[-*•]\s".to_string()]);
        assert_eq!(result.warnings, vec!["Forbidden pattern detected: AI".to_string()]);

        let clean = validator.validate("<SECTION_0>문장 - 중간<SECTION_1>끝");
        assert!(clean.errors.is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_contract_error() {
        assert!(matches!(
            ContractValidator::new(contract(0, 0, &["(unclosed"], false)),
            Err(SajuError::Contract(_))
        ));
    }

    #[test]
    fn test_tone_is_warning_unless_strict() {
        let text = "<SECTION_0>좋습니다. 그렇다.<SECTION_1>맞다. 보인다.";
        let lenient = ContractValidator::new(contract(0, 0, &[], false)).unwrap();
        let result = lenient.validate(text);
        assert!(result.ok);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("Tone check failed"));

        let strict = ContractValidator::new(contract(0, 0, &[], true)).unwrap();
        let result = strict.validate(text);
        assert!(!result.ok);
        assert!(result.errors[0].contains("100.0%"));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let validator = ContractValidator::new(contract(50, 5, &[r"^\s*\d+\.\s"], false)).unwrap();
        let text = "<SECTION_0>1. 하나\n<SECTION_1>둘이네.";
        assert_eq!(validator.validate(text), validator.validate(text));
    }
}
