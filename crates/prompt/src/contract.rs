//! Report contract document

use saju_common::{Result, SajuError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One report section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub id: u32,
    pub title: String,
    pub min_chars: usize,
    /// Literal marker, e.g. `<SECTION_0>`
    pub marker: String,
    pub role: String,
    #[serde(default)]
    pub must_include_data: bool,
}

impl SectionDefinition {
    pub fn closing_marker(&self) -> String {
        closing_marker(&self.marker)
    }
}

/// `<SECTION_0>` → `</SECTION_0>`
pub fn closing_marker(marker: &str) -> String {
    match marker.strip_prefix('<') {
        Some(rest) => format!("</{}", rest),
        None => format!("</{}", marker),
    }
}

/// Sentence-ending diversity check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneRule {
    #[serde(default = "default_plain_ending_ratio")]
    pub max_plain_ending_ratio: f64,
    /// Report the tone check as an error instead of a warning
    #[serde(default)]
    pub strict: bool,
}

fn default_plain_ending_ratio() -> f64 {
    0.8
}

impl Default for ToneRule {
    fn default() -> Self {
        Self {
            max_plain_ending_ratio: default_plain_ending_ratio(),
            strict: false,
        }
    }
}

/// Structural rules a generated report must satisfy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportContract {
    pub total_min_chars_no_space: usize,
    pub section_markers: Vec<String>,
    pub section_min_chars_no_space: usize,
    #[serde(default)]
    pub forbid_patterns: Vec<String>,
    pub sections: Vec<SectionDefinition>,
    #[serde(default)]
    pub tone: ToneRule,
}

impl ReportContract {
    /// Load and validate a contract file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SajuError::contract(format!("Failed to read contract {}: {}", path.display(), e))
        })?;
        let contract = Self::from_json(&content)?;
        info!(
            "Loaded report contract: {} sections from {}",
            contract.sections.len(),
            path.display()
        );
        Ok(contract)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let contract: Self = serde_json::from_str(json)
            .map_err(|e| SajuError::contract(format!("Invalid contract JSON: {}", e)))?;
        contract.validate()?;
        Ok(contract)
    }

    /// Markers must be non-empty and unique, and every section must use a configured marker
    pub fn validate(&self) -> Result<()> {
        if self.section_markers.is_empty() {
            return Err(SajuError::contract("Contract has no section markers"));
        }
        if self.sections.is_empty() {
            return Err(SajuError::contract("Contract has no sections"));
        }

        for (i, marker) in self.section_markers.iter().enumerate() {
            if marker.trim().is_empty() {
                return Err(SajuError::contract(format!("Section marker {} is empty", i)));
            }
            if self.section_markers[..i].contains(marker) {
                return Err(SajuError::contract(format!("Duplicate section marker: {}", marker)));
            }
        }

        for section in &self.sections {
            if !self.section_markers.contains(&section.marker) {
                return Err(SajuError::contract(format!(
                    "Section {} uses unknown marker {}",
                    section.id, section.marker
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.tone.max_plain_ending_ratio) {
            return Err(SajuError::contract("tone.max_plain_ending_ratio must be within 0.0 - 1.0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLED: &str = include_str!("../../../data/report_contract.json");

    #[test]
    fn test_bundled_contract() {
        let contract = ReportContract::from_json(BUNDLED).unwrap();
        assert_eq!(contract.sections.len(), 8);
        assert_eq!(contract.section_markers[0], "<SECTION_0>");
        assert_eq!(contract.section_markers[7], "<SECTION_7>");
        assert_eq!(contract.total_min_chars_no_space, 20000);
        assert!(!contract.tone.strict);
        assert!(contract.forbid_patterns.iter().any(|p| p.contains('^')));
    }

    #[test]
    fn test_closing_marker() {
        let contract = ReportContract::from_json(BUNDLED).unwrap();
        assert_eq!(contract.sections[3].closing_marker(), "</SECTION_3>");
    }

    #[test]
    fn test_rejects_unknown_section_marker() {
        let json = r#"{
            "total_min_chars_no_space": 10,
            "section_markers": ["<A>"],
            "section_min_chars_no_space": 1,
            "sections": [{"id": 0, "title": "t", "min_chars": 1, "marker": "<B>", "role": "r"}]
        }"#;
        assert!(matches!(ReportContract::from_json(json), Err(SajuError::Contract(_))));
    }

    #[test]
    fn test_rejects_duplicate_markers() {
        let json = r#"{
            "total_min_chars_no_space": 10,
            "section_markers": ["<A>", "<A>"],
            "section_min_chars_no_space": 1,
            "sections": [{"id": 0, "title": "t", "min_chars": 1, "marker": "<A>", "role": "r"}]
        }"#;
        assert!(ReportContract::from_json(json).is_err());
    }
}
