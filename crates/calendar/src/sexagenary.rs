//! Heavenly stems, earthly branches and the 60-pair cycle

use saju_common::{Result, SajuError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 천간 (Korean reading)
pub const STEMS_KO: [&str; 10] = ["갑", "을", "병", "정", "무", "기", "경", "신", "임", "계"];

/// 天干
pub const STEMS_HANJA: [&str; 10] = ["甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬", "癸"];

/// 지지 (Korean reading)
pub const BRANCHES_KO: [&str; 12] = [
    "자", "축", "인", "묘", "진", "사", "오", "미", "신", "유", "술", "해",
];

/// 地支
pub const BRANCHES_HANJA: [&str; 12] = [
    "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥",
];

/// Five elements (오행)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Wood,
    Fire,
    Earth,
    Metal,
    Water,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Wood,
        Element::Fire,
        Element::Earth,
        Element::Metal,
        Element::Water,
    ];

    /// Position in the generating cycle (wood → fire → earth → metal → water)
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn korean(self) -> &'static str {
        ["목", "화", "토", "금", "수"][self.index() as usize]
    }

    pub fn hanja(self) -> &'static str {
        ["木", "火", "土", "金", "水"][self.index() as usize]
    }
}

/// 음양
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Yang,
    Yin,
}

/// Heavenly stem, index 0 (갑) ..= 9 (계)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Stem(u8);

impl Stem {
    pub fn new(index: u8) -> Result<Self> {
        if index < 10 {
            Ok(Self(index))
        } else {
            Err(SajuError::invalid_input(format!("Stem index out of range: {}", index)))
        }
    }

    /// Wraps any integer onto the 10-stem cycle
    pub fn from_cycle(value: i64) -> Self {
        Self(value.rem_euclid(10) as u8)
    }

    pub fn from_korean(s: &str) -> Option<Self> {
        STEMS_KO.iter().position(|k| *k == s).map(|i| Self(i as u8))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn korean(self) -> &'static str {
        STEMS_KO[self.0 as usize]
    }

    pub fn hanja(self) -> &'static str {
        STEMS_HANJA[self.0 as usize]
    }

    pub fn element(self) -> Element {
        Element::ALL[(self.0 / 2) as usize]
    }

    pub fn polarity(self) -> Polarity {
        if self.0 % 2 == 0 {
            Polarity::Yang
        } else {
            Polarity::Yin
        }
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.korean())
    }
}

/// Earthly branch, index 0 (자) ..= 11 (해)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Branch(u8);

impl Branch {
    pub const RAT: Branch = Branch(0);

    pub fn new(index: u8) -> Result<Self> {
        if index < 12 {
            Ok(Self(index))
        } else {
            Err(SajuError::invalid_input(format!("Branch index out of range: {}", index)))
        }
    }

    /// Wraps any integer onto the 12-branch cycle
    pub fn from_cycle(value: i64) -> Self {
        Self(value.rem_euclid(12) as u8)
    }

    pub fn from_korean(s: &str) -> Option<Self> {
        BRANCHES_KO.iter().position(|k| *k == s).map(|i| Self(i as u8))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn korean(self) -> &'static str {
        BRANCHES_KO[self.0 as usize]
    }

    pub fn hanja(self) -> &'static str {
        BRANCHES_HANJA[self.0 as usize]
    }

    pub fn polarity(self) -> Polarity {
        if self.0 % 2 == 0 {
            Polarity::Yang
        } else {
            Polarity::Yin
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.korean())
    }
}

/// One pillar: a stem-branch pair that exists in the 60-cycle (e.g. 갑자)
///
/// Only pairs of equal parity exist, so 60 of the 120 combinations are valid.
/// Serialized as its two-character Korean label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct StemBranch {
    stem: Stem,
    branch: Branch,
}

impl StemBranch {
    pub fn new(stem: Stem, branch: Branch) -> Result<Self> {
        if stem.index() % 2 != branch.index() % 2 {
            return Err(SajuError::invalid_input(format!(
                "{}{} is not part of the sexagenary cycle",
                stem, branch
            )));
        }
        Ok(Self { stem, branch })
    }

    /// Pair at position `index` of the cycle (0 = 갑자, 59 = 계해); wraps
    pub fn from_cycle_index(index: i64) -> Self {
        Self {
            stem: Stem::from_cycle(index),
            branch: Branch::from_cycle(index),
        }
    }

    /// Position in the cycle: `(6 * stem - 5 * branch) mod 60`
    pub fn cycle_index(self) -> u8 {
        let value = 6 * i32::from(self.stem.index()) - 5 * i32::from(self.branch.index());
        value.rem_euclid(60) as u8
    }

    /// Parse a two-character label such as "갑자"
    pub fn parse(label: &str) -> Result<Self> {
        let mut chars = label.trim().chars();
        let (stem, branch, rest) = (chars.next(), chars.next(), chars.next());
        let invalid = || SajuError::invalid_input(format!("Invalid stem-branch label: {}", label));

        match (stem, branch, rest) {
            (Some(s), Some(b), None) => {
                let stem = Stem::from_korean(&s.to_string()).ok_or_else(invalid)?;
                let branch = Branch::from_korean(&b.to_string()).ok_or_else(invalid)?;
                Self::new(stem, branch)
            }
            _ => Err(invalid()),
        }
    }

    pub fn stem(self) -> Stem {
        self.stem
    }

    pub fn branch(self) -> Branch {
        self.branch
    }

    /// Korean label, e.g. "갑자"
    pub fn label(self) -> String {
        format!("{}{}", self.stem.korean(), self.branch.korean())
    }

    /// Hanja label, e.g. "甲子"
    pub fn hanja(self) -> String {
        format!("{}{}", self.stem.hanja(), self.branch.hanja())
    }
}

impl fmt::Display for StemBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stem, self.branch)
    }
}

impl From<StemBranch> for String {
    fn from(value: StemBranch) -> Self {
        value.label()
    }
}

impl TryFrom<String> for StemBranch {
    type Error = SajuError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_has_sixty_distinct_pairs() {
        let labels: std::collections::HashSet<String> =
            (0..60).map(|i| StemBranch::from_cycle_index(i).label()).collect();
        assert_eq!(labels.len(), 60);
        assert_eq!(StemBranch::from_cycle_index(0).label(), "갑자");
        assert_eq!(StemBranch::from_cycle_index(59).label(), "계해");
        assert_eq!(StemBranch::from_cycle_index(60).label(), "갑자");
        assert_eq!(StemBranch::from_cycle_index(-1).label(), "계해");
    }

    #[test]
    fn test_cycle_index_round_trip() {
        for i in 0..60u8 {
            let pair = StemBranch::from_cycle_index(i64::from(i));
            assert_eq!(pair.cycle_index(), i);
        }
    }

    #[test]
    fn test_parity_constraint() {
        let gap = Stem::new(0).unwrap();
        assert!(StemBranch::new(gap, Branch::new(0).unwrap()).is_ok());
        assert!(StemBranch::new(gap, Branch::new(1).unwrap()).is_err());

        let valid = (0..10u8)
            .flat_map(|s| (0..12u8).map(move |b| (s, b)))
            .filter(|(s, b)| StemBranch::new(Stem(*s), Branch(*b)).is_ok())
            .count();
        assert_eq!(valid, 60);
    }

    #[test]
    fn test_parse_labels() {
        let pair = StemBranch::parse("무오").unwrap();
        assert_eq!(pair.stem().index(), 4);
        assert_eq!(pair.branch().index(), 6);
        assert_eq!(pair.cycle_index(), 54);
        assert_eq!(pair.hanja(), "戊午");

        assert!(StemBranch::parse("갑축").is_err());
        assert!(StemBranch::parse("갑").is_err());
        assert!(StemBranch::parse("갑자년").is_err());
    }

    #[test]
    fn test_element_and_polarity() {
        assert_eq!(Stem::from_korean("병").unwrap().element(), Element::Fire);
        assert_eq!(Stem::from_korean("계").unwrap().element(), Element::Water);
        assert_eq!(Stem::from_korean("을").unwrap().polarity(), Polarity::Yin);
        assert_eq!(Branch::from_korean("진").unwrap().polarity(), Polarity::Yang);
    }

    #[test]
    fn test_serializes_as_label() {
        let pair = StemBranch::parse("계묘").unwrap();
        assert_eq!(serde_json::to_string(&pair).unwrap(), "\"계묘\"");
        let back: StemBranch = serde_json::from_str("\"계묘\"").unwrap();
        assert_eq!(back, pair);
        assert!(serde_json::from_str::<StemBranch>("\"계자\"").is_err());
    }
}
