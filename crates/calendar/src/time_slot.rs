//! Birth time slots (시진)

use saju_common::{Result, SajuError};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sexagenary::Branch;

/// One of the 13 birth time windows.
///
/// The rat hour is split at the day boundary: 조자 belongs to the civil day,
/// 야자 already counts toward the next day for the day pillar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TimeSlot {
    EarlyRat,
    Ox,
    Tiger,
    Rabbit,
    Dragon,
    Snake,
    Horse,
    Goat,
    Monkey,
    Rooster,
    Dog,
    Pig,
    LateRat,
}

const NO_TIME_TOKENS: [&str; 4] = ["", "모름", "미상", "unknown"];

impl TimeSlot {
    pub const ALL: [TimeSlot; 13] = [
        TimeSlot::EarlyRat,
        TimeSlot::Ox,
        TimeSlot::Tiger,
        TimeSlot::Rabbit,
        TimeSlot::Dragon,
        TimeSlot::Snake,
        TimeSlot::Horse,
        TimeSlot::Goat,
        TimeSlot::Monkey,
        TimeSlot::Rooster,
        TimeSlot::Dog,
        TimeSlot::Pig,
        TimeSlot::LateRat,
    ];

    /// Canonical token
    pub fn token(self) -> &'static str {
        match self {
            TimeSlot::EarlyRat => "조자",
            TimeSlot::Ox => "축",
            TimeSlot::Tiger => "인",
            TimeSlot::Rabbit => "묘",
            TimeSlot::Dragon => "진",
            TimeSlot::Snake => "사",
            TimeSlot::Horse => "오",
            TimeSlot::Goat => "미",
            TimeSlot::Monkey => "신",
            TimeSlot::Rooster => "유",
            TimeSlot::Dog => "술",
            TimeSlot::Pig => "해",
            TimeSlot::LateRat => "야자",
        }
    }

    /// Clock window shown to the user
    pub fn window(self) -> &'static str {
        match self {
            TimeSlot::EarlyRat => "00:00~01:29",
            TimeSlot::Ox => "01:30~03:29",
            TimeSlot::Tiger => "03:30~05:29",
            TimeSlot::Rabbit => "05:30~07:29",
            TimeSlot::Dragon => "07:30~09:29",
            TimeSlot::Snake => "09:30~11:29",
            TimeSlot::Horse => "11:30~13:29",
            TimeSlot::Goat => "13:30~15:29",
            TimeSlot::Monkey => "15:30~17:29",
            TimeSlot::Rooster => "17:30~19:29",
            TimeSlot::Dog => "19:30~21:29",
            TimeSlot::Pig => "21:30~23:29",
            TimeSlot::LateRat => "23:30~23:59",
        }
    }

    /// Hour branch; both rat windows map to 자
    pub fn branch(self) -> Branch {
        match self {
            TimeSlot::EarlyRat | TimeSlot::LateRat => Branch::RAT,
            other => Branch::from_cycle(other as i64),
        }
    }

    /// Whether the day pillar is taken from the following civil day
    pub fn shifts_day(self) -> bool {
        self == TimeSlot::LateRat
    }

    /// Label in the "HH:MM~HH:MM X시" form
    pub fn label(self) -> String {
        format!("{} {}시", self.window(), self.token())
    }

    /// Parse a slot token.
    ///
    /// Accepts the canonical tokens, `자` for 조자, the `시` suffix form
    /// (`축시`) and the full label form (`01:30~03:29 축시`).
    pub fn parse(token: &str) -> Result<Self> {
        let trimmed = token.trim();
        // Label form: keep the part after the clock window
        let name = trimmed
            .rsplit_once(' ')
            .map(|(_, name)| name)
            .unwrap_or(trimmed);
        let name = name.strip_suffix('시').unwrap_or(name);

        if name == "자" {
            return Ok(TimeSlot::EarlyRat);
        }

        Self::ALL
            .iter()
            .copied()
            .find(|slot| slot.token() == name)
            .ok_or_else(|| SajuError::invalid_time_slot(token))
    }

    /// Like [`parse`](Self::parse), but the "no birth time" tokens yield `None`
    pub fn parse_optional(token: Option<&str>) -> Result<Option<Self>> {
        match token.map(str::trim) {
            None => Ok(None),
            Some(t) if NO_TIME_TOKENS.iter().any(|n| n.eq_ignore_ascii_case(t)) => Ok(None),
            Some(t) => Self::parse(t).map(Some),
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl From<TimeSlot> for String {
    fn from(value: TimeSlot) -> Self {
        value.token().to_string()
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = SajuError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}
