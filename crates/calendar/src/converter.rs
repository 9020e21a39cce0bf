//! Lunar ↔ solar conversion over the bundled table

use chrono::{Duration, NaiveDate};
use saju_common::{Result, SajuError};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::lunar_table::{self, EPOCH, FIRST_YEAR, LAST_YEAR};

/// Canonical calendar date
pub type SolarDate = NaiveDate;

/// Date in the Korean lunisolar calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LunarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// 윤달 여부
    pub is_leap_month: bool,
}

impl LunarDate {
    pub fn new(year: i32, month: u32, day: u32, is_leap_month: bool) -> Self {
        Self {
            year,
            month,
            day,
            is_leap_month,
        }
    }

    /// Parse "YYYY-MM-DD" or "YYYYMMDD"
    pub fn parse(s: &str, is_leap_month: bool) -> Result<Self> {
        let (year, month, day) = parse_date_parts(s)?;
        Ok(Self::new(year, month, day, is_leap_month))
    }
}

impl fmt::Display for LunarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)?;
        if self.is_leap_month {
            f.write_str(" (윤)")?;
        }
        Ok(())
    }
}

/// Split "YYYY-MM-DD" or "YYYYMMDD" into numbers (no calendar check)
pub fn parse_date_parts(s: &str) -> Result<(i32, u32, u32)> {
    let s = s.trim();
    let invalid = || SajuError::invalid_date(format!("expected YYYY-MM-DD or YYYYMMDD, got '{}'", s));

    let (y, m, d) = if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        (&s[0..4], &s[4..6], &s[6..8])
    } else {
        let mut parts = s.split('-');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(y), Some(m), Some(d), None) => (y, m, d),
            _ => return Err(invalid()),
        }
    };

    Ok((
        y.parse().map_err(|_| invalid())?,
        m.parse().map_err(|_| invalid())?,
        d.parse().map_err(|_| invalid())?,
    ))
}

/// Parse a solar date in "YYYY-MM-DD" or "YYYYMMDD" form
pub fn parse_solar_date(s: &str) -> Result<SolarDate> {
    let (year, month, day) = parse_date_parts(s)?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| SajuError::invalid_date(format!("{} is not a calendar date", s.trim())))
}

fn epoch() -> Result<NaiveDate> {
    let (year, month, day) = EPOCH;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| SajuError::internal("lunar table epoch is not a valid date"))
}

/// Converter backed by the bundled lunisolar table
#[derive(Debug, Clone)]
pub struct LunarCalendar {
    /// Day offset of each lunar new year from the epoch; last entry is the end of coverage
    year_starts: Vec<i64>,
}

impl Default for LunarCalendar {
    fn default() -> Self {
        Self::bundled()
    }
}

impl LunarCalendar {
    pub fn bundled() -> Self {
        Self {
            year_starts: lunar_table::year_start_offsets(),
        }
    }

    /// First and last solar dates the table can convert
    pub fn coverage(&self) -> Result<(SolarDate, SolarDate)> {
        let first = epoch()?;
        let total = self.year_starts.last().copied().unwrap_or(0);
        Ok((first, first + Duration::days(total - 1)))
    }

    /// Leap month of a lunar year, `None` when the year has none
    pub fn leap_month(&self, lunar_year: i32) -> Result<Option<u32>> {
        lunar_table::leap_month(lunar_year)
    }

    /// Check a leap-month claim against the table.
    ///
    /// - claiming a leap month in a year without one, or the wrong one: `InvalidLeapMonth`
    /// - addressing the designated leap month number without the flag:
    ///   `LeapMonthConfirmationRequired` (the caller must ask the user which month was meant)
    pub fn validate_leap_month(&self, lunar_year: i32, lunar_month: u32, is_leap_month: bool) -> Result<()> {
        if !(1..=12).contains(&lunar_month) {
            return Err(SajuError::invalid_date(format!(
                "lunar month must be 1-12, got {}",
                lunar_month
            )));
        }

        match lunar_table::leap_month(lunar_year)? {
            None if is_leap_month => Err(SajuError::invalid_leap_month(format!(
                "lunar year {} has no leap month",
                lunar_year
            ))),
            Some(leap) if is_leap_month && leap != lunar_month => {
                Err(SajuError::invalid_leap_month(format!(
                    "the leap month of lunar year {} is {}, not {}",
                    lunar_year, leap, lunar_month
                )))
            }
            Some(leap) if !is_leap_month && leap == lunar_month => {
                Err(SajuError::LeapMonthConfirmationRequired {
                    year: lunar_year,
                    month: lunar_month,
                })
            }
            _ => Ok(()),
        }
    }

    /// Convert a lunar date to its solar date.
    ///
    /// A regular month whose number is also the leap month converts as the
    /// regular month; use [`validate_leap_month`](Self::validate_leap_month)
    /// first when the user has not confirmed which one they meant.
    pub fn to_solar(&self, date: LunarDate) -> Result<SolarDate> {
        let LunarDate {
            year,
            month,
            day,
            is_leap_month,
        } = date;

        let leap = lunar_table::leap_month(year)?;
        if !(1..=12).contains(&month) {
            return Err(SajuError::invalid_date(format!("lunar month must be 1-12, got {}", month)));
        }
        if is_leap_month && leap != Some(month) {
            return Err(SajuError::invalid_leap_month(format!(
                "lunar {}-{:02} has no leap variant",
                year, month
            )));
        }

        let month_len = if is_leap_month {
            lunar_table::leap_month_days(year)?
        } else {
            lunar_table::month_days(year, month)?
        };
        if day == 0 || day > month_len {
            return Err(SajuError::invalid_date(format!(
                "lunar {} has {} days, got day {}",
                date, month_len, day
            )));
        }

        let mut offset = self.year_start(year)?;
        for m in 1..month {
            offset += i64::from(lunar_table::month_days(year, m)?);
        }
        if let Some(leap) = leap {
            // The leap month follows the regular month with the same number
            if leap < month || (is_leap_month && leap == month) {
                let days_before_leap = if is_leap_month {
                    i64::from(lunar_table::month_days(year, month)?)
                } else {
                    i64::from(lunar_table::leap_month_days(year)?)
                };
                offset += days_before_leap;
            }
        }
        offset += i64::from(day - 1);

        Ok(epoch()? + Duration::days(offset))
    }

    /// Convert a solar date to its lunar date
    pub fn to_lunar(&self, solar: SolarDate) -> Result<LunarDate> {
        let offset = (solar - epoch()?).num_days();
        let end = self.year_starts.last().copied().unwrap_or(0);
        if offset < 0 || offset >= end {
            let (first, last) = self.coverage()?;
            return Err(SajuError::out_of_range(format!(
                "solar date {} is outside the supported range {} ~ {}",
                solar, first, last
            )));
        }

        // Last year whose new year is on or before the date
        let year_index = self.year_starts.partition_point(|start| *start <= offset) - 1;
        let year = FIRST_YEAR + year_index as i32;
        let mut remaining = offset - self.year_starts[year_index];
        let leap = lunar_table::leap_month(year)?;

        for month in 1..=12 {
            let days = i64::from(lunar_table::month_days(year, month)?);
            if remaining < days {
                return Ok(LunarDate::new(year, month, remaining as u32 + 1, false));
            }
            remaining -= days;

            if leap == Some(month) {
                let days = i64::from(lunar_table::leap_month_days(year)?);
                if remaining < days {
                    return Ok(LunarDate::new(year, month, remaining as u32 + 1, true));
                }
                remaining -= days;
            }
        }

        Err(SajuError::internal(format!("lunar table overflow while converting {}", solar)))
    }

    fn year_start(&self, year: i32) -> Result<i64> {
        if !(FIRST_YEAR..=LAST_YEAR).contains(&year) {
            return Err(SajuError::out_of_range(format!(
                "lunar year {} is outside the supported range {}-{}",
                year, FIRST_YEAR, LAST_YEAR
            )));
        }
        Ok(self.year_starts[(year - FIRST_YEAR) as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_lunar_new_years() {
        let calendar = LunarCalendar::bundled();
        let cases = [
            (1998, ymd(1998, 1, 28)),
            (2000, ymd(2000, 2, 5)),
            (2023, ymd(2023, 1, 22)),
            (2024, ymd(2024, 2, 10)),
            (2025, ymd(2025, 1, 29)),
        ];
        for (year, expected) in cases {
            let solar = calendar.to_solar(LunarDate::new(year, 1, 1, false)).unwrap();
            assert_eq!(solar, expected, "lunar new year {}", year);
        }
    }

    #[test]
    fn test_lunar_to_solar_examples() {
        let calendar = LunarCalendar::bundled();
        assert_eq!(
            calendar.to_solar(LunarDate::new(1998, 1, 29, false)).unwrap(),
            ymd(1998, 2, 25)
        );
        // 2020 윤4월 1일 vs 4월 1일
        assert_eq!(
            calendar.to_solar(LunarDate::new(2020, 4, 1, true)).unwrap(),
            ymd(2020, 5, 23)
        );
        assert_eq!(
            calendar.to_solar(LunarDate::new(2020, 5, 1, false)).unwrap(),
            ymd(2020, 6, 21)
        );
    }

    #[test]
    fn test_solar_to_lunar_examples() {
        let calendar = LunarCalendar::bundled();
        assert_eq!(
            calendar.to_lunar(ymd(2024, 3, 1)).unwrap(),
            LunarDate::new(2024, 1, 21, false)
        );
        assert_eq!(
            calendar.to_lunar(ymd(2024, 1, 1)).unwrap(),
            LunarDate::new(2023, 11, 20, false)
        );
        assert_eq!(
            calendar.to_lunar(ymd(2020, 5, 23)).unwrap(),
            LunarDate::new(2020, 4, 1, true)
        );
    }

    #[test]
    fn test_round_trip_over_full_coverage() {
        let calendar = LunarCalendar::bundled();
        let (first, last) = calendar.coverage().unwrap();
        assert_eq!(first, ymd(1900, 1, 31));

        let mut date = first;
        while date <= last {
            let lunar = calendar.to_lunar(date).unwrap();
            assert_eq!(calendar.to_solar(lunar).unwrap(), date, "round trip of {}", date);
            date += Duration::days(1);
        }
    }

    #[test]
    fn test_outside_coverage_fails() {
        let calendar = LunarCalendar::bundled();
        let (first, last) = calendar.coverage().unwrap();
        assert!(matches!(
            calendar.to_lunar(first - Duration::days(1)),
            Err(SajuError::CalendarOutOfRange(_))
        ));
        assert!(matches!(
            calendar.to_lunar(last + Duration::days(1)),
            Err(SajuError::CalendarOutOfRange(_))
        ));
        assert!(matches!(
            calendar.to_solar(LunarDate::new(1899, 12, 1, false)),
            Err(SajuError::CalendarOutOfRange(_))
        ));
    }

    #[test]
    fn test_leap_month_gating() {
        let calendar = LunarCalendar::bundled();

        // 2024 has no leap month
        for month in 1..=12 {
            assert!(matches!(
                calendar.validate_leap_month(2024, month, true),
                Err(SajuError::InvalidLeapMonth(_))
            ));
            assert!(calendar.validate_leap_month(2024, month, false).is_ok());
        }

        // every year with a leap month M
        for year in 1900..=2100 {
            if let Some(leap) = calendar.leap_month(year).unwrap() {
                assert!(matches!(
                    calendar.validate_leap_month(year, leap, false),
                    Err(SajuError::LeapMonthConfirmationRequired { .. })
                ));
                assert!(calendar.validate_leap_month(year, leap, true).is_ok());
            }
        }

        assert!(matches!(
            calendar.validate_leap_month(1998, 4, true),
            Err(SajuError::InvalidLeapMonth(_))
        ));
        assert!(calendar.validate_leap_month(1998, 1, false).is_ok());
    }

    #[test]
    fn test_validate_out_of_range_year() {
        let calendar = LunarCalendar::bundled();
        assert!(matches!(
            calendar.validate_leap_month(2150, 1, false),
            Err(SajuError::CalendarOutOfRange(_))
        ));
    }

    #[test]
    fn test_day_past_month_end() {
        let calendar = LunarCalendar::bundled();
        let days = lunar_table::month_days(2024, 1).unwrap();
        assert!(calendar.to_solar(LunarDate::new(2024, 1, days, false)).is_ok());
        assert!(matches!(
            calendar.to_solar(LunarDate::new(2024, 1, days + 1, false)),
            Err(SajuError::InvalidDate(_))
        ));
        assert!(calendar.to_solar(LunarDate::new(2024, 1, 0, false)).is_err());
    }

    #[test]
    fn test_parse_dates() {
        assert_eq!(parse_solar_date("1998-02-25").unwrap(), ymd(1998, 2, 25));
        assert_eq!(parse_solar_date("19980225").unwrap(), ymd(1998, 2, 25));
        assert!(parse_solar_date("1998-02-30").is_err());
        assert!(parse_solar_date("1998/02/25").is_err());
        assert_eq!(
            LunarDate::parse("2020-04-01", true).unwrap(),
            LunarDate::new(2020, 4, 1, true)
        );
    }
}
