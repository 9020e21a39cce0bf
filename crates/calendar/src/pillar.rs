//! Four-pillar chart derivation

use chrono::{Datelike, Duration};
use saju_common::{Result, SajuError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::converter::{parse_date_parts, parse_solar_date, LunarCalendar, LunarDate, SolarDate};
use crate::sexagenary::{Branch, Stem, StemBranch};
use crate::time_slot::TimeSlot;

/// Cycle index of the day pillar on 2000-01-01 (무오)
const DAY_ANCHOR_INDEX: i64 = 54;

/// `num_days_from_ce` of 2000-01-01
const DAY_ANCHOR_CE: i64 = 730_120;

/// Year/Month/Day/Hour pillars for one birth input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FourPillarChart {
    /// Solar birth date as given
    pub solar_date: SolarDate,
    /// Date the pillars were looked up for (next day for 야자)
    pub pillar_date: SolarDate,
    /// Lunar date of `pillar_date`
    pub lunar_date: LunarDate,
    pub year: StemBranch,
    pub month: StemBranch,
    pub day: StemBranch,
    /// `None` when the birth time is unknown
    pub hour: Option<StemBranch>,
    pub time_slot: Option<TimeSlot>,
    pub day_shifted: bool,
    /// 일주 position in the 60-cycle
    pub ilju_index: u8,
}

impl FourPillarChart {
    pub fn day_stem(&self) -> Stem {
        self.day.stem()
    }

    pub fn hour_known(&self) -> bool {
        self.hour.is_some()
    }

    /// Pillars in year, month, day, hour order
    pub fn pillars(&self) -> [(&'static str, Option<StemBranch>); 4] {
        [
            ("year", Some(self.year)),
            ("month", Some(self.month)),
            ("day", Some(self.day)),
            ("hour", self.hour),
        ]
    }
}

/// Hour stem from the day stem family (갑/기 days start at 갑자)
pub fn hour_stem_for(day_stem: Stem, hour_branch: Branch) -> Stem {
    let index = (i64::from(day_stem.index()) % 5) * 2 + i64::from(hour_branch.index());
    Stem::from_cycle(index)
}

pub fn hour_pillar(day_stem: Stem, hour_branch: Branch) -> Result<StemBranch> {
    StemBranch::new(hour_stem_for(day_stem, hour_branch), hour_branch)
}

/// Year pillar of a lunar year
pub fn year_pillar(lunar_year: i32) -> StemBranch {
    StemBranch::from_cycle_index(i64::from(lunar_year) - 4)
}

/// Month pillar from the lunar month number (a leap month uses its base month)
pub fn month_pillar(year_stem: Stem, lunar_month: u32) -> Result<StemBranch> {
    if !(1..=12).contains(&lunar_month) {
        return Err(SajuError::pillar_lookup(format!(
            "lunar month {} has no month pillar",
            lunar_month
        )));
    }
    let month = i64::from(lunar_month);
    let stem = Stem::from_cycle((i64::from(year_stem.index()) % 5) * 2 + 2 + (month - 1));
    let branch = Branch::from_cycle(month + 1);
    StemBranch::new(stem, branch)
}

/// Day pillar by day count from the 2000-01-01 anchor
pub fn day_pillar(date: SolarDate) -> StemBranch {
    let days = i64::from(date.num_days_from_ce()) - DAY_ANCHOR_CE;
    StemBranch::from_cycle_index(days + DAY_ANCHOR_INDEX)
}

/// Compute the chart for a solar birth date and optional time slot.
///
/// 야자 moves the lookup date one day forward before any pillar is derived;
/// the hour branch stays 자.
pub fn compute_chart(
    calendar: &LunarCalendar,
    solar_date: SolarDate,
    time_slot: Option<TimeSlot>,
) -> Result<FourPillarChart> {
    let day_shifted = time_slot.map(TimeSlot::shifts_day).unwrap_or(false);
    let pillar_date = if day_shifted {
        solar_date
            .checked_add_signed(Duration::days(1))
            .ok_or_else(|| SajuError::pillar_lookup(format!("{} has no following day", solar_date)))?
    } else {
        solar_date
    };

    let lunar_date = calendar.to_lunar(pillar_date).map_err(|e| match e {
        SajuError::CalendarOutOfRange(msg) => SajuError::pillar_lookup(msg),
        other => other,
    })?;

    let year = year_pillar(lunar_date.year);
    let month = month_pillar(year.stem(), lunar_date.month)?;
    let day = day_pillar(pillar_date);
    let hour = time_slot
        .map(|slot| hour_pillar(day.stem(), slot.branch()))
        .transpose()?;

    debug!(
        "Chart for {} (slot {:?}): {} {} {} {:?}",
        solar_date,
        time_slot.map(TimeSlot::token),
        year,
        month,
        day,
        hour.map(StemBranch::label)
    );

    Ok(FourPillarChart {
        solar_date,
        pillar_date,
        lunar_date,
        year,
        month,
        day,
        hour,
        time_slot,
        day_shifted,
        ilju_index: day.cycle_index(),
    })
}

/// Calendar system of a birth date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CalendarKind {
    #[default]
    Solar,
    Lunar,
}

/// Raw birth input as submitted by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRequest {
    /// "YYYY-MM-DD" or "YYYYMMDD"
    pub birth_date: String,
    #[serde(default)]
    pub calendar: CalendarKind,
    #[serde(default)]
    pub is_leap_month: bool,
    /// Time slot token; absent or "모름" for an unknown birth time
    #[serde(default)]
    pub time_slot: Option<String>,
}

impl ChartRequest {
    /// Validate the input, convert to solar if needed and compute the chart
    pub fn compute_saju(&self, calendar: &LunarCalendar) -> Result<FourPillarChart> {
        let time_slot = TimeSlot::parse_optional(self.time_slot.as_deref())?;

        let solar_date = match self.calendar {
            CalendarKind::Solar => {
                if self.is_leap_month {
                    return Err(SajuError::invalid_leap_month(
                        "leap month flag only applies to lunar dates",
                    ));
                }
                parse_solar_date(&self.birth_date)?
            }
            CalendarKind::Lunar => {
                let (year, month, day) = parse_date_parts(&self.birth_date)?;
                calendar.validate_leap_month(year, month, self.is_leap_month)?;
                calendar.to_solar(LunarDate::new(year, month, day, self.is_leap_month))?
            }
        };

        compute_chart(calendar, solar_date, time_slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn labels(chart: &FourPillarChart) -> (String, String, String, Option<String>) {
        (
            chart.year.label(),
            chart.month.label(),
            chart.day.label(),
            chart.hour.map(StemBranch::label),
        )
    }

    #[test]
    fn test_day_pillar_anchors() {
        assert_eq!(day_pillar(ymd(2000, 1, 1)).label(), "무오");
        assert_eq!(day_pillar(ymd(2024, 1, 1)).label(), "갑자");
        assert_eq!(day_pillar(ymd(2024, 3, 1)).label(), "갑자");
        assert_eq!(day_pillar(ymd(2024, 3, 2)).label(), "을축");
        assert_eq!(day_pillar(ymd(2023, 12, 31)).label(), "계해");
        assert_eq!(day_pillar(ymd(1900, 1, 31)).label(), "갑진");
    }

    #[test]
    fn test_year_pillar() {
        assert_eq!(year_pillar(1984).label(), "갑자");
        assert_eq!(year_pillar(2024).label(), "갑진");
        assert_eq!(year_pillar(1998).label(), "무인");
    }

    #[test]
    fn test_month_pillar_five_tigers() {
        // 갑/기 years open with 병인, 을/경 with 무인, 병/신 with 경인, 정/임 with 임인, 무/계 with 갑인
        let firsts = ["병인", "무인", "경인", "임인", "갑인"];
        for stem in 0..10u8 {
            let first = month_pillar(Stem::new(stem).unwrap(), 1).unwrap();
            assert_eq!(first.label(), firsts[(stem % 5) as usize]);
        }
        assert_eq!(month_pillar(Stem::new(0).unwrap(), 12).unwrap().label(), "정축");
        assert!(month_pillar(Stem::new(0).unwrap(), 13).is_err());
    }

    #[test]
    fn test_hour_stems_for_all_combinations() {
        let family_start = ["갑", "병", "무", "경", "임"];
        for day in 0..10u8 {
            let day_stem = Stem::new(day).unwrap();
            for branch in 0..12u8 {
                let hour_branch = Branch::new(branch).unwrap();
                let stem = hour_stem_for(day_stem, hour_branch);
                assert_eq!(stem, hour_stem_for(day_stem, hour_branch));
                assert_eq!(stem.index() % 2, branch % 2);
                assert!(hour_pillar(day_stem, hour_branch).is_ok());
            }
            let rat_stem = hour_stem_for(day_stem, Branch::RAT);
            assert_eq!(rat_stem.korean(), family_start[(day % 5) as usize]);
        }

        // 갑 and 기 days start at 갑자
        for day in ["갑", "기"] {
            let pillar = hour_pillar(Stem::from_korean(day).unwrap(), Branch::RAT).unwrap();
            assert_eq!(pillar.label(), "갑자");
        }
    }

    #[test]
    fn test_night_branch_shift() {
        let calendar = LunarCalendar::bundled();
        let mut date = ymd(1990, 1, 1);
        while date <= ymd(1990, 12, 31) {
            let late = compute_chart(&calendar, date, Some(TimeSlot::LateRat)).unwrap();
            let next = compute_chart(
                &calendar,
                date + Duration::days(1),
                Some(TimeSlot::parse("자").unwrap()),
            )
            .unwrap();

            assert!(late.day_shifted);
            assert_eq!(late.solar_date, date);
            assert_eq!(late.day, next.day);
            assert_eq!(late.hour, next.hour);
            assert_eq!(late.hour.unwrap().branch(), Branch::RAT);
            date += Duration::days(7);
        }
    }

    #[test]
    fn test_early_rat_does_not_shift() {
        let calendar = LunarCalendar::bundled();
        let date = ymd(2024, 3, 1);
        let early = compute_chart(&calendar, date, Some(TimeSlot::EarlyRat)).unwrap();
        let plain = compute_chart(&calendar, date, None).unwrap();

        assert!(!early.day_shifted);
        assert_eq!(early.pillar_date, date);
        assert_eq!(early.day, plain.day);
        assert_eq!(early.day.label(), "갑자");
        assert_eq!(early.hour.unwrap().branch(), Branch::RAT);
        assert_eq!(early.hour.unwrap().label(), "갑자");
    }

    #[test]
    fn test_unknown_hour() {
        let calendar = LunarCalendar::bundled();
        let chart = compute_chart(&calendar, ymd(2024, 3, 1), None).unwrap();
        assert!(chart.hour.is_none());
        assert!(!chart.hour_known());
        assert!(chart.time_slot.is_none());
    }

    #[test]
    fn test_lunar_1998_example() {
        let calendar = LunarCalendar::bundled();
        let request = ChartRequest {
            birth_date: "1998-01-29".to_string(),
            calendar: CalendarKind::Lunar,
            is_leap_month: false,
            time_slot: Some("인".to_string()),
        };
        let chart = request.compute_saju(&calendar).unwrap();

        assert_eq!(chart.solar_date, ymd(1998, 2, 25));
        assert_eq!(
            labels(&chart),
            (
                "무인".to_string(),
                "갑인".to_string(),
                "계묘".to_string(),
                Some("갑인".to_string())
            )
        );
        assert_eq!(chart.hour.unwrap().branch().korean(), "인");
        assert_eq!(chart.ilju_index, chart.day.cycle_index());
    }

    #[test]
    fn test_solar_2024_example() {
        let calendar = LunarCalendar::bundled();
        let chart = compute_chart(&calendar, ymd(2024, 3, 1), Some(TimeSlot::Tiger)).unwrap();
        assert_eq!(chart.lunar_date, LunarDate::new(2024, 1, 21, false));
        assert_eq!(
            labels(&chart),
            (
                "갑진".to_string(),
                "병인".to_string(),
                "갑자".to_string(),
                Some("병인".to_string())
            )
        );
    }

    #[test]
    fn test_shift_across_lunar_new_year() {
        let calendar = LunarCalendar::bundled();
        // Lunar new year 2024 falls on 2024-02-10
        let chart = compute_chart(&calendar, ymd(2024, 2, 9), Some(TimeSlot::LateRat)).unwrap();
        assert_eq!(chart.pillar_date, ymd(2024, 2, 10));
        assert_eq!(chart.year.label(), "갑진");
        assert_eq!(chart.lunar_date, LunarDate::new(2024, 1, 1, false));

        let before = compute_chart(&calendar, ymd(2024, 2, 9), Some(TimeSlot::EarlyRat)).unwrap();
        assert_eq!(before.year.label(), "계묘");
    }

    #[test]
    fn test_leap_month_request_needs_confirmation() {
        let calendar = LunarCalendar::bundled();
        let mut request = ChartRequest {
            birth_date: "2020-04-01".to_string(),
            calendar: CalendarKind::Lunar,
            is_leap_month: false,
            time_slot: None,
        };
        assert!(matches!(
            request.compute_saju(&calendar),
            Err(SajuError::LeapMonthConfirmationRequired { year: 2020, month: 4 })
        ));

        request.is_leap_month = true;
        let chart = request.compute_saju(&calendar).unwrap();
        assert_eq!(chart.solar_date, ymd(2020, 5, 23));
        assert!(chart.lunar_date.is_leap_month);
    }

    #[test]
    fn test_out_of_range_is_lookup_failure() {
        let calendar = LunarCalendar::bundled();
        assert!(matches!(
            compute_chart(&calendar, ymd(1850, 6, 1), None),
            Err(SajuError::PillarLookupFailure(_))
        ));
        // Last covered day shifted past the end of the table
        let (_, last) = calendar.coverage().unwrap();
        assert!(compute_chart(&calendar, last, None).is_ok());
        assert!(matches!(
            compute_chart(&calendar, last, Some(TimeSlot::LateRat)),
            Err(SajuError::PillarLookupFailure(_))
        ));
    }

    #[test]
    fn test_invalid_slot_token() {
        let calendar = LunarCalendar::bundled();
        let request = ChartRequest {
            birth_date: "2024-03-01".to_string(),
            calendar: CalendarKind::Solar,
            is_leap_month: false,
            time_slot: Some("25시".to_string()),
        };
        assert!(matches!(
            request.compute_saju(&calendar),
            Err(SajuError::InvalidTimeSlotToken(_))
        ));
    }
}
