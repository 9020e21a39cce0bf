//! Saju calendar
//!
//! Sexagenary arithmetic, lunisolar conversion and four-pillar charts

mod converter;
mod lunar_table;
mod pillar;
mod relations;
mod sexagenary;
mod time_slot;

pub use converter::{parse_date_parts, parse_solar_date, LunarCalendar, LunarDate, SolarDate};
pub use lunar_table::{FIRST_YEAR, LAST_YEAR};
pub use pillar::{
    compute_chart, day_pillar, hour_pillar, hour_stem_for, month_pillar, year_pillar,
    CalendarKind, ChartRequest, FourPillarChart,
};
pub use relations::{
    element_balance, hidden_stems, main_hidden_stem, stars_for_branch, LifeStage, Star, TenGod,
};
pub use sexagenary::{Branch, Element, Polarity, Stem, StemBranch, BRANCHES_HANJA, BRANCHES_KO, STEMS_HANJA, STEMS_KO};
pub use time_slot::TimeSlot;
