//! Bundled lunisolar table, lunar years 1900 ..= 2100
//!
//! One word per lunar year:
//! - bits 0-3: leap month number (0 = no leap month)
//! - bits 4-15: month lengths, bit `0x10000 >> m` set when month `m` has 30 days
//! - bit 16: leap month has 30 days
//!
//! Lunar 1900-01-01 falls on solar 1900-01-31.

use saju_common::{Result, SajuError};

pub const FIRST_YEAR: i32 = 1900;
pub const LAST_YEAR: i32 = 2100;

/// Solar date of lunar FIRST_YEAR-01-01
pub const EPOCH: (i32, u32, u32) = (1900, 1, 31);

#[rustfmt::skip]
static YEAR_INFO: [u32; (LAST_YEAR - FIRST_YEAR + 1) as usize] = [
    0x04bd8, 0x04ae0, 0x0a570, 0x054d5, 0x0d260, 0x0d950, 0x16554, 0x056a0, 0x09ad0, 0x055d2, // 1900
    0x04ae0, 0x0a5b6, 0x0a4d0, 0x0d250, 0x1d255, 0x0b540, 0x0d6a0, 0x0ada2, 0x095b0, 0x14977, // 1910
    0x04970, 0x0a4b0, 0x0b4b5, 0x06a50, 0x06d40, 0x1ab54, 0x02b60, 0x09570, 0x052f2, 0x04970, // 1920
    0x06566, 0x0d4a0, 0x0ea50, 0x16a95, 0x05ad0, 0x02b60, 0x186e3, 0x092e0, 0x1c8d7, 0x0c950, // 1930
    0x0d4a0, 0x1d8a6, 0x0b550, 0x056a0, 0x1a5b4, 0x025d0, 0x092d0, 0x0d2b2, 0x0a950, 0x0b557, // 1940
    0x06ca0, 0x0b550, 0x15355, 0x04da0, 0x0a5b0, 0x14573, 0x052b0, 0x0a9a8, 0x0e950, 0x06aa0, // 1950
    0x0aea6, 0x0ab50, 0x04b60, 0x0aae4, 0x0a570, 0x05260, 0x0f263, 0x0d950, 0x05b57, 0x056a0, // 1960
    0x096d0, 0x04dd5, 0x04ad0, 0x0a4d0, 0x0d4d4, 0x0d250, 0x0d558, 0x0b540, 0x0b6a0, 0x195a6, // 1970
    0x095b0, 0x049b0, 0x0a974, 0x0a4b0, 0x0b27a, 0x06a50, 0x06d40, 0x0af46, 0x0ab60, 0x09570, // 1980
    0x04af5, 0x04970, 0x064b0, 0x074a3, 0x0ea50, 0x06b58, 0x05ac0, 0x0ab60, 0x096d5, 0x092e0, // 1990
    0x0c960, 0x0d954, 0x0d4a0, 0x0da50, 0x07552, 0x056a0, 0x0abb7, 0x025d0, 0x092d0, 0x0cab5, // 2000
    0x0a950, 0x0b4a0, 0x0baa4, 0x0ad50, 0x055d9, 0x04ba0, 0x0a5b0, 0x15176, 0x052b0, 0x0a930, // 2010
    0x07954, 0x06aa0, 0x0ad50, 0x05b52, 0x04b60, 0x0a6e6, 0x0a4e0, 0x0d260, 0x0ea65, 0x0d530, // 2020
    0x05aa0, 0x076a3, 0x096d0, 0x04afb, 0x04ad0, 0x0a4d0, 0x1d0b6, 0x0d250, 0x0d520, 0x0dd45, // 2030
    0x0b5a0, 0x056d0, 0x055b2, 0x049b0, 0x0a577, 0x0a4b0, 0x0aa50, 0x1b255, 0x06d20, 0x0ada0, // 2040
    0x14b63, 0x09370, 0x049f8, 0x04970, 0x064b0, 0x168a6, 0x0ea50, 0x06b20, 0x1a6c4, 0x0aae0, // 2050
    0x092e0, 0x0d2e3, 0x0c960, 0x0d557, 0x0d4a0, 0x0da50, 0x05d55, 0x056a0, 0x0a6d0, 0x055d4, // 2060
    0x052d0, 0x0a9b8, 0x0a950, 0x0b4a0, 0x0b6a6, 0x0ad50, 0x055a0, 0x0aba4, 0x0a5b0, 0x052b0, // 2070
    0x0b273, 0x06930, 0x07337, 0x06aa0, 0x0ad50, 0x14b55, 0x04b60, 0x0a570, 0x054e4, 0x0d160, // 2080
    0x0e968, 0x0d520, 0x0daa0, 0x16aa6, 0x056d0, 0x04ae0, 0x0a9d4, 0x0a2d0, 0x0d150, 0x0f252, // 2090
    0x0d520,                                                                                   // 2100
];

fn info(year: i32) -> Result<u32> {
    if !(FIRST_YEAR..=LAST_YEAR).contains(&year) {
        return Err(SajuError::out_of_range(format!(
            "lunar year {} is outside the supported range {}-{}",
            year, FIRST_YEAR, LAST_YEAR
        )));
    }
    Ok(YEAR_INFO[(year - FIRST_YEAR) as usize])
}

/// Leap month of `year`, `None` when the year has none
pub fn leap_month(year: i32) -> Result<Option<u32>> {
    let month = info(year)? & 0xf;
    Ok((month != 0).then_some(month))
}

/// Length of the leap month (0 when the year has none)
pub fn leap_month_days(year: i32) -> Result<u32> {
    let word = info(year)?;
    if word & 0xf == 0 {
        return Ok(0);
    }
    Ok(if word & 0x10000 != 0 { 30 } else { 29 })
}

/// Length of regular month `month` (1-12)
pub fn month_days(year: i32, month: u32) -> Result<u32> {
    if !(1..=12).contains(&month) {
        return Err(SajuError::invalid_date(format!("lunar month must be 1-12, got {}", month)));
    }
    let word = info(year)?;
    Ok(if word & (0x10000 >> month) != 0 { 30 } else { 29 })
}

/// Total days in lunar `year`, leap month included
pub fn year_days(year: i32) -> Result<u32> {
    Ok(days_in_word(info(year)?))
}

fn days_in_word(word: u32) -> u32 {
    let regular: u32 = (1..=12)
        .map(|m| if word & (0x10000 >> m) != 0 { 30 } else { 29 })
        .sum();
    let leap = match (word & 0xf, word & 0x10000) {
        (0, _) => 0,
        (_, 0) => 29,
        _ => 30,
    };
    regular + leap
}

/// Day offset of every lunar new year from the epoch, plus the end of the table
pub(crate) fn year_start_offsets() -> Vec<i64> {
    let mut offsets = Vec::with_capacity(YEAR_INFO.len() + 1);
    let mut acc = 0i64;
    offsets.push(acc);
    for word in YEAR_INFO.iter() {
        acc += i64::from(days_in_word(*word));
        offsets.push(acc);
    }
    offsets
}
