// src/promotion/pacing.rs

//! Pacing of the monthly-limited prize.
//!
//! The prize may only drop on Wednesdays, Thursdays and Fridays. On those
//! days a deterministic draw is compared against the share of the remaining
//! allotment per remaining day of the month, so the allotment is spread out
//! instead of being exhausted in the first week.

use chrono::{Datelike, NaiveDate, Weekday};

/// Prize id subject to pacing.
pub const PACED_PRIZE: &str = "OFF10";

const PACED_WEEKDAYS: [Weekday; 3] = [Weekday::Wed, Weekday::Thu, Weekday::Fri];

/// Deterministic draw in `[0, 1)` for a string seed.
///
/// The seed (an empty seed is replaced by `"seed"`) is hashed FNV-1a style
/// over its UTF-16 code units. After each XOR the state is taken as a signed
/// 32-bit integer and multiplied by the FNV prime in `f64`, which rounds to
/// 53 bits; the product is then reduced modulo 2^32. The hash
/// seeds a single mulberry32 step and the 32-bit output is divided by 2^32.
/// Pacing decisions already made for past days depend on this exact
/// arithmetic.
pub fn seeded_random(seed: &str) -> f64 {
    let seed = if seed.is_empty() { "seed" } else { seed };
    mulberry32(fnv1a_utf16(seed))
}

fn fnv1a_utf16(s: &str) -> u32 {
    s.encode_utf16().fold(2_166_136_261_u32, |hash, unit| {
        let mixed = (hash ^ u32::from(unit)) as i32;
        (f64::from(mixed) * 16_777_619.0).rem_euclid(4_294_967_296.0) as u32
    })
}

fn mulberry32(state: u32) -> f64 {
    let mut t = state.wrapping_add(0x6D2B_79F5);
    t = (t ^ (t >> 15)).wrapping_mul(t | 1);
    t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
    f64::from(t ^ (t >> 14)) / 4_294_967_296.0
}

pub fn pacing_seed(month: &str, day: &str) -> String {
    format!("{month}-{day}-{PACED_PRIZE}")
}

pub fn is_paced_weekday(date: NaiveDate) -> bool {
    PACED_WEEKDAYS.contains(&date.weekday())
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = match date.month() {
        12 => (date.year() + 1, 1),
        m => (date.year(), m + 1),
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map_or(31, |last| last.day())
}

/// Days left in `date`'s month, counting `date` itself. Never below 1.
pub fn days_remaining_in_month(date: NaiveDate) -> u32 {
    (days_in_month(date) + 1).saturating_sub(date.day()).max(1)
}

/// `min(1, remaining / days_remaining_in_month)`.
pub fn pacing_ratio(remaining: i64, date: NaiveDate) -> f64 {
    let days = f64::from(days_remaining_in_month(date));
    (remaining.max(0) as f64 / days).min(1.0)
}

/// Whether the paced prize may be awarded on `date`.
///
/// `None` for `date` means the caller's day string did not parse; such a day
/// is never eligible.
pub fn allow_paced_prize(remaining: i64, date: Option<NaiveDate>, month: &str, day: &str) -> bool {
    if remaining <= 0 {
        return false;
    }
    let Some(date) = date.filter(|d| is_paced_weekday(*d)) else {
        return false;
    };
    seeded_random(&pacing_seed(month, day)) < pacing_ratio(remaining, date)
}
