// src/promotion/keys.rs

//! Key naming for the counter store and the calendar strings embedded in it.
//!
//! Days are written `YYYY-M-D` and months `YYYY-M`, without zero padding.

use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;

pub fn day_key(date: NaiveDate) -> String {
    format!("{}-{}-{}", date.year(), date.month(), date.day())
}

pub fn month_key(date: NaiveDate) -> String {
    format!("{}-{}", date.year(), date.month())
}

/// Parses a `YYYY-M-D` day string. Zero-padded fields are accepted too.
pub fn parse_day(day: &str) -> Option<NaiveDate> {
    let mut parts = day.trim().splitn(3, '-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    let dom = parts.next()?.parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, dom)
}

pub fn losses_key(day: &str) -> String {
    format!("wheel_global_losses_{day}")
}

pub fn wins_key(day: &str) -> String {
    format!("wheel_global_wins_{day}")
}

pub fn force_win_key(day: &str) -> String {
    format!("wheel_force_win_token_{day}")
}

pub fn daily_prize_key(prize_id: &str, day: &str) -> String {
    format!("wheel_global_prize_{prize_id}_{day}")
}

pub fn monthly_prize_key(prize_id: &str, month: &str) -> String {
    format!("wheel_month_prize_{prize_id}_{month}")
}

/// Splits a comma-separated id list: trims, drops empties and repeats,
/// keeping first-seen order.
pub fn parse_prize_ids(raw: &str) -> Vec<String> {
    unique_prize_ids(raw.split(','))
}

pub fn unique_prize_ids<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .map(|id| id.as_ref().trim().to_string())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
