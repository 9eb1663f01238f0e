// src/promotion/clock.rs

use chrono::{Local, NaiveDate};
use std::fmt::Debug;

/// Source of "today" for default day keys and the monthly counters.
pub trait Clock: Send + Sync + Debug {
    fn today(&self) -> NaiveDate;
}

/// Server local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
