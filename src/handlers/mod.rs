// src/handlers/mod.rs

pub mod counters;
pub mod health;

pub use counters::{get_counters, method_not_allowed, post_counters, preflight};
pub use health::{health_check, metrics_handler};
