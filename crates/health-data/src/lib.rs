//! # Health data
//!
//! Mock Fitbit data for prompt grounding: today's activity, heart rate, last night's sleep,
//! goals, achievements and a seven-day history. No device integration.

mod generator;
mod provider;
mod types;

pub use generator::{MockHealthDataGenerator, ACHIEVEMENTS, HISTORY_DAYS};
pub use provider::{HealthDataProvider, MockHealthDataProvider};
pub use types::{
    DailyRecord, DailyStats, Goals, HealthMemory, HealthSnapshot, HeartRate, Sleep,
};
