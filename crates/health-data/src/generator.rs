//! Random mock data generator.

use std::sync::Mutex;

use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{DailyRecord, DailyStats, Goals, HealthSnapshot, HeartRate, Sleep};

pub const HISTORY_DAYS: usize = 7;

pub const ACHIEVEMENTS: [&str; 3] = [
    "7-day streak of meeting step goal",
    "Improved sleep score by 15% this month",
    "Consistent heart rate variability",
];

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Generates [`HealthSnapshot`]s. Seeded generators are reproducible.
pub struct MockHealthDataGenerator {
    rng: Mutex<StdRng>,
}

impl MockHealthDataGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn generate(&self, user_id: &str) -> HealthSnapshot {
        self.generate_for(user_id, Utc::now().date_naive())
    }

    /// Generates a snapshot whose history ends on `today`.
    pub fn generate_for(&self, user_id: &str, today: NaiveDate) -> HealthSnapshot {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());

        let base_steps: u32 = rng.gen_range(6000..=12000);
        let base_heart_rate: u32 = rng.gen_range(58..=72);
        let base_sleep: f64 = rng.gen_range(6.5..=8.5);

        let daily_stats = DailyStats {
            steps: base_steps,
            calories_burned: base_steps as f64 * 0.04,
            active_minutes: rng.gen_range(20..=60),
            distance_km: base_steps as f64 * 0.0008,
        };
        let heart_rate = HeartRate {
            resting: base_heart_rate,
            current: rng.gen_range(base_heart_rate + 10..=base_heart_rate + 40),
            max_today: rng.gen_range(base_heart_rate + 50..=base_heart_rate + 80),
            variability: rng.gen_range(20..=50),
        };
        let sleep = Sleep {
            duration_hours: base_sleep,
            deep_sleep_hours: base_sleep * 0.25,
            rem_sleep_hours: base_sleep * 0.20,
            light_sleep_hours: base_sleep * 0.55,
            sleep_score: rng.gen_range(70..=95),
        };

        let mut history = Vec::with_capacity(HISTORY_DAYS);
        for days_ago in (1..HISTORY_DAYS as i64).rev() {
            history.push(DailyRecord {
                date: today - Duration::days(days_ago),
                steps: rng.gen_range(6000..=12000),
                resting_heart_rate: rng.gen_range(58..=72),
                sleep_hours: round1(rng.gen_range(6.5..=8.5)),
                sleep_score: rng.gen_range(70..=95),
            });
        }
        history.push(DailyRecord {
            date: today,
            steps: daily_stats.steps,
            resting_heart_rate: heart_rate.resting,
            sleep_hours: round1(sleep.duration_hours),
            sleep_score: sleep.sleep_score,
        });

        HealthSnapshot {
            user_id: user_id.to_string(),
            generated_at: Utc::now(),
            daily_stats,
            heart_rate,
            sleep,
            goals: Goals::default(),
            achievements: ACHIEVEMENTS.iter().map(|a| a.to_string()).collect(),
            history,
        }
    }
}

impl Default for MockHealthDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}
