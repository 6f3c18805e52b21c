//! Health record types and their prompt/memory renderings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub steps: u32,
    pub calories_burned: f64,
    pub active_minutes: u32,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRate {
    pub resting: u32,
    pub current: u32,
    pub max_today: u32,
    pub variability: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sleep {
    pub duration_hours: f64,
    pub deep_sleep_hours: f64,
    pub rem_sleep_hours: f64,
    pub light_sleep_hours: f64,
    pub sleep_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goals {
    pub daily_steps: u32,
    pub weekly_workouts: u32,
    pub sleep_target: f64,
    pub resting_heart_rate_target: u32,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            daily_steps: 10000,
            weekly_workouts: 3,
            sleep_target: 8.0,
            resting_heart_rate_target: 65,
        }
    }
}

/// One day of the history series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub steps: u32,
    pub resting_heart_rate: u32,
    pub sleep_hours: f64,
    pub sleep_score: u32,
}

/// A memory to write when a user is initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthMemory {
    pub content: String,
    pub context: String,
}

/// Everything the assistant knows about a user's (mock) device data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub user_id: String,
    pub generated_at: DateTime<Utc>,
    pub daily_stats: DailyStats,
    pub heart_rate: HeartRate,
    pub sleep: Sleep,
    pub goals: Goals,
    pub achievements: Vec<String>,
    /// Seven days, oldest first; the last entry is today.
    pub history: Vec<DailyRecord>,
}

impl HealthSnapshot {
    pub fn weekly_steps(&self) -> u32 {
        self.history.iter().map(|d| d.steps).sum()
    }

    pub fn weekly_step_goal(&self) -> u32 {
        self.goals.daily_steps * self.history.len().max(1) as u32
    }

    /// Steps still needed to reach the weekly goal; 0 when met.
    pub fn weekly_steps_remaining(&self) -> u32 {
        self.weekly_step_goal().saturating_sub(self.weekly_steps())
    }

    pub fn days_meeting_step_goal(&self) -> usize {
        self.history
            .iter()
            .filter(|d| d.steps >= self.goals.daily_steps)
            .count()
    }

    /// Health data section for the system prompt.
    pub fn summary(&self) -> String {
        let d = &self.daily_stats;
        let hr = &self.heart_rate;
        let s = &self.sleep;
        let g = &self.goals;
        let step_pct = if g.daily_steps == 0 {
            0
        } else {
            (d.steps as f64 / g.daily_steps as f64 * 100.0).round() as u32
        };

        let mut lines = Vec::new();
        lines.push(format!(
            "Today's activity: {} steps ({}% of the {} step goal), {} active minutes, {:.1} km, {:.0} calories burned",
            d.steps, step_pct, g.daily_steps, d.active_minutes, d.distance_km, d.calories_burned
        ));
        lines.push(format!(
            "Heart rate: resting {} bpm (target {} bpm), current {} bpm, max today {} bpm, variability {} ms",
            hr.resting, g.resting_heart_rate_target, hr.current, hr.max_today, hr.variability
        ));
        lines.push(format!(
            "Last night's sleep: {:.1} hours (deep {:.1} h, REM {:.1} h, light {:.1} h), sleep score {}, target {:.1} hours",
            s.duration_hours, s.deep_sleep_hours, s.rem_sleep_hours, s.light_sleep_hours, s.sleep_score, g.sleep_target
        ));
        let remaining = self.weekly_steps_remaining();
        let progress = if remaining == 0 {
            "goal met".to_string()
        } else {
            format!("{} steps to go", remaining)
        };
        lines.push(format!(
            "This week: {} steps over {} days against a weekly goal of {} ({}), daily goal met on {} of {} days",
            self.weekly_steps(),
            self.history.len(),
            self.weekly_step_goal(),
            progress,
            self.days_meeting_step_goal(),
            self.history.len()
        ));
        lines.push("Daily history (oldest first):".to_string());
        for day in &self.history {
            lines.push(format!(
                "- {}: {} steps, resting HR {} bpm, sleep {:.1} h (score {})",
                day.date, day.steps, day.resting_heart_rate, day.sleep_hours, day.sleep_score
            ));
        }
        lines.push(format!(
            "Goals: {} daily steps, {} weekly workouts, {:.1} hours sleep, resting heart rate {} bpm",
            g.daily_steps, g.weekly_workouts, g.sleep_target, g.resting_heart_rate_target
        ));
        if !self.achievements.is_empty() {
            lines.push(format!("Recent achievements: {}", self.achievements.join("; ")));
        }
        lines.join("\n")
    }

    /// The memories written when the user is initialized.
    pub fn initial_memories(&self) -> Vec<HealthMemory> {
        let memory = |content: String, context: &str| HealthMemory {
            content,
            context: context.to_string(),
        };
        vec![
            memory(
                format!("User's daily step count: {} steps", self.daily_stats.steps),
                "Daily activity tracking data",
            ),
            memory(
                format!("User's resting heart rate: {} bpm", self.heart_rate.resting),
                "Heart rate monitoring data",
            ),
            memory(
                format!(
                    "User's sleep duration: {:.1} hours with sleep score {}",
                    self.sleep.duration_hours, self.sleep.sleep_score
                ),
                "Sleep quality and duration data",
            ),
            memory(
                format!(
                    "User's current goals: {} daily steps, {} weekly workouts",
                    self.goals.daily_steps, self.goals.weekly_workouts
                ),
                "Fitness and health goals",
            ),
            memory(
                format!("Recent achievements: {}", self.achievements.join(", ")),
                "User's fitness accomplishments",
            ),
        ]
    }
}
