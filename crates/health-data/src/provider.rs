//! Per-user health data provider.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::generator::MockHealthDataGenerator;
use crate::types::HealthSnapshot;

/// Supplies health data for prompt grounding.
#[async_trait]
pub trait HealthDataProvider: Send + Sync {
    async fn get(&self, user_id: &str) -> anyhow::Result<Option<HealthSnapshot>>;

    /// Returns the user's snapshot, generating one on first use.
    async fn get_or_generate(&self, user_id: &str) -> anyhow::Result<HealthSnapshot>;

    /// Replaces the user's snapshot with fresh data.
    async fn regenerate(&self, user_id: &str) -> anyhow::Result<HealthSnapshot>;

    /// Forgets the user's snapshot; true if one existed.
    async fn remove(&self, user_id: &str) -> anyhow::Result<bool>;
}

/// In-process mock provider: one cached snapshot per user.
pub struct MockHealthDataProvider {
    generator: MockHealthDataGenerator,
    snapshots: Arc<RwLock<HashMap<String, HealthSnapshot>>>,
}

impl MockHealthDataProvider {
    pub fn new() -> Self {
        Self::with_generator(MockHealthDataGenerator::new())
    }

    pub fn with_generator(generator: MockHealthDataGenerator) -> Self {
        Self {
            generator,
            snapshots: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Stores a fixed snapshot (tests and demos).
    pub async fn insert(&self, snapshot: HealthSnapshot) {
        self.snapshots
            .write()
            .await
            .insert(snapshot.user_id.clone(), snapshot);
    }
}

impl Default for MockHealthDataProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthDataProvider for MockHealthDataProvider {
    async fn get(&self, user_id: &str) -> anyhow::Result<Option<HealthSnapshot>> {
        Ok(self.snapshots.read().await.get(user_id).cloned())
    }

    async fn get_or_generate(&self, user_id: &str) -> anyhow::Result<HealthSnapshot> {
        if let Some(existing) = self.snapshots.read().await.get(user_id) {
            return Ok(existing.clone());
        }
        let mut snapshots = self.snapshots.write().await;
        let snapshot = snapshots
            .entry(user_id.to_string())
            .or_insert_with(|| {
                info!(user_id = %user_id, "Generating mock health data on first use");
                self.generator.generate(user_id)
            })
            .clone();
        Ok(snapshot)
    }

    async fn regenerate(&self, user_id: &str) -> anyhow::Result<HealthSnapshot> {
        let snapshot = self.generator.generate(user_id);
        info!(
            user_id = %user_id,
            steps = snapshot.daily_stats.steps,
            resting_hr = snapshot.heart_rate.resting,
            sleep_hours = snapshot.sleep.duration_hours,
            "Generated mock health data"
        );
        self.snapshots
            .write()
            .await
            .insert(user_id.to_string(), snapshot.clone());
        Ok(snapshot)
    }

    async fn remove(&self, user_id: &str) -> anyhow::Result<bool> {
        Ok(self.snapshots.write().await.remove(user_id).is_some())
    }
}
