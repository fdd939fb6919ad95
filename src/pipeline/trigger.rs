//! Reading-count trigger

use chrono::{DateTime, Duration, Utc};

use crate::error::PersistenceError;
use crate::store::ReadingStore;

/// Fires when at least `min_readings` were captured in the trailing window.
/// Holds no state: every call re-counts from the store.
#[derive(Debug, Clone, Copy)]
pub struct TriggerPolicy {
    window: Duration,
    min_readings: i64,
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self {
            window: Duration::minutes(30),
            min_readings: 10,
        }
    }
}

impl TriggerPolicy {
    pub fn new(window: Duration, min_readings: i64) -> Self {
        Self { window, min_readings }
    }

    /// Start of the window ending at `now`, inclusive. Saturates at the
    /// earliest representable instant.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub async fn should_evaluate(
        &self,
        readings: &dyn ReadingStore,
        now: DateTime<Utc>,
    ) -> Result<bool, PersistenceError> {
        let count = readings.count_since(self.window_start(now), now).await?;
        tracing::debug!(count, threshold = self.min_readings, "trigger evaluated");
        Ok(count >= self.min_readings)
    }
}
