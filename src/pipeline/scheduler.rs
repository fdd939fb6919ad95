//! Optional periodic assessment

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::AssessmentPipeline;

/// Run the pipeline every `every` through the shared gate. The first run
/// happens one period after start.
pub fn spawn(pipeline: Arc<AssessmentPipeline>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match pipeline.run_gated(Utc::now()).await {
                None => tracing::debug!("Scheduled assessment skipped"),
                Some(Ok(run)) => tracing::debug!(assessment_id = %run.assessment.id, "Scheduled assessment done"),
                Some(Err(e)) => tracing::error!("Scheduled assessment failed: {}", e),
            }
        }
    })
}
