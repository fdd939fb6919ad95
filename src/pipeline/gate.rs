//! Per-process run gate
//!
//! Keeps reading-triggered and scheduled runs from overlapping, and spaces
//! them by an optional cool-down. Callers that cannot enter skip their run
//! instead of waiting for the holder.

use std::time::{Duration, Instant};
use tokio::sync::{Mutex, MutexGuard};

pub struct RunGate {
    cooldown: Duration,
    last_started: Mutex<Option<Instant>>,
}

/// Held for the duration of a gated run
pub struct GatePermit<'a> {
    _guard: MutexGuard<'a, Option<Instant>>,
}

impl RunGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_started: Mutex::new(None),
        }
    }

    /// `None` if a run is in flight or the cool-down has not elapsed
    pub fn try_enter(&self) -> Option<GatePermit<'_>> {
        let mut guard = self.last_started.try_lock().ok()?;

        let now = Instant::now();
        if let Some(last) = *guard {
            if now.duration_since(last) < self.cooldown {
                return None;
            }
        }
        *guard = Some(now);

        Some(GatePermit { _guard: guard })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excludes_concurrent_runs() {
        let gate = RunGate::new(Duration::ZERO);
        let permit = gate.try_enter();
        assert!(permit.is_some());
        assert!(gate.try_enter().is_none());

        drop(permit);
        assert!(gate.try_enter().is_some());
    }

    #[test]
    fn test_cooldown_spaces_runs() {
        let gate = RunGate::new(Duration::from_secs(3600));
        drop(gate.try_enter().expect("first run enters"));
        assert!(gate.try_enter().is_none());
    }
}
