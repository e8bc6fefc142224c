// src/pacing.rs
//
// Per-topic pacing for outbound source calls. External search pages and the
// discussion API tolerate only a gentle request rate, so fetchers space
// their per-topic calls through a shared gate instead of sleeping inline.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Admits callers at most once per `interval`. The first call passes
/// immediately; later calls sleep until the interval since the previous
/// admission has elapsed. A zero interval disables pacing (used by tests).
pub struct FixedIntervalGate {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl FixedIntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let due = prev + self.interval;
            if due > Instant::now() {
                tokio::time::sleep_until(due).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_call_is_immediate() {
        let gate = FixedIntervalGate::new(Duration::from_secs(60));
        let t0 = Instant::now();
        gate.wait().await;
        assert!(t0.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn second_call_is_spaced() {
        let gate = FixedIntervalGate::new(Duration::from_millis(50));
        let t0 = Instant::now();
        gate.wait().await;
        gate.wait().await;
        assert!(t0.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn zero_interval_never_blocks() {
        let gate = FixedIntervalGate::new(Duration::ZERO);
        let t0 = Instant::now();
        for _ in 0..10 {
            gate.wait().await;
        }
        assert!(t0.elapsed() < Duration::from_millis(100));
    }
}
