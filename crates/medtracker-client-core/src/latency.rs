use std::time::Duration;

pub const DEFAULT_LATENCY: Duration = Duration::from_millis(500);
pub const MAX_LATENCY: Duration = Duration::from_secs(10);

/// Artificial delay standing in for a network round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedLatency(Duration);

impl SimulatedLatency {
    pub fn new(delay: Duration) -> Self {
        Self(delay.min(MAX_LATENCY))
    }

    pub fn none() -> Self {
        Self(Duration::ZERO)
    }

    pub fn delay(self) -> Duration {
        self.0
    }

    /// Always suspends, even with a zero delay.
    pub async fn pause(self) {
        if self.0.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.0).await;
        }
    }
}

impl Default for SimulatedLatency {
    fn default() -> Self {
        Self(DEFAULT_LATENCY)
    }
}
