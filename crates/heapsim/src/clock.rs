//! Virtual time
//!
//! Collector steps never sleep. The clock only counts the simulated time the
//! committed steps would have taken; a driver maps it onto real delays.

use serde::Serialize;
use std::time::Duration;

/// Simulated elapsed time and tick count since the last reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualClock {
    ticks: u64,
    #[serde(rename = "elapsedMs", serialize_with = "as_millis")]
    elapsed: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl VirtualClock {
    /// Clock at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one tick that held the timeline for `duration`
    pub fn advance(&mut self, duration: Duration) {
        self.ticks += 1;
        self.elapsed += duration;
    }

    /// Ticks committed
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated time elapsed
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Back to zero
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_and_reset() {
        let mut clock = VirtualClock::new();
        clock.advance(Duration::from_millis(600));
        clock.advance(Duration::from_millis(1800));
        assert_eq!(clock.ticks(), 2);
        assert_eq!(clock.elapsed(), Duration::from_millis(2400));

        clock.reset();
        assert_eq!(clock, VirtualClock::default());
    }

    #[test]
    fn test_serialized_shape() {
        let mut clock = VirtualClock::new();
        clock.advance(Duration::from_millis(750));
        let json = serde_json::to_value(clock).unwrap();
        assert_eq!(json["ticks"], 1);
        assert_eq!(json["elapsedMs"], 750);
    }
}
