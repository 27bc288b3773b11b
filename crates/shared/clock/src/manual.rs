use chrono::{Duration, Utc};
use parking_lot::RwLock;
use scalper_core::Timestamp;
use scalper_ports::Clock;

/// Clock frozen at a point in time until explicitly moved
///
/// Used wherever a test needs exact control over feed age and latency.
pub struct ManualClock {
    current: RwLock<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: RwLock::new(start),
        }
    }

    /// Freeze at the current wall-clock time
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Move time forward (or backward with a negative duration)
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.write();
        *current += by;
    }

    /// Jump to an absolute time
    pub fn set(&self, to: Timestamp) {
        *self.current.write() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_frozen() {
        let clock = ManualClock::starting_now();
        let t1 = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(clock.now(), t1);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::starting_now();
        let t1 = clock.now();
        clock.advance(Duration::milliseconds(1500));
        assert_eq!(clock.now() - t1, Duration::milliseconds(1500));

        clock.set(t1);
        assert_eq!(clock.now(), t1);
    }
}
