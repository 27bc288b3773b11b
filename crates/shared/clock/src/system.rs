use chrono::Utc;
use scalper_core::Timestamp;
use scalper_ports::Clock;

/// Wall-clock time in UTC, used by the running terminal
///
/// Wall time can step backwards (NTP adjustments), so consumers clamp the
/// durations they derive from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        SystemClock
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}
