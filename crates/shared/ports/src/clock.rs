use scalper_core::Timestamp;

/// Source of receipt timestamps
///
/// Market state stamps every applied execution batch with `now()` and
/// measures snapshot age and feed latency against it. Tests swap in a
/// manually driven clock so those durations are exact.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
