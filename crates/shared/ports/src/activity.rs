/// Port for the operator-facing activity log
///
/// Append-only between resets. Implementations must be safe to share between
/// the command task (writer) and the render task (reader and resetter).
pub trait ActivityLog: Send + Sync {
    /// Append an entry; `is_error` marks failures
    fn record(&self, is_error: bool, message: &str);

    /// Drop every entry
    fn reset(&self);

    /// Ordered copy of the current entries
    fn snapshot(&self) -> Vec<String>;
}
