//! Scalper Clock Infrastructure
//!
//! Time sources for the terminal:
//!
//! - [`SystemClock`]: wall-clock time for live trading
//! - [`ManualClock`]: frozen time that only moves when a test advances it
//!
//! ## Usage
//!
//! ```ignore
//! use scalper_clock::{ManualClock, Clock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::starting_now();
//! let before = clock.now();
//! clock.advance(Duration::seconds(3));
//! assert_eq!(clock.now() - before, Duration::seconds(3));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use scalper_ports::Clock;
