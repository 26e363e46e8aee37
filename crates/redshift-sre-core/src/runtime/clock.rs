// crates/redshift-sre-core/src/runtime/clock.rs
// ============================================================================
// Module: System Clock
// Description: Wall-clock and monotonic time backed by the operating system.
// Dependencies: std, time
// ============================================================================

//! Operating-system [`Clock`] used outside tests.

use std::time::Duration;
use std::time::Instant;

use time::OffsetDateTime;

use crate::interfaces::Clock;

/// Clock backed by `std::time` and blocking sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_clock(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
