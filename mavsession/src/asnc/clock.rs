use std::time::Instant;

use crate::io::Clock;

/// <sup>`async`</sup>
/// Clock based on [`tokio::time::Instant`].
///
/// Honours paused and advanced time in Tokio tests.
#[derive(Copy, Clone, Debug, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}
