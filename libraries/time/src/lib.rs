#![allow(missing_docs, reason = "TODO add later")]

use core::time::Duration;
use web_time::Instant;

/// Monotonic elapsed-time source for frame-rate independent animation.
///
/// One instance lives for the whole process; each [`FrameClock::tick`]
/// returns the time that passed since the previous tick.
pub struct FrameClock {
    last_tick: Instant,
}

impl FrameClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
        }
    }

    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick);
        self.last_tick = now;
        elapsed
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_measures_the_gap_since_the_previous_tick() {
        let mut clock = FrameClock::new();
        std::thread::sleep(Duration::from_millis(5));
        let first = clock.tick();
        assert!(first >= Duration::from_millis(5));

        // a second tick only covers the time since the first one
        let second = clock.tick();
        assert!(second < first);
    }
}
