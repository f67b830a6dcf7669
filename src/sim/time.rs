//! Simulation clock and fixed-interval ticker

/// Monotonic simulation time in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Clock {
    now: f64,
}

impl Clock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulation time in seconds
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Jump forward to `at`; earlier timestamps are ignored
    pub fn advance_to(&mut self, at: f64) -> f64 {
        if at > self.now {
            self.now = at;
        }
        self.now
    }
}

/// Fires once every `interval` seconds of accumulated time
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: f64,
    since_last_tick: f64,
}

impl Ticker {
    /// Create a ticker that fires every `interval` seconds
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            since_last_tick: 0.0,
        }
    }

    /// Accumulate time and return true if a tick should occur
    pub fn update(&mut self, delta_secs: f64) -> bool {
        self.since_last_tick += delta_secs;

        if self.since_last_tick + super::TIME_EPSILON >= self.interval {
            self.since_last_tick = (self.since_last_tick - self.interval).max(0.0);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_never_goes_back() {
        let mut clock = Clock::new();
        assert_eq!(clock.advance_to(1.5), 1.5);
        assert_eq!(clock.advance_to(0.5), 1.5);
        assert_eq!(clock.now(), 1.5);
    }

    #[test]
    fn test_ticker_interval() {
        let mut ticker = Ticker::new(0.5);
        assert!(!ticker.update(0.2));
        assert!(!ticker.update(0.2));
        assert!(ticker.update(0.1));
        assert!(!ticker.update(0.1));
        assert!(!ticker.update(0.3));
        assert!(ticker.update(0.1));
    }
}
