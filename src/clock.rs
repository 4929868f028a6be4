use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" in milliseconds, the unit shooting-star timers are stored in.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

#[cfg(test)]
pub(crate) mod manual {
    use super::Clock;
    use std::cell::Cell;

    // Test clock that only moves when told to
    pub struct ManualClock {
        now: Cell<f64>,
    }

    impl ManualClock {
        pub fn new(start_ms: f64) -> Self {
            Self { now: Cell::new(start_ms) }
        }

        pub fn advance(&self, ms: f64) {
            self.now.set(self.now.get() + ms);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> f64 {
            self.now.get()
        }
    }
}
