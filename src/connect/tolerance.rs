use std::time::Duration;

pub const DEFAULT_ATTEMPTS_MAX: u32 = 5;
pub const DEFAULT_RETRY_DELAY_INIT: Duration = Duration::from_millis(100);
pub const DEFAULT_RETRY_DELAY_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_RETRY_DELAY_MAX: Duration = Duration::from_secs(10);

/// How hard to try when acquiring a table.
///
/// Attempt one runs immediately. Every later attempt first waits the current
/// delay, which starts at `retry_delay_init` and grows by
/// `retry_delay_multiplier` up to `retry_delay_max`.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectTolerance {
    attempts_max: u32,
    retry_delay_init: Duration,
    retry_delay_multiplier: f64,
    retry_delay_max: Duration,
}

impl Default for ConnectTolerance {
    fn default() -> Self {
        Self {
            attempts_max: DEFAULT_ATTEMPTS_MAX,
            retry_delay_init: DEFAULT_RETRY_DELAY_INIT,
            retry_delay_multiplier: DEFAULT_RETRY_DELAY_MULTIPLIER,
            retry_delay_max: DEFAULT_RETRY_DELAY_MAX,
        }
    }
}

impl ConnectTolerance {
    /// Total attempts, first one included. Clamped to at least one.
    pub fn attempts_max(self, attempts_max: u32) -> Self {
        ConnectTolerance {
            attempts_max: attempts_max.max(1),
            ..self
        }
    }

    pub fn retry_delay_init(self, delay: Duration) -> Self {
        ConnectTolerance {
            retry_delay_init: delay,
            ..self
        }
    }

    pub fn retry_delay_multiplier(self, multiplier: f64) -> Self {
        ConnectTolerance {
            retry_delay_multiplier: multiplier,
            ..self
        }
    }

    pub fn retry_delay_max(self, delay: Duration) -> Self {
        ConnectTolerance {
            retry_delay_max: delay,
            ..self
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.attempts_max
    }

    /// Fresh delay schedule for one acquisition.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: None,
            init: self.retry_delay_init.min(self.retry_delay_max),
            multiplier: self.retry_delay_multiplier,
            max: self.retry_delay_max,
        }
    }
}

/// Delays to wait before each attempt: zero, then the initial delay, then
/// each previous delay scaled by the multiplier and capped.
#[derive(Clone, Debug)]
pub struct Backoff {
    next: Option<Duration>,
    init: Duration,
    multiplier: f64,
    max: Duration,
}

impl Backoff {
    pub fn next_delay(&mut self) -> Duration {
        match self.next {
            None => {
                self.next = Some(self.init);
                Duration::ZERO
            }
            Some(delay) => {
                let scaled = Duration::try_from_secs_f64(delay.as_secs_f64() * self.multiplier)
                    .unwrap_or(self.max);
                self.next = Some(scaled.min(self.max));
                delay
            }
        }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_delay())
    }
}

/// Blocks the current thread between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}
