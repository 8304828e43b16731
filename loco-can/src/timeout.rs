//! Countdown used for liveness supervision.

/// A retriggerable countdown.
pub trait Countdown {
    /// Arms the countdown with a new window.
    fn start(&mut self, timeout_ms: u32);

    /// True once the window has passed since the last start or retrigger.
    fn expired(&mut self) -> bool;

    /// Restarts the window without changing its length.
    fn retrigger(&mut self);
}

/// Free running millisecond counter. It may wrap.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Software countdown on top of a [`Clock`].
///
/// Reports expired until it has been started.
pub struct Timeout<C> {
    clock: C,
    started_at: u32,
    timeout_ms: Option<u32>,
}

impl<C: Clock> Timeout<C> {
    pub fn new(clock: C) -> Self {
        Timeout {
            clock,
            started_at: 0,
            timeout_ms: None,
        }
    }

    pub fn timeout_ms(&self) -> Option<u32> {
        self.timeout_ms
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock> Countdown for Timeout<C> {
    fn start(&mut self, timeout_ms: u32) {
        self.timeout_ms = Some(timeout_ms);
        self.started_at = self.clock.now_ms();
    }

    fn expired(&mut self) -> bool {
        match self.timeout_ms {
            Some(timeout_ms) => self.clock.now_ms().wrapping_sub(self.started_at) >= timeout_ms,
            None => true,
        }
    }

    fn retrigger(&mut self) {
        self.started_at = self.clock.now_ms();
    }
}
