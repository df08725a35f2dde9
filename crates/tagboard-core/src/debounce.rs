//! Clock-driven debounce.
//!
//! The caller owns time: every mutation and poll takes `now`, so the event
//! loop decides when timers fire and tests never sleep.

use std::time::{Duration, Instant};

/// A value whose propagation lags its input until the input has been stable
/// for `delay`.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    delay: Duration,
    latest: T,
    emitted: T,
    deadline: Option<Instant>,
}

impl<T: Clone + PartialEq> Debounced<T> {
    /// Start with `initial` already propagated.
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            latest: initial.clone(),
            emitted: initial,
            deadline: None,
        }
    }

    /// Record a new input value and restart the timer from `now`.
    ///
    /// Any emission still pending for an older value is discarded.
    pub fn set(&mut self, value: T, now: Instant) {
        if value == self.emitted {
            // Reverting to the propagated value: the old timer would emit a
            // no-op, so drop it.
            self.latest = value;
            self.deadline = None;
            return;
        }
        self.latest = value;
        self.deadline = Some(now + self.delay);
    }

    /// Fire the timer if its deadline has passed.
    ///
    /// Returns the newly propagated value, or `None` when nothing changed.
    pub fn poll(&mut self, now: Instant) -> Option<&T> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.emit(),
            _ => None,
        }
    }

    /// Propagate the pending value immediately.
    pub fn flush(&mut self) -> Option<&T> {
        if self.deadline.is_some() {
            self.emit()
        } else {
            None
        }
    }

    /// Drop the pending emission without propagating it.
    ///
    /// Called on teardown so no timer fires into a closed view.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            tracing::trace!("debounce: pending emission cancelled");
        }
        self.latest = self.emitted.clone();
    }

    /// Last propagated value.
    pub const fn value(&self) -> &T {
        &self.emitted
    }

    /// Most recent input, propagated or not.
    pub const fn latest(&self) -> &T {
        &self.latest
    }

    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the pending emission is due, if any. Lets the event loop size its
    /// poll timeout.
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    fn emit(&mut self) -> Option<&T> {
        self.deadline = None;
        if self.latest == self.emitted {
            return None;
        }
        self.emitted = self.latest.clone();
        Some(&self.emitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(1000);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn emits_after_quiet_interval() {
        let t0 = Instant::now();
        let mut d = Debounced::new(String::new(), DELAY);
        d.set("rust".into(), t0);

        assert_eq!(d.poll(t0 + ms(999)), None);
        assert_eq!(d.value(), "");
        assert_eq!(d.poll(t0 + ms(1000)).map(String::as_str), Some("rust"));
        assert_eq!(d.value(), "rust");
        assert!(!d.is_pending());
    }

    #[test]
    fn rapid_changes_only_propagate_the_last_value() {
        let t0 = Instant::now();
        let mut d = Debounced::new(String::new(), DELAY);
        d.set("r".into(), t0);
        d.set("ru".into(), t0 + ms(300));
        d.set("rus".into(), t0 + ms(600));

        // The first deadline would have been t0+1000; it was superseded.
        assert_eq!(d.poll(t0 + ms(1000)), None);
        assert_eq!(d.poll(t0 + ms(1599)), None);
        assert_eq!(d.poll(t0 + ms(1600)).map(String::as_str), Some("rus"));
    }

    #[test]
    fn reverting_to_emitted_value_cancels_timer() {
        let t0 = Instant::now();
        let mut d = Debounced::new("a".to_string(), DELAY);
        d.set("ab".into(), t0);
        d.set("a".into(), t0 + ms(10));
        assert!(!d.is_pending());
        assert_eq!(d.poll(t0 + ms(5000)), None);
    }

    #[test]
    fn cancel_prevents_late_emission() {
        let t0 = Instant::now();
        let mut d = Debounced::new(0_u32, DELAY);
        d.set(7, t0);
        d.cancel();
        assert_eq!(d.poll(t0 + ms(2000)), None);
        assert_eq!(*d.value(), 0);
        assert_eq!(*d.latest(), 0);
    }

    #[test]
    fn flush_emits_immediately() {
        let t0 = Instant::now();
        let mut d = Debounced::new(0_u32, DELAY);
        d.set(3, t0);
        assert_eq!(d.flush(), Some(&3));
        assert_eq!(d.flush(), None);
    }

    #[test]
    fn deadline_tracks_latest_input() {
        let t0 = Instant::now();
        let mut d = Debounced::new(0_u32, DELAY);
        d.set(1, t0);
        d.set(2, t0 + ms(200));
        assert_eq!(d.deadline(), Some(t0 + ms(1200)));
    }
}
