use std::time::{Duration, Instant};

/// Default quiet period before a search is sent
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Trailing-edge debouncer driven by the caller's clock.
///
/// Each `touch` replaces the pending value and pushes the deadline out, so only
/// the last value of a burst is ever released.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a new value and restart the quiet period
    pub fn touch(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Release the pending value once its deadline has passed
    pub fn poll_ready(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((_, deadline)) if now >= deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value without releasing it
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_before_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.touch("a", start);

        assert_eq!(debouncer.poll_ready(start + Duration::from_millis(299)), None);
        assert_eq!(debouncer.poll_ready(start + Duration::from_millis(300)), Some("a"));
        assert_eq!(debouncer.poll_ready(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_burst_releases_last_value_once() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        // Keystrokes 100ms apart keep pushing the deadline out
        for (i, text) in ["b", "bu", "buy"].iter().enumerate() {
            let at = start + Duration::from_millis(100 * i as u64);
            assert_eq!(debouncer.poll_ready(at), None);
            debouncer.touch(*text, at);
        }

        let last_touch = start + Duration::from_millis(200);
        assert_eq!(debouncer.poll_ready(last_touch + Duration::from_millis(250)), None);
        assert_eq!(
            debouncer.poll_ready(last_touch + Duration::from_millis(300)),
            Some("buy")
        );
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_cancel_drops_pending() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.touch(1, start);
        debouncer.cancel();

        assert_eq!(debouncer.poll_ready(start + Duration::from_secs(1)), None);
        assert!(debouncer.deadline().is_none());
    }
}
