use std::time::{Duration, Instant};

/// Decides when the host loop lets the engine do its work.
#[derive(Debug)]
pub struct Ticker {
    interval: Duration,
    next: Option<Instant>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next.is_some_and(|next| next <= now)
    }

    pub fn rearm(&mut self, now: Instant) {
        if self.is_running() {
            self.start(now);
        }
    }

    /// Moves the next tick earlier, never later.
    pub fn pull(&mut self, at: Instant) {
        if let Some(next) = &mut self.next
            && at < *next
        {
            *next = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_on_interval() {
        let now = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(10));

        assert!(!ticker.is_due(now + Duration::from_secs(1)));

        ticker.start(now);
        assert!(!ticker.is_due(now + Duration::from_millis(5)));
        assert!(ticker.is_due(now + Duration::from_millis(10)));

        ticker.rearm(now + Duration::from_millis(10));
        assert_eq!(ticker.deadline(), Some(now + Duration::from_millis(20)));
    }

    #[test]
    fn pull_only_moves_earlier() {
        let now = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(10));
        ticker.start(now);

        ticker.pull(now + Duration::from_millis(50));
        assert_eq!(ticker.deadline(), Some(now + Duration::from_millis(10)));

        ticker.pull(now + Duration::from_millis(2));
        assert_eq!(ticker.deadline(), Some(now + Duration::from_millis(2)));
    }

    #[test]
    fn stopped_ticker_ignores_requests() {
        let now = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(10));

        ticker.pull(now);
        ticker.rearm(now);

        assert!(!ticker.is_running());
        assert_eq!(ticker.deadline(), None);
    }
}
