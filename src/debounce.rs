use std::time::{Duration, Instant};

/// Default delay for coalescing window resize events.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(66);

/// Coalesces bursts of events into a single delayed action. The first
/// request arms a deadline; further requests while armed are absorbed.
/// The deadline is not rescheduled and an armed deadline is never
/// cancelled, it simply fires once.
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn request(&mut self, now: Instant) {
        if self.deadline.is_none() {
            self.deadline = Some(now + self.delay);
        }
    }

    /// True exactly once after the armed deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_of_requests_fires_once() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(66));

        for offset_ms in [0, 5, 10, 30, 60] {
            debounce.request(start + Duration::from_millis(offset_ms));
        }

        assert!(!debounce.poll(start + Duration::from_millis(65)));
        assert!(debounce.poll(start + Duration::from_millis(66)));
        assert!(!debounce.poll(start + Duration::from_millis(200)));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn request_after_fire_rearms() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(66));

        debounce.request(start);
        assert!(debounce.poll(start + Duration::from_millis(100)));

        debounce.request(start + Duration::from_millis(100));
        assert!(debounce.is_pending());
        assert!(!debounce.poll(start + Duration::from_millis(150)));
        assert!(debounce.poll(start + Duration::from_millis(166)));
    }

    #[test]
    fn deadline_keeps_first_request_time() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(66));

        debounce.request(start);
        // A late request must not push the deadline out.
        debounce.request(start + Duration::from_millis(60));
        assert!(debounce.poll(start + Duration::from_millis(66)));
    }
}
