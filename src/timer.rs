use std::time::{Duration, Instant};
/// Fixed-interval timer driven by the GUI frame loop.
///
/// The first tick comes one interval after `start`. Ticks missed while the
/// window was not repainting are coalesced into one.
#[derive(Clone, Debug)]
pub struct IntervalTimer {
    interval: Duration,
    next_due: Option<Instant>,
}
impl IntervalTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }
    pub fn stop(&mut self) {
        self.next_due = None;
    }
    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }
    /// Returns true when a tick is due at `now` and schedules the next one.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                let mut next = due + self.interval;
                if next <= now {
                    next = now + self.interval;
                }
                self.next_due = Some(next);
                true
            }
            _ => false,
        }
    }
    /// How long the GUI may sleep before this timer needs attention.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn fires_once_per_interval() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::new(Duration::from_secs(1));
        timer.start(t0);
        assert!(!timer.poll(t0 + Duration::from_millis(999)));
        assert!(timer.poll(t0 + Duration::from_millis(1000)));
        assert!(!timer.poll(t0 + Duration::from_millis(1500)));
        assert!(timer.poll(t0 + Duration::from_millis(2000)));
    }
    #[test]
    fn missed_ticks_are_coalesced() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::new(Duration::from_secs(1));
        timer.start(t0);
        let late = t0 + Duration::from_secs(10);
        assert!(timer.poll(late));
        assert!(!timer.poll(late));
        assert_eq!(timer.remaining(late), Some(Duration::from_secs(1)));
    }
    #[test]
    fn stopped_timer_never_fires() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::new(Duration::from_secs(1));
        assert!(!timer.poll(t0 + Duration::from_secs(5)));
        timer.start(t0);
        timer.stop();
        assert!(!timer.is_running());
        assert!(!timer.poll(t0 + Duration::from_secs(5)));
        assert_eq!(timer.remaining(t0), None);
    }
}
