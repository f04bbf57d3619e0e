use chrono::{DateTime, Duration, Utc};

/// A simulation clock that tracks the step index and wall-clock instant of
/// one episode.
///
/// The clock starts at step 0 on the episode start instant and moves forward
/// one control interval per [`EpisodeClock::advance`] until `total` steps
/// have elapsed.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use storage_env::sim::clock::EpisodeClock;
///
/// let start = Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap();
/// let mut clock = EpisodeClock::new(start, Duration::minutes(5), 2);
///
/// assert_eq!(clock.advance(), Some(start + Duration::minutes(5)));
/// assert_eq!(clock.advance(), Some(start + Duration::minutes(10)));
/// assert_eq!(clock.advance(), None);
/// assert!(clock.is_finished());
/// ```
#[derive(Debug, Clone)]
pub struct EpisodeClock {
    /// Episode start instant
    start: DateTime<Utc>,
    /// Time advanced per step
    interval: Duration,
    /// Steps taken so far
    current: usize,
    /// Total steps in the episode
    total: usize,
}

impl EpisodeClock {
    /// Creates a clock positioned at step 0 on `start`.
    pub fn new(start: DateTime<Utc>, interval: Duration, total: usize) -> Self {
        Self {
            start,
            interval,
            current: 0,
            total,
        }
    }

    /// Current step index.
    pub fn step(&self) -> usize {
        self.current
    }

    /// Current simulated instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.instant_at(self.current)
    }

    /// Instant the next [`advance`](Self::advance) would move to, if any.
    pub fn peek_next(&self) -> Option<DateTime<Utc>> {
        (self.current < self.total).then(|| self.instant_at(self.current + 1))
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some(instant)` - The new current instant
    /// * `None` - If the clock has already reached its total steps
    pub fn advance(&mut self) -> Option<DateTime<Utc>> {
        if self.current < self.total {
            self.current += 1;
            Some(self.now())
        } else {
            None
        }
    }

    /// Returns `true` once `total` steps have been taken.
    pub fn is_finished(&self) -> bool {
        self.current >= self.total
    }

    fn instant_at(&self, step: usize) -> DateTime<Utc> {
        self.start + Duration::seconds(self.interval.num_seconds() * step as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_new_clock() {
        let clock = EpisodeClock::new(start(), Duration::minutes(5), 288);
        assert_eq!(clock.step(), 0);
        assert_eq!(clock.now(), start());
        assert!(!clock.is_finished());
    }

    #[test]
    fn test_advance() {
        let mut clock = EpisodeClock::new(start(), Duration::minutes(5), 2);
        assert_eq!(clock.peek_next(), Some(start() + Duration::minutes(5)));
        assert_eq!(clock.advance(), Some(start() + Duration::minutes(5)));
        assert_eq!(clock.step(), 1);
        assert_eq!(clock.advance(), Some(start() + Duration::minutes(10)));
        assert_eq!(clock.peek_next(), None);
        assert_eq!(clock.advance(), None);
        assert_eq!(clock.step(), 2);
    }

    #[test]
    fn test_full_day() {
        let mut clock = EpisodeClock::new(start(), Duration::minutes(5), 288);
        let mut ticks = 0;
        while clock.advance().is_some() {
            ticks += 1;
        }
        assert_eq!(ticks, 288);
        assert_eq!(clock.now(), start() + Duration::hours(24));
    }

    #[test]
    fn test_empty_clock() {
        let mut clock = EpisodeClock::new(start(), Duration::minutes(5), 0);
        assert!(clock.is_finished());
        assert_eq!(clock.advance(), None);
    }
}
