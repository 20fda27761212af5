use std::time::{Duration, Instant};

/// Which way the content is moving under the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Offset decreasing, towards the top edge.
    Up,
    /// Offset increasing, towards the bottom edge.
    Down,
}

const VELOCITY_SMOOTHING: f64 = 0.3;

/// Tracks scroll direction and velocity from consecutive scroll events.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    last_offset: Option<f64>,
    last_event: Option<Instant>,
    direction: Option<ScrollDirection>,
    /// Smoothed velocity in offset units per millisecond, signed.
    velocity: f64,
    idle_after: Duration,
}

impl ScrollTracker {
    pub fn new(idle_after: Duration) -> Self {
        Self {
            last_offset: None,
            last_event: None,
            direction: None,
            velocity: 0.0,
            idle_after,
        }
    }

    /// Feeds one scroll event. Returns the direction after the event.
    pub fn record(&mut self, offset: f64, now: Instant) -> Option<ScrollDirection> {
        let previous = self.last_offset.replace(offset);
        let previous_at = self.last_event.replace(now);

        let Some(previous) = previous else {
            return self.direction;
        };

        let delta = offset - previous;
        if delta > 0.0 {
            self.direction = Some(ScrollDirection::Down);
        } else if delta < 0.0 {
            self.direction = Some(ScrollDirection::Up);
        }

        if let Some(previous_at) = previous_at {
            let elapsed_ms = now.saturating_duration_since(previous_at).as_secs_f64() * 1000.0;
            if elapsed_ms > 0.0 {
                let instant_velocity = delta / elapsed_ms;
                if now.saturating_duration_since(previous_at) > self.idle_after {
                    self.velocity = instant_velocity;
                } else {
                    self.velocity = self.velocity * (1.0 - VELOCITY_SMOOTHING)
                        + instant_velocity * VELOCITY_SMOOTHING;
                }
            }
        }

        self.direction
    }

    /// Re-bases the tracker after the engine moved the offset itself, so the
    /// correction is not mistaken for user motion.
    pub fn rebase(&mut self, offset: f64) {
        if self.last_offset.is_some() {
            self.last_offset = Some(offset);
        }
    }

    pub fn direction(&self) -> Option<ScrollDirection> {
        self.direction
    }

    /// Velocity in offset units per millisecond; zero once the user has been
    /// idle for longer than the configured window.
    pub fn velocity(&self, now: Instant) -> f64 {
        match self.last_event {
            Some(at) if now.saturating_duration_since(at) <= self.idle_after => self.velocity,
            _ => 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.last_offset = None;
        self.last_event = None;
        self.direction = None;
        self.velocity = 0.0;
    }
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new(Duration::from_millis(150))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_event_sets_no_direction() {
        let mut tracker = ScrollTracker::default();
        assert_eq!(tracker.record(10.0, Instant::now()), None);
        assert_eq!(tracker.direction(), None);
    }

    #[test]
    fn test_direction_follows_sign_of_delta() {
        let mut tracker = ScrollTracker::default();
        let start = Instant::now();

        tracker.record(10.0, start);
        assert_eq!(
            tracker.record(20.0, start + Duration::from_millis(16)),
            Some(ScrollDirection::Down)
        );
        assert_eq!(
            tracker.record(5.0, start + Duration::from_millis(32)),
            Some(ScrollDirection::Up)
        );
    }

    #[test]
    fn test_zero_delta_keeps_previous_direction() {
        let mut tracker = ScrollTracker::default();
        let start = Instant::now();

        tracker.record(0.0, start);
        tracker.record(8.0, start + Duration::from_millis(10));
        assert_eq!(
            tracker.record(8.0, start + Duration::from_millis(20)),
            Some(ScrollDirection::Down)
        );
    }

    #[test]
    fn test_velocity_decays_to_zero_when_idle() {
        let mut tracker = ScrollTracker::new(Duration::from_millis(100));
        let start = Instant::now();

        tracker.record(0.0, start);
        tracker.record(30.0, start + Duration::from_millis(10));
        let now = start + Duration::from_millis(20);
        assert!(tracker.velocity(now) > 0.0);

        let later = start + Duration::from_millis(500);
        assert_eq!(tracker.velocity(later), 0.0);
    }

    #[test]
    fn test_velocity_sign_matches_direction() {
        let mut tracker = ScrollTracker::default();
        let start = Instant::now();

        tracker.record(100.0, start);
        tracker.record(70.0, start + Duration::from_millis(10));
        assert!(tracker.velocity(start + Duration::from_millis(12)) < 0.0);
    }

    #[test]
    fn test_rebase_hides_engine_corrections() {
        let mut tracker = ScrollTracker::default();
        let start = Instant::now();

        tracker.record(10.0, start);
        tracker.record(20.0, start + Duration::from_millis(10));
        tracker.rebase(220.0);
        // Moving from the corrected offset upward a little is an "up" event,
        // not a 200-unit jump down.
        assert_eq!(
            tracker.record(218.0, start + Duration::from_millis(20)),
            Some(ScrollDirection::Up)
        );
    }

    #[test]
    fn test_reset_clears_state() {
        let mut tracker = ScrollTracker::default();
        let start = Instant::now();
        tracker.record(1.0, start);
        tracker.record(2.0, start + Duration::from_millis(5));
        tracker.reset();

        assert_eq!(tracker.direction(), None);
        assert_eq!(tracker.velocity(start + Duration::from_millis(6)), 0.0);
    }
}
