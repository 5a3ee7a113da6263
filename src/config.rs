//! # Stream configuration
//!
//! The phase increment and the tick rate together set how fast the vehicle moves along a
//! trajectory. Changing the tick rate changes the distance traveled per unit of time.

use std::time::Duration;

use crate::pattern::Pattern;
use crate::{Error, Result};

/// Lowest command rate accepted by the flight controller
pub const MIN_RATE_HZ: f32 = 5.0;
/// Highest command rate accepted by the flight controller
pub const MAX_RATE_HZ: f32 = 25.0;
/// Shortest tick interval, matches [MAX_RATE_HZ]
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(40);
/// Longest tick interval, matches [MIN_RATE_HZ]
pub const MAX_TICK_INTERVAL: Duration = Duration::from_millis(200);
/// Default phase increment per tick, in radians
pub const DEFAULT_VELOCITY: f32 = 0.1;

/// Configuration of a [Session](crate::Session) command stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamConfig {
    /// Phase increment per tick, in radians
    pub velocity: f32,
    /// Tick interval used for every pattern. `None` uses [Pattern::tick_interval()].
    pub tick_interval: Option<Duration>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            velocity: DEFAULT_VELOCITY,
            tick_interval: None,
        }
    }
}

impl StreamConfig {
    /// Set the phase increment per tick
    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = velocity;
        self
    }

    /// Force the same tick interval for every pattern
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = Some(tick_interval);
        self
    }

    /// Check that the configuration can be streamed
    pub fn validate(&self) -> Result<()> {
        if !self.velocity.is_finite() || self.velocity <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "velocity must be positive, got {}",
                self.velocity
            )));
        }

        if let Some(interval) = self.tick_interval {
            if interval < MIN_TICK_INTERVAL || interval > MAX_TICK_INTERVAL {
                return Err(Error::InvalidConfig(format!(
                    "tick interval {:?} outside of {}..={} Hz",
                    interval, MIN_RATE_HZ, MAX_RATE_HZ
                )));
            }
        }

        Ok(())
    }

    /// Tick interval to use when streaming `pattern`
    pub fn interval_for(&self, pattern: Pattern) -> Duration {
        self.tick_interval.unwrap_or_else(|| pattern.tick_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = StreamConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.velocity, 0.1);
        assert_eq!(
            config.interval_for(Pattern::RollLeftRight),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn override_applies_to_every_pattern() {
        let config = StreamConfig::default().with_tick_interval(Duration::from_millis(80));
        assert_eq!(config.validate(), Ok(()));
        for pattern in Pattern::ALL.iter() {
            assert_eq!(config.interval_for(*pattern), Duration::from_millis(80));
        }
    }

    #[test]
    fn rates_outside_the_accepted_range_are_rejected() {
        for millis in [0, 10, 30, 250, 1000] {
            let config = StreamConfig::default().with_tick_interval(Duration::from_millis(millis));
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfig(_))),
                "{} ms accepted",
                millis
            );
        }

        for millis in [40, 50, 100, 200] {
            let config = StreamConfig::default().with_tick_interval(Duration::from_millis(millis));
            assert_eq!(config.validate(), Ok(()), "{} ms rejected", millis);
        }
    }

    #[test]
    fn velocity_must_be_positive() {
        for velocity in [0.0, -0.1, f32::NAN, f32::INFINITY] {
            let config = StreamConfig::default().with_velocity(velocity);
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
    }
}
