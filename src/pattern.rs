//! # Trajectory patterns
//!
//! A pattern maps the phase angle (radians) to the three stick axes. The mapping is a plain
//! function of phase so every trajectory can be evaluated without any scheduling around it:
//!
//! | Pattern | roll | pitch | vertical throttle |
//! |---------|------|-------|-------------------|
//! | [Pattern::RollLeftRight] | cos(phase) | 0 | 0 |
//! | [Pattern::PitchForwardBack] | 0 | sin(phase) | 0 |
//! | [Pattern::ThrottleUpDown] | 0 | 0 | sin(phase) |
//! | [Pattern::HorizontalOrbit] | cos(phase) | sin(phase) | 0 |
//! | [Pattern::VerticalOrbit] | cos(phase) | 0 | sin(phase) |
//! | [Pattern::VerticalSineWave] | held | held | held |
//! | [Pattern::HorizontalSineWave] | held | held | held |
//!
//! Yaw is always 0. The two sine wave patterns have no axis function: while they are armed
//! the last command is streamed unchanged.
//!
//! ```
//! use virtual_sticks::{Pattern, Trajectory};
//!
//! let mut trajectory = Trajectory::new(0.1);
//! trajectory.rearm(Pattern::HorizontalOrbit);
//!
//! let command = trajectory.advance();
//! assert!((command.roll - 0.1f32.cos()).abs() < 1e-6);
//! assert!((command.pitch - 0.1f32.sin()).abs() < 1e-6);
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::Error;

/// One outgoing virtual stick frame
///
/// Axis values are normalized, a pattern produces values in `-1.0..=1.0`. How they are
/// interpreted (velocity, angle, ...) is up to the [Transport](crate::Transport).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisCommand {
    /// Positive rolls right, negative rolls left
    pub roll: f32,
    /// Positive pitches forward, negative pitches backward
    pub pitch: f32,
    /// Positive climbs, negative descends
    pub vertical_throttle: f32,
    /// Always 0 for commands produced by a pattern
    pub yaw: f32,
}

impl AxisCommand {
    /// All axes centered
    pub const ZERO: AxisCommand = AxisCommand {
        roll: 0.0,
        pitch: 0.0,
        vertical_throttle: 0.0,
        yaw: 0.0,
    };

    fn new(roll: f32, pitch: f32, vertical_throttle: f32) -> Self {
        Self {
            roll,
            pitch,
            vertical_throttle,
            yaw: 0.0,
        }
    }
}

/// Pure mapping from phase (radians) to an axis command
pub type AxisFunction = fn(f32) -> AxisCommand;

/// Trajectory shape selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Roll oscillation, starts fully rolled right
    RollLeftRight,
    /// Pitch oscillation, starts centered
    PitchForwardBack,
    /// Climb/descend oscillation
    ThrottleUpDown,
    /// Circle in the horizontal plane
    HorizontalOrbit,
    /// Circle in the vertical plane
    VerticalOrbit,
    /// No axis function, holds the last command
    VerticalSineWave,
    /// No axis function, holds the last command
    HorizontalSineWave,
}

fn roll_left_right(phase: f32) -> AxisCommand {
    AxisCommand::new(phase.cos(), 0.0, 0.0)
}

fn pitch_forward_back(phase: f32) -> AxisCommand {
    AxisCommand::new(0.0, phase.sin(), 0.0)
}

fn throttle_up_down(phase: f32) -> AxisCommand {
    AxisCommand::new(0.0, 0.0, phase.sin())
}

fn horizontal_orbit(phase: f32) -> AxisCommand {
    AxisCommand::new(phase.cos(), phase.sin(), 0.0)
}

fn vertical_orbit(phase: f32) -> AxisCommand {
    AxisCommand::new(phase.cos(), 0.0, phase.sin())
}

impl Pattern {
    /// Every pattern, in declaration order
    pub const ALL: [Pattern; 7] = [
        Pattern::RollLeftRight,
        Pattern::PitchForwardBack,
        Pattern::ThrottleUpDown,
        Pattern::HorizontalOrbit,
        Pattern::VerticalOrbit,
        Pattern::VerticalSineWave,
        Pattern::HorizontalSineWave,
    ];

    /// Axis function of this pattern
    ///
    /// Returns `None` for [Pattern::VerticalSineWave] and [Pattern::HorizontalSineWave] which
    /// have no trajectory defined.
    pub fn axis_function(self) -> Option<AxisFunction> {
        match self {
            Pattern::RollLeftRight => Some(roll_left_right as AxisFunction),
            Pattern::PitchForwardBack => Some(pitch_forward_back as AxisFunction),
            Pattern::ThrottleUpDown => Some(throttle_up_down as AxisFunction),
            Pattern::HorizontalOrbit => Some(horizontal_orbit as AxisFunction),
            Pattern::VerticalOrbit => Some(vertical_orbit as AxisFunction),
            Pattern::VerticalSineWave | Pattern::HorizontalSineWave => None,
        }
    }

    /// Default tick interval of the pattern
    ///
    /// The distance traveled per unit of time depends on this rate: the phase advances by a
    /// fixed amount every tick, so a faster rate sweeps the trajectory faster. The target
    /// flight controllers accept commands between 5 and 25 Hz.
    pub fn tick_interval(self) -> Duration {
        match self {
            Pattern::RollLeftRight | Pattern::PitchForwardBack | Pattern::ThrottleUpDown => {
                Duration::from_millis(50)
            }
            Pattern::HorizontalOrbit
            | Pattern::VerticalOrbit
            | Pattern::VerticalSineWave
            | Pattern::HorizontalSineWave => Duration::from_millis(100),
        }
    }

    /// Pattern name as used by [FromStr] and [Display](fmt::Display)
    pub fn name(self) -> &'static str {
        match self {
            Pattern::RollLeftRight => "roll-left-right",
            Pattern::PitchForwardBack => "pitch-forward-back",
            Pattern::ThrottleUpDown => "throttle-up-down",
            Pattern::HorizontalOrbit => "horizontal-orbit",
            Pattern::VerticalOrbit => "vertical-orbit",
            Pattern::VerticalSineWave => "vertical-sine-wave",
            Pattern::HorizontalSineWave => "horizontal-sine-wave",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::ALL
            .iter()
            .copied()
            .find(|pattern| pattern.name() == s)
            .ok_or_else(|| Error::UnknownPattern(s.to_owned()))
    }
}

/// Phase accumulator and active pattern of a session
///
/// The phase is computed as `ticks × velocity` so it is exactly `n × velocity` after `n`
/// ticks, whatever the pattern.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pattern: Option<Pattern>,
    ticks: u64,
    velocity: f32,
    last: AxisCommand,
}

impl Trajectory {
    /// New trajectory with no pattern, advancing `velocity` radians per tick
    pub fn new(velocity: f32) -> Self {
        Self {
            pattern: None,
            ticks: 0,
            velocity,
            last: AxisCommand::ZERO,
        }
    }

    /// Select a pattern and reset the phase to 0
    ///
    /// The last command is kept, it is what the sine wave patterns keep sending.
    pub fn rearm(&mut self, pattern: Pattern) {
        self.pattern = Some(pattern);
        self.ticks = 0;
    }

    /// Advance the phase by one tick and compute the command for the new phase
    pub fn advance(&mut self) -> AxisCommand {
        self.ticks += 1;
        let phase = self.phase();

        if let Some(function) = self.pattern.and_then(Pattern::axis_function) {
            self.last = function(phase);
        }

        self.last
    }

    /// Current phase in radians
    pub fn phase(&self) -> f32 {
        self.ticks as f32 * self.velocity
    }

    /// Number of ticks since the pattern was armed
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Currently selected pattern
    pub fn pattern(&self) -> Option<Pattern> {
        self.pattern
    }

    /// Last command computed
    pub fn last_command(&self) -> AxisCommand {
        self.last
    }
}
