//! The LED brightness fader.
//!
//! Two contexts move the brightness level: the main loop converges it toward
//! a distance dependent target while a presence is detected, and the periodic
//! PWM interrupt lets the LED "breathe" while the device is idle. The
//! [`Owner`] decides which of the two may currently move the level; the other
//! one leaves it alone. The firmware keeps the [`Fader`] in a critical-section
//! mutex, so every method runs atomically with respect to both contexts.
use crate::config::{Level, MAX_LEVEL};

/// Inverse-logarithmic table for perceived linear brightness of LEDs.
///
/// This table was taken from [LED-Fading on microncontroller.net][uC.net], more
/// specifically the values of `pwmtable_8D`. This is the "best" 8bit PWM
/// presented on that page.
///
/// [uC.net]: https://www.mikrocontroller.net/index.php?title=LED-Fading&oldid=106397
const LINEARIZATION: [u8; 32] = [
    0, 1, 2, 2, 2, 3, 3, 4, 5, 6, 7, 8, 10, 11, 13, 16, 19, 23, 27, 32, 38, 45, 54, 64, 76, 91,
    108, 128, 152, 181, 215, 255,
];

/// Direction of the idle breathing ramp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// The context currently moving the brightness level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    /// The main loop converges the level toward the target.
    MainLoop,
    /// The periodic interrupt ramps the level up and down.
    Breathing(Direction),
}

/// Result of a single step of [`Fader::fade_out()`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FadeOut {
    /// The level was lowered, but is not yet off.
    Fading,
    /// The level reached zero with this step; the fader went back to
    /// breathing.
    Finished,
    /// The fader was not owned by the main loop, there was nothing to fade.
    Idle,
}

/// The brightness state shared by the main loop and the PWM interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fader {
    current: Level,
    target: Level,
    owner: Owner,
}

impl Fader {
    /// A dark fader, about to start breathing.
    pub const fn new() -> Self {
        Self {
            current: 0,
            target: 0,
            owner: Owner::Breathing(Direction::Up),
        }
    }

    pub const fn level(&self) -> Level {
        self.current
    }

    pub const fn target(&self) -> Level {
        self.target
    }

    pub const fn owner(&self) -> Owner {
        self.owner
    }

    /// Take over the fader from the breathing interrupt and move the level a
    /// single step of at most `step` toward `target`.
    ///
    /// The level never overshoots the target, so a constant target is reached
    /// after at most `ceil(MAX_LEVEL / step)` calls and stays there.
    pub fn approach(&mut self, target: Level, step: Level) -> Level {
        self.owner = Owner::MainLoop;
        self.target = target.min(MAX_LEVEL);
        self.current = if self.current < self.target {
            self.current.saturating_add(step).min(self.target)
        } else {
            self.current.saturating_sub(step).max(self.target)
        };
        self.current
    }

    /// Lower the level by `step` after the presence left. Once off, the
    /// fader is handed back to the breathing interrupt.
    pub fn fade_out(&mut self, step: Level) -> FadeOut {
        if self.owner != Owner::MainLoop {
            return FadeOut::Idle;
        }

        self.target = 0;
        if self.current <= step {
            self.current = 0;
            self.owner = Owner::Breathing(Direction::Up);
            FadeOut::Finished
        } else {
            self.current -= step;
            FadeOut::Fading
        }
    }

    /// A tick of the idle breathing effect: ramp the level up to the maximum,
    /// then down to zero and repeat. Does nothing while the main loop owns
    /// the fader. Returns whether the level was moved.
    pub fn breathe(&mut self, step: Level) -> bool {
        let Owner::Breathing(direction) = self.owner else {
            return false;
        };

        self.owner = Owner::Breathing(match direction {
            Direction::Up => {
                self.current = self.current.saturating_add(step).min(MAX_LEVEL);
                if self.current == MAX_LEVEL {
                    Direction::Down
                } else {
                    Direction::Up
                }
            }
            Direction::Down => {
                self.current = self.current.saturating_sub(step);
                if self.current == 0 {
                    Direction::Up
                } else {
                    Direction::Down
                }
            }
        });
        true
    }

    /// The PWM duty cycle for the current level, corrected for the perceived
    /// brightness.
    pub fn duty(&self) -> u8 {
        let last = LINEARIZATION.len() - 1;
        let index = u32::from(self.current.min(MAX_LEVEL)) * last as u32 / u32::from(MAX_LEVEL);
        LINEARIZATION[(index as usize).min(last)]
    }
}

impl Default for Fader {
    fn default() -> Self {
        Self::new()
    }
}

/// The brightness target for an object at `distance_cm` while near.
///
/// Objects at 1cm or closer cannot be told apart and get the lowest level,
/// objects at `near_threshold_cm - 1` or beyond the highest. Distances in
/// between are mapped linearly.
pub fn target_level(distance_cm: u32, near_threshold_cm: u32) -> Level {
    let full = near_threshold_cm.saturating_sub(1);
    if distance_cm <= 1 {
        0
    } else if distance_cm >= full {
        MAX_LEVEL
    } else {
        let span = full.saturating_sub(1).max(1);
        let level = (distance_cm - 1).saturating_mul(u32::from(MAX_LEVEL)) / span;
        level.min(u32::from(MAX_LEVEL)) as Level
    }
}
