//! Compile-time configuration of the sensing and actuation engine.
//!
//! Everything hardware related (tick rate, echo window, pulse lengths) is a
//! plain constant. The behavior policy is bundled into [`Tuning`], so that a
//! single value can be handed to the state machine (and varied in tests).

/// Length of a single capture timer tick in microseconds.
///
/// The capture timer runs from the 8MHz system clock with a prescaler of 8.
/// Changing either invalidates [`TICKS_PER_CM`] and every other microsecond
/// constant in this module.
pub const TICK_US: u32 = 1;

/// Echo ticks per centimeter of distance.
///
/// Sound travels ~343m/s, so the round trip to an object 1cm away and back
/// takes ~58µs.
pub const TICKS_PER_CM: u32 = 58 / TICK_US;

/// Length of the trigger pulse sent to the sensor (at least 10µs).
pub const TRIGGER_PULSE_US: u32 = 10;

/// Time to wait for the echo after triggering the sensor.
///
/// The HC-SR04 gives up after ~38ms without an echo, so after this window
/// the capture is either complete or will never complete for this trigger.
pub const ECHO_WINDOW_US: u32 = 60_000;

/// Duration of the buzzer beep.
pub const BEEP_MS: u16 = 100;

/// Brightness levels of the fader. `0` is off, [`MAX_LEVEL`] fully on.
pub type Level = u16;

/// The brightest fader level.
pub const MAX_LEVEL: Level = 1000;

/// Level change per tick of the periodic breathing interrupt.
///
/// The interrupt fires with the PWM period (~488Hz), so a full ramp from off
/// to fully on takes roughly one second.
pub const BREATHE_STEP: Level = 2;

/// Number of segments of the LED bar graph.
pub const SEGMENTS: u8 = 8;

/// Shown when a presence is detected.
pub const WELCOME: &str = "WELCOME";

/// Shown after the elapsed time, when the presence is gone.
pub const FAREWELL: &str = "GOOD BYE";

/// The policy of the presence state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tuning {
    /// Distances below this (in cm) are "near".
    pub near_threshold_cm: u32,
    /// Distances above this (in cm) are "far". Everything between the two
    /// thresholds is the dead zone.
    pub far_threshold_cm: u32,
    /// Fader step per loop iteration while near.
    pub approach_step: Level,
    /// Fader step per loop iteration after the presence left. Smaller than
    /// [`Tuning::approach_step`] for a slow fade-out.
    pub leave_step: Level,
    /// The fixed period of the main loop.
    pub loop_period_ms: u32,
    /// How long the elapsed time and the farewell message stay on the display.
    pub message_hold_ms: u16,
}

impl Tuning {
    /// The tuning used by the firmware.
    pub const DEFAULT: Self = Self {
        near_threshold_cm: 10,
        far_threshold_cm: 12,
        approach_step: 50,
        leave_step: 20,
        loop_period_ms: 80,
        message_hold_ms: 2000,
    };

    /// The loop period in capture timer ticks.
    pub const fn loop_period_ticks(&self) -> u32 {
        self.loop_period_ms * 1000 / TICK_US
    }

    /// Convert a number of loop iterations into whole seconds.
    pub const fn elapsed_seconds(&self, iterations: u32) -> u32 {
        iterations.saturating_mul(self.loop_period_ms) / 1000
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self::DEFAULT
    }
}
