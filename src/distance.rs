//! Conversion of echo pulse widths into distances.
use crate::config::TICKS_PER_CM;

/// Distance reported when no echo was ever captured.
///
/// It is far beyond any threshold, so the state machine treats it as "no
/// object in range".
pub const NO_ECHO: u32 = u32::MAX;

/// Width of a pulse in ticks.
///
/// The capture timer is free-running, so a pulse may span a counter
/// overflow. In that case the falling timestamp is smaller than the rising
/// one and the width is counted from the rising edge up to the end of the
/// counter range plus the ticks after the overflow.
pub const fn pulse_width(rising: u32, falling: u32) -> u32 {
    if falling >= rising {
        falling - rising
    } else {
        (u32::MAX - rising) + falling
    }
}

/// Estimate the distance in centimeters of an echo pulse (truncating).
pub const fn estimate(rising: u32, falling: u32) -> u32 {
    pulse_width(rising, falling) / TICKS_PER_CM
}
