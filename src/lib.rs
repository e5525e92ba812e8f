//! Hardware independent core of the welcome sonar firmware.
//!
//! The firmware measures the distance to the nearest object with an
//! ultrasonic sensor once per main loop iteration. If something comes close,
//! an LED fades in, a bar graph shows the distance and a character display
//! greets it. When it leaves again, the LED fades out, a buzzer beeps once and
//! the display shows for how long the presence stayed. Without anything in
//! range, the LED slowly "breathes".
//!
//! This crate contains everything that does not touch a register: the echo
//! capture bookkeeping ([`capture`]), the pulse-width to distance conversion
//! ([`distance`]), the hysteresis state machine ([`presence`]), the brightness
//! fader ([`fader`]), the bar graph mapping ([`bargraph`]) and the loop
//! scheduling ([`schedule`]). The firmware binary (`src/main.rs`, enabled with
//! the `firmware` feature) glues these to the ATmega2560 peripherals through
//! the [`panel::Panel`] trait.
#![cfg_attr(not(test), no_std)]

pub mod bargraph;
pub mod capture;
pub mod config;
pub mod distance;
pub mod fader;
pub mod panel;
pub mod presence;
pub mod schedule;
