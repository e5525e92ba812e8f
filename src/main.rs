//! Welcome sonar: greet whatever comes close to an ultrasonic sensor
//!
//! This little project measures the distance in front of an HC-SR04
//! ultrasonic sensor several times a second. Once a hand (or anything else)
//! comes closer than 10cm, an LED fades in with a brightness depending on the
//! distance, an LED bar graph shows the distance and a character display shows
//! a welcome message. When the hand leaves again (beyond 12cm), the LED slowly
//! fades out, a buzzer beeps once and the display shows for how long the hand
//! stayed, followed by a farewell message. While nothing is around, the LED
//! "breathes".
//!
//! # Requirements
//! 1. measure the distance with a resolution of 1cm
//! 2. hysteresis between "near" and "far" so that the state does not flicker
//! 3. smooth fading, independent of the measurement cadence while idle
//! 4. exactly one beep per presence
//! 5. never hang or reset because of a missing or garbled echo
//!
//! # Sensor used
//! The HC-SR04 is triggered by a pulse of at least 10µs. It then sends a burst
//! of ultrasound and raises its echo output until the reflection comes back,
//! so the echo pulse width is proportional to the distance (58µs/cm). Without
//! a reflection, the echo pulse ends after ~38ms. The echo is timestamped by
//! the input capture unit of timer 4, see [`timer4`], so the main loop does not
//! need to watch the pin.
//!
//! # MCU used
//! This project uses the AVR ATmega2560 of an Arduino Mega 2560, since the
//! display, bar graph, sensor, buzzer and PWM LED need 18 I/Os next to a serial
//! port for logging. The 16MHz crystal clock is divided by 2, so that timer 4
//! counts in exact microseconds with a prescaler of 8.
//! ```ascii-drawing
//! Arduino Mega 2560
//!  ┌──────────────────────┐
//!  │ D13 PB7 (OC0A)  ─────┼──╼ LED (PWM)
//!  │ D22..D29 PA0..PA7 ───┼──╼ bar graph segments 1..8
//!  │ D30..D37 PC7..PC0 ───┼──╼ display (D7..D4, -, -, E, RS)
//!  │ D41 PG0  ────────────┼──╼ buzzer
//!  │ D47 PL2  ────────────┼──╼ sensor trigger
//!  │ D49 PL0 (ICP4) ──────┼──╾ sensor echo
//!  │ D1  PE1 (TXD0) ──────┼──╼ log (38400 baud 8N1)
//!  └──────────────────────┘
//! ```
//!
//! # Timing
//! The main loop runs with a fixed period of 80ms: trigger the sensor, sleep
//! for the 60ms echo window, evaluate the measurement and sleep until the next
//! period starts. The time a presence stayed is therefore the number of loop
//! iterations times the period. The breathing effect runs in the PWM overflow
//! interrupt instead, see [`timer0`].
#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

use ufmt::uwriteln;
use welcome_sonar::config::{Tuning, ECHO_WINDOW_US};
use welcome_sonar::presence::{Event, Presence};
use welcome_sonar::schedule::Cadence;

mod board;
mod lcd;
mod power;
mod serial;
mod sonar;
mod timer0;
mod timer4;

#[avr_device::entry]
fn main() -> ! {
    // SAFETY: this is the first an only time, the peripherals are taken.
    // Normally, this would be done via the safe `take()`-function, but this
    // introduces a "possible panic" into the code with additional code being
    // generated. Therefore, this `unsafe`-function is used.
    let mut peripherals = unsafe { avr_device::atmega2560::Peripherals::steal() };

    power::divide_system_clock_by::<2>(&mut peripherals.CPU); // 16MHz/2=8MHz
    power::disable_unused_peripherals(&mut peripherals.CPU, &mut peripherals.AC);
    power::select_idle_mode(&mut peripherals.CPU);

    let mut log = serial::Serial::new(peripherals.USART0, &mut peripherals.PORTE);
    let clock = timer4::Timer4::new(peripherals.TC4);
    let pwm = timer0::Timer0::new(peripherals.TC0, &mut peripherals.PORTB);
    // SAFETY: all state shared with the interrupts is statically initialized
    unsafe { avr_device::interrupt::enable() };

    let lcd = lcd::Lcd::new(peripherals.PORTC, &clock);
    let mut sonar = sonar::Sonar::new(&clock, peripherals.PORTL);
    let mut board = board::Board::new(
        peripherals.CPU,
        &clock,
        pwm,
        lcd,
        peripherals.PORTA,
        peripherals.PORTG,
    );

    let tuning = Tuning::DEFAULT;
    let mut presence = Presence::new(tuning);
    let mut cadence = Cadence::new(clock.now(), tuning.loop_period_ticks());
    let mut echo_missing = false;
    uwriteln!(&mut log, "welcome-sonar up, {}ms period", tuning.loop_period_ms).ok();

    loop {
        sonar.fire();
        board.sleep_until(cadence.at(ECHO_WINDOW_US));

        let echo = sonar.echo();
        if !echo.fresh && !echo_missing {
            uwriteln!(&mut log, "echo missing, keeping the last reading").ok();
        }
        echo_missing = !echo.fresh;

        let distance = echo.distance_cm();
        let before = presence.zone();
        let event = presence.step(distance, &mut board);
        if presence.zone() != before {
            let after = presence.zone();
            uwriteln!(&mut log, "{} -> {} ({}cm)", before.name(), after.name(), distance).ok();
        }
        match event {
            Some(Event::Arrived) => {
                uwriteln!(&mut log, "welcome").ok();
            }
            Some(Event::Departed { seconds }) => {
                uwriteln!(&mut log, "good bye after {}s", seconds).ok();
            }
            None => {}
        }

        board.sleep_until(cadence.advance(clock.now()));
    }
}

/// The panic handler of the application.
///
/// Normally, one would fill this panic handler with a reset, a flashing LED or
/// similar. But this project aims to avoid using panics altogether. Therefore
/// this panic handler should (in theory) not be necessary as it is never called
/// by Rust. But: the [`core`]-crate requires the function to be provided by a
/// `![no_std]`-binary. Therefore this function contains a body, that will not
/// compile (in reality: will not link) the application due to a missing symbol.
/// If there is any (potentially) reachable panic (i.e. one, that the optimizer
/// could not get rid of), an error like this is shown to the user:
/// ```console
/// src/main.rs:63:(.text.rust_begin_unwind+0x0): undefined reference to `a_panic_is_reachable'
/// ```
/// This indicates, that there is a possibly panicking call and shows even the
/// line number (63 in this case).
#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    extern "C" {
        fn a_panic_is_reachable() -> !;
    }
    // SAFETY: if this would be reachable, the code would not compile
    unsafe { a_panic_is_reachable() };
}
