//! Configuration of the Timer/counter 0 as the LED PWM generator.
//!
//! The timer runs in fast PWM mode on `OC0A` (`PB7`) at ~488Hz. Its overflow
//! interrupt doubles as the periodic breathing tick and is the only writer of
//! the duty cycle register: every period it advances the breathing effect (if
//! the fader is idle) and loads the duty cycle of the current level.
use core::cell::Cell;

use avr_device::atmega2560::{PORTB, TC0};
use avr_device::interrupt::{self, Mutex};
use welcome_sonar::config::BREATHE_STEP;
use welcome_sonar::fader::Fader;

/// The fader shared between the main loop and [`TIMER0_OVF`].
static FADER: Mutex<Cell<Fader>> = Mutex::new(Cell::new(Fader::new()));

/// Access to the 8bit timer/counter 0 peripheral.
pub struct Timer0(TC0);
impl Timer0 {
    /// Create a new [`Timer0`] from a raw register block. This sets the PWM-pin
    /// PB7 as an output pin as well and starts the breathing interrupt.
    pub fn new(registers: TC0, portb: &mut PORTB) -> Self {
        portb.ddrb.modify(|_, w| w.pb7().set_bit());

        registers
            .tccr0a
            .write(|w| w.wgm0().pwm_fast().com0a().match_clear());
        registers.ocr0a.reset();
        registers.tccr0b.write(|w| w.cs0().prescale_64());
        registers.timsk0.write(|w| w.toie0().set_bit());
        Self(registers)
    }

    /// Run `f` on the fader without the breathing interrupt interfering. The
    /// new level is output with the next PWM period.
    pub fn with_fader<R>(&self, f: impl FnOnce(&mut Fader) -> R) -> R {
        interrupt::free(|cs| {
            let shared = FADER.borrow(cs);
            let mut fader = shared.get();
            let result = f(&mut fader);
            shared.set(fader);
            result
        })
    }
}

#[avr_device::interrupt(atmega2560)]
fn TIMER0_OVF() {
    let duty = interrupt::free(|cs| {
        let shared = FADER.borrow(cs);
        let mut fader = shared.get();
        fader.breathe(BREATHE_STEP);
        shared.set(fader);
        fader.duty()
    });

    // SAFETY: nothing else writes the compare register once the timer runs.
    let registers = unsafe { &*TC0::ptr() };
    registers.ocr0a.write(|w| w.bits(duty));
}
