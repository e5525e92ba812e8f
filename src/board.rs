//! The actuators of the board behind the [`Panel`] of the state machine.
//!
//! ```ascii-drawing
//! PA0..PA7 ── bar graph segments 1..8 (D22..D29)
//! PG0      ── buzzer (D41)
//! PB7      ── PWM LED (D13, see `timer0`)
//! PC*      ── display (see `lcd`)
//! ```
use core::convert::Infallible;

use avr_device::atmega2560::{CPU, PORTA, PORTG};
use welcome_sonar::bargraph;
use welcome_sonar::config::BEEP_MS;
use welcome_sonar::fader::Fader;
use welcome_sonar::panel::Panel;

use crate::lcd::Lcd;
use crate::power;
use crate::timer0::Timer0;
use crate::timer4::Timer4;

pub struct Board<'a> {
    cpu: CPU,
    clock: &'a Timer4,
    pwm: Timer0,
    lcd: Lcd,
    leds: PORTA,
    buzzer: PORTG,
}

impl<'a> Board<'a> {
    pub fn new(
        cpu: CPU,
        clock: &'a Timer4,
        pwm: Timer0,
        lcd: Lcd,
        leds: PORTA,
        buzzer: PORTG,
    ) -> Self {
        leds.porta.reset();
        leds.ddra.write(|w| unsafe { w.bits(u8::MAX) });
        buzzer.portg.modify(|_, w| w.pg0().clear_bit());
        buzzer.ddrg.modify(|_, w| w.pg0().set_bit());
        Self {
            cpu,
            clock,
            pwm,
            lcd,
            leds,
            buzzer,
        }
    }

    /// Idle until the clock reached `deadline`.
    pub fn sleep_until(&mut self, deadline: u32) {
        power::sleep_until(&mut self.cpu, self.clock, deadline);
    }
}

impl ufmt::uWrite for Board<'_> {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        self.lcd.print(self.clock, s);
        Ok(())
    }
}

impl Panel for Board<'_> {
    fn clear(&mut self) {
        self.lcd.clear(self.clock);
    }

    fn show_segments(&mut self, segments: u8) {
        let mask = bargraph::mask(segments);
        self.leds.porta.write(|w| unsafe { w.bits(mask) });
    }

    fn beep(&mut self) {
        self.buzzer.portg.modify(|_, w| w.pg0().set_bit());
        power::sleep_for_ms(&mut self.cpu, self.clock, BEEP_MS);
        self.buzzer.portg.modify(|_, w| w.pg0().clear_bit());
    }

    fn hold(&mut self, millis: u16) {
        power::sleep_for_ms(&mut self.cpu, self.clock, millis);
    }

    fn with_fader<R>(&mut self, f: impl FnOnce(&mut Fader) -> R) -> R {
        self.pwm.with_fader(f)
    }
}
