//! The HC-SR04 ultrasonic sensor: trigger on `PL2`, echo on `PL0` (ICP4).
use avr_device::atmega2560::PORTL;
use welcome_sonar::capture::Echo;
use welcome_sonar::config::TRIGGER_PULSE_US;

use crate::timer4::Timer4;

pub struct Sonar<'a> {
    clock: &'a Timer4,
    port: PORTL,
}

impl<'a> Sonar<'a> {
    pub fn new(clock: &'a Timer4, port: PORTL) -> Self {
        port.portl.modify(|_, w| w.pl2().clear_bit());
        port.ddrl.modify(|_, w| w.pl2().set_bit().pl0().clear_bit());
        Self { clock, port }
    }

    /// Start a measurement: forget any unfinished echo and send the trigger
    /// pulse.
    pub fn fire(&mut self) {
        self.clock.rearm();
        self.port.portl.modify(|_, w| w.pl2().set_bit());
        self.clock.delay_us(TRIGGER_PULSE_US);
        self.port.portl.modify(|_, w| w.pl2().clear_bit());
    }

    /// The result of the latest measurement. Read it once the echo window
    /// passed; if the echo went missing, the previous pulse is reported as
    /// stale.
    pub fn echo(&mut self) -> Echo {
        self.clock.take_echo()
    }
}
