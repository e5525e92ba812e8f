//! Log output over USART 0 (the USB serial of the Arduino Mega).
use core::convert::Infallible;

use avr_device::atmega2560::{PORTE, USART0};

/// Baud rate register value for 38400 baud at 8MHz in double speed mode
/// (`8MHz / (8 * 38400) - 1`, 0.2% error).
const UBRR: u16 = 25;

/// A transmit-only serial port, 38400 baud 8N1.
pub struct Serial(USART0);
impl Serial {
    pub fn new(registers: USART0, porte: &mut PORTE) -> Self {
        porte.ddre.modify(|_, w| w.pe1().set_bit()); // TXD0

        registers.ubrr0.write(|w| w.bits(UBRR));
        registers.ucsr0a.write(|w| w.u2x0().set_bit());
        // SAFETY: asynchronous mode, no parity, 1 stop bit, 8 data bits
        registers.ucsr0c.write(|w| unsafe { w.bits(0b0000_0110) });
        registers.ucsr0b.write(|w| w.txen0().set_bit());
        Self(registers)
    }

    fn write_byte(&mut self, byte: u8) {
        while self.0.ucsr0a.read().udre0().bit_is_clear() {}
        self.0.udr0.write(|w| w.bits(byte));
    }
}

impl ufmt::uWrite for Serial {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
        Ok(())
    }
}
