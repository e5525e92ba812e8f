//! HD44780 compatible character display in 4bit mode on port C.
//!
//! ```ascii-drawing
//! PC0 ── RS    PC4 ── D4
//! PC1 ── E     PC5 ── D5
//!  GND ── R/W  PC6 ── D6
//!              PC7 ── D7
//! ```
//! The display is write-only (R/W tied low), so instead of polling the busy
//! flag every command waits for its worst case execution time.
//!
//! All of port C belongs to the display, so its registers are always written
//! as a whole.
use avr_device::atmega2560::PORTC;

use crate::timer4::Timer4;

const RS: u8 = 1 << 0;
const ENABLE: u8 = 1 << 1;

const CLEAR: u8 = 0x01;

/// The initialization by instruction sequence. The first four are sent as a
/// single (upper) nibble, since the controller may still be in 8bit mode:
/// three times "8bit", then "4bit". Afterwards: 2 lines 5x8 font, display on
/// without cursor, auto-increment, clear and cursor home.
const INIT: [(u8, bool); 9] = [
    (0x30, true),
    (0x30, true),
    (0x30, true),
    (0x20, true),
    (0x28, false),
    (0x0c, false),
    (0x06, false),
    (CLEAR, false),
    (0x80, false),
];

pub struct Lcd(PORTC);
impl Lcd {
    pub fn new(port: PORTC, clock: &Timer4) -> Self {
        port.ddrc.write(|w| unsafe { w.bits(RS | ENABLE | 0xf0) });
        port.portc.reset();
        let mut lcd = Self(port);

        clock.delay_us(40_000); // power-on
        for (command, nibble_only) in INIT {
            if nibble_only {
                lcd.nibble(command >> 4, 0);
                clock.delay_us(4_100);
            } else {
                lcd.command(clock, command);
            }
        }
        lcd
    }

    pub fn clear(&mut self, clock: &Timer4) {
        self.command(clock, CLEAR);
    }

    pub fn print(&mut self, clock: &Timer4, text: &str) {
        for byte in text.bytes() {
            self.byte(byte, RS);
            clock.delay_us(43);
        }
    }

    fn command(&mut self, clock: &Timer4, command: u8) {
        self.byte(command, 0);
        clock.delay_us(if command == CLEAR { 1_600 } else { 40 });
    }

    fn byte(&mut self, byte: u8, rs: u8) {
        self.nibble(byte >> 4, rs);
        self.nibble(byte & 0x0f, rs);
    }

    /// Clock a nibble into the controller. The enable pulse must be at least
    /// 450ns, which are 4 cycles at 8MHz.
    fn nibble(&mut self, nibble: u8, rs: u8) {
        let data = nibble << 4 | rs;
        self.0.portc.write(|w| unsafe { w.bits(data) });
        self.0.portc.write(|w| unsafe { w.bits(data | ENABLE) });
        avr_device::asm::nop();
        avr_device::asm::nop();
        avr_device::asm::nop();
        avr_device::asm::nop();
        self.0.portc.write(|w| unsafe { w.bits(data) });
    }
}
