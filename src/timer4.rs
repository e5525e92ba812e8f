//! Timer/counter 4 as echo input capture and microsecond clock.
//!
//! The 16bit timer counts at 1MHz (8MHz system clock, prescaler 8). Its
//! overflow interrupt extends the counter to a wrapping 32bit microsecond
//! clock, which is both the timestamp source of the echo capture and the time
//! base of the main loop. The input capture unit latches the counter on the
//! edges of the echo pin (ICP4, `PL0`), switching between the rising and the
//! falling edge after every capture.
use core::cell::Cell;

use avr_device::atmega2560::TC4;
use avr_device::interrupt::{self, Mutex};
use welcome_sonar::capture::{self, Echo, EchoCapture, Edge};

/// Overflows of the 16bit counter, the upper half of the clock.
static OVERFLOWS: Mutex<Cell<u16>> = Mutex::new(Cell::new(0));

/// The capture state, written by [`TIMER4_CAPT`] only.
static CAPTURE: Mutex<Cell<EchoCapture>> = Mutex::new(Cell::new(EchoCapture::new()));

/// Access to the 16bit timer/counter 4 peripheral.
pub struct Timer4(TC4);
impl Timer4 {
    /// Create a new [`Timer4`] from a raw register block and start counting.
    /// The echo pin `PL0` is an input after reset already.
    pub fn new(registers: TC4) -> Self {
        registers.tccr4a.reset();
        registers.tccr4b.write(|w| {
            w.icnc4() // noise canceler: the echo line is long
                .set_bit()
                .ices4()
                .set_bit()
                .cs4()
                .prescale_8()
        });
        registers.tifr4.write(|w| w.icf4().set_bit().tov4().set_bit());
        registers
            .timsk4
            .write(|w| w.icie4().set_bit().toie4().set_bit());
        Self(registers)
    }

    /// Current time in microseconds since the timer was started. Wraps around
    /// after ~71 minutes.
    pub fn now(&self) -> u32 {
        interrupt::free(|cs| {
            let sample = self.0.tcnt4.read().bits();
            let pending = self.0.tifr4.read().tov4().bit_is_set();
            capture::extend_ticks(OVERFLOWS.borrow(cs).get(), sample, pending)
        })
    }

    /// Spin for at least `us` microseconds.
    pub fn delay_us(&self, us: u32) {
        let start = self.now();
        while self.now().wrapping_sub(start) < us {}
    }

    /// Expect the rising edge of a new echo pulse next.
    pub fn rearm(&self) {
        interrupt::free(|cs| {
            let capture = CAPTURE.borrow(cs);
            let mut state = capture.get();
            state.rearm();
            capture.set(state);
            select_edge(&self.0, state.expected_edge());
        });
    }

    /// The latest complete echo pulse.
    pub fn take_echo(&self) -> Echo {
        interrupt::free(|cs| {
            let capture = CAPTURE.borrow(cs);
            let mut state = capture.get();
            let echo = state.take();
            capture.set(state);
            echo
        })
    }
}

/// Capture `edge` next. Changing the edge may raise a spurious capture flag,
/// which is cleared.
fn select_edge(registers: &TC4, edge: Edge) {
    registers
        .tccr4b
        .modify(|_, w| w.ices4().bit(edge == Edge::Rising));
    registers.tifr4.write(|w| w.icf4().set_bit());
}

#[avr_device::interrupt(atmega2560)]
fn TIMER4_CAPT() {
    // SAFETY: the main loop only touches the edge select and the flags of
    // timer 4 inside critical sections, which this interrupt cannot preempt.
    let registers = unsafe { &*TC4::ptr() };
    let sample = registers.icr4.read().bits();
    let edge = if registers.tccr4b.read().ices4().bit_is_set() {
        Edge::Rising
    } else {
        Edge::Falling
    };

    interrupt::free(|cs| {
        let pending = registers.tifr4.read().tov4().bit_is_set();
        let at = capture::extend_ticks(OVERFLOWS.borrow(cs).get(), sample, pending);

        let capture = CAPTURE.borrow(cs);
        let mut state = capture.get();
        state.record(edge, at);
        capture.set(state);
        select_edge(registers, state.expected_edge());
    });
}

#[avr_device::interrupt(atmega2560)]
fn TIMER4_OVF() {
    interrupt::free(|cs| {
        let overflows = OVERFLOWS.borrow(cs);
        overflows.set(overflows.get().wrapping_add(1));
    });
}
