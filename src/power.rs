//! Clock and power-reduction functionality.
//!
//! The AVR microcontroller enables most of its peripherals by default, which is
//! convenient, but draws a lot of unnecessary power. Therefore this module aims
//! to help with reducing the power consumption by powering down certain unused
//! peripherals and idling the CPU core whenever the main loop waits.

// The accesses of the registers (reading/writing) is done via a shared (and
// thus immutable) reference, but logically, there are changes performed to
// those registers. Therefore the functions in this module will take mutable
// references, even if they would not need to by the borrow checker.
#![allow(clippy::needless_pass_by_ref_mut)]

use avr_device::atmega2560::{AC, CPU};
use welcome_sonar::schedule;

use crate::timer4::Timer4;

pub fn divide_system_clock_by<const N: usize>(cpu: &mut CPU) {
    use avr_device::atmega2560::cpu::clkpr::CLKPS_A;
    let prescaler = match N {
        1 => CLKPS_A::PRESCALER_1,
        2 => CLKPS_A::PRESCALER_2,
        4 => CLKPS_A::PRESCALER_4,
        8 => CLKPS_A::PRESCALER_8,
        16 => CLKPS_A::PRESCALER_16,
        32 => CLKPS_A::PRESCALER_32,
        64 => CLKPS_A::PRESCALER_64,
        128 => CLKPS_A::PRESCALER_128,
        256 => CLKPS_A::PRESCALER_256,
        x => panic!("Illegal system clock divider `{x}` (use one of 1, 2, 4, ..., 256)"),
    };

    cpu.clkpr.write(|w| w.clkpce().set_bit());
    cpu.clkpr.write(|w| w.clkps().variant(prescaler));
}

/// Power down everything except timer 0 (PWM), timer 4 (echo capture and
/// clock) and USART 0 (log output).
pub fn disable_unused_peripherals(cpu: &mut CPU, ac: &mut AC) {
    ac.acsr.write(|w| w.acd().set_bit());
    cpu.prr0.write(|w| {
        w.pradc()
            .set_bit()
            .prspi()
            .set_bit()
            .prtwi()
            .set_bit()
            .prtim1()
            .set_bit()
            .prtim2()
            .set_bit()
    });
    cpu.prr1.write(|w| {
        w.prtim3()
            .set_bit()
            .prtim5()
            .set_bit()
            .prusart1()
            .set_bit()
            .prusart2()
            .set_bit()
            .prusart3()
            .set_bit()
    });
}

/// Select the idle sleep mode: the core stops, but the timers keep running
/// and wake it with their interrupts.
pub fn select_idle_mode(cpu: &mut CPU) {
    cpu.smcr.write(|w| w.sm().idle());
}

pub fn sleep(cpu: &mut CPU) {
    // enter sleep mode, wake-up is triggered by the next timer interrupt
    cpu.smcr.modify(|_r, w| w.se().set_bit());
    // SAFETY: this function is not called during `interrupt::free`
    unsafe { avr_device::interrupt::enable() };
    avr_device::asm::sleep();
    cpu.smcr.modify(|_r, w| w.se().clear_bit());
}

/// Sleep until the clock reached `deadline`.
///
/// The PWM overflow interrupt wakes the core every ~2ms, which bounds how far
/// a wake-up may lag behind the deadline.
pub fn sleep_until(cpu: &mut CPU, clock: &Timer4, deadline: u32) {
    while !schedule::reached(clock.now(), deadline) {
        sleep(cpu);
    }
}

/// Sleep for `millis` milliseconds.
pub fn sleep_for_ms(cpu: &mut CPU, clock: &Timer4, millis: u16) {
    let deadline = clock.now().wrapping_add(u32::from(millis) * 1000);
    sleep_until(cpu, clock, deadline);
}
