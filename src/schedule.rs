//! Deadline based scheduling on the wrapping 32 bit microsecond clock.

/// Whether the wrapping timestamp `now` is at or past `deadline`.
///
/// Deadlines must be less than half the clock range (~35 minutes) ahead.
pub const fn reached(now: u32, deadline: u32) -> bool {
    now.wrapping_sub(deadline) < 1 << 31
}

/// A fixed-period cycle of the main loop.
///
/// Each cycle starts exactly one period after the previous one. If a cycle
/// overran its period, the next one starts immediately and the schedule
/// continues from there instead of running the missed cycles back to back.
#[derive(Clone, Copy, Debug)]
pub struct Cadence {
    start: u32,
    period: u32,
}

impl Cadence {
    /// Begin a cadence whose first cycle starts at `now`.
    pub const fn new(now: u32, period: u32) -> Self {
        Self { start: now, period }
    }

    /// Start of the current cycle.
    pub const fn start(&self) -> u32 {
        self.start
    }

    /// The point in time `offset` ticks into the current cycle.
    pub const fn at(&self, offset: u32) -> u32 {
        self.start.wrapping_add(offset)
    }

    /// Advance to the next cycle and return its start time, which is the
    /// deadline to wait for.
    pub fn advance(&mut self, now: u32) -> u32 {
        let next = self.at(self.period);
        self.start = if reached(now, next) { now } else { next };
        self.start
    }
}
