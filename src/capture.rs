//! Bookkeeping of the echo input capture.
//!
//! The hardware timer latches its counter value on an edge of the echo pin.
//! The capture interrupt feeds these timestamps into an [`EchoCapture`], which
//! pairs a rising and a falling edge into a [`Pulse`]. The main loop only ever
//! sees complete pulses: the pair is published as one value together with a
//! flag telling whether it is new since the last [`EchoCapture::take()`].
use crate::distance;

/// The two edges of the echo pulse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Which edge the capture waits for next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitingRising,
    /// The rising edge was seen at the contained timestamp.
    AwaitingFalling { rising: u32 },
}

/// A complete echo pulse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pulse {
    pub rising: u32,
    pub falling: u32,
}

impl Pulse {
    /// The distance to the object which reflected this pulse.
    pub const fn distance_cm(&self) -> u32 {
        distance::estimate(self.rising, self.falling)
    }
}

/// The latest pulse handed to the main loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Echo {
    /// The most recent complete pulse, if there ever was one.
    pub pulse: Option<Pulse>,
    /// Whether `pulse` was captured since the previous read.
    pub fresh: bool,
}

impl Echo {
    /// The distance of the latest pulse. Without any pulse, this is
    /// [`distance::NO_ECHO`].
    pub fn distance_cm(&self) -> u32 {
        self.pulse.map_or(distance::NO_ECHO, |pulse| pulse.distance_cm())
    }
}

/// The capture state machine, mutated from the capture interrupt only.
#[derive(Clone, Copy, Debug)]
pub struct EchoCapture {
    phase: Phase,
    latest: Option<Pulse>,
    fresh: bool,
}

impl EchoCapture {
    pub const fn new() -> Self {
        Self {
            phase: Phase::AwaitingRising,
            latest: None,
            fresh: false,
        }
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The edge the hardware should be configured to capture next.
    pub const fn expected_edge(&self) -> Edge {
        match self.phase {
            Phase::AwaitingRising => Edge::Rising,
            Phase::AwaitingFalling { .. } => Edge::Falling,
        }
    }

    /// Forget a half-captured pulse. Called before every trigger, so that an
    /// edge missed during the previous cycle cannot shift the pairing.
    pub fn rearm(&mut self) {
        self.phase = Phase::AwaitingRising;
    }

    /// Record an edge seen at the timestamp `at`.
    ///
    /// A rising edge always starts a new pulse (dropping a pending one whose
    /// falling edge went missing). A falling edge completes the pending pulse
    /// and publishes it; without a pending pulse it is ignored.
    pub fn record(&mut self, edge: Edge, at: u32) {
        match (edge, self.phase) {
            (Edge::Rising, _) => self.phase = Phase::AwaitingFalling { rising: at },
            (Edge::Falling, Phase::AwaitingFalling { rising }) => {
                self.latest = Some(Pulse {
                    rising,
                    falling: at,
                });
                self.fresh = true;
                self.phase = Phase::AwaitingRising;
            }
            (Edge::Falling, Phase::AwaitingRising) => {}
        }
    }

    /// Read the latest pulse and mark it as consumed.
    pub fn take(&mut self) -> Echo {
        let echo = Echo {
            pulse: self.latest,
            fresh: self.fresh,
        };
        self.fresh = false;
        echo
    }
}

impl Default for EchoCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Extend a 16 bit timer sample to 32 bits using the software overflow count.
///
/// `overflow_pending` is the hardware overflow flag read together with the
/// sample: the counter wrapped, but the overflow interrupt has not run yet.
/// If the sample is from the lower half of the counter range, it was taken
/// after that wrap and belongs to the next overflow period. A sample from the
/// upper half was taken just before the wrap.
pub const fn extend_ticks(overflows: u16, sample: u16, overflow_pending: bool) -> u32 {
    let overflows = if overflow_pending && sample < 0x8000 {
        overflows.wrapping_add(1)
    } else {
        overflows
    };
    ((overflows as u32) << 16) | sample as u32
}
