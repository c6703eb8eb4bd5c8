//! Conversion between hardware clock cycles and nanoseconds
//!
//! The capture and replay engines both count time in cycles of a 156.25 MHz
//! clock (6.4 ns per cycle). The two directions use different rounding:
//!
//! - cycles to nanoseconds always truncates, and truncation errors are not
//!   compensated ([`cycles_to_ns`], [`ArrivalClock`]);
//! - nanoseconds to cycles tracks the accumulated rounding error and chooses
//!   between rounding up and down so the replayed timing never drifts by one
//!   cycle or more ([`Quantizer`]).

/// Clock frequency of the hardware capture and replay logic
pub const CLOCK_FREQ_HZ: u64 = 156_250_000;

pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Convert a number of clock cycles to nanoseconds, cutting off the fractional part.
#[inline]
pub fn cycles_to_ns(cycles: u64) -> u64 {
    (u128::from(cycles) * u128::from(NANOS_PER_SEC) / u128::from(CLOCK_FREQ_HZ)) as u64
}

/// Convert a nanosecond duration to a (fractional) number of clock cycles.
#[inline]
pub fn ns_to_cycles_exact(ns: u64) -> f64 {
    ns as f64 * CLOCK_FREQ_HZ as f64 / NANOS_PER_SEC as f64
}

/// Error-compensated conversion of nanosecond gaps to integer clock cycles
///
/// The accumulated error `e` is the difference between the sum of all emitted
/// cycle counts and the sum of the exact (fractional) cycle counts. Each gap is
/// rounded up, unless rounding up would bring `e` to one cycle or more, in
/// which case it is rounded down. `e` stays in `[0, 1)` after every step.
///
/// The first gap is rounded as in the `pcap_import` tool, but later
/// cycle counts may differ from its output: for repeated 1000 ns gaps this emits
/// 157, 156, 156, 156 where the tool emits 157, 157, 156, 156, 156.
#[derive(Clone, Debug, Default)]
pub struct Quantizer {
    rounding_err: f64,
}

impl Quantizer {
    pub fn new() -> Quantizer {
        Quantizer { rounding_err: 0.0 }
    }

    /// Accumulated rounding error, in cycles
    #[inline]
    pub fn rounding_error(&self) -> f64 {
        self.rounding_err
    }

    /// Quantize a gap of `ns_diff` nanoseconds to clock cycles.
    pub fn quantize(&mut self, ns_diff: u64) -> u64 {
        let cycles = ns_to_cycles_exact(ns_diff);
        let up = cycles.ceil();
        let next_err = self.rounding_err + (up - cycles);
        if next_err < 1.0 {
            self.rounding_err = next_err;
            up as u64
        } else {
            // up - 1.0 == floor(cycles) here, since a whole cycle count never
            // raises the error
            self.rounding_err = next_err - 1.0;
            (up - 1.0) as u64
        }
    }
}

/// Reconstructs absolute arrival times from per-record cycle deltas
///
/// The first record defines the epoch (timestamp zero), its delta is ignored.
#[derive(Clone, Debug, Default)]
pub struct ArrivalClock {
    now_ns: u64,
    started: bool,
}

impl ArrivalClock {
    pub fn new() -> ArrivalClock {
        ArrivalClock::default()
    }

    /// Advance by `delta_cycles` and return the new absolute timestamp (ns).
    pub fn advance(&mut self, delta_cycles: u64) -> u64 {
        if self.started {
            self.now_ns += cycles_to_ns(delta_cycles);
        } else {
            self.started = true;
        }
        self.now_ns
    }

    pub fn reset(&mut self) {
        *self = ArrivalClock::default();
    }
}
