use nom::bytes::streaming::take;
use nom::number::streaming::le_u64;
use nom::IResult;

use crate::error::TraceError;
use crate::utils::{padding_len, RECORD_ALIGNMENT};

/// Bit offset of the wire length in the capture meta word
pub const CAPTURE_WIRE_LEN_SHIFT: u32 = 53;
/// Width mask of the wire length (11 bits)
pub const CAPTURE_WIRE_LEN_MASK: u64 = 0x7ff;
/// Bit offset of the inter-arrival time in the capture meta word
pub const CAPTURE_DELTA_SHIFT: u32 = 25;
/// Width mask of the inter-arrival time (28 bits)
///
/// Hardware documentation describes this counter as 25 bits wide. The capture
/// engine output uses 28 bits, which is what is decoded here.
pub const CAPTURE_DELTA_MASK: u64 = 0x0fff_ffff;
/// Meta word marking the end of the capture data
pub const CAPTURE_END_OF_TRACE: u64 = u64::MAX;

/// 8-byte meta word preceding each record of a capture-format trace
///
/// | bits  | field                                      |
/// |-------|--------------------------------------------|
/// | 53-63 | wire length                                |
/// | 25-52 | clock cycles since previous packet arrival |
/// | 0-24  | reserved                                   |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureMeta(pub u64);

impl CaptureMeta {
    /// Build a meta word. Values are masked to their field widths.
    pub fn new(wire_len: u16, delta_cycles: u32) -> CaptureMeta {
        let wire_len = (u64::from(wire_len) & CAPTURE_WIRE_LEN_MASK) << CAPTURE_WIRE_LEN_SHIFT;
        let delta = (u64::from(delta_cycles) & CAPTURE_DELTA_MASK) << CAPTURE_DELTA_SHIFT;
        CaptureMeta(wire_len | delta)
    }

    /// Length of the packet on the wire
    #[inline]
    pub fn wire_len(&self) -> u16 {
        ((self.0 >> CAPTURE_WIRE_LEN_SHIFT) & CAPTURE_WIRE_LEN_MASK) as u16
    }

    /// Clock cycles elapsed since the arrival of the previous packet
    #[inline]
    pub fn delta_cycles(&self) -> u32 {
        ((self.0 >> CAPTURE_DELTA_SHIFT) & CAPTURE_DELTA_MASK) as u32
    }

    #[inline]
    pub fn is_end_of_trace(&self) -> bool {
        self.0 == CAPTURE_END_OF_TRACE
    }

    /// Number of payload bytes stored for this record
    #[inline]
    pub fn caplen(&self, max_caplen: u16) -> usize {
        usize::from(self.wire_len().min(max_caplen))
    }
}

/// A packet record of a capture-format trace
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureFrame<'a> {
    pub meta: CaptureMeta,
    /// Captured bytes, padding excluded
    pub data: &'a [u8],
}

impl<'a> CaptureFrame<'a> {
    #[inline]
    pub fn wire_len(&self) -> u16 {
        self.meta.wire_len()
    }

    #[inline]
    pub fn delta_cycles(&self) -> u32 {
        self.meta.delta_cycles()
    }
}

/// Result of parsing one meta word and its payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureRecord<'a> {
    Packet(CaptureFrame<'a>),
    /// The end-of-capture meta word was read. Following bytes are padding.
    EndOfTrace,
}

/// Read a capture record meta word and data
///
/// The data is `min(wire_len, max_caplen)` bytes long, followed by padding up
/// to the next 8-byte boundary. The padding is consumed, but not returned.
pub fn parse_capture_record(
    i: &[u8],
    max_caplen: u16,
) -> IResult<&[u8], CaptureRecord, TraceError> {
    let (i, word) = le_u64(i)?;
    let meta = CaptureMeta(word);
    if meta.is_end_of_trace() {
        return Ok((i, CaptureRecord::EndOfTrace));
    }
    let caplen = meta.caplen(max_caplen);
    let (i, data) = take(caplen)(i)?;
    let (i, _padding) = take(padding_len(caplen, RECORD_ALIGNMENT))(i)?;
    Ok((i, CaptureRecord::Packet(CaptureFrame { meta, data })))
}
