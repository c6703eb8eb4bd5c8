use cookie_factory::bytes::le_u64;
use cookie_factory::combinator::slice;
use cookie_factory::sequence::tuple;
use cookie_factory::SerializeFn;
use nom::bytes::streaming::take;
use nom::number::streaming::le_u64 as parse_le_u64;
use nom::IResult;
use std::io::Write;

use crate::error::TraceError;
use crate::utils::{padding_len, record_padding, RECORD_ALIGNMENT};

/// Bit offset of the transmission delay in the replay meta word
pub const REPLAY_DELTA_SHIFT: u32 = 0;
pub const REPLAY_DELTA_MASK: u64 = 0xffff_ffff;
/// Bit offset of the capture length in the replay meta word
pub const REPLAY_CAPLEN_SHIFT: u32 = 32;
pub const REPLAY_CAPLEN_MASK: u64 = 0xffff;
/// Bit offset of the wire length in the replay meta word
pub const REPLAY_WIRE_LEN_SHIFT: u32 = 48;
pub const REPLAY_WIRE_LEN_MASK: u64 = 0xffff;
/// Fill byte used to pad replay traces to the DMA alignment
pub const REPLAY_PADDING_BYTE: u8 = 0xff;

/// 8-byte meta word preceding each record of a replay-format trace
///
/// | bits  | field                                                  |
/// |-------|--------------------------------------------------------|
/// | 48-63 | wire length (number of data bytes that follow)         |
/// | 32-47 | capture length                                         |
/// | 0-31  | clock cycles to wait before transmitting the next record |
///
/// This layout differs from the one produced by the capture engine
/// ([`CaptureMeta`](crate::CaptureMeta)).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayMeta(pub u64);

impl ReplayMeta {
    pub fn new(delta_cycles_to_next: u32, caplen: u16, wire_len: u16) -> ReplayMeta {
        ReplayMeta(
            (u64::from(delta_cycles_to_next) << REPLAY_DELTA_SHIFT)
                | (u64::from(caplen) << REPLAY_CAPLEN_SHIFT)
                | (u64::from(wire_len) << REPLAY_WIRE_LEN_SHIFT),
        )
    }

    /// Clock cycles between the transmission of this record and the next one
    #[inline]
    pub fn delta_cycles_to_next(&self) -> u32 {
        ((self.0 >> REPLAY_DELTA_SHIFT) & REPLAY_DELTA_MASK) as u32
    }

    #[inline]
    pub fn caplen(&self) -> u16 {
        ((self.0 >> REPLAY_CAPLEN_SHIFT) & REPLAY_CAPLEN_MASK) as u16
    }

    #[inline]
    pub fn wire_len(&self) -> u16 {
        ((self.0 >> REPLAY_WIRE_LEN_SHIFT) & REPLAY_WIRE_LEN_MASK) as u16
    }

    /// True for a word of the trailing `0xff` padding
    #[inline]
    pub fn is_padding(&self) -> bool {
        self.0 == u64::MAX
    }
}

/// A packet record of a replay-format trace
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayFrame<'a> {
    pub meta: ReplayMeta,
    /// `wire_len` bytes of packet data, padding excluded
    pub data: &'a [u8],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayRecord<'a> {
    Packet(ReplayFrame<'a>),
    /// The trailing padding was reached
    EndOfTrace,
}

/// Serialize a replay record: meta word, `payload` and zero padding to 8 bytes
///
/// `payload` must hold exactly `meta.wire_len()` bytes.
pub fn gen_replay_record<'a, W: Write + 'a>(
    meta: ReplayMeta,
    payload: &'a [u8],
) -> impl SerializeFn<W> + 'a {
    tuple((
        le_u64(meta.0),
        slice(payload),
        record_padding(payload.len()),
    ))
}

/// Read a replay record meta word and data
pub fn parse_replay_record(i: &[u8]) -> IResult<&[u8], ReplayRecord, TraceError> {
    let (i, word) = parse_le_u64(i)?;
    let meta = ReplayMeta(word);
    if meta.is_padding() {
        return Ok((i, ReplayRecord::EndOfTrace));
    }
    let len = usize::from(meta.wire_len());
    let (i, data) = take(len)(i)?;
    let (i, _padding) = take(padding_len(len, RECORD_ALIGNMENT))(i)?;
    Ok((i, ReplayRecord::Packet(ReplayFrame { meta, data })))
}
