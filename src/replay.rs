//! Replay-format traces
//!
//! Traces read by the hardware's packet replay engine. Each record is an 8-byte
//! little-endian meta word (see [`ReplayMeta`]) followed by `wire_len` bytes of
//! packet data, zero-padded to a multiple of 8 bytes. The meta word of a record
//! holds the delay, in clock cycles, until the *next* record is transmitted. The
//! file is padded with `0xff` bytes to a multiple of 64 bytes.
//!
//! [`ReplayTraceWriter`] encodes a sequence of timestamped packets,
//! [`ReplayTraceSlice`] reads a trace back.

mod record;
mod slice;
mod writer;

pub use record::*;
pub use slice::*;
pub use writer::*;
