//! Capture-format traces
//!
//! Traces written by the hardware's packet capture engine. Each record is an
//! 8-byte little-endian meta word (see [`CaptureMeta`]), followed by the captured
//! packet data padded to a multiple of 8 bytes. A meta word with all bits set marks
//! the end of the capture. The total file size is a multiple of 64 bytes.
//!
//! The number of stored data bytes is not part of the record: it is
//! `min(wire_len, max_caplen)`, where `max_caplen` is the snap length the capture
//! engine was configured with. The same value must be passed to the decoder.
//!
//! Use [`CaptureTraceSlice`] for data already loaded in memory, or
//! [`CaptureTraceReader`] for streaming from a file.

mod reader;
mod record;
mod slice;

pub use reader::*;
pub use record::*;
pub use slice::*;
