//! # FlueNT10G trace file codecs
//!
//! This crate converts between the binary trace files of the FlueNT10G network
//! tester hardware and nanosecond-precision PCAP files.
//!
//! - The **capture** format is written by the capture hardware: each packet is preceded by
//!   a 64-bit meta word holding the wire length and the gap (in clock cycles) since the
//!   previous packet. See [`CaptureTraceReader`] and [`CaptureTraceSlice`].
//! - The **replay** format is read by the replay hardware: each meta word holds the gap to
//!   the *next* packet, the capture length and the wire length. See [`ReplayTraceWriter`].
//!
//! Both formats use little-endian words, pad each record to 8 bytes and the whole file to
//! 64 bytes. Timestamps are expressed in cycles of the 156.25 MHz hardware clock
//! (6.4 ns per cycle); see [`timing`].
//!
//! The parsers are written with [nom](https://github.com/Geal/nom) and do not copy
//! data, the serializers use [cookie-factory](https://github.com/rust-bakery/cookie-factory).
//!
//! # Example: export a capture trace
//!
//! ```rust
//! use fluent_trace::{export_trace, PcapReader, DEFAULT_BUFFER_SIZE};
//! use std::io::Cursor;
//!
//! // a trace with no packets: end-of-capture marker, padded to 64 bytes
//! let trace = vec![0xffu8; 64];
//! let mut pcap = Vec::new();
//! let summary = export_trace(Cursor::new(trace), &mut pcap, 1518, DEFAULT_BUFFER_SIZE)
//!     .expect("export");
//! assert_eq!(summary.packets, 0);
//!
//! let reader = PcapReader::new(65536, &pcap[..]).expect("PcapReader");
//! assert!(reader.header().is_nanosecond_precision());
//! ```
//!
//! # Example: import a pcap file
//!
//! ```rust
//! use fluent_trace::{import_pcap, Packet, PcapWriter, DEFAULT_BUFFER_SIZE};
//!
//! let mut writer = PcapWriter::new(Vec::new()).expect("PcapWriter");
//! writer.write_packet(&Packet::new(0, 64, vec![0; 64])).expect("write");
//! writer.write_packet(&Packet::new(1000, 64, vec![0; 64])).expect("write");
//! let pcap = writer.into_inner();
//!
//! let mut trace = Vec::new();
//! import_pcap(&pcap[..], &mut trace, DEFAULT_BUFFER_SIZE).expect("import");
//! assert_eq!(trace.len() % 64, 0);
//! ```

mod utils;
pub use utils::{is_aligned, padding_len, RECORD_ALIGNMENT, TRACE_ALIGNMENT};

mod error;
mod packet;
pub use error::*;
pub use packet::*;

pub mod capture;
pub mod pcap;
pub mod replay;
pub use capture::*;
pub use pcap::*;
pub use replay::*;

pub mod timing;

mod convert;
pub use convert::*;

pub mod generate;
pub mod info;
