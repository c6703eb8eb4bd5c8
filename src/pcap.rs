//! Nanosecond-precision PCAP file format
//!
//! See <https://wiki.wireshark.org/Development/LibpcapFileFormat> for details.
//!
//! Only the little-endian, nanosecond-precision variant (magic number `0xa1b23c4d`)
//! is supported. In this variant the `ts_usec` field of each record header holds
//! nanoseconds.
//!
//! [`PcapReader`] parses a file in streaming mode, [`PcapWriter`] creates one.
//! The header and record parsers ([`parse_pcap_header`], [`parse_pcap_frame`]) and
//! serializers ([`gen_pcap_header`], [`gen_pcap_frame`]) can also be used directly.

mod frame;
mod header;
mod reader;
mod writer;

pub use frame::*;
pub use header::*;
pub use reader::*;
pub use writer::*;
