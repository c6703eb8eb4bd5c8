use cookie_factory::bytes::{le_i32, le_u16, le_u32};
use cookie_factory::sequence::tuple;
use cookie_factory::SerializeFn;
use nom::number::streaming::{
    le_i32 as parse_le_i32, le_u16 as parse_le_u16, le_u32 as parse_le_u32,
};
use nom::IResult;
use rusticata_macros::newtype_enum;
use std::io::Write;

use crate::error::TraceError;

/// Magic number of a pcap file with nanosecond timestamps, in native (little-endian) order
pub const NANOSECOND_MAGIC: u32 = 0xa1b2_3c4d;

/// Snap length written to exported pcap files
pub const DEFAULT_SNAPLEN: u32 = 65535;

/// Data link type
///
/// The link-layer header type specifies the type of headers at the beginning
/// of the packet.
///
/// See <http://www.tcpdump.org/linktypes.html>
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Linktype(pub i32);

newtype_enum! {
impl display Linktype {
    NULL = 0,
    ETHERNET = 1,
    RAW = 101,
    IPV4 = 228,
    IPV6 = 229,
}
}

/// PCAP global header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcapHeader {
    /// File format and byte ordering. Only `0xa1b23c4d` (nanosecond timestamps,
    /// little-endian) is supported.
    pub magic_number: u32,
    /// Version major number (currently 2)
    pub version_major: u16,
    /// Version minor number (currently 4)
    pub version_minor: u16,
    /// The correction time in seconds between GMT (UTC) and the local timezone of the
    /// following packet header timestamps
    pub thiszone: i32,
    /// In theory, the accuracy of time stamps in the capture; in practice, all tools set it to 0
    pub sigfigs: u32,
    /// max len of captured packets, in octets
    pub snaplen: u32,
    /// Data link type
    pub network: Linktype,
}

impl PcapHeader {
    pub fn new() -> PcapHeader {
        PcapHeader {
            magic_number: NANOSECOND_MAGIC,
            version_major: 2,
            version_minor: 4,
            thiszone: 0,
            sigfigs: 0,
            snaplen: DEFAULT_SNAPLEN,
            network: Linktype::ETHERNET,
        }
    }

    pub const fn size(&self) -> usize {
        24
    }

    pub fn is_nanosecond_precision(&self) -> bool {
        self.magic_number == NANOSECOND_MAGIC
    }
}

impl Default for PcapHeader {
    fn default() -> Self {
        PcapHeader::new()
    }
}

/// Read the PCAP global header
///
/// Any magic number other than [`NANOSECOND_MAGIC`] is rejected with
/// [`TraceError::MagicNotSupported`].
pub fn parse_pcap_header(i: &[u8]) -> IResult<&[u8], PcapHeader, TraceError> {
    let (i, magic_number) = parse_le_u32(i)?;
    if magic_number != NANOSECOND_MAGIC {
        return Err(nom::Err::Failure(TraceError::MagicNotSupported(magic_number)));
    }
    let (i, version_major) = parse_le_u16(i)?;
    let (i, version_minor) = parse_le_u16(i)?;
    let (i, thiszone) = parse_le_i32(i)?;
    let (i, sigfigs) = parse_le_u32(i)?;
    let (i, snaplen) = parse_le_u32(i)?;
    let (i, network) = parse_le_i32(i)?;
    let header = PcapHeader {
        magic_number,
        version_major,
        version_minor,
        thiszone,
        sigfigs,
        snaplen,
        network: Linktype(network),
    };
    Ok((i, header))
}

/// Serialize the PCAP global header
pub fn gen_pcap_header<'a, W: Write + 'a>(h: &'a PcapHeader) -> impl SerializeFn<W> + 'a {
    tuple((
        le_u32(h.magic_number),
        le_u16(h.version_major),
        le_u16(h.version_minor),
        le_i32(h.thiszone),
        le_u32(h.sigfigs),
        le_u32(h.snaplen),
        le_u32(h.network.0 as u32),
    ))
}
