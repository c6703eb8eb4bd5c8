use cookie_factory::bytes::le_u32;
use cookie_factory::combinator::slice;
use cookie_factory::sequence::tuple;
use cookie_factory::SerializeFn;
use nom::bytes::streaming::take;
use nom::number::streaming::le_u32 as parse_le_u32;
use nom::IResult;
use std::convert::TryFrom;
use std::io::Write;

use crate::error::TraceError;
use crate::packet::{join_ns, Packet};

/// Packet record of a nanosecond-precision pcap file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PcapFrame<'a> {
    pub ts_sec: u32,
    /// Nanoseconds part of the timestamp (the `ts_usec` field of the record header)
    pub ts_nsec: u32,
    pub caplen: u32,
    pub origlen: u32,
    pub data: &'a [u8],
}

impl<'a> PcapFrame<'a> {
    /// Build a frame from a packet. Fails if the timestamp does not fit in 32-bit seconds.
    pub fn from_packet(packet: &'a Packet) -> Result<PcapFrame<'a>, TraceError> {
        let (sec, ts_nsec) = packet.ts();
        let ts_sec =
            u32::try_from(sec).map_err(|_| TraceError::TimestampOverflow(packet.timestamp_ns))?;
        Ok(PcapFrame {
            ts_sec,
            ts_nsec,
            caplen: packet.caplen(),
            origlen: packet.wire_len,
            data: &packet.data,
        })
    }

    /// Absolute timestamp in nanoseconds
    #[inline]
    pub fn timestamp_ns(&self) -> u64 {
        join_ns(self.ts_sec, self.ts_nsec)
    }

    pub fn to_packet(&self) -> Packet {
        Packet::new(self.timestamp_ns(), self.origlen, self.data.to_vec())
    }
}

/// Read a PCAP record header and data
///
/// Each PCAP record starts with a small header, and is followed by packet data.
pub fn parse_pcap_frame(i: &[u8]) -> IResult<&[u8], PcapFrame, TraceError> {
    if i.len() < 16 {
        return Err(nom::Err::Incomplete(nom::Needed::new(16 - i.len())));
    }
    let (i, ts_sec) = parse_le_u32(i)?;
    let (i, ts_nsec) = parse_le_u32(i)?;
    let (i, caplen) = parse_le_u32(i)?;
    let (i, origlen) = parse_le_u32(i)?;
    let (i, data) = take(caplen as usize)(i)?;
    let frame = PcapFrame {
        ts_sec,
        ts_nsec,
        caplen,
        origlen,
        data,
    };
    Ok((i, frame))
}

/// Serialize a PCAP record header and data
// pcap records have no alignment constraints
pub fn gen_pcap_frame<'a, W: Write + 'a>(f: &'a PcapFrame) -> impl SerializeFn<W> + 'a {
    tuple((
        le_u32(f.ts_sec),
        le_u32(f.ts_nsec),
        le_u32(f.caplen),
        le_u32(f.origlen),
        slice(f.data),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookie_factory::gen;
    use hex_literal::hex;

    const FRAME_NSEC: &[u8] = &hex!(
        "
02 00 00 00 60 de db 0c 04 00 00 00 40 00 00 00
de ad be ef"
    );

    #[test]
    fn test_parse_pcap_frame() {
        let (rem, frame) = parse_pcap_frame(FRAME_NSEC).expect("packet parsing failed");
        assert!(rem.is_empty());
        assert_eq!(frame.ts_sec, 2);
        assert_eq!(frame.ts_nsec, 215_735_904);
        assert_eq!(frame.caplen, 4);
        assert_eq!(frame.origlen, 64);
        assert_eq!(frame.timestamp_ns(), 2_215_735_904);
        assert_eq!(frame.data, &hex!("de ad be ef"));
    }

    #[test]
    fn test_parse_pcap_frame_incomplete() {
        let res = parse_pcap_frame(&FRAME_NSEC[..10]);
        assert!(matches!(res, Err(nom::Err::Incomplete(_))));
        let res = parse_pcap_frame(&FRAME_NSEC[..18]);
        assert!(matches!(res, Err(nom::Err::Incomplete(_))));
    }

    #[test]
    fn test_gen_pcap_frame() {
        let packet = Packet::new(2_215_735_904, 64, hex!("de ad be ef").to_vec());
        let frame = PcapFrame::from_packet(&packet).expect("frame");
        let mut v = Vec::new();
        gen(gen_pcap_frame(&frame), &mut v).expect("gen");
        assert_eq!(&v[..], FRAME_NSEC);
    }

    #[test]
    fn test_timestamp_overflow() {
        let packet = Packet::new(u64::from(u32::MAX) * 1_000_000_000 + 1_000_000_000, 0, vec![]);
        assert!(matches!(
            PcapFrame::from_packet(&packet),
            Err(TraceError::TimestampOverflow(_))
        ));
    }
}
