use crate::error::TraceError;
use crate::packet::Packet;
use crate::pcap::{gen_pcap_frame, gen_pcap_header, PcapFrame, PcapHeader};
use cookie_factory::gen;
use std::io::Write;

/// Writer for nanosecond-precision pcap files
///
/// The global header is written on creation. Packet timestamps are absolute
/// nanosecond values, split into seconds and nanoseconds for each record.
pub struct PcapWriter<W>
where
    W: Write,
{
    writer: W,
    bytes_written: u64,
    packets_written: u64,
}

impl<W> PcapWriter<W>
where
    W: Write,
{
    /// Create a writer using the default header (nanosecond timestamps, Ethernet, snaplen 65535).
    pub fn new(writer: W) -> Result<PcapWriter<W>, TraceError> {
        Self::with_header(writer, &PcapHeader::new())
    }

    pub fn with_header(mut writer: W, header: &PcapHeader) -> Result<PcapWriter<W>, TraceError> {
        let (_, len) = gen(gen_pcap_header(header), &mut writer)?;
        Ok(PcapWriter {
            writer,
            bytes_written: len,
            packets_written: 0,
        })
    }

    pub fn write_packet(&mut self, packet: &Packet) -> Result<(), TraceError> {
        let frame = PcapFrame::from_packet(packet)?;
        let (_, len) = gen(gen_pcap_frame(&frame), &mut self.writer)?;
        self.bytes_written += len;
        self.packets_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), TraceError> {
        self.writer.flush()?;
        Ok(())
    }

    #[inline]
    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    #[inline]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_sizes() {
        let mut writer = PcapWriter::new(Vec::new()).expect("writer");
        assert_eq!(writer.bytes_written(), 24);
        writer
            .write_packet(&Packet::new(1_500_000_000, 100, vec![7; 60]))
            .expect("write");
        assert_eq!(writer.packets_written(), 1);
        assert_eq!(writer.bytes_written(), 24 + 16 + 60);
        let file = writer.into_inner();
        assert_eq!(file.len(), 100);
        // ts_sec = 1, ts_nsec = 500000000, caplen = 60, origlen = 100
        assert_eq!(&file[24..28], &1u32.to_le_bytes());
        assert_eq!(&file[28..32], &500_000_000u32.to_le_bytes());
        assert_eq!(&file[32..36], &60u32.to_le_bytes());
        assert_eq!(&file[36..40], &100u32.to_le_bytes());
    }
}
