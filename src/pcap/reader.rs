use crate::error::TraceError;
use crate::packet::Packet;
use crate::pcap::{parse_pcap_frame, parse_pcap_header, PcapHeader};
use circular::Buffer;
use nom::{Needed, Offset};
use std::io::Read;
use tracing::trace;

/// Parsing iterator over nanosecond-precision pcap data (streaming version)
///
/// This reader is a streaming parser based on a circular buffer, which means memory
/// usage is constant, and that it can be used to parse huge files or infinite streams.
///
/// The file header is parsed when the reader is created, so that a file with an
/// unsupported magic number is rejected before anything else happens. After that,
/// each call to [`next_packet`](PcapReader::next_packet) returns one packet.
///
/// The size of the circular buffer has to be big enough for at least one complete
/// record. Using a larger value (at least 65k) is advised to avoid frequent reads
/// and buffer shifts.
///
/// ## Example
///
/// ```rust
/// use fluent_trace::{Packet, PcapReader, PcapWriter};
///
/// let mut writer = PcapWriter::new(Vec::new()).expect("PcapWriter");
/// writer.write_packet(&Packet::new(1_000, 60, vec![0; 60])).expect("write");
/// let file = writer.into_inner();
///
/// let mut reader = PcapReader::new(65536, &file[..]).expect("PcapReader");
/// let mut num_packets = 0;
/// while let Some(packet) = reader.next_packet().expect("pcap error") {
///     assert_eq!(packet.timestamp_ns, 1_000);
///     num_packets += 1;
/// }
/// assert_eq!(num_packets, 1);
/// ```
pub struct PcapReader<R>
where
    R: Read,
{
    header: PcapHeader,
    reader: R,
    buffer: Buffer,
    consumed: usize,
    reader_exhausted: bool,
    finished: bool,
}

enum Step {
    Packet(usize, Packet),
    Refill,
}

impl<R> PcapReader<R>
where
    R: Read,
{
    /// Creates a new `PcapReader<R>` with the provided buffer capacity.
    pub fn new(capacity: usize, reader: R) -> Result<PcapReader<R>, TraceError> {
        let buffer = Buffer::with_capacity(capacity);
        Self::from_buffer(buffer, reader)
    }

    /// Creates a new `PcapReader<R>` using the provided `Buffer`.
    pub fn from_buffer(buffer: Buffer, reader: R) -> Result<PcapReader<R>, TraceError> {
        let mut pcap = PcapReader {
            header: PcapHeader::new(),
            reader,
            buffer,
            consumed: 0,
            reader_exhausted: false,
            finished: false,
        };
        loop {
            let res = match parse_pcap_header(pcap.buffer.data()) {
                Ok((rem, header)) => Some((pcap.buffer.data().offset(rem), header)),
                Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => return Err(e),
                Err(nom::Err::Incomplete(_)) if pcap.reader_exhausted => {
                    return Err(TraceError::UnexpectedEof)
                }
                Err(nom::Err::Incomplete(n)) => {
                    let needed = match n {
                        Needed::Size(n) => usize::from(n),
                        Needed::Unknown => 1,
                    };
                    if pcap.buffer.available_data() + needed > pcap.buffer.capacity() {
                        return Err(TraceError::BufferTooSmall);
                    }
                    None
                }
            };
            match res {
                Some((offset, header)) => {
                    pcap.header = header;
                    pcap.consume(offset);
                    return Ok(pcap);
                }
                None => pcap.refill()?,
            }
        }
    }

    /// The file header
    #[inline]
    pub fn header(&self) -> &PcapHeader {
        &self.header
    }

    /// Get the number of consumed bytes
    #[inline]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Get the next packet, or `None` at the end of the file.
    pub fn next_packet(&mut self) -> Result<Option<Packet>, TraceError> {
        if self.finished {
            return Ok(None);
        }
        loop {
            // Return EOF if
            // 1) all bytes have been read
            // 2) no more data is available
            if self.buffer.available_data() == 0 && self.reader_exhausted {
                self.finished = true;
                return Ok(None);
            }
            let step = match parse_pcap_frame(self.buffer.data()) {
                Ok((rem, frame)) => Step::Packet(self.buffer.data().offset(rem), frame.to_packet()),
                Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                    self.finished = true;
                    return Err(e);
                }
                Err(nom::Err::Incomplete(n)) => {
                    if self.reader_exhausted {
                        // expected more bytes but reader is EOF, truncated pcap?
                        self.finished = true;
                        return Err(TraceError::UnexpectedEof);
                    }
                    if let Needed::Size(n) = n {
                        if self.buffer.available_data() + usize::from(n) > self.buffer.capacity() {
                            self.finished = true;
                            return Err(TraceError::BufferTooSmall);
                        }
                    }
                    Step::Refill
                }
            };
            match step {
                Step::Packet(offset, packet) => {
                    self.consume(offset);
                    trace!(
                        timestamp_ns = packet.timestamp_ns,
                        caplen = packet.caplen(),
                        wire_len = packet.wire_len,
                        "pcap record"
                    );
                    return Ok(Some(packet));
                }
                Step::Refill => self.refill()?,
            }
        }
    }

    fn consume(&mut self, offset: usize) {
        self.consumed += offset;
        self.buffer.consume(offset);
    }

    fn refill(&mut self) -> Result<(), TraceError> {
        self.buffer.shift();
        let space = self.buffer.space();
        // check if available space is empty, so we can distinguish
        // a read() returning 0 because of EOF or because we requested 0
        if space.is_empty() {
            return Ok(());
        }
        let sz = self.reader.read(space)?;
        self.reader_exhausted = sz == 0;
        self.buffer.fill(sz);
        Ok(())
    }
}

impl<R> Iterator for PcapReader<R>
where
    R: Read,
{
    type Item = Result<Packet, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcap::PcapWriter;

    fn build_pcap(packets: &[Packet]) -> Vec<u8> {
        let mut writer = PcapWriter::new(Vec::new()).expect("writer");
        for p in packets {
            writer.write_packet(p).expect("write");
        }
        writer.into_inner()
    }

    #[test]
    fn test_empty_reader_error() {
        let empty: &[u8] = &[];
        let res = PcapReader::new(1024, empty);
        assert!(matches!(res, Err(TraceError::UnexpectedEof)));
    }

    #[test]
    fn test_buffer_smaller_than_header() {
        let file = build_pcap(&[Packet::new(0, 64, vec![1; 64])]);
        for capacity in [0, 16, 23] {
            let res = PcapReader::new(capacity, &file[..]);
            assert!(
                matches!(res, Err(TraceError::BufferTooSmall)),
                "capacity {}",
                capacity
            );
        }
        // exactly one header fits
        let reader = PcapReader::new(24, &file[..]).expect("reader");
        assert_eq!(reader.header().snaplen, 65535);
    }

    #[test]
    fn test_reader_magic() {
        let file = [0xd4u8, 0xc3, 0xb2, 0xa1, 2, 0, 4, 0];
        let res = PcapReader::new(1024, &file[..]);
        assert!(matches!(res, Err(TraceError::MagicNotSupported(0xa1b2_c3d4))));
    }

    #[test]
    fn test_reader_packets() {
        let packets: Vec<_> = (0..100u64)
            .map(|i| Packet::new(i * 1_000_000_123, 60 + i as u32, vec![i as u8; 60 + i as usize]))
            .collect();
        let file = build_pcap(&packets);
        // small buffer: forces several refills
        let reader = PcapReader::new(512, &file[..]).expect("reader");
        assert_eq!(reader.header().snaplen, 65535);
        let read: Vec<_> = reader.collect::<Result<_, _>>().expect("read");
        assert_eq!(read, packets);
    }

    #[test]
    fn test_truncated_pcap() {
        let packets = vec![Packet::new(0, 64, vec![1; 64]), Packet::new(10, 64, vec![2; 64])];
        let file = build_pcap(&packets);
        let mut reader = PcapReader::new(65536, &file[..file.len() - 3]).expect("reader");
        assert!(reader.next().expect("packet").is_ok());
        assert!(matches!(reader.next(), Some(Err(TraceError::UnexpectedEof))));
        assert!(reader.next().is_none());
    }
}
