use crate::capture::{parse_capture_record, CaptureRecord};
use crate::error::TraceError;
use crate::packet::Packet;
use crate::timing::ArrivalClock;
use crate::utils::{is_aligned, TRACE_ALIGNMENT};
use circular::Buffer;
use nom::{Needed, Offset};
use std::io::{Read, Seek, SeekFrom};
use tracing::trace;

/// Parsing iterator over capture-format trace files (streaming version)
///
/// This reader is a streaming parser based on a circular buffer, which means memory
/// usage is constant, and that it can be used to decode traces larger than memory.
/// The buffer has to be big enough for at least one complete record (8 bytes of meta
/// data and up to 2048 bytes of packet data).
///
/// The trace size is checked when the reader is created: it must be a multiple of 64
/// bytes. Packets are returned with absolute timestamps, the first packet defining
/// time zero. Iteration ends at the end-of-capture meta word, or when the input is
/// exhausted. Use [`restart`](CaptureTraceReader::restart) to iterate again from the
/// first record.
///
/// ## Example
///
/// ```rust
/// use fluent_trace::CaptureTraceReader;
/// use std::io::Cursor;
///
/// let trace = Cursor::new(vec![0xffu8; 64]);
/// let mut reader = CaptureTraceReader::new(65536, trace, 1518).expect("CaptureTraceReader");
/// let mut num_packets = 0;
/// while let Some(packet) = reader.next_packet().expect("trace error") {
///     println!("{} ns: {} bytes", packet.timestamp_ns, packet.wire_len);
///     num_packets += 1;
/// }
/// assert_eq!(num_packets, 0);
/// ```
pub struct CaptureTraceReader<R>
where
    R: Read + Seek,
{
    reader: R,
    buffer: Buffer,
    file_size: u64,
    consumed: u64,
    max_caplen: u16,
    clock: ArrivalClock,
    reader_exhausted: bool,
    finished: bool,
}

enum Step {
    Packet {
        offset: usize,
        delta_cycles: u32,
        wire_len: u16,
        data: Vec<u8>,
    },
    End,
    Refill,
}

impl<R> CaptureTraceReader<R>
where
    R: Read + Seek,
{
    /// Creates a new `CaptureTraceReader<R>` with the provided buffer capacity.
    pub fn new(
        capacity: usize,
        mut reader: R,
        max_caplen: u16,
    ) -> Result<CaptureTraceReader<R>, TraceError> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        if !is_aligned(file_size, TRACE_ALIGNMENT as u64) {
            return Err(TraceError::UnalignedTraceSize {
                size: file_size,
                alignment: TRACE_ALIGNMENT as u64,
            });
        }
        reader.seek(SeekFrom::Start(0))?;
        Ok(CaptureTraceReader {
            reader,
            buffer: Buffer::with_capacity(capacity),
            file_size,
            consumed: 0,
            max_caplen,
            clock: ArrivalClock::new(),
            reader_exhausted: false,
            finished: false,
        })
    }

    /// Size of the underlying trace, in bytes
    #[inline]
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Number of bytes decoded so far
    #[inline]
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Start again from the first record
    pub fn restart(&mut self) -> Result<(), TraceError> {
        self.reader.seek(SeekFrom::Start(0))?;
        let available = self.buffer.available_data();
        self.buffer.consume(available);
        self.buffer.shift();
        self.consumed = 0;
        self.clock.reset();
        self.reader_exhausted = false;
        self.finished = false;
        Ok(())
    }

    /// Get the next packet, or `None` once the end of the capture is reached.
    pub fn next_packet(&mut self) -> Result<Option<Packet>, TraceError> {
        if self.finished {
            return Ok(None);
        }
        loop {
            if self.buffer.available_data() == 0 && self.reader_exhausted {
                self.finished = true;
                return Ok(None);
            }
            let step = match parse_capture_record(self.buffer.data(), self.max_caplen) {
                Ok((rem, CaptureRecord::Packet(frame))) => Step::Packet {
                    offset: self.buffer.data().offset(rem),
                    delta_cycles: frame.delta_cycles(),
                    wire_len: frame.wire_len(),
                    data: frame.data.to_vec(),
                },
                Ok((_, CaptureRecord::EndOfTrace)) => Step::End,
                Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                    self.finished = true;
                    return Err(e);
                }
                Err(nom::Err::Incomplete(n)) => {
                    if self.reader_exhausted {
                        // expected more bytes but reader is EOF, truncated trace?
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
                Step::Packet {
                    offset,
                    delta_cycles,
                    wire_len,
                    data,
                } => {
                    self.buffer.consume(offset);
                    self.consumed += offset as u64;
                    let timestamp_ns = self.clock.advance(u64::from(delta_cycles));
                    trace!(timestamp_ns, wire_len, caplen = data.len(), "capture record");
                    return Ok(Some(Packet::new(timestamp_ns, u32::from(wire_len), data)));
                }
                Step::End => {
                    trace!(offset = self.consumed, "end of capture");
                    self.finished = true;
                    return Ok(None);
                }
                Step::Refill => self.refill()?,
            }
        }
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

impl<R> Iterator for CaptureTraceReader<R>
where
    R: Read + Seek,
{
    type Item = Result<Packet, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureMeta;
    use std::io::Cursor;

    fn build_trace(records: &[(u16, u32)], max_caplen: u16) -> Vec<u8> {
        let mut v = Vec::new();
        for (i, &(wire_len, delta)) in records.iter().enumerate() {
            v.extend_from_slice(&CaptureMeta::new(wire_len, delta).0.to_le_bytes());
            let caplen = wire_len.min(max_caplen) as usize;
            v.extend(std::iter::repeat(i as u8).take(caplen));
            while v.len() % 8 != 0 {
                v.push(0xee);
            }
        }
        v.extend_from_slice(&[0xff; 8]);
        while v.len() % 64 != 0 {
            v.push(0xff);
        }
        v
    }

    #[test]
    fn test_reader_small_buffer() {
        // buffer smaller than the trace, forces several refills
        let records: Vec<_> = (0..40).map(|i| (60 + i as u16, 1000)).collect();
        let trace = build_trace(&records, 1518);
        let reader = CaptureTraceReader::new(1024, Cursor::new(trace), 1518).expect("reader");
        let packets: Vec<_> = reader.collect::<Result<_, _>>().expect("decode");
        assert_eq!(packets.len(), 40);
        for (i, p) in packets.iter().enumerate() {
            assert_eq!(p.wire_len, 60 + i as u32);
            assert_eq!(p.caplen(), p.wire_len);
            assert!(p.data.iter().all(|&b| b == i as u8));
            assert_eq!(p.timestamp_ns, i as u64 * 6400);
        }
    }

    #[test]
    fn test_reader_restart() {
        let trace = build_trace(&[(64, 0), (64, 5)], 1518);
        let mut reader = CaptureTraceReader::new(65536, Cursor::new(trace), 1518).expect("reader");
        assert_eq!(reader.by_ref().count(), 2);
        assert!(reader.next_packet().expect("decode").is_none());
        reader.restart().expect("restart");
        let p0 = reader.next_packet().expect("decode").expect("packet");
        let p1 = reader.next_packet().expect("decode").expect("packet");
        assert_eq!(p0.timestamp_ns, 0);
        assert_eq!(p1.timestamp_ns, 32);
    }

    #[test]
    fn test_reader_unaligned_size() {
        let res = CaptureTraceReader::new(65536, Cursor::new(vec![0xffu8; 100]), 1518);
        assert!(matches!(
            res,
            Err(TraceError::UnalignedTraceSize { size: 100, .. })
        ));
    }

    #[test]
    fn test_reader_without_end_marker() {
        // 8 records of wire_len 0 fill exactly 64 bytes
        let trace: Vec<u8> = (0..8)
            .flat_map(|_| CaptureMeta::new(0, 1).0.to_le_bytes().to_vec())
            .collect();
        let reader = CaptureTraceReader::new(65536, Cursor::new(trace), 1518).expect("reader");
        let packets: Vec<_> = reader.collect::<Result<_, _>>().expect("decode");
        assert_eq!(packets.len(), 8);
        assert!(packets.iter().all(|p| p.data.is_empty()));
    }

    #[test]
    fn test_reader_truncated() {
        let mut trace = CaptureMeta::new(1500, 0).0.to_le_bytes().to_vec();
        trace.resize(128, 0);
        let mut reader = CaptureTraceReader::new(65536, Cursor::new(trace), 1518).expect("reader");
        assert!(matches!(reader.next(), Some(Err(TraceError::UnexpectedEof))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_reader_buffer_too_small() {
        let trace = build_trace(&[(1500, 0)], 1518);
        let mut reader = CaptureTraceReader::new(512, Cursor::new(trace), 1518).expect("reader");
        assert!(matches!(reader.next(), Some(Err(TraceError::BufferTooSmall))));
    }
}
