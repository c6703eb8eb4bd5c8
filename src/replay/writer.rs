use crate::error::TraceError;
use crate::packet::Packet;
use crate::replay::{gen_replay_record, ReplayMeta};
use crate::timing::Quantizer;
use crate::utils::trace_padding;
use cookie_factory::gen;
use std::convert::TryFrom;
use std::io::Write;
use tracing::{debug, trace};

/// Maximum packet size accepted by the replay engine
pub const MAX_PACKET_SIZE: usize = 1518;

#[derive(Clone, Copy, Debug)]
struct Pending {
    timestamp_ns: u64,
    caplen: u16,
    wire_len: u16,
}

/// Streaming encoder for replay-format traces
///
/// Each record carries the number of cycles to wait before the *next* record is
/// sent, so a packet can only be written once its successor is known: the writer
/// keeps one packet of lookahead. The last packet is written by
/// [`finish`](ReplayTraceWriter::finish) with a delay of zero, followed by `0xff`
/// padding up to a multiple of 64 bytes.
///
/// Exactly `wire_len` data bytes are written per record. Bytes that were not
/// captured are written as zeros.
///
/// ```rust
/// use fluent_trace::{Packet, ReplayTraceWriter};
///
/// let mut writer = ReplayTraceWriter::new(Vec::new());
/// writer.push(&Packet::new(0, 60, vec![0; 60])).expect("push");
/// writer.push(&Packet::new(1000, 60, vec![0; 60])).expect("push");
/// writer.finish().expect("finish");
/// assert_eq!(writer.packets_written(), 2);
/// let trace = writer.into_inner();
/// assert_eq!(trace.len(), 192);
/// ```
pub struct ReplayTraceWriter<W>
where
    W: Write,
{
    writer: W,
    quantizer: Quantizer,
    pending: Option<Pending>,
    // data of the pending packet, extended to wire_len
    payload: Vec<u8>,
    bytes_written: u64,
    packets_written: u64,
    finished: bool,
}

impl<W> ReplayTraceWriter<W>
where
    W: Write,
{
    pub fn new(writer: W) -> ReplayTraceWriter<W> {
        ReplayTraceWriter {
            writer,
            quantizer: Quantizer::new(),
            pending: None,
            payload: Vec::with_capacity(MAX_PACKET_SIZE),
            bytes_written: 0,
            packets_written: 0,
            finished: false,
        }
    }

    /// Add a packet to the trace. Packets must be pushed in timestamp order.
    ///
    /// The packet is checked before anything is written: if it is rejected, the
    /// previous (pending) packet is not written either. Pushing after
    /// [`finish`](ReplayTraceWriter::finish) fails with [`TraceError::TraceFinished`].
    pub fn push(&mut self, packet: &Packet) -> Result<(), TraceError> {
        if self.finished {
            return Err(TraceError::TraceFinished);
        }
        let caplen = packet.caplen();
        if caplen as usize > MAX_PACKET_SIZE {
            return Err(TraceError::PacketTooLarge {
                len: caplen,
                max: MAX_PACKET_SIZE as u32,
            });
        }
        if packet.wire_len as usize > MAX_PACKET_SIZE {
            return Err(TraceError::PacketTooLarge {
                len: packet.wire_len,
                max: MAX_PACKET_SIZE as u32,
            });
        }
        if let Some(prev) = self.pending {
            if packet.timestamp_ns < prev.timestamp_ns {
                return Err(TraceError::TimestampRegression {
                    previous_ns: prev.timestamp_ns,
                    current_ns: packet.timestamp_ns,
                });
            }
            let cycles = self
                .quantizer
                .quantize(packet.timestamp_ns - prev.timestamp_ns);
            let delta = u32::try_from(cycles).map_err(|_| TraceError::GapTooLarge { cycles })?;
            self.write_pending(prev, delta)?;
        }
        // both lengths are bounded by MAX_PACKET_SIZE
        let wire_len = packet.wire_len as usize;
        self.payload.clear();
        self.payload
            .extend_from_slice(&packet.data[..wire_len.min(packet.data.len())]);
        self.payload.resize(wire_len, 0);
        self.pending = Some(Pending {
            timestamp_ns: packet.timestamp_ns,
            caplen: caplen as u16,
            wire_len: wire_len as u16,
        });
        Ok(())
    }

    fn write_pending(&mut self, pending: Pending, delta: u32) -> Result<(), TraceError> {
        let meta = ReplayMeta::new(delta, pending.caplen, pending.wire_len);
        let (_, len) = gen(gen_replay_record(meta, &self.payload), &mut self.writer)?;
        trace!(
            delta_cycles = delta,
            caplen = pending.caplen,
            wire_len = pending.wire_len,
            "replay record"
        );
        self.bytes_written += len;
        self.packets_written += 1;
        Ok(())
    }

    /// Write the last packet and the trailing padding, and flush the output.
    ///
    /// Calling `finish` again has no effect.
    pub fn finish(&mut self) -> Result<(), TraceError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        if let Some(last) = self.pending.take() {
            self.write_pending(last, 0)?;
        }
        let (_, len) = gen(trace_padding(self.bytes_written as usize), &mut self.writer)?;
        self.bytes_written += len;
        self.writer.flush()?;
        debug!(
            packets = self.packets_written,
            bytes = self.bytes_written,
            rounding_error = self.quantizer.rounding_error(),
            "replay trace finished"
        );
        Ok(())
    }

    /// Number of records written so far (the pending packet is not counted)
    #[inline]
    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    #[inline]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Accumulated rounding error of the gaps written so far, in cycles
    #[inline]
    pub fn rounding_error(&self) -> f64 {
        self.quantizer.rounding_error()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
