//! Summary of a hardware trace file

use crate::capture::{parse_capture_record, CaptureRecord};
use crate::error::TraceError;
use crate::replay::ReplayTraceSlice;
use crate::utils::{is_aligned, TRACE_ALIGNMENT};
use std::fmt;
use std::path::Path;

/// Layout of a hardware trace file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceFormat {
    /// Written by the capture hardware; needs the configured maximum capture length
    Capture { max_caplen: u16 },
    /// Read by the replay hardware
    Replay,
}

/// Totals over all packet records of a trace
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraceInfo {
    pub file_size: u64,
    pub packets: u64,
    /// Sum of the wire lengths
    pub wire_bytes: u64,
    /// Sum of the stored payload lengths, padding excluded
    pub captured_bytes: u64,
    /// Sum of the inter-packet gaps, in clock cycles
    pub total_gap_cycles: u64,
}

impl TraceInfo {
    /// Walk the records of an in-memory trace
    pub fn from_slice(data: &[u8], format: TraceFormat) -> Result<TraceInfo, TraceError> {
        if !is_aligned(data.len() as u64, TRACE_ALIGNMENT as u64) {
            return Err(TraceError::UnalignedTraceSize {
                size: data.len() as u64,
                alignment: TRACE_ALIGNMENT as u64,
            });
        }
        let mut info = TraceInfo {
            file_size: data.len() as u64,
            ..TraceInfo::default()
        };
        match format {
            TraceFormat::Capture { max_caplen } => {
                let mut rem = data;
                while !rem.is_empty() {
                    match parse_capture_record(rem, max_caplen) {
                        Ok((i, CaptureRecord::Packet(frame))) => {
                            // the first gap is relative to the start of the capture
                            if info.packets > 0 {
                                info.total_gap_cycles += u64::from(frame.delta_cycles());
                            }
                            info.add_packet(u64::from(frame.wire_len()), frame.data.len());
                            rem = i;
                        }
                        Ok((_, CaptureRecord::EndOfTrace)) => break,
                        Err(nom::Err::Incomplete(_)) => return Err(TraceError::UnexpectedEof),
                        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => return Err(e),
                    }
                }
            }
            TraceFormat::Replay => {
                for frame in ReplayTraceSlice::from_slice(data)? {
                    let frame = frame?;
                    info.total_gap_cycles += u64::from(frame.meta.delta_cycles_to_next());
                    info.add_packet(
                        u64::from(frame.meta.wire_len()),
                        usize::from(frame.meta.caplen()).min(frame.data.len()),
                    );
                }
            }
        }
        Ok(info)
    }

    pub fn from_file<P: AsRef<Path>>(
        path: P,
        format: TraceFormat,
    ) -> Result<TraceInfo, TraceError> {
        let data = std::fs::read(path)?;
        Self::from_slice(&data, format)
    }

    fn add_packet(&mut self, wire_len: u64, captured: usize) {
        self.packets += 1;
        self.wire_bytes += wire_len;
        self.captured_bytes += captured as u64;
    }
}

impl fmt::Display for TraceInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "file size:        {} bytes", self.file_size)?;
        writeln!(f, "packets:          {}", self.packets)?;
        writeln!(f, "wire bytes:       {}", self.wire_bytes)?;
        writeln!(f, "captured bytes:   {}", self.captured_bytes)?;
        write!(f, "total gap cycles: {}", self.total_gap_cycles)
    }
}
