use crate::error::TraceError;
use crate::replay::{parse_replay_record, ReplayFrame, ReplayRecord};
use crate::utils::{is_aligned, TRACE_ALIGNMENT};

/// Parsing iterator over replay-format trace data (requires data to be loaded into memory)
///
/// Iteration stops at the trailing `0xff` padding, or at the end of the data.
pub struct ReplayTraceSlice<'a> {
    // remaining (unparsed) data
    rem: &'a [u8],
    done: bool,
}

impl<'a> ReplayTraceSlice<'a> {
    pub fn from_slice(data: &'a [u8]) -> Result<ReplayTraceSlice<'a>, TraceError> {
        if !is_aligned(data.len() as u64, TRACE_ALIGNMENT as u64) {
            return Err(TraceError::UnalignedTraceSize {
                size: data.len() as u64,
                alignment: TRACE_ALIGNMENT as u64,
            });
        }
        Ok(ReplayTraceSlice {
            rem: data,
            done: false,
        })
    }
}

impl<'a> Iterator for ReplayTraceSlice<'a> {
    type Item = Result<ReplayFrame<'a>, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.rem.is_empty() {
            return None;
        }
        match parse_replay_record(self.rem) {
            Ok((rem, ReplayRecord::Packet(frame))) => {
                self.rem = rem;
                Some(Ok(frame))
            }
            Ok((_, ReplayRecord::EndOfTrace)) => {
                self.done = true;
                None
            }
            Err(nom::Err::Incomplete(_)) => {
                self.done = true;
                Some(Err(TraceError::UnexpectedEof))
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
