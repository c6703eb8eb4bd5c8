use crate::capture::{parse_capture_record, CaptureRecord};
use crate::error::TraceError;
use crate::packet::PacketRef;
use crate::timing::ArrivalClock;
use crate::utils::{is_aligned, TRACE_ALIGNMENT};

/// Parsing iterator over capture-format trace data (requires data to be loaded into memory)
///
/// Packets are returned with absolute timestamps, the first packet being at time zero.
/// The iterator stops at the end-of-capture meta word, or at the end of the data.
///
/// ```rust
/// use fluent_trace::CaptureTraceSlice;
///
/// let trace = [0xffu8; 64];
/// let slice = CaptureTraceSlice::from_slice(&trace, 1518).expect("aligned trace");
/// assert_eq!(slice.count(), 0);
/// ```
#[derive(Clone)]
pub struct CaptureTraceSlice<'a> {
    data: &'a [u8],
    // remaining (unparsed) data
    rem: &'a [u8],
    max_caplen: u16,
    clock: ArrivalClock,
    done: bool,
}

impl<'a> CaptureTraceSlice<'a> {
    pub fn from_slice(
        data: &'a [u8],
        max_caplen: u16,
    ) -> Result<CaptureTraceSlice<'a>, TraceError> {
        if !is_aligned(data.len() as u64, TRACE_ALIGNMENT as u64) {
            return Err(TraceError::UnalignedTraceSize {
                size: data.len() as u64,
                alignment: TRACE_ALIGNMENT as u64,
            });
        }
        Ok(CaptureTraceSlice {
            data,
            rem: data,
            max_caplen,
            clock: ArrivalClock::new(),
            done: false,
        })
    }

    /// Start again from the first record
    pub fn restart(&mut self) {
        self.rem = self.data;
        self.clock.reset();
        self.done = false;
    }
}

/// Iterator for CaptureTraceSlice. Returns a result so parsing errors are not
/// silently ignored
impl<'a> Iterator for CaptureTraceSlice<'a> {
    type Item = Result<PacketRef<'a>, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.rem.is_empty() {
            return None;
        }
        match parse_capture_record(self.rem, self.max_caplen) {
            Ok((rem, CaptureRecord::Packet(frame))) => {
                self.rem = rem;
                let timestamp_ns = self.clock.advance(u64::from(frame.delta_cycles()));
                Some(Ok(PacketRef {
                    timestamp_ns,
                    wire_len: u32::from(frame.wire_len()),
                    data: frame.data,
                }))
            }
            Ok((_, CaptureRecord::EndOfTrace)) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                match e {
                    nom::Err::Incomplete(_) => Some(Err(TraceError::UnexpectedEof)),
                    nom::Err::Error(e) | nom::Err::Failure(e) => Some(Err(e)),
                }
            }
        }
    }
}
