use cookie_factory::GenError;
use nom::error::{ErrorKind, ParseError};
use std::fmt;
use std::io;

/// Broad classes of failures, used to decide how a conversion run reports an error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Opening, reading or writing a file failed
    Io,
    /// Input does not follow the trace or container format
    Format,
    /// Input is well-formed but cannot be represented on the hardware
    HardwareConstraint,
}

/// The error type returned by every trace and container codec in this crate
///
/// All errors are fatal for the conversion run that produced them.
#[derive(Debug)]
pub enum TraceError {
    /// An error happened during a `read()`, `write()` or `seek()` operation
    Io(io::Error),
    /// Trace file size is not a multiple of the required alignment
    UnalignedTraceSize { size: u64, alignment: u64 },
    /// Expected more data but got EOF (truncated file)
    UnexpectedEof,
    /// Buffer capacity is too small, and some full record cannot be stored
    BufferTooSmall,
    /// Capture container magic number is not the nanosecond-precision value
    MagicNotSupported(u32),
    /// An error encountered during parsing
    NomError(ErrorKind),
    /// Packet length exceeds what the replay engine can store
    PacketTooLarge { len: u32, max: u32 },
    /// Inter-packet gap does not fit in the replay meta word
    GapTooLarge { cycles: u64 },
    /// Packet timestamp is earlier than the one of the previous packet
    TimestampRegression { previous_ns: u64, current_ns: u64 },
    /// Absolute timestamp cannot be represented in the container header
    TimestampOverflow(u64),
    /// A packet was added to a replay trace after its trailing padding was written
    TraceFinished,
    /// Serialization of a record failed
    Serialize(GenError),
}

impl TraceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TraceError::Io(_) => ErrorCategory::Io,
            TraceError::Serialize(GenError::IoError(_)) => ErrorCategory::Io,
            // limits of the replay engine, not malformed input
            TraceError::PacketTooLarge { .. } | TraceError::GapTooLarge { .. } => {
                ErrorCategory::HardwareConstraint
            }
            _ => ErrorCategory::Format,
        }
    }
}

impl<I> ParseError<I> for TraceError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        TraceError::NomError(kind)
    }
    fn append(_input: I, kind: ErrorKind, _other: Self) -> Self {
        TraceError::NomError(kind)
    }
}

impl From<io::Error> for TraceError {
    fn from(e: io::Error) -> Self {
        TraceError::Io(e)
    }
}

impl From<GenError> for TraceError {
    fn from(e: GenError) -> Self {
        match e {
            GenError::IoError(e) => TraceError::Io(e),
            e => TraceError::Serialize(e),
        }
    }
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TraceError::Io(e) => write!(f, "I/O error: {}", e),
            TraceError::UnalignedTraceSize { size, alignment } => write!(
                f,
                "input trace file size ({} bytes) must be a multiple of {} byte",
                size, alignment
            ),
            TraceError::UnexpectedEof => write!(f, "unexpected end of file (truncated input?)"),
            TraceError::BufferTooSmall => write!(f, "buffer too small to hold a complete record"),
            TraceError::MagicNotSupported(magic) => write!(
                f,
                "pcap magic number is: 0x{:08x}, expected: 0x{:08x}. only nanosecond \
                 precision pcap files are supported",
                magic,
                crate::pcap::NANOSECOND_MAGIC
            ),
            TraceError::NomError(kind) => write!(f, "parse error: {:?}", kind),
            TraceError::PacketTooLarge { len, max } => write!(
                f,
                "packet size ({} bytes) exceeds configured maximum length ({} bytes)",
                len, max
            ),
            TraceError::GapTooLarge { cycles } => write!(
                f,
                "inter-packet gap of {} clock cycles does not fit in 32 bits",
                cycles
            ),
            TraceError::TimestampRegression {
                previous_ns,
                current_ns,
            } => write!(
                f,
                "packet timestamp {} ns is earlier than previous timestamp {} ns",
                current_ns, previous_ns
            ),
            TraceError::TraceFinished => {
                write!(f, "cannot add packets to a finished replay trace")
            }
            TraceError::TimestampOverflow(ns) => {
                write!(f, "timestamp {} ns does not fit in a pcap header", ns)
            }
            TraceError::Serialize(e) => write!(f, "serialization error: {:?}", e),
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TraceError::Io(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let io = TraceError::from(io::Error::new(io::ErrorKind::Other, "disk on fire"));
        assert_eq!(io.category(), ErrorCategory::Io);
        assert_eq!(
            TraceError::MagicNotSupported(0xa1b2_c3d4).category(),
            ErrorCategory::Format
        );
        assert_eq!(
            TraceError::PacketTooLarge { len: 1600, max: 1518 }.category(),
            ErrorCategory::HardwareConstraint
        );
        assert_eq!(
            TraceError::GapTooLarge { cycles: 1 << 32 }.category(),
            ErrorCategory::HardwareConstraint
        );
        assert_eq!(TraceError::TraceFinished.category(), ErrorCategory::Format);
        assert_eq!(
            TraceError::UnalignedTraceSize {
                size: 65,
                alignment: 64
            }
            .category(),
            ErrorCategory::Format
        );
    }

    #[test]
    fn test_magic_message() {
        let msg = TraceError::MagicNotSupported(0xa1b2_c3d4).to_string();
        assert!(msg.contains("0xa1b2c3d4"));
        assert!(msg.contains("0xa1b23c4d"));
    }

    #[test]
    fn test_gen_io_error_is_io() {
        let e = TraceError::from(GenError::IoError(io::Error::new(
            io::ErrorKind::WriteZero,
            "short write",
        )));
        assert!(matches!(e, TraceError::Io(_)));
    }
}
