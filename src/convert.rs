//! Conversion pipelines between hardware traces and pcap files
//!
//! - export: capture-format trace → nanosecond pcap
//! - import: nanosecond pcap → replay-format trace
//!
//! Both directions are strictly sequential, and abort on the first error. An output
//! file that was already created when an error occurs is left as it is.

use crate::capture::CaptureTraceReader;
use crate::error::TraceError;
use crate::pcap::{PcapReader, PcapWriter};
use crate::replay::ReplayTraceWriter;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use tracing::debug;

/// Default capacity of the streaming readers' buffers
pub const DEFAULT_BUFFER_SIZE: usize = 65536;

/// Outcome of a successful conversion
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Number of packets written to the output
    pub packets: u64,
    /// Size of the output, in bytes
    pub bytes_written: u64,
}

/// Decode a capture-format trace and write it as a nanosecond pcap file
///
/// At most `max_caplen` bytes are stored per packet; the original length is kept.
pub fn export_trace<R, W>(
    input: R,
    output: W,
    max_caplen: u16,
    buffer_size: usize,
) -> Result<ConversionSummary, TraceError>
where
    R: Read + Seek,
    W: Write,
{
    let reader = CaptureTraceReader::new(buffer_size, input, max_caplen)?;
    write_pcap(reader, output)
}

fn write_pcap<R, W>(
    mut reader: CaptureTraceReader<R>,
    output: W,
) -> Result<ConversionSummary, TraceError>
where
    R: Read + Seek,
    W: Write,
{
    debug!(size = reader.file_size(), "exporting capture trace");
    let mut writer = PcapWriter::new(output)?;
    while let Some(packet) = reader.next_packet()? {
        writer.write_packet(&packet)?;
    }
    writer.flush()?;
    let summary = ConversionSummary {
        packets: writer.packets_written(),
        bytes_written: writer.bytes_written(),
    };
    debug!(
        packets = summary.packets,
        bytes = summary.bytes_written,
        consumed = reader.consumed(),
        "export done"
    );
    Ok(summary)
}

/// Read a nanosecond pcap file and encode it as a replay-format trace
pub fn import_pcap<R, W>(
    input: R,
    output: W,
    buffer_size: usize,
) -> Result<ConversionSummary, TraceError>
where
    R: Read,
    W: Write,
{
    let reader = PcapReader::new(buffer_size, input)?;
    write_replay(reader, output)
}

fn write_replay<R, W>(mut reader: PcapReader<R>, output: W) -> Result<ConversionSummary, TraceError>
where
    R: Read,
    W: Write,
{
    debug!(
        linktype = %reader.header().network,
        snaplen = reader.header().snaplen,
        "importing pcap"
    );
    let mut writer = ReplayTraceWriter::new(output);
    while let Some(packet) = reader.next_packet()? {
        writer.push(&packet)?;
    }
    writer.finish()?;
    let summary = ConversionSummary {
        packets: writer.packets_written(),
        bytes_written: writer.bytes_written(),
    };
    debug!(
        packets = summary.packets,
        bytes = summary.bytes_written,
        rounding_error = writer.rounding_error(),
        "import done"
    );
    Ok(summary)
}

/// Convert the capture-format trace `input` to the pcap file `output`
///
/// The trace size is validated before `output` is created.
pub fn export_file<P, Q>(
    input: P,
    output: Q,
    max_caplen: u16,
    buffer_size: usize,
) -> Result<ConversionSummary, TraceError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let file = File::open(input)?;
    let reader = CaptureTraceReader::new(buffer_size, BufReader::new(file), max_caplen)?;
    let out = BufWriter::new(File::create(output)?);
    write_pcap(reader, out)
}

/// Convert the pcap file `input` to the replay-format trace `output`
///
/// The pcap header (magic number) is validated before `output` is created.
pub fn import_file<P, Q>(
    input: P,
    output: Q,
    buffer_size: usize,
) -> Result<ConversionSummary, TraceError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let file = File::open(input)?;
    let reader = PcapReader::new(buffer_size, BufReader::new(file))?;
    let out = BufWriter::new(File::create(output)?);
    write_replay(reader, out)
}
