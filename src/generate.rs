//! Constant-bit-rate trace generation
//!
//! Creates a nanosecond pcap file holding the same Ethernet frame over and over,
//! spaced so that the raw line rate (Ethernet overheads included) matches the
//! requested data rate. The result can be converted with
//! [`import_pcap`](crate::import_pcap) and replayed by the hardware.

use crate::convert::ConversionSummary;
use crate::error::TraceError;
use crate::packet::Packet;
use crate::pcap::PcapWriter;
use crate::replay::MAX_PACKET_SIZE;
use crate::timing::NANOS_PER_SEC;
use std::io::Write;
use tracing::debug;

/// Preamble, start-of-frame delimiter, frame check sequence and inter-frame gap, in bytes
pub const ETHERNET_OVERHEAD: usize = 24;

const SRC_MAC: [u8; 6] = [0x53, 0x00, 0x00, 0x00, 0x00, 0x01];
const DST_MAC: [u8; 6] = [0x53, 0x00, 0x00, 0x00, 0x00, 0x02];
// loopback ethertype
const ETHERTYPE: [u8; 2] = [0x90, 0x00];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CbrConfig {
    /// Frame length in bytes, from the destination MAC address to the end of the payload
    pub packet_len: usize,
    /// Raw data rate in bits per second
    pub data_rate: f64,
    /// Total trace duration in seconds
    pub duration: f64,
}

impl Default for CbrConfig {
    fn default() -> Self {
        CbrConfig {
            packet_len: 60,
            data_rate: 10e9,
            duration: 100e-3,
        }
    }
}

impl CbrConfig {
    /// Time between two packet transmissions, in seconds
    pub fn interval(&self) -> f64 {
        8.0 * (self.packet_len + ETHERNET_OVERHEAD) as f64 / self.data_rate
    }

    pub fn packet_count(&self) -> u64 {
        let interval = self.interval();
        if !(interval > 0.0) || !(self.duration > 0.0) {
            return 0;
        }
        (self.duration / interval).floor() as u64
    }

    /// The frame written for every packet
    pub fn frame(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.packet_len.max(14));
        frame.extend_from_slice(&DST_MAC);
        frame.extend_from_slice(&SRC_MAC);
        frame.extend_from_slice(&ETHERTYPE);
        frame.resize(self.packet_len, 0);
        frame
    }

    /// Packets of the trace, with timestamps rounded to the nearest nanosecond
    pub fn packets(&self) -> impl Iterator<Item = Packet> {
        let frame = self.frame();
        let interval_ns = self.interval() * NANOS_PER_SEC as f64;
        (0..self.packet_count()).map(move |i| {
            let ts = (i as f64 * interval_ns).round() as u64;
            Packet::new(ts, frame.len() as u32, frame.clone())
        })
    }
}

/// Write a constant-bit-rate nanosecond pcap file
pub fn generate_cbr<W: Write>(
    config: &CbrConfig,
    output: W,
) -> Result<ConversionSummary, TraceError> {
    if config.packet_len > MAX_PACKET_SIZE {
        return Err(TraceError::PacketTooLarge {
            len: config.packet_len as u32,
            max: MAX_PACKET_SIZE as u32,
        });
    }
    debug!(
        packets = config.packet_count(),
        interval = config.interval(),
        "generating constant bit rate trace"
    );
    let mut writer = PcapWriter::new(output)?;
    for packet in config.packets() {
        writer.write_packet(&packet)?;
    }
    writer.flush()?;
    Ok(ConversionSummary {
        packets: writer.packets_written(),
        bytes_written: writer.bytes_written(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CbrConfig::default();
        // 84 bytes at 10 Gbps
        assert!((config.interval() - 67.2e-9).abs() < 1e-15);
        assert_eq!(config.packet_count(), 1_488_095);
        let frame = config.frame();
        assert_eq!(frame.len(), 60);
        assert_eq!(&frame[..6], &DST_MAC);
        assert_eq!(&frame[6..12], &SRC_MAC);
        assert!(frame[14..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_packet_timestamps() {
        let config = CbrConfig {
            packet_len: 100,
            data_rate: 1e9,
            duration: 10e-6,
        };
        // 8 * 124 / 1e9 = 992 ns
        let ts: Vec<_> = config.packets().map(|p| p.timestamp_ns).collect();
        assert_eq!(ts.len(), 10);
        assert_eq!(ts[1], 992);
        assert_eq!(ts[9], 8928);
    }

    #[test]
    fn test_no_packets() {
        let config = CbrConfig {
            data_rate: 0.0,
            ..CbrConfig::default()
        };
        assert_eq!(config.packet_count(), 0);
        let mut out = Vec::new();
        let summary = generate_cbr(&config, &mut out).expect("generate");
        assert_eq!(summary.packets, 0);
        assert_eq!(out.len(), 24);
    }

    #[test]
    fn test_too_large() {
        let config = CbrConfig {
            packet_len: 2000,
            ..CbrConfig::default()
        };
        assert!(matches!(
            generate_cbr(&config, Vec::new()),
            Err(TraceError::PacketTooLarge { len: 2000, .. })
        ));
    }
}
