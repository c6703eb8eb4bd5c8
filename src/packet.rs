use crate::timing::NANOS_PER_SEC;

/// A packet with an absolute nanosecond timestamp
///
/// This is the common currency between the hardware trace codecs and the
/// capture container. `data` holds the captured bytes, `data.len()` is the
/// capture length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    /// Absolute timestamp in nanoseconds
    pub timestamp_ns: u64,
    /// Length of the packet as it appeared on the wire
    pub wire_len: u32,
    /// Captured packet data
    pub data: Vec<u8>,
}

impl Packet {
    pub fn new(timestamp_ns: u64, wire_len: u32, data: Vec<u8>) -> Packet {
        Packet {
            timestamp_ns,
            wire_len,
            data,
        }
    }

    /// The number of bytes of packet data actually captured.
    #[inline]
    pub fn caplen(&self) -> u32 {
        self.data.len() as u32
    }

    /// Timestamp split into seconds and nanoseconds.
    #[inline]
    pub fn ts(&self) -> (u64, u32) {
        split_ns(self.timestamp_ns)
    }
}

/// A packet borrowing its data from a trace buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketRef<'a> {
    pub timestamp_ns: u64,
    pub wire_len: u32,
    pub data: &'a [u8],
}

impl<'a> PacketRef<'a> {
    #[inline]
    pub fn caplen(&self) -> u32 {
        self.data.len() as u32
    }

    pub fn to_packet(&self) -> Packet {
        Packet::new(self.timestamp_ns, self.wire_len, self.data.to_vec())
    }
}

#[inline]
pub fn split_ns(ns: u64) -> (u64, u32) {
    (ns / NANOS_PER_SEC, (ns % NANOS_PER_SEC) as u32)
}

#[inline]
pub fn join_ns(sec: u32, nsec: u32) -> u64 {
    u64::from(sec) * NANOS_PER_SEC + u64::from(nsec)
}
