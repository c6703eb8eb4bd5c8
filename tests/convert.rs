use fluent_trace::*;
use std::fs;
use std::io::Cursor;

fn capture_record(v: &mut Vec<u8>, wire_len: u16, delta: u32, max_caplen: u16, fill: u8) {
    v.extend_from_slice(&CaptureMeta::new(wire_len, delta).0.to_le_bytes());
    let caplen = wire_len.min(max_caplen) as usize;
    v.extend(std::iter::repeat(fill).take(caplen));
    v.resize(v.len() + padding_len(caplen, RECORD_ALIGNMENT), 0);
}

fn capture_end(v: &mut Vec<u8>) {
    v.extend_from_slice(&CAPTURE_END_OF_TRACE.to_le_bytes());
    v.resize(v.len() + padding_len(v.len(), TRACE_ALIGNMENT), 0);
}

fn read_pcap(data: &[u8]) -> Vec<Packet> {
    PcapReader::new(4096, data)
        .expect("PcapReader")
        .collect::<Result<_, _>>()
        .expect("pcap packets")
}

fn build_pcap(packets: &[Packet]) -> Vec<u8> {
    let mut writer = PcapWriter::new(Vec::new()).expect("PcapWriter");
    for p in packets {
        writer.write_packet(p).expect("write packet");
    }
    writer.into_inner()
}

#[test]
fn test_export_only_end_marker() {
    let trace = vec![0xffu8; 64];
    let mut pcap = Vec::new();
    let summary = export_trace(Cursor::new(trace), &mut pcap, 1518, DEFAULT_BUFFER_SIZE)
        .expect("export");
    assert_eq!(summary.packets, 0);
    let reader = PcapReader::new(4096, &pcap[..]).expect("PcapReader");
    assert_eq!(reader.header().magic_number, NANOSECOND_MAGIC);
    assert_eq!(reader.header().network, Linktype::ETHERNET);
    assert_eq!(reader.count(), 0);
}

#[test]
fn test_export_truncated_caplen() {
    let mut trace = Vec::new();
    capture_record(&mut trace, 100, 0, 60, 0x5a);
    capture_end(&mut trace);
    let mut pcap = Vec::new();
    export_trace(Cursor::new(trace), &mut pcap, 60, DEFAULT_BUFFER_SIZE).expect("export");
    let packets = read_pcap(&pcap);
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].caplen(), 60);
    assert_eq!(packets[0].wire_len, 100);
    assert!(packets[0].data.iter().all(|&b| b == 0x5a));
}

#[test]
fn test_export_timestamps() {
    let mut trace = Vec::new();
    // first delta is relative to the start of the capture and is ignored
    capture_record(&mut trace, 64, 12345, 1518, 1);
    capture_record(&mut trace, 64, 157, 1518, 2);
    // 2 seconds and a bit: carries into the seconds field
    capture_record(&mut trace, 64, 0x0fff_ffff, 1518, 3);
    capture_end(&mut trace);
    let mut pcap = Vec::new();
    export_trace(Cursor::new(trace), &mut pcap, 1518, 256).expect("export");
    let ts: Vec<_> = read_pcap(&pcap).iter().map(|p| p.timestamp_ns).collect();
    assert_eq!(ts, vec![0, 1004, 1004 + 1_717_986_912]);
}

#[test]
fn test_import_two_packets_gap() {
    let pcap = build_pcap(&[
        Packet::new(5_000, 64, vec![0x11; 64]),
        Packet::new(6_000, 64, vec![0x22; 64]),
    ]);
    let mut trace = Vec::new();
    let summary = import_pcap(&pcap[..], &mut trace, DEFAULT_BUFFER_SIZE).expect("import");
    assert_eq!(summary.packets, 2);
    assert_eq!(summary.bytes_written, trace.len() as u64);
    let frames: Vec<_> = ReplayTraceSlice::from_slice(&trace)
        .expect("aligned")
        .collect::<Result<_, _>>()
        .expect("replay records");
    assert_eq!(frames.len(), 2);
    // 1000 ns is 156.25 cycles: rounded up first
    assert_eq!(frames[0].meta.delta_cycles_to_next(), 157);
    assert_eq!(frames[1].meta.delta_cycles_to_next(), 0);
    assert_eq!(frames[0].data, &[0x11; 64][..]);
    assert_eq!(frames[1].data, &[0x22; 64][..]);
}

#[test]
fn test_import_empty_pcap() {
    let pcap = build_pcap(&[]);
    let mut trace = Vec::new();
    let summary = import_pcap(&pcap[..], &mut trace, DEFAULT_BUFFER_SIZE).expect("import");
    assert_eq!(summary.packets, 0);
    assert!(trace.is_empty());
}

#[test]
fn test_import_file_bad_magic_creates_no_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("usec.pcap");
    let output = dir.path().join("out.trace");
    let mut file = build_pcap(&[Packet::new(0, 64, vec![0; 64])]);
    // microsecond precision magic
    file[..4].copy_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    fs::write(&input, &file).expect("write input");

    let err = import_file(&input, &output, DEFAULT_BUFFER_SIZE).expect_err("bad magic");
    assert!(matches!(err, TraceError::MagicNotSupported(0xa1b2_c3d4)));
    assert_eq!(err.category(), ErrorCategory::Format);
    assert!(!output.exists());
}

#[test]
fn test_import_oversized_caplen_stops_output() {
    let pcap = build_pcap(&[
        Packet::new(0, 64, vec![1; 64]),
        Packet::new(100, 64, vec![2; 64]),
        Packet::new(200, 2000, vec![3; 1519]),
        Packet::new(300, 64, vec![4; 64]),
    ]);
    let mut trace = Vec::new();
    let err = import_pcap(&pcap[..], &mut trace, DEFAULT_BUFFER_SIZE).expect_err("too large");
    assert!(matches!(err, TraceError::PacketTooLarge { len: 1519, max: 1518 }));
    assert_eq!(err.category(), ErrorCategory::HardwareConstraint);
    // only the first packet was written: the second was still pending
    assert_eq!(trace.len(), 8 + 64);
}

#[test]
fn test_export_file_unaligned_creates_no_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("capture.trace");
    let output = dir.path().join("out.pcap");
    fs::write(&input, vec![0xffu8; 100]).expect("write input");
    let err = export_file(&input, &output, 1518, DEFAULT_BUFFER_SIZE).expect_err("unaligned");
    assert!(matches!(
        err,
        TraceError::UnalignedTraceSize {
            size: 100,
            alignment: 64
        }
    ));
    assert!(!output.exists());
}

#[test]
fn test_file_pipeline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pcap_in = dir.path().join("in.pcap");
    let trace = dir.path().join("replay.trace");
    let packets: Vec<_> = (0..50u64)
        .map(|i| Packet::new(i * 6_400, 60 + i as u32, vec![i as u8; 60 + i as usize]))
        .collect();
    fs::write(&pcap_in, build_pcap(&packets)).expect("write pcap");

    let summary = import_file(&pcap_in, &trace, 1024).expect("import");
    assert_eq!(summary.packets, 50);
    let data = fs::read(&trace).expect("read trace");
    assert_eq!(data.len() as u64, summary.bytes_written);
    assert_eq!(data.len() % 64, 0);
    let frames: Vec<_> = ReplayTraceSlice::from_slice(&data)
        .expect("aligned")
        .collect::<Result<_, _>>()
        .expect("replay records");
    // 6400 ns is exactly 1000 cycles
    assert!(frames[..49].iter().all(|f| f.meta.delta_cycles_to_next() == 1000));
    for (frame, packet) in frames.iter().zip(&packets) {
        assert_eq!(u32::from(frame.meta.caplen()), packet.caplen());
        assert_eq!(frame.data, &packet.data[..]);
    }
}
