use std::io::Cursor;

use taolst_core::{
    FixedClock, Frame, FrameDecoder, IoPort, J2000, Opcode, SessionConfig, run_session,
};
use time::Duration;

fn replies(written: &[u8]) -> Vec<Frame> {
    let mut decoder = FrameDecoder::new();
    let mut frames = Vec::new();
    for &byte in written {
        decoder.feed(byte);
        if let Some(frame) = decoder.take_frame() {
            frames.push(frame);
        }
    }
    frames
}

#[test]
fn ground_station_exchange() {
    let mut input = Vec::new();
    input.extend_from_slice(Frame::new(Opcode::AppGetTelem, 0x0001, 0x0000, 0x1, 0xa).as_bytes());
    input.extend_from_slice(Frame::new(Opcode::AppGetTime, 0x0001, 0x0001, 0x1, 0xa).as_bytes());
    let mut ping = Frame::new(Opcode::CommonAscii, 0x0001, 0x0002, 0x1, 0xa);
    ping.set_ascii_text("status?");
    input.extend_from_slice(ping.as_bytes());
    input.extend_from_slice(Frame::new(Opcode::CommonAck, 0x0001, 0x0003, 0x1, 0xa).as_bytes());

    let clock = FixedClock(J2000 + Duration::days(1) + Duration::milliseconds(5));
    let mut port = IoPort::new(Cursor::new(input), Vec::new());
    let report = run_session(&mut port, &clock, &SessionConfig::default()).expect("session");

    let lines: Vec<String> = report
        .exchanges
        .iter()
        .map(|exchange| format!("{} -> {}", exchange.request.opcode_name, exchange.reply))
        .collect();
    assert_eq!(
        lines,
        vec![
            format!(
                "app_get_telem -> app_telem hw_id:0x0001 msg_id:0x0000 src_id:0xa(ctrl) dst_id:0x1(comm) hex_telem:{}",
                "00".repeat(78)
            ),
            "app_get_time -> app_set_time hw_id:0x0001 msg_id:0x0001 src_id:0xa(ctrl) dst_id:0x1(comm) sec:86400 ns:5000000".to_string(),
            "common_ascii -> common_nack hw_id:0x0001 msg_id:0x0002 src_id:0xa(ctrl) dst_id:0x1(comm)".to_string(),
            "common_ack -> common_ack hw_id:0x0001 msg_id:0x0003 src_id:0xa(ctrl) dst_id:0x1(comm)".to_string(),
        ]
    );

    let (_, written) = port.into_parts();
    let frames = replies(&written);
    assert_eq!(frames.len(), 4);
    assert_eq!(
        frames.iter().map(Frame::byte_count).sum::<usize>(),
        written.len()
    );
}

#[test]
fn report_serializes_to_json() {
    let input = Frame::new(Opcode::BootloaderPing, 7, 8, 0x0, 0x1);
    let mut port = IoPort::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
    let report =
        run_session(&mut port, &FixedClock(J2000), &SessionConfig::default()).expect("session");

    let value = serde_json::to_value(&report).expect("report json");
    assert_eq!(value["exchanges"][0]["request"]["opcode_name"], "bootloader_ping");
    assert_eq!(value["exchanges"][0]["reply"]["opcode_name"], "common_nack");
    assert_eq!(value["exchanges"][0]["reply"]["hex"], "2269060700080010ff");
    assert_eq!(value["resyncs"], 0);
    assert_eq!(value["truncated_bytes"], 0);
}
