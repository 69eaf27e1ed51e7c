use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use taolst_core::{DecodeReport, IoPort, decode_source};

fn golden_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("tests")
        .join("golden")
        .join(name)
}

fn run_golden(name: &str) {
    let dir = golden_dir(name);
    let expected_json =
        fs::read_to_string(dir.join("expected_report.json")).expect("read expected_report.json");
    let expected: DecodeReport =
        serde_json::from_str(&expected_json).expect("parse expected report");

    let input = File::open(dir.join("input.bin")).expect("open input.bin");
    let mut source = IoPort::new(input, io::sink());
    let actual = decode_source(&mut source).expect("decode input");

    let actual_value = serde_json::to_value(&actual).expect("serialize actual");
    let expected_value = serde_json::to_value(&expected).expect("serialize expected");
    assert_eq!(actual_value, expected_value, "golden mismatch in {name}");
}

#[test]
fn golden_decode_mixed() {
    run_golden("decode_mixed");
}

#[test]
fn golden_decode_mixed_renders_lines() {
    let input =
        File::open(golden_dir("decode_mixed").join("input.bin")).expect("open input.bin");
    let report = decode_source(&mut IoPort::new(input, io::sink())).expect("decode input");
    let lines: Vec<String> = report.frames.iter().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "app_get_telem hw_id:0x0001 msg_id:0x0000 src_id:0x1(comm) dst_id:0xa(ctrl)",
            "app_reboot hw_id:0x0102 msg_id:0x0003 src_id:0xa(ctrl) dst_id:0x2(expt) delay:300",
            "common_ascii hw_id:0x0000 msg_id:0x0004 src_id:0x1(comm) dst_id:0x0(term) \"hi\"",
            "app_set_time hw_id:0x0001 msg_id:0x0005 src_id:0xa(ctrl) dst_id:0x1(comm) sec:1000 ns:5000",
        ]
    );
}
