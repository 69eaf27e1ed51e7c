//! Human-readable rendering of frames.
//!
//! One line per frame: opcode name, header fields with role names, then an
//! opcode-specific suffix (`delay:`, `sec:`/`ns:`, `hex_telem:`, ...).
//! [`FrameSummary`] carries the same information for JSON output.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::frame::Frame;
use super::opcode::{PayloadShape, ack_reason_name, role_name};
use super::parser::{Command, parse_command};

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hw_id:0x{:04x} msg_id:0x{:04x} src_id:0x{:x}({}) dst_id:0x{:x}({})",
            opcode_name(self),
            self.hardware_id(),
            self.message_id(),
            self.source(),
            role_name(self.source()),
            self.destination(),
            role_name(self.destination()),
        )?;
        f.write_str(&detail(self))
    }
}

/// Serializable summary of one frame.
///
/// # Examples
/// ```
/// use taolst_core::{Frame, FrameSummary, Opcode};
///
/// let mut frame = Frame::new(Opcode::CommonAscii, 1, 2, 0x1, 0x0);
/// frame.set_ascii_text("abc");
/// let summary = FrameSummary::from_frame(&frame);
/// assert_eq!(summary.opcode_name, "common_ascii");
/// assert_eq!(summary.detail, " \"abc\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub opcode: u8,
    pub opcode_name: String,
    pub length: u8,
    pub hardware_id: u16,
    pub message_id: u16,
    pub source: u8,
    pub source_role: String,
    pub destination: u8,
    pub destination_role: String,
    /// Opcode-specific suffix of the rendered line (may be empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    /// Lowercase hex of the full serialized frame.
    pub hex: String,
}

impl FrameSummary {
    pub fn from_frame(frame: &Frame) -> Self {
        Self {
            opcode: frame.opcode_byte(),
            opcode_name: opcode_name(frame),
            length: frame.length(),
            hardware_id: frame.hardware_id(),
            message_id: frame.message_id(),
            source: frame.source(),
            source_role: role_name(frame.source()).to_string(),
            destination: frame.destination(),
            destination_role: role_name(frame.destination()).to_string(),
            detail: detail(frame),
            hex: hex::encode(frame.as_bytes()),
        }
    }
}

impl fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hw_id:0x{:04x} msg_id:0x{:04x} src_id:0x{:x}({}) dst_id:0x{:x}({}){}",
            self.opcode_name,
            self.hardware_id,
            self.message_id,
            self.source,
            self.source_role,
            self.destination,
            self.destination_role,
            self.detail,
        )
    }
}

fn opcode_name(frame: &Frame) -> String {
    match frame.opcode() {
        Some(opcode) => opcode.name().to_string(),
        None => format!("unknown(0x{:02x})", frame.opcode_byte()),
    }
}

fn detail(frame: &Frame) -> String {
    let command = match parse_command(frame) {
        Ok(command) => command,
        Err(err) => return short_detail(frame).unwrap_or_else(|| format!(" malformed:{err}")),
    };
    match command {
        Command::Empty(_) | Command::Unknown { .. } => String::new(),
        Command::Reboot { delay } => delay.map_or_else(String::new, |d| format!(" delay:{d}")),
        Command::SetTime {
            seconds,
            nanoseconds,
        } => format!(" sec:{seconds} ns:{nanoseconds}"),
        Command::Telemetry { data } => format!(" hex_telem:{}", hex::encode(&data)),
        Command::BootloaderAck { reason } => reason.map_or_else(String::new, |r| {
            format!(" reason:0x{r:02x}({})", ack_reason_name(r))
        }),
        Command::BootloaderErase { status } => {
            status.map_or_else(String::new, |s| format!(" status:0x{s:02x}"))
        }
        Command::WritePage { page_number, data } => {
            let mut out = format!(" subpage_id:{page_number}");
            if let Some(data) = data {
                out.push_str(" hex_data:");
                out.push_str(&hex::encode(&data));
            }
            out
        }
        Command::Ascii { text } => format!(" \"{text}\""),
    }
}

/// Set-time and write-page fields cut off by the length byte read as zero.
fn short_detail(frame: &Frame) -> Option<String> {
    let mut padded = [0u8; 8];
    let payload = frame.payload();
    let kept = payload.len().min(padded.len());
    padded[..kept].copy_from_slice(&payload[..kept]);
    match frame.opcode()?.shape() {
        PayloadShape::Time => {
            let seconds = u32::from_le_bytes([padded[0], padded[1], padded[2], padded[3]]);
            let nanoseconds = u32::from_le_bytes([padded[4], padded[5], padded[6], padded[7]]);
            Some(format!(" sec:{seconds} ns:{nanoseconds}"))
        }
        PayloadShape::WritePage => Some(format!(" subpage_id:{}", padded[0])),
        _ => None,
    }
}
