use thiserror::Error;

use super::opcode::Opcode;

/// Errors returned by fallible frame construction and payload decoding.
///
/// The silent setters on [`Frame`](super::frame::Frame) swallow these; the
/// `try_` variants surface them.
///
/// # Examples
/// ```
/// use taolst_core::{FrameError, Opcode};
///
/// let err = FrameError::OpcodeMismatch {
///     expected: Opcode::AppReboot,
///     found: 0x10,
/// };
/// assert!(err.to_string().contains("app_reboot"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("frame length mismatch: header declares {declared} bytes, got {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("invalid start marker: 0x{found:02x}")]
    InvalidStartMarker { found: u8 },
    #[error("invalid length field: {length}")]
    InvalidLength { length: u8 },
    #[error("setter for {expected} applied to opcode 0x{found:02x}")]
    OpcodeMismatch { expected: Opcode, found: u8 },
    #[error("invalid payload size: need {expected} bytes, got {actual}")]
    InvalidPayloadSize { expected: usize, actual: usize },
    #[error("text too long: {len} characters, at most {max} fit in a frame")]
    TextTooLong { len: usize, max: usize },
    #[error("character {ch:?} does not fit in a single byte")]
    NonByteCharacter { ch: char },
}

/// Reason the decoder dropped a partial frame and went back to hunting for
/// a start marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResyncError {
    #[error("expected second start marker, got 0x{found:02x}")]
    UnexpectedStartByte { found: u8 },
    #[error("length field {length} below minimum")]
    InvalidLength { length: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReplyError {
    #[error("request frame is not complete")]
    DecodeIncomplete,
    #[error("a reply is already pending")]
    ReplyPending,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown opcode '{0}'")]
pub struct UnknownOpcode(pub String);
