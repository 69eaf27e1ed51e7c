//! TAOLST core library: framing, reply policy and a half-duplex responder.
//!
//! Bytes arriving from a port are reassembled one at a time by
//! [`FrameDecoder`]; every complete request is answered with a single reply
//! built by [`ReplyBuffer`] and written back before the next byte is read.
//! [`Frame`] is also the encoder: it starts from an opcode's default length
//! and exposes opcode-guarded setters for the payload fields.
//!
//! Layout of a frame on the wire:
//!
//! | offset | field                                   |
//! |--------|-----------------------------------------|
//! | 0..2   | start markers `0x22 0x69`               |
//! | 2      | length (bytes after this one, 6..=255)  |
//! | 3..5   | hardware id, little-endian              |
//! | 5..7   | message id, little-endian               |
//! | 7      | route: source role high nibble, destination low nibble |
//! | 8      | opcode                                  |
//! | 9..    | payload (`length - 6` bytes)            |
//!
//! Invariants:
//! - A frame never exceeds 258 bytes; the decoder never writes past that.
//! - Malformed headers drop the partial frame and never surface from `feed`.
//! - At most one reply is pending at a time.
//!
//! All I/O is isolated behind [`ByteSource`] / [`ByteSink`]; the protocol
//! modules are side-effect free apart from `tracing` events.
//!
//! # Examples
//! ```no_run
//! use std::fs::OpenOptions;
//!
//! use taolst_core::{IoPort, SessionConfig, SystemClock, run_session};
//!
//! let device = OpenOptions::new().read(true).write(true).open("/dev/ttyUSB0")?;
//! let mut port = IoPort::new(device.try_clone()?, device);
//! let report = run_session(&mut port, &SystemClock, &SessionConfig::default())?;
//! println!("served {} exchanges", report.exchanges.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod clock;
mod port;
pub mod protocol;
mod session;

pub use clock::{Clock, FixedClock, J2000, J2000Time, SystemClock};
pub use port::{ByteSink, ByteSource, IoPort, PortError};
pub use protocol::{
    AckReason, Command, DecoderState, Frame, FrameDecoder, FrameError, FrameSummary, Opcode,
    ReplyBuffer, ReplyError, ReplyKind, ResyncError, Role, UnknownOpcode, build_reply,
    parse_command, transition,
};
pub use session::{
    DEFAULT_MAX_EXCHANGES, DecodeReport, ExchangeRecord, SessionConfig, SessionError,
    SessionReport, decode_source, run_session, run_session_with,
};
