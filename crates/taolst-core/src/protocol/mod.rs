//! TAOLST frame handling.
//!
//! Layered the same way for every concern:
//! - `layout`: byte offsets, lengths and wire constants (source of truth)
//! - `reader`: bounds-checked byte access
//! - `opcode`: static opcode catalog, role and ack-reason names
//! - `frame`: the frame buffer and its opcode-guarded setters
//! - `parser`: typed payload decoding (no direct byte indexing)
//! - `decoder`: byte-at-a-time reassembly with resynchronization
//! - `reply`: fixed request/reply mapping
//! - `render`: one-line diagnostics and serializable summaries
//! - `error`: explicit, actionable errors
//!
//! Everything here is pure and synchronous; I/O lives in `port` and the
//! exchange loop in `session`.

pub mod decoder;
pub mod error;
pub mod frame;
pub mod layout;
pub mod opcode;
pub mod parser;
pub mod reader;
pub mod render;
pub mod reply;

pub use decoder::{DecoderState, FrameDecoder, transition};
pub use error::{FrameError, ReplyError, ResyncError, UnknownOpcode};
pub use frame::Frame;
pub use opcode::{AckReason, CATALOG, Opcode, OpcodeDescriptor, PayloadShape, Role};
pub use parser::{Command, parse_command};
pub use render::FrameSummary;
pub use reply::{REPLY_TABLE, ReplyBuffer, ReplyKind, build_reply, reply_kind};
