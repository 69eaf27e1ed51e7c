//! Fixed request → reply mapping.
//!
//! Replies keep the request's hardware and message ids and swap the route
//! nibbles. Telemetry requests get an all-zero report, time queries get the
//! current J2000 time, a common ack is echoed, and everything else,
//! including opcodes missing from the catalog, is answered with a common
//! nack.

use time::OffsetDateTime;
use tracing::debug;

use super::decoder::FrameDecoder;
use super::error::ReplyError;
use super::frame::Frame;
use super::opcode::Opcode;
use crate::clock::{Clock, J2000Time};

/// What a reply carries besides the copied header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Telemetry report with a zeroed payload.
    Telemetry,
    /// Set-time frame filled from the clock.
    CurrentTime,
    CommonAck,
    CommonNack,
}

impl ReplyKind {
    pub fn opcode(self) -> Opcode {
        match self {
            Self::Telemetry => Opcode::AppTelem,
            Self::CurrentTime => Opcode::AppSetTime,
            Self::CommonAck => Opcode::CommonAck,
            Self::CommonNack => Opcode::CommonNack,
        }
    }
}

pub const REPLY_TABLE: [(Opcode, ReplyKind); 14] = [
    (Opcode::AppGetTelem, ReplyKind::Telemetry),
    (Opcode::AppGetTime, ReplyKind::CurrentTime),
    (Opcode::AppReboot, ReplyKind::CommonNack),
    (Opcode::AppSetTime, ReplyKind::CommonNack),
    (Opcode::AppTelem, ReplyKind::CommonNack),
    (Opcode::BootloaderAck, ReplyKind::CommonNack),
    (Opcode::BootloaderErase, ReplyKind::CommonNack),
    (Opcode::BootloaderNack, ReplyKind::CommonNack),
    (Opcode::BootloaderPing, ReplyKind::CommonNack),
    (Opcode::BootloaderWritePage, ReplyKind::CommonNack),
    (Opcode::BootloaderJump, ReplyKind::CommonNack),
    (Opcode::CommonAck, ReplyKind::CommonAck),
    (Opcode::CommonAscii, ReplyKind::CommonNack),
    (Opcode::CommonNack, ReplyKind::CommonNack),
];

/// Reply kind for a raw request opcode; unknown codes get a nack.
pub fn reply_kind(request_opcode: u8) -> ReplyKind {
    REPLY_TABLE
        .iter()
        .find(|(opcode, _)| opcode.code() == request_opcode)
        .map_or(ReplyKind::CommonNack, |&(_, kind)| kind)
}

/// Build the reply for a decoded request at instant `now`.
///
/// # Examples
/// ```
/// use taolst_core::{Frame, Opcode, build_reply, J2000};
///
/// let request = Frame::new(Opcode::AppGetTelem, 1, 7, 0x1, 0xa);
/// let reply = build_reply(&request, J2000);
/// assert_eq!(reply.opcode(), Some(Opcode::AppTelem));
/// assert_eq!(reply.length(), 0x54);
/// assert_eq!((reply.source(), reply.destination()), (0xa, 0x1));
/// ```
pub fn build_reply(request: &Frame, now: OffsetDateTime) -> Frame {
    let kind = reply_kind(request.opcode_byte());
    let mut reply = Frame::new(
        kind.opcode(),
        request.hardware_id(),
        request.message_id(),
        request.destination(),
        request.source(),
    );
    if kind == ReplyKind::CurrentTime {
        let time = J2000Time::from_datetime(now);
        reply.set_time(time.seconds, time.nanoseconds);
    }
    reply
}

/// Holds at most one outgoing reply until the caller takes it.
#[derive(Debug, Clone, Default)]
pub struct ReplyBuffer {
    pending: Option<Frame>,
}

impl ReplyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a reply for the decoder's completed frame. Does nothing when
    /// the decoder is not complete or a reply is already pending.
    pub fn generate_reply<C: Clock + ?Sized>(&mut self, decoder: &FrameDecoder, clock: &C) {
        let _ = self.try_generate_reply(decoder, clock);
    }

    pub fn try_generate_reply<C: Clock + ?Sized>(
        &mut self,
        decoder: &FrameDecoder,
        clock: &C,
    ) -> Result<&Frame, ReplyError> {
        if self.pending.is_some() {
            return Err(ReplyError::ReplyPending);
        }
        let request = decoder.frame().ok_or(ReplyError::DecodeIncomplete)?;
        let reply = build_reply(&request, clock.now());
        debug!(
            request = request.opcode_byte(),
            reply = reply.opcode_byte(),
            "reply generated"
        );
        Ok(&*self.pending.insert(reply))
    }

    pub fn pending(&self) -> Option<&Frame> {
        self.pending.as_ref()
    }

    pub fn take(&mut self) -> Option<Frame> {
        self.pending.take()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}
