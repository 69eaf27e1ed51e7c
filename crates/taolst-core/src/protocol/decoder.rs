//! Byte-at-a-time frame reassembly.
//!
//! The decoder hunts for the `0x22 0x69` start pair, accepts a length in
//! `6..=255` and then stores exactly `length` further bytes. A wrong second
//! marker or a short length drops the partial frame and resumes hunting;
//! the offending byte is discarded, not re-examined as a new start marker.
//! There is no timeout and no integrity check: a stalled frame stays partial
//! until more bytes arrive, and corrupted payload bytes are accepted as-is.

use tracing::{debug, trace};

use super::error::ResyncError;
use super::frame::Frame;
use super::layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    AwaitStart0,
    AwaitStart1,
    ReadLength,
    ReadHwidLo,
    ReadHwidHi,
    ReadMsgIdLo,
    ReadMsgIdHi,
    ReadRoute,
    ReadOpcode,
    ReadPayload,
    Complete,
}

/// Pure state transition for one incoming byte.
///
/// `remaining` is the number of frame bytes still expected after `byte`; it
/// only matters in `ReadOpcode` and `ReadPayload`.
///
/// # Examples
/// ```
/// use taolst_core::{DecoderState, transition};
///
/// assert_eq!(transition(DecoderState::AwaitStart0, 0x22, 0), DecoderState::AwaitStart1);
/// assert_eq!(transition(DecoderState::ReadLength, 0x05, 0), DecoderState::AwaitStart0);
/// assert_eq!(transition(DecoderState::ReadOpcode, 0x13, 0), DecoderState::Complete);
/// ```
pub fn transition(state: DecoderState, byte: u8, remaining: usize) -> DecoderState {
    match check_transition(state, byte, remaining) {
        Ok(next) => next,
        Err(_) => DecoderState::AwaitStart0,
    }
}

fn check_transition(
    state: DecoderState,
    byte: u8,
    remaining: usize,
) -> Result<DecoderState, ResyncError> {
    use DecoderState::*;

    let next = match state {
        AwaitStart0 if byte == layout::START_BYTE_0 => AwaitStart1,
        AwaitStart0 => AwaitStart0,
        AwaitStart1 if byte == layout::START_BYTE_1 => ReadLength,
        AwaitStart1 => return Err(ResyncError::UnexpectedStartByte { found: byte }),
        ReadLength if byte >= layout::MIN_LENGTH => ReadHwidLo,
        ReadLength => return Err(ResyncError::InvalidLength { length: byte }),
        ReadHwidLo => ReadHwidHi,
        ReadHwidHi => ReadMsgIdLo,
        ReadMsgIdLo => ReadMsgIdHi,
        ReadMsgIdHi => ReadRoute,
        ReadRoute => ReadOpcode,
        ReadOpcode | ReadPayload if remaining > 0 => ReadPayload,
        ReadOpcode | ReadPayload => Complete,
        Complete => Complete,
    };
    Ok(next)
}

/// Reassembles one frame from individually fed bytes.
///
/// # Examples
/// ```
/// use taolst_core::{DecoderState, Frame, FrameDecoder, Opcode};
///
/// let frame = Frame::new(Opcode::CommonAck, 1, 2, 0x1, 0x0);
/// let mut decoder = FrameDecoder::new();
/// for &byte in frame.as_bytes() {
///     decoder.feed(byte);
/// }
/// assert_eq!(decoder.state(), DecoderState::Complete);
/// assert_eq!(decoder.take_frame(), Some(frame));
/// assert_eq!(decoder.state(), DecoderState::AwaitStart0);
/// ```
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: DecoderState,
    buffer: [u8; layout::MAX_FRAME_LEN],
    cursor: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::AwaitStart0,
            buffer: [0u8; layout::MAX_FRAME_LEN],
            cursor: 0,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == DecoderState::Complete
    }

    /// Feed one byte; malformed headers resynchronize silently.
    pub fn feed(&mut self, byte: u8) -> DecoderState {
        match self.try_feed(byte) {
            Ok(state) => state,
            Err(_) => self.state,
        }
    }

    /// Same state change as [`feed`](Self::feed), but reports why a partial
    /// frame was dropped. The decoder is already back in `AwaitStart0` when
    /// this returns an error.
    pub fn try_feed(&mut self, byte: u8) -> Result<DecoderState, ResyncError> {
        if self.state == DecoderState::Complete {
            return Ok(self.state);
        }

        let next = match check_transition(self.state, byte, self.remaining_after_next()) {
            Ok(next) => next,
            Err(err) => {
                trace!(%err, dropped = self.cursor, "decoder resync");
                self.clear();
                return Err(err);
            }
        };
        if next == DecoderState::AwaitStart0 {
            return Ok(next);
        }

        self.buffer[self.cursor] = byte;
        self.cursor += 1;
        self.state = next;
        if next == DecoderState::Complete {
            debug!(
                bytes = self.cursor,
                opcode = self.buffer[layout::OPCODE_OFFSET],
                "frame complete"
            );
        }
        Ok(next)
    }

    /// Wire size announced by the length byte, once it has been accepted.
    pub fn byte_count(&self) -> Option<usize> {
        (self.cursor > layout::LENGTH_OFFSET)
            .then(|| layout::frame_len(self.buffer[layout::LENGTH_OFFSET]))
    }

    /// Bytes accepted so far for the current frame.
    pub fn frame_bytes(&self) -> &[u8] {
        &self.buffer[..self.cursor]
    }

    pub fn frame(&self) -> Option<Frame> {
        self.is_complete().then(|| Frame::from_buffer(self.buffer))
    }

    /// Hand out the completed frame and get ready for the next one.
    pub fn take_frame(&mut self) -> Option<Frame> {
        let frame = self.frame()?;
        self.clear();
        Some(frame)
    }

    pub fn clear(&mut self) {
        self.state = DecoderState::AwaitStart0;
        self.buffer = [0u8; layout::MAX_FRAME_LEN];
        self.cursor = 0;
    }

    fn remaining_after_next(&self) -> usize {
        self.byte_count()
            .map_or(0, |total| total.saturating_sub(self.cursor + 1))
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{DecoderState, FrameDecoder, transition};
    use crate::protocol::error::ResyncError;
    use crate::protocol::frame::Frame;
    use crate::protocol::opcode::Opcode;

    fn feed_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> DecoderState {
        let mut state = decoder.state();
        for &byte in bytes {
            state = decoder.feed(byte);
        }
        state
    }

    #[test]
    fn walks_header_states_in_order() {
        let frame = Frame::new(Opcode::AppReboot, 0x0102, 0x0304, 0x1, 0x1);
        let mut decoder = FrameDecoder::new();
        let expected = [
            DecoderState::AwaitStart1,
            DecoderState::ReadLength,
            DecoderState::ReadHwidLo,
            DecoderState::ReadHwidHi,
            DecoderState::ReadMsgIdLo,
            DecoderState::ReadMsgIdHi,
            DecoderState::ReadRoute,
            DecoderState::ReadOpcode,
            DecoderState::Complete,
        ];
        for (&byte, state) in frame.as_bytes().iter().zip(expected) {
            assert_eq!(decoder.feed(byte), state);
        }
    }

    #[test]
    fn payload_frames_pass_through_read_payload() {
        let mut frame = Frame::new(Opcode::AppReboot, 0, 0, 0, 0);
        frame.set_reboot_delay(42);
        let bytes = frame.as_bytes();
        let mut decoder = FrameDecoder::new();
        feed_all(&mut decoder, &bytes[..9]);
        assert_eq!(decoder.state(), DecoderState::ReadPayload);
        assert_eq!(decoder.byte_count(), Some(13));
        feed_all(&mut decoder, &bytes[9..12]);
        assert_eq!(decoder.state(), DecoderState::ReadPayload);
        assert_eq!(decoder.feed(bytes[12]), DecoderState::Complete);
        assert_eq!(decoder.frame(), Some(frame));
    }

    #[test]
    fn noise_before_start_is_ignored() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.feed(0x00), DecoderState::AwaitStart0);
        assert_eq!(decoder.feed(0x69), DecoderState::AwaitStart0);
        assert!(decoder.frame_bytes().is_empty());
        assert_eq!(decoder.try_feed(0x41), Ok(DecoderState::AwaitStart0));
    }

    #[test]
    fn false_second_marker_is_discarded() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(0x22);
        // The second 0x22 is dropped with the partial frame, not reused.
        assert_eq!(decoder.feed(0x22), DecoderState::AwaitStart0);
        assert_eq!(decoder.feed(0x69), DecoderState::AwaitStart0);

        decoder.feed(0x22);
        assert_eq!(
            decoder.try_feed(0x70),
            Err(ResyncError::UnexpectedStartByte { found: 0x70 })
        );
        assert_eq!(decoder.state(), DecoderState::AwaitStart0);
    }

    #[test]
    fn short_length_resyncs() {
        let mut decoder = FrameDecoder::new();
        feed_all(&mut decoder, &[0x22, 0x69]);
        assert_eq!(decoder.byte_count(), None);
        assert_eq!(
            decoder.try_feed(0x05),
            Err(ResyncError::InvalidLength { length: 5 })
        );
        assert_eq!(decoder.state(), DecoderState::AwaitStart0);
        assert!(decoder.frame_bytes().is_empty());
    }

    #[test]
    fn complete_ignores_extra_bytes() {
        let frame = Frame::new(Opcode::CommonNack, 1, 1, 0, 1);
        let mut decoder = FrameDecoder::new();
        feed_all(&mut decoder, frame.as_bytes());
        assert_eq!(decoder.feed(0x22), DecoderState::Complete);
        assert_eq!(decoder.frame_bytes(), frame.as_bytes());
    }

    #[test]
    fn maximum_length_frame() {
        let mut frame = Frame::new(Opcode::CommonAscii, 0, 0, 0, 0);
        frame.set_ascii_text(&"z".repeat(249));
        let mut decoder = FrameDecoder::new();
        let state = feed_all(&mut decoder, frame.as_bytes());
        assert_eq!(state, DecoderState::Complete);
        assert_eq!(decoder.frame_bytes().len(), 258);
    }

    #[test]
    fn unknown_opcode_is_structurally_valid() {
        let bytes = [0x22, 0x69, 0x07, 0, 0, 0, 0, 0x11, 0x42, 0xee];
        let mut decoder = FrameDecoder::new();
        assert_eq!(feed_all(&mut decoder, &bytes), DecoderState::Complete);
        let frame = decoder.frame().unwrap();
        assert_eq!(frame.opcode(), None);
        assert_eq!(frame.payload(), &[0xee]);
    }

    #[test]
    fn frame_is_none_until_complete() {
        let mut decoder = FrameDecoder::new();
        feed_all(&mut decoder, &[0x22, 0x69, 0x06, 0x01]);
        assert_eq!(decoder.frame(), None);
        assert_eq!(decoder.take_frame(), None);
        assert_eq!(decoder.frame_bytes(), &[0x22, 0x69, 0x06, 0x01]);
    }

    #[test]
    fn pure_transition_table() {
        use DecoderState::*;
        assert_eq!(transition(AwaitStart0, 0x00, 0), AwaitStart0);
        assert_eq!(transition(AwaitStart1, 0x69, 0), ReadLength);
        assert_eq!(transition(AwaitStart1, 0x22, 0), AwaitStart0);
        assert_eq!(transition(ReadLength, 0x06, 0), ReadHwidLo);
        assert_eq!(transition(ReadLength, 0xff, 0), ReadHwidLo);
        assert_eq!(transition(ReadRoute, 0x00, 0), ReadOpcode);
        assert_eq!(transition(ReadOpcode, 0x12, 4), ReadPayload);
        assert_eq!(transition(ReadPayload, 0x00, 1), ReadPayload);
        assert_eq!(transition(ReadPayload, 0x00, 0), Complete);
        assert_eq!(transition(Complete, 0x22, 0), Complete);
    }
}
