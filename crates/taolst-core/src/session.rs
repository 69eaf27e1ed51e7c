use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::port::{ByteSink, ByteSource, PortError};
use crate::protocol::{Frame, FrameDecoder, FrameSummary, ReplyBuffer, ReplyError};

/// Exchanges served by [`run_session`] when no count is given.
pub const DEFAULT_MAX_EXCHANGES: usize = 12;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Port error: {0}")]
    Port(#[from] PortError),
    #[error("Reply error: {0}")]
    Reply(#[from] ReplyError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Stop after this many request/reply exchanges.
    pub max_exchanges: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_exchanges: DEFAULT_MAX_EXCHANGES,
        }
    }
}

/// One received request and the reply written back for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub request: FrameSummary,
    pub reply: FrameSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Exchanges in the order they happened.
    pub exchanges: Vec<ExchangeRecord>,
    /// Partial frames dropped because of a malformed header.
    pub resyncs: u64,
    /// Bytes of an unfinished frame held when the source ran dry.
    pub truncated_bytes: usize,
}

/// Frames recovered from a byte stream without replying to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeReport {
    pub frames: Vec<FrameSummary>,
    pub resyncs: u64,
    pub truncated_bytes: usize,
}

/// Answer requests arriving on `port` until `max_exchanges` replies have been
/// written or the source is exhausted.
///
/// The exchange is strictly half-duplex: a reply is fully written before the
/// next request byte is read.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use taolst_core::{FixedClock, Frame, IoPort, J2000, Opcode, SessionConfig, run_session};
///
/// let request = Frame::new(Opcode::CommonAck, 1, 2, 0x1, 0xa);
/// let mut port = IoPort::new(Cursor::new(request.as_bytes().to_vec()), Vec::new());
/// let report = run_session(&mut port, &FixedClock(J2000), &SessionConfig::default())?;
/// assert_eq!(report.exchanges.len(), 1);
/// assert_eq!(report.exchanges[0].reply.opcode_name, "common_ack");
/// # Ok::<(), taolst_core::SessionError>(())
/// ```
pub fn run_session<P, C>(
    port: &mut P,
    clock: &C,
    config: &SessionConfig,
) -> Result<SessionReport, SessionError>
where
    P: ByteSource + ByteSink + ?Sized,
    C: Clock + ?Sized,
{
    run_session_with(port, clock, config, |_| {})
}

/// [`run_session`] that also hands every exchange to `on_exchange` as soon
/// as its reply has been written.
pub fn run_session_with<P, C, F>(
    port: &mut P,
    clock: &C,
    config: &SessionConfig,
    mut on_exchange: F,
) -> Result<SessionReport, SessionError>
where
    P: ByteSource + ByteSink + ?Sized,
    C: Clock + ?Sized,
    F: FnMut(&ExchangeRecord),
{
    let mut decoder = FrameDecoder::new();
    let mut replies = ReplyBuffer::new();
    let mut report = SessionReport::default();

    while report.exchanges.len() < config.max_exchanges {
        let Some(request) = next_frame(port, &mut decoder, &mut report.resyncs)? else {
            report.truncated_bytes = truncated(&decoder);
            break;
        };
        let reply = replies.try_generate_reply(&decoder, clock)?;
        port.write_bytes(reply.as_bytes())?;
        info!(rxcmd = %request, reply = %reply, "exchange");
        let exchange = ExchangeRecord {
            request: FrameSummary::from_frame(&request),
            reply: FrameSummary::from_frame(reply),
        };
        on_exchange(&exchange);
        report.exchanges.push(exchange);
        decoder.clear();
        replies.clear();
    }

    Ok(report)
}

/// Decode every complete frame `source` yields until it is exhausted.
pub fn decode_source<S: ByteSource + ?Sized>(source: &mut S) -> Result<DecodeReport, SessionError> {
    let mut decoder = FrameDecoder::new();
    let mut report = DecodeReport::default();

    while let Some(frame) = next_frame(source, &mut decoder, &mut report.resyncs)? {
        report.frames.push(FrameSummary::from_frame(&frame));
        decoder.clear();
    }
    report.truncated_bytes = truncated(&decoder);

    Ok(report)
}

/// Feed bytes until the decoder completes a frame; `None` when the source
/// runs dry first. The decoder is left in the complete state.
fn next_frame<S: ByteSource + ?Sized>(
    source: &mut S,
    decoder: &mut FrameDecoder,
    resyncs: &mut u64,
) -> Result<Option<Frame>, PortError> {
    while !decoder.is_complete() {
        let Some(byte) = source.read_byte()? else {
            return Ok(None);
        };
        if decoder.try_feed(byte).is_err() {
            *resyncs += 1;
        }
    }
    Ok(decoder.frame())
}

fn truncated(decoder: &FrameDecoder) -> usize {
    let held = decoder.frame_bytes().len();
    if held > 0 {
        warn!(bytes = held, "input ended inside a frame");
    }
    held
}
