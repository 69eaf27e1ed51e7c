use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use taolst_core::{
    AckReason, ByteSource, DEFAULT_MAX_EXCHANGES, DecodeReport, Frame, FrameError, FrameSummary,
    IoPort, Opcode, Role, SessionConfig, SystemClock, decode_source, run_session_with,
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("TAOLST_BUILD_COMMIT"),
    " ",
    env!("TAOLST_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "taolst")]
#[command(version = VERSION)]
#[command(
    about = "Frame codec and half-duplex responder for the TAOLST serial protocol.",
    long_about = None,
    after_help = "Examples:\n  taolst respond /dev/ttyUSB0 --count 4\n  taolst decode capture.bin --json\n  taolst encode app_reboot --delay 30 --out reboot.bin"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer requests arriving on a device, one reply per request.
    #[command(
        after_help = "The device must already be configured, e.g.:\n  stty -F /dev/ttyUSB0 115200 raw -echo"
    )]
    Respond {
        /// Serial device (or any readable and writable file)
        device: PathBuf,

        /// Stop after this many exchanges
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_EXCHANGES)]
        count: usize,

        /// Print the session report as JSON when done
        #[arg(long)]
        json: bool,

        /// Suppress per-exchange output
        #[arg(long)]
        quiet: bool,
    },
    /// Decode a raw byte capture into one line per frame.
    Decode {
        /// Capture file, or - for stdin
        input: PathBuf,

        /// Print a JSON report instead of lines
        #[arg(long)]
        json: bool,
    },
    /// Build a single frame.
    Encode(EncodeArgs),
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Opcode name (e.g. app_get_telem) or numeric code (e.g. 0x17)
    opcode: Opcode,

    #[arg(long, default_value = "0", value_parser = parse_u16)]
    hw_id: u16,

    #[arg(long, default_value = "0", value_parser = parse_u16)]
    msg_id: u16,

    /// Source role name (term, comm, expt, ctrl) or nibble
    #[arg(long, default_value = "ctrl", value_parser = parse_role)]
    src: u8,

    /// Destination role name (term, comm, expt, ctrl) or nibble
    #[arg(long, default_value = "comm", value_parser = parse_role)]
    dst: u8,

    /// Reboot delay (app_reboot)
    #[arg(long, value_parser = parse_u32)]
    delay: Option<u32>,

    /// Seconds since J2000 (app_set_time)
    #[arg(long, value_parser = parse_u32)]
    seconds: Option<u32>,

    /// Nanoseconds part (app_set_time)
    #[arg(long, value_parser = parse_u32, requires = "seconds")]
    nanoseconds: Option<u32>,

    /// Ack reason (bootloader_ack): pong, erased, jump or a number
    #[arg(long, value_parser = parse_ack_reason)]
    reason: Option<u8>,

    /// Erase status (bootloader_erase)
    #[arg(long, value_parser = parse_u8)]
    status: Option<u8>,

    /// Sub-page number (bootloader_write_page)
    #[arg(long, value_parser = parse_u8)]
    page: Option<u8>,

    /// 128 page bytes as hex (bootloader_write_page)
    #[arg(long, requires = "page")]
    page_data: Option<String>,

    /// 78 telemetry bytes as hex (app_telem)
    #[arg(long)]
    telemetry: Option<String>,

    /// Text payload (common_ascii)
    #[arg(long)]
    text: Option<String>,

    /// Write the raw frame bytes to this file instead of printing hex
    #[arg(short = 'o', long)]
    out: Option<PathBuf>,

    /// Print the frame summary as JSON
    #[arg(long, conflicts_with = "out")]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Respond {
            device,
            count,
            json,
            quiet,
        } => cmd_respond(&device, count, json, quiet),
        Commands::Decode { input, json } => cmd_decode(&input, json),
        Commands::Encode(args) => cmd_encode(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

#[derive(Debug, Serialize)]
struct ToolInfo {
    name: &'static str,
    version: &'static str,
    commit: &'static str,
}

/// JSON envelope shared by `respond --json` and `decode --json`.
#[derive(Debug, Serialize)]
struct CliReport<T: Serialize> {
    tool: ToolInfo,
    generated_at: String,
    input: String,
    #[serde(flatten)]
    report: T,
}

impl<T: Serialize> CliReport<T> {
    fn new(input: &Path, report: T) -> Result<Self> {
        let generated_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .context("Failed to format report timestamp")?;
        Ok(Self {
            tool: ToolInfo {
                name: "taolst",
                version: env!("CARGO_PKG_VERSION"),
                commit: env!("TAOLST_BUILD_COMMIT"),
            },
            generated_at,
            input: input.display().to_string(),
            report,
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    println!("{json}");
    Ok(())
}

fn cmd_respond(device: &Path, count: usize, json: bool, quiet: bool) -> Result<(), CliError> {
    let open_error = |err: io::Error| {
        CliError::new(
            format!("cannot open device {}: {err}", device.display()),
            Some("pass a serial device path such as /dev/ttyUSB0".to_string()),
        )
    };
    let reader = File::open(device).map_err(open_error)?;
    let writer = OpenOptions::new()
        .write(true)
        .open(device)
        .map_err(open_error)?;
    let mut port = IoPort::new(reader, writer);
    let config = SessionConfig {
        max_exchanges: count,
    };
    debug!(device = %device.display(), count, "session start");

    let print_lines = !json && !quiet;
    let report = run_session_with(&mut port, &SystemClock, &config, |exchange| {
        if print_lines {
            println!("rxcmd: {}", exchange.request);
            println!("reply: {}", exchange.reply);
        }
    })
    .with_context(|| format!("Session on {} failed", device.display()))?;

    if json {
        return print_json(&CliReport::new(device, report)?);
    }
    if !quiet {
        eprintln!("OK: {} exchange(s) served", report.exchanges.len());
        if report.truncated_bytes > 0 {
            eprintln!(
                "note: input ended {} byte(s) into a frame",
                report.truncated_bytes
            );
        }
    }
    Ok(())
}

fn cmd_decode(input: &Path, json: bool) -> Result<(), CliError> {
    let report = if input == Path::new("-") {
        decode_from(&mut IoPort::new(io::stdin().lock(), io::sink()))?
    } else {
        let file = File::open(input).map_err(|err| {
            CliError::new(
                format!("cannot open input {}: {err}", input.display()),
                Some("pass a raw byte capture, or - to read stdin".to_string()),
            )
        })?;
        decode_from(&mut IoPort::new(file, io::sink()))?
    };

    if json {
        return print_json(&CliReport::new(input, report)?);
    }
    for frame in &report.frames {
        println!("{frame}");
    }
    if report.resyncs > 0 || report.truncated_bytes > 0 {
        eprintln!(
            "note: {} resync(s), {} trailing byte(s) in an unfinished frame",
            report.resyncs, report.truncated_bytes
        );
    }
    Ok(())
}

fn decode_from<S: ByteSource>(source: &mut S) -> Result<DecodeReport, CliError> {
    decode_source(source)
        .context("Decoding failed")
        .map_err(Into::into)
}

fn cmd_encode(args: &EncodeArgs) -> Result<(), CliError> {
    let frame = build_frame(args)?;

    if args.json {
        return print_json(&FrameSummary::from_frame(&frame));
    }
    let Some(out) = args.out.as_ref() else {
        println!("{}", hex::encode(frame.as_bytes()));
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    let mut file =
        File::create(out).with_context(|| format!("Failed to create {}", out.display()))?;
    file.write_all(frame.as_bytes())
        .with_context(|| format!("Failed to write frame: {}", out.display()))?;
    eprintln!("OK: {} byte(s) written -> {}", frame.byte_count(), out.display());
    Ok(())
}

fn build_frame(args: &EncodeArgs) -> Result<Frame, CliError> {
    let mut frame = Frame::new(args.opcode, args.hw_id, args.msg_id, args.src, args.dst);

    if let Some(delay) = args.delay {
        apply("--delay", frame.try_set_reboot_delay(delay))?;
    }
    if let Some(seconds) = args.seconds {
        apply("--seconds", frame.try_set_time(seconds, args.nanoseconds.unwrap_or(0)))?;
    }
    if let Some(reason) = args.reason {
        apply("--reason", frame.try_set_ack_reason(reason))?;
    }
    if let Some(status) = args.status {
        apply("--status", frame.try_set_erase_status(status))?;
    }
    if let Some(page) = args.page {
        let data = args.page_data.as_deref().map(decode_hex).transpose()?;
        apply("--page", frame.try_set_write_page(page, data.as_deref()))?;
    }
    if let Some(telemetry) = args.telemetry.as_deref() {
        let data = decode_hex(telemetry)?;
        apply("--telemetry", frame.try_set_telemetry(&data))?;
    }
    if let Some(text) = args.text.as_deref() {
        apply("--text", frame.try_set_ascii_text(text))?;
    }
    Ok(frame)
}

fn apply(flag: &str, result: Result<(), FrameError>) -> Result<(), CliError> {
    result.map_err(|err| {
        let hint = match &err {
            FrameError::OpcodeMismatch { expected, .. } => {
                format!("{flag} only applies to opcode {expected}")
            }
            FrameError::InvalidPayloadSize { expected, .. } => {
                format!("expected exactly {expected} bytes ({} hex digits)", expected * 2)
            }
            FrameError::TextTooLong { max, .. } => format!("text holds at most {max} characters"),
            FrameError::NonByteCharacter { .. } => {
                "only characters up to U+00FF fit in a frame".to_string()
            }
            _ => "check the payload options against the opcode".to_string(),
        };
        CliError::new(format!("cannot apply {flag}: {err}"), Some(hint))
    })
}

fn decode_hex(text: &str) -> Result<Vec<u8>, CliError> {
    let digits: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    hex::decode(digits).map_err(|err| {
        CliError::new(
            format!("invalid hex string '{text}': {err}"),
            Some("use an even number of hex digits, e.g. 00ff10".to_string()),
        )
    })
}

fn parse_number(text: &str) -> Result<u64, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|err| format!("invalid number '{text}': {err}"))
}

fn parse_u8(text: &str) -> Result<u8, String> {
    let value = parse_number(text)?;
    u8::try_from(value).map_err(|_| format!("{value} does not fit in one byte"))
}

fn parse_u16(text: &str) -> Result<u16, String> {
    let value = parse_number(text)?;
    u16::try_from(value).map_err(|_| format!("{value} does not fit in 16 bits"))
}

fn parse_u32(text: &str) -> Result<u32, String> {
    let value = parse_number(text)?;
    u32::try_from(value).map_err(|_| format!("{value} does not fit in 32 bits"))
}

fn parse_role(text: &str) -> Result<u8, String> {
    let named = Role::ALL
        .into_iter()
        .find(|role| role.name().eq_ignore_ascii_case(text));
    if let Some(role) = named {
        return Ok(role.nibble());
    }
    let value = parse_u8(text)?;
    if value > 0x0f {
        return Err(format!("role {value} does not fit in a nibble"));
    }
    Ok(value)
}

fn parse_ack_reason(text: &str) -> Result<u8, String> {
    let named = AckReason::ALL
        .into_iter()
        .find(|reason| reason.name().eq_ignore_ascii_case(text));
    match named {
        Some(reason) => Ok(reason.code()),
        None => parse_u8(text),
    }
}
