//! Static opcode catalog.
//!
//! Every known opcode has exactly one [`OpcodeDescriptor`] in [`CATALOG`],
//! stored in enum declaration order so lookups are a plain index. Role and
//! ack-reason names used by rendering live here as well.

use std::fmt;
use std::str::FromStr;

use super::error::UnknownOpcode;
use super::layout;

/// Known TAOLST opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    BootloaderPing,
    BootloaderAck,
    BootloaderWritePage,
    BootloaderJump,
    BootloaderErase,
    BootloaderNack,
    CommonAck,
    CommonAscii,
    AppReboot,
    AppGetTime,
    AppSetTime,
    AppGetTelem,
    AppTelem,
    CommonNack,
}

/// Payload shape of an opcode; also decides which setter applies to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Empty,
    RebootDelay,
    Time,
    Telemetry,
    AckReason,
    EraseStatus,
    WritePage,
    Ascii,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeDescriptor {
    pub opcode: Opcode,
    pub code: u8,
    pub name: &'static str,
    /// Length field value of a freshly constructed frame; payload is zeroed.
    pub default_length: u8,
    pub shape: PayloadShape,
}

const fn entry(
    opcode: Opcode,
    code: u8,
    name: &'static str,
    default_length: u8,
    shape: PayloadShape,
) -> OpcodeDescriptor {
    OpcodeDescriptor {
        opcode,
        code,
        name,
        default_length,
        shape,
    }
}

pub const CATALOG: [OpcodeDescriptor; 14] = [
    entry(Opcode::BootloaderPing, 0x00, "bootloader_ping", layout::MIN_LENGTH, PayloadShape::Empty),
    entry(
        Opcode::BootloaderAck,
        0x01,
        "bootloader_ack",
        layout::MIN_LENGTH,
        PayloadShape::AckReason,
    ),
    entry(
        Opcode::BootloaderWritePage,
        0x02,
        "bootloader_write_page",
        layout::SINGLE_BYTE_LENGTH,
        PayloadShape::WritePage,
    ),
    entry(Opcode::BootloaderJump, 0x0b, "bootloader_jump", layout::MIN_LENGTH, PayloadShape::Empty),
    entry(
        Opcode::BootloaderErase,
        0x0c,
        "bootloader_erase",
        layout::MIN_LENGTH,
        PayloadShape::EraseStatus,
    ),
    entry(Opcode::BootloaderNack, 0x0f, "bootloader_nack", layout::MIN_LENGTH, PayloadShape::Empty),
    entry(Opcode::CommonAck, 0x10, "common_ack", layout::MIN_LENGTH, PayloadShape::Empty),
    entry(Opcode::CommonAscii, 0x11, "common_ascii", layout::MIN_LENGTH, PayloadShape::Ascii),
    entry(Opcode::AppReboot, 0x12, "app_reboot", layout::MIN_LENGTH, PayloadShape::RebootDelay),
    entry(Opcode::AppGetTime, 0x13, "app_get_time", layout::MIN_LENGTH, PayloadShape::Empty),
    entry(Opcode::AppSetTime, 0x14, "app_set_time", layout::SET_TIME_LENGTH, PayloadShape::Time),
    entry(Opcode::AppGetTelem, 0x17, "app_get_telem", layout::MIN_LENGTH, PayloadShape::Empty),
    entry(Opcode::AppTelem, 0x18, "app_telem", layout::TELEMETRY_LENGTH, PayloadShape::Telemetry),
    entry(Opcode::CommonNack, 0xff, "common_nack", layout::MIN_LENGTH, PayloadShape::Empty),
];

impl Opcode {
    pub fn descriptor(self) -> &'static OpcodeDescriptor {
        &CATALOG[self as usize]
    }

    pub fn from_u8(code: u8) -> Option<Self> {
        CATALOG
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| entry.opcode)
    }

    pub fn code(self) -> u8 {
        self.descriptor().code
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn default_length(self) -> u8 {
        self.descriptor().default_length
    }

    pub fn shape(self) -> PayloadShape {
        self.descriptor().shape
    }

    pub fn iter() -> impl Iterator<Item = Opcode> {
        CATALOG.iter().map(|entry| entry.opcode)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses a catalog name (`app_get_time`, `app-get-time`) or a numeric code
/// (`0x13`, `19`).
impl FromStr for Opcode {
    type Err = UnknownOpcode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        if let Some(entry) = CATALOG.iter().find(|entry| entry.name == normalized) {
            return Ok(entry.opcode);
        }
        let code = match normalized.strip_prefix("0x") {
            Some(hex) => u8::from_str_radix(hex, 16).ok(),
            None => normalized.parse::<u8>().ok(),
        };
        code.and_then(Opcode::from_u8)
            .ok_or_else(|| UnknownOpcode(s.to_string()))
    }
}

/// Endpoint roles packed into the route byte nibbles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Term,
    Comm,
    Expt,
    Ctrl,
}

impl Role {
    pub const ALL: [Role; 4] = [Self::Term, Self::Comm, Self::Expt, Self::Ctrl];

    pub fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            layout::ROLE_TERM => Some(Self::Term),
            layout::ROLE_COMM => Some(Self::Comm),
            layout::ROLE_EXPT => Some(Self::Expt),
            layout::ROLE_CTRL => Some(Self::Ctrl),
            _ => None,
        }
    }

    pub fn nibble(self) -> u8 {
        match self {
            Self::Term => layout::ROLE_TERM,
            Self::Comm => layout::ROLE_COMM,
            Self::Expt => layout::ROLE_EXPT,
            Self::Ctrl => layout::ROLE_CTRL,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Term => "term",
            Self::Comm => "comm",
            Self::Expt => "expt",
            Self::Ctrl => "ctrl",
        }
    }
}

/// Role name for a route nibble, `"?"` when unassigned.
pub fn role_name(nibble: u8) -> &'static str {
    Role::from_nibble(nibble).map_or("?", Role::name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckReason {
    Pong,
    Erased,
    Jump,
}

impl AckReason {
    pub const ALL: [AckReason; 3] = [Self::Pong, Self::Erased, Self::Jump];

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            layout::ACK_REASON_PONG => Some(Self::Pong),
            layout::ACK_REASON_ERASED => Some(Self::Erased),
            layout::ACK_REASON_JUMP => Some(Self::Jump),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Pong => layout::ACK_REASON_PONG,
            Self::Erased => layout::ACK_REASON_ERASED,
            Self::Jump => layout::ACK_REASON_JUMP,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Pong => "pong",
            Self::Erased => "erased",
            Self::Jump => "jump",
        }
    }
}

/// Ack reason name for a raw byte, `"?"` when unassigned.
pub fn ack_reason_name(value: u8) -> &'static str {
    AckReason::from_u8(value).map_or("?", AckReason::name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_in_declaration_order() {
        for (index, entry) in CATALOG.iter().enumerate() {
            assert_eq!(entry.opcode as usize, index, "{}", entry.name);
        }
    }

    #[test]
    fn codes_match_wire_table() {
        let expected = [
            (Opcode::AppGetTelem, 0x17),
            (Opcode::AppGetTime, 0x13),
            (Opcode::AppReboot, 0x12),
            (Opcode::AppSetTime, 0x14),
            (Opcode::AppTelem, 0x18),
            (Opcode::BootloaderAck, 0x01),
            (Opcode::BootloaderErase, 0x0c),
            (Opcode::BootloaderJump, 0x0b),
            (Opcode::BootloaderNack, 0x0f),
            (Opcode::BootloaderPing, 0x00),
            (Opcode::BootloaderWritePage, 0x02),
            (Opcode::CommonAck, 0x10),
            (Opcode::CommonAscii, 0x11),
            (Opcode::CommonNack, 0xff),
        ];
        for (opcode, code) in expected {
            assert_eq!(opcode.code(), code);
            assert_eq!(Opcode::from_u8(code), Some(opcode));
        }
    }

    #[test]
    fn unknown_code_has_no_opcode() {
        assert_eq!(Opcode::from_u8(0x20), None);
        assert_eq!(Opcode::from_u8(0x15), None);
    }

    #[test]
    fn default_lengths() {
        assert_eq!(Opcode::AppTelem.default_length(), 0x54);
        assert_eq!(Opcode::AppSetTime.default_length(), 0x0e);
        assert_eq!(Opcode::BootloaderWritePage.default_length(), 0x07);
        assert_eq!(Opcode::AppReboot.default_length(), 0x06);
        assert_eq!(Opcode::CommonAscii.default_length(), 0x06);
    }

    #[test]
    fn parse_names_and_codes() {
        assert_eq!("app_get_time".parse::<Opcode>(), Ok(Opcode::AppGetTime));
        assert_eq!("APP-GET-TELEM".parse::<Opcode>(), Ok(Opcode::AppGetTelem));
        assert_eq!("0xff".parse::<Opcode>(), Ok(Opcode::CommonNack));
        assert_eq!("16".parse::<Opcode>(), Ok(Opcode::CommonAck));
        assert!("0x20".parse::<Opcode>().is_err());
        assert!("reboot_now".parse::<Opcode>().is_err());
    }

    #[test]
    fn role_names() {
        assert_eq!(role_name(0x01), "comm");
        assert_eq!(role_name(0x0a), "ctrl");
        assert_eq!(role_name(0x02), "expt");
        assert_eq!(role_name(0x00), "term");
        assert_eq!(role_name(0x03), "?");
        assert_eq!(Role::Ctrl.nibble(), 10);
    }

    #[test]
    fn ack_reason_names() {
        assert_eq!(ack_reason_name(0x00), "pong");
        assert_eq!(ack_reason_name(0x01), "erased");
        assert_eq!(ack_reason_name(0xff), "jump");
        assert_eq!(ack_reason_name(0x02), "?");
        assert_eq!(AckReason::Jump.code(), 0xff);
    }
}
