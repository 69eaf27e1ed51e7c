pub const START_BYTE_0: u8 = 0x22;
pub const START_BYTE_1: u8 = 0x69;

pub const START_BYTE_0_OFFSET: usize = 0;
pub const START_BYTE_1_OFFSET: usize = 1;
pub const LENGTH_OFFSET: usize = 2;
pub const HWID_RANGE: std::ops::Range<usize> = 3..5;
pub const MSG_ID_RANGE: std::ops::Range<usize> = 5..7;
pub const ROUTE_OFFSET: usize = 7;
pub const OPCODE_OFFSET: usize = 8;
pub const DATA_OFFSET: usize = 9;

/// Bytes on the wire that precede the region counted by the length field.
pub const LENGTH_OVERHEAD: usize = 3;
/// Length value of a frame with an empty payload (hwid + msgid + route + opcode).
pub const MIN_LENGTH: u8 = 0x06;
pub const MAX_FRAME_LEN: usize = 258;
pub const MAX_DATA_LEN: usize = 249;

pub const REBOOT_LENGTH: u8 = 0x0a;
pub const SET_TIME_LENGTH: u8 = 0x0e;
pub const TELEMETRY_LENGTH: u8 = 0x54;
pub const SINGLE_BYTE_LENGTH: u8 = 0x07;
pub const WRITE_PAGE_FULL_LENGTH: u8 = 0x87;

// Offsets below are relative to the start of the payload.
pub const DELAY_RANGE: std::ops::Range<usize> = 0..4;
pub const SECONDS_RANGE: std::ops::Range<usize> = 0..4;
pub const NANOSECONDS_RANGE: std::ops::Range<usize> = 4..8;
pub const STATUS_OFFSET: usize = 0;
pub const PAGE_NUMBER_OFFSET: usize = 0;
pub const PAGE_DATA_RANGE: std::ops::Range<usize> = 1..129;

pub const TELEMETRY_DATA_LEN: usize = 78;
pub const PAGE_DATA_LEN: usize = 128;

pub const ROLE_TERM: u8 = 0x00;
pub const ROLE_COMM: u8 = 0x01;
pub const ROLE_EXPT: u8 = 0x02;
pub const ROLE_CTRL: u8 = 0x0a;

pub const ACK_REASON_PONG: u8 = 0x00;
pub const ACK_REASON_ERASED: u8 = 0x01;
pub const ACK_REASON_JUMP: u8 = 0xff;

/// Total wire size for a given length field value.
pub const fn frame_len(length: u8) -> usize {
    length as usize + LENGTH_OVERHEAD
}

/// Payload size for a given length field value (zero below the minimum).
pub const fn data_len(length: u8) -> usize {
    (length as usize).saturating_sub(MIN_LENGTH as usize)
}

#[cfg(test)]
mod tests {
    use super::{MAX_DATA_LEN, MAX_FRAME_LEN, data_len, frame_len};

    #[test]
    fn length_bounds_match_buffer() {
        assert_eq!(frame_len(0xff), MAX_FRAME_LEN);
        assert_eq!(data_len(0xff), MAX_DATA_LEN);
        assert_eq!(frame_len(0x06), 9);
        assert_eq!(data_len(0x06), 0);
    }
}
