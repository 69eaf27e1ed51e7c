//! Outgoing and decoded TAOLST frames.
//!
//! A [`Frame`] owns a fixed 258-byte buffer; the length field at offset 2 is
//! the logical size and [`Frame::as_bytes`] never exposes anything past it.
//! Opcode-specific setters are guarded: applied to the wrong opcode, or given
//! a payload of the wrong size, they leave the frame untouched. Each setter
//! has a `try_` twin that reports the mismatch instead.

use std::fmt;

use tracing::trace;

use super::error::FrameError;
use super::layout;
use super::opcode::Opcode;
use super::reader::FrameReader;

#[derive(Clone)]
pub struct Frame {
    data: [u8; layout::MAX_FRAME_LEN],
}

impl Frame {
    /// Build a frame with the header filled in and the catalog default
    /// length for `opcode`. Roles are 4-bit values; upper bits are dropped.
    ///
    /// # Examples
    /// ```
    /// use taolst_core::{Frame, Opcode};
    ///
    /// let frame = Frame::new(Opcode::AppGetTime, 0x0001, 0x0002, 0x1, 0xa);
    /// assert_eq!(frame.as_bytes(), &[0x22, 0x69, 0x06, 0x01, 0x00, 0x02, 0x00, 0x1a, 0x13]);
    /// ```
    pub fn new(
        opcode: Opcode,
        hardware_id: u16,
        message_id: u16,
        source: u8,
        destination: u8,
    ) -> Self {
        let mut data = [0u8; layout::MAX_FRAME_LEN];
        data[layout::START_BYTE_0_OFFSET] = layout::START_BYTE_0;
        data[layout::START_BYTE_1_OFFSET] = layout::START_BYTE_1;
        data[layout::LENGTH_OFFSET] = opcode.default_length();
        data[layout::HWID_RANGE].copy_from_slice(&hardware_id.to_le_bytes());
        data[layout::MSG_ID_RANGE].copy_from_slice(&message_id.to_le_bytes());
        data[layout::ROUTE_OFFSET] = pack_route(source, destination);
        data[layout::OPCODE_OFFSET] = opcode.code();
        Self { data }
    }

    /// Validate and copy one complete serialized frame.
    ///
    /// # Errors
    /// Returns `FrameError` when the markers or length field are invalid or
    /// `bytes` is not exactly as long as the header declares.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        let reader = FrameReader::new(bytes);
        reader.require_len(layout::DATA_OFFSET)?;

        let start0 = reader.read_u8(layout::START_BYTE_0_OFFSET)?;
        if start0 != layout::START_BYTE_0 {
            return Err(FrameError::InvalidStartMarker { found: start0 });
        }
        let start1 = reader.read_u8(layout::START_BYTE_1_OFFSET)?;
        if start1 != layout::START_BYTE_1 {
            return Err(FrameError::InvalidStartMarker { found: start1 });
        }
        let length = reader.read_u8(layout::LENGTH_OFFSET)?;
        if length < layout::MIN_LENGTH {
            return Err(FrameError::InvalidLength { length });
        }
        let declared = layout::frame_len(length);
        if bytes.len() != declared {
            return Err(FrameError::LengthMismatch {
                declared,
                actual: bytes.len(),
            });
        }

        let mut data = [0u8; layout::MAX_FRAME_LEN];
        data[..declared].copy_from_slice(bytes);
        Ok(Self { data })
    }

    pub(crate) fn from_buffer(data: [u8; layout::MAX_FRAME_LEN]) -> Self {
        Self { data }
    }

    pub fn length(&self) -> u8 {
        self.data[layout::LENGTH_OFFSET]
    }

    /// Number of bytes on the wire: length field + 3.
    pub fn byte_count(&self) -> usize {
        layout::frame_len(self.length())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.byte_count()]
    }

    pub fn hardware_id(&self) -> u16 {
        self.header_u16(layout::HWID_RANGE)
    }

    pub fn message_id(&self) -> u16 {
        self.header_u16(layout::MSG_ID_RANGE)
    }

    pub fn route(&self) -> u8 {
        self.data[layout::ROUTE_OFFSET]
    }

    pub fn source(&self) -> u8 {
        self.route() >> 4
    }

    pub fn destination(&self) -> u8 {
        self.route() & 0x0f
    }

    pub fn opcode_byte(&self) -> u8 {
        self.data[layout::OPCODE_OFFSET]
    }

    /// Catalog opcode, `None` for codes the catalog does not know.
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u8(self.opcode_byte())
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[layout::DATA_OFFSET..self.byte_count()]
    }

    pub fn set_reboot_delay(&mut self, delay: u32) {
        ignore_mismatch(self.try_set_reboot_delay(delay));
    }

    pub fn try_set_reboot_delay(&mut self, delay: u32) -> Result<(), FrameError> {
        self.expect_opcode(Opcode::AppReboot)?;
        self.data[layout::LENGTH_OFFSET] = layout::REBOOT_LENGTH;
        self.write_data(layout::DELAY_RANGE.start, &delay.to_le_bytes());
        Ok(())
    }

    pub fn set_time(&mut self, seconds: u32, nanoseconds: u32) {
        ignore_mismatch(self.try_set_time(seconds, nanoseconds));
    }

    pub fn try_set_time(&mut self, seconds: u32, nanoseconds: u32) -> Result<(), FrameError> {
        self.expect_opcode(Opcode::AppSetTime)?;
        self.data[layout::LENGTH_OFFSET] = layout::SET_TIME_LENGTH;
        self.write_data(layout::SECONDS_RANGE.start, &seconds.to_le_bytes());
        self.write_data(layout::NANOSECONDS_RANGE.start, &nanoseconds.to_le_bytes());
        Ok(())
    }

    pub fn set_telemetry(&mut self, telemetry: &[u8]) {
        ignore_mismatch(self.try_set_telemetry(telemetry));
    }

    pub fn try_set_telemetry(&mut self, telemetry: &[u8]) -> Result<(), FrameError> {
        self.expect_opcode(Opcode::AppTelem)?;
        if telemetry.len() != layout::TELEMETRY_DATA_LEN {
            return Err(FrameError::InvalidPayloadSize {
                expected: layout::TELEMETRY_DATA_LEN,
                actual: telemetry.len(),
            });
        }
        self.data[layout::LENGTH_OFFSET] = layout::TELEMETRY_LENGTH;
        self.write_data(0, telemetry);
        Ok(())
    }

    pub fn set_ack_reason(&mut self, reason: u8) {
        ignore_mismatch(self.try_set_ack_reason(reason));
    }

    pub fn try_set_ack_reason(&mut self, reason: u8) -> Result<(), FrameError> {
        self.expect_opcode(Opcode::BootloaderAck)?;
        self.data[layout::LENGTH_OFFSET] = layout::SINGLE_BYTE_LENGTH;
        self.write_data(layout::STATUS_OFFSET, &[reason]);
        Ok(())
    }

    pub fn set_erase_status(&mut self, status: u8) {
        ignore_mismatch(self.try_set_erase_status(status));
    }

    pub fn try_set_erase_status(&mut self, status: u8) -> Result<(), FrameError> {
        self.expect_opcode(Opcode::BootloaderErase)?;
        self.data[layout::LENGTH_OFFSET] = layout::SINGLE_BYTE_LENGTH;
        self.write_data(layout::STATUS_OFFSET, &[status]);
        Ok(())
    }

    /// Write the sub-page number and, when `page_data` holds exactly 128
    /// bytes, the page contents.
    pub fn set_write_page(&mut self, page_number: u8, page_data: Option<&[u8]>) {
        ignore_mismatch(self.try_set_write_page(page_number, page_data));
    }

    /// The page number is written even when `page_data` has the wrong size;
    /// the error then only reports that the data was not copied.
    pub fn try_set_write_page(
        &mut self,
        page_number: u8,
        page_data: Option<&[u8]>,
    ) -> Result<(), FrameError> {
        self.expect_opcode(Opcode::BootloaderWritePage)?;
        self.write_data(layout::PAGE_NUMBER_OFFSET, &[page_number]);
        let Some(page_data) = page_data else {
            return Ok(());
        };
        if page_data.len() != layout::PAGE_DATA_LEN {
            return Err(FrameError::InvalidPayloadSize {
                expected: layout::PAGE_DATA_LEN,
                actual: page_data.len(),
            });
        }
        self.data[layout::LENGTH_OFFSET] = layout::WRITE_PAGE_FULL_LENGTH;
        self.write_data(layout::PAGE_DATA_RANGE.start, page_data);
        Ok(())
    }

    pub fn set_ascii_text(&mut self, text: &str) {
        ignore_mismatch(self.try_set_ascii_text(text));
    }

    /// One byte per character code point; characters above U+00FF are
    /// rejected before anything is written.
    pub fn try_set_ascii_text(&mut self, text: &str) -> Result<(), FrameError> {
        self.expect_opcode(Opcode::CommonAscii)?;
        let len = text.chars().count();
        if len > layout::MAX_DATA_LEN {
            return Err(FrameError::TextTooLong {
                len,
                max: layout::MAX_DATA_LEN,
            });
        }
        let bytes = text
            .chars()
            .map(|ch| u8::try_from(ch).map_err(|_| FrameError::NonByteCharacter { ch }))
            .collect::<Result<Vec<u8>, _>>()?;

        self.data[layout::LENGTH_OFFSET] = layout::MIN_LENGTH + bytes.len() as u8;
        self.write_data(0, &bytes);
        Ok(())
    }

    fn header_u16(&self, range: std::ops::Range<usize>) -> u16 {
        u16::from_le_bytes([self.data[range.start], self.data[range.start + 1]])
    }

    fn expect_opcode(&self, expected: Opcode) -> Result<(), FrameError> {
        if self.opcode_byte() != expected.code() {
            return Err(FrameError::OpcodeMismatch {
                expected,
                found: self.opcode_byte(),
            });
        }
        Ok(())
    }

    // Callers keep offset + bytes.len() within MAX_DATA_LEN.
    fn write_data(&mut self, offset: usize, bytes: &[u8]) {
        let start = layout::DATA_OFFSET + offset;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

pub(crate) fn pack_route(source: u8, destination: u8) -> u8 {
    ((source & 0x0f) << 4) | (destination & 0x0f)
}

fn ignore_mismatch(result: Result<(), FrameError>) {
    if let Err(err) = result {
        trace!(%err, "frame setter ignored");
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Frame {}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("length", &self.length())
            .field("hardware_id", &self.hardware_id())
            .field("message_id", &self.message_id())
            .field("route", &self.route())
            .field("opcode", &self.opcode_byte())
            .field("payload", &self.payload())
            .finish()
    }
}
