use super::error::FrameError;
use super::frame::Frame;
use super::layout;
use super::opcode::{Opcode, PayloadShape};
use super::reader::FrameReader;

/// Typed view of a frame's opcode and payload.
///
/// Optional fields are `None` when the length field says the sender left
/// them out (e.g. a reboot without a delay).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty(Opcode),
    Reboot { delay: Option<u32> },
    SetTime { seconds: u32, nanoseconds: u32 },
    Telemetry { data: Vec<u8> },
    BootloaderAck { reason: Option<u8> },
    BootloaderErase { status: Option<u8> },
    WritePage { page_number: u8, data: Option<Vec<u8>> },
    Ascii { text: String },
    Unknown { opcode: u8, payload: Vec<u8> },
}

/// Decode the payload of a structurally valid frame.
///
/// # Errors
/// Returns `FrameError::TooShort` when the payload is shorter than the
/// opcode's shape requires (e.g. a set-time frame with length 6).
pub fn parse_command(frame: &Frame) -> Result<Command, FrameError> {
    let Some(opcode) = frame.opcode() else {
        return Ok(Command::Unknown {
            opcode: frame.opcode_byte(),
            payload: frame.payload().to_vec(),
        });
    };
    let reader = FrameReader::new(frame.payload());
    let length = frame.length();

    let command = match opcode.shape() {
        PayloadShape::Empty => Command::Empty(opcode),
        PayloadShape::RebootDelay => {
            let delay = if length == layout::REBOOT_LENGTH {
                Some(reader.read_u32_le(layout::DELAY_RANGE)?)
            } else {
                None
            };
            Command::Reboot { delay }
        }
        PayloadShape::Time => Command::SetTime {
            seconds: reader.read_u32_le(layout::SECONDS_RANGE)?,
            nanoseconds: reader.read_u32_le(layout::NANOSECONDS_RANGE)?,
        },
        PayloadShape::Telemetry => Command::Telemetry {
            data: frame.payload().to_vec(),
        },
        PayloadShape::AckReason => Command::BootloaderAck {
            reason: single_byte(&reader, length)?,
        },
        PayloadShape::EraseStatus => Command::BootloaderErase {
            status: single_byte(&reader, length)?,
        },
        PayloadShape::WritePage => {
            let page_number = reader.read_u8(layout::PAGE_NUMBER_OFFSET)?;
            let data = if length == layout::WRITE_PAGE_FULL_LENGTH {
                Some(reader.read_slice(layout::PAGE_DATA_RANGE)?.to_vec())
            } else {
                None
            };
            Command::WritePage { page_number, data }
        }
        PayloadShape::Ascii => Command::Ascii {
            text: frame.payload().iter().map(|&b| char::from(b)).collect(),
        },
    };
    Ok(command)
}

fn single_byte(reader: &FrameReader<'_>, length: u8) -> Result<Option<u8>, FrameError> {
    if length != layout::SINGLE_BYTE_LENGTH {
        return Ok(None);
    }
    reader.read_u8(layout::STATUS_OFFSET).map(Some)
}

#[cfg(test)]
mod tests {
    use super::{Command, parse_command};
    use crate::protocol::error::FrameError;
    use crate::protocol::frame::Frame;
    use crate::protocol::opcode::Opcode;

    fn frame(opcode: Opcode) -> Frame {
        Frame::new(opcode, 1, 2, 0x1, 0xa)
    }

    #[test]
    fn parse_empty_opcodes() {
        for opcode in [Opcode::AppGetTime, Opcode::CommonNack, Opcode::BootloaderPing] {
            assert_eq!(parse_command(&frame(opcode)).unwrap(), Command::Empty(opcode));
        }
    }

    #[test]
    fn parse_reboot_delay_only_when_present() {
        let mut reboot = frame(Opcode::AppReboot);
        assert_eq!(
            parse_command(&reboot).unwrap(),
            Command::Reboot { delay: None }
        );
        reboot.set_reboot_delay(1000);
        assert_eq!(
            parse_command(&reboot).unwrap(),
            Command::Reboot { delay: Some(1000) }
        );
    }

    #[test]
    fn parse_set_time() {
        let mut time = frame(Opcode::AppSetTime);
        time.set_time(0x1234_5678, 999);
        assert_eq!(
            parse_command(&time).unwrap(),
            Command::SetTime {
                seconds: 0x1234_5678,
                nanoseconds: 999
            }
        );
    }

    #[test]
    fn parse_truncated_set_time() {
        let bytes = [0x22, 0x69, 0x06, 0, 0, 0, 0, 0x11, 0x14];
        let frame = Frame::from_bytes(&bytes).unwrap();
        let err = parse_command(&frame).unwrap_err();
        assert!(matches!(err, FrameError::TooShort { needed: 4, actual: 0 }));
    }

    #[test]
    fn parse_ack_reason_and_erase_status() {
        let mut ack = frame(Opcode::BootloaderAck);
        assert_eq!(
            parse_command(&ack).unwrap(),
            Command::BootloaderAck { reason: None }
        );
        ack.set_ack_reason(0x01);
        assert_eq!(
            parse_command(&ack).unwrap(),
            Command::BootloaderAck { reason: Some(0x01) }
        );

        let mut erase = frame(Opcode::BootloaderErase);
        erase.set_erase_status(0x02);
        assert_eq!(
            parse_command(&erase).unwrap(),
            Command::BootloaderErase { status: Some(0x02) }
        );
    }

    #[test]
    fn parse_write_page() {
        let mut page = frame(Opcode::BootloaderWritePage);
        page.set_write_page(3, None);
        assert_eq!(
            parse_command(&page).unwrap(),
            Command::WritePage {
                page_number: 3,
                data: None
            }
        );

        let data = vec![0x5a; 128];
        page.set_write_page(4, Some(&data));
        assert_eq!(
            parse_command(&page).unwrap(),
            Command::WritePage {
                page_number: 4,
                data: Some(data)
            }
        );
    }

    #[test]
    fn parse_ascii_and_telemetry() {
        let mut ascii = frame(Opcode::CommonAscii);
        ascii.set_ascii_text("hello");
        assert_eq!(
            parse_command(&ascii).unwrap(),
            Command::Ascii {
                text: "hello".to_string()
            }
        );

        let telem = frame(Opcode::AppTelem);
        assert_eq!(
            parse_command(&telem).unwrap(),
            Command::Telemetry { data: vec![0; 78] }
        );
    }

    #[test]
    fn parse_unknown_opcode() {
        let bytes = [0x22, 0x69, 0x07, 0, 0, 0, 0, 0x11, 0x42, 0x99];
        let frame = Frame::from_bytes(&bytes).unwrap();
        assert_eq!(
            parse_command(&frame).unwrap(),
            Command::Unknown {
                opcode: 0x42,
                payload: vec![0x99]
            }
        );
    }
}
