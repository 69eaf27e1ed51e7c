use std::io::{ErrorKind, Read, Write};

use super::{ByteSink, ByteSource, PortError};

/// Port over any reader/writer pair, e.g. two handles on one tty device or
/// an in-memory cursor and a `Vec<u8>`.
#[derive(Debug)]
pub struct IoPort<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> IoPort<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R: Read, W> ByteSource for IoPort<R, W> {
    fn read_byte(&mut self) -> Result<Option<u8>, PortError> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl<R, W: Write> ByteSink for IoPort<R, W> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), PortError> {
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        Ok(())
    }
}
