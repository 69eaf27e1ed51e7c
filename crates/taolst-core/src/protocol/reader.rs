use super::error::FrameError;

pub struct FrameReader<'a> {
    bytes: &'a [u8],
}

impl<'a> FrameReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), FrameError> {
        if self.bytes.len() < needed {
            return Err(FrameError::TooShort {
                needed,
                actual: self.bytes.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, FrameError> {
        self.bytes
            .get(offset)
            .copied()
            .ok_or(FrameError::TooShort {
                needed: offset + 1,
                actual: self.bytes.len(),
            })
    }

    pub fn read_u16_le(&self, range: std::ops::Range<usize>) -> Result<u16, FrameError> {
        let bytes: [u8; 2] = self.read_array(range)?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_u32_le(&self, range: std::ops::Range<usize>) -> Result<u32, FrameError> {
        let bytes: [u8; 4] = self.read_array(range)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], FrameError> {
        self.bytes.get(range.clone()).ok_or(FrameError::TooShort {
            needed: range.end,
            actual: self.bytes.len(),
        })
    }

    fn read_array<const N: usize>(
        &self,
        range: std::ops::Range<usize>,
    ) -> Result<[u8; N], FrameError> {
        let bytes = self.read_slice(range)?;
        bytes.try_into().map_err(|_| FrameError::TooShort {
            needed: N,
            actual: bytes.len(),
        })
    }
}
