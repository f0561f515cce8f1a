use crate::error::LoadError;

#[derive(Debug)]
#[allow(dead_code)]
pub enum Encoding {
    LittleEndian,
    BigEndian,
}

#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
    encoding: Encoding,
}

#[allow(dead_code)]
impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], encoding: Encoding) -> Self {
        ByteReader {
            data,
            encoding,
            offset: 0,
        }
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], LoadError> {
        if self.offset + count > self.data.len() {
            return Err(LoadError::SizeMismatch {
                len: self.data.len(),
                expected: self.offset + count,
            });
        }

        let slice = &self.data[self.offset..self.offset + count];
        self.offset += count;

        Ok(slice)
    }

    /// Reads a fixed-width, NUL-padded display string. Module and sample names
    /// are not guaranteed to be valid UTF-8 or fully NUL-terminated, so this
    /// is lossy and trims at the first NUL rather than bailing out on bad bytes.
    pub fn read_fixed_str(&mut self, length: usize) -> Result<String, LoadError> {
        let raw = self.read_bytes(length)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Ok(String::from_utf8_lossy(&raw[..end]).trim().to_string())
    }

    pub fn read_u8(&mut self) -> Result<u8, LoadError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, LoadError> {
        Ok(self.read_bytes(1)?[0] as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, LoadError> {
        let bytes = self.read_bytes(2)?;

        match self.encoding {
            Encoding::BigEndian => Ok(u16::from_be_bytes([bytes[0], bytes[1]])),
            Encoding::LittleEndian => Ok(u16::from_le_bytes([bytes[0], bytes[1]])),
        }
    }

    pub fn read_u32(&mut self) -> Result<u32, LoadError> {
        let bytes = self.read_bytes(4)?;

        match self.encoding {
            Encoding::BigEndian => Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            Encoding::LittleEndian => {
                Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
        }
    }

    pub fn read_i16(&mut self) -> Result<i16, LoadError> {
        let bytes = self.read_bytes(2)?;

        match self.encoding {
            Encoding::BigEndian => Ok(i16::from_be_bytes([bytes[0], bytes[1]])),
            Encoding::LittleEndian => Ok(i16::from_le_bytes([bytes[0], bytes[1]])),
        }
    }

    pub fn read_i32(&mut self) -> Result<i32, LoadError> {
        let bytes = self.read_bytes(4)?;

        match self.encoding {
            Encoding::BigEndian => Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            Encoding::LittleEndian => {
                Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}
