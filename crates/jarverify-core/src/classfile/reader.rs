use crate::classfile::ClassFormatError;

/// Big-endian cursor over a class-file byte slice.
///
/// Every read is bounds-checked and fails with
/// [`ClassFormatError::UnexpectedEof`] instead of panicking, so truncated
/// or hostile inputs surface as malformed-class errors.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], ClassFormatError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(ClassFormatError::UnexpectedEof { offset: self.pos })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), ClassFormatError> {
        self.bytes(len).map(|_| ())
    }

    pub fn u8(&mut self) -> Result<u8, ClassFormatError> {
        Ok(self.bytes(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, ClassFormatError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn i16(&mut self) -> Result<i16, ClassFormatError> {
        self.u16().map(|v| v as i16)
    }

    pub fn u32(&mut self) -> Result<u32, ClassFormatError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32(&mut self) -> Result<i32, ClassFormatError> {
        self.u32().map(|v| v as i32)
    }

    pub fn u64(&mut self) -> Result<u64, ClassFormatError> {
        let hi = self.u32()? as u64;
        let lo = self.u32()? as u64;
        Ok((hi << 32) | lo)
    }

    /// Splits off a sub-reader over the next `len` bytes, advancing past them.
    pub fn sub(&mut self, len: usize) -> Result<ByteReader<'a>, ClassFormatError> {
        self.bytes(len).map(ByteReader::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_values() {
        let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x34, 0xFF, 0xFE];
        let mut r = ByteReader::new(&data);

        assert_eq!(r.u32().unwrap(), 0xCAFE_BABE);
        assert_eq!(r.u16().unwrap(), 52);
        assert_eq!(r.i16().unwrap(), -2);
        assert!(r.eof());
    }

    #[test]
    fn truncated_read_reports_offset() {
        let mut r = ByteReader::new(&[0x00, 0x01, 0x02]);
        r.u16().unwrap();

        let err = r.u32().unwrap_err();
        assert!(matches!(err, ClassFormatError::UnexpectedEof { offset: 2 }));
        // Failed reads do not advance.
        assert_eq!(r.position(), 2);
    }

    #[test]
    fn sub_reader_is_bounded() {
        let mut r = ByteReader::new(&[1, 2, 3, 4]);
        let mut sub = r.sub(2).unwrap();

        assert_eq!(sub.u8().unwrap(), 1);
        assert_eq!(sub.u8().unwrap(), 2);
        assert!(sub.u8().is_err());
        assert_eq!(r.u8().unwrap(), 3);
    }
}
