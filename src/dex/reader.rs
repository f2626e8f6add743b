use crate::dex::error::{DexError, ErrorKind, Result};
use crate::dex::leb::{decode_sleb128, decode_uleb128};

/// Bounds-checked little-endian cursor over an immutable DEX buffer.
#[derive(Debug, Clone)]
pub struct Reader<'a>
{
    bytes: &'a [u8],
    ix: usize,
}

impl<'a> Reader<'a>
{
    pub fn new(bytes: &'a [u8], ix: usize) -> Self
    {
        Reader { bytes, ix }
    }

    /// Current byte offset from the start of the buffer.
    pub fn pos(&self) -> usize
    {
        self.ix
    }

    pub fn seek(&mut self, ix: usize)
    {
        self.ix = ix;
    }

    fn take(&mut self, length: usize, what: &str) -> Result<&'a [u8]>
    {
        match self.ix.checked_add(length)
        {
            Some(end) if end <= self.bytes.len() => {
                let slice = &self.bytes[self.ix..end];
                self.ix = end;
                Ok(slice)
            }
            _ => fail!(OutOfBounds, "Unexpected end of stream reading {} at index {}", what, self.ix),
        }
    }

    pub fn read_u1(&mut self) -> Result<u8>
    {
        Ok(self.take(1, "u1")?[0])
    }

    pub fn read_u2(&mut self) -> Result<u16>
    {
        let b = self.take(2, "u2")?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u4(&mut self) -> Result<u32>
    {
        let b = self.take(4, "u4")?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_uleb128(&mut self) -> Result<u32>
    {
        let (val, size) = decode_uleb128(self.bytes.get(self.ix..).unwrap_or(&[]))
            .map_err(|e| DexError::with_context(e, format!("index {}", self.ix)))?;
        self.ix += size;
        Ok(val)
    }

    pub fn read_sleb128(&mut self) -> Result<i32>
    {
        let (val, size) = decode_sleb128(self.bytes.get(self.ix..).unwrap_or(&[]))
            .map_err(|e| DexError::with_context(e, format!("index {}", self.ix)))?;
        self.ix += size;
        Ok(val)
    }

    /// Reads `length` raw bytes.
    pub fn read_x(&mut self, length: usize) -> Result<&'a [u8]>
    {
        self.take(length, "byte array")
    }

    /// Reads up to, and consumes, a zero terminator. The terminator is not returned.
    pub fn read_cstr(&mut self) -> Result<&'a [u8]>
    {
        let rest = self.bytes.get(self.ix..).unwrap_or(&[]);
        match rest.iter().position(|&b| b == 0)
        {
            Some(len) => {
                self.ix += len + 1;
                Ok(&rest[..len])
            }
            None => fail!(OutOfBounds, "Unterminated string starting at index {}", self.ix),
        }
    }
}
