use crate::dex::error::{DexError, ErrorKind, Result};

/// Decodes an unsigned LEB128 value, returning it with the number of bytes used.
pub(crate) fn decode_uleb128(encoded: &[u8]) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    let mut shift: u32 = 0;
    let mut count: usize = 0;

    for &byte in encoded {
        count += 1;

        let low = (byte & 0x7F) as u32;
        if shift < 32 {
            value |= low.wrapping_shl(shift);
        }

        let cont = (byte & 0x80) != 0;
        shift = shift.saturating_add(7);

        // DEX uleb128 values are 32-bit, valid encodings are at most 5 bytes.
        if !cont || count == 5 {
            return Ok((value, count));
        }
    }

    fail!(OutOfBounds, "Unexpected end of stream in uleb128 after {} bytes", count)
}

/// Decodes a signed LEB128 value, sign-extending from bit 6 of the last byte.
pub(crate) fn decode_sleb128(encoded: &[u8]) -> Result<(i32, usize)> {
    let mut value: i32 = 0;
    let mut shift: u32 = 0;
    let mut count: usize = 0;

    for &byte in encoded {
        count += 1;

        let low = (byte & 0x7F) as i32;
        if shift < 32 {
            value |= low.wrapping_shl(shift);
        }

        let cont = (byte & 0x80) != 0;
        shift = shift.saturating_add(7);

        if !cont || count == 5 {
            if (byte & 0x40) != 0 && shift < 32 {
                value |= (-1i32).wrapping_shl(shift);
            }
            return Ok((value, count));
        }
    }

    fail!(OutOfBounds, "Unexpected end of stream in sleb128 after {} bytes", count)
}

#[cfg(test)]
pub(crate) fn encode_uleb128(value: u32) -> Vec<u8> {
    let mut result = Vec::new();
    let mut remaining = value;

    loop {
        let mut byte = (remaining & 0x7F) as u8;
        remaining >>= 7;

        if remaining != 0 {
            byte |= 0x80;
        }

        result.push(byte);
        if remaining == 0 {
            break;
        }
    }

    result
}

#[cfg(test)]
pub(crate) fn encode_sleb128(value: i32) -> Vec<u8> {
    let mut result = Vec::new();
    let mut remaining = value;

    loop {
        let mut byte = (remaining & 0x7F) as u8;
        remaining >>= 7;

        let is_more =
            !((remaining == 0 && (byte & 0x40) == 0) || (remaining == -1 && (byte & 0x40) != 0));
        if is_more {
            byte |= 0x80;
        }

        result.push(byte);

        if !is_more {
            break;
        }
    }

    result
}
