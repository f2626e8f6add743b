use crate::dex::dex_file::DexFile;
use crate::dex::error::{DexError, ErrorKind, Result};
use crate::dex::reader::Reader;

const VALUE_BYTE: u8 = 0x00;
const VALUE_SHORT: u8 = 0x02;
const VALUE_CHAR: u8 = 0x03;
const VALUE_INT: u8 = 0x04;
const VALUE_LONG: u8 = 0x06;
const VALUE_FLOAT: u8 = 0x10;
const VALUE_DOUBLE: u8 = 0x11;
const VALUE_METHOD_TYPE: u8 = 0x15;
const VALUE_METHOD_HANDLE: u8 = 0x16;
const VALUE_STRING: u8 = 0x17;
const VALUE_TYPE: u8 = 0x18;
const VALUE_FIELD: u8 = 0x19;
const VALUE_METHOD: u8 = 0x1a;
const VALUE_ENUM: u8 = 0x1b;
const VALUE_ARRAY: u8 = 0x1c;
const VALUE_ANNOTATION: u8 = 0x1d;
const VALUE_NULL: u8 = 0x1e;
const VALUE_BOOLEAN: u8 = 0x1f;

/// A decoded constant, as found in static initializers and encoded arrays.
///
/// `Null` is also what a nested annotation decodes to: annotations are
/// skipped over but never materialized.
#[derive(Debug, PartialEq, Clone)]
pub enum EncodedValue {
    Null,
    Array(Vec<EncodedValue>),
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    /// Class literal, as a normalized class name.
    Type(String),
    MethodType(u32),
    MethodHandle(u32),
    Field(u32),
    Method(u32),
    Enum(u32),
}

impl EncodedValue
{
    /// JNI descriptor of the value's logical type, `None` for null.
    pub fn type_descriptor(&self) -> Option<&'static str>
    {
        match self
        {
            EncodedValue::Null => None,
            EncodedValue::Array(_) => Some("["),
            EncodedValue::Boolean(_) => Some("Z"),
            EncodedValue::Byte(_) => Some("B"),
            EncodedValue::Short(_) => Some("S"),
            EncodedValue::Char(_) => Some("C"),
            EncodedValue::Int(_) => Some("I"),
            EncodedValue::Long(_) => Some("J"),
            EncodedValue::Float(_) => Some("F"),
            EncodedValue::Double(_) => Some("D"),
            EncodedValue::String(_) => Some("Ljava/lang/String;"),
            EncodedValue::Type(_) => Some("Ljava/lang/Class;"),
            EncodedValue::MethodType(_) => Some("Ljava/lang/invoke/MethodType;"),
            EncodedValue::MethodHandle(_) => Some("Ljava/lang/invoke/MethodHandle;"),
            EncodedValue::Field(_) => Some("Ljava/lang/reflect/Field;"),
            EncodedValue::Method(_) => Some("Ljava/lang/reflect/Method;"),
            EncodedValue::Enum(_) => Some("Ljava/lang/Enum;"),
        }
    }

    pub fn is_null(&self) -> bool
    {
        matches!(self, EncodedValue::Null)
    }

    // Read one value; strings and class literals are resolved against the dex
    pub fn read(dex: &DexFile, r: &mut Reader) -> Result<EncodedValue> {
        let tag_pos = r.pos();
        let header_byte = r.read_u1()?;
        let value_arg = header_byte >> 5;
        let value_type = header_byte & 0x1F;
        let size = (value_arg + 1) as usize;

        match value_type {
            VALUE_ARRAY => Ok(EncodedValue::Array(read_encoded_array(dex, r)?)),
            VALUE_ANNOTATION => {
                skip_annotation(dex, r)?;
                Ok(EncodedValue::Null)
            },
            VALUE_NULL => Ok(EncodedValue::Null),
            VALUE_BOOLEAN => Ok(EncodedValue::Boolean(value_arg != 0)),
            VALUE_BYTE => Ok(EncodedValue::Byte(read_var(r, size, 1, "byte")? as u8 as i8)),
            VALUE_SHORT => Ok(EncodedValue::Short(sign_extend(read_var(r, size, 2, "short")?, size) as i16)),
            VALUE_CHAR => Ok(EncodedValue::Char(read_var(r, size, 2, "char")? as u16)),
            VALUE_INT => Ok(EncodedValue::Int(sign_extend(read_var(r, size, 4, "int")?, size) as i32)),
            VALUE_LONG => Ok(EncodedValue::Long(sign_extend(read_var(r, size, 8, "long")?, size))),
            // Floating point payloads are zero-extended to the right
            VALUE_FLOAT => {
                let bits = read_var(r, size, 4, "float")? << (32 - size * 8);
                Ok(EncodedValue::Float(f32::from_bits(bits as u32)))
            },
            VALUE_DOUBLE => {
                let bits = read_var(r, size, 8, "double")? << (64 - size * 8);
                Ok(EncodedValue::Double(f64::from_bits(bits)))
            },
            VALUE_STRING => {
                let idx = read_var(r, size, 4, "string")? as u32;
                Ok(EncodedValue::String(dex.string_text(idx)?))
            },
            VALUE_TYPE => {
                let idx = read_var(r, size, 4, "type")? as u32;
                Ok(EncodedValue::Type(dex.cls_type(idx)?))
            },
            VALUE_METHOD_TYPE => Ok(EncodedValue::MethodType(read_var(r, size, 4, "method type")? as u32)),
            VALUE_METHOD_HANDLE => Ok(EncodedValue::MethodHandle(read_var(r, size, 4, "method handle")? as u32)),
            VALUE_FIELD => Ok(EncodedValue::Field(read_var(r, size, 4, "field")? as u32)),
            VALUE_METHOD => Ok(EncodedValue::Method(read_var(r, size, 4, "method")? as u32)),
            VALUE_ENUM => Ok(EncodedValue::Enum(read_var(r, size, 4, "enum")? as u32)),
            _ => fail!(Format, "Unknown EncodedValue type 0x{:02x} at index {}", value_type, tag_pos),
        }
    }
}

/// Reads `size` bytes little-endian into an unsigned accumulator.
fn read_var(r: &mut Reader, size: usize, max: usize, what: &str) -> Result<u64> {
    if size > max {
        return Err(err!(Format, "{}-byte payload for {} value at index {}", size, what, r.pos()));
    }
    let mut result = 0u64;
    for (i, b) in r.read_x(size)?.iter().enumerate() {
        result |= (*b as u64) << (8 * i);
    }
    Ok(result)
}

/// Sign-extends from the top bit of a `size`-byte payload.
fn sign_extend(value: u64, size: usize) -> i64 {
    let shift = 64 - size * 8;
    ((value << shift) as i64) >> shift
}

// Annotations still have to be walked so the cursor lands after them
fn skip_annotation(dex: &DexFile, r: &mut Reader) -> Result<()> {
    let _type_idx = r.read_uleb128()?;
    let size = r.read_uleb128()?;
    for _ in 0..size {
        let _name_idx = r.read_uleb128()?;
        EncodedValue::read(dex, r)?;
    }
    Ok(())
}

/// Reads a uleb128 count followed by that many values.
pub fn read_encoded_array(dex: &DexFile, r: &mut Reader) -> Result<Vec<EncodedValue>>
{
    let size = r.read_uleb128()? as usize;

    // Each value takes at least one byte
    let mut values = Vec::with_capacity(size.min(4096));
    for _ in 0..size
    {
        values.push(EncodedValue::read(dex, r)?);
    }

    Ok(values)
}
