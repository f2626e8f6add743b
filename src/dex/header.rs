/* Fixed DEX preamble and the pool descriptor table */

use std::fmt;

use log::warn;

use crate::dex::error::Result;
use crate::dex::reader::Reader;

pub const DEX_FILE_MAGIC: [u8; 4] = [ 0x64, 0x65, 0x78, 0x0a ];
pub const ENDIAN_CONSTANT: u32 = 0x12345678;
pub const HEADER_SIZE: u32 = 0x70;

/// A (count, offset) pair describing one table in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Section {
    pub size: u32,
    pub off: u32,
}

impl Section
{
    fn read(r: &mut Reader) -> Result<Section>
    {
        Ok(Section { size: r.read_u4()?, off: r.read_u4()? })
    }

    /// Byte offset of entry `i` for fixed-width records of `width` bytes.
    pub(crate) fn entry(&self, i: u32, width: usize) -> usize
    {
        self.off as usize + i as usize * width
    }
}

/// Header sanity mismatch. Parsing always continues past these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralWarning {
    Magic { found: [u8; 8] },
    FileSize { declared: u32, actual: usize },
    HeaderSize { declared: u32 },
    EndianTag { declared: u32 },
}

impl fmt::Display for StructuralWarning
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self
        {
            StructuralWarning::Magic { found } => write!(f, "unexpected magic {:02x?}", found),
            StructuralWarning::FileSize { declared, actual } =>
                write!(f, "unexpected file size: header says {} but buffer holds {}", declared, actual),
            StructuralWarning::HeaderSize { declared } =>
                write!(f, "unexpected header size 0x{:x} (expected 0x{:x})", declared, HEADER_SIZE),
            StructuralWarning::EndianTag { declared } =>
                write!(f, "unexpected endian tag 0x{:08x}", declared),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 8],
    pub checksum: u32,
    pub signature: [u8; 20],
    pub file_size: u32,
    pub header_size: u32,
    pub endian_tag: u32,
    pub link: Section,
    pub map_off: u32,
    pub string_ids: Section,
    pub type_ids: Section,
    pub proto_ids: Section,
    pub field_ids: Section,
    pub method_ids: Section,
    pub class_defs: Section,
    pub data: Section,
}

impl Header
{
    pub fn read(r: &mut Reader) -> Result<Header>
    {
        let mut magic = [0u8; 8];
        magic.copy_from_slice(r.read_x(8)?);
        let checksum = r.read_u4()?;
        let mut signature = [0u8; 20];
        signature.copy_from_slice(r.read_x(20)?);

        Ok(Header {
            magic,
            checksum,
            signature,
            file_size: r.read_u4()?,
            header_size: r.read_u4()?,
            endian_tag: r.read_u4()?,
            link: Section::read(r)?,
            map_off: r.read_u4()?,
            string_ids: Section::read(r)?,
            type_ids: Section::read(r)?,
            proto_ids: Section::read(r)?,
            field_ids: Section::read(r)?,
            method_ids: Section::read(r)?,
            class_defs: Section::read(r)?,
            data: Section::read(r)?,
        })
    }

    /// Compares the sanity fields against their expected values and logs each mismatch.
    pub fn check(&self, actual_len: usize) -> Vec<StructuralWarning>
    {
        let mut warnings = vec![];
        if self.magic[..4] != DEX_FILE_MAGIC || self.version().is_none() {
            warnings.push(StructuralWarning::Magic { found: self.magic });
        }
        if self.file_size as usize != actual_len {
            warnings.push(StructuralWarning::FileSize { declared: self.file_size, actual: actual_len });
        }
        if self.header_size != HEADER_SIZE {
            warnings.push(StructuralWarning::HeaderSize { declared: self.header_size });
        }
        if self.endian_tag != ENDIAN_CONSTANT {
            warnings.push(StructuralWarning::EndianTag { declared: self.endian_tag });
        }
        for w in &warnings {
            warn!("[header] {}", w);
        }
        warnings
    }

    /// Numeric format version from the magic, e.g. 35 or 39.
    pub fn version(&self) -> Option<u32> {
        let digits = &self.magic[4..7];
        if digits.iter().all(|d| d.is_ascii_digit()) && self.magic[7] == 0 {
            Some(digits.iter().fold(0, |acc, d| acc * 10 + (d - b'0') as u32))
        } else {
            None
        }
    }
}
