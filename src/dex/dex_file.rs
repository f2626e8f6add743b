/* Dex file root: owns the image and resolves pool indices */

use std::fmt;
use std::fs;
use std::path::Path;

use bitflags::bitflags;
use log::debug;

use crate::dex::class::DexClass;
use crate::dex::error::{Context, DexError, ErrorKind, Result};
use crate::dex::header::{Header, StructuralWarning};
use crate::dex::ids::{FieldId, MethodId, Prototype};
use crate::dex::instructions::{BytecodeDecoder, WidthDecoder};
use crate::dex::reader::Reader;

/* Constants */
pub const NO_INDEX: u32 = 0xffffffff;

const STRING_ID_SIZE: usize = 4;
const TYPE_ID_SIZE: usize = 4;

bitflags! {
    /// Access flags of classes, fields and methods. Unknown bits are kept.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const PUBLIC = 0x1;
        const PRIVATE = 0x2;
        const PROTECTED = 0x4;
        const STATIC = 0x8;
        const FINAL = 0x10;
        const SYNCHRONIZED = 0x20;
        const VOLATILE = 0x40;
        const BRIDGE = 0x40;
        const TRANSIENT = 0x80;
        const VARARGS = 0x80;
        const NATIVE = 0x100;
        const INTERFACE = 0x200;
        const ABSTRACT = 0x400;
        const STRICT = 0x800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const CONSTRUCTOR = 0x10000;
        const DECLARED_SYNCHRONIZED = 0x20000;
    }
}

/// Decodes MUTF-8, falling back to lossy UTF-8 for malformed input.
pub fn decode_mutf8(bytes: &[u8]) -> String
{
    match cesu8::from_java_cesu8(bytes)
    {
        Ok(s) => s.into_owned(),
        Err(_) => {
            debug!("[strings] invalid MUTF-8 {:02x?}, decoding lossily", bytes);
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Knobs for [`DexFile::with_options`].
pub struct DexOptions
{
    parse_classes: bool,
    decoder: Option<Box<dyn BytecodeDecoder>>,
}

impl Default for DexOptions
{
    fn default() -> Self
    {
        DexOptions { parse_classes: true, decoder: None }
    }
}

impl DexOptions
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Whether class definitions are read during construction. Without it
    /// the class list stays empty and only the resolvers are usable.
    pub fn parse_classes(mut self, parse: bool) -> Self
    {
        self.parse_classes = parse;
        self
    }

    pub fn decoder(mut self, decoder: impl BytecodeDecoder + 'static) -> Self
    {
        self.decoder = Some(Box::new(decoder));
        self
    }
}

pub struct DexFile {
    data: Vec<u8>,
    header: Header,
    warnings: Vec<StructuralWarning>,
    classes: Vec<DexClass>,
    decoder: Box<dyn BytecodeDecoder>,
}

impl fmt::Debug for DexFile
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("DexFile")
            .field("len", &self.data.len())
            .field("header", &self.header)
            .field("warnings", &self.warnings)
            .field("classes", &self.classes)
            .finish_non_exhaustive()
    }
}

impl DexFile {

    pub fn with_options(data: Vec<u8>, options: DexOptions) -> Result<DexFile>
    {
        let header = Header::read(&mut Reader::new(&data, 0)).context(|| "dex header".to_string())?;
        let warnings = header.check(data.len());

        let mut dex = DexFile {
            data,
            header,
            warnings,
            classes: vec![],
            decoder: options.decoder.unwrap_or_else(|| Box::new(WidthDecoder)),
        };

        if options.parse_classes {
            let count = dex.header.class_defs.size;
            let mut classes = Vec::with_capacity(count.min(0x10000) as usize);
            for i in 0..count {
                classes.push(DexClass::read(&dex, i).context(|| format!("class_def #{}", i))?);
            }
            debug!("[dex] read {} class definitions", classes.len());
            dex.classes = classes;
        }

        Ok(dex)
    }

    pub fn from_vec(data: Vec<u8>) -> Result<DexFile>
    {
        DexFile::with_options(data, DexOptions::default())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<DexFile>
    {
        DexFile::from_vec(bytes.to_vec())
    }

    pub fn from_file(path: &Path) -> Result<DexFile>
    {
        let bytes = fs::read(path).map_err(|e| err!(Io, "io Error: {}", e))?;
        DexFile::from_vec(bytes)
    }

    pub fn header(&self) -> &Header
    {
        &self.header
    }

    /// Header sanity mismatches found while opening the file.
    pub fn warnings(&self) -> &[StructuralWarning]
    {
        &self.warnings
    }

    pub fn bytes(&self) -> &[u8]
    {
        &self.data
    }

    pub fn classes(&self) -> &[DexClass]
    {
        &self.classes
    }

    pub fn class_by_name(&self, name: &str) -> Option<&DexClass>
    {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Materializes every class, collecting failures instead of stopping at the first.
    pub fn parse_all(&self) -> Vec<(String, DexError)>
    {
        self.classes.iter()
            .filter_map(|c| c.parse_data(self).err().map(|e| (c.name.clone(), e)))
            .collect()
    }

    pub(crate) fn decoder(&self) -> &dyn BytecodeDecoder
    {
        self.decoder.as_ref()
    }

    /// A cursor positioned at `offset`.
    pub fn stream(&self, offset: usize) -> Reader<'_>
    {
        Reader::new(&self.data, offset)
    }

    fn check_index(&self, i: u32, size: u32, pool: &str) -> Result<()>
    {
        if i >= size {
            fail!(IndexOutOfRange, "{} index {} out of range (size {})", pool, i, size);
        }
        Ok(())
    }

    /// Raw MUTF-8 bytes of string `i`, without the terminator.
    pub fn string(&self, i: u32) -> Result<&[u8]>
    {
        self.check_index(i, self.header.string_ids.size, "string")?;
        let data_off = self.stream(self.header.string_ids.entry(i, STRING_ID_SIZE)).read_u4()?;
        let mut r = self.stream(data_off as usize);
        let _utf16_size = r.read_uleb128()?;
        r.read_cstr().context(|| format!("string #{}", i))
    }

    pub fn string_text(&self, i: u32) -> Result<String>
    {
        Ok(decode_mutf8(self.string(i)?))
    }

    /// Type descriptor of type `i`, e.g. `Ljava/lang/String;` or `[I`.
    pub fn type_desc(&self, i: u32) -> Result<String>
    {
        self.check_index(i, self.header.type_ids.size, "type")?;
        let str_idx = self.stream(self.header.type_ids.entry(i, TYPE_ID_SIZE)).read_u4()?;
        self.string_text(str_idx)
    }

    /// Class name of type `i`: `Lfoo/Bar;` becomes `foo/Bar`, array
    /// descriptors are returned as is.
    pub fn cls_type(&self, i: u32) -> Result<String>
    {
        let desc = self.type_desc(i)?;
        if desc.starts_with('[') {
            return Ok(desc);
        }
        match desc.strip_prefix('L').and_then(|s| s.strip_suffix(';'))
        {
            Some(name) => Ok(name.to_string()),
            None => fail!(Format, "Unknown type descriptor {:?} for type #{}", desc, i),
        }
    }

    /// Reads a type_list; offset 0 is the empty list.
    pub(crate) fn type_list(&self, off: u32, class_names: bool) -> Result<Vec<String>>
    {
        if off == 0 {
            return Ok(vec![]);
        }
        let mut r = self.stream(off as usize);
        let size = r.read_u4()?;
        let mut idxs = vec![];
        for _ in 0..size { idxs.push(r.read_u2()? as u32); }

        idxs.into_iter()
            .map(|t| if class_names { self.cls_type(t) } else { self.type_desc(t) })
            .collect()
    }

    pub fn proto(&self, i: u32) -> Result<Prototype>
    {
        self.check_index(i, self.header.proto_ids.size, "proto")?;
        Prototype::read(self, i)
    }

    pub fn field_id(&self, i: u32) -> Result<FieldId>
    {
        self.check_index(i, self.header.field_ids.size, "field")?;
        FieldId::read(self, i).context(|| format!("field #{}", i))
    }

    pub fn method_id(&self, i: u32) -> Result<MethodId>
    {
        self.check_index(i, self.header.method_ids.size, "method")?;
        MethodId::read(self, i).context(|| format!("method #{}", i))
    }
}
