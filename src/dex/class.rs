/* class_def_item and its lazily parsed class_data_item */

use log::debug;
use once_cell::sync::OnceCell;

use crate::dex::code::CodeItem;
use crate::dex::dex_file::{AccessFlags, DexFile, NO_INDEX};
use crate::dex::encoded_values::EncodedValue;
use crate::dex::error::{Context, DexError, ErrorKind, Result};
use crate::dex::ids::{FieldId, MethodId};
use crate::dex::reader::Reader;

pub(crate) const CLASS_DEF_SIZE: usize = 32;

#[derive(Debug)]
pub struct Field {
    pub id: FieldId,
    pub access: AccessFlags,
    /// Initial value from the class's static values table, when listed there.
    pub constant_value: Option<EncodedValue>,
}

impl Field
{
    pub fn is_static(&self) -> bool
    {
        self.access.contains(AccessFlags::STATIC)
    }
}

#[derive(Debug)]
pub struct Method {
    pub id: MethodId,
    pub access: AccessFlags,
    pub code_off: u32,
    pub code: Option<CodeItem>,
}

impl Method
{
    pub fn is_static(&self) -> bool
    {
        self.access.contains(AccessFlags::STATIC)
    }

    /// Argument register types, see [`MethodId::spaced_param_types`].
    pub fn spaced_param_types(&self) -> Vec<Option<String>>
    {
        self.id.spaced_param_types(self.is_static())
    }
}

/// Fields and methods of one class in file order: static then instance
/// fields, direct then virtual methods.
#[derive(Debug, Default)]
pub struct ClassData {
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    static_fields_size: usize,
    direct_methods_size: usize,
}

impl ClassData
{
    fn read(dex: &DexFile, offset: usize) -> Result<ClassData>
    {
        let mut r = dex.stream(offset);
        let static_fields_size = r.read_uleb128()? as usize;
        let instance_fields_size = r.read_uleb128()? as usize;
        let direct_methods_size = r.read_uleb128()? as usize;
        let virtual_methods_size = r.read_uleb128()? as usize;

        let mut fields = vec![];
        for num in [static_fields_size, instance_fields_size] {
            // Indices are deltas from the previous entry of the same list
            let mut field_idx = 0u32;
            for _ in 0..num {
                field_idx = next_index(&mut r, field_idx)?;
                let access = AccessFlags::from_bits_retain(r.read_uleb128()?);
                fields.push(Field { id: dex.field_id(field_idx)?, access, constant_value: None });
            }
        }

        let mut methods = vec![];
        for num in [direct_methods_size, virtual_methods_size] {
            let mut method_idx = 0u32;
            for _ in 0..num {
                method_idx = next_index(&mut r, method_idx)?;
                let access = AccessFlags::from_bits_retain(r.read_uleb128()?);
                let code_off = r.read_uleb128()?;
                let id = dex.method_id(method_idx)?;
                let code = if code_off > 0 {
                    Some(CodeItem::read(dex, code_off as usize).context(|| format!("method {}", id.member))?)
                } else { None };
                methods.push(Method { id, access, code_off, code });
            }
        }

        Ok(ClassData { fields, methods, static_fields_size, direct_methods_size })
    }

    pub fn static_fields(&self) -> &[Field]
    {
        &self.fields[..self.static_fields_size]
    }

    pub fn instance_fields(&self) -> &[Field]
    {
        &self.fields[self.static_fields_size..]
    }

    pub fn direct_methods(&self) -> &[Method]
    {
        &self.methods[..self.direct_methods_size]
    }

    pub fn virtual_methods(&self) -> &[Method]
    {
        &self.methods[self.direct_methods_size..]
    }
}

fn next_index(r: &mut Reader, previous: u32) -> Result<u32>
{
    let at = r.pos();
    let delta = r.read_uleb128()?;
    match previous.checked_add(delta)
    {
        Some(idx) => Ok(idx),
        None => fail!(IndexOutOfRange, "Member index delta {} overflows at index {}", delta, at),
    }
}

#[derive(Debug)]
pub struct DexClass {
    pub name: String,
    pub access: AccessFlags,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub class_data_off: u32,
    pub static_values_off: u32,
    data: OnceCell<ClassData>,
}

impl DexClass
{
    pub(crate) fn read(dex: &DexFile, index: u32) -> Result<DexClass>
    {
        let mut r = dex.stream(dex.header().class_defs.entry(index, CLASS_DEF_SIZE));
        let name = dex.cls_type(r.read_u4()?)?;
        let access = AccessFlags::from_bits_retain(r.read_u4()?);
        let superclass_idx = r.read_u4()?;
        let superclass = if superclass_idx != NO_INDEX { Some(dex.cls_type(superclass_idx)?) }
            else { None };
        let interfaces = dex.type_list(r.read_u4()?, true)?;
        // source_file_idx and annotations_off are not modelled
        let _source_file_idx = r.read_u4()?;
        let _annotations_off = r.read_u4()?;
        let class_data_off = r.read_u4()?;
        let static_values_off = r.read_u4()?;

        Ok(DexClass {
            name,
            access,
            superclass,
            interfaces,
            class_data_off,
            static_values_off,
            data: OnceCell::new(),
        })
    }

    /// Materializes fields and methods on first use; later calls return the
    /// same `ClassData`. `dex` must be the file this class was read from.
    ///
    /// A failure leaves the class unmaterialized.
    pub fn parse_data(&self, dex: &DexFile) -> Result<&ClassData>
    {
        self.data.get_or_try_init(|| {
            debug!("[class] materializing {}", self.name);
            self.read_data(dex).context(|| format!("class {}", self.name))
        })
    }

    /// The class data if it has already been materialized.
    pub fn data(&self) -> Option<&ClassData>
    {
        self.data.get()
    }

    pub fn is_parsed(&self) -> bool
    {
        self.data.get().is_some()
    }

    fn read_data(&self, dex: &DexFile) -> Result<ClassData>
    {
        let mut data = if self.class_data_off != 0 { ClassData::read(dex, self.class_data_off as usize)? }
            else { ClassData::default() };

        if self.static_values_off != 0 {
            let mut r = dex.stream(self.static_values_off as usize);
            let size = r.read_uleb128()? as usize;
            // The table lists leading static fields only, in declaration order
            for field in data.fields.iter_mut().take(size) {
                let value = EncodedValue::read(dex, &mut r)
                    .context(|| format!("static value of field {}", field.id.member))?;
                field.constant_value = Some(value);
            }
        }
        Ok(data)
    }
}
