/* Field, method and prototype id records */

use std::fmt;

use crate::dex::dex_file::DexFile;
use crate::dex::error::{Context, Result};

pub(crate) const FIELD_ID_SIZE: usize = 8;
pub(crate) const METHOD_ID_SIZE: usize = 8;
pub(crate) const PROTO_ID_SIZE: usize = 12;

/// The (declaring class, name, descriptor) triple shared by fields and methods.
///
/// `class` is the normalized class name (`java/lang/Object`, or an array
/// descriptor verbatim); `descriptor` is a JNI type or method descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    pub class: String,
    pub name: String,
    pub descriptor: String,
}

impl MemberRef
{
    pub fn triple(&self) -> (&str, &str, &str)
    {
        (&self.class, &self.name, &self.descriptor)
    }
}

impl fmt::Display for MemberRef
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}->{}", self.class, self.name)?;
        // Field descriptors are separated by ':', method descriptors start with '('
        if !self.descriptor.starts_with('(') {
            f.write_str(":")?;
        }
        f.write_str(&self.descriptor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldId {
    pub index: u32,
    pub member: MemberRef,
}

impl FieldId
{
    pub(crate) fn read(dex: &DexFile, index: u32) -> Result<FieldId>
    {
        let mut r = dex.stream(dex.header().field_ids.entry(index, FIELD_ID_SIZE));
        let class_idx = r.read_u2()?;
        let type_idx = r.read_u2()?;
        let name_idx = r.read_u4()?;
        Ok(FieldId {
            index,
            member: MemberRef {
                class: dex.cls_type(class_idx as u32)?,
                name: dex.string_text(name_idx)?,
                descriptor: dex.type_desc(type_idx as u32)?,
            },
        })
    }

    pub fn triple(&self) -> (&str, &str, &str)
    {
        self.member.triple()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prototype {
    pub shorty: String,
    pub return_type: String,
    pub param_types: Vec<String>,
}

impl Prototype
{
    pub(crate) fn read(dex: &DexFile, index: u32) -> Result<Prototype>
    {
        let mut r = dex.stream(dex.header().proto_ids.entry(index, PROTO_ID_SIZE));
        let shorty_idx = r.read_u4()?;
        let return_idx = r.read_u4()?;
        let parameters_off = r.read_u4()?;
        Ok(Prototype {
            shorty: dex.string_text(shorty_idx)?,
            return_type: dex.type_desc(return_idx)?,
            param_types: dex.type_list(parameters_off, false)?,
        })
    }

    /// JNI method descriptor, `(` params `)` return.
    pub fn descriptor(&self) -> String
    {
        let mut s = String::from("(");
        for t in &self.param_types { s.push_str(t); }
        s.push(')');
        s.push_str(&self.return_type);
        s
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodId {
    pub index: u32,
    pub member: MemberRef,
    pub proto: Prototype,
}

impl MethodId
{
    pub(crate) fn read(dex: &DexFile, index: u32) -> Result<MethodId>
    {
        let mut r = dex.stream(dex.header().method_ids.entry(index, METHOD_ID_SIZE));
        let class_idx = r.read_u2()?;
        let proto_idx = r.read_u2()?;
        let name_idx = r.read_u4()?;
        let class = dex.cls_type(class_idx as u32)?;
        let name = dex.string_text(name_idx)?;
        let proto = dex.proto(proto_idx as u32)
            .context(|| format!("prototype of {}->{}", class, name))?;
        Ok(MethodId {
            index,
            member: MemberRef { class, name, descriptor: proto.descriptor() },
            proto,
        })
    }

    pub fn triple(&self) -> (&str, &str, &str)
    {
        self.member.triple()
    }

    pub fn return_type(&self) -> &str
    {
        &self.proto.return_type
    }

    pub fn param_types(&self) -> &[String]
    {
        &self.proto.param_types
    }

    /// One entry per argument register: the implicit receiver first for
    /// instance methods, and a `None` after each long or double for its
    /// second register.
    pub fn spaced_param_types(&self, is_static: bool) -> Vec<Option<String>>
    {
        let mut results = Vec::with_capacity(self.proto.param_types.len() * 2 + 1);
        if !is_static {
            let class = &self.member.class;
            if class.starts_with('[') {
                results.push(Some(class.clone()));
            } else {
                results.push(Some(format!("L{};", class)));
            }
        }

        for ptype in &self.proto.param_types {
            results.push(Some(ptype.clone()));
            if ptype == "J" || ptype == "D" {
                results.push(None);
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(class: &str, params: &[&str], ret: &str) -> MethodId
    {
        let proto = Prototype {
            shorty: String::new(),
            return_type: ret.to_string(),
            param_types: params.iter().map(|s| s.to_string()).collect(),
        };
        MethodId {
            index: 0,
            member: MemberRef { class: class.to_string(), name: "m".to_string(), descriptor: proto.descriptor() },
            proto,
        }
    }

    #[test]
    fn descriptor_is_params_then_return()
    {
        let m = method("a/B", &["I", "[Ljava/lang/String;", "J"], "V");
        assert_eq!(m.member.descriptor, "(I[Ljava/lang/String;J)V");
        assert_eq!(method("a/B", &[], "Z").member.descriptor, "()Z");
    }

    #[test]
    fn spaced_params_add_receiver_and_wide_slots()
    {
        let m = method("a/B", &["J", "I", "D"], "V");
        assert_eq!(m.spaced_param_types(false), vec![
            Some("La/B;".to_string()),
            Some("J".to_string()),
            None,
            Some("I".to_string()),
            Some("D".to_string()),
            None,
        ]);
        assert_eq!(m.spaced_param_types(true).len(), 5);
    }

    #[test]
    fn array_receiver_is_kept_verbatim()
    {
        let m = method("[I", &[], "Ljava/lang/Object;");
        assert_eq!(m.spaced_param_types(false), vec![Some("[I".to_string())]);
    }

    #[test]
    fn member_display()
    {
        let f = MemberRef { class: "a/B".into(), name: "x".into(), descriptor: "I".into() };
        assert_eq!(f.to_string(), "a/B->x:I");
        let m = method("a/B", &["I"], "V");
        assert_eq!(m.member.to_string(), "a/B->m(I)V");
    }
}
