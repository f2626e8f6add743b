#[macro_use]
pub mod error;

pub(crate) mod leb;
pub mod reader;
pub mod header;
pub mod dex_file;
pub mod ids;
pub mod class;
pub mod code;
pub mod encoded_values;
pub mod instructions;

pub use crate::dex::class::{ClassData, DexClass, Field, Method};
pub use crate::dex::code::{CatchHandler, CodeItem, TryItem, CATCH_ALL};
pub use crate::dex::dex_file::{decode_mutf8, AccessFlags, DexFile, DexOptions, NO_INDEX};
pub use crate::dex::encoded_values::EncodedValue;
pub use crate::dex::error::{DexError, ErrorKind, Result};
pub use crate::dex::header::{Header, Section, StructuralWarning};
pub use crate::dex::ids::{FieldId, MemberRef, MethodId, Prototype};
pub use crate::dex::instructions::{BytecodeDecoder, Instruction, InstructionKind, WidthDecoder};
pub use crate::dex::reader::Reader;
