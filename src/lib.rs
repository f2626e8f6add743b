//! # Dexview
//!
//! A library for reading Android DEX images into a class model for static
//! analysis. Class definitions are read up front; fields, methods and code of
//! a class are decoded the first time they are asked for.
//!
//! # Examples
//!
//! ```no_run
//!  use dexview::dex::DexFile;
//!  use std::path::Path;
//!
//!  let dex = DexFile::from_file(Path::new("classes.dex")).unwrap();
//!  for class in dex.classes() {
//!      let data = class.parse_data(&dex).unwrap();
//!      println!("{} has {} methods", class.name, data.methods.len());
//!  }
//! ```
pub mod dex;
#[cfg(test)]
mod tests;

pub use crate::dex::{DexError, DexFile, DexOptions};
