/* Method bodies: code_item, try_item and encoded_catch_handler */

use std::collections::BTreeSet;

use log::warn;

use crate::dex::dex_file::DexFile;
use crate::dex::error::{Context, Result};
use crate::dex::instructions::Instruction;
use crate::dex::reader::Reader;

/// Name given to the synthesized handler that catches everything.
pub const CATCH_ALL: &str = "java/lang/Throwable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchHandler {
    /// Normalized class name of the caught type.
    pub exception_type: String,
    /// Handler address in code units.
    pub addr: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryItem {
    pub start_addr: u32,
    pub insn_count: u16,
    pub handler_off: u16, // offset (in bytes) into the encoded_catch_handler_list
    pub catches: Vec<CatchHandler>,
    catch_all: bool,
}

impl TryItem {
    pub fn read(r: &mut Reader) -> Result<TryItem> {
        Ok(TryItem {
            start_addr: r.read_u4()?,
            insn_count: r.read_u2()?,
            handler_off: r.read_u2()?,
            catches: vec![],
            catch_all: false,
        })
    }

    /// First code unit past the covered range.
    pub fn end_addr(&self) -> u32 {
        self.start_addr.saturating_add(self.insn_count as u32)
    }

    pub fn covers(&self, addr: u32) -> bool {
        self.start_addr <= addr && addr < self.end_addr()
    }

    pub fn has_catch_all(&self) -> bool {
        self.catch_all
    }

    /// Reads this entry's handlers from the catch handler list starting at `list_off`.
    ///
    /// The signed size is both the count of typed handlers and, when not
    /// positive, the marker for a trailing catch-all address.
    pub fn finish(&mut self, dex: &DexFile, list_off: usize) -> Result<()> {
        let mut r = dex.stream(list_off + self.handler_off as usize);
        let size = r.read_sleb128()?;
        let count = size.unsigned_abs() as usize;
        let mut catches = Vec::with_capacity(count.min(256) + 1);
        for _ in 0..count {
            let type_idx = r.read_uleb128()?;
            let addr = r.read_uleb128()?;
            catches.push(CatchHandler { exception_type: dex.cls_type(type_idx)?, addr });
        }
        if size <= 0 {
            catches.push(CatchHandler { exception_type: CATCH_ALL.to_string(), addr: r.read_uleb128()? });
        }
        self.catches = catches;
        self.catch_all = size <= 0;
        Ok(())
    }
}

#[derive(Debug)]
pub struct CodeItem
{
    pub registers_size: u16,
    pub ins_size: u16,
    pub outs_size: u16,
    pub debug_info_off: u32,
    /// File offset of the first instruction word.
    pub insns_off: usize,
    pub insns: Vec<u16>,
    pub tries: Vec<TryItem>,
    pub bytecode: Vec<Instruction>,
}

impl CodeItem
{
    pub fn read(dex: &DexFile, offset: usize) -> Result<CodeItem>
    {
        let mut r = dex.stream(offset);
        let registers_size = r.read_u2()?;
        let ins_size = r.read_u2()?;
        let outs_size = r.read_u2()?;
        let tries_size = r.read_u2()?;
        let debug_info_off = r.read_u4()?;

        let insns_size = r.read_u4()?;
        let insns_off = r.pos();
        // Bounds-check up front so a bogus count cannot drive a huge allocation
        let raw = r.read_x(insns_size as usize * 2)
            .context(|| format!("instructions of code item at 0x{:x}", offset))?;
        let insns: Vec<u16> = raw.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect();

        // 2-byte padding to realign the try table
        if tries_size > 0 && insns_size & 1 != 0 {
            let padding = r.read_u2()?;
            if padding != 0 {
                warn!("[codeitem] non-zero padding 0x{:04x} at 0x{:x} (code_item_start=0x{:x})",
                    padding, r.pos() - 2, offset);
            }
        }

        let mut tries = Vec::with_capacity(tries_size as usize);
        for _ in 0..tries_size { tries.push(TryItem::read(&mut r)?); }

        // encoded_catch_handler_list starts here; handler_off is relative to it
        let list_off = r.pos();
        for (i, t) in tries.iter_mut().enumerate() {
            t.finish(dex, list_off)
                .context(|| format!("try item #{} (handler_off {}) of code item at 0x{:x}", i, t.handler_off, offset))?;
        }

        let mut code = CodeItem {
            registers_size, ins_size, outs_size, debug_info_off, insns_off, insns, tries, bytecode: vec![],
        };
        code.bytecode = dex.decoder().decode(code.insns_off, &code.insns, &code.handler_addrs())
            .context(|| format!("bytecode of code item at 0x{:x}", offset))?;
        Ok(code)
    }

    /// Registers that are not incoming arguments.
    pub fn locals(&self) -> u16
    {
        self.registers_size.saturating_sub(self.ins_size)
    }

    /// Union of the handler addresses of every try item.
    pub fn handler_addrs(&self) -> BTreeSet<u32>
    {
        self.tries.iter().flat_map(|t| t.catches.iter().map(|c| c.addr)).collect()
    }
}
