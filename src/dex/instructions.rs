//! Splitting of Dalvik instruction streams
//!
//! The parser does not interpret opcodes itself. Every code item is handed to a
//! [`BytecodeDecoder`] together with the byte offset of its first instruction
//! and the set of exception handler entry points, and whatever the decoder
//! returns is stored on the code item unchanged.

use std::collections::BTreeSet;

use crate::dex::error::{DexError, ErrorKind, Result};

const PACKED_SWITCH_PAYLOAD: u16 = 0x0100;
const SPARSE_SWITCH_PAYLOAD: u16 = 0x0200;
const ARRAY_PAYLOAD: u16 = 0x0300;

/// Turns the raw code units of one method into instructions.
pub trait BytecodeDecoder: Send + Sync {
    /// `start` is the file offset of `insns[0]`; `handlers` holds handler
    /// addresses in code units.
    fn decode(&self, start: usize, insns: &[u16], handlers: &BTreeSet<u32>) -> Result<Vec<Instruction>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    Op(u8),
    PackedSwitchPayload,
    SparseSwitchPayload,
    ArrayPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Address in code units from the start of the method.
    pub addr: u32,
    /// Absolute byte offset in the image.
    pub offset: usize,
    pub kind: InstructionKind,
    pub units: Vec<u16>,
    /// Whether an exception handler starts here.
    pub handler_entry: bool,
}

impl Instruction
{
    pub fn opcode(&self) -> Option<u8>
    {
        match self.kind
        {
            InstructionKind::Op(op) => Some(op),
            _ => None,
        }
    }

    pub fn width(&self) -> usize
    {
        self.units.len()
    }
}

/// Size in code units of the format used by each opcode.
const fn op_width(op: u8) -> usize {
    match op {
        0x00 | 0x01 | 0x04 | 0x07 | 0x0a..=0x12 | 0x1d | 0x1e | 0x21 | 0x27 | 0x28 => 1,
        0x02 | 0x05 | 0x08 | 0x13 | 0x15 | 0x16 | 0x19 | 0x1a | 0x1c | 0x1f | 0x20 | 0x22 | 0x23 | 0x29 => 2,
        0x03 | 0x06 | 0x09 | 0x14 | 0x17 | 0x1b | 0x24..=0x26 | 0x2a..=0x2c => 3,
        0x18 => 5,
        0x2d..=0x3d => 2,
        0x3e..=0x43 => 1,
        0x44..=0x6d => 2,
        0x6e..=0x72 => 3,
        0x73 => 1,
        0x74..=0x78 => 3,
        0x79 | 0x7a => 1,
        0x7b..=0x8f => 1,
        0x90..=0xaf => 2,
        0xb0..=0xcf => 1,
        0xd0..=0xe2 => 2,
        0xe3..=0xf9 => 1,
        0xfa | 0xfb => 4,
        0xfc | 0xfd => 3,
        0xfe | 0xff => 2,
    }
}

/// Default decoder: splits the stream by instruction width without decoding operands.
#[derive(Debug, Default, Clone, Copy)]
pub struct WidthDecoder;

impl WidthDecoder
{
    fn payload_width(insns: &[u16], pc: usize) -> Result<Option<(InstructionKind, usize)>>
    {
        let unit = |i: usize| -> Result<usize> {
            insns.get(pc + i).map(|u| *u as usize).ok_or_else(|| err!(
                OutOfBounds, "Payload header at code unit {} runs past end of {} units", pc, insns.len()
            ))
        };
        Ok(match insns[pc]
        {
            PACKED_SWITCH_PAYLOAD => Some((InstructionKind::PackedSwitchPayload, 4 + unit(1)? * 2)),
            SPARSE_SWITCH_PAYLOAD => Some((InstructionKind::SparseSwitchPayload, 2 + unit(1)? * 4)),
            ARRAY_PAYLOAD => {
                let element_width = unit(1)?;
                let size = unit(2)? | (unit(3)? << 16);
                let data_bytes = element_width.saturating_mul(size);
                Some((InstructionKind::ArrayPayload, 4 + data_bytes.div_ceil(2)))
            }
            _ => None,
        })
    }
}

impl BytecodeDecoder for WidthDecoder
{
    fn decode(&self, start: usize, insns: &[u16], handlers: &BTreeSet<u32>) -> Result<Vec<Instruction>>
    {
        let mut out = vec![];
        let mut pc = 0usize;
        while pc < insns.len()
        {
            let op = (insns[pc] & 0x00ff) as u8;
            let (kind, width) = match Self::payload_width(insns, pc)?
            {
                Some(p) => p,
                None => (InstructionKind::Op(op), op_width(op)),
            };
            let end = pc.saturating_add(width);
            if end > insns.len() {
                fail!(OutOfBounds, "Instruction 0x{:02x} at code unit {} needs {} units but only {} remain",
                    op, pc, width, insns.len() - pc);
            }
            out.push(Instruction {
                addr: pc as u32,
                offset: start + pc * 2,
                kind,
                units: insns[pc..end].to_vec(),
                handler_entry: handlers.contains(&(pc as u32)),
            });
            pc = end;
        }
        Ok(out)
    }
}
