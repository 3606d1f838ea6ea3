//! Backend IR functions, blocks, and SSA values
//!
//! Each function owns two arenas: one for SSA values (arguments, constants,
//! instruction results) and one for basic blocks. Blocks reference values
//! by id; the separate `layout` list carries block ordering so blocks can
//! be moved without renumbering.

use super::instr::{Instr, Terminator};
use super::module::FuncId;
use super::types::{CallConv, IrType};
use std::fmt;

/// Handle to an SSA value within one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(pub(crate) u32);

impl ValueId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Handle to a basic block within one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub(crate) u32);

impl BlockId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A literal constant value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    I1(bool),
    I8(u8),
    I16(u16),
    I32(u32),
    I64(u64),
    F32(f32),
    F64(f64),
    V128 { low: u64, high: u64 },
    /// An opaque native address (function pointers, type-info pointers).
    Ptr(u64),
    /// The address of a module function.
    Func(FuncId),
    /// The typed zero of the value's type; used for vector zeros.
    Zero,
}

/// How a value is defined.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueDef {
    Argument { index: u32 },
    Const(ConstValue),
    Inst(Instr),
    /// The `index`-th result of a call instruction.
    CallResult { call: ValueId, index: u32 },
    /// The `index`-th result of the invoke terminating `block`.
    InvokeResult { block: BlockId, index: u32 },
    /// A phi removed because it had no incoming edges.
    Erased,
}

/// One SSA value: its definition, type, optional name, and the operator
/// index it was emitted for (the debug location).
#[derive(Debug, Clone, PartialEq)]
pub struct ValueData {
    pub def: ValueDef,
    pub ty: IrType,
    pub name: Option<String>,
    pub loc: Option<u32>,
}

/// A basic block: phis first, then ordinary instructions, then exactly one
/// terminator once the block is complete.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub phis: Vec<ValueId>,
    pub insts: Vec<ValueId>,
    pub terminator: Option<Terminator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    External,
    Internal,
}

/// A function signature in backend terms: parameter and result types plus
/// the calling convention. For the `Wasm` convention the context pointer
/// is already present as the first parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<IrType>,
    pub results: Vec<IrType>,
    pub call_conv: CallConv,
}

/// Debug-info record attached to an emitted function.
#[derive(Debug, Clone, PartialEq)]
pub struct Subprogram {
    /// Source-level name.
    pub name: String,
    /// Backend symbol name.
    pub linkage_name: String,
}

/// A backend IR function: a declaration if it has no blocks, a definition
/// otherwise.
#[derive(Debug, Clone)]
pub struct IrFunction {
    pub name: String,
    pub signature: Signature,
    pub linkage: Linkage,
    /// The exception personality routine, shared by all WebAssembly
    /// functions in a module.
    pub personality: Option<FuncId>,
    pub subprogram: Option<Subprogram>,
    values: Vec<ValueData>,
    blocks: Vec<Block>,
    layout: Vec<BlockId>,
    args: Vec<ValueId>,
}

impl IrFunction {
    pub fn new(name: impl Into<String>, signature: Signature, linkage: Linkage) -> IrFunction {
        let mut function = IrFunction {
            name: name.into(),
            signature,
            linkage,
            personality: None,
            subprogram: None,
            values: Vec::new(),
            blocks: Vec::new(),
            layout: Vec::new(),
            args: Vec::new(),
        };
        for (index, &ty) in function.signature.params.clone().iter().enumerate() {
            let value = function.add_value(ValueData {
                def: ValueDef::Argument { index: index as u32 },
                ty,
                name: None,
                loc: None,
            });
            function.args.push(value);
        }
        function
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn arg(&self, index: usize) -> ValueId {
        self.args[index]
    }

    pub fn args(&self) -> &[ValueId] {
        &self.args
    }

    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.index()]
    }

    pub(crate) fn value_mut(&mut self, id: ValueId) -> &mut ValueData {
        &mut self.values[id.index()]
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.index()]
    }

    /// Block ids in layout order.
    pub fn layout(&self) -> &[BlockId] {
        &self.layout
    }

    /// The entry block (first in layout), if the function has a body.
    pub fn entry_block(&self) -> Option<BlockId> {
        self.layout.first().copied()
    }

    /// First block with the given name, searching in layout order.
    pub fn find_block(&self, name: &str) -> Option<BlockId> {
        self.layout.iter().copied().find(|id| self.block(*id).name == name)
    }

    /// All blocks with the given name, in layout order.
    pub fn blocks_named(&self, name: &str) -> Vec<BlockId> {
        self.layout
            .iter()
            .copied()
            .filter(|id| self.block(*id).name == name)
            .collect()
    }

    pub(crate) fn add_value(&mut self, data: ValueData) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(data);
        id
    }

    pub(crate) fn add_block(&mut self, name: impl Into<String>) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block {
            name: name.into(),
            phis: Vec::new(),
            insts: Vec::new(),
            terminator: None,
        });
        self.layout.push(id);
        id
    }

    pub(crate) fn layout_mut(&mut self) -> &mut Vec<BlockId> {
        &mut self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature() -> Signature {
        Signature {
            params: vec![IrType::Ptr, IrType::I32],
            results: vec![IrType::I32],
            call_conv: CallConv::Wasm,
        }
    }

    #[test]
    fn arguments_are_created_with_the_function() {
        let function = IrFunction::new("f", signature(), Linkage::External);
        assert_eq!(function.args().len(), 2);
        assert_eq!(function.value(function.arg(0)).ty, IrType::Ptr);
        assert_eq!(function.value(function.arg(1)).ty, IrType::I32);
        assert!(function.is_declaration());
    }

    #[test]
    fn blocks_track_layout_order() {
        let mut function = IrFunction::new("f", signature(), Linkage::External);
        let a = function.add_block("entry");
        let b = function.add_block("body");
        assert_eq!(function.layout(), &[a, b]);
        assert_eq!(function.entry_block(), Some(a));
        assert_eq!(function.find_block("body"), Some(b));
        assert!(function.find_block("missing").is_none());
    }
}
