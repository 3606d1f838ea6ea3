//! Linear memory operators
//!
//! No explicit bounds check is emitted: the runtime reserves a guarded
//! virtual region large enough that any 32-bit index plus 32-bit offset
//! stays inside the sandbox. What the translator must guarantee is that
//! the 32-bit index is zero-extended to 64 bits before the offset is
//! added, so sign extension can never manufacture a negative
//! displacement.

use super::function::FunctionEmitter;
use super::types::ir_type;
use crate::instruction::MemArg;
use crate::ir::{CastOp, IrType, ValueId};
use crate::module::{FunctionType, ValueType};

/// How a memory value widens to (or narrows from) the operand stack type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemConversion {
    None,
    SExt,
    ZExt,
    Trunc,
}

impl FunctionEmitter<'_, '_> {
    /// Convert an i32 byte index plus constant offset to a pointer into
    /// the default memory.
    pub(crate) fn byte_index_to_pointer(&mut self, byte_index: ValueId, offset: u32) -> ValueId {
        // Zero extend before the add: a sign extension here would let a
        // negative displacement escape the sandboxed region.
        let mut index = self.builder.cast(CastOp::ZExt, byte_index, IrType::I64);
        if offset != 0 {
            let offset = self.builder.const_i64(offset as u64);
            index = self.builder.binary(crate::ir::BinOp::Add, index, offset);
        }
        let memory_base = self.load_memory_base();
        self.builder.ptr_offset(memory_base, index)
    }

    pub(crate) fn apply_mem_conversion(
        &mut self,
        value: ValueId,
        conversion: MemConversion,
        to: IrType,
    ) -> ValueId {
        match conversion {
            MemConversion::None => value,
            MemConversion::SExt => self.builder.cast(CastOp::SExt, value, to),
            MemConversion::ZExt => self.builder.cast(CastOp::ZExt, value, to),
            MemConversion::Trunc => self.builder.cast(CastOp::Trunc, value, to),
        }
    }

    pub(crate) fn emit_load(
        &mut self,
        value_type: ValueType,
        memory_type: IrType,
        memarg: MemArg,
        conversion: MemConversion,
    ) {
        let byte_index = self.pop();
        let pointer = self.byte_index_to_pointer(byte_index, memarg.offset);
        let loaded = self.builder.load(pointer, memory_type, 1 << memarg.align, true, None);
        let value = self.apply_mem_conversion(loaded, conversion, ir_type(value_type));
        self.push(value);
    }

    pub(crate) fn emit_store(&mut self, memory_type: IrType, memarg: MemArg, conversion: MemConversion) {
        let value = self.pop();
        let byte_index = self.pop();
        let pointer = self.byte_index_to_pointer(byte_index, memarg.offset);
        let memory_value = self.apply_mem_conversion(value, conversion, memory_type);
        self.builder.store(pointer, memory_value, 1 << memarg.align, true, None);
    }

    /// `v128.store` stores whatever 128-bit shape is on the stack.
    pub(crate) fn emit_v128_store(&mut self, memarg: MemArg) {
        let value = self.pop();
        let byte_index = self.pop();
        let pointer = self.byte_index_to_pointer(byte_index, memarg.offset);
        self.builder.store(pointer, value, 1 << memarg.align, true, None);
    }

    pub(crate) fn emit_memory_grow(&mut self) -> Result<(), super::EmitError> {
        let delta_pages = self.pop();
        let memory_id = self.builder.const_i64(self.instance.default_memory_id);
        let previous_pages = self.emit_runtime_intrinsic(
            "growMemory",
            &FunctionType::new(vec![ValueType::I32, ValueType::I64], vec![ValueType::I32]),
            vec![delta_pages, memory_id],
        )?;
        assert_eq!(previous_pages.len(), 1);
        self.push(previous_pages[0]);
        Ok(())
    }

    pub(crate) fn emit_memory_size(&mut self) -> Result<(), super::EmitError> {
        let memory_id = self.builder.const_i64(self.instance.default_memory_id);
        let current_pages = self.emit_runtime_intrinsic(
            "currentMemory",
            &FunctionType::new(vec![ValueType::I64], vec![ValueType::I32]),
            vec![memory_id],
        )?;
        assert_eq!(current_pages.len(), 1);
        self.push(current_pages[0]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::emit::test_utils::emit_single;
    use crate::instruction::Instruction::*;
    use crate::instruction::MemArg;
    use crate::module::ValueType;

    #[test]
    fn loads_zero_extend_the_index_before_adding_the_offset() {
        let ir = emit_single(
            &[ValueType::I32],
            &[ValueType::I32],
            &[],
            vec![
                LocalGet { local_index: 0 },
                I32Load {
                    memarg: MemArg { align: 2, offset: 16 },
                },
                End,
            ],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        let zext_at = text.find("zext").expect("index must be zero-extended");
        let add_at = text.find("add i64").expect("offset must be added in 64 bits");
        assert!(zext_at < add_at, "zext must precede the offset add");
        assert!(text.contains("volatile"));
    }

    #[test]
    fn memory_grow_calls_the_runtime_intrinsic() {
        let ir = emit_single(
            &[ValueType::I32],
            &[ValueType::I32],
            &[],
            vec![LocalGet { local_index: 0 }, MemoryGrow, End],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        assert!(text.contains("call intrinsic"));
    }
}
