//! Atomic memory operators
//!
//! Atomics lower to sequentially consistent backend atomic loads, stores,
//! RMWs, and compare-exchanges. Any atomic operator whose natural
//! alignment exceeds one byte traps on a misaligned address before
//! touching memory; wait and notify are runtime intrinsic calls keyed by
//! the default memory's identity.

use super::function::FunctionEmitter;
use super::memory::MemConversion;
use super::types::ir_type;
use super::EmitError;
use crate::instruction::MemArg;
use crate::ir::{AtomicOrdering, BinOp, ICmpPred, IrType, RmwOp, ValueId};
use crate::module::{FunctionType, ValueType};

impl FunctionEmitter<'_, '_> {
    /// Misaligned-atomic traps are emitted unconditionally for any atomic
    /// operator whose natural alignment exceeds 1.
    fn trap_if_misaligned_atomic(
        &mut self,
        address: ValueId,
        natural_alignment_log2: u32,
    ) -> Result<(), EmitError> {
        if natural_alignment_log2 == 0 {
            return Ok(());
        }
        let mask = self.builder.const_i32((1 << natural_alignment_log2) - 1);
        let low_bits = self.builder.binary(BinOp::And, address, mask);
        let zero = self.builder.const_i32(0);
        let misaligned = self.builder.icmp(ICmpPred::Ne, zero, low_bits);
        self.emit_conditional_trap_intrinsic(
            misaligned,
            "misalignedAtomicTrap",
            &FunctionType::new(vec![ValueType::I32], vec![]),
            vec![address],
        )
    }

    pub(crate) fn emit_atomic_load(
        &mut self,
        value_type: ValueType,
        memory_type: IrType,
        natural_alignment_log2: u32,
        memarg: MemArg,
        conversion: MemConversion,
    ) -> Result<(), EmitError> {
        let byte_index = self.pop();
        self.trap_if_misaligned_atomic(byte_index, natural_alignment_log2)?;
        let pointer = self.byte_index_to_pointer(byte_index, memarg.offset);
        let loaded = self.builder.load(
            pointer,
            memory_type,
            1 << memarg.align,
            true,
            Some(AtomicOrdering::SeqCst),
        );
        let value = self.apply_mem_conversion(loaded, conversion, ir_type(value_type));
        self.push(value);
        Ok(())
    }

    pub(crate) fn emit_atomic_store(
        &mut self,
        memory_type: IrType,
        natural_alignment_log2: u32,
        memarg: MemArg,
        conversion: MemConversion,
    ) -> Result<(), EmitError> {
        let value = self.pop();
        let byte_index = self.pop();
        self.trap_if_misaligned_atomic(byte_index, natural_alignment_log2)?;
        let pointer = self.byte_index_to_pointer(byte_index, memarg.offset);
        let memory_value = self.apply_mem_conversion(value, conversion, memory_type);
        self.builder.store(
            pointer,
            memory_value,
            1 << memarg.align,
            true,
            Some(AtomicOrdering::SeqCst),
        );
        Ok(())
    }

    pub(crate) fn emit_atomic_rmw(
        &mut self,
        value_type: ValueType,
        op: RmwOp,
        memory_type: IrType,
        natural_alignment_log2: u32,
        memarg: MemArg,
        value_conversion: MemConversion,
        result_conversion: MemConversion,
    ) -> Result<(), EmitError> {
        let value = self.pop();
        let value = self.apply_mem_conversion(value, value_conversion, memory_type);
        let byte_index = self.pop();
        self.trap_if_misaligned_atomic(byte_index, natural_alignment_log2)?;
        let pointer = self.byte_index_to_pointer(byte_index, memarg.offset);
        let previous = self.builder.atomic_rmw(op, pointer, value);
        let result = self.apply_mem_conversion(previous, result_conversion, ir_type(value_type));
        self.push(result);
        Ok(())
    }

    pub(crate) fn emit_atomic_cmpxchg(
        &mut self,
        value_type: ValueType,
        memory_type: IrType,
        natural_alignment_log2: u32,
        memarg: MemArg,
        value_conversion: MemConversion,
        result_conversion: MemConversion,
    ) -> Result<(), EmitError> {
        let replacement = self.pop();
        let replacement = self.apply_mem_conversion(replacement, value_conversion, memory_type);
        let expected = self.pop();
        let expected = self.apply_mem_conversion(expected, value_conversion, memory_type);
        let byte_index = self.pop();
        self.trap_if_misaligned_atomic(byte_index, natural_alignment_log2)?;
        let pointer = self.byte_index_to_pointer(byte_index, memarg.offset);
        let previous = self.builder.atomic_cmpxchg(pointer, expected, replacement);
        let result = self.apply_mem_conversion(previous, result_conversion, ir_type(value_type));
        self.push(result);
        Ok(())
    }

    pub(crate) fn emit_atomic_notify(&mut self) -> Result<(), EmitError> {
        let num_waiters = self.pop();
        let address = self.pop();
        let memory_id = self.builder.const_i64(self.instance.default_memory_id);
        let results = self.emit_runtime_intrinsic(
            "atomic_wake",
            &FunctionType::new(
                vec![ValueType::I32, ValueType::I32, ValueType::I64],
                vec![ValueType::I32],
            ),
            vec![address, num_waiters, memory_id],
        )?;
        self.push(results[0]);
        Ok(())
    }

    pub(crate) fn emit_atomic_wait(&mut self, expected_type: ValueType) -> Result<(), EmitError> {
        let timeout = self.pop();
        let expected_value = self.pop();
        let address = self.pop();
        let memory_id = self.builder.const_i64(self.instance.default_memory_id);
        let name = match expected_type {
            ValueType::I32 => "atomic_wait_i32",
            ValueType::I64 => "atomic_wait_i64",
            other => panic!("atomic wait on {other}"),
        };
        let results = self.emit_runtime_intrinsic(
            name,
            &FunctionType::new(
                vec![ValueType::I32, expected_type, ValueType::F64, ValueType::I64],
                vec![ValueType::I32],
            ),
            vec![address, expected_value, timeout, memory_id],
        )?;
        self.push(results[0]);
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
    fn naturally_aligned_word_atomics_emit_the_misalignment_trap() {
        let ir = emit_single(
            &[ValueType::I32],
            &[ValueType::I32],
            &[],
            vec![
                LocalGet { local_index: 0 },
                I32AtomicLoad {
                    memarg: MemArg { align: 2, offset: 0 },
                },
                End,
            ],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        assert!(function.find_block("misalignedAtomicTrapTrap").is_some());
        assert!(function.find_block("misalignedAtomicTrapSkip").is_some());
        let text = function.to_string();
        assert!(text.contains("i32 3"), "mask must be alignment - 1: {text}");
        assert!(text.contains("seq_cst"));
    }

    #[test]
    fn byte_atomics_skip_the_misalignment_trap() {
        let ir = emit_single(
            &[ValueType::I32],
            &[ValueType::I32],
            &[],
            vec![
                LocalGet { local_index: 0 },
                I32AtomicLoad8U {
                    memarg: MemArg { align: 0, offset: 0 },
                },
                End,
            ],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        assert!(function.find_block("misalignedAtomicTrapTrap").is_none());
        let text = function.to_string();
        assert!(text.contains("zext"));
    }

    #[test]
    fn rmw_add_produces_the_previous_value() {
        let ir = emit_single(
            &[ValueType::I32, ValueType::I32],
            &[ValueType::I32],
            &[],
            vec![
                LocalGet { local_index: 0 },
                LocalGet { local_index: 1 },
                I32AtomicRmwAdd {
                    memarg: MemArg { align: 2, offset: 0 },
                },
                End,
            ],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        assert!(text.contains("atomicrmw add"));
        assert!(text.contains("volatile"));
    }

    #[test]
    fn cmpxchg_narrow_forms_truncate_and_extend() {
        let ir = emit_single(
            &[ValueType::I32, ValueType::I32, ValueType::I32],
            &[ValueType::I32],
            &[],
            vec![
                LocalGet { local_index: 0 },
                LocalGet { local_index: 1 },
                LocalGet { local_index: 2 },
                I32AtomicRmw8CmpxchgU {
                    memarg: MemArg { align: 0, offset: 0 },
                },
                End,
            ],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        assert!(text.contains("cmpxchg"));
        assert!(text.contains("trunc"));
        assert!(text.contains("zext"));
    }

    #[test]
    fn wait_and_notify_call_the_runtime() {
        let ir = emit_single(
            &[ValueType::I32, ValueType::I32, ValueType::F64],
            &[ValueType::I32],
            &[],
            vec![
                LocalGet { local_index: 0 },
                LocalGet { local_index: 1 },
                LocalGet { local_index: 2 },
                MemoryAtomicWait32 {
                    memarg: MemArg { align: 2, offset: 0 },
                },
                End,
            ],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        assert!(text.contains("call intrinsic ptr"));
    }
}
