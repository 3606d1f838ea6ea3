//! Local and global variable operators
//!
//! Locals live in addressable stack slots allocated by the prologue.
//! Mutable globals live in the context's global data area at the offset
//! the instance binding assigns; immutable globals become inline
//! constants when they fit in a pointer and loads from their
//! initial-value storage otherwise.

use super::function::FunctionEmitter;
use super::types::{emit_literal, ir_type};
use crate::instance::CONTEXT_GLOBAL_DATA_OFFSET;
use crate::ir::ValueId;

impl FunctionEmitter<'_, '_> {
    pub(crate) fn emit_local_get(&mut self, local_index: u32) {
        let pointer = self.local_pointers[local_index as usize];
        let local_type = self.local_types[local_index as usize];
        let loaded = self
            .builder
            .load(pointer, ir_type(local_type), local_type.byte_width(), false, None);
        self.push(loaded);
    }

    pub(crate) fn emit_local_set(&mut self, local_index: u32) {
        let value = self.pop();
        self.store_to_local(local_index, value);
    }

    pub(crate) fn emit_local_tee(&mut self, local_index: u32) {
        let value = self.peek(0);
        self.store_to_local(local_index, value);
    }

    fn store_to_local(&mut self, local_index: u32, value: ValueId) {
        let pointer = self.local_pointers[local_index as usize];
        let local_type = self.local_types[local_index as usize];
        // Vector values may arrive in any 128-bit shape.
        let value = self.builder.bitcast(value, ir_type(local_type));
        self.builder
            .store(pointer, value, local_type.byte_width(), false, None);
    }

    /// Address of a mutable global's storage: context.globalData + offset.
    fn mutable_global_pointer(&mut self, global_index: u32) -> ValueId {
        let binding = self.instance.globals[global_index as usize];
        let context = self.load_context_pointer();
        let offset = self
            .builder
            .const_i64(CONTEXT_GLOBAL_DATA_OFFSET as u64 + binding.mutable_data_offset as u64);
        self.builder.ptr_offset(context, offset)
    }

    pub(crate) fn emit_global_get(&mut self, global_index: u32) {
        let global = &self.module.globals[global_index as usize];
        let binding = self.instance.globals[global_index as usize];
        let value_type = global.global_type.value_type;

        let value = if global.global_type.mutable {
            let pointer = self.mutable_global_pointer(global_index);
            self.builder
                .load(pointer, ir_type(value_type), value_type.byte_width(), false, None)
        } else if value_type.byte_width() > 8 {
            // Wider than a pointer: load from the initial-value storage.
            let pointer = self.builder.const_ptr(binding.initial_value_address);
            self.builder
                .load(pointer, ir_type(value_type), value_type.byte_width(), false, None)
        } else {
            emit_literal(&mut self.builder, binding.initial_value)
        };
        self.push(value);
    }

    pub(crate) fn emit_global_set(&mut self, global_index: u32) {
        let global = &self.module.globals[global_index as usize];
        assert!(global.global_type.mutable, "global.set of an immutable global");
        let value_type = global.global_type.value_type;

        let pointer = self.mutable_global_pointer(global_index);
        let value = self.pop();
        let value = self.builder.bitcast(value, ir_type(value_type));
        self.builder
            .store(pointer, value, value_type.byte_width(), false, None);
    }
}

#[cfg(test)]
mod tests {
    use crate::emit::test_utils::{emit_with_module, module_with_single_function};
    use crate::instruction::Instruction::*;
    use crate::module::{Const, GlobalDef, GlobalType, ValueType};

    #[test]
    fn immutable_pointer_sized_global_is_inlined() {
        let mut module = module_with_single_function(
            &[],
            &[ValueType::I32],
            &[],
            vec![GlobalGet { global_index: 0 }, End],
        );
        module.globals.push(GlobalDef {
            global_type: GlobalType {
                value_type: ValueType::I32,
                mutable: false,
            },
            initial_value: Const::I32(7),
        });

        let ir = emit_with_module(&module);
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        // No load of global storage: the constant feeds the return phi.
        assert!(text.contains("i32 7"));
    }

    #[test]
    fn mutable_global_set_stores_through_the_context() {
        let mut module = module_with_single_function(
            &[ValueType::I64],
            &[],
            &[],
            vec![
                LocalGet { local_index: 0 },
                GlobalSet { global_index: 0 },
                End,
            ],
        );
        module.globals.push(GlobalDef {
            global_type: GlobalType {
                value_type: ValueType::I64,
                mutable: true,
            },
            initial_value: Const::I64(0),
        });

        let ir = emit_with_module(&module);
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        assert!(text.contains("ptroffset"));
        assert!(text.contains("store"));
    }

    #[test]
    fn local_tee_keeps_the_value_on_the_stack() {
        let ir = emit_with_module(&module_with_single_function(
            &[ValueType::I32],
            &[ValueType::I32],
            &[ValueType::I32],
            vec![
                LocalGet { local_index: 0 },
                LocalTee { local_index: 1 },
                End,
            ],
        ));
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        // The teed value both stores to the slot and feeds the return.
        let text = function.to_string();
        assert!(text.contains("store"));
        assert!(text.contains("ret"));
    }
}
