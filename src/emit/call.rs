//! Call operators
//!
//! Direct calls to imports go through the import's resolved native
//! pointer under its declared calling convention; same-module calls use
//! the declared IR function under the module convention. Indirect calls
//! load a `(type_token, function_pointer)` pair from the default table
//! and trap on a token mismatch before calling through the pointer.

use super::function::FunctionEmitter;
use super::EmitError;
use crate::instance::{TABLE_ELEMENT_FUNCTION_OFFSET, TABLE_ELEMENT_SIZE, TABLE_ELEMENT_TYPE_OFFSET};
use crate::ir::{BinOp, Callee, CallConv, CastOp, ICmpPred, IrType};
use crate::module::{FunctionType, ValueType};

impl FunctionEmitter<'_, '_> {
    pub(crate) fn emit_call(&mut self, function_index: u32) -> Result<(), EmitError> {
        // Map the callee to an imported function pointer or a function in
        // this module.
        let (callee, callee_type, conv) = if self.module.is_imported_function(function_index) {
            let binding = self.instance.functions[function_index as usize];
            let pointer = self.builder.const_ptr(binding.native_address);
            (
                Callee::Pointer(pointer),
                self.module.function_type(function_index).clone(),
                binding.calling_convention,
            )
        } else {
            let def_index = function_index as usize - self.module.function_imports.len();
            let func_id = self.emitter.function_ids[def_index];
            (
                Callee::Function(func_id),
                self.module.def_type(def_index).clone(),
                CallConv::Wasm,
            )
        };

        let args = self.pop_multiple(callee_type.params.len());
        let unwind = self.innermost_unwind_block();
        let results = self.emit_call_or_invoke(callee, args, &callee_type, conv, unwind);
        self.push_multiple(&results);
        Ok(())
    }

    pub(crate) fn emit_call_indirect(&mut self, type_index: u32) -> Result<(), EmitError> {
        assert!((type_index as usize) < self.module.types.len());
        let callee_type = self.module.types[type_index as usize].clone();

        let table_element_index = self.pop();
        let args = self.pop_multiple(callee_type.params.len());

        // Address of the table element: base + index * element size.
        let index = self.builder.cast(CastOp::ZExt, table_element_index, IrType::I64);
        let element_size = self.builder.const_i64(TABLE_ELEMENT_SIZE as u64);
        let element_offset = self.builder.binary(BinOp::Mul, index, element_size);
        let table_base = self.load_table_base();
        let element_pointer = self.builder.ptr_offset(table_base, element_offset);

        // Load the type token stored for this element and compare it to
        // the canonical encoding of the expected type.
        let type_slot_offset = self.builder.const_i64(TABLE_ELEMENT_TYPE_OFFSET as u64);
        let type_slot = self.builder.ptr_offset(element_pointer, type_slot_offset);
        let stored_token = self.builder.load(type_slot, IrType::I64, 8, false, None);
        let expected_token = self.builder.const_i64(callee_type.canonical_token().0);

        let mismatch = self.builder.icmp(ICmpPred::Ne, stored_token, expected_token);
        self.emit_conditional_trap_intrinsic(
            mismatch,
            "indirectCallSignatureMismatch",
            &FunctionType::new(vec![ValueType::I32, ValueType::I64], vec![]),
            vec![table_element_index, expected_token],
        )?;

        // Call through the function pointer stored next to the token.
        let function_slot_offset = self.builder.const_i64(TABLE_ELEMENT_FUNCTION_OFFSET as u64);
        let function_slot = self.builder.ptr_offset(element_pointer, function_slot_offset);
        let function_pointer = self.builder.load(function_slot, IrType::Ptr, 8, false, None);

        let unwind = self.innermost_unwind_block();
        let results = self.emit_call_or_invoke(
            Callee::Pointer(function_pointer),
            args,
            &callee_type,
            CallConv::Wasm,
            unwind,
        );
        self.push_multiple(&results);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::emit::test_utils::{emit_with_module, module_with_single_function};
    use crate::instruction::Instruction::*;
    use crate::module::{FunctionDef, FunctionImport, FunctionType, TableDef, Limits, ValueType};

    #[test]
    fn same_module_calls_use_the_declared_function() {
        let mut module = module_with_single_function(
            &[],
            &[ValueType::I32],
            &[],
            vec![Call { function_index: 1 }, End],
        );
        let callee_type = module.add_type(FunctionType::new(vec![], vec![ValueType::I32]));
        module.functions.push(FunctionDef {
            type_index: callee_type,
            locals: vec![],
            code: vec![I32Const { value: 3 }, End],
            branch_tables: vec![],
        });

        let ir = emit_with_module(&module);
        // Print with module context so callee names resolve.
        let text = ir.to_string();
        assert!(text.contains("call wasm @wasmFunction1"));
    }

    #[test]
    fn import_calls_go_through_the_native_pointer() {
        let mut module = module_with_single_function(
            &[],
            &[],
            &[],
            vec![Call { function_index: 0 }, End],
        );
        let import_type = module.add_type(FunctionType::new(vec![], vec![]));
        module.function_imports.push(FunctionImport {
            module: "env".to_string(),
            name: "host".to_string(),
            type_index: import_type,
        });

        let ir = emit_with_module(&module);
        let caller = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = caller.to_string();
        assert!(text.contains("call wasm ptr 0x"));
    }

    #[test]
    fn call_indirect_checks_the_type_token() {
        let mut module = module_with_single_function(
            &[ValueType::I32],
            &[ValueType::I32],
            &[],
            vec![
                LocalGet { local_index: 0 },
                CallIndirect {
                    type_index: 1,
                    table_index: 0,
                },
                End,
            ],
        );
        module.add_type(FunctionType::new(vec![], vec![ValueType::I32]));
        module.tables.push(TableDef {
            limits: Limits { min: 1, max: None },
        });

        let ir = emit_with_module(&module);
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        assert!(function.find_block("indirectCallSignatureMismatchTrap").is_some());
        assert!(function.find_block("indirectCallSignatureMismatchSkip").is_some());
        let text = function.to_string();
        // The table element is 16 bytes: token then function pointer.
        assert!(text.contains("i64 16"));
        assert!(text.contains("i64 8"));
    }
}
