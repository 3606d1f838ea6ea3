//! Test helpers for emission tests
//!
//! Builds small modules with synthetic instance bindings and runs them
//! through the module emitter, so per-operator tests can inspect the
//! produced IR without ceremony.

use super::{emit_module, EmitOptions};
use crate::instance::ModuleInstance;
use crate::instruction::Instruction;
use crate::ir::IrModule;
use crate::module::{FunctionDef, FunctionType, Module, ValueType};

/// A module containing one function with the given signature, extra
/// locals, and body.
pub(crate) fn module_with_single_function(
    params: &[ValueType],
    results: &[ValueType],
    extra_locals: &[ValueType],
    code: Vec<Instruction>,
) -> Module {
    let mut module = Module::new();
    let type_index = module.add_type(FunctionType::new(params.to_vec(), results.to_vec()));
    module.functions.push(FunctionDef {
        type_index,
        locals: extra_locals.to_vec(),
        code,
        branch_tables: vec![],
    });
    module
}

pub(crate) fn emit_with_module(module: &Module) -> IrModule {
    emit_with_module_and_options(module, EmitOptions::default())
}

pub(crate) fn emit_with_module_and_options(module: &Module, options: EmitOptions) -> IrModule {
    let instance = ModuleInstance::for_module(module);
    emit_module(module, &instance, options).expect("emission failed")
}

/// Emit one function and return the produced IR module.
pub(crate) fn emit_single(
    params: &[ValueType],
    results: &[ValueType],
    extra_locals: &[ValueType],
    code: Vec<Instruction>,
) -> IrModule {
    emit_with_module(&module_with_single_function(params, results, extra_locals, code))
}

/// Like [`emit_single`], with branch tables for `br_table` bodies.
pub(crate) fn emit_single_with_tables(
    params: &[ValueType],
    results: &[ValueType],
    extra_locals: &[ValueType],
    branch_tables: Vec<Vec<u32>>,
    code: Vec<Instruction>,
) -> IrModule {
    let mut module = module_with_single_function(params, results, extra_locals, code);
    module.functions[0].branch_tables = branch_tables;
    emit_with_module(&module)
}
