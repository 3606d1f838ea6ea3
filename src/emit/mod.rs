//! Backend IR emission
//!
//! The module emitter declares one backend function per WebAssembly
//! function definition, attaches the exception personality routine, runs
//! the per-function translator over every definition, and finalizes debug
//! info. A failure inside one function is fatal for the whole module;
//! there is no per-function recovery.

mod atomics;
mod call;
mod control;
mod dispatch;
mod exceptions;
mod function;
mod memory;
mod numeric;
mod simd;
mod types;
mod variable;

#[cfg(test)]
pub(crate) mod test_utils;

pub use exceptions::EhModel;

use crate::instance::ModuleInstance;
use crate::ir::{Builder, CallConv, FuncId, IrModule, IrType, Linkage, Signature};
use crate::module::{FunctionType, Module};
use function::FunctionEmitter;
use thiserror::Error;
use types::signature_for;

/// Errors surfaced by module emission. Guest-visible traps are not
/// errors: they are emitted into the code. These are binding problems the
/// caller must fix.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("unresolved runtime intrinsic: {name}")]
    UnresolvedIntrinsic { name: String },
    #[error("runtime intrinsic {name} resolved with type {found}, expected {expected}")]
    IntrinsicTypeMismatch {
        name: String,
        expected: FunctionType,
        found: FunctionType,
    },
    #[error("module instance does not cover the module: {0}")]
    IncompleteInstance(String),
}

/// Options for one emission run.
#[derive(Debug, Clone, Copy)]
pub struct EmitOptions {
    /// Which exception ABI to lower `try`/`catch`/`throw` for. Defaults
    /// to the build target's model.
    pub eh_model: EhModel,
    /// Emit `debugEnterFunction`/`debugExitFunction` hook calls around
    /// every function body.
    pub function_enter_exit_hooks: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            eh_model: EhModel::host_default(),
            function_enter_exit_hooks: false,
        }
    }
}

pub(crate) struct ModuleEmitter<'m> {
    pub module: &'m Module,
    pub instance: &'m ModuleInstance,
    pub options: EmitOptions,
    pub ir: IrModule,
    /// The host's exception personality routine; every emitted function
    /// names it.
    pub personality: FuncId,
    /// `__cxa_begin_catch`, declared only under the landing-pad model.
    pub cxa_begin_catch: Option<FuncId>,
    /// Declared IR function per definition index.
    pub function_ids: Vec<FuncId>,
    pub try_prologue_dummy: Option<FuncId>,
    pub seh_filter_count: usize,
}

/// Translate a validated module under its instance binding into a backend
/// IR module, ready for optimization and native code emission.
pub fn emit_module(
    module: &Module,
    instance: &ModuleInstance,
    options: EmitOptions,
) -> Result<IrModule, EmitError> {
    if instance.functions.len() < module.function_count() {
        return Err(EmitError::IncompleteInstance(format!(
            "{} function bindings for {} functions",
            instance.functions.len(),
            module.function_count()
        )));
    }
    if instance.globals.len() < module.globals.len() {
        return Err(EmitError::IncompleteInstance(format!(
            "{} global bindings for {} globals",
            instance.globals.len(),
            module.globals.len()
        )));
    }
    if instance.exception_types.len() < module.exception_types.len() {
        return Err(EmitError::IncompleteInstance(format!(
            "{} exception type instances for {} exception types",
            instance.exception_types.len(),
            module.exception_types.len()
        )));
    }
    ModuleEmitter::new(module, instance, options).emit()
}

impl<'m> ModuleEmitter<'m> {
    fn new(module: &'m Module, instance: &'m ModuleInstance, options: EmitOptions) -> Self {
        let mut ir = IrModule::new();

        let personality = ir.declare_function(
            options.eh_model.personality_symbol(),
            Signature {
                params: vec![],
                results: vec![IrType::I32],
                call_conv: CallConv::C,
            },
            Linkage::External,
        );
        let cxa_begin_catch = (options.eh_model == EhModel::LandingPad).then(|| {
            ir.declare_function(
                "__cxa_begin_catch",
                Signature {
                    params: vec![IrType::Ptr],
                    results: vec![IrType::Ptr],
                    call_conv: CallConv::C,
                },
                Linkage::External,
            )
        });

        ModuleEmitter {
            module,
            instance,
            options,
            ir,
            personality,
            cxa_begin_catch,
            function_ids: Vec::new(),
            try_prologue_dummy: None,
            seh_filter_count: 0,
        }
    }

    fn emit(mut self) -> Result<IrModule, EmitError> {
        let started = std::time::Instant::now();

        // Declare every definition before emitting any body, so direct
        // calls can reference functions defined later.
        for def_index in 0..self.module.functions.len() {
            let function_type = self.module.def_type(def_index);
            let id = self.ir.declare_function(
                format!("wasmFunction{def_index}"),
                signature_for(function_type, CallConv::Wasm),
                Linkage::External,
            );
            self.ir.function_mut(id).personality = Some(self.personality);
            self.function_ids.push(id);
        }

        for def_index in 0..self.module.functions.len() {
            FunctionEmitter::new(&mut self, def_index).emit()?;
        }

        self.ir.finalize_debug_info();
        tracing::debug!(
            functions = self.module.functions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "emitted backend IR"
        );
        Ok(self.ir)
    }

    /// The no-op internal function every funclet-model try body calls so
    /// the frame-recover intrinsic has a call to anchor to.
    pub(crate) fn try_prologue_dummy(&mut self) -> FuncId {
        if let Some(id) = self.try_prologue_dummy {
            return id;
        }
        let mut builder = Builder::new(
            "__try_prologue",
            Signature {
                params: vec![],
                results: vec![],
                call_conv: CallConv::C,
            },
            Linkage::Internal,
        );
        let entry = builder.create_block("entry");
        builder.set_insertion_point(entry);
        builder.ret(vec![]);
        let id = self.ir.add_function(builder.into_function());
        self.try_prologue_dummy = Some(id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::{emit_single, module_with_single_function};
    use super::{emit_module, EmitError, EmitOptions};
    use crate::instance::{Compartment, ModuleInstance};
    use crate::instruction::Instruction::*;
    use crate::module::ValueType;

    #[test]
    fn every_function_gets_the_personality() {
        let ir = emit_single(&[], &[], &[], vec![End]);
        let id = ir.find_function("wasmFunction0").unwrap();
        let personality = ir.function(id).personality.unwrap();
        let name = &ir.function(personality).name;
        assert!(name == "__gxx_personality_v0" || name == "__C_specific_handler");
        assert!(ir.debug_info_finalized());
    }

    #[test]
    fn emission_fails_without_intrinsics() {
        let module = module_with_single_function(&[], &[], &[], vec![Unreachable, End]);
        let mut instance = ModuleInstance::for_module(&module);
        instance.compartment = Compartment::new();
        let error = emit_module(&module, &instance, EmitOptions::default()).unwrap_err();
        assert!(matches!(error, EmitError::UnresolvedIntrinsic { .. }));
    }

    #[test]
    fn emission_fails_on_an_incomplete_instance() {
        let module = module_with_single_function(&[], &[], &[], vec![End]);
        let mut instance = ModuleInstance::for_module(&module);
        instance.functions.clear();
        let error = emit_module(&module, &instance, EmitOptions::default()).unwrap_err();
        assert!(matches!(error, EmitError::IncompleteInstance(_)));
    }

    #[test]
    fn multiple_functions_emit_in_index_order() {
        let mut module = module_with_single_function(&[], &[], &[], vec![End]);
        let t = module.add_type(crate::module::FunctionType::new(vec![], vec![ValueType::I32]));
        module.functions.push(crate::module::FunctionDef {
            type_index: t,
            locals: vec![],
            code: vec![I32Const { value: 1 }, End],
            branch_tables: vec![],
        });
        let instance = ModuleInstance::for_module(&module);
        let ir = emit_module(&module, &instance, EmitOptions::default()).unwrap();
        assert_eq!(ir.defined_function_count(), 2);
        assert!(ir.find_function("wasmFunction0").is_some());
        assert!(ir.find_function("wasmFunction1").is_some());
    }
}
