//! Module instance binding
//!
//! The translator reads everything it needs to know about the *runtime*
//! shape of a module from here: resolved native function addresses and
//! calling conventions, per-global mutable-data offsets, the default
//! memory and table identities, exception-type instances, and the
//! compartment whose intrinsics export resolves runtime routines by name.
//!
//! This module also pins the two wire-visible layouts shared with the
//! runtime: the context structure reachable from every emitted function's
//! first argument, and the exception data record passed between `throw`
//! sites, the unwinder, and catch handlers.

use crate::ir::CallConv;
use crate::module::{Const, FunctionType, Module, ValueType};
use std::collections::HashMap;

/// Byte offset of the linear-memory base pointer in the context structure.
pub const CONTEXT_MEMORY_BASE_OFFSET: u32 = 0;
/// Byte offset of the table base pointer in the context structure.
pub const CONTEXT_TABLE_BASE_OFFSET: u32 = 8;
/// Byte offset of the mutable-global data area in the context structure.
pub const CONTEXT_GLOBAL_DATA_OFFSET: u32 = 16;

/// Byte offset of the type-instance id in the exception data record.
pub const EXCEPTION_TYPE_INSTANCE_OFFSET: u32 = 0;
/// Byte offset of the user-exception flag byte in the exception data record.
pub const EXCEPTION_IS_USER_OFFSET: u32 = 8;
/// Byte offset of the argument vector in the exception data record.
pub const EXCEPTION_ARGUMENTS_OFFSET: u32 = 16;
/// Size of one untagged argument slot in the exception data record.
pub const EXCEPTION_ARGUMENT_SIZE: u32 = 8;

/// The OS exception code the runtime raises WebAssembly exceptions with on
/// the funclet ABI. SEH filter functions reject any other code.
pub const SEH_WASM_EXCEPTION_CODE: u32 = 0xE057_4153;

/// Size of one `(type_token, function_pointer)` table element.
pub const TABLE_ELEMENT_SIZE: u32 = 16;
/// Byte offset of the type token within a table element.
pub const TABLE_ELEMENT_TYPE_OFFSET: u32 = 0;
/// Byte offset of the function pointer within a table element.
pub const TABLE_ELEMENT_FUNCTION_OFFSET: u32 = 8;

/// Resolved binding for one function in the module's index space.
#[derive(Debug, Clone, Copy)]
pub struct FunctionBinding {
    pub native_address: u64,
    pub calling_convention: CallConv,
}

/// Resolved binding for one global.
#[derive(Debug, Clone, Copy)]
pub struct GlobalBinding {
    /// Offset of the global's storage from the context's global data area.
    /// Meaningful only for mutable globals.
    pub mutable_data_offset: u32,
    pub initial_value: Const,
    /// Address of the initial-value storage, used for immutable globals
    /// wider than a pointer.
    pub initial_value_address: u64,
}

/// A runtime exception-type instance: the process-wide identity the
/// emitted code embeds in throw sites and catch comparisons.
#[derive(Debug, Clone)]
pub struct ExceptionTypeInstance {
    pub id: u64,
    pub params: Vec<ValueType>,
}

/// One resolved runtime intrinsic.
#[derive(Debug, Clone)]
pub struct IntrinsicImport {
    pub native_address: u64,
    pub ty: FunctionType,
    pub calling_convention: CallConv,
}

/// The compartment's intrinsics export: resolves runtime routine names to
/// native functions. The translator asserts the resolved type matches the
/// type it emits calls with.
#[derive(Debug, Clone, Default)]
pub struct Compartment {
    intrinsics: HashMap<String, IntrinsicImport>,
    /// The platform's user-exception type info pointer, installed in
    /// landing pad clauses on the Itanium ABI.
    pub user_exception_type_info: u64,
}

impl Compartment {
    pub fn new() -> Compartment {
        Compartment::default()
    }

    pub fn register(&mut self, name: &str, intrinsic: IntrinsicImport) {
        self.intrinsics.insert(name.to_string(), intrinsic);
    }

    pub fn resolve(&self, name: &str) -> Option<&IntrinsicImport> {
        self.intrinsics.get(name)
    }

    /// A compartment with the full runtime intrinsic set registered at
    /// synthetic consecutive addresses starting at `base_address`.
    pub fn with_runtime_intrinsics(base_address: u64) -> Compartment {
        let mut compartment = Compartment::new();
        for (index, (name, ty)) in runtime_intrinsic_signatures().into_iter().enumerate() {
            compartment.register(
                name,
                IntrinsicImport {
                    native_address: base_address + index as u64 * 0x10,
                    ty,
                    calling_convention: CallConv::Intrinsic,
                },
            );
        }
        compartment.user_exception_type_info = base_address + 0x1000;
        compartment
    }
}

/// The runtime intrinsic names the translator emits calls to, with the
/// signatures both sides must agree on.
pub fn runtime_intrinsic_signatures() -> Vec<(&'static str, FunctionType)> {
    use ValueType::{F32, F64, I32, I64};
    let ft = FunctionType::new;
    vec![
        ("unreachableTrap", ft(vec![], vec![])),
        ("divideByZeroOrIntegerOverflowTrap", ft(vec![], vec![])),
        ("invalidFloatOperationTrap", ft(vec![], vec![])),
        ("indirectCallSignatureMismatch", ft(vec![I32, I64], vec![])),
        ("misalignedAtomicTrap", ft(vec![I32], vec![])),
        ("growMemory", ft(vec![I32, I64], vec![I32])),
        ("currentMemory", ft(vec![I64], vec![I32])),
        ("f32.min", ft(vec![F32, F32], vec![F32])),
        ("f32.max", ft(vec![F32, F32], vec![F32])),
        ("f32.ceil", ft(vec![F32], vec![F32])),
        ("f32.floor", ft(vec![F32], vec![F32])),
        ("f32.trunc", ft(vec![F32], vec![F32])),
        ("f32.nearest", ft(vec![F32], vec![F32])),
        ("f64.min", ft(vec![F64, F64], vec![F64])),
        ("f64.max", ft(vec![F64, F64], vec![F64])),
        ("f64.ceil", ft(vec![F64], vec![F64])),
        ("f64.floor", ft(vec![F64], vec![F64])),
        ("f64.trunc", ft(vec![F64], vec![F64])),
        ("f64.nearest", ft(vec![F64], vec![F64])),
        ("atomic_wake", ft(vec![I32, I32, I64], vec![I32])),
        ("atomic_wait_i32", ft(vec![I32, I32, F64, I64], vec![I32])),
        ("atomic_wait_i64", ft(vec![I32, I64, F64, I64], vec![I32])),
        ("throwException", ft(vec![I64, I64, I32], vec![])),
        ("debugEnterFunction", ft(vec![I64], vec![])),
        ("debugExitFunction", ft(vec![I64], vec![])),
    ]
}

/// The resolved runtime addresses for one instantiation of a module.
#[derive(Debug, Clone)]
pub struct ModuleInstance {
    /// One binding per entry in the function index space (imports first).
    pub functions: Vec<FunctionBinding>,
    pub globals: Vec<GlobalBinding>,
    pub exception_types: Vec<ExceptionTypeInstance>,
    pub default_memory_id: u64,
    pub default_table_id: u64,
    pub compartment: Compartment,
}

impl ModuleInstance {
    /// Build a synthetic instance for `module`, with every function bound
    /// to a distinct fake native address, globals laid out sequentially in
    /// the context's global data area, and the full runtime intrinsic set
    /// registered. Useful for tests and for emitting a module without a
    /// live runtime.
    pub fn for_module(module: &Module) -> ModuleInstance {
        let functions = (0..module.function_count())
            .map(|index| FunctionBinding {
                native_address: 0x10_0000 + index as u64 * 0x100,
                calling_convention: CallConv::Wasm,
            })
            .collect();

        let mut offset = 0;
        let globals = module
            .globals
            .iter()
            .enumerate()
            .map(|(index, global)| {
                let binding = GlobalBinding {
                    mutable_data_offset: offset,
                    initial_value: global.initial_value,
                    initial_value_address: 0x20_0000 + index as u64 * 0x10,
                };
                offset += global.global_type.value_type.byte_width().max(8);
                binding
            })
            .collect();

        let exception_types = module
            .exception_types
            .iter()
            .enumerate()
            .map(|(index, def)| ExceptionTypeInstance {
                id: 0x30_0000 + index as u64,
                params: def.params.clone(),
            })
            .collect();

        ModuleInstance {
            functions,
            globals,
            exception_types,
            default_memory_id: 0,
            default_table_id: 0,
            compartment: Compartment::with_runtime_intrinsics(0x40_0000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{FunctionDef, GlobalDef, GlobalType};

    #[test]
    fn compartment_resolves_registered_intrinsics() {
        let compartment = Compartment::with_runtime_intrinsics(0x1000);
        let grow = compartment.resolve("growMemory").unwrap();
        assert_eq!(grow.ty.params, vec![ValueType::I32, ValueType::I64]);
        assert_eq!(grow.ty.results, vec![ValueType::I32]);
        assert!(compartment.resolve("nonsense").is_none());
    }

    #[test]
    fn synthetic_instance_covers_the_module() {
        let mut module = Module::new();
        let t = module.add_type(FunctionType::new(vec![], vec![]));
        module.functions.push(FunctionDef {
            type_index: t,
            locals: vec![],
            code: vec![],
            branch_tables: vec![],
        });
        module.globals.push(GlobalDef {
            global_type: GlobalType {
                value_type: ValueType::I64,
                mutable: true,
            },
            initial_value: Const::I64(3),
        });
        module.globals.push(GlobalDef {
            global_type: GlobalType {
                value_type: ValueType::I32,
                mutable: true,
            },
            initial_value: Const::I32(4),
        });

        let instance = ModuleInstance::for_module(&module);
        assert_eq!(instance.functions.len(), 1);
        assert_eq!(instance.globals.len(), 2);
        // Globals are laid out without overlap.
        assert_ne!(
            instance.globals[0].mutable_data_offset,
            instance.globals[1].mutable_data_offset
        );
        assert!(instance.compartment.resolve("throwException").is_some());
    }
}
