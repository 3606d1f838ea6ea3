//! kiln -- the code generation core of a WebAssembly ahead-of-time compiler.
//!
//! kiln translates validated WebAssembly function bodies (a stack-based
//! bytecode) into an SSA backend IR that a downstream optimizer and native
//! code generator can lower to machine code. It is the middle of a larger
//! pipeline: an upstream decoder/validator produces the operator streams it
//! consumes, and a downstream backend consumes the IR module it produces.
//!
//! # Modules
//!
//! - [`module`] -- The validated-module input: value types, function types,
//!   function definitions, globals, exception types, memories, and tables.
//! - [`instruction`] -- The decoded operator stream with structured
//!   immediates (branch depths, block types, lane indices, memory args).
//! - [`instance`] -- The module-instance binding: resolved native function
//!   addresses, global data offsets, memory/table identities, and the
//!   compartment export that resolves runtime intrinsics by name.
//! - [`ir`] -- The backend IR: typed SSA values, basic blocks, phis, a
//!   builder, intrinsics, and both exception-handling instruction families.
//! - [`emit`] -- The translator itself: the module emitter and the
//!   per-function operand/control/branch-target stack machine.
//! - [`sexpr`] -- S-expression reader for the WebAssembly text format.
//!   Parsing is total: syntax errors become in-tree error nodes.
//!
//! # Example
//!
//! Emit backend IR for a function that adds its two parameters:
//!
//! ```
//! use kiln::emit::{emit_module, EmitOptions};
//! use kiln::instruction::Instruction;
//! use kiln::module::{FunctionDef, FunctionType, Module, ValueType};
//! use kiln::instance::ModuleInstance;
//!
//! let mut module = Module::new();
//! let type_index = module.add_type(FunctionType::new(
//!     vec![ValueType::I32, ValueType::I32],
//!     vec![ValueType::I32],
//! ));
//! module.functions.push(FunctionDef {
//!     type_index,
//!     locals: vec![],
//!     code: vec![
//!         Instruction::LocalGet { local_index: 0 },
//!         Instruction::LocalGet { local_index: 1 },
//!         Instruction::I32Add,
//!         Instruction::End,
//!     ],
//!     branch_tables: vec![],
//! });
//!
//! let instance = ModuleInstance::for_module(&module);
//! let ir = emit_module(&module, &instance, EmitOptions::default()).unwrap();
//! assert_eq!(ir.defined_function_count(), 1);
//! ```

pub mod emit;
pub mod instance;
pub mod instruction;
pub mod ir;
pub mod module;
pub mod sexpr;
