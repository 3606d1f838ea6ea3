//! Backend IR
//!
//! The SSA intermediate representation the translator targets: typed
//! values, basic blocks with phis, a builder with an insertion point,
//! backend intrinsics, and both exception-handling instruction families
//! (funclet catch-switch/catch-pad and Itanium landing pads). A
//! downstream optimizer and native code generator consume the
//! [`IrModule`] this crate produces; kiln itself never lowers further.

pub mod builder;
mod display;
pub mod function;
pub mod instr;
pub mod module;
pub mod types;

pub use builder::Builder;
pub use function::{
    Block, BlockId, ConstValue, IrFunction, Linkage, Signature, Subprogram, ValueData, ValueDef,
    ValueId,
};
pub use instr::{
    AtomicOrdering, BinOp, BranchHint, Callee, CastOp, FCmpPred, FpConstraints,
    FpExceptionBehavior, ICmpPred, Instr, Intrinsic, RmwOp, Rounding, Terminator, UnOp,
};
pub use module::{FuncId, IrModule};
pub use types::{CallConv, IrType};
