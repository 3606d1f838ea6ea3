//! Backend IR instructions and terminators

use super::function::{BlockId, ValueId};
use super::module::FuncId;
use super::types::{CallConv, IrType};
use std::fmt;

/// Two-operand integer/float operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    And,
    Or,
    Xor,
    Shl,
    LShr,
    AShr,
    FAdd,
    FSub,
    FMul,
    FDiv,
}

/// One-operand operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// Float negation
    FNeg,
    /// Integer negation (0 - x), scalar or lane-wise
    Neg,
    /// Bitwise complement
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ICmpPred {
    Eq,
    Ne,
    SLt,
    ULt,
    SLe,
    ULe,
    SGt,
    UGt,
    SGe,
    UGe,
}

/// Float comparison predicates. All comparisons WebAssembly needs are the
/// ordered forms except `ne`, which is unordered-or-unequal, and `Uno`,
/// the is-NaN test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FCmpPred {
    OEq,
    UNe,
    OLt,
    OLe,
    OGt,
    OGe,
    Uno,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    Trunc,
    ZExt,
    SExt,
    FpTrunc,
    FpExt,
    SiToFp,
    UiToFp,
    FpToSi,
    FpToUi,
    Bitcast,
    PtrToInt,
    IntToPtr,
}

/// Memory ordering for atomic accesses. The translator only ever emits
/// sequentially consistent operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomicOrdering {
    SeqCst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RmwOp {
    Xchg,
    Add,
    Sub,
    And,
    Or,
    Xor,
}

/// Rounding mode attached to constrained float intrinsics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    #[default]
    ToNearestEven,
}

/// Exception behavior attached to constrained float intrinsics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FpExceptionBehavior {
    #[default]
    Strict,
}

/// The metadata pair that pins a constrained float operation: the backend
/// optimizer may not reassociate or constant-fold across these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FpConstraints {
    pub rounding: Rounding,
    pub exceptions: FpExceptionBehavior,
}

/// Backend intrinsics the translator calls.
///
/// Constrained variants carry an [`FpConstraints`] on the instruction.
/// `LocalEscape`/`LocalRecover`/`RecoverFramePointer` exist for the
/// funclet exception model's filter functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    Ctlz,
    Cttz,
    Ctpop,
    Fabs,
    Sqrt,
    Copysign,
    ConstrainedFAdd,
    ConstrainedFSub,
    ConstrainedFMul,
    ConstrainedFDiv,
    ConstrainedSqrt,
    ConstrainedFpExt,
    SatAddSigned,
    SatAddUnsigned,
    SatSubSigned,
    SatSubUnsigned,
    PlatformVectorMin,
    PlatformVectorMax,
    LocalEscape,
    LocalRecover,
    RecoverFramePointer,
}

impl Intrinsic {
    pub fn name(&self) -> &'static str {
        match self {
            Intrinsic::Ctlz => "ctlz",
            Intrinsic::Cttz => "cttz",
            Intrinsic::Ctpop => "ctpop",
            Intrinsic::Fabs => "fabs",
            Intrinsic::Sqrt => "sqrt",
            Intrinsic::Copysign => "copysign",
            Intrinsic::ConstrainedFAdd => "constrained.fadd",
            Intrinsic::ConstrainedFSub => "constrained.fsub",
            Intrinsic::ConstrainedFMul => "constrained.fmul",
            Intrinsic::ConstrainedFDiv => "constrained.fdiv",
            Intrinsic::ConstrainedSqrt => "constrained.sqrt",
            Intrinsic::ConstrainedFpExt => "constrained.fpext",
            Intrinsic::SatAddSigned => "sat.add.s",
            Intrinsic::SatAddUnsigned => "sat.add.u",
            Intrinsic::SatSubSigned => "sat.sub.s",
            Intrinsic::SatSubUnsigned => "sat.sub.u",
            Intrinsic::PlatformVectorMin => "vector.min",
            Intrinsic::PlatformVectorMax => "vector.max",
            Intrinsic::LocalEscape => "localescape",
            Intrinsic::LocalRecover => "localrecover",
            Intrinsic::RecoverFramePointer => "recoverfp",
        }
    }
}

impl fmt::Display for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What a call site calls: a module function or a computed pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee {
    Function(FuncId),
    Pointer(ValueId),
}

/// A non-terminator instruction.
///
/// The result type lives on the defining value, not here. Phi incoming
/// edges are appended after creation as branches are emitted; that
/// backpatching is the core of the stack-to-SSA discipline.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    Phi {
        incomings: Vec<(BlockId, ValueId)>,
    },
    Binary {
        op: BinOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    Unary {
        op: UnOp,
        value: ValueId,
    },
    ICmp {
        pred: ICmpPred,
        lhs: ValueId,
        rhs: ValueId,
    },
    FCmp {
        pred: FCmpPred,
        lhs: ValueId,
        rhs: ValueId,
    },
    Select {
        condition: ValueId,
        on_true: ValueId,
        on_false: ValueId,
    },
    Cast {
        op: CastOp,
        value: ValueId,
    },
    /// Stack slot in the function frame. `count` scales the allocation for
    /// byte buffers (the throw argument vector).
    Alloca {
        allocated: IrType,
        count: Option<ValueId>,
    },
    Load {
        pointer: ValueId,
        align: u32,
        volatile: bool,
        ordering: Option<AtomicOrdering>,
    },
    Store {
        pointer: ValueId,
        value: ValueId,
        align: u32,
        volatile: bool,
        ordering: Option<AtomicOrdering>,
    },
    /// In-bounds byte offset from a pointer.
    PtrOffset {
        pointer: ValueId,
        offset: ValueId,
    },
    Call {
        callee: Callee,
        args: Vec<ValueId>,
        conv: CallConv,
        results: Vec<IrType>,
    },
    Intrinsic {
        intrinsic: Intrinsic,
        args: Vec<ValueId>,
        constraints: Option<FpConstraints>,
    },
    AtomicRmw {
        op: RmwOp,
        pointer: ValueId,
        value: ValueId,
        ordering: AtomicOrdering,
        volatile: bool,
    },
    /// Compare-and-exchange; the result value is the previous memory value.
    AtomicCmpxchg {
        pointer: ValueId,
        expected: ValueId,
        replacement: ValueId,
        ordering: AtomicOrdering,
        volatile: bool,
    },
    /// Broadcast a scalar into every lane of the result vector type.
    Splat {
        value: ValueId,
    },
    ExtractLane {
        vector: ValueId,
        lane: u8,
    },
    ReplaceLane {
        vector: ValueId,
        value: ValueId,
        lane: u8,
    },
    Shuffle {
        left: ValueId,
        right: ValueId,
        mask: [u8; 16],
    },
    /// Itanium-model landing pad; the result is the raw exception object
    /// pointer. Clauses list the accepted type infos.
    LandingPad {
        clauses: Vec<ValueId>,
    },
    /// Funclet-model catch pad attached to the catch-switch terminator of
    /// `catch_switch`; the filter decides whether the pad handles the
    /// in-flight exception.
    CatchPad {
        catch_switch: BlockId,
        filter: FuncId,
    },
}

/// Static branch prediction hint carried on conditional branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchHint {
    LikelyTrue,
    LikelyFalse,
}

/// A block terminator.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Br {
        dest: BlockId,
    },
    CondBr {
        condition: ValueId,
        on_true: BlockId,
        on_false: BlockId,
        hint: Option<BranchHint>,
    },
    Switch {
        value: ValueId,
        default: BlockId,
        cases: Vec<(u64, BlockId)>,
    },
    Ret {
        values: Vec<ValueId>,
    },
    Unreachable,
    /// A call that may unwind: control resumes at `normal` or transfers to
    /// `unwind` (a landing pad or catch-switch block). `results` are the
    /// pre-created result values, live in the normal destination.
    Invoke {
        callee: Callee,
        args: Vec<ValueId>,
        conv: CallConv,
        results: Vec<ValueId>,
        normal: BlockId,
        unwind: BlockId,
    },
    /// Funclet-model dispatch terminator; handlers are tried in order.
    CatchSwitch {
        handlers: Vec<BlockId>,
    },
    /// Leave a catch funclet and resume at `dest`.
    CatchRet {
        pad: ValueId,
        dest: BlockId,
    },
}
