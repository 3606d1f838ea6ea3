//! Textual rendering of backend IR
//!
//! Prints modules and functions in an LLVM-flavoured text form. The output
//! is for humans: the `kiln` CLI and failing-test diagnostics. Nothing
//! parses it back.

use super::function::{ConstValue, IrFunction, Linkage, ValueDef, ValueId};
use super::instr::{
    BinOp, BranchHint, Callee, CastOp, FCmpPred, ICmpPred, Instr, RmwOp, Terminator, UnOp,
};
use super::module::IrModule;
use std::fmt;

fn bin_op_name(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::Sub => "sub",
        BinOp::Mul => "mul",
        BinOp::SDiv => "sdiv",
        BinOp::UDiv => "udiv",
        BinOp::SRem => "srem",
        BinOp::URem => "urem",
        BinOp::And => "and",
        BinOp::Or => "or",
        BinOp::Xor => "xor",
        BinOp::Shl => "shl",
        BinOp::LShr => "lshr",
        BinOp::AShr => "ashr",
        BinOp::FAdd => "fadd",
        BinOp::FSub => "fsub",
        BinOp::FMul => "fmul",
        BinOp::FDiv => "fdiv",
    }
}

fn un_op_name(op: UnOp) -> &'static str {
    match op {
        UnOp::FNeg => "fneg",
        UnOp::Neg => "neg",
        UnOp::Not => "not",
    }
}

fn icmp_pred_name(pred: ICmpPred) -> &'static str {
    match pred {
        ICmpPred::Eq => "eq",
        ICmpPred::Ne => "ne",
        ICmpPred::SLt => "slt",
        ICmpPred::ULt => "ult",
        ICmpPred::SLe => "sle",
        ICmpPred::ULe => "ule",
        ICmpPred::SGt => "sgt",
        ICmpPred::UGt => "ugt",
        ICmpPred::SGe => "sge",
        ICmpPred::UGe => "uge",
    }
}

fn fcmp_pred_name(pred: FCmpPred) -> &'static str {
    match pred {
        FCmpPred::OEq => "oeq",
        FCmpPred::UNe => "une",
        FCmpPred::OLt => "olt",
        FCmpPred::OLe => "ole",
        FCmpPred::OGt => "ogt",
        FCmpPred::OGe => "oge",
        FCmpPred::Uno => "uno",
    }
}

fn cast_op_name(op: CastOp) -> &'static str {
    match op {
        CastOp::Trunc => "trunc",
        CastOp::ZExt => "zext",
        CastOp::SExt => "sext",
        CastOp::FpTrunc => "fptrunc",
        CastOp::FpExt => "fpext",
        CastOp::SiToFp => "sitofp",
        CastOp::UiToFp => "uitofp",
        CastOp::FpToSi => "fptosi",
        CastOp::FpToUi => "fptoui",
        CastOp::Bitcast => "bitcast",
        CastOp::PtrToInt => "ptrtoint",
        CastOp::IntToPtr => "inttoptr",
    }
}

fn rmw_op_name(op: RmwOp) -> &'static str {
    match op {
        RmwOp::Xchg => "xchg",
        RmwOp::Add => "add",
        RmwOp::Sub => "sub",
        RmwOp::And => "and",
        RmwOp::Or => "or",
        RmwOp::Xor => "xor",
    }
}

struct Printer<'a> {
    function: &'a IrFunction,
    module: Option<&'a IrModule>,
}

impl<'a> Printer<'a> {
    fn label(&self, block: super::function::BlockId) -> String {
        format!("{}.{}", self.function.block(block).name, block.index())
    }

    fn func_name(&self, id: super::module::FuncId) -> String {
        match self.module {
            Some(module) => format!("@{}", module.function(id).name),
            None => format!("@fn{}", id.index()),
        }
    }

    fn callee(&self, callee: Callee) -> String {
        match callee {
            Callee::Function(id) => self.func_name(id),
            Callee::Pointer(value) => self.operand(value),
        }
    }

    fn operand(&self, id: ValueId) -> String {
        let data = self.function.value(id);
        match &data.def {
            ValueDef::Const(constant) => match constant {
                ConstValue::I1(v) => format!("i1 {v}"),
                ConstValue::I8(v) => format!("i8 {v}"),
                ConstValue::I16(v) => format!("i16 {v}"),
                ConstValue::I32(v) => format!("i32 {v}"),
                ConstValue::I64(v) => format!("i64 {v}"),
                ConstValue::F32(v) => format!("f32 {v}"),
                ConstValue::F64(v) => format!("f64 {v}"),
                ConstValue::V128 { low, high } => format!("v128 (0x{low:x}, 0x{high:x})"),
                ConstValue::Ptr(address) => format!("ptr 0x{address:x}"),
                ConstValue::Func(id) => format!("ptr {}", self.func_name(*id)),
                ConstValue::Zero => format!("{} zeroinitializer", data.ty),
            },
            _ => format!("{id}"),
        }
    }

    fn write_inst(&self, f: &mut fmt::Formatter<'_>, id: ValueId) -> fmt::Result {
        let data = self.function.value(id);
        write!(f, "  ")?;
        match &data.def {
            ValueDef::Inst(instr) => match instr {
                Instr::Phi { incomings } => {
                    write!(f, "{id} = phi {}", data.ty)?;
                    for (index, (block, value)) in incomings.iter().enumerate() {
                        if index > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, " [ {}, {} ]", self.operand(*value), self.label(*block))?;
                    }
                    Ok(())
                }
                Instr::Binary { op, lhs, rhs } => write!(
                    f,
                    "{id} = {} {} {}, {}",
                    bin_op_name(*op),
                    data.ty,
                    self.operand(*lhs),
                    self.operand(*rhs)
                ),
                Instr::Unary { op, value } => {
                    write!(f, "{id} = {} {}", un_op_name(*op), self.operand(*value))
                }
                Instr::ICmp { pred, lhs, rhs } => write!(
                    f,
                    "{id} = icmp {} {}, {}",
                    icmp_pred_name(*pred),
                    self.operand(*lhs),
                    self.operand(*rhs)
                ),
                Instr::FCmp { pred, lhs, rhs } => write!(
                    f,
                    "{id} = fcmp {} {}, {}",
                    fcmp_pred_name(*pred),
                    self.operand(*lhs),
                    self.operand(*rhs)
                ),
                Instr::Select {
                    condition,
                    on_true,
                    on_false,
                } => write!(
                    f,
                    "{id} = select {}, {}, {}",
                    self.operand(*condition),
                    self.operand(*on_true),
                    self.operand(*on_false)
                ),
                Instr::Cast { op, value } => write!(
                    f,
                    "{id} = {} {} to {}",
                    cast_op_name(*op),
                    self.operand(*value),
                    data.ty
                ),
                Instr::Alloca { allocated, count } => {
                    write!(f, "{id} = alloca {allocated}")?;
                    if let Some(count) = count {
                        write!(f, ", count {}", self.operand(*count))?;
                    }
                    if let Some(name) = &data.name {
                        write!(f, " ; {name}")?;
                    }
                    Ok(())
                }
                Instr::Load {
                    pointer,
                    align,
                    volatile,
                    ordering,
                } => {
                    write!(f, "{id} = load {}, {}, align {align}", data.ty, self.operand(*pointer))?;
                    if *volatile {
                        write!(f, ", volatile")?;
                    }
                    if ordering.is_some() {
                        write!(f, ", seq_cst")?;
                    }
                    Ok(())
                }
                Instr::Store {
                    pointer,
                    value,
                    align,
                    volatile,
                    ordering,
                } => {
                    write!(f, "store {}, {}, align {align}", self.operand(*value), self.operand(*pointer))?;
                    if *volatile {
                        write!(f, ", volatile")?;
                    }
                    if ordering.is_some() {
                        write!(f, ", seq_cst")?;
                    }
                    Ok(())
                }
                Instr::PtrOffset { pointer, offset } => write!(
                    f,
                    "{id} = ptroffset {}, {}",
                    self.operand(*pointer),
                    self.operand(*offset)
                ),
                Instr::Call {
                    callee,
                    args,
                    conv,
                    results,
                } => {
                    write!(f, "{id} = call {conv} {}(", self.callee(*callee))?;
                    for (index, arg) in args.iter().enumerate() {
                        if index > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", self.operand(*arg))?;
                    }
                    write!(f, ") -> (")?;
                    for (index, ty) in results.iter().enumerate() {
                        if index > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{ty}")?;
                    }
                    write!(f, ")")
                }
                Instr::Intrinsic {
                    intrinsic,
                    args,
                    constraints,
                } => {
                    write!(f, "{id} = intrinsic {intrinsic}(")?;
                    for (index, arg) in args.iter().enumerate() {
                        if index > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", self.operand(*arg))?;
                    }
                    write!(f, ")")?;
                    if constraints.is_some() {
                        write!(f, " [round.tonearest, fpexcept.strict]")?;
                    }
                    Ok(())
                }
                Instr::AtomicRmw {
                    op,
                    pointer,
                    value,
                    volatile,
                    ..
                } => {
                    write!(
                        f,
                        "{id} = atomicrmw {} {}, {} seq_cst",
                        rmw_op_name(*op),
                        self.operand(*pointer),
                        self.operand(*value)
                    )?;
                    if *volatile {
                        write!(f, " volatile")?;
                    }
                    Ok(())
                }
                Instr::AtomicCmpxchg {
                    pointer,
                    expected,
                    replacement,
                    volatile,
                    ..
                } => {
                    write!(
                        f,
                        "{id} = cmpxchg {}, {}, {} seq_cst",
                        self.operand(*pointer),
                        self.operand(*expected),
                        self.operand(*replacement)
                    )?;
                    if *volatile {
                        write!(f, " volatile")?;
                    }
                    Ok(())
                }
                Instr::Splat { value } => {
                    write!(f, "{id} = splat {} to {}", self.operand(*value), data.ty)
                }
                Instr::ExtractLane { vector, lane } => {
                    write!(f, "{id} = extractlane {}, {lane}", self.operand(*vector))
                }
                Instr::ReplaceLane { vector, value, lane } => write!(
                    f,
                    "{id} = replacelane {}, {}, {lane}",
                    self.operand(*vector),
                    self.operand(*value)
                ),
                Instr::Shuffle { left, right, mask } => write!(
                    f,
                    "{id} = shuffle {}, {}, {mask:?}",
                    self.operand(*left),
                    self.operand(*right)
                ),
                Instr::LandingPad { clauses } => {
                    write!(f, "{id} = landingpad")?;
                    for clause in clauses {
                        write!(f, " catch {}", self.operand(*clause))?;
                    }
                    Ok(())
                }
                Instr::CatchPad { catch_switch, filter } => write!(
                    f,
                    "{id} = catchpad within {} filter {}",
                    self.label(*catch_switch),
                    self.func_name(*filter)
                ),
            },
            ValueDef::CallResult { call, index } => {
                write!(f, "{id} = result {index} of {call}")
            }
            ValueDef::InvokeResult { block, index } => {
                write!(f, "{id} = invoke-result {index} of {}", self.label(*block))
            }
            other => write!(f, "{id} = <{other:?}>"),
        }
    }

    fn write_terminator(&self, f: &mut fmt::Formatter<'_>, terminator: &Terminator) -> fmt::Result {
        write!(f, "  ")?;
        match terminator {
            Terminator::Br { dest } => write!(f, "br {}", self.label(*dest)),
            Terminator::CondBr {
                condition,
                on_true,
                on_false,
                hint,
            } => {
                write!(
                    f,
                    "br {}, {}, {}",
                    self.operand(*condition),
                    self.label(*on_true),
                    self.label(*on_false)
                )?;
                match hint {
                    Some(BranchHint::LikelyTrue) => write!(f, " !likely_true"),
                    Some(BranchHint::LikelyFalse) => write!(f, " !likely_false"),
                    None => Ok(()),
                }
            }
            Terminator::Switch { value, default, cases } => {
                write!(f, "switch {}, default {} [", self.operand(*value), self.label(*default))?;
                for (case, dest) in cases {
                    write!(f, " {case}: {}", self.label(*dest))?;
                }
                write!(f, " ]")
            }
            Terminator::Ret { values } => {
                if values.is_empty() {
                    write!(f, "ret void")
                } else {
                    write!(f, "ret")?;
                    for (index, value) in values.iter().enumerate() {
                        if index > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, " {}", self.operand(*value))?;
                    }
                    Ok(())
                }
            }
            Terminator::Unreachable => write!(f, "unreachable"),
            Terminator::Invoke {
                callee,
                args,
                conv,
                normal,
                unwind,
                ..
            } => {
                write!(f, "invoke {conv} {}(", self.callee(*callee))?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", self.operand(*arg))?;
                }
                write!(f, ") to {} unwind {}", self.label(*normal), self.label(*unwind))
            }
            Terminator::CatchSwitch { handlers } => {
                write!(f, "catchswitch within none [")?;
                for (index, handler) in handlers.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", self.label(*handler))?;
                }
                write!(f, " ] unwind to caller")
            }
            Terminator::CatchRet { pad, dest } => {
                write!(f, "catchret from {} to {}", self.operand(*pad), self.label(*dest))
            }
        }
    }

    fn write_function(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let function = self.function;
        let keyword = if function.is_declaration() { "declare" } else { "define" };
        let linkage = match function.linkage {
            Linkage::External => "",
            Linkage::Internal => "internal ",
        };
        write!(
            f,
            "{keyword} {linkage}{} @{}(",
            function.signature.call_conv, function.name
        )?;
        for (index, param) in function.signature.params.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param} %{}", function.arg(index).index())?;
        }
        write!(f, ") -> (")?;
        for (index, result) in function.signature.results.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{result}")?;
        }
        write!(f, ")")?;
        if let Some(personality) = function.personality {
            write!(f, " personality {}", self.func_name(personality))?;
        }
        if function.is_declaration() {
            return writeln!(f);
        }
        writeln!(f, " {{")?;
        for &block_id in function.layout() {
            let block = function.block(block_id);
            writeln!(f, "{}:", self.label(block_id))?;
            for &phi in &block.phis {
                self.write_inst(f, phi)?;
                writeln!(f)?;
            }
            for &inst in &block.insts {
                self.write_inst(f, inst)?;
                writeln!(f)?;
            }
            if let Some(terminator) = &block.terminator {
                self.write_terminator(f, terminator)?;
                writeln!(f)?;
            }
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer {
            function: self,
            module: None,
        }
        .write_function(f)
    }
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (_, function)) in self.functions().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            Printer {
                function,
                module: Some(self),
            }
            .write_function(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::builder::Builder;
    use super::super::function::{Linkage, Signature};
    use super::super::instr::BinOp;
    use super::super::types::{CallConv, IrType};

    #[test]
    fn prints_a_simple_function() {
        let mut b = Builder::new(
            "add1",
            Signature {
                params: vec![IrType::Ptr, IrType::I32],
                results: vec![IrType::I32],
                call_conv: CallConv::Wasm,
            },
            Linkage::External,
        );
        let entry = b.create_block("entry");
        b.set_insertion_point(entry);
        let one = b.const_i32(1);
        let sum = b.binary(BinOp::Add, b.arg(1), one);
        b.ret(vec![sum]);

        let text = b.into_function().to_string();
        assert!(text.contains("define wasm @add1"));
        assert!(text.contains("entry.0:"));
        assert!(text.contains("add i32"));
        assert!(text.contains("ret"));
    }
}
