//! Per-operator dispatch
//!
//! One match arm per operator, delegating to the category emitters. The
//! grids (loads, stores, atomics, SIMD shapes) stay flat here on purpose:
//! each arm names its full lowering parameters, which is what you want in
//! front of you when chasing a miscompile in one opcode.

use super::function::FunctionEmitter;
use super::memory::MemConversion as MC;
use super::types::emit_literal;
use super::EmitError;
use crate::instruction::Instruction;
use crate::ir::{BinOp, CastOp, FCmpPred, ICmpPred, Intrinsic, IrType, RmwOp};
use crate::module::{Const, ValueType as VT};

impl FunctionEmitter<'_, '_> {
    pub(crate) fn emit_operator(&mut self, instruction: &Instruction) -> Result<(), EmitError> {
        use Instruction::*;
        match *instruction {
            // ==========================================================
            // Control
            // ==========================================================
            Unreachable => self.emit_unreachable_op()?,
            Nop => {}
            Block { block_type } => self.emit_block(block_type),
            Loop { block_type } => self.emit_loop(block_type),
            If { block_type } => self.emit_if(block_type),
            Else => self.emit_else()?,
            End => self.emit_end()?,
            Br { depth } => self.emit_br(depth),
            BrIf { depth } => self.emit_br_if(depth),
            BrTable {
                table_index,
                default_depth,
            } => self.emit_br_table(table_index, default_depth),
            Return => self.emit_return(),
            Call { function_index } => self.emit_call(function_index)?,
            CallIndirect { type_index, .. } => self.emit_call_indirect(type_index)?,

            // Exception handling
            Try { block_type } => self.emit_try(block_type)?,
            Catch { exception_type_index } => self.emit_catch(exception_type_index)?,
            CatchAll => self.emit_catch_all()?,
            Throw { exception_type_index } => self.emit_throw(exception_type_index)?,
            Rethrow { catch_depth } => self.emit_rethrow(catch_depth)?,

            // Parametric
            Drop => self.emit_drop(),
            Select => self.emit_select(),

            // Variables
            LocalGet { local_index } => self.emit_local_get(local_index),
            LocalSet { local_index } => self.emit_local_set(local_index),
            LocalTee { local_index } => self.emit_local_tee(local_index),
            GlobalGet { global_index } => self.emit_global_get(global_index),
            GlobalSet { global_index } => self.emit_global_set(global_index),

            // ==========================================================
            // Memory
            // ==========================================================
            I32Load { memarg } => self.emit_load(VT::I32, IrType::I32, memarg, MC::None),
            I64Load { memarg } => self.emit_load(VT::I64, IrType::I64, memarg, MC::None),
            F32Load { memarg } => self.emit_load(VT::F32, IrType::F32, memarg, MC::None),
            F64Load { memarg } => self.emit_load(VT::F64, IrType::F64, memarg, MC::None),
            I32Load8S { memarg } => self.emit_load(VT::I32, IrType::I8, memarg, MC::SExt),
            I32Load8U { memarg } => self.emit_load(VT::I32, IrType::I8, memarg, MC::ZExt),
            I32Load16S { memarg } => self.emit_load(VT::I32, IrType::I16, memarg, MC::SExt),
            I32Load16U { memarg } => self.emit_load(VT::I32, IrType::I16, memarg, MC::ZExt),
            I64Load8S { memarg } => self.emit_load(VT::I64, IrType::I8, memarg, MC::SExt),
            I64Load8U { memarg } => self.emit_load(VT::I64, IrType::I8, memarg, MC::ZExt),
            I64Load16S { memarg } => self.emit_load(VT::I64, IrType::I16, memarg, MC::SExt),
            I64Load16U { memarg } => self.emit_load(VT::I64, IrType::I16, memarg, MC::ZExt),
            I64Load32S { memarg } => self.emit_load(VT::I64, IrType::I32, memarg, MC::SExt),
            I64Load32U { memarg } => self.emit_load(VT::I64, IrType::I32, memarg, MC::ZExt),
            V128Load { memarg } => self.emit_load(VT::V128, IrType::I64X2, memarg, MC::None),

            I32Store { memarg } => self.emit_store(IrType::I32, memarg, MC::None),
            I64Store { memarg } => self.emit_store(IrType::I64, memarg, MC::None),
            F32Store { memarg } => self.emit_store(IrType::F32, memarg, MC::None),
            F64Store { memarg } => self.emit_store(IrType::F64, memarg, MC::None),
            I32Store8 { memarg } => self.emit_store(IrType::I8, memarg, MC::Trunc),
            I32Store16 { memarg } => self.emit_store(IrType::I16, memarg, MC::Trunc),
            I64Store8 { memarg } => self.emit_store(IrType::I8, memarg, MC::Trunc),
            I64Store16 { memarg } => self.emit_store(IrType::I16, memarg, MC::Trunc),
            I64Store32 { memarg } => self.emit_store(IrType::I32, memarg, MC::Trunc),
            V128Store { memarg } => self.emit_v128_store(memarg),

            MemorySize => self.emit_memory_size()?,
            MemoryGrow => self.emit_memory_grow()?,

            // ==========================================================
            // Constants
            // ==========================================================
            I32Const { value } => {
                let constant = self.builder.const_i32(value as u32);
                self.push(constant);
            }
            I64Const { value } => {
                let constant = self.builder.const_i64(value as u64);
                self.push(constant);
            }
            F32Const { value } => {
                let constant = self.builder.const_f32(value);
                self.push(constant);
            }
            F64Const { value } => {
                let constant = self.builder.const_f64(value);
                self.push(constant);
            }
            V128Const { bytes } => {
                let constant = emit_literal(&mut self.builder, Const::V128(bytes));
                self.push(constant);
            }

            // ==========================================================
            // Integer arithmetic and comparisons
            // ==========================================================
            I32Add | I64Add => self.emit_int_binary(BinOp::Add),
            I32Sub | I64Sub => self.emit_int_binary(BinOp::Sub),
            I32Mul | I64Mul => self.emit_int_binary(BinOp::Mul),
            I32And | I64And => self.emit_int_binary(BinOp::And),
            I32Or | I64Or => self.emit_int_binary(BinOp::Or),
            I32Xor | I64Xor => self.emit_int_binary(BinOp::Xor),

            I32DivS => self.emit_div_s(VT::I32)?,
            I64DivS => self.emit_div_s(VT::I64)?,
            I32DivU => self.emit_div_u(VT::I32)?,
            I64DivU => self.emit_div_u(VT::I64)?,
            I32RemS => self.emit_rem_s(VT::I32)?,
            I64RemS => self.emit_rem_s(VT::I64)?,
            I32RemU => self.emit_rem_u(VT::I32)?,
            I64RemU => self.emit_rem_u(VT::I64)?,

            I32Shl => self.emit_shift(VT::I32, BinOp::Shl),
            I64Shl => self.emit_shift(VT::I64, BinOp::Shl),
            I32ShrS => self.emit_shift(VT::I32, BinOp::AShr),
            I64ShrS => self.emit_shift(VT::I64, BinOp::AShr),
            I32ShrU => self.emit_shift(VT::I32, BinOp::LShr),
            I64ShrU => self.emit_shift(VT::I64, BinOp::LShr),
            I32Rotl => self.emit_rotate(VT::I32, true),
            I64Rotl => self.emit_rotate(VT::I64, true),
            I32Rotr => self.emit_rotate(VT::I32, false),
            I64Rotr => self.emit_rotate(VT::I64, false),

            I32Eqz => self.emit_int_eqz(VT::I32),
            I64Eqz => self.emit_int_eqz(VT::I64),
            I32Eq | I64Eq => self.emit_int_compare(ICmpPred::Eq),
            I32Ne | I64Ne => self.emit_int_compare(ICmpPred::Ne),
            I32LtS | I64LtS => self.emit_int_compare(ICmpPred::SLt),
            I32LtU | I64LtU => self.emit_int_compare(ICmpPred::ULt),
            I32LeS | I64LeS => self.emit_int_compare(ICmpPred::SLe),
            I32LeU | I64LeU => self.emit_int_compare(ICmpPred::ULe),
            I32GtS | I64GtS => self.emit_int_compare(ICmpPred::SGt),
            I32GtU | I64GtU => self.emit_int_compare(ICmpPred::UGt),
            I32GeS | I64GeS => self.emit_int_compare(ICmpPred::SGe),
            I32GeU | I64GeU => self.emit_int_compare(ICmpPred::UGe),

            I32Clz | I64Clz => self.emit_count_zeros(Intrinsic::Ctlz),
            I32Ctz | I64Ctz => self.emit_count_zeros(Intrinsic::Cttz),
            I32Popcnt | I64Popcnt => self.emit_popcnt(),

            // ==========================================================
            // Float arithmetic and comparisons
            // ==========================================================
            F32Add | F64Add => self.emit_fp_binary_constrained(Intrinsic::ConstrainedFAdd),
            F32Sub | F64Sub => self.emit_fp_binary_constrained(Intrinsic::ConstrainedFSub),
            F32Mul | F64Mul => self.emit_fp_binary_constrained(Intrinsic::ConstrainedFMul),
            F32Div | F64Div => self.emit_fp_binary_constrained(Intrinsic::ConstrainedFDiv),
            F32Copysign | F64Copysign => self.emit_fp_copysign(),
            F32Neg | F64Neg => self.emit_fp_neg(),
            F32Abs | F64Abs => self.emit_fp_abs(),
            F32Sqrt | F64Sqrt => self.emit_fp_sqrt(),

            F32Min => self.emit_fp_runtime_binary(VT::F32, "min")?,
            F64Min => self.emit_fp_runtime_binary(VT::F64, "min")?,
            F32Max => self.emit_fp_runtime_binary(VT::F32, "max")?,
            F64Max => self.emit_fp_runtime_binary(VT::F64, "max")?,
            F32Ceil => self.emit_fp_runtime_unary(VT::F32, "ceil")?,
            F64Ceil => self.emit_fp_runtime_unary(VT::F64, "ceil")?,
            F32Floor => self.emit_fp_runtime_unary(VT::F32, "floor")?,
            F64Floor => self.emit_fp_runtime_unary(VT::F64, "floor")?,
            F32Trunc => self.emit_fp_runtime_unary(VT::F32, "trunc")?,
            F64Trunc => self.emit_fp_runtime_unary(VT::F64, "trunc")?,
            F32Nearest => self.emit_fp_runtime_unary(VT::F32, "nearest")?,
            F64Nearest => self.emit_fp_runtime_unary(VT::F64, "nearest")?,

            F32Eq | F64Eq => self.emit_fp_compare(FCmpPred::OEq),
            F32Ne | F64Ne => self.emit_fp_compare(FCmpPred::UNe),
            F32Lt | F64Lt => self.emit_fp_compare(FCmpPred::OLt),
            F32Le | F64Le => self.emit_fp_compare(FCmpPred::OLe),
            F32Gt | F64Gt => self.emit_fp_compare(FCmpPred::OGt),
            F32Ge | F64Ge => self.emit_fp_compare(FCmpPred::OGe),

            // ==========================================================
            // Conversions
            // ==========================================================
            I32WrapI64 => self.emit_unary_cast(CastOp::Trunc, IrType::I32),
            I64ExtendI32S => self.emit_unary_cast(CastOp::SExt, IrType::I64),
            I64ExtendI32U => self.emit_unary_cast(CastOp::ZExt, IrType::I64),

            // Trap bounds are the widest float values that do not round
            // into range of the target type.
            I32TruncF32S => self.emit_trunc_float_to_int(VT::I32, true, -2147483904.0, 2147483648.0)?,
            I32TruncF64S => self.emit_trunc_float_to_int(VT::I32, true, -2147483649.0, 2147483648.0)?,
            I32TruncF32U => self.emit_trunc_float_to_int(VT::I32, false, -1.0, 4294967296.0)?,
            I32TruncF64U => self.emit_trunc_float_to_int(VT::I32, false, -1.0, 4294967296.0)?,
            I64TruncF32S => {
                self.emit_trunc_float_to_int(VT::I64, true, -9223373136366403584.0, 9223372036854775808.0)?
            }
            I64TruncF64S => {
                self.emit_trunc_float_to_int(VT::I64, true, -9223372036854777856.0, 9223372036854775808.0)?
            }
            I64TruncF32U => {
                self.emit_trunc_float_to_int(VT::I64, false, -1.0, 18446744073709551616.0)?
            }
            I64TruncF64U => {
                self.emit_trunc_float_to_int(VT::I64, false, -1.0, 18446744073709551616.0)?
            }

            F32ConvertI32S | F32ConvertI64S => self.emit_unary_cast(CastOp::SiToFp, IrType::F32),
            F32ConvertI32U | F32ConvertI64U => self.emit_unary_cast(CastOp::UiToFp, IrType::F32),
            F64ConvertI32S | F64ConvertI64S => self.emit_unary_cast(CastOp::SiToFp, IrType::F64),
            F64ConvertI32U | F64ConvertI64U => self.emit_unary_cast(CastOp::UiToFp, IrType::F64),

            F32DemoteF64 => self.emit_unary_cast(CastOp::FpTrunc, IrType::F32),
            F64PromoteF32 => self.emit_f64_promote(),
            F32ReinterpretI32 => self.emit_unary_cast(CastOp::Bitcast, IrType::F32),
            F64ReinterpretI64 => self.emit_unary_cast(CastOp::Bitcast, IrType::F64),
            I32ReinterpretF32 => self.emit_unary_cast(CastOp::Bitcast, IrType::I32),
            I64ReinterpretF64 => self.emit_unary_cast(CastOp::Bitcast, IrType::I64),

            I32Extend8S => self.emit_sign_extend(IrType::I8, VT::I32),
            I32Extend16S => self.emit_sign_extend(IrType::I16, VT::I32),
            I64Extend8S => self.emit_sign_extend(IrType::I8, VT::I64),
            I64Extend16S => self.emit_sign_extend(IrType::I16, VT::I64),
            I64Extend32S => self.emit_sign_extend(IrType::I32, VT::I64),

            I32TruncSatF32S | I32TruncSatF64S => self.emit_trunc_float_to_int_sat(
                VT::I32,
                true,
                i32::MIN as f64,
                i32::MAX as f64,
                i32::MIN as u32 as u64,
                i32::MAX as u64,
            ),
            I32TruncSatF32U | I32TruncSatF64U => self.emit_trunc_float_to_int_sat(
                VT::I32,
                false,
                0.0,
                u32::MAX as f64,
                0,
                u32::MAX as u64,
            ),
            I64TruncSatF32S | I64TruncSatF64S => self.emit_trunc_float_to_int_sat(
                VT::I64,
                true,
                i64::MIN as f64,
                i64::MAX as f64,
                i64::MIN as u64,
                i64::MAX as u64,
            ),
            I64TruncSatF32U | I64TruncSatF64U => self.emit_trunc_float_to_int_sat(
                VT::I64,
                false,
                0.0,
                u64::MAX as f64,
                0,
                u64::MAX,
            ),

            // ==========================================================
            // Atomics
            // ==========================================================
            MemoryAtomicNotify { .. } => self.emit_atomic_notify()?,
            MemoryAtomicWait32 { .. } => self.emit_atomic_wait(VT::I32)?,
            MemoryAtomicWait64 { .. } => self.emit_atomic_wait(VT::I64)?,

            I32AtomicLoad { memarg } => self.emit_atomic_load(VT::I32, IrType::I32, 2, memarg, MC::None)?,
            I64AtomicLoad { memarg } => self.emit_atomic_load(VT::I64, IrType::I64, 3, memarg, MC::None)?,
            I32AtomicLoad8U { memarg } => self.emit_atomic_load(VT::I32, IrType::I8, 0, memarg, MC::ZExt)?,
            I32AtomicLoad16U { memarg } => self.emit_atomic_load(VT::I32, IrType::I16, 1, memarg, MC::ZExt)?,
            I64AtomicLoad8U { memarg } => self.emit_atomic_load(VT::I64, IrType::I8, 0, memarg, MC::ZExt)?,
            I64AtomicLoad16U { memarg } => self.emit_atomic_load(VT::I64, IrType::I16, 1, memarg, MC::ZExt)?,
            I64AtomicLoad32U { memarg } => self.emit_atomic_load(VT::I64, IrType::I32, 2, memarg, MC::ZExt)?,

            I32AtomicStore { memarg } => self.emit_atomic_store(IrType::I32, 2, memarg, MC::None)?,
            I64AtomicStore { memarg } => self.emit_atomic_store(IrType::I64, 3, memarg, MC::None)?,
            I32AtomicStore8 { memarg } => self.emit_atomic_store(IrType::I8, 0, memarg, MC::Trunc)?,
            I32AtomicStore16 { memarg } => self.emit_atomic_store(IrType::I16, 1, memarg, MC::Trunc)?,
            I64AtomicStore8 { memarg } => self.emit_atomic_store(IrType::I8, 0, memarg, MC::Trunc)?,
            I64AtomicStore16 { memarg } => self.emit_atomic_store(IrType::I16, 1, memarg, MC::Trunc)?,
            I64AtomicStore32 { memarg } => self.emit_atomic_store(IrType::I32, 2, memarg, MC::Trunc)?,

            I32AtomicRmwAdd { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Add, IrType::I32, 2, memarg, MC::None, MC::None)?
            }
            I64AtomicRmwAdd { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Add, IrType::I64, 3, memarg, MC::None, MC::None)?
            }
            I32AtomicRmw8AddU { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Add, IrType::I8, 0, memarg, MC::Trunc, MC::ZExt)?
            }
            I32AtomicRmw16AddU { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Add, IrType::I16, 1, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw8AddU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Add, IrType::I8, 0, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw16AddU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Add, IrType::I16, 1, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw32AddU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Add, IrType::I32, 2, memarg, MC::Trunc, MC::ZExt)?
            }

            I32AtomicRmwSub { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Sub, IrType::I32, 2, memarg, MC::None, MC::None)?
            }
            I64AtomicRmwSub { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Sub, IrType::I64, 3, memarg, MC::None, MC::None)?
            }
            I32AtomicRmw8SubU { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Sub, IrType::I8, 0, memarg, MC::Trunc, MC::ZExt)?
            }
            I32AtomicRmw16SubU { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Sub, IrType::I16, 1, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw8SubU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Sub, IrType::I8, 0, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw16SubU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Sub, IrType::I16, 1, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw32SubU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Sub, IrType::I32, 2, memarg, MC::Trunc, MC::ZExt)?
            }

            I32AtomicRmwAnd { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::And, IrType::I32, 2, memarg, MC::None, MC::None)?
            }
            I64AtomicRmwAnd { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::And, IrType::I64, 3, memarg, MC::None, MC::None)?
            }
            I32AtomicRmw8AndU { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::And, IrType::I8, 0, memarg, MC::Trunc, MC::ZExt)?
            }
            I32AtomicRmw16AndU { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::And, IrType::I16, 1, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw8AndU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::And, IrType::I8, 0, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw16AndU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::And, IrType::I16, 1, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw32AndU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::And, IrType::I32, 2, memarg, MC::Trunc, MC::ZExt)?
            }

            I32AtomicRmwOr { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Or, IrType::I32, 2, memarg, MC::None, MC::None)?
            }
            I64AtomicRmwOr { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Or, IrType::I64, 3, memarg, MC::None, MC::None)?
            }
            I32AtomicRmw8OrU { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Or, IrType::I8, 0, memarg, MC::Trunc, MC::ZExt)?
            }
            I32AtomicRmw16OrU { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Or, IrType::I16, 1, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw8OrU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Or, IrType::I8, 0, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw16OrU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Or, IrType::I16, 1, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw32OrU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Or, IrType::I32, 2, memarg, MC::Trunc, MC::ZExt)?
            }

            I32AtomicRmwXor { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Xor, IrType::I32, 2, memarg, MC::None, MC::None)?
            }
            I64AtomicRmwXor { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Xor, IrType::I64, 3, memarg, MC::None, MC::None)?
            }
            I32AtomicRmw8XorU { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Xor, IrType::I8, 0, memarg, MC::Trunc, MC::ZExt)?
            }
            I32AtomicRmw16XorU { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Xor, IrType::I16, 1, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw8XorU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Xor, IrType::I8, 0, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw16XorU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Xor, IrType::I16, 1, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw32XorU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Xor, IrType::I32, 2, memarg, MC::Trunc, MC::ZExt)?
            }

            I32AtomicRmwXchg { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Xchg, IrType::I32, 2, memarg, MC::None, MC::None)?
            }
            I64AtomicRmwXchg { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Xchg, IrType::I64, 3, memarg, MC::None, MC::None)?
            }
            I32AtomicRmw8XchgU { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Xchg, IrType::I8, 0, memarg, MC::Trunc, MC::ZExt)?
            }
            I32AtomicRmw16XchgU { memarg } => {
                self.emit_atomic_rmw(VT::I32, RmwOp::Xchg, IrType::I16, 1, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw8XchgU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Xchg, IrType::I8, 0, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw16XchgU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Xchg, IrType::I16, 1, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw32XchgU { memarg } => {
                self.emit_atomic_rmw(VT::I64, RmwOp::Xchg, IrType::I32, 2, memarg, MC::Trunc, MC::ZExt)?
            }

            I32AtomicRmwCmpxchg { memarg } => {
                self.emit_atomic_cmpxchg(VT::I32, IrType::I32, 2, memarg, MC::None, MC::None)?
            }
            I64AtomicRmwCmpxchg { memarg } => {
                self.emit_atomic_cmpxchg(VT::I64, IrType::I64, 3, memarg, MC::None, MC::None)?
            }
            I32AtomicRmw8CmpxchgU { memarg } => {
                self.emit_atomic_cmpxchg(VT::I32, IrType::I8, 0, memarg, MC::Trunc, MC::ZExt)?
            }
            I32AtomicRmw16CmpxchgU { memarg } => {
                self.emit_atomic_cmpxchg(VT::I32, IrType::I16, 1, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw8CmpxchgU { memarg } => {
                self.emit_atomic_cmpxchg(VT::I64, IrType::I8, 0, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw16CmpxchgU { memarg } => {
                self.emit_atomic_cmpxchg(VT::I64, IrType::I16, 1, memarg, MC::Trunc, MC::ZExt)?
            }
            I64AtomicRmw32CmpxchgU { memarg } => {
                self.emit_atomic_cmpxchg(VT::I64, IrType::I32, 2, memarg, MC::Trunc, MC::ZExt)?
            }

            // ==========================================================
            // SIMD
            // ==========================================================
            I8x16Shuffle { lanes } => self.emit_shuffle(lanes),
            I8x16Splat => self.emit_splat(IrType::I8X16),
            I16x8Splat => self.emit_splat(IrType::I16X8),
            I32x4Splat => self.emit_splat(IrType::I32X4),
            I64x2Splat => self.emit_splat(IrType::I64X2),
            F32x4Splat => self.emit_splat(IrType::F32X4),
            F64x2Splat => self.emit_splat(IrType::F64X2),

            I8x16ExtractLaneS { lane } => self.emit_extract_lane(IrType::I8X16, lane, Some(CastOp::SExt)),
            I8x16ExtractLaneU { lane } => self.emit_extract_lane(IrType::I8X16, lane, Some(CastOp::ZExt)),
            I16x8ExtractLaneS { lane } => self.emit_extract_lane(IrType::I16X8, lane, Some(CastOp::SExt)),
            I16x8ExtractLaneU { lane } => self.emit_extract_lane(IrType::I16X8, lane, Some(CastOp::ZExt)),
            I32x4ExtractLane { lane } => self.emit_extract_lane(IrType::I32X4, lane, None),
            I64x2ExtractLane { lane } => self.emit_extract_lane(IrType::I64X2, lane, None),
            F32x4ExtractLane { lane } => self.emit_extract_lane(IrType::F32X4, lane, None),
            F64x2ExtractLane { lane } => self.emit_extract_lane(IrType::F64X2, lane, None),

            I8x16ReplaceLane { lane } => self.emit_replace_lane(IrType::I8X16, lane),
            I16x8ReplaceLane { lane } => self.emit_replace_lane(IrType::I16X8, lane),
            I32x4ReplaceLane { lane } => self.emit_replace_lane(IrType::I32X4, lane),
            I64x2ReplaceLane { lane } => self.emit_replace_lane(IrType::I64X2, lane),
            F32x4ReplaceLane { lane } => self.emit_replace_lane(IrType::F32X4, lane),
            F64x2ReplaceLane { lane } => self.emit_replace_lane(IrType::F64X2, lane),

            V128And => self.emit_v128_bitwise(BinOp::And),
            V128Or => self.emit_v128_bitwise(BinOp::Or),
            V128Xor => self.emit_v128_bitwise(BinOp::Xor),
            V128Not => self.emit_v128_not(),
            V128Bitselect => self.emit_v128_bitselect(),

            I8x16Neg => self.emit_vec_neg(IrType::I8X16),
            I16x8Neg => self.emit_vec_neg(IrType::I16X8),
            I32x4Neg => self.emit_vec_neg(IrType::I32X4),
            I64x2Neg => self.emit_vec_neg(IrType::I64X2),
            I8x16AnyTrue => self.emit_any_true(IrType::I8X16),
            I16x8AnyTrue => self.emit_any_true(IrType::I16X8),
            I32x4AnyTrue => self.emit_any_true(IrType::I32X4),
            I64x2AnyTrue => self.emit_any_true(IrType::I64X2),
            I8x16AllTrue => self.emit_all_true(IrType::I8X16),
            I16x8AllTrue => self.emit_all_true(IrType::I16X8),
            I32x4AllTrue => self.emit_all_true(IrType::I32X4),
            I64x2AllTrue => self.emit_all_true(IrType::I64X2),

            I8x16Add => self.emit_vec_binary(IrType::I8X16, BinOp::Add),
            I16x8Add => self.emit_vec_binary(IrType::I16X8, BinOp::Add),
            I32x4Add => self.emit_vec_binary(IrType::I32X4, BinOp::Add),
            I64x2Add => self.emit_vec_binary(IrType::I64X2, BinOp::Add),
            I8x16Sub => self.emit_vec_binary(IrType::I8X16, BinOp::Sub),
            I16x8Sub => self.emit_vec_binary(IrType::I16X8, BinOp::Sub),
            I32x4Sub => self.emit_vec_binary(IrType::I32X4, BinOp::Sub),
            I64x2Sub => self.emit_vec_binary(IrType::I64X2, BinOp::Sub),
            I8x16Mul => self.emit_vec_binary(IrType::I8X16, BinOp::Mul),
            I16x8Mul => self.emit_vec_binary(IrType::I16X8, BinOp::Mul),
            I32x4Mul => self.emit_vec_binary(IrType::I32X4, BinOp::Mul),
            I64x2Mul => self.emit_vec_binary(IrType::I64X2, BinOp::Mul),
            I8x16DivS => self.emit_vec_binary(IrType::I8X16, BinOp::SDiv),
            I16x8DivS => self.emit_vec_binary(IrType::I16X8, BinOp::SDiv),
            I32x4DivS => self.emit_vec_binary(IrType::I32X4, BinOp::SDiv),
            I64x2DivS => self.emit_vec_binary(IrType::I64X2, BinOp::SDiv),
            I8x16DivU => self.emit_vec_binary(IrType::I8X16, BinOp::UDiv),
            I16x8DivU => self.emit_vec_binary(IrType::I16X8, BinOp::UDiv),
            I32x4DivU => self.emit_vec_binary(IrType::I32X4, BinOp::UDiv),
            I64x2DivU => self.emit_vec_binary(IrType::I64X2, BinOp::UDiv),
            I8x16Shl => self.emit_vec_binary(IrType::I8X16, BinOp::Shl),
            I16x8Shl => self.emit_vec_binary(IrType::I16X8, BinOp::Shl),
            I32x4Shl => self.emit_vec_binary(IrType::I32X4, BinOp::Shl),
            I64x2Shl => self.emit_vec_binary(IrType::I64X2, BinOp::Shl),
            I8x16ShrS => self.emit_vec_binary(IrType::I8X16, BinOp::AShr),
            I16x8ShrS => self.emit_vec_binary(IrType::I16X8, BinOp::AShr),
            I32x4ShrS => self.emit_vec_binary(IrType::I32X4, BinOp::AShr),
            I64x2ShrS => self.emit_vec_binary(IrType::I64X2, BinOp::AShr),
            I8x16ShrU => self.emit_vec_binary(IrType::I8X16, BinOp::LShr),
            I16x8ShrU => self.emit_vec_binary(IrType::I16X8, BinOp::LShr),
            I32x4ShrU => self.emit_vec_binary(IrType::I32X4, BinOp::LShr),
            I64x2ShrU => self.emit_vec_binary(IrType::I64X2, BinOp::LShr),

            I8x16AddSatS => self.emit_vec_saturating(IrType::I8X16, Intrinsic::SatAddSigned),
            I8x16AddSatU => self.emit_vec_saturating(IrType::I8X16, Intrinsic::SatAddUnsigned),
            I8x16SubSatS => self.emit_vec_saturating(IrType::I8X16, Intrinsic::SatSubSigned),
            I8x16SubSatU => self.emit_vec_saturating(IrType::I8X16, Intrinsic::SatSubUnsigned),
            I16x8AddSatS => self.emit_vec_saturating(IrType::I16X8, Intrinsic::SatAddSigned),
            I16x8AddSatU => self.emit_vec_saturating(IrType::I16X8, Intrinsic::SatAddUnsigned),
            I16x8SubSatS => self.emit_vec_saturating(IrType::I16X8, Intrinsic::SatSubSigned),
            I16x8SubSatU => self.emit_vec_saturating(IrType::I16X8, Intrinsic::SatSubUnsigned),

            I8x16Eq => self.emit_vec_compare_int(IrType::I8X16, ICmpPred::Eq),
            I16x8Eq => self.emit_vec_compare_int(IrType::I16X8, ICmpPred::Eq),
            I32x4Eq => self.emit_vec_compare_int(IrType::I32X4, ICmpPred::Eq),
            I64x2Eq => self.emit_vec_compare_int(IrType::I64X2, ICmpPred::Eq),
            I8x16Ne => self.emit_vec_compare_int(IrType::I8X16, ICmpPred::Ne),
            I16x8Ne => self.emit_vec_compare_int(IrType::I16X8, ICmpPred::Ne),
            I32x4Ne => self.emit_vec_compare_int(IrType::I32X4, ICmpPred::Ne),
            I64x2Ne => self.emit_vec_compare_int(IrType::I64X2, ICmpPred::Ne),
            I8x16LtS => self.emit_vec_compare_int(IrType::I8X16, ICmpPred::SLt),
            I16x8LtS => self.emit_vec_compare_int(IrType::I16X8, ICmpPred::SLt),
            I32x4LtS => self.emit_vec_compare_int(IrType::I32X4, ICmpPred::SLt),
            I64x2LtS => self.emit_vec_compare_int(IrType::I64X2, ICmpPred::SLt),
            I8x16LtU => self.emit_vec_compare_int(IrType::I8X16, ICmpPred::ULt),
            I16x8LtU => self.emit_vec_compare_int(IrType::I16X8, ICmpPred::ULt),
            I32x4LtU => self.emit_vec_compare_int(IrType::I32X4, ICmpPred::ULt),
            I64x2LtU => self.emit_vec_compare_int(IrType::I64X2, ICmpPred::ULt),
            I8x16GtS => self.emit_vec_compare_int(IrType::I8X16, ICmpPred::SGt),
            I16x8GtS => self.emit_vec_compare_int(IrType::I16X8, ICmpPred::SGt),
            I32x4GtS => self.emit_vec_compare_int(IrType::I32X4, ICmpPred::SGt),
            I64x2GtS => self.emit_vec_compare_int(IrType::I64X2, ICmpPred::SGt),
            I8x16GtU => self.emit_vec_compare_int(IrType::I8X16, ICmpPred::UGt),
            I16x8GtU => self.emit_vec_compare_int(IrType::I16X8, ICmpPred::UGt),
            I32x4GtU => self.emit_vec_compare_int(IrType::I32X4, ICmpPred::UGt),
            I64x2GtU => self.emit_vec_compare_int(IrType::I64X2, ICmpPred::UGt),
            I8x16LeS => self.emit_vec_compare_int(IrType::I8X16, ICmpPred::SLe),
            I16x8LeS => self.emit_vec_compare_int(IrType::I16X8, ICmpPred::SLe),
            I32x4LeS => self.emit_vec_compare_int(IrType::I32X4, ICmpPred::SLe),
            I64x2LeS => self.emit_vec_compare_int(IrType::I64X2, ICmpPred::SLe),
            I8x16LeU => self.emit_vec_compare_int(IrType::I8X16, ICmpPred::ULe),
            I16x8LeU => self.emit_vec_compare_int(IrType::I16X8, ICmpPred::ULe),
            I32x4LeU => self.emit_vec_compare_int(IrType::I32X4, ICmpPred::ULe),
            I64x2LeU => self.emit_vec_compare_int(IrType::I64X2, ICmpPred::ULe),
            I8x16GeS => self.emit_vec_compare_int(IrType::I8X16, ICmpPred::SGe),
            I16x8GeS => self.emit_vec_compare_int(IrType::I16X8, ICmpPred::SGe),
            I32x4GeS => self.emit_vec_compare_int(IrType::I32X4, ICmpPred::SGe),
            I64x2GeS => self.emit_vec_compare_int(IrType::I64X2, ICmpPred::SGe),
            I8x16GeU => self.emit_vec_compare_int(IrType::I8X16, ICmpPred::UGe),
            I16x8GeU => self.emit_vec_compare_int(IrType::I16X8, ICmpPred::UGe),
            I32x4GeU => self.emit_vec_compare_int(IrType::I32X4, ICmpPred::UGe),
            I64x2GeU => self.emit_vec_compare_int(IrType::I64X2, ICmpPred::UGe),

            F32x4Abs => self.emit_vec_fabs(IrType::F32X4),
            F64x2Abs => self.emit_vec_fabs(IrType::F64X2),
            F32x4Neg => self.emit_vec_fneg(IrType::F32X4),
            F64x2Neg => self.emit_vec_fneg(IrType::F64X2),
            F32x4Sqrt => self.emit_vec_fsqrt(IrType::F32X4),
            F64x2Sqrt => self.emit_vec_fsqrt(IrType::F64X2),
            F32x4Add => self.emit_vec_binary(IrType::F32X4, BinOp::FAdd),
            F64x2Add => self.emit_vec_binary(IrType::F64X2, BinOp::FAdd),
            F32x4Sub => self.emit_vec_binary(IrType::F32X4, BinOp::FSub),
            F64x2Sub => self.emit_vec_binary(IrType::F64X2, BinOp::FSub),
            F32x4Mul => self.emit_vec_binary(IrType::F32X4, BinOp::FMul),
            F64x2Mul => self.emit_vec_binary(IrType::F64X2, BinOp::FMul),
            F32x4Div => self.emit_vec_binary(IrType::F32X4, BinOp::FDiv),
            F64x2Div => self.emit_vec_binary(IrType::F64X2, BinOp::FDiv),
            F32x4Min => self.emit_vec_minmax(IrType::F32X4, true),
            F64x2Min => self.emit_vec_minmax(IrType::F64X2, true),
            F32x4Max => self.emit_vec_minmax(IrType::F32X4, false),
            F64x2Max => self.emit_vec_minmax(IrType::F64X2, false),
            F32x4Eq => self.emit_vec_compare_fp(IrType::F32X4, FCmpPred::OEq),
            F64x2Eq => self.emit_vec_compare_fp(IrType::F64X2, FCmpPred::OEq),
            F32x4Ne => self.emit_vec_compare_fp(IrType::F32X4, FCmpPred::UNe),
            F64x2Ne => self.emit_vec_compare_fp(IrType::F64X2, FCmpPred::UNe),
            F32x4Lt => self.emit_vec_compare_fp(IrType::F32X4, FCmpPred::OLt),
            F64x2Lt => self.emit_vec_compare_fp(IrType::F64X2, FCmpPred::OLt),
            F32x4Gt => self.emit_vec_compare_fp(IrType::F32X4, FCmpPred::OGt),
            F64x2Gt => self.emit_vec_compare_fp(IrType::F64X2, FCmpPred::OGt),
            F32x4Le => self.emit_vec_compare_fp(IrType::F32X4, FCmpPred::OLe),
            F64x2Le => self.emit_vec_compare_fp(IrType::F64X2, FCmpPred::OLe),
            F32x4Ge => self.emit_vec_compare_fp(IrType::F32X4, FCmpPred::OGe),
            F64x2Ge => self.emit_vec_compare_fp(IrType::F64X2, FCmpPred::OGe),

            F32x4ConvertI32x4S => self.emit_vec_convert(IrType::I32X4, IrType::F32X4, CastOp::SiToFp),
            F32x4ConvertI32x4U => self.emit_vec_convert(IrType::I32X4, IrType::F32X4, CastOp::UiToFp),
            F64x2ConvertI64x2S => self.emit_vec_convert(IrType::I64X2, IrType::F64X2, CastOp::SiToFp),
            F64x2ConvertI64x2U => self.emit_vec_convert(IrType::I64X2, IrType::F64X2, CastOp::UiToFp),

            I32x4TruncSatF32x4S => self.emit_vec_trunc_sat(
                IrType::I32X4,
                IrType::F32X4,
                true,
                i32::MIN as f64,
                i32::MAX as f64,
                i32::MIN as u32 as u64,
                i32::MAX as u64,
            ),
            I32x4TruncSatF32x4U => self.emit_vec_trunc_sat(
                IrType::I32X4,
                IrType::F32X4,
                false,
                0.0,
                u32::MAX as f64,
                0,
                u32::MAX as u64,
            ),
            I64x2TruncSatF64x2S => self.emit_vec_trunc_sat(
                IrType::I64X2,
                IrType::F64X2,
                true,
                i64::MIN as f64,
                i64::MAX as f64,
                i64::MIN as u64,
                i64::MAX as u64,
            ),
            I64x2TruncSatF64x2U => self.emit_vec_trunc_sat(
                IrType::I64X2,
                IrType::F64X2,
                false,
                0.0,
                u64::MAX as f64,
                0,
                u64::MAX,
            ),
        }
        Ok(())
    }
}
