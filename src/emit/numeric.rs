//! Numeric operator lowering
//!
//! Integer arithmetic maps to two-operand backend forms; comparisons
//! return i1 and are widened to i32 for the operand stack. Anything with
//! backend undefined behavior that WebAssembly defines (division,
//! remainder, shift counts, float-to-int truncation) gets explicit
//! guards. Float arithmetic uses constrained intrinsics pinned to
//! round-to-nearest-even with strict exception behavior so the optimizer
//! cannot reassociate, and the operators whose NaN/signed-zero rules the
//! backend cannot match exactly are delegated to runtime helpers.

use super::function::FunctionEmitter;
use super::types::{ir_type, typed_zero};
use super::EmitError;
use crate::ir::{
    BinOp, BranchHint, CastOp, FCmpPred, FpConstraints, ICmpPred, Intrinsic, IrType, ValueId,
};
use crate::module::{FunctionType, ValueType};

impl FunctionEmitter<'_, '_> {
    fn int_min_literal(&mut self, value_type: ValueType) -> ValueId {
        match value_type {
            ValueType::I32 => self.builder.const_i32(i32::MIN as u32),
            ValueType::I64 => self.builder.const_i64(i64::MIN as u64),
            other => panic!("int_min_literal of {other}"),
        }
    }

    fn neg_one_literal(&mut self, value_type: ValueType) -> ValueId {
        match value_type {
            ValueType::I32 => self.builder.const_i32(u32::MAX),
            ValueType::I64 => self.builder.const_i64(u64::MAX),
            other => panic!("neg_one_literal of {other}"),
        }
    }

    fn float_bound(&mut self, operand_type: IrType, bound: f64) -> ValueId {
        match operand_type {
            IrType::F32 => self.builder.const_f32(bound as f32),
            IrType::F64 => self.builder.const_f64(bound),
            other => panic!("float bound for {other}"),
        }
    }

    // ------------------------------------------------------------------
    // Integer operators
    // ------------------------------------------------------------------

    pub(crate) fn emit_int_binary(&mut self, op: BinOp) {
        let right = self.pop();
        let left = self.pop();
        let result = self.builder.binary(op, left, right);
        self.push(result);
    }

    pub(crate) fn emit_int_compare(&mut self, pred: ICmpPred) {
        let right = self.pop();
        let left = self.pop();
        let compared = self.builder.icmp(pred, left, right);
        let widened = self.coerce_bool_to_i32(compared);
        self.push(widened);
    }

    pub(crate) fn emit_int_eqz(&mut self, value_type: ValueType) {
        let operand = self.pop();
        let zero = typed_zero(&mut self.builder, value_type);
        let compared = self.builder.icmp(ICmpPred::Eq, operand, zero);
        let widened = self.coerce_bool_to_i32(compared);
        self.push(widened);
    }

    /// clz/cttz take a flag that zero input is defined behavior.
    pub(crate) fn emit_count_zeros(&mut self, intrinsic: Intrinsic) {
        let operand = self.pop();
        let is_zero_poison = self.builder.const_bool(false);
        let ty = self.builder.value_type(operand);
        let result = self
            .builder
            .intrinsic(intrinsic, vec![operand, is_zero_poison], ty, None);
        self.push(result);
    }

    pub(crate) fn emit_popcnt(&mut self) {
        let operand = self.pop();
        let ty = self.builder.value_type(operand);
        let result = self.builder.intrinsic(Intrinsic::Ctpop, vec![operand], ty, None);
        self.push(result);
    }

    fn trap_divide_by_zero(&mut self, value_type: ValueType, divisor: ValueId) -> Result<(), EmitError> {
        let zero = typed_zero(&mut self.builder, value_type);
        let is_zero = self.builder.icmp(ICmpPred::Eq, divisor, zero);
        self.emit_conditional_trap_intrinsic(
            is_zero,
            "divideByZeroOrIntegerOverflowTrap",
            &FunctionType::default(),
            Vec::new(),
        )
    }

    /// Traps on (x / 0) and on (INT_MIN / -1).
    fn trap_divide_by_zero_or_integer_overflow(
        &mut self,
        value_type: ValueType,
        left: ValueId,
        right: ValueId,
    ) -> Result<(), EmitError> {
        let int_min = self.int_min_literal(value_type);
        let neg_one = self.neg_one_literal(value_type);
        let left_is_min = self.builder.icmp(ICmpPred::Eq, left, int_min);
        let right_is_neg_one = self.builder.icmp(ICmpPred::Eq, right, neg_one);
        let overflow = self.builder.binary(BinOp::And, left_is_min, right_is_neg_one);
        let zero = typed_zero(&mut self.builder, value_type);
        let divide_by_zero = self.builder.icmp(ICmpPred::Eq, right, zero);
        let condition = self.builder.binary(BinOp::Or, overflow, divide_by_zero);
        self.emit_conditional_trap_intrinsic(
            condition,
            "divideByZeroOrIntegerOverflowTrap",
            &FunctionType::default(),
            Vec::new(),
        )
    }

    pub(crate) fn emit_div_s(&mut self, value_type: ValueType) -> Result<(), EmitError> {
        let right = self.pop();
        let left = self.pop();
        self.trap_divide_by_zero_or_integer_overflow(value_type, left, right)?;
        let result = self.builder.binary(BinOp::SDiv, left, right);
        self.push(result);
        Ok(())
    }

    pub(crate) fn emit_div_u(&mut self, value_type: ValueType) -> Result<(), EmitError> {
        let right = self.pop();
        let left = self.pop();
        self.trap_divide_by_zero(value_type, right)?;
        let result = self.builder.binary(BinOp::UDiv, left, right);
        self.push(result);
        Ok(())
    }

    pub(crate) fn emit_rem_u(&mut self, value_type: ValueType) -> Result<(), EmitError> {
        let right = self.pop();
        let left = self.pop();
        self.trap_divide_by_zero(value_type, right)?;
        let result = self.builder.binary(BinOp::URem, left, right);
        self.push(result);
        Ok(())
    }

    /// `rem_s` defines INT_MIN % -1 as 0, where the backend's signed
    /// remainder has undefined behavior. Branch around the srem on the
    /// overflow case and merge the defined zero in with a phi.
    pub(crate) fn emit_rem_s(&mut self, value_type: ValueType) -> Result<(), EmitError> {
        let right = self.pop();
        let left = self.pop();
        self.trap_divide_by_zero(value_type, right)?;

        let pre_overflow_block = self.builder.insertion_block();
        let no_overflow_block = self.builder.create_block("sremNoOverflow");
        let end_block = self.builder.create_block("sremEnd");

        let int_min = self.int_min_literal(value_type);
        let neg_one = self.neg_one_literal(value_type);
        let left_not_min = self.builder.icmp(ICmpPred::Ne, left, int_min);
        let right_not_neg_one = self.builder.icmp(ICmpPred::Ne, right, neg_one);
        let no_overflow = self.builder.binary(BinOp::Or, left_not_min, right_not_neg_one);
        self.builder.cond_br(
            no_overflow,
            no_overflow_block,
            end_block,
            Some(BranchHint::LikelyTrue),
        );

        self.builder.set_insertion_point(no_overflow_block);
        let no_overflow_value = self.builder.binary(BinOp::SRem, left, right);
        self.builder.br(end_block);

        self.builder.set_insertion_point(end_block);
        let phi = self.builder.phi(end_block, ir_type(value_type));
        let zero = typed_zero(&mut self.builder, value_type);
        self.builder.add_phi_incoming(phi, pre_overflow_block, zero);
        self.builder.add_phi_incoming(phi, no_overflow_block, no_overflow_value);
        self.push(phi);
        Ok(())
    }

    /// WebAssembly mandates modulo-bitwidth shift counts; the backend
    /// leaves counts >= bitwidth undefined, so mask explicitly.
    fn emit_shift_count_mask(&mut self, value_type: ValueType, count: ValueId) -> ValueId {
        let mask = match value_type {
            ValueType::I32 => self.builder.const_i32(31),
            ValueType::I64 => self.builder.const_i64(63),
            other => panic!("shift mask of {other}"),
        };
        self.builder.binary(BinOp::And, count, mask)
    }

    pub(crate) fn emit_shift(&mut self, value_type: ValueType, op: BinOp) {
        let right = self.pop();
        let left = self.pop();
        let masked = self.emit_shift_count_mask(value_type, right);
        let result = self.builder.binary(op, left, masked);
        self.push(result);
    }

    /// Rotations synthesize as shl | lshr of the masked counts.
    pub(crate) fn emit_rotate(&mut self, value_type: ValueType, left_rotate: bool) {
        let right = self.pop();
        let left = self.pop();
        let bit_width = match value_type {
            ValueType::I32 => self.builder.const_i32(32),
            ValueType::I64 => self.builder.const_i64(64),
            other => panic!("rotate of {other}"),
        };
        let width_minus_count = self.builder.binary(BinOp::Sub, bit_width, right);
        let (shl_count, lshr_count) = if left_rotate {
            (right, width_minus_count)
        } else {
            (width_minus_count, right)
        };
        let shl_count = self.emit_shift_count_mask(value_type, shl_count);
        let lshr_count = self.emit_shift_count_mask(value_type, lshr_count);
        let high = self.builder.binary(BinOp::Shl, left, shl_count);
        let low = self.builder.binary(BinOp::LShr, left, lshr_count);
        let result = self.builder.binary(BinOp::Or, high, low);
        self.push(result);
    }

    pub(crate) fn emit_sign_extend(&mut self, narrow: IrType, value_type: ValueType) {
        let operand = self.pop();
        let narrowed = self.builder.cast(CastOp::Trunc, operand, narrow);
        let widened = self.builder.cast(CastOp::SExt, narrowed, ir_type(value_type));
        self.push(widened);
    }

    // ------------------------------------------------------------------
    // Float operators
    // ------------------------------------------------------------------

    pub(crate) fn emit_fp_binary_constrained(&mut self, intrinsic: Intrinsic) {
        let right = self.pop();
        let left = self.pop();
        let ty = self.builder.value_type(left);
        let result = self
            .builder
            .intrinsic(intrinsic, vec![left, right], ty, Some(FpConstraints::default()));
        self.push(result);
    }

    pub(crate) fn emit_fp_compare(&mut self, pred: FCmpPred) {
        let right = self.pop();
        let left = self.pop();
        let compared = self.builder.fcmp(pred, left, right);
        let widened = self.coerce_bool_to_i32(compared);
        self.push(widened);
    }

    pub(crate) fn emit_fp_neg(&mut self) {
        let operand = self.pop();
        let result = self.builder.unary(crate::ir::UnOp::FNeg, operand);
        self.push(result);
    }

    pub(crate) fn emit_fp_abs(&mut self) {
        let operand = self.pop();
        let ty = self.builder.value_type(operand);
        let result = self.builder.intrinsic(Intrinsic::Fabs, vec![operand], ty, None);
        self.push(result);
    }

    pub(crate) fn emit_fp_sqrt(&mut self) {
        let operand = self.pop();
        let ty = self.builder.value_type(operand);
        let result = self.builder.intrinsic(
            Intrinsic::ConstrainedSqrt,
            vec![operand],
            ty,
            Some(FpConstraints::default()),
        );
        self.push(result);
    }

    pub(crate) fn emit_fp_copysign(&mut self) {
        let right = self.pop();
        let left = self.pop();
        let ty = self.builder.value_type(left);
        let result = self
            .builder
            .intrinsic(Intrinsic::Copysign, vec![left, right], ty, None);
        self.push(result);
    }

    /// min/max do not match the backend's NaN and signed-zero rules, so
    /// they call out to the runtime.
    pub(crate) fn emit_fp_runtime_binary(
        &mut self,
        value_type: ValueType,
        operation: &str,
    ) -> Result<(), EmitError> {
        let right = self.pop();
        let left = self.pop();
        let name = format!("{value_type}.{operation}");
        let results = self.emit_runtime_intrinsic(
            &name,
            &FunctionType::new(vec![value_type, value_type], vec![value_type]),
            vec![left, right],
        )?;
        self.push(results[0]);
        Ok(())
    }

    /// ceil/floor/trunc/nearest, same rationale as
    /// [`FunctionEmitter::emit_fp_runtime_binary`].
    pub(crate) fn emit_fp_runtime_unary(
        &mut self,
        value_type: ValueType,
        operation: &str,
    ) -> Result<(), EmitError> {
        let operand = self.pop();
        let name = format!("{value_type}.{operation}");
        let results = self.emit_runtime_intrinsic(
            &name,
            &FunctionType::new(vec![value_type], vec![value_type]),
            vec![operand],
        )?;
        self.push(results[0]);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Conversions
    // ------------------------------------------------------------------

    pub(crate) fn emit_unary_cast(&mut self, op: CastOp, to: IrType) {
        let operand = self.pop();
        let result = self.builder.cast(op, operand, to);
        self.push(result);
    }

    /// `f64.promote_f32` is emitted as a constrained promote so a later
    /// demote keeps its observable double rounding.
    pub(crate) fn emit_f64_promote(&mut self) {
        let operand = self.pop();
        let result = self.builder.intrinsic(
            Intrinsic::ConstrainedFpExt,
            vec![operand],
            IrType::F64,
            Some(FpConstraints::default()),
        );
        self.push(result);
    }

    /// Trapping float-to-int truncation: trap on NaN, trap outside the
    /// widest float bounds that do not round into range.
    pub(crate) fn emit_trunc_float_to_int(
        &mut self,
        dest_type: ValueType,
        signed: bool,
        min_bound: f64,
        max_bound: f64,
    ) -> Result<(), EmitError> {
        let operand = self.pop();
        let operand_type = self.builder.value_type(operand);

        let nan_block = self.builder.create_block("FPToInt_nan");
        let not_nan_block = self.builder.create_block("FPToInt_notNaN");
        let overflow_block = self.builder.create_block("FPToInt_overflow");
        let no_overflow_block = self.builder.create_block("FPToInt_noOverflow");

        let is_nan = self.builder.fcmp(FCmpPred::Uno, operand, operand);
        self.builder
            .cond_br(is_nan, nan_block, not_nan_block, Some(BranchHint::LikelyFalse));

        self.builder.set_insertion_point(nan_block);
        self.emit_runtime_intrinsic("invalidFloatOperationTrap", &FunctionType::default(), Vec::new())?;
        self.builder.unreachable();

        self.builder.set_insertion_point(not_nan_block);
        let max = self.float_bound(operand_type, max_bound);
        let min = self.float_bound(operand_type, min_bound);
        let too_large = self.builder.fcmp(FCmpPred::OGe, operand, max);
        let too_small = self.builder.fcmp(FCmpPred::OLe, operand, min);
        let overflow = self.builder.binary(BinOp::Or, too_large, too_small);
        self.builder.cond_br(
            overflow,
            overflow_block,
            no_overflow_block,
            Some(BranchHint::LikelyFalse),
        );

        self.builder.set_insertion_point(overflow_block);
        self.emit_runtime_intrinsic(
            "divideByZeroOrIntegerOverflowTrap",
            &FunctionType::default(),
            Vec::new(),
        )?;
        self.builder.unreachable();

        self.builder.set_insertion_point(no_overflow_block);
        let op = if signed { CastOp::FpToSi } else { CastOp::FpToUi };
        let result = self.builder.cast(op, operand, ir_type(dest_type));
        self.push(result);
        Ok(())
    }

    /// Saturating truncation: clamp to the integer bounds and map NaN to
    /// zero instead of trapping.
    pub(crate) fn emit_trunc_float_to_int_sat(
        &mut self,
        dest_type: ValueType,
        signed: bool,
        min_float: f64,
        max_float: f64,
        min_int: u64,
        max_int: u64,
    ) {
        let operand = self.pop();
        let operand_type = self.builder.value_type(operand);
        let dest = ir_type(dest_type);

        let op = if signed { CastOp::FpToSi } else { CastOp::FpToUi };
        let mut result = self.builder.cast(op, operand, dest);

        let max_bound = self.float_bound(operand_type, max_float);
        let too_large = self.builder.fcmp(FCmpPred::OGe, operand, max_bound);
        let max_value = self.builder.const_int(dest, max_int);
        result = self.builder.select(too_large, max_value, result);

        let min_bound = self.float_bound(operand_type, min_float);
        let too_small = self.builder.fcmp(FCmpPred::OLe, operand, min_bound);
        let min_value = self.builder.const_int(dest, min_int);
        result = self.builder.select(too_small, min_value, result);

        let is_nan = self.builder.fcmp(FCmpPred::Uno, operand, operand);
        let zero = self.builder.const_int(dest, 0);
        result = self.builder.select(is_nan, zero, result);

        self.push(result);
    }
}

#[cfg(test)]
mod tests {
    use crate::emit::test_utils::emit_single;
    use crate::instruction::Instruction::{self, *};
    use crate::module::ValueType;

    fn emit_binary(code: Vec<Instruction>) -> String {
        let ir = emit_single(&[], &[ValueType::I32], &[], code);
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        function.to_string()
    }

    #[test]
    fn div_s_emits_the_combined_trap() {
        let text = emit_binary(vec![
            I32Const { value: 7 },
            I32Const { value: 5 },
            I32DivS,
            End,
        ]);
        assert!(text.contains("divideByZeroOrIntegerOverflowTrapTrap"));
        assert!(text.contains("divideByZeroOrIntegerOverflowTrapSkip"));
        assert!(text.contains("sdiv"));
        // The overflow check compares against INT_MIN and -1.
        assert!(text.contains(&format!("i32 {}", i32::MIN as u32)));
        assert!(text.contains(&format!("i32 {}", u32::MAX)));
    }

    #[test]
    fn rem_s_branches_around_the_overflow_case() {
        let text = emit_binary(vec![
            I32Const { value: i32::MIN },
            I32Const { value: -1 },
            I32RemS,
            End,
        ]);
        assert!(text.contains("sremNoOverflow"));
        assert!(text.contains("sremEnd"));
        assert!(text.contains("srem"));
        // The merge phi injects the defined zero on the overflow arm.
        assert!(text.contains("phi i32"));
    }

    #[test]
    fn shifts_mask_the_count() {
        let text = emit_binary(vec![
            I32Const { value: 1 },
            I32Const { value: 37 },
            I32Shl,
            End,
        ]);
        assert!(text.contains("and i32"));
        assert!(text.contains("i32 31"));
        assert!(text.contains("shl"));
    }

    #[test]
    fn trapping_truncation_has_nan_and_overflow_arms() {
        let ir = emit_single(
            &[ValueType::F32],
            &[ValueType::I32],
            &[],
            vec![LocalGet { local_index: 0 }, I32TruncF32S, End],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        assert!(function.find_block("FPToInt_nan").is_some());
        assert!(function.find_block("FPToInt_overflow").is_some());
        assert!(function.find_block("FPToInt_noOverflow").is_some());
        // Out-of-range is tested against both bounds before truncating.
        assert!(text.contains("fcmp oge"));
        assert!(text.contains("fcmp ole"));
        assert!(text.contains("fcmp uno"));
        assert!(text.contains("fptosi"));
    }

    #[test]
    fn saturating_truncation_selects_instead_of_trapping() {
        let ir = emit_single(
            &[ValueType::F64],
            &[ValueType::I32],
            &[],
            vec![LocalGet { local_index: 0 }, I32TruncSatF64S, End],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        assert!(!text.contains("Trap"));
        assert!(text.contains("select"));
        assert!(text.contains("fcmp uno"));
    }

    #[test]
    fn float_add_is_constrained() {
        let ir = emit_single(
            &[ValueType::F32, ValueType::F32],
            &[ValueType::F32],
            &[],
            vec![
                LocalGet { local_index: 0 },
                LocalGet { local_index: 1 },
                F32Add,
                End,
            ],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        assert!(text.contains("constrained.fadd"));
        assert!(text.contains("round.tonearest"));
        assert!(text.contains("fpexcept.strict"));
    }
}
