//! SIMD operator lowering
//!
//! Operand stack values are bit-cast to the lane-typed vector before each
//! operation and results stay lane-typed; phi boundaries canonicalize
//! back to 2xi64. Vector comparisons produce all-ones/all-zeros masks of
//! the same geometry, which is what bitwise selection and the saturating
//! truncations consume.

use super::function::FunctionEmitter;
use crate::ir::{BinOp, CastOp, FCmpPred, ICmpPred, Intrinsic, IrType, UnOp, ValueId};

impl FunctionEmitter<'_, '_> {
    fn pop_vector_as(&mut self, vector: IrType) -> ValueId {
        let value = self.pop();
        self.builder.bitcast(value, vector)
    }

    pub(crate) fn emit_vec_binary(&mut self, vector: IrType, op: BinOp) {
        let right = self.pop_vector_as(vector);
        let left = self.pop_vector_as(vector);
        let result = self.builder.binary(op, left, right);
        self.push(result);
    }

    pub(crate) fn emit_vec_compare_int(&mut self, vector: IrType, pred: ICmpPred) {
        let right = self.pop_vector_as(vector);
        let left = self.pop_vector_as(vector);
        let mask = self.builder.icmp(pred, left, right);
        self.push(mask);
    }

    pub(crate) fn emit_vec_compare_fp(&mut self, vector: IrType, pred: FCmpPred) {
        let right = self.pop_vector_as(vector);
        let left = self.pop_vector_as(vector);
        let mask = self.builder.fcmp(pred, left, right);
        self.push(mask);
    }

    pub(crate) fn emit_vec_neg(&mut self, vector: IrType) {
        let operand = self.pop_vector_as(vector);
        let result = self.builder.unary(UnOp::Neg, operand);
        self.push(result);
    }

    pub(crate) fn emit_vec_fneg(&mut self, vector: IrType) {
        let operand = self.pop_vector_as(vector);
        let result = self.builder.unary(UnOp::FNeg, operand);
        self.push(result);
    }

    pub(crate) fn emit_vec_fabs(&mut self, vector: IrType) {
        let operand = self.pop_vector_as(vector);
        let result = self.builder.intrinsic(Intrinsic::Fabs, vec![operand], vector, None);
        self.push(result);
    }

    pub(crate) fn emit_vec_fsqrt(&mut self, vector: IrType) {
        let operand = self.pop_vector_as(vector);
        let result = self.builder.intrinsic(Intrinsic::Sqrt, vec![operand], vector, None);
        self.push(result);
    }

    /// Lane-wise float min/max via the platform vector intrinsics.
    pub(crate) fn emit_vec_minmax(&mut self, vector: IrType, is_min: bool) {
        let right = self.pop_vector_as(vector);
        let left = self.pop_vector_as(vector);
        let intrinsic = if is_min {
            Intrinsic::PlatformVectorMin
        } else {
            Intrinsic::PlatformVectorMax
        };
        let result = self.builder.intrinsic(intrinsic, vec![left, right], vector, None);
        self.push(result);
    }

    /// Saturating integer add/sub via the platform SIMD intrinsics.
    pub(crate) fn emit_vec_saturating(&mut self, vector: IrType, intrinsic: Intrinsic) {
        let right = self.pop_vector_as(vector);
        let left = self.pop_vector_as(vector);
        let result = self.builder.intrinsic(intrinsic, vec![left, right], vector, None);
        self.push(result);
    }

    pub(crate) fn emit_any_true(&mut self, vector: IrType) {
        self.emit_lane_reduce(vector, BinOp::Or);
    }

    pub(crate) fn emit_all_true(&mut self, vector: IrType) {
        self.emit_lane_reduce(vector, BinOp::And);
    }

    fn emit_lane_reduce(&mut self, vector: IrType, op: BinOp) {
        let operand = self.pop_vector_as(vector);
        let lanes = vector.lane_count().expect("lane reduce of non-vector");
        let mut reduced: Option<ValueId> = None;
        for lane in 0..lanes {
            let scalar = self.builder.extract_lane(operand, lane as u8);
            reduced = Some(match reduced {
                None => scalar,
                Some(previous) => self.builder.binary(op, previous, scalar),
            });
        }
        let reduced = reduced.expect("vector with no lanes");
        let lane_type = vector.lane_type().unwrap();
        let zero = self.builder.typed_zero(lane_type);
        let non_zero = self.builder.icmp(ICmpPred::Ne, reduced, zero);
        let widened = self.coerce_bool_to_i32(non_zero);
        self.push(widened);
    }

    pub(crate) fn emit_splat(&mut self, vector: IrType) {
        let scalar = self.pop();
        let lane_type = vector.lane_type().expect("splat to non-vector");
        // i8/i16 lanes arrive as i32 on the operand stack.
        let scalar = if matches!(lane_type, IrType::I8 | IrType::I16) {
            self.builder.cast(CastOp::Trunc, scalar, lane_type)
        } else {
            scalar
        };
        let result = self.builder.splat(scalar, vector);
        self.push(result);
    }

    /// `extend` widens i8/i16 lane scalars back to the i32 the operand
    /// stack carries.
    pub(crate) fn emit_extract_lane(&mut self, vector: IrType, lane: u8, extend: Option<CastOp>) {
        let operand = self.pop_vector_as(vector);
        let scalar = self.builder.extract_lane(operand, lane);
        let result = match extend {
            Some(op) => self.builder.cast(op, scalar, IrType::I32),
            None => scalar,
        };
        self.push(result);
    }

    pub(crate) fn emit_replace_lane(&mut self, vector: IrType, lane: u8) {
        let scalar = self.pop();
        let operand = self.pop_vector_as(vector);
        let lane_type = vector.lane_type().unwrap();
        let scalar = if matches!(lane_type, IrType::I8 | IrType::I16) {
            self.builder.cast(CastOp::Trunc, scalar, lane_type)
        } else {
            scalar
        };
        let result = self.builder.replace_lane(operand, scalar, lane);
        self.push(result);
    }

    pub(crate) fn emit_shuffle(&mut self, lanes: [u8; 16]) {
        let right = self.pop_vector_as(IrType::I8X16);
        let left = self.pop_vector_as(IrType::I8X16);
        let result = self.builder.shuffle(left, right, lanes);
        self.push(result);
    }

    pub(crate) fn emit_v128_bitwise(&mut self, op: BinOp) {
        let right = self.pop();
        let right_type = self.builder.value_type(right);
        let left = self.pop();
        let left = self.builder.bitcast(left, right_type);
        let result = self.builder.binary(op, left, right);
        self.push(result);
    }

    pub(crate) fn emit_v128_not(&mut self) {
        let operand = self.pop();
        let result = self.builder.unary(UnOp::Not, operand);
        self.push(result);
    }

    fn bit_select(&mut self, mask: ValueId, on_true: ValueId, on_false: ValueId) -> ValueId {
        let selected_true = self.builder.binary(BinOp::And, on_true, mask);
        let inverted = self.builder.unary(UnOp::Not, mask);
        let selected_false = self.builder.binary(BinOp::And, on_false, inverted);
        self.builder.binary(BinOp::Or, selected_true, selected_false)
    }

    pub(crate) fn emit_v128_bitselect(&mut self) {
        let mask = self.pop_vector_as(IrType::I64X2);
        let on_false = self.pop_vector_as(IrType::I64X2);
        let on_true = self.pop_vector_as(IrType::I64X2);
        let result = self.bit_select(mask, on_true, on_false);
        self.push(result);
    }

    /// Lane-wise select driven by a compare mask of the same geometry.
    fn vector_select(&mut self, mask: ValueId, on_true: ValueId, on_false: ValueId) -> ValueId {
        let result_type = self.builder.value_type(on_true);
        let mask_type = self.builder.value_type(mask);
        let on_true = self.builder.bitcast(on_true, mask_type);
        let on_false = self.builder.bitcast(on_false, mask_type);
        let selected = self.bit_select(mask, on_true, on_false);
        self.builder.bitcast(selected, result_type)
    }

    pub(crate) fn emit_vec_convert(&mut self, from: IrType, to: IrType, op: CastOp) {
        let operand = self.pop_vector_as(from);
        let result = self.builder.cast(op, operand, to);
        self.push(result);
    }

    fn splat_int(&mut self, vector: IrType, value: u64) -> ValueId {
        let lane_type = vector.lane_type().unwrap();
        let scalar = self.builder.const_int(lane_type, value);
        self.builder.splat(scalar, vector)
    }

    fn splat_float(&mut self, vector: IrType, value: f64) -> ValueId {
        let scalar = match vector.lane_type().unwrap() {
            IrType::F32 => self.builder.const_f32(value as f32),
            IrType::F64 => self.builder.const_f64(value),
            other => panic!("float splat of {other}"),
        };
        self.builder.splat(scalar, vector)
    }

    /// Lane-wise saturating float-to-int truncation: out-of-range lanes
    /// clamp to the integer bounds and NaN lanes become zero.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn emit_vec_trunc_sat(
        &mut self,
        int_vector: IrType,
        float_vector: IrType,
        signed: bool,
        min_float: f64,
        max_float: f64,
        min_int: u64,
        max_int: u64,
    ) {
        let operand = self.pop_vector_as(float_vector);

        let op = if signed { CastOp::FpToSi } else { CastOp::FpToUi };
        let truncated = self.builder.cast(op, operand, int_vector);

        let max_bound = self.splat_float(float_vector, max_float);
        let too_large = self.builder.fcmp(FCmpPred::OGe, operand, max_bound);
        let max_lanes = self.splat_int(int_vector, max_int);
        let clamped_high = self.vector_select(too_large, max_lanes, truncated);

        let min_bound = self.splat_float(float_vector, min_float);
        let too_small = self.builder.fcmp(FCmpPred::OLe, operand, min_bound);
        let min_lanes = self.splat_int(int_vector, min_int);
        let clamped = self.vector_select(too_small, min_lanes, clamped_high);

        let is_nan = self.builder.fcmp(FCmpPred::Uno, operand, operand);
        let zero_lanes = self.splat_int(int_vector, 0);
        let result = self.vector_select(is_nan, zero_lanes, clamped);

        self.push(result);
    }
}

#[cfg(test)]
mod tests {
    use crate::emit::test_utils::emit_single;
    use crate::instruction::Instruction::*;
    use crate::module::ValueType;

    #[test]
    fn splat_truncates_narrow_lane_scalars() {
        let ir = emit_single(
            &[ValueType::I32],
            &[ValueType::V128],
            &[],
            vec![LocalGet { local_index: 0 }, I8x16Splat, End],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        assert!(text.contains("trunc"));
        assert!(text.contains("splat"));
        // The result reaches the return phi canonicalized to 2xi64.
        assert!(text.contains("bitcast"));
    }

    #[test]
    fn extract_lane_signed_byte_widens_to_i32() {
        let ir = emit_single(
            &[ValueType::V128],
            &[ValueType::I32],
            &[],
            vec![
                LocalGet { local_index: 0 },
                I8x16ExtractLaneS { lane: 3 },
                End,
            ],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        assert!(text.contains("extractlane"));
        assert!(text.contains("sext"));
    }

    #[test]
    fn any_true_reduces_lanes() {
        let ir = emit_single(
            &[ValueType::V128],
            &[ValueType::I32],
            &[],
            vec![LocalGet { local_index: 0 }, I32x4AnyTrue, End],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        // Four lanes or-ed together, then tested against zero.
        assert_eq!(text.matches("extractlane").count(), 4);
        assert_eq!(text.matches("or i32").count(), 3);
        assert!(text.contains("icmp ne"));
    }

    #[test]
    fn vec_trunc_sat_selects_bounds_and_nan() {
        let ir = emit_single(
            &[ValueType::V128],
            &[ValueType::V128],
            &[],
            vec![LocalGet { local_index: 0 }, I32x4TruncSatF32x4S, End],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        assert!(text.contains("fptosi"));
        assert!(text.contains("fcmp oge"));
        assert!(text.contains("fcmp ole"));
        assert!(text.contains("fcmp uno"));
        assert!(!text.contains("Trap"));
    }

    #[test]
    fn bitselect_composes_bitwise_ops() {
        let ir = emit_single(
            &[ValueType::V128, ValueType::V128, ValueType::V128],
            &[ValueType::V128],
            &[],
            vec![
                LocalGet { local_index: 0 },
                LocalGet { local_index: 1 },
                LocalGet { local_index: 2 },
                V128Bitselect,
                End,
            ],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        assert!(text.contains("and i64x2"));
        assert!(text.contains("not"));
        assert!(text.contains("or i64x2"));
    }
}
