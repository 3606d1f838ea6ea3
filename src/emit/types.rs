//! Type and value lowering
//!
//! Maps WebAssembly value types to backend IR types, produces typed zero
//! constants and literals, and canonicalizes vector values at phi
//! boundaries: vector backends distinguish lane-typed vectors of the same
//! 128-bit width, so every phi-incoming vector is rewritten to the 2xi64
//! shape and bit-cast back at lane-typed uses.

use crate::ir::{Builder, CallConv, IrType, Signature, ValueId};
use crate::module::{Const, FunctionType, ValueType};

/// The backend IR type for a WebAssembly value type. `v128` lowers to the
/// canonical 2xi64 shape.
pub(crate) fn ir_type(value_type: ValueType) -> IrType {
    match value_type {
        ValueType::I32 => IrType::I32,
        ValueType::I64 => IrType::I64,
        ValueType::F32 => IrType::F32,
        ValueType::F64 => IrType::F64,
        ValueType::V128 => IrType::I64X2,
        ValueType::Any => panic!("the any sentinel has no backend type"),
    }
}

/// The typed zero constant used for local initialization and for end-phis
/// with no incoming edges.
pub(crate) fn typed_zero(builder: &mut Builder, value_type: ValueType) -> ValueId {
    let ty = ir_type(value_type);
    builder.typed_zero(ty)
}

/// Emit a literal constant.
pub(crate) fn emit_literal(builder: &mut Builder, value: Const) -> ValueId {
    match value {
        Const::I32(v) => builder.const_i32(v as u32),
        Const::I64(v) => builder.const_i64(v as u64),
        Const::F32(v) => builder.const_f32(v),
        Const::F64(v) => builder.const_f64(v),
        Const::V128(bytes) => {
            let low = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
            let high = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
            builder.const_v128(low, high)
        }
    }
}

/// Rewrite any vector-shaped value to the canonical 2xi64 representation.
/// Applied at every phi incoming edge so one phi can merge
/// differently-shaped SIMD values that all alias 128 bits.
pub(crate) fn coerce_to_canonical_type(builder: &mut Builder, value: ValueId) -> ValueId {
    if builder.value_type(value).is_vector() {
        builder.bitcast(value, IrType::I64X2)
    } else {
        value
    }
}

/// The backend signature for a WebAssembly function type under the given
/// calling convention. The module-internal convention passes the context
/// pointer first; WebAssembly parameters follow.
pub(crate) fn signature_for(function_type: &FunctionType, call_conv: CallConv) -> Signature {
    let mut params = Vec::with_capacity(function_type.params.len() + 1);
    if call_conv == CallConv::Wasm {
        params.push(IrType::Ptr);
    }
    params.extend(function_type.params.iter().copied().map(ir_type));
    Signature {
        params,
        results: function_type.results.iter().copied().map(ir_type).collect(),
        call_conv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Linkage;

    fn builder() -> Builder {
        Builder::new(
            "t",
            Signature {
                params: vec![],
                results: vec![],
                call_conv: CallConv::C,
            },
            Linkage::Internal,
        )
    }

    #[test]
    fn value_type_mapping() {
        assert_eq!(ir_type(ValueType::I32), IrType::I32);
        assert_eq!(ir_type(ValueType::F64), IrType::F64);
        assert_eq!(ir_type(ValueType::V128), IrType::I64X2);
    }

    #[test]
    fn wasm_signature_prepends_context_pointer() {
        let ft = FunctionType::new(vec![ValueType::I32], vec![ValueType::F32]);
        let sig = signature_for(&ft, CallConv::Wasm);
        assert_eq!(sig.params, vec![IrType::Ptr, IrType::I32]);
        assert_eq!(sig.results, vec![IrType::F32]);

        let intrinsic = signature_for(&ft, CallConv::Intrinsic);
        assert_eq!(intrinsic.params, vec![IrType::I32]);
    }

    #[test]
    fn canonicalization_only_touches_vectors() {
        let mut b = builder();
        let entry = b.create_block("entry");
        b.set_insertion_point(entry);

        let scalar = b.const_i32(3);
        assert_eq!(coerce_to_canonical_type(&mut b, scalar), scalar);

        let vector = b.typed_zero(IrType::F32X4);
        let canonical = coerce_to_canonical_type(&mut b, vector);
        assert_eq!(b.value_type(canonical), IrType::I64X2);
    }

    #[test]
    fn v128_literals_split_into_lanes() {
        let mut b = builder();
        let entry = b.create_block("entry");
        b.set_insertion_point(entry);
        let mut bytes = [0u8; 16];
        bytes[0] = 1;
        bytes[8] = 2;
        let v = emit_literal(&mut b, Const::V128(bytes));
        assert_eq!(b.value_type(v), IrType::I64X2);
    }
}
