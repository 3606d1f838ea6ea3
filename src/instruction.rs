//! WebAssembly operator stream representation
//!
//! This module defines the decoded instruction forms the translator
//! consumes. The upstream decoder/validator produces these with structured
//! immediates already resolved: branch depths, block types, lane indices,
//! alignment/offset pairs, and branch-table indices. kiln never decodes
//! bytes itself.

use crate::module::BlockType;
use fhex::ToHex;
use std::fmt;

/// Memory argument for memory access instructions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemArg {
    /// Alignment as a power of 2
    pub align: u32,
    /// Constant byte offset added to the address operand
    pub offset: u32,
}

/// Algebraic data type representing all WebAssembly instructions kiln
/// translates: the MVP set, sign-extension, non-trapping conversions,
/// SIMD, atomics, and exception handling.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    // Control instructions
    Unreachable,
    Nop,
    Block { block_type: BlockType },
    Loop { block_type: BlockType },
    If { block_type: BlockType },
    Else,
    End,
    Br { depth: u32 },
    BrIf { depth: u32 },
    BrTable { table_index: u32, default_depth: u32 },
    Return,
    Call { function_index: u32 },
    CallIndirect { type_index: u32, table_index: u32 },

    // Exception handling
    Try { block_type: BlockType },
    Catch { exception_type_index: u32 },
    CatchAll,
    Throw { exception_type_index: u32 },
    Rethrow { catch_depth: u32 },

    // Parametric instructions
    Drop,
    Select,

    // Variable instructions
    LocalGet { local_index: u32 },
    LocalSet { local_index: u32 },
    LocalTee { local_index: u32 },
    GlobalGet { global_index: u32 },
    GlobalSet { global_index: u32 },

    // Memory instructions
    I32Load { memarg: MemArg },
    I64Load { memarg: MemArg },
    F32Load { memarg: MemArg },
    F64Load { memarg: MemArg },
    I32Load8S { memarg: MemArg },
    I32Load8U { memarg: MemArg },
    I32Load16S { memarg: MemArg },
    I32Load16U { memarg: MemArg },
    I64Load8S { memarg: MemArg },
    I64Load8U { memarg: MemArg },
    I64Load16S { memarg: MemArg },
    I64Load16U { memarg: MemArg },
    I64Load32S { memarg: MemArg },
    I64Load32U { memarg: MemArg },
    I32Store { memarg: MemArg },
    I64Store { memarg: MemArg },
    F32Store { memarg: MemArg },
    F64Store { memarg: MemArg },
    I32Store8 { memarg: MemArg },
    I32Store16 { memarg: MemArg },
    I64Store8 { memarg: MemArg },
    I64Store16 { memarg: MemArg },
    I64Store32 { memarg: MemArg },
    MemorySize,
    MemoryGrow,

    // Numeric instructions - Constants
    I32Const { value: i32 },
    I64Const { value: i64 },
    F32Const { value: f32 },
    F64Const { value: f64 },

    // Numeric instructions - i32 operations
    I32Eqz,
    I32Eq,
    I32Ne,
    I32LtS,
    I32LtU,
    I32GtS,
    I32GtU,
    I32LeS,
    I32LeU,
    I32GeS,
    I32GeU,
    I32Clz,
    I32Ctz,
    I32Popcnt,
    I32Add,
    I32Sub,
    I32Mul,
    I32DivS,
    I32DivU,
    I32RemS,
    I32RemU,
    I32And,
    I32Or,
    I32Xor,
    I32Shl,
    I32ShrS,
    I32ShrU,
    I32Rotl,
    I32Rotr,

    // Numeric instructions - i64 operations
    I64Eqz,
    I64Eq,
    I64Ne,
    I64LtS,
    I64LtU,
    I64GtS,
    I64GtU,
    I64LeS,
    I64LeU,
    I64GeS,
    I64GeU,
    I64Clz,
    I64Ctz,
    I64Popcnt,
    I64Add,
    I64Sub,
    I64Mul,
    I64DivS,
    I64DivU,
    I64RemS,
    I64RemU,
    I64And,
    I64Or,
    I64Xor,
    I64Shl,
    I64ShrS,
    I64ShrU,
    I64Rotl,
    I64Rotr,

    // Numeric instructions - f32 operations
    F32Eq,
    F32Ne,
    F32Lt,
    F32Gt,
    F32Le,
    F32Ge,
    F32Abs,
    F32Neg,
    F32Ceil,
    F32Floor,
    F32Trunc,
    F32Nearest,
    F32Sqrt,
    F32Add,
    F32Sub,
    F32Mul,
    F32Div,
    F32Min,
    F32Max,
    F32Copysign,

    // Numeric instructions - f64 operations
    F64Eq,
    F64Ne,
    F64Lt,
    F64Gt,
    F64Le,
    F64Ge,
    F64Abs,
    F64Neg,
    F64Ceil,
    F64Floor,
    F64Trunc,
    F64Nearest,
    F64Sqrt,
    F64Add,
    F64Sub,
    F64Mul,
    F64Div,
    F64Min,
    F64Max,
    F64Copysign,

    // Numeric instructions - Conversions
    I32WrapI64,
    I32TruncF32S,
    I32TruncF32U,
    I32TruncF64S,
    I32TruncF64U,
    I64ExtendI32S,
    I64ExtendI32U,
    I64TruncF32S,
    I64TruncF32U,
    I64TruncF64S,
    I64TruncF64U,
    F32ConvertI32S,
    F32ConvertI32U,
    F32ConvertI64S,
    F32ConvertI64U,
    F32DemoteF64,
    F64ConvertI32S,
    F64ConvertI32U,
    F64ConvertI64S,
    F64ConvertI64U,
    F64PromoteF32,
    I32ReinterpretF32,
    I64ReinterpretF64,
    F32ReinterpretI32,
    F64ReinterpretI64,

    // Sign extension operations
    I32Extend8S,
    I32Extend16S,
    I64Extend8S,
    I64Extend16S,
    I64Extend32S,

    // Saturating truncation operations
    I32TruncSatF32S,
    I32TruncSatF32U,
    I32TruncSatF64S,
    I32TruncSatF64U,
    I64TruncSatF32S,
    I64TruncSatF32U,
    I64TruncSatF64S,
    I64TruncSatF64U,

    // Atomic memory instructions
    MemoryAtomicNotify { memarg: MemArg },
    MemoryAtomicWait32 { memarg: MemArg },
    MemoryAtomicWait64 { memarg: MemArg },
    I32AtomicLoad { memarg: MemArg },
    I64AtomicLoad { memarg: MemArg },
    I32AtomicLoad8U { memarg: MemArg },
    I32AtomicLoad16U { memarg: MemArg },
    I64AtomicLoad8U { memarg: MemArg },
    I64AtomicLoad16U { memarg: MemArg },
    I64AtomicLoad32U { memarg: MemArg },
    I32AtomicStore { memarg: MemArg },
    I64AtomicStore { memarg: MemArg },
    I32AtomicStore8 { memarg: MemArg },
    I32AtomicStore16 { memarg: MemArg },
    I64AtomicStore8 { memarg: MemArg },
    I64AtomicStore16 { memarg: MemArg },
    I64AtomicStore32 { memarg: MemArg },
    I32AtomicRmwAdd { memarg: MemArg },
    I64AtomicRmwAdd { memarg: MemArg },
    I32AtomicRmw8AddU { memarg: MemArg },
    I32AtomicRmw16AddU { memarg: MemArg },
    I64AtomicRmw8AddU { memarg: MemArg },
    I64AtomicRmw16AddU { memarg: MemArg },
    I64AtomicRmw32AddU { memarg: MemArg },
    I32AtomicRmwSub { memarg: MemArg },
    I64AtomicRmwSub { memarg: MemArg },
    I32AtomicRmw8SubU { memarg: MemArg },
    I32AtomicRmw16SubU { memarg: MemArg },
    I64AtomicRmw8SubU { memarg: MemArg },
    I64AtomicRmw16SubU { memarg: MemArg },
    I64AtomicRmw32SubU { memarg: MemArg },
    I32AtomicRmwAnd { memarg: MemArg },
    I64AtomicRmwAnd { memarg: MemArg },
    I32AtomicRmw8AndU { memarg: MemArg },
    I32AtomicRmw16AndU { memarg: MemArg },
    I64AtomicRmw8AndU { memarg: MemArg },
    I64AtomicRmw16AndU { memarg: MemArg },
    I64AtomicRmw32AndU { memarg: MemArg },
    I32AtomicRmwOr { memarg: MemArg },
    I64AtomicRmwOr { memarg: MemArg },
    I32AtomicRmw8OrU { memarg: MemArg },
    I32AtomicRmw16OrU { memarg: MemArg },
    I64AtomicRmw8OrU { memarg: MemArg },
    I64AtomicRmw16OrU { memarg: MemArg },
    I64AtomicRmw32OrU { memarg: MemArg },
    I32AtomicRmwXor { memarg: MemArg },
    I64AtomicRmwXor { memarg: MemArg },
    I32AtomicRmw8XorU { memarg: MemArg },
    I32AtomicRmw16XorU { memarg: MemArg },
    I64AtomicRmw8XorU { memarg: MemArg },
    I64AtomicRmw16XorU { memarg: MemArg },
    I64AtomicRmw32XorU { memarg: MemArg },
    I32AtomicRmwXchg { memarg: MemArg },
    I64AtomicRmwXchg { memarg: MemArg },
    I32AtomicRmw8XchgU { memarg: MemArg },
    I32AtomicRmw16XchgU { memarg: MemArg },
    I64AtomicRmw8XchgU { memarg: MemArg },
    I64AtomicRmw16XchgU { memarg: MemArg },
    I64AtomicRmw32XchgU { memarg: MemArg },
    I32AtomicRmwCmpxchg { memarg: MemArg },
    I64AtomicRmwCmpxchg { memarg: MemArg },
    I32AtomicRmw8CmpxchgU { memarg: MemArg },
    I32AtomicRmw16CmpxchgU { memarg: MemArg },
    I64AtomicRmw8CmpxchgU { memarg: MemArg },
    I64AtomicRmw16CmpxchgU { memarg: MemArg },
    I64AtomicRmw32CmpxchgU { memarg: MemArg },

    // SIMD instructions
    V128Load { memarg: MemArg },
    V128Store { memarg: MemArg },
    V128Const { bytes: [u8; 16] },
    I8x16Shuffle { lanes: [u8; 16] },
    I8x16Splat,
    I16x8Splat,
    I32x4Splat,
    I64x2Splat,
    F32x4Splat,
    F64x2Splat,
    I8x16ExtractLaneS { lane: u8 },
    I8x16ExtractLaneU { lane: u8 },
    I16x8ExtractLaneS { lane: u8 },
    I16x8ExtractLaneU { lane: u8 },
    I32x4ExtractLane { lane: u8 },
    I64x2ExtractLane { lane: u8 },
    F32x4ExtractLane { lane: u8 },
    F64x2ExtractLane { lane: u8 },
    I8x16ReplaceLane { lane: u8 },
    I16x8ReplaceLane { lane: u8 },
    I32x4ReplaceLane { lane: u8 },
    I64x2ReplaceLane { lane: u8 },
    F32x4ReplaceLane { lane: u8 },
    F64x2ReplaceLane { lane: u8 },
    V128And,
    V128Or,
    V128Xor,
    V128Not,
    V128Bitselect,

    I8x16Neg,
    I8x16AnyTrue,
    I8x16AllTrue,
    I8x16Add,
    I8x16Sub,
    I8x16Mul,
    I8x16DivS,
    I8x16DivU,
    I8x16Shl,
    I8x16ShrS,
    I8x16ShrU,
    I8x16AddSatS,
    I8x16AddSatU,
    I8x16SubSatS,
    I8x16SubSatU,
    I8x16Eq,
    I8x16Ne,
    I8x16LtS,
    I8x16LtU,
    I8x16GtS,
    I8x16GtU,
    I8x16LeS,
    I8x16LeU,
    I8x16GeS,
    I8x16GeU,

    I16x8Neg,
    I16x8AnyTrue,
    I16x8AllTrue,
    I16x8Add,
    I16x8Sub,
    I16x8Mul,
    I16x8DivS,
    I16x8DivU,
    I16x8Shl,
    I16x8ShrS,
    I16x8ShrU,
    I16x8AddSatS,
    I16x8AddSatU,
    I16x8SubSatS,
    I16x8SubSatU,
    I16x8Eq,
    I16x8Ne,
    I16x8LtS,
    I16x8LtU,
    I16x8GtS,
    I16x8GtU,
    I16x8LeS,
    I16x8LeU,
    I16x8GeS,
    I16x8GeU,

    I32x4Neg,
    I32x4AnyTrue,
    I32x4AllTrue,
    I32x4Add,
    I32x4Sub,
    I32x4Mul,
    I32x4DivS,
    I32x4DivU,
    I32x4Shl,
    I32x4ShrS,
    I32x4ShrU,
    I32x4Eq,
    I32x4Ne,
    I32x4LtS,
    I32x4LtU,
    I32x4GtS,
    I32x4GtU,
    I32x4LeS,
    I32x4LeU,
    I32x4GeS,
    I32x4GeU,

    I64x2Neg,
    I64x2AnyTrue,
    I64x2AllTrue,
    I64x2Add,
    I64x2Sub,
    I64x2Mul,
    I64x2DivS,
    I64x2DivU,
    I64x2Shl,
    I64x2ShrS,
    I64x2ShrU,
    I64x2Eq,
    I64x2Ne,
    I64x2LtS,
    I64x2LtU,
    I64x2GtS,
    I64x2GtU,
    I64x2LeS,
    I64x2LeU,
    I64x2GeS,
    I64x2GeU,

    F32x4Abs,
    F32x4Neg,
    F32x4Sqrt,
    F32x4Add,
    F32x4Sub,
    F32x4Mul,
    F32x4Div,
    F32x4Min,
    F32x4Max,
    F32x4Eq,
    F32x4Ne,
    F32x4Lt,
    F32x4Gt,
    F32x4Le,
    F32x4Ge,

    F64x2Abs,
    F64x2Neg,
    F64x2Sqrt,
    F64x2Add,
    F64x2Sub,
    F64x2Mul,
    F64x2Div,
    F64x2Min,
    F64x2Max,
    F64x2Eq,
    F64x2Ne,
    F64x2Lt,
    F64x2Gt,
    F64x2Le,
    F64x2Ge,

    F32x4ConvertI32x4S,
    F32x4ConvertI32x4U,
    F64x2ConvertI64x2S,
    F64x2ConvertI64x2U,
    I32x4TruncSatF32x4S,
    I32x4TruncSatF32x4U,
    I64x2TruncSatF64x2S,
    I64x2TruncSatF64x2U,
}

impl Instruction {
    /// Get the mnemonic for this instruction
    pub fn mnemonic(&self) -> &'static str {
        use Instruction::*;
        match self {
            // Control
            Unreachable => "unreachable",
            Nop => "nop",
            Block { .. } => "block",
            Loop { .. } => "loop",
            If { .. } => "if",
            Else => "else",
            End => "end",
            Br { .. } => "br",
            BrIf { .. } => "br_if",
            BrTable { .. } => "br_table",
            Return => "return",
            Call { .. } => "call",
            CallIndirect { .. } => "call_indirect",

            // Exception handling
            Try { .. } => "try",
            Catch { .. } => "catch",
            CatchAll => "catch_all",
            Throw { .. } => "throw",
            Rethrow { .. } => "rethrow",

            // Parametric
            Drop => "drop",
            Select => "select",

            // Variable
            LocalGet { .. } => "local.get",
            LocalSet { .. } => "local.set",
            LocalTee { .. } => "local.tee",
            GlobalGet { .. } => "global.get",
            GlobalSet { .. } => "global.set",

            // Memory
            I32Load { .. } => "i32.load",
            I64Load { .. } => "i64.load",
            F32Load { .. } => "f32.load",
            F64Load { .. } => "f64.load",
            I32Load8S { .. } => "i32.load8_s",
            I32Load8U { .. } => "i32.load8_u",
            I32Load16S { .. } => "i32.load16_s",
            I32Load16U { .. } => "i32.load16_u",
            I64Load8S { .. } => "i64.load8_s",
            I64Load8U { .. } => "i64.load8_u",
            I64Load16S { .. } => "i64.load16_s",
            I64Load16U { .. } => "i64.load16_u",
            I64Load32S { .. } => "i64.load32_s",
            I64Load32U { .. } => "i64.load32_u",
            I32Store { .. } => "i32.store",
            I64Store { .. } => "i64.store",
            F32Store { .. } => "f32.store",
            F64Store { .. } => "f64.store",
            I32Store8 { .. } => "i32.store8",
            I32Store16 { .. } => "i32.store16",
            I64Store8 { .. } => "i64.store8",
            I64Store16 { .. } => "i64.store16",
            I64Store32 { .. } => "i64.store32",
            MemorySize => "memory.size",
            MemoryGrow => "memory.grow",

            // Numeric
            I32Const { .. } => "i32.const",
            I64Const { .. } => "i64.const",
            F32Const { .. } => "f32.const",
            F64Const { .. } => "f64.const",
            I32Eqz => "i32.eqz",
            I32Eq => "i32.eq",
            I32Ne => "i32.ne",
            I32LtS => "i32.lt_s",
            I32LtU => "i32.lt_u",
            I32GtS => "i32.gt_s",
            I32GtU => "i32.gt_u",
            I32LeS => "i32.le_s",
            I32LeU => "i32.le_u",
            I32GeS => "i32.ge_s",
            I32GeU => "i32.ge_u",
            I32Clz => "i32.clz",
            I32Ctz => "i32.ctz",
            I32Popcnt => "i32.popcnt",
            I32Add => "i32.add",
            I32Sub => "i32.sub",
            I32Mul => "i32.mul",
            I32DivS => "i32.div_s",
            I32DivU => "i32.div_u",
            I32RemS => "i32.rem_s",
            I32RemU => "i32.rem_u",
            I32And => "i32.and",
            I32Or => "i32.or",
            I32Xor => "i32.xor",
            I32Shl => "i32.shl",
            I32ShrS => "i32.shr_s",
            I32ShrU => "i32.shr_u",
            I32Rotl => "i32.rotl",
            I32Rotr => "i32.rotr",
            I64Eqz => "i64.eqz",
            I64Eq => "i64.eq",
            I64Ne => "i64.ne",
            I64LtS => "i64.lt_s",
            I64LtU => "i64.lt_u",
            I64GtS => "i64.gt_s",
            I64GtU => "i64.gt_u",
            I64LeS => "i64.le_s",
            I64LeU => "i64.le_u",
            I64GeS => "i64.ge_s",
            I64GeU => "i64.ge_u",
            I64Clz => "i64.clz",
            I64Ctz => "i64.ctz",
            I64Popcnt => "i64.popcnt",
            I64Add => "i64.add",
            I64Sub => "i64.sub",
            I64Mul => "i64.mul",
            I64DivS => "i64.div_s",
            I64DivU => "i64.div_u",
            I64RemS => "i64.rem_s",
            I64RemU => "i64.rem_u",
            I64And => "i64.and",
            I64Or => "i64.or",
            I64Xor => "i64.xor",
            I64Shl => "i64.shl",
            I64ShrS => "i64.shr_s",
            I64ShrU => "i64.shr_u",
            I64Rotl => "i64.rotl",
            I64Rotr => "i64.rotr",
            F32Eq => "f32.eq",
            F32Ne => "f32.ne",
            F32Lt => "f32.lt",
            F32Gt => "f32.gt",
            F32Le => "f32.le",
            F32Ge => "f32.ge",
            F32Abs => "f32.abs",
            F32Neg => "f32.neg",
            F32Ceil => "f32.ceil",
            F32Floor => "f32.floor",
            F32Trunc => "f32.trunc",
            F32Nearest => "f32.nearest",
            F32Sqrt => "f32.sqrt",
            F32Add => "f32.add",
            F32Sub => "f32.sub",
            F32Mul => "f32.mul",
            F32Div => "f32.div",
            F32Min => "f32.min",
            F32Max => "f32.max",
            F32Copysign => "f32.copysign",
            F64Eq => "f64.eq",
            F64Ne => "f64.ne",
            F64Lt => "f64.lt",
            F64Gt => "f64.gt",
            F64Le => "f64.le",
            F64Ge => "f64.ge",
            F64Abs => "f64.abs",
            F64Neg => "f64.neg",
            F64Ceil => "f64.ceil",
            F64Floor => "f64.floor",
            F64Trunc => "f64.trunc",
            F64Nearest => "f64.nearest",
            F64Sqrt => "f64.sqrt",
            F64Add => "f64.add",
            F64Sub => "f64.sub",
            F64Mul => "f64.mul",
            F64Div => "f64.div",
            F64Min => "f64.min",
            F64Max => "f64.max",
            F64Copysign => "f64.copysign",
            I32WrapI64 => "i32.wrap_i64",
            I32TruncF32S => "i32.trunc_f32_s",
            I32TruncF32U => "i32.trunc_f32_u",
            I32TruncF64S => "i32.trunc_f64_s",
            I32TruncF64U => "i32.trunc_f64_u",
            I64ExtendI32S => "i64.extend_i32_s",
            I64ExtendI32U => "i64.extend_i32_u",
            I64TruncF32S => "i64.trunc_f32_s",
            I64TruncF32U => "i64.trunc_f32_u",
            I64TruncF64S => "i64.trunc_f64_s",
            I64TruncF64U => "i64.trunc_f64_u",
            F32ConvertI32S => "f32.convert_i32_s",
            F32ConvertI32U => "f32.convert_i32_u",
            F32ConvertI64S => "f32.convert_i64_s",
            F32ConvertI64U => "f32.convert_i64_u",
            F32DemoteF64 => "f32.demote_f64",
            F64ConvertI32S => "f64.convert_i32_s",
            F64ConvertI32U => "f64.convert_i32_u",
            F64ConvertI64S => "f64.convert_i64_s",
            F64ConvertI64U => "f64.convert_i64_u",
            F64PromoteF32 => "f64.promote_f32",
            I32ReinterpretF32 => "i32.reinterpret_f32",
            I64ReinterpretF64 => "i64.reinterpret_f64",
            F32ReinterpretI32 => "f32.reinterpret_i32",
            F64ReinterpretI64 => "f64.reinterpret_i64",
            I32Extend8S => "i32.extend8_s",
            I32Extend16S => "i32.extend16_s",
            I64Extend8S => "i64.extend8_s",
            I64Extend16S => "i64.extend16_s",
            I64Extend32S => "i64.extend32_s",
            I32TruncSatF32S => "i32.trunc_sat_f32_s",
            I32TruncSatF32U => "i32.trunc_sat_f32_u",
            I32TruncSatF64S => "i32.trunc_sat_f64_s",
            I32TruncSatF64U => "i32.trunc_sat_f64_u",
            I64TruncSatF32S => "i64.trunc_sat_f32_s",
            I64TruncSatF32U => "i64.trunc_sat_f32_u",
            I64TruncSatF64S => "i64.trunc_sat_f64_s",
            I64TruncSatF64U => "i64.trunc_sat_f64_u",

            // Atomics
            MemoryAtomicNotify { .. } => "memory.atomic.notify",
            MemoryAtomicWait32 { .. } => "memory.atomic.wait32",
            MemoryAtomicWait64 { .. } => "memory.atomic.wait64",
            I32AtomicLoad { .. } => "i32.atomic.load",
            I64AtomicLoad { .. } => "i64.atomic.load",
            I32AtomicLoad8U { .. } => "i32.atomic.load8_u",
            I32AtomicLoad16U { .. } => "i32.atomic.load16_u",
            I64AtomicLoad8U { .. } => "i64.atomic.load8_u",
            I64AtomicLoad16U { .. } => "i64.atomic.load16_u",
            I64AtomicLoad32U { .. } => "i64.atomic.load32_u",
            I32AtomicStore { .. } => "i32.atomic.store",
            I64AtomicStore { .. } => "i64.atomic.store",
            I32AtomicStore8 { .. } => "i32.atomic.store8",
            I32AtomicStore16 { .. } => "i32.atomic.store16",
            I64AtomicStore8 { .. } => "i64.atomic.store8",
            I64AtomicStore16 { .. } => "i64.atomic.store16",
            I64AtomicStore32 { .. } => "i64.atomic.store32",
            I32AtomicRmwAdd { .. } => "i32.atomic.rmw.add",
            I64AtomicRmwAdd { .. } => "i64.atomic.rmw.add",
            I32AtomicRmw8AddU { .. } => "i32.atomic.rmw8.add_u",
            I32AtomicRmw16AddU { .. } => "i32.atomic.rmw16.add_u",
            I64AtomicRmw8AddU { .. } => "i64.atomic.rmw8.add_u",
            I64AtomicRmw16AddU { .. } => "i64.atomic.rmw16.add_u",
            I64AtomicRmw32AddU { .. } => "i64.atomic.rmw32.add_u",
            I32AtomicRmwSub { .. } => "i32.atomic.rmw.sub",
            I64AtomicRmwSub { .. } => "i64.atomic.rmw.sub",
            I32AtomicRmw8SubU { .. } => "i32.atomic.rmw8.sub_u",
            I32AtomicRmw16SubU { .. } => "i32.atomic.rmw16.sub_u",
            I64AtomicRmw8SubU { .. } => "i64.atomic.rmw8.sub_u",
            I64AtomicRmw16SubU { .. } => "i64.atomic.rmw16.sub_u",
            I64AtomicRmw32SubU { .. } => "i64.atomic.rmw32.sub_u",
            I32AtomicRmwAnd { .. } => "i32.atomic.rmw.and",
            I64AtomicRmwAnd { .. } => "i64.atomic.rmw.and",
            I32AtomicRmw8AndU { .. } => "i32.atomic.rmw8.and_u",
            I32AtomicRmw16AndU { .. } => "i32.atomic.rmw16.and_u",
            I64AtomicRmw8AndU { .. } => "i64.atomic.rmw8.and_u",
            I64AtomicRmw16AndU { .. } => "i64.atomic.rmw16.and_u",
            I64AtomicRmw32AndU { .. } => "i64.atomic.rmw32.and_u",
            I32AtomicRmwOr { .. } => "i32.atomic.rmw.or",
            I64AtomicRmwOr { .. } => "i64.atomic.rmw.or",
            I32AtomicRmw8OrU { .. } => "i32.atomic.rmw8.or_u",
            I32AtomicRmw16OrU { .. } => "i32.atomic.rmw16.or_u",
            I64AtomicRmw8OrU { .. } => "i64.atomic.rmw8.or_u",
            I64AtomicRmw16OrU { .. } => "i64.atomic.rmw16.or_u",
            I64AtomicRmw32OrU { .. } => "i64.atomic.rmw32.or_u",
            I32AtomicRmwXor { .. } => "i32.atomic.rmw.xor",
            I64AtomicRmwXor { .. } => "i64.atomic.rmw.xor",
            I32AtomicRmw8XorU { .. } => "i32.atomic.rmw8.xor_u",
            I32AtomicRmw16XorU { .. } => "i32.atomic.rmw16.xor_u",
            I64AtomicRmw8XorU { .. } => "i64.atomic.rmw8.xor_u",
            I64AtomicRmw16XorU { .. } => "i64.atomic.rmw16.xor_u",
            I64AtomicRmw32XorU { .. } => "i64.atomic.rmw32.xor_u",
            I32AtomicRmwXchg { .. } => "i32.atomic.rmw.xchg",
            I64AtomicRmwXchg { .. } => "i64.atomic.rmw.xchg",
            I32AtomicRmw8XchgU { .. } => "i32.atomic.rmw8.xchg_u",
            I32AtomicRmw16XchgU { .. } => "i32.atomic.rmw16.xchg_u",
            I64AtomicRmw8XchgU { .. } => "i64.atomic.rmw8.xchg_u",
            I64AtomicRmw16XchgU { .. } => "i64.atomic.rmw16.xchg_u",
            I64AtomicRmw32XchgU { .. } => "i64.atomic.rmw32.xchg_u",
            I32AtomicRmwCmpxchg { .. } => "i32.atomic.rmw.cmpxchg",
            I64AtomicRmwCmpxchg { .. } => "i64.atomic.rmw.cmpxchg",
            I32AtomicRmw8CmpxchgU { .. } => "i32.atomic.rmw8.cmpxchg_u",
            I32AtomicRmw16CmpxchgU { .. } => "i32.atomic.rmw16.cmpxchg_u",
            I64AtomicRmw8CmpxchgU { .. } => "i64.atomic.rmw8.cmpxchg_u",
            I64AtomicRmw16CmpxchgU { .. } => "i64.atomic.rmw16.cmpxchg_u",
            I64AtomicRmw32CmpxchgU { .. } => "i64.atomic.rmw32.cmpxchg_u",

            // SIMD
            V128Load { .. } => "v128.load",
            V128Store { .. } => "v128.store",
            V128Const { .. } => "v128.const",
            I8x16Shuffle { .. } => "i8x16.shuffle",
            I8x16Splat => "i8x16.splat",
            I16x8Splat => "i16x8.splat",
            I32x4Splat => "i32x4.splat",
            I64x2Splat => "i64x2.splat",
            F32x4Splat => "f32x4.splat",
            F64x2Splat => "f64x2.splat",
            I8x16ExtractLaneS { .. } => "i8x16.extract_lane_s",
            I8x16ExtractLaneU { .. } => "i8x16.extract_lane_u",
            I16x8ExtractLaneS { .. } => "i16x8.extract_lane_s",
            I16x8ExtractLaneU { .. } => "i16x8.extract_lane_u",
            I32x4ExtractLane { .. } => "i32x4.extract_lane",
            I64x2ExtractLane { .. } => "i64x2.extract_lane",
            F32x4ExtractLane { .. } => "f32x4.extract_lane",
            F64x2ExtractLane { .. } => "f64x2.extract_lane",
            I8x16ReplaceLane { .. } => "i8x16.replace_lane",
            I16x8ReplaceLane { .. } => "i16x8.replace_lane",
            I32x4ReplaceLane { .. } => "i32x4.replace_lane",
            I64x2ReplaceLane { .. } => "i64x2.replace_lane",
            F32x4ReplaceLane { .. } => "f32x4.replace_lane",
            F64x2ReplaceLane { .. } => "f64x2.replace_lane",
            V128And => "v128.and",
            V128Or => "v128.or",
            V128Xor => "v128.xor",
            V128Not => "v128.not",
            V128Bitselect => "v128.bitselect",
            I8x16Neg => "i8x16.neg",
            I8x16AnyTrue => "i8x16.any_true",
            I8x16AllTrue => "i8x16.all_true",
            I8x16Add => "i8x16.add",
            I8x16Sub => "i8x16.sub",
            I8x16Mul => "i8x16.mul",
            I8x16DivS => "i8x16.div_s",
            I8x16DivU => "i8x16.div_u",
            I8x16Shl => "i8x16.shl",
            I8x16ShrS => "i8x16.shr_s",
            I8x16ShrU => "i8x16.shr_u",
            I8x16AddSatS => "i8x16.add_sat_s",
            I8x16AddSatU => "i8x16.add_sat_u",
            I8x16SubSatS => "i8x16.sub_sat_s",
            I8x16SubSatU => "i8x16.sub_sat_u",
            I8x16Eq => "i8x16.eq",
            I8x16Ne => "i8x16.ne",
            I8x16LtS => "i8x16.lt_s",
            I8x16LtU => "i8x16.lt_u",
            I8x16GtS => "i8x16.gt_s",
            I8x16GtU => "i8x16.gt_u",
            I8x16LeS => "i8x16.le_s",
            I8x16LeU => "i8x16.le_u",
            I8x16GeS => "i8x16.ge_s",
            I8x16GeU => "i8x16.ge_u",
            I16x8Neg => "i16x8.neg",
            I16x8AnyTrue => "i16x8.any_true",
            I16x8AllTrue => "i16x8.all_true",
            I16x8Add => "i16x8.add",
            I16x8Sub => "i16x8.sub",
            I16x8Mul => "i16x8.mul",
            I16x8DivS => "i16x8.div_s",
            I16x8DivU => "i16x8.div_u",
            I16x8Shl => "i16x8.shl",
            I16x8ShrS => "i16x8.shr_s",
            I16x8ShrU => "i16x8.shr_u",
            I16x8AddSatS => "i16x8.add_sat_s",
            I16x8AddSatU => "i16x8.add_sat_u",
            I16x8SubSatS => "i16x8.sub_sat_s",
            I16x8SubSatU => "i16x8.sub_sat_u",
            I16x8Eq => "i16x8.eq",
            I16x8Ne => "i16x8.ne",
            I16x8LtS => "i16x8.lt_s",
            I16x8LtU => "i16x8.lt_u",
            I16x8GtS => "i16x8.gt_s",
            I16x8GtU => "i16x8.gt_u",
            I16x8LeS => "i16x8.le_s",
            I16x8LeU => "i16x8.le_u",
            I16x8GeS => "i16x8.ge_s",
            I16x8GeU => "i16x8.ge_u",
            I32x4Neg => "i32x4.neg",
            I32x4AnyTrue => "i32x4.any_true",
            I32x4AllTrue => "i32x4.all_true",
            I32x4Add => "i32x4.add",
            I32x4Sub => "i32x4.sub",
            I32x4Mul => "i32x4.mul",
            I32x4DivS => "i32x4.div_s",
            I32x4DivU => "i32x4.div_u",
            I32x4Shl => "i32x4.shl",
            I32x4ShrS => "i32x4.shr_s",
            I32x4ShrU => "i32x4.shr_u",
            I32x4Eq => "i32x4.eq",
            I32x4Ne => "i32x4.ne",
            I32x4LtS => "i32x4.lt_s",
            I32x4LtU => "i32x4.lt_u",
            I32x4GtS => "i32x4.gt_s",
            I32x4GtU => "i32x4.gt_u",
            I32x4LeS => "i32x4.le_s",
            I32x4LeU => "i32x4.le_u",
            I32x4GeS => "i32x4.ge_s",
            I32x4GeU => "i32x4.ge_u",
            I64x2Neg => "i64x2.neg",
            I64x2AnyTrue => "i64x2.any_true",
            I64x2AllTrue => "i64x2.all_true",
            I64x2Add => "i64x2.add",
            I64x2Sub => "i64x2.sub",
            I64x2Mul => "i64x2.mul",
            I64x2DivS => "i64x2.div_s",
            I64x2DivU => "i64x2.div_u",
            I64x2Shl => "i64x2.shl",
            I64x2ShrS => "i64x2.shr_s",
            I64x2ShrU => "i64x2.shr_u",
            I64x2Eq => "i64x2.eq",
            I64x2Ne => "i64x2.ne",
            I64x2LtS => "i64x2.lt_s",
            I64x2LtU => "i64x2.lt_u",
            I64x2GtS => "i64x2.gt_s",
            I64x2GtU => "i64x2.gt_u",
            I64x2LeS => "i64x2.le_s",
            I64x2LeU => "i64x2.le_u",
            I64x2GeS => "i64x2.ge_s",
            I64x2GeU => "i64x2.ge_u",
            F32x4Abs => "f32x4.abs",
            F32x4Neg => "f32x4.neg",
            F32x4Sqrt => "f32x4.sqrt",
            F32x4Add => "f32x4.add",
            F32x4Sub => "f32x4.sub",
            F32x4Mul => "f32x4.mul",
            F32x4Div => "f32x4.div",
            F32x4Min => "f32x4.min",
            F32x4Max => "f32x4.max",
            F32x4Eq => "f32x4.eq",
            F32x4Ne => "f32x4.ne",
            F32x4Lt => "f32x4.lt",
            F32x4Gt => "f32x4.gt",
            F32x4Le => "f32x4.le",
            F32x4Ge => "f32x4.ge",
            F64x2Abs => "f64x2.abs",
            F64x2Neg => "f64x2.neg",
            F64x2Sqrt => "f64x2.sqrt",
            F64x2Add => "f64x2.add",
            F64x2Sub => "f64x2.sub",
            F64x2Mul => "f64x2.mul",
            F64x2Div => "f64x2.div",
            F64x2Min => "f64x2.min",
            F64x2Max => "f64x2.max",
            F64x2Eq => "f64x2.eq",
            F64x2Ne => "f64x2.ne",
            F64x2Lt => "f64x2.lt",
            F64x2Gt => "f64x2.gt",
            F64x2Le => "f64x2.le",
            F64x2Ge => "f64x2.ge",
            F32x4ConvertI32x4S => "f32x4.convert_i32x4_s",
            F32x4ConvertI32x4U => "f32x4.convert_i32x4_u",
            F64x2ConvertI64x2S => "f64x2.convert_i64x2_s",
            F64x2ConvertI64x2U => "f64x2.convert_i64x2_u",
            I32x4TruncSatF32x4S => "i32x4.trunc_sat_f32x4_s",
            I32x4TruncSatF32x4U => "i32x4.trunc_sat_f32x4_u",
            I64x2TruncSatF64x2S => "i64x2.trunc_sat_f64x2_s",
            I64x2TruncSatF64x2U => "i64x2.trunc_sat_f64x2_u",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        write!(f, "{}", self.mnemonic())?;

        match self {
            Block { block_type } | Loop { block_type } | If { block_type } | Try { block_type } => {
                match block_type {
                    BlockType::Empty => Ok(()),
                    BlockType::Value(vt) => write!(f, " (result {vt})"),
                    BlockType::Type(index) => write!(f, " (type {index})"),
                }
            }
            Br { depth } | BrIf { depth } => write!(f, " {depth}"),
            BrTable {
                table_index,
                default_depth,
            } => write!(f, " {table_index} {default_depth}"),
            Call { function_index } => write!(f, " {function_index}"),
            CallIndirect {
                type_index,
                table_index,
            } => write!(f, " {table_index} (type {type_index})"),
            Catch {
                exception_type_index,
            }
            | Throw {
                exception_type_index,
            } => write!(f, " {exception_type_index}"),
            Rethrow { catch_depth } => write!(f, " {catch_depth}"),
            LocalGet { local_index } | LocalSet { local_index } | LocalTee { local_index } => {
                write!(f, " {local_index}")
            }
            GlobalGet { global_index } | GlobalSet { global_index } => write!(f, " {global_index}"),
            MemorySize | MemoryGrow => write!(f, " 0"),
            I32Const { value } => write!(f, " {}", *value as u32),
            I64Const { value } => write!(f, " {}", *value as u64),
            F32Const { value } => write!(f, " {}", value.to_hex()),
            F64Const { value } => write!(f, " {}", value.to_hex()),
            V128Const { bytes } => {
                for byte in bytes {
                    write!(f, " {byte:#04x}")?;
                }
                Ok(())
            }
            I8x16Shuffle { lanes } => {
                for lane in lanes {
                    write!(f, " {lane}")?;
                }
                Ok(())
            }
            I8x16ExtractLaneS { lane }
            | I8x16ExtractLaneU { lane }
            | I16x8ExtractLaneS { lane }
            | I16x8ExtractLaneU { lane }
            | I32x4ExtractLane { lane }
            | I64x2ExtractLane { lane }
            | F32x4ExtractLane { lane }
            | F64x2ExtractLane { lane }
            | I8x16ReplaceLane { lane }
            | I16x8ReplaceLane { lane }
            | I32x4ReplaceLane { lane }
            | I64x2ReplaceLane { lane }
            | F32x4ReplaceLane { lane }
            | F64x2ReplaceLane { lane } => write!(f, " {lane}"),
            other => match other.memarg() {
                Some(memarg) => write!(f, " {} {}", memarg.align, memarg.offset),
                None => Ok(()),
            },
        }
    }
}

impl Instruction {
    /// The memory argument, for any memory access instruction.
    pub fn memarg(&self) -> Option<MemArg> {
        use Instruction::*;
        match self {
            I32Load { memarg } | I64Load { memarg } | F32Load { memarg } | F64Load { memarg }
            | I32Load8S { memarg } | I32Load8U { memarg } | I32Load16S { memarg }
            | I32Load16U { memarg } | I64Load8S { memarg } | I64Load8U { memarg }
            | I64Load16S { memarg } | I64Load16U { memarg } | I64Load32S { memarg }
            | I64Load32U { memarg } | I32Store { memarg } | I64Store { memarg }
            | F32Store { memarg } | F64Store { memarg } | I32Store8 { memarg }
            | I32Store16 { memarg } | I64Store8 { memarg } | I64Store16 { memarg }
            | I64Store32 { memarg } | V128Load { memarg } | V128Store { memarg }
            | MemoryAtomicNotify { memarg } | MemoryAtomicWait32 { memarg }
            | MemoryAtomicWait64 { memarg } | I32AtomicLoad { memarg }
            | I64AtomicLoad { memarg } | I32AtomicLoad8U { memarg }
            | I32AtomicLoad16U { memarg } | I64AtomicLoad8U { memarg }
            | I64AtomicLoad16U { memarg } | I64AtomicLoad32U { memarg }
            | I32AtomicStore { memarg } | I64AtomicStore { memarg }
            | I32AtomicStore8 { memarg } | I32AtomicStore16 { memarg }
            | I64AtomicStore8 { memarg } | I64AtomicStore16 { memarg }
            | I64AtomicStore32 { memarg } | I32AtomicRmwAdd { memarg }
            | I64AtomicRmwAdd { memarg } | I32AtomicRmw8AddU { memarg }
            | I32AtomicRmw16AddU { memarg } | I64AtomicRmw8AddU { memarg }
            | I64AtomicRmw16AddU { memarg } | I64AtomicRmw32AddU { memarg }
            | I32AtomicRmwSub { memarg } | I64AtomicRmwSub { memarg }
            | I32AtomicRmw8SubU { memarg } | I32AtomicRmw16SubU { memarg }
            | I64AtomicRmw8SubU { memarg } | I64AtomicRmw16SubU { memarg }
            | I64AtomicRmw32SubU { memarg } | I32AtomicRmwAnd { memarg }
            | I64AtomicRmwAnd { memarg } | I32AtomicRmw8AndU { memarg }
            | I32AtomicRmw16AndU { memarg } | I64AtomicRmw8AndU { memarg }
            | I64AtomicRmw16AndU { memarg } | I64AtomicRmw32AndU { memarg }
            | I32AtomicRmwOr { memarg } | I64AtomicRmwOr { memarg }
            | I32AtomicRmw8OrU { memarg } | I32AtomicRmw16OrU { memarg }
            | I64AtomicRmw8OrU { memarg } | I64AtomicRmw16OrU { memarg }
            | I64AtomicRmw32OrU { memarg } | I32AtomicRmwXor { memarg }
            | I64AtomicRmwXor { memarg } | I32AtomicRmw8XorU { memarg }
            | I32AtomicRmw16XorU { memarg } | I64AtomicRmw8XorU { memarg }
            | I64AtomicRmw16XorU { memarg } | I64AtomicRmw32XorU { memarg }
            | I32AtomicRmwXchg { memarg } | I64AtomicRmwXchg { memarg }
            | I32AtomicRmw8XchgU { memarg } | I32AtomicRmw16XchgU { memarg }
            | I64AtomicRmw8XchgU { memarg } | I64AtomicRmw16XchgU { memarg }
            | I64AtomicRmw32XchgU { memarg } | I32AtomicRmwCmpxchg { memarg }
            | I64AtomicRmwCmpxchg { memarg } | I32AtomicRmw8CmpxchgU { memarg }
            | I32AtomicRmw16CmpxchgU { memarg } | I64AtomicRmw8CmpxchgU { memarg }
            | I64AtomicRmw16CmpxchgU { memarg } | I64AtomicRmw32CmpxchgU { memarg } => {
                Some(*memarg)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ValueType;

    #[test]
    fn mnemonics() {
        assert_eq!(Instruction::I32Add.mnemonic(), "i32.add");
        assert_eq!(Instruction::Br { depth: 0 }.mnemonic(), "br");
        assert_eq!(
            Instruction::I64AtomicRmw32CmpxchgU {
                memarg: MemArg { align: 2, offset: 0 }
            }
            .mnemonic(),
            "i64.atomic.rmw32.cmpxchg_u"
        );
        assert_eq!(Instruction::F64x2Min.mnemonic(), "f64x2.min");
    }

    #[test]
    fn display_with_immediates() {
        assert_eq!(Instruction::Br { depth: 2 }.to_string(), "br 2");
        assert_eq!(
            Instruction::I32Const { value: -1 }.to_string(),
            format!("i32.const {}", u32::MAX)
        );
        assert_eq!(
            Instruction::I32Load {
                memarg: MemArg { align: 2, offset: 8 }
            }
            .to_string(),
            "i32.load 2 8"
        );
        assert_eq!(
            Instruction::CallIndirect {
                type_index: 3,
                table_index: 0
            }
            .to_string(),
            "call_indirect 0 (type 3)"
        );
    }

    #[test]
    fn memarg_extraction() {
        let memarg = MemArg { align: 3, offset: 16 };
        assert_eq!(Instruction::I64AtomicLoad { memarg }.memarg(), Some(memarg));
        assert_eq!(Instruction::I32Add.memarg(), None);
    }

    #[test]
    fn block_type_display() {
        assert_eq!(
            Instruction::Block {
                block_type: BlockType::Empty
            }
            .to_string(),
            "block"
        );
        assert_eq!(
            Instruction::If {
                block_type: BlockType::Value(ValueType::I32)
            }
            .to_string(),
            "if (result i32)"
        );
    }
}
