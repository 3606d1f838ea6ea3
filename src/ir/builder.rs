//! Backend IR builder
//!
//! The builder owns one function under construction and an insertion
//! point. Every create method appends to the insertion block; terminators
//! seal the block, after which the caller must move the insertion point.
//! This mirrors the way the translator works: a straight-line walk over
//! the operator stream that repositions the builder at every control
//! transfer.

use super::function::{
    Block, BlockId, ConstValue, IrFunction, Linkage, Signature, Subprogram, ValueData, ValueDef, ValueId,
};
use super::instr::{
    AtomicOrdering, BinOp, BranchHint, Callee, CastOp, FCmpPred, FpConstraints, ICmpPred, Instr,
    Intrinsic, RmwOp, Terminator, UnOp,
};
use super::module::FuncId;
use super::types::{CallConv, IrType};

pub struct Builder {
    function: IrFunction,
    insertion: Option<BlockId>,
    loc: Option<u32>,
}

impl Builder {
    pub fn new(name: impl Into<String>, signature: Signature, linkage: Linkage) -> Builder {
        Builder {
            function: IrFunction::new(name, signature, linkage),
            insertion: None,
            loc: None,
        }
    }

    /// Finish construction and hand back the function.
    pub fn into_function(self) -> IrFunction {
        self.function
    }

    pub fn function(&self) -> &IrFunction {
        &self.function
    }

    pub fn set_personality(&mut self, personality: FuncId) {
        self.function.personality = Some(personality);
    }

    pub fn set_subprogram(&mut self, subprogram: Subprogram) {
        self.function.subprogram = Some(subprogram);
    }

    pub fn arg(&self, index: usize) -> ValueId {
        self.function.arg(index)
    }

    pub fn value_type(&self, value: ValueId) -> IrType {
        self.function.value(value).ty
    }

    // ------------------------------------------------------------------
    // Blocks and positioning
    // ------------------------------------------------------------------

    pub fn create_block(&mut self, name: impl Into<String>) -> BlockId {
        self.function.add_block(name)
    }

    pub fn set_insertion_point(&mut self, block: BlockId) {
        self.insertion = Some(block);
    }

    /// The current insertion block. Panics when unset; the translator
    /// always positions the builder before emitting.
    pub fn insertion_block(&self) -> BlockId {
        self.insertion.expect("no insertion point set")
    }

    /// Attach the operator index as the debug location for subsequently
    /// created instructions.
    pub fn set_debug_location(&mut self, op_index: u32) {
        self.loc = Some(op_index);
    }

    /// Move `block` to immediately follow `after` in the layout.
    pub fn move_block_after(&mut self, block: BlockId, after: BlockId) {
        let layout = self.function.layout_mut();
        layout.retain(|id| *id != block);
        let position = layout
            .iter()
            .position(|id| *id == after)
            .expect("anchor block not in layout");
        layout.insert(position + 1, block);
    }

    /// Move `block` to immediately precede `before` in the layout.
    pub fn move_block_before(&mut self, block: BlockId, before: BlockId) {
        let layout = self.function.layout_mut();
        layout.retain(|id| *id != block);
        let position = layout
            .iter()
            .position(|id| *id == before)
            .expect("anchor block not in layout");
        layout.insert(position, block);
    }

    fn block_mut(&mut self, id: BlockId) -> &mut Block {
        self.function.block_mut(id)
    }

    fn push_inst(&mut self, instr: Instr, ty: IrType, name: Option<String>) -> ValueId {
        let block = self.insertion_block();
        assert!(
            self.function.block(block).terminator.is_none(),
            "instruction emitted after terminator in block {}",
            self.function.block(block).name
        );
        let loc = self.loc;
        let value = self.function.add_value(ValueData {
            def: ValueDef::Inst(instr),
            ty,
            name,
            loc,
        });
        self.block_mut(block).insts.push(value);
        value
    }

    fn terminate(&mut self, terminator: Terminator) {
        let block = self.insertion_block();
        assert!(
            self.function.block(block).terminator.is_none(),
            "block {} terminated twice",
            self.function.block(block).name
        );
        self.block_mut(block).terminator = Some(terminator);
    }

    // ------------------------------------------------------------------
    // Constants
    // ------------------------------------------------------------------

    fn add_const(&mut self, value: ConstValue, ty: IrType) -> ValueId {
        self.function.add_value(ValueData {
            def: ValueDef::Const(value),
            ty,
            name: None,
            loc: None,
        })
    }

    pub fn const_bool(&mut self, value: bool) -> ValueId {
        self.add_const(ConstValue::I1(value), IrType::I1)
    }

    pub fn const_i8(&mut self, value: u8) -> ValueId {
        self.add_const(ConstValue::I8(value), IrType::I8)
    }

    pub fn const_i16(&mut self, value: u16) -> ValueId {
        self.add_const(ConstValue::I16(value), IrType::I16)
    }

    pub fn const_i32(&mut self, value: u32) -> ValueId {
        self.add_const(ConstValue::I32(value), IrType::I32)
    }

    pub fn const_i64(&mut self, value: u64) -> ValueId {
        self.add_const(ConstValue::I64(value), IrType::I64)
    }

    pub fn const_f32(&mut self, value: f32) -> ValueId {
        self.add_const(ConstValue::F32(value), IrType::F32)
    }

    pub fn const_f64(&mut self, value: f64) -> ValueId {
        self.add_const(ConstValue::F64(value), IrType::F64)
    }

    pub fn const_v128(&mut self, low: u64, high: u64) -> ValueId {
        self.add_const(ConstValue::V128 { low, high }, IrType::I64X2)
    }

    /// An opaque native address literal.
    pub fn const_ptr(&mut self, address: u64) -> ValueId {
        self.add_const(ConstValue::Ptr(address), IrType::Ptr)
    }

    /// The address of a module function.
    pub fn const_func(&mut self, function: FuncId) -> ValueId {
        self.add_const(ConstValue::Func(function), IrType::Ptr)
    }

    /// An integer constant of the given scalar integer type.
    pub fn const_int(&mut self, ty: IrType, value: u64) -> ValueId {
        match ty {
            IrType::I1 => self.const_bool(value != 0),
            IrType::I8 => self.const_i8(value as u8),
            IrType::I16 => self.const_i16(value as u16),
            IrType::I32 => self.const_i32(value as u32),
            IrType::I64 => self.const_i64(value),
            other => panic!("const_int of non-integer type {other}"),
        }
    }

    /// The typed zero constant for any IR type.
    pub fn typed_zero(&mut self, ty: IrType) -> ValueId {
        match ty {
            IrType::I1 => self.const_bool(false),
            IrType::I8 => self.const_i8(0),
            IrType::I16 => self.const_i16(0),
            IrType::I32 => self.const_i32(0),
            IrType::I64 => self.const_i64(0),
            IrType::F32 => self.const_f32(0.0),
            IrType::F64 => self.const_f64(0.0),
            IrType::Ptr => self.const_ptr(0),
            vector if vector.is_vector() => self.add_const(ConstValue::Zero, vector),
            other => panic!("no zero constant for type {other}"),
        }
    }

    // ------------------------------------------------------------------
    // Instructions
    // ------------------------------------------------------------------

    pub fn binary(&mut self, op: BinOp, lhs: ValueId, rhs: ValueId) -> ValueId {
        let ty = self.value_type(lhs);
        self.push_inst(Instr::Binary { op, lhs, rhs }, ty, None)
    }

    pub fn unary(&mut self, op: UnOp, value: ValueId) -> ValueId {
        let ty = self.value_type(value);
        self.push_inst(Instr::Unary { op, value }, ty, None)
    }

    /// Integer comparison. Scalar operands produce `i1`; vector operands
    /// produce the all-ones/all-zeros mask vector of the same geometry.
    pub fn icmp(&mut self, pred: ICmpPred, lhs: ValueId, rhs: ValueId) -> ValueId {
        let operand_ty = self.value_type(lhs);
        let ty = operand_ty.mask_type().unwrap_or(IrType::I1);
        self.push_inst(Instr::ICmp { pred, lhs, rhs }, ty, None)
    }

    /// Float comparison, with the same scalar/vector result rule as
    /// [`Builder::icmp`].
    pub fn fcmp(&mut self, pred: FCmpPred, lhs: ValueId, rhs: ValueId) -> ValueId {
        let operand_ty = self.value_type(lhs);
        let ty = operand_ty.mask_type().unwrap_or(IrType::I1);
        self.push_inst(Instr::FCmp { pred, lhs, rhs }, ty, None)
    }

    pub fn select(&mut self, condition: ValueId, on_true: ValueId, on_false: ValueId) -> ValueId {
        let ty = self.value_type(on_true);
        self.push_inst(
            Instr::Select {
                condition,
                on_true,
                on_false,
            },
            ty,
            None,
        )
    }

    pub fn cast(&mut self, op: CastOp, value: ValueId, to: IrType) -> ValueId {
        self.push_inst(Instr::Cast { op, value }, to, None)
    }

    /// Bitcast, skipped when the value already has the target type.
    pub fn bitcast(&mut self, value: ValueId, to: IrType) -> ValueId {
        if self.value_type(value) == to {
            value
        } else {
            self.cast(CastOp::Bitcast, value, to)
        }
    }

    pub fn alloca(&mut self, allocated: IrType, name: Option<&str>) -> ValueId {
        self.push_inst(
            Instr::Alloca {
                allocated,
                count: None,
            },
            IrType::Ptr,
            name.map(str::to_owned),
        )
    }

    /// Stack allocation of `count` elements of `allocated`.
    pub fn alloca_array(&mut self, allocated: IrType, count: ValueId) -> ValueId {
        self.push_inst(
            Instr::Alloca {
                allocated,
                count: Some(count),
            },
            IrType::Ptr,
            None,
        )
    }

    pub fn load(
        &mut self,
        pointer: ValueId,
        ty: IrType,
        align: u32,
        volatile: bool,
        ordering: Option<AtomicOrdering>,
    ) -> ValueId {
        self.push_inst(
            Instr::Load {
                pointer,
                align,
                volatile,
                ordering,
            },
            ty,
            None,
        )
    }

    pub fn store(
        &mut self,
        pointer: ValueId,
        value: ValueId,
        align: u32,
        volatile: bool,
        ordering: Option<AtomicOrdering>,
    ) {
        self.push_inst(
            Instr::Store {
                pointer,
                value,
                align,
                volatile,
                ordering,
            },
            IrType::Void,
            None,
        );
    }

    /// In-bounds byte offset from a pointer.
    pub fn ptr_offset(&mut self, pointer: ValueId, offset: ValueId) -> ValueId {
        self.push_inst(Instr::PtrOffset { pointer, offset }, IrType::Ptr, None)
    }

    /// Emit a call. Returns one projection value per declared result.
    pub fn call(
        &mut self,
        callee: Callee,
        args: Vec<ValueId>,
        conv: CallConv,
        results: &[IrType],
    ) -> Vec<ValueId> {
        let call = self.push_inst(
            Instr::Call {
                callee,
                args,
                conv,
                results: results.to_vec(),
            },
            IrType::Void,
            None,
        );
        let block = self.insertion_block();
        let loc = self.loc;
        let mut projections = Vec::with_capacity(results.len());
        for (index, &ty) in results.iter().enumerate() {
            let value = self.function.add_value(ValueData {
                def: ValueDef::CallResult {
                    call,
                    index: index as u32,
                },
                ty,
                name: None,
                loc,
            });
            self.function.block_mut(block).insts.push(value);
            projections.push(value);
        }
        projections
    }

    pub fn intrinsic(
        &mut self,
        intrinsic: Intrinsic,
        args: Vec<ValueId>,
        result: IrType,
        constraints: Option<FpConstraints>,
    ) -> ValueId {
        self.push_inst(
            Instr::Intrinsic {
                intrinsic,
                args,
                constraints,
            },
            result,
            None,
        )
    }

    pub fn atomic_rmw(&mut self, op: RmwOp, pointer: ValueId, value: ValueId) -> ValueId {
        let ty = self.value_type(value);
        self.push_inst(
            Instr::AtomicRmw {
                op,
                pointer,
                value,
                ordering: AtomicOrdering::SeqCst,
                volatile: true,
            },
            ty,
            None,
        )
    }

    /// Sequentially consistent compare-and-exchange; the result is the
    /// previous memory value.
    pub fn atomic_cmpxchg(&mut self, pointer: ValueId, expected: ValueId, replacement: ValueId) -> ValueId {
        let ty = self.value_type(expected);
        self.push_inst(
            Instr::AtomicCmpxchg {
                pointer,
                expected,
                replacement,
                ordering: AtomicOrdering::SeqCst,
                volatile: true,
            },
            ty,
            None,
        )
    }

    pub fn splat(&mut self, value: ValueId, vector: IrType) -> ValueId {
        self.push_inst(Instr::Splat { value }, vector, None)
    }

    pub fn extract_lane(&mut self, vector: ValueId, lane: u8) -> ValueId {
        let ty = self
            .value_type(vector)
            .lane_type()
            .expect("extract_lane of non-vector");
        self.push_inst(Instr::ExtractLane { vector, lane }, ty, None)
    }

    pub fn replace_lane(&mut self, vector: ValueId, value: ValueId, lane: u8) -> ValueId {
        let ty = self.value_type(vector);
        self.push_inst(Instr::ReplaceLane { vector, value, lane }, ty, None)
    }

    pub fn shuffle(&mut self, left: ValueId, right: ValueId, mask: [u8; 16]) -> ValueId {
        self.push_inst(Instr::Shuffle { left, right, mask }, IrType::I8X16, None)
    }

    // ------------------------------------------------------------------
    // Phis
    // ------------------------------------------------------------------

    /// Create a phi at the head of `block` without moving the insertion
    /// point.
    pub fn phi(&mut self, block: BlockId, ty: IrType) -> ValueId {
        let value = self.function.add_value(ValueData {
            def: ValueDef::Inst(Instr::Phi { incomings: Vec::new() }),
            ty,
            name: None,
            loc: None,
        });
        self.function.block_mut(block).phis.push(value);
        value
    }

    pub fn add_phi_incoming(&mut self, phi: ValueId, from: BlockId, value: ValueId) {
        match &mut self.function.value_mut(phi).def {
            ValueDef::Inst(Instr::Phi { incomings }) => incomings.push((from, value)),
            other => panic!("add_phi_incoming on non-phi value: {other:?}"),
        }
    }

    pub fn phi_incoming_count(&self, phi: ValueId) -> usize {
        match &self.function.value(phi).def {
            ValueDef::Inst(Instr::Phi { incomings }) => incomings.len(),
            other => panic!("phi_incoming_count on non-phi value: {other:?}"),
        }
    }

    /// Remove a phi that ended up with no incoming edges.
    pub fn erase_phi(&mut self, block: BlockId, phi: ValueId) {
        assert_eq!(self.phi_incoming_count(phi), 0, "erasing a phi with incoming edges");
        self.function.block_mut(block).phis.retain(|id| *id != phi);
        self.function.value_mut(phi).def = ValueDef::Erased;
    }

    // ------------------------------------------------------------------
    // Terminators
    // ------------------------------------------------------------------

    pub fn br(&mut self, dest: BlockId) {
        self.terminate(Terminator::Br { dest });
    }

    pub fn cond_br(&mut self, condition: ValueId, on_true: BlockId, on_false: BlockId, hint: Option<BranchHint>) {
        self.terminate(Terminator::CondBr {
            condition,
            on_true,
            on_false,
            hint,
        });
    }

    pub fn switch(&mut self, value: ValueId, default: BlockId, cases: Vec<(u64, BlockId)>) {
        self.terminate(Terminator::Switch { value, default, cases });
    }

    pub fn ret(&mut self, values: Vec<ValueId>) {
        self.terminate(Terminator::Ret { values });
    }

    pub fn unreachable(&mut self) {
        self.terminate(Terminator::Unreachable);
    }

    /// Emit an invoke terminating the current block, then continue in
    /// `normal`. Returns one projection value per declared result.
    pub fn invoke(
        &mut self,
        callee: Callee,
        args: Vec<ValueId>,
        conv: CallConv,
        results: &[IrType],
        normal: BlockId,
        unwind: BlockId,
    ) -> Vec<ValueId> {
        let invoking = self.insertion_block();
        let loc = self.loc;
        let mut projections = Vec::with_capacity(results.len());
        for (index, &ty) in results.iter().enumerate() {
            let value = self.function.add_value(ValueData {
                def: ValueDef::InvokeResult {
                    block: invoking,
                    index: index as u32,
                },
                ty,
                name: None,
                loc,
            });
            projections.push(value);
        }
        self.terminate(Terminator::Invoke {
            callee,
            args,
            conv,
            results: projections.clone(),
            normal,
            unwind,
        });
        for &value in &projections {
            self.function.block_mut(normal).insts.push(value);
        }
        self.set_insertion_point(normal);
        projections
    }

    /// Install an empty catch-switch terminator on `block`. Handlers are
    /// attached afterwards as `catch`/`catch_all` clauses are seen.
    pub fn catch_switch(&mut self, block: BlockId) {
        assert!(
            self.function.block(block).terminator.is_none(),
            "catch_switch target already terminated"
        );
        self.function.block_mut(block).terminator = Some(Terminator::CatchSwitch { handlers: Vec::new() });
    }

    pub fn add_catch_switch_handler(&mut self, block: BlockId, handler: BlockId) {
        match &mut self.function.block_mut(block).terminator {
            Some(Terminator::CatchSwitch { handlers }) => handlers.push(handler),
            other => panic!("add_catch_switch_handler on non-catch-switch block: {other:?}"),
        }
    }

    pub fn catch_pad(&mut self, catch_switch: BlockId, filter: FuncId) -> ValueId {
        self.push_inst(Instr::CatchPad { catch_switch, filter }, IrType::Token, None)
    }

    pub fn catch_ret(&mut self, pad: ValueId, dest: BlockId) {
        self.terminate(Terminator::CatchRet { pad, dest });
    }

    /// Landing pad producing the raw exception object pointer.
    pub fn landing_pad(&mut self, clauses: Vec<ValueId>) -> ValueId {
        self.push_inst(Instr::LandingPad { clauses }, IrType::Ptr, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> Builder {
        Builder::new(
            "test",
            Signature {
                params: vec![IrType::Ptr, IrType::I32],
                results: vec![IrType::I32],
                call_conv: CallConv::Wasm,
            },
            Linkage::External,
        )
    }

    #[test]
    fn emits_into_insertion_block() {
        let mut b = builder();
        let entry = b.create_block("entry");
        b.set_insertion_point(entry);
        let one = b.const_i32(1);
        let sum = b.binary(BinOp::Add, b.arg(1), one);
        assert_eq!(b.value_type(sum), IrType::I32);
        b.ret(vec![sum]);

        let function = b.into_function();
        let block = function.block(entry);
        assert_eq!(block.insts.len(), 1);
        assert!(matches!(block.terminator, Some(Terminator::Ret { .. })));
    }

    #[test]
    fn scalar_and_vector_compare_types() {
        let mut b = builder();
        let entry = b.create_block("entry");
        b.set_insertion_point(entry);
        let zero = b.const_i32(0);
        let scalar = b.icmp(ICmpPred::Eq, b.arg(1), zero);
        assert_eq!(b.value_type(scalar), IrType::I1);

        let vz = b.typed_zero(IrType::F32X4);
        let mask = b.fcmp(FCmpPred::OLt, vz, vz);
        assert_eq!(b.value_type(mask), IrType::I32X4);
    }

    #[test]
    fn phi_lifecycle() {
        let mut b = builder();
        let entry = b.create_block("entry");
        let merge = b.create_block("merge");
        let phi = b.phi(merge, IrType::I32);
        b.set_insertion_point(entry);
        let one = b.const_i32(1);
        b.add_phi_incoming(phi, entry, one);
        assert_eq!(b.phi_incoming_count(phi), 1);

        let unused = b.phi(merge, IrType::I64);
        b.erase_phi(merge, unused);
        let function = b.into_function();
        assert_eq!(function.block(merge).phis, vec![phi]);
    }

    #[test]
    fn bitcast_is_identity_on_same_type() {
        let mut b = builder();
        let entry = b.create_block("entry");
        b.set_insertion_point(entry);
        let v = b.const_i32(3);
        assert_eq!(b.bitcast(v, IrType::I32), v);
        let cast = b.bitcast(v, IrType::F32);
        assert_ne!(cast, v);
        assert_eq!(b.value_type(cast), IrType::F32);
    }

    #[test]
    fn layout_moves() {
        let mut b = builder();
        let a = b.create_block("a");
        let c = b.create_block("c");
        let d = b.create_block("d");
        b.move_block_after(d, a);
        assert_eq!(b.function().layout(), &[a, d, c]);
        b.move_block_before(c, a);
        assert_eq!(b.function().layout(), &[c, a, d]);
    }

    #[test]
    #[should_panic(expected = "terminated twice")]
    fn double_termination_panics() {
        let mut b = builder();
        let entry = b.create_block("entry");
        b.set_insertion_point(entry);
        b.unreachable();
        b.unreachable();
    }
}
