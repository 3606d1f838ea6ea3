//! Per-function translator
//!
//! Translates one WebAssembly function body into backend IR. The
//! translator owns the three working stacks (operand, control, branch
//! target), the mapping from local indices to stack slots, and the
//! builder's insertion point. Dispatch walks the decoded operator stream
//! once; a two-state machine (reachable emitter vs. unreachable skipper)
//! keeps operators after an unconditional terminator from emitting code
//! until the enclosing structured region ends.

use super::exceptions::{CatchContext, TryContext};
use super::types::{coerce_to_canonical_type, ir_type, signature_for, typed_zero};
use super::{EmitError, ModuleEmitter};
use crate::instance::{
    ModuleInstance, CONTEXT_MEMORY_BASE_OFFSET, CONTEXT_TABLE_BASE_OFFSET,
};
use crate::instruction::Instruction;
use crate::ir::{
    BlockId, BranchHint, Builder, Callee, CallConv, FuncId, ICmpPred, IrType, Linkage, Subprogram,
    ValueId,
};
use crate::module::{FunctionDef, FunctionType, Module, ValueType};

/// The kind of an in-scope control context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlKind {
    Function,
    Block,
    IfThen,
    IfElse,
    Loop,
    Try,
    Catch,
}

/// The translator's lexical record for one in-flight structured region.
#[derive(Debug, Clone)]
pub(crate) struct ControlContext {
    pub kind: ControlKind,
    pub end_block: BlockId,
    pub end_phis: Vec<ValueId>,
    /// Present only while the context is an if-then with a pending else.
    pub else_block: Option<BlockId>,
    /// The if arguments, restored onto the operand stack at `else`.
    pub else_args: Vec<ValueId>,
    pub result_types: Vec<ValueType>,
    pub outer_stack_size: usize,
    pub outer_branch_target_stack_size: usize,
    pub is_reachable: bool,
}

/// A branch destination addressable by depth: the target block and one
/// phi per parameter.
#[derive(Debug, Clone)]
pub(crate) struct BranchTarget {
    pub params: Vec<ValueType>,
    pub block: BlockId,
    pub phis: Vec<ValueId>,
}

pub(crate) struct FunctionEmitter<'a, 'm> {
    pub(crate) emitter: &'a mut ModuleEmitter<'m>,
    pub(crate) module: &'m Module,
    pub(crate) instance: &'m ModuleInstance,
    pub(crate) def: &'m FunctionDef,
    pub(crate) def_index: usize,
    pub(crate) function_type: FunctionType,
    pub(crate) func_id: FuncId,
    pub(crate) builder: Builder,

    /// One stack slot per parameter and per declared local.
    pub(crate) local_pointers: Vec<ValueId>,
    pub(crate) local_types: Vec<ValueType>,
    memory_base_pointer: Option<ValueId>,
    table_base_pointer: Option<ValueId>,
    context_pointer: Option<ValueId>,

    pub(crate) stack: Vec<ValueId>,
    pub(crate) control_stack: Vec<ControlContext>,
    pub(crate) branch_target_stack: Vec<BranchTarget>,
    pub(crate) try_stack: Vec<TryContext>,
    pub(crate) catch_stack: Vec<CatchContext>,

    /// Deferred block that registers escaped locals for SEH filters; it is
    /// spliced before the entry block in the epilogue.
    pub(crate) local_escape_block: Option<BlockId>,
    pub(crate) pending_local_escapes: Vec<ValueId>,

    /// Structured-region nesting counted while skipping unreachable code.
    unreachable_depth: usize,
}

impl<'a, 'm> FunctionEmitter<'a, 'm> {
    pub(crate) fn new(emitter: &'a mut ModuleEmitter<'m>, def_index: usize) -> Self {
        let module = emitter.module;
        let instance = emitter.instance;
        let def = &module.functions[def_index];
        let function_type = module.def_type(def_index).clone();
        let func_id = emitter.function_ids[def_index];
        let name = emitter.ir.function(func_id).name.clone();
        let builder = Builder::new(
            name,
            signature_for(&function_type, CallConv::Wasm),
            Linkage::External,
        );
        FunctionEmitter {
            emitter,
            module,
            instance,
            def,
            def_index,
            function_type,
            func_id,
            builder,
            local_pointers: Vec::new(),
            local_types: Vec::new(),
            memory_base_pointer: None,
            table_base_pointer: None,
            context_pointer: None,
            stack: Vec::new(),
            control_stack: Vec::new(),
            branch_target_stack: Vec::new(),
            try_stack: Vec::new(),
            catch_stack: Vec::new(),
            local_escape_block: None,
            pending_local_escapes: Vec::new(),
            unreachable_depth: 0,
        }
    }

    // ------------------------------------------------------------------
    // Operand stack
    // ------------------------------------------------------------------

    fn outer_stack_size(&self) -> usize {
        self.control_stack.last().map_or(0, |context| context.outer_stack_size)
    }

    pub(crate) fn pop(&mut self) -> ValueId {
        assert!(
            self.stack.len() >= self.outer_stack_size() + 1,
            "operand stack underflow below the current control context"
        );
        self.stack.pop().unwrap()
    }

    pub(crate) fn pop_multiple(&mut self, count: usize) -> Vec<ValueId> {
        assert!(
            self.stack.len() >= self.outer_stack_size() + count,
            "operand stack underflow below the current control context"
        );
        self.stack.split_off(self.stack.len() - count)
    }

    /// The value `offset` slots down from the top, without popping.
    pub(crate) fn peek(&self, offset: usize) -> ValueId {
        self.stack[self.stack.len() - offset - 1]
    }

    pub(crate) fn push(&mut self, value: ValueId) {
        self.stack.push(value);
    }

    pub(crate) fn push_multiple(&mut self, values: &[ValueId]) {
        self.stack.extend_from_slice(values);
    }

    // ------------------------------------------------------------------
    // Phis, coercions
    // ------------------------------------------------------------------

    /// Create one phi per element of `types` at the head of `block`,
    /// leaving the insertion point untouched.
    pub(crate) fn create_phis(&mut self, block: BlockId, types: &[ValueType]) -> Vec<ValueId> {
        types
            .iter()
            .map(|&value_type| self.builder.phi(block, ir_type(value_type)))
            .collect()
    }

    pub(crate) fn coerce_to_canonical_type(&mut self, value: ValueId) -> ValueId {
        coerce_to_canonical_type(&mut self.builder, value)
    }

    /// Coerces an i32 operand to a branch condition.
    pub(crate) fn coerce_i32_to_bool(&mut self, value: ValueId) -> ValueId {
        let zero = self.builder.const_i32(0);
        self.builder.icmp(ICmpPred::Ne, value, zero)
    }

    /// Widens an i1 comparison result to the i32 the operand stack holds.
    pub(crate) fn coerce_bool_to_i32(&mut self, value: ValueId) -> ValueId {
        self.builder.cast(crate::ir::CastOp::ZExt, value, IrType::I32)
    }

    // ------------------------------------------------------------------
    // Control plumbing
    // ------------------------------------------------------------------

    pub(crate) fn push_control(
        &mut self,
        kind: ControlKind,
        result_types: Vec<ValueType>,
        end_block: BlockId,
        end_phis: Vec<ValueId>,
        else_block: Option<BlockId>,
        else_args: Vec<ValueId>,
    ) {
        // The unreachable skipper filters out every operator that opens a
        // control context, so the top must be reachable here.
        if let Some(top) = self.control_stack.last() {
            assert!(top.is_reachable, "control context opened in unreachable code");
        }
        self.control_stack.push(ControlContext {
            kind,
            end_block,
            end_phis,
            else_block,
            else_args,
            result_types,
            outer_stack_size: self.stack.len(),
            outer_branch_target_stack_size: self.branch_target_stack.len(),
            is_reachable: true,
        });
    }

    pub(crate) fn push_branch_target(
        &mut self,
        params: Vec<ValueType>,
        block: BlockId,
        phis: Vec<ValueId>,
    ) {
        self.branch_target_stack.push(BranchTarget { params, block, phis });
    }

    pub(crate) fn branch_target_by_depth(&self, depth: u32) -> BranchTarget {
        let depth = depth as usize;
        assert!(depth < self.branch_target_stack.len(), "branch depth out of range");
        self.branch_target_stack[self.branch_target_stack.len() - depth - 1].clone()
    }

    /// Feed the current context's end phis from the operand stack top and
    /// branch to its end block, if this point is reachable.
    pub(crate) fn branch_to_end_of_control_context(&mut self) {
        let context = self.control_stack.last().expect("control stack empty").clone();
        if context.is_reachable {
            for result_index in (0..context.result_types.len()).rev() {
                let result = self.pop();
                let coerced = self.coerce_to_canonical_type(result);
                let from = self.builder.insertion_block();
                self.builder.add_phi_incoming(context.end_phis[result_index], from, coerced);
            }
            self.builder.br(context.end_block);
        }
        assert_eq!(self.stack.len(), context.outer_stack_size);
    }

    /// Called after unconditional control flow: unwind the operand stack
    /// to the outer context and stop dispatching to the emitter until an
    /// `else`/`end`/`catch` reopens this context.
    pub(crate) fn enter_unreachable(&mut self) {
        let context = self.control_stack.last_mut().expect("control stack empty");
        assert!(context.outer_stack_size <= self.stack.len());
        self.stack.truncate(context.outer_stack_size);
        context.is_reachable = false;
    }

    pub(crate) fn innermost_unwind_block(&self) -> Option<BlockId> {
        self.try_stack.last().map(|context| context.unwind_to_block)
    }

    // ------------------------------------------------------------------
    // Calls and runtime intrinsics
    // ------------------------------------------------------------------

    /// Load the context pointer for a module-convention call site.
    pub(crate) fn load_context_pointer(&mut self) -> ValueId {
        let variable = self.context_pointer.expect("prologue not emitted");
        self.builder.load(variable, IrType::Ptr, 8, false, None)
    }

    pub(crate) fn load_memory_base(&mut self) -> ValueId {
        let variable = self.memory_base_pointer.expect("prologue not emitted");
        self.builder.load(variable, IrType::Ptr, 8, false, None)
    }

    pub(crate) fn load_table_base(&mut self) -> ValueId {
        let variable = self.table_base_pointer.expect("prologue not emitted");
        self.builder.load(variable, IrType::Ptr, 8, false, None)
    }

    /// Emit a call, or an invoke unwinding to the innermost try, pushing
    /// nothing: returns the result values for the caller to place.
    pub(crate) fn emit_call_or_invoke(
        &mut self,
        callee: Callee,
        args: Vec<ValueId>,
        function_type: &FunctionType,
        conv: CallConv,
        unwind: Option<BlockId>,
    ) -> Vec<ValueId> {
        let mut call_args = Vec::with_capacity(args.len() + 1);
        if conv == CallConv::Wasm {
            call_args.push(self.load_context_pointer());
        }
        call_args.extend(args);
        let result_types: Vec<IrType> = function_type.results.iter().copied().map(ir_type).collect();
        match unwind {
            None => self.builder.call(callee, call_args, conv, &result_types),
            Some(unwind) => {
                let normal = self.builder.create_block("invokeReturn");
                self.builder.invoke(callee, call_args, conv, &result_types, normal, unwind)
            }
        }
    }

    /// Emit a call to a runtime intrinsic resolved through the
    /// compartment's intrinsics export.
    pub(crate) fn emit_runtime_intrinsic(
        &mut self,
        name: &str,
        expected_type: &FunctionType,
        args: Vec<ValueId>,
    ) -> Result<Vec<ValueId>, EmitError> {
        let intrinsic = self
            .instance
            .compartment
            .resolve(name)
            .ok_or_else(|| EmitError::UnresolvedIntrinsic { name: name.to_string() })?;
        if intrinsic.ty != *expected_type {
            return Err(EmitError::IntrinsicTypeMismatch {
                name: name.to_string(),
                expected: expected_type.clone(),
                found: intrinsic.ty.clone(),
            });
        }
        let conv = intrinsic.calling_convention;
        let ty = intrinsic.ty.clone();
        let address = intrinsic.native_address;
        let pointer = self.builder.const_ptr(address);
        let unwind = self.innermost_unwind_block();
        Ok(self.emit_call_or_invoke(Callee::Pointer(pointer), args, &ty, conv, unwind))
    }

    /// The trap-emission pattern: a conditional branch to a `<name>Trap`
    /// block that calls the intrinsic and terminates with unreachable; the
    /// `<name>Skip` block becomes the new insertion point.
    pub(crate) fn emit_conditional_trap_intrinsic(
        &mut self,
        condition: ValueId,
        name: &str,
        expected_type: &FunctionType,
        args: Vec<ValueId>,
    ) -> Result<(), EmitError> {
        let trap_block = self.builder.create_block(format!("{name}Trap"));
        let skip_block = self.builder.create_block(format!("{name}Skip"));
        self.builder
            .cond_br(condition, trap_block, skip_block, Some(BranchHint::LikelyFalse));

        self.builder.set_insertion_point(trap_block);
        self.emit_runtime_intrinsic(name, expected_type, args)?;
        self.builder.unreachable();

        self.builder.set_insertion_point(skip_block);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Entry prologue, dispatch loop, epilogue
    // ------------------------------------------------------------------

    pub(crate) fn emit(mut self) -> Result<(), EmitError> {
        let span = tracing::debug_span!(
            "emit_function",
            def_index = self.def_index,
            memory = self.instance.default_memory_id,
            table = self.instance.default_table_id,
        );
        let _entered = span.enter();

        self.builder.set_personality(self.emitter.personality);
        self.builder.set_subprogram(Subprogram {
            name: format!("<wasm function {}>", self.def_index),
            linkage_name: self.emitter.ir.function(self.func_id).name.clone(),
        });

        // Create the return basic block, and push the root control context
        // for the function: `return` is a branch to depth
        // controlStack.len() - 1.
        let return_block = self.builder.create_block("return");
        let results = self.function_type.results.clone();
        let return_phis = self.create_phis(return_block, &results);
        self.push_control(
            ControlKind::Function,
            results.clone(),
            return_block,
            return_phis.clone(),
            None,
            Vec::new(),
        );
        self.push_branch_target(results.clone(), return_block, return_phis);

        let entry_block = self.builder.create_block("entry");
        self.builder.set_insertion_point(entry_block);

        // Addressable storage for the context, memory-base, and table-base
        // pointers, seeded from the first argument. The runtime maintains
        // the base pointers in the context.
        self.memory_base_pointer = Some(self.builder.alloca(IrType::Ptr, Some("memoryBase")));
        self.table_base_pointer = Some(self.builder.alloca(IrType::Ptr, Some("tableBase")));
        self.context_pointer = Some(self.builder.alloca(IrType::Ptr, Some("context")));
        let context_arg = self.builder.arg(0);
        let context_variable = self.context_pointer.unwrap();
        self.builder.store(context_variable, context_arg, 8, false, None);
        self.reload_memory_and_table_base();

        // One stack slot per parameter and per declared local; parameters
        // are copied from the argument sequence, the rest zeroed.
        let param_count = self.function_type.params.len();
        let mut local_types = self.function_type.params.clone();
        local_types.extend(self.def.locals.iter().copied());
        for (local_index, &local_type) in local_types.iter().enumerate() {
            let pointer = self.builder.alloca(ir_type(local_type), None);
            self.local_pointers.push(pointer);
            let align = local_type.byte_width();
            if local_index < param_count {
                let argument = self.builder.arg(local_index + 1);
                self.builder.store(pointer, argument, align, false, None);
            } else {
                let zero = typed_zero(&mut self.builder, local_type);
                self.builder.store(pointer, zero, align, false, None);
            }
        }
        self.local_types = local_types;

        if self.emitter.options.function_enter_exit_hooks {
            let address = self.binding_address();
            let handle = self.builder.const_i64(address);
            self.emit_runtime_intrinsic(
                "debugEnterFunction",
                &FunctionType::new(vec![ValueType::I64], vec![]),
                vec![handle],
            )?;
        }

        // Decode loop: one operator at a time, with the operator index as
        // the debug location.
        let def = self.def;
        for (op_index, instruction) in def.code.iter().enumerate() {
            if self.control_stack.is_empty() {
                break;
            }
            self.builder.set_debug_location(op_index as u32);
            self.trace_operator(instruction);
            if self.control_stack.last().unwrap().is_reachable {
                self.emit_operator(instruction)?;
            } else {
                self.skip_unreachable_operator(instruction)?;
            }
        }
        assert!(
            self.control_stack.is_empty(),
            "operator stream ended with open control contexts"
        );
        debug_assert_eq!(self.builder.insertion_block(), return_block);

        if self.emitter.options.function_enter_exit_hooks {
            let address = self.binding_address();
            let handle = self.builder.const_i64(address);
            self.emit_runtime_intrinsic(
                "debugExitFunction",
                &FunctionType::new(vec![ValueType::I64], vec![]),
                vec![handle],
            )?;
        }

        // The function-level end pushed the return phis onto the operand
        // stack; they are the return value tuple.
        let result_count = self.function_type.results.len();
        let return_values = self.pop_multiple(result_count);
        self.builder.ret(return_values);

        // If any SEH filter demanded a parent-frame local, register the
        // escaped slots and splice the block before entry.
        if let Some(escape_block) = self.local_escape_block {
            self.builder.set_insertion_point(escape_block);
            let escapes = self.pending_local_escapes.clone();
            self.builder
                .intrinsic(crate::ir::Intrinsic::LocalEscape, escapes, IrType::Void, None);
            self.builder.br(entry_block);
            self.builder.move_block_before(escape_block, entry_block);
        }

        let built = self.builder.into_function();
        self.emitter.ir.define_function(self.func_id, built);
        Ok(())
    }

    fn binding_address(&self) -> u64 {
        let index = self.module.function_imports.len() + self.def_index;
        self.instance.functions[index].native_address
    }

    /// Reload the memory and table base pointers from the context.
    fn reload_memory_and_table_base(&mut self) {
        let context = self.load_context_pointer();
        let memory_offset = self.builder.const_i64(CONTEXT_MEMORY_BASE_OFFSET as u64);
        let memory_slot = self.builder.ptr_offset(context, memory_offset);
        let memory_base = self.builder.load(memory_slot, IrType::Ptr, 8, false, None);
        let memory_variable = self.memory_base_pointer.unwrap();
        self.builder.store(memory_variable, memory_base, 8, false, None);

        let table_offset = self.builder.const_i64(CONTEXT_TABLE_BASE_OFFSET as u64);
        let table_slot = self.builder.ptr_offset(context, table_offset);
        let table_base = self.builder.load(table_slot, IrType::Ptr, 8, false, None);
        let table_variable = self.table_base_pointer.unwrap();
        self.builder.store(table_variable, table_base, 8, false, None);
    }

    /// The do-nothing visitor used to decode past unreachable operators.
    /// It counts structured nesting and forwards only `else`/`end`/
    /// `catch`/`catch_all` at depth zero.
    fn skip_unreachable_operator(&mut self, instruction: &Instruction) -> Result<(), EmitError> {
        match instruction {
            Instruction::Block { .. }
            | Instruction::Loop { .. }
            | Instruction::If { .. }
            | Instruction::Try { .. } => {
                self.unreachable_depth += 1;
            }
            Instruction::Else => {
                if self.unreachable_depth == 0 {
                    self.emit_else()?;
                }
            }
            Instruction::Catch { exception_type_index } => {
                if self.unreachable_depth == 0 {
                    self.emit_catch(*exception_type_index)?;
                }
            }
            Instruction::CatchAll => {
                if self.unreachable_depth == 0 {
                    self.emit_catch_all()?;
                }
            }
            Instruction::End => {
                if self.unreachable_depth == 0 {
                    self.emit_end()?;
                } else {
                    self.unreachable_depth -= 1;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Trace the control-stack and operand-stack shape before an operator.
    fn trace_operator(&self, instruction: &Instruction) {
        if !tracing::enabled!(tracing::Level::TRACE) {
            return;
        }
        let mut control = String::new();
        for context in &self.control_stack {
            if !context.is_reachable {
                control.push('(');
            }
            control.push(match context.kind {
                ControlKind::Function => 'F',
                ControlKind::Block => 'B',
                ControlKind::IfThen => 'I',
                ControlKind::IfElse => 'E',
                ControlKind::Loop => 'L',
                ControlKind::Try => 'T',
                ControlKind::Catch => 'C',
            });
            if !context.is_reachable {
                control.push(')');
            }
        }
        let base = self.outer_stack_size();
        let mut operands = String::new();
        for (index, value) in self.stack.iter().enumerate() {
            if index == base {
                operands.push_str("| ");
            }
            operands.push_str(&self.builder.value_type(*value).to_string());
            operands.push(' ');
        }
        if self.stack.len() == base {
            operands.push('|');
        }
        tracing::trace!(control = %control, stack = %operands, "{instruction}");
    }
}
