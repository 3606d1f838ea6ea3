//! Exception lowering
//!
//! Two mutually exclusive models behind one surface: a funclet model
//! matching the Windows SEH ABI (catch-switch terminators, catch pads,
//! and filter functions that inspect the OS exception record), and a
//! landing-pad model matching the Itanium C++ ABI (`__cxa_begin_catch`
//! plus a chain of next-handler type tests). The host default follows the
//! build target; the module emitter accepts an explicit override so both
//! lowerings stay testable everywhere.

use super::function::{ControlKind, FunctionEmitter};
use super::types::ir_type;
use super::EmitError;
use crate::instance::{
    ExceptionTypeInstance, EXCEPTION_ARGUMENTS_OFFSET, EXCEPTION_ARGUMENT_SIZE,
    EXCEPTION_IS_USER_OFFSET, EXCEPTION_TYPE_INSTANCE_OFFSET, SEH_WASM_EXCEPTION_CODE,
};
use crate::ir::{
    BlockId, Builder, Callee, CallConv, CastOp, FuncId, ICmpPred, Intrinsic, IrType, Linkage,
    Signature, ValueId,
};
use crate::module::{BlockType, FunctionType, ValueType};

/// Byte offset of `ExceptionInformation` in the OS exception record the
/// funclet filter inspects.
const SEH_EXCEPTION_INFORMATION_OFFSET: u64 = 32;

/// Which host exception ABI the emitted code targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EhModel {
    /// Structured/funclet exceptions (Windows SEH).
    Funclet,
    /// Landing pads (Itanium C++ ABI).
    LandingPad,
}

impl EhModel {
    /// The model matching the build target.
    pub fn host_default() -> EhModel {
        if cfg!(windows) {
            EhModel::Funclet
        } else {
            EhModel::LandingPad
        }
    }

    /// The personality routine every emitted function names.
    pub fn personality_symbol(&self) -> &'static str {
        match self {
            EhModel::Funclet => "__C_specific_handler",
            EhModel::LandingPad => "__gxx_personality_v0",
        }
    }
}

/// The innermost unwind target while inside a `try` body.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TryContext {
    pub unwind_to_block: BlockId,
}

/// Per-`try` catch state, model-specific.
#[derive(Debug, Clone)]
pub(crate) enum CatchContext {
    Funclet {
        catch_switch_block: BlockId,
        /// The exception data pointer, recovered once the first catch pad
        /// runs its filter.
        exception_pointer: Option<ValueId>,
    },
    LandingPad {
        /// Where the next `catch` on this try chains its type test.
        next_handler_block: BlockId,
        exception_type_instance: ValueId,
        exception_pointer: ValueId,
    },
}

impl FunctionEmitter<'_, '_> {
    pub(crate) fn emit_try(&mut self, block_type: BlockType) -> Result<(), EmitError> {
        match self.emitter.options.eh_model {
            EhModel::Funclet => self.emit_try_funclet(block_type),
            EhModel::LandingPad => {
                self.emit_try_landing_pad(block_type);
                Ok(())
            }
        }
    }

    /// Shared tail of `try`: the end block/phis, control context, branch
    /// target, and re-pushed arguments.
    fn push_try_region(&mut self, block_type: FunctionType) {
        let end_block = self.builder.create_block("tryEnd");
        let end_phis = self.create_phis(end_block, &block_type.results);

        let try_args = self.pop_multiple(block_type.params.len());

        self.push_control(
            ControlKind::Try,
            block_type.results.clone(),
            end_block,
            end_phis.clone(),
            None,
            Vec::new(),
        );
        self.push_branch_target(block_type.results, end_block, end_phis);
        self.push_multiple(&try_args);
    }

    fn emit_try_funclet(&mut self, block_type: BlockType) -> Result<(), EmitError> {
        let block_type = block_type.resolve(self.module);

        let catch_switch_block = self.builder.create_block("catchSwitch");
        self.builder.catch_switch(catch_switch_block);
        self.try_stack.push(TryContext {
            unwind_to_block: catch_switch_block,
        });
        self.catch_stack.push(CatchContext::Funclet {
            catch_switch_block,
            exception_pointer: None,
        });

        self.push_try_region(block_type);

        // The frame-recover intrinsic requires the try to contain at least
        // one call, so open every try body with a call to a no-op internal
        // function.
        let dummy = self.emitter.try_prologue_dummy();
        let unwind = self.innermost_unwind_block();
        self.emit_call_or_invoke(
            Callee::Function(dummy),
            Vec::new(),
            &FunctionType::default(),
            CallConv::C,
            unwind,
        );
        Ok(())
    }

    fn emit_try_landing_pad(&mut self, block_type: BlockType) {
        let block_type = block_type.resolve(self.module);

        let landing_pad_block = self.builder.create_block("landingPad");
        let saved_insertion = self.builder.insertion_block();
        self.builder.set_insertion_point(landing_pad_block);

        // The landing pad accepts the platform's user-exception type info.
        let type_info = self
            .builder
            .const_ptr(self.instance.compartment.user_exception_type_info);
        let landing_pad = self.builder.landing_pad(vec![type_info]);

        // Begin the catch to obtain the exception data pointer, and read
        // the thrown type-instance id from it.
        let begin_catch = self
            .emitter
            .cxa_begin_catch
            .expect("landing-pad model without __cxa_begin_catch");
        let begun = self
            .builder
            .call(Callee::Function(begin_catch), vec![landing_pad], CallConv::C, &[IrType::Ptr]);
        let exception_pointer = self.builder.load(begun[0], IrType::Ptr, 8, false, None);
        let type_offset = self.builder.const_i64(EXCEPTION_TYPE_INSTANCE_OFFSET as u64);
        let type_slot = self.builder.ptr_offset(exception_pointer, type_offset);
        let exception_type_instance = self.builder.load(type_slot, IrType::I64, 8, false, None);

        self.builder.set_insertion_point(saved_insertion);
        self.try_stack.push(TryContext {
            unwind_to_block: landing_pad_block,
        });
        self.catch_stack.push(CatchContext::LandingPad {
            next_handler_block: landing_pad_block,
            exception_type_instance,
            exception_pointer,
        });

        self.push_try_region(block_type);
    }

    /// Build the SEH filter function for one catch clause, together with
    /// the escaped parent-frame slot the filter writes the exception data
    /// pointer into. A `None` catch type means catch_all: the filter
    /// accepts any user-origin WebAssembly exception.
    fn create_seh_filter(
        &mut self,
        catch_type: Option<&ExceptionTypeInstance>,
    ) -> (FuncId, ValueId) {
        // Reserve the escaped slot in the catching frame.
        let saved_insertion = self.builder.insertion_block();
        let escape_block = match self.local_escape_block {
            Some(block) => block,
            None => {
                let block = self.builder.create_block("alloca");
                self.local_escape_block = Some(block);
                block
            }
        };
        self.builder.set_insertion_point(escape_block);
        let exception_data_alloca = self.builder.alloca(IrType::I64, Some("exceptionData"));
        let escape_index = self.pending_local_escapes.len();
        self.pending_local_escapes.push(exception_data_alloca);
        self.builder.set_insertion_point(saved_insertion);

        let name = format!("sehFilter{}", self.emitter.seh_filter_count);
        self.emitter.seh_filter_count += 1;
        let mut filter = Builder::new(
            name,
            Signature {
                params: vec![IrType::Ptr, IrType::Ptr],
                results: vec![IrType::I32],
                call_conv: CallConv::C,
            },
            Linkage::Internal,
        );
        let entry = filter.create_block("entry");
        filter.set_insertion_point(entry);

        // The first argument points at the OS EXCEPTION_POINTERS pair; the
        // record itself is its first field.
        let record_slot_offset = filter.const_i64(0);
        let record_slot = filter.ptr_offset(filter.arg(0), record_slot_offset);
        let record = filter.load(record_slot, IrType::Ptr, 8, false, None);

        // Recover the catching frame and the escaped slot.
        let parent = filter.const_func(self.func_id);
        let frame = filter.intrinsic(
            Intrinsic::RecoverFramePointer,
            vec![parent, filter.arg(1)],
            IrType::Ptr,
            None,
        );
        let parent_again = filter.const_func(self.func_id);
        let slot_index = filter.const_i32(escape_index as u32);
        let recovered_slot = filter.intrinsic(
            Intrinsic::LocalRecover,
            vec![parent_again, frame, slot_index],
            IrType::Ptr,
            None,
        );

        // Reject any exception the runtime did not raise.
        let code = filter.load(record, IrType::I32, 4, false, None);
        let non_wasm_block = filter.create_block("nonWebAssemblyException");
        let type_check_block = filter.create_block("exceptionTypeCheck");
        let expected_code = filter.const_i32(SEH_WASM_EXCEPTION_CODE);
        let is_wasm = filter.icmp(ICmpPred::Eq, code, expected_code);
        filter.cond_br(is_wasm, type_check_block, non_wasm_block, None);

        filter.set_insertion_point(non_wasm_block);
        let zero = filter.const_i32(0);
        filter.ret(vec![zero]);

        // Copy the exception data pointer into the catching frame, then
        // decide whether this clause handles the exception.
        filter.set_insertion_point(type_check_block);
        let information_offset = filter.const_i64(SEH_EXCEPTION_INFORMATION_OFFSET);
        let information_slot = filter.ptr_offset(record, information_offset);
        let exception_data = filter.load(information_slot, IrType::I64, 8, false, None);
        filter.store(recovered_slot, exception_data, 8, false, None);

        let data_pointer = filter.cast(CastOp::IntToPtr, exception_data, IrType::Ptr);
        let handles = match catch_type {
            None => {
                let flag_offset = filter.const_i64(EXCEPTION_IS_USER_OFFSET as u64);
                let flag_slot = filter.ptr_offset(data_pointer, flag_offset);
                let is_user = filter.load(flag_slot, IrType::I8, 1, false, None);
                let zero_byte = filter.const_i8(0);
                filter.icmp(ICmpPred::Ne, is_user, zero_byte)
            }
            Some(catch_type) => {
                let type_offset = filter.const_i64(EXCEPTION_TYPE_INSTANCE_OFFSET as u64);
                let type_slot = filter.ptr_offset(data_pointer, type_offset);
                let thrown_type = filter.load(type_slot, IrType::I64, 8, false, None);
                let expected_type = filter.const_i64(catch_type.id);
                filter.icmp(ICmpPred::Eq, thrown_type, expected_type)
            }
        };
        let verdict = filter.cast(CastOp::ZExt, handles, IrType::I32);
        filter.ret(vec![verdict]);

        let filter_id = self.emitter.ir.add_function(filter.into_function());
        (filter_id, exception_data_alloca)
    }

    /// Common entry for `catch`/`catch_all`: close the current arm and pop
    /// the try stack if this is the first handler.
    fn begin_catch_clause(&mut self) {
        assert!(!self.control_stack.is_empty(), "catch outside a control context");
        assert!(!self.catch_stack.is_empty(), "catch without a try");
        let kind = self.control_stack.last().unwrap().kind;
        assert!(
            kind == ControlKind::Try || kind == ControlKind::Catch,
            "catch in a non-try context"
        );
        if kind == ControlKind::Try {
            assert!(!self.try_stack.is_empty());
            self.try_stack.pop();
        }
        self.branch_to_end_of_control_context();
    }

    fn finish_catch_clause(&mut self) {
        let context = self.control_stack.last_mut().unwrap();
        context.kind = ControlKind::Catch;
        context.is_reachable = true;
    }

    /// Push the caught exception's arguments in reverse declaration order.
    fn push_exception_arguments(&mut self, exception_pointer: ValueId, params: &[ValueType]) {
        for argument_index in (0..params.len()).rev() {
            let offset = self.builder.const_i64(
                EXCEPTION_ARGUMENTS_OFFSET as u64
                    + EXCEPTION_ARGUMENT_SIZE as u64 * argument_index as u64,
            );
            let slot = self.builder.ptr_offset(exception_pointer, offset);
            let value_type = params[argument_index];
            let value = self
                .builder
                .load(slot, ir_type(value_type), value_type.byte_width(), false, None);
            self.push(value);
        }
    }

    pub(crate) fn emit_catch(&mut self, exception_type_index: u32) -> Result<(), EmitError> {
        self.begin_catch_clause();
        let catch_type = self.instance.exception_types[exception_type_index as usize].clone();

        match self.emitter.options.eh_model {
            EhModel::Funclet => {
                let (filter, data_alloca) = self.create_seh_filter(Some(&catch_type));
                let catch_switch_block = match self.catch_stack.last().unwrap() {
                    CatchContext::Funclet { catch_switch_block, .. } => *catch_switch_block,
                    CatchContext::LandingPad { .. } => unreachable!("funclet catch on landing-pad try"),
                };

                let catch_pad_block = self.builder.create_block("catchPad");
                self.builder.add_catch_switch_handler(catch_switch_block, catch_pad_block);
                self.builder.set_insertion_point(catch_pad_block);
                let pad = self.builder.catch_pad(catch_switch_block, filter);

                // Leave the funclet immediately for a normal block.
                let catch_block = self.builder.create_block("catch");
                self.builder.catch_ret(pad, catch_block);
                self.builder.set_insertion_point(catch_block);

                let data = self.builder.load(data_alloca, IrType::I64, 8, false, None);
                let exception_pointer = self.builder.cast(CastOp::IntToPtr, data, IrType::Ptr);
                if let CatchContext::Funclet { exception_pointer: slot, .. } =
                    self.catch_stack.last_mut().unwrap()
                {
                    *slot = Some(exception_pointer);
                }
                self.push_exception_arguments(exception_pointer, &catch_type.params);
            }
            EhModel::LandingPad => {
                let (next_handler, type_instance, exception_pointer) =
                    match self.catch_stack.last().unwrap() {
                        CatchContext::LandingPad {
                            next_handler_block,
                            exception_type_instance,
                            exception_pointer,
                        } => (*next_handler_block, *exception_type_instance, *exception_pointer),
                        CatchContext::Funclet { .. } => {
                            unreachable!("landing-pad catch on funclet try")
                        }
                    };

                self.builder.set_insertion_point(next_handler);
                let expected = self.builder.const_i64(catch_type.id);
                let matches = self.builder.icmp(ICmpPred::Eq, type_instance, expected);
                let catch_block = self.builder.create_block("catch");
                let unhandled_block = self.builder.create_block("unhandled");
                self.builder.cond_br(matches, catch_block, unhandled_block, None);
                if let CatchContext::LandingPad { next_handler_block, .. } =
                    self.catch_stack.last_mut().unwrap()
                {
                    *next_handler_block = unhandled_block;
                }

                self.builder.set_insertion_point(catch_block);
                self.push_exception_arguments(exception_pointer, &catch_type.params);
            }
        }

        self.finish_catch_clause();
        Ok(())
    }

    pub(crate) fn emit_catch_all(&mut self) -> Result<(), EmitError> {
        self.begin_catch_clause();

        match self.emitter.options.eh_model {
            EhModel::Funclet => {
                let (filter, data_alloca) = self.create_seh_filter(None);
                let catch_switch_block = match self.catch_stack.last().unwrap() {
                    CatchContext::Funclet { catch_switch_block, .. } => *catch_switch_block,
                    CatchContext::LandingPad { .. } => unreachable!("funclet catch on landing-pad try"),
                };

                let catch_pad_block = self.builder.create_block("catchPad");
                self.builder.add_catch_switch_handler(catch_switch_block, catch_pad_block);
                self.builder.set_insertion_point(catch_pad_block);
                let pad = self.builder.catch_pad(catch_switch_block, filter);

                let catch_block = self.builder.create_block("catch");
                self.builder.catch_ret(pad, catch_block);
                self.builder.set_insertion_point(catch_block);

                let data = self.builder.load(data_alloca, IrType::I64, 8, false, None);
                let exception_pointer = self.builder.cast(CastOp::IntToPtr, data, IrType::Ptr);
                if let CatchContext::Funclet { exception_pointer: slot, .. } =
                    self.catch_stack.last_mut().unwrap()
                {
                    *slot = Some(exception_pointer);
                }
            }
            EhModel::LandingPad => {
                let (next_handler, exception_pointer) = match self.catch_stack.last().unwrap() {
                    CatchContext::LandingPad {
                        next_handler_block,
                        exception_pointer,
                        ..
                    } => (*next_handler_block, *exception_pointer),
                    CatchContext::Funclet { .. } => unreachable!("landing-pad catch on funclet try"),
                };

                self.builder.set_insertion_point(next_handler);
                let flag_offset = self.builder.const_i64(EXCEPTION_IS_USER_OFFSET as u64);
                let flag_slot = self.builder.ptr_offset(exception_pointer, flag_offset);
                let is_user = self.builder.load(flag_slot, IrType::I8, 1, false, None);
                let zero_byte = self.builder.const_i8(0);
                let is_user_exception = self.builder.icmp(ICmpPred::Ne, is_user, zero_byte);

                let catch_block = self.builder.create_block("catch");
                let unhandled_block = self.builder.create_block("unhandled");
                self.builder
                    .cond_br(is_user_exception, catch_block, unhandled_block, None);
                if let CatchContext::LandingPad { next_handler_block, .. } =
                    self.catch_stack.last_mut().unwrap()
                {
                    *next_handler_block = unhandled_block;
                }
                self.builder.set_insertion_point(catch_block);
            }
        }

        self.finish_catch_clause();
        Ok(())
    }

    /// `end` of a try that never grew a catch clause.
    pub(crate) fn end_try(&mut self) {
        assert!(!self.try_stack.is_empty());
        self.try_stack.pop();
        self.catch_stack.pop();
    }

    /// `end` of a catch. On the landing-pad model the not-handled-here
    /// chain re-raises, making catches exclusive: control leaves through a
    /// branch or falls into the re-raise.
    pub(crate) fn end_catch(&mut self) -> Result<(), EmitError> {
        assert!(!self.catch_stack.is_empty());
        if let CatchContext::LandingPad {
            next_handler_block,
            exception_pointer,
            ..
        } = self.catch_stack.last().unwrap().clone()
        {
            self.builder.set_insertion_point(next_handler_block);
            let type_offset = self.builder.const_i64(EXCEPTION_TYPE_INSTANCE_OFFSET as u64);
            let type_slot = self.builder.ptr_offset(exception_pointer, type_offset);
            let type_instance = self.builder.load(type_slot, IrType::I64, 8, false, None);
            let arguments_offset = self.builder.const_i64(EXCEPTION_ARGUMENTS_OFFSET as u64);
            let arguments = self.builder.ptr_offset(exception_pointer, arguments_offset);
            let arguments = self.builder.cast(CastOp::PtrToInt, arguments, IrType::I64);
            self.emit_throw_call(type_instance, arguments, false)?;
            self.builder.unreachable();
        }
        self.catch_stack.pop();
        Ok(())
    }

    fn emit_throw_call(
        &mut self,
        type_instance: ValueId,
        arguments_pointer: ValueId,
        is_user_exception: bool,
    ) -> Result<(), EmitError> {
        let is_user = self.builder.const_i32(is_user_exception as u32);
        self.emit_runtime_intrinsic(
            "throwException",
            &FunctionType::new(vec![ValueType::I64, ValueType::I64, ValueType::I32], vec![]),
            vec![type_instance, arguments_pointer, is_user],
        )?;
        Ok(())
    }

    pub(crate) fn emit_throw(&mut self, exception_type_index: u32) -> Result<(), EmitError> {
        let exception_type = self.instance.exception_types[exception_type_index as usize].clone();
        let num_args = exception_type.params.len();

        // The argument record lives in this frame: one untagged 64-bit
        // slot per parameter, the first-popped value in the last slot.
        let byte_count = self
            .builder
            .const_i32(num_args as u32 * EXCEPTION_ARGUMENT_SIZE);
        let argument_base = self.builder.alloca_array(IrType::I8, byte_count);
        for argument_index in 0..num_args {
            let value = self.pop();
            let offset = self.builder.const_i64(
                (num_args - argument_index - 1) as u64 * EXCEPTION_ARGUMENT_SIZE as u64,
            );
            let slot = self.builder.ptr_offset(argument_base, offset);
            self.builder.store(slot, value, EXCEPTION_ARGUMENT_SIZE, false, None);
        }

        let type_instance = self.builder.const_i64(exception_type.id);
        let arguments = self.builder.cast(CastOp::PtrToInt, argument_base, IrType::I64);
        self.emit_throw_call(type_instance, arguments, true)?;
        self.builder.unreachable();
        self.enter_unreachable();
        Ok(())
    }

    pub(crate) fn emit_rethrow(&mut self, catch_depth: u32) -> Result<(), EmitError> {
        assert!(
            (catch_depth as usize) < self.catch_stack.len(),
            "rethrow depth out of range"
        );
        let context = self.catch_stack[self.catch_stack.len() - catch_depth as usize - 1].clone();
        let exception_pointer = match context {
            CatchContext::Funclet { exception_pointer, .. } => {
                exception_pointer.expect("rethrow before any catch recovered the exception")
            }
            CatchContext::LandingPad { exception_pointer, .. } => exception_pointer,
        };

        let type_offset = self.builder.const_i64(EXCEPTION_TYPE_INSTANCE_OFFSET as u64);
        let type_slot = self.builder.ptr_offset(exception_pointer, type_offset);
        let type_instance = self.builder.load(type_slot, IrType::I64, 8, false, None);
        let arguments_offset = self.builder.const_i64(EXCEPTION_ARGUMENTS_OFFSET as u64);
        let arguments = self.builder.ptr_offset(exception_pointer, arguments_offset);
        let arguments = self.builder.cast(CastOp::PtrToInt, arguments, IrType::I64);
        self.emit_throw_call(type_instance, arguments, true)?;
        self.builder.unreachable();
        self.enter_unreachable();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::EhModel;
    use crate::emit::test_utils::{emit_with_module_and_options, module_with_single_function};
    use crate::emit::EmitOptions;
    use crate::instruction::Instruction::*;
    use crate::module::{BlockType, ExceptionTypeDef, ValueType};

    fn options(model: EhModel) -> EmitOptions {
        EmitOptions {
            eh_model: model,
            ..EmitOptions::default()
        }
    }

    fn try_catch_module() -> crate::module::Module {
        let mut module = module_with_single_function(
            &[ValueType::I32],
            &[ValueType::I32],
            &[],
            vec![
                Try {
                    block_type: BlockType::Value(ValueType::I32),
                },
                LocalGet { local_index: 0 },
                Throw {
                    exception_type_index: 0,
                },
                Catch {
                    exception_type_index: 0,
                },
                End,
                End,
            ],
        );
        module.exception_types.push(ExceptionTypeDef {
            params: vec![ValueType::I32],
        });
        module
    }

    #[test]
    fn landing_pad_model_chains_handlers() {
        let ir = emit_with_module_and_options(&try_catch_module(), options(EhModel::LandingPad));
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        assert!(function.find_block("landingPad").is_some());
        assert!(function.find_block("catch").is_some());
        assert!(function.find_block("unhandled").is_some());
        // Print with module context so callee and personality names
        // resolve.
        let text = ir.to_string();
        assert!(text.contains("landingpad"));
        assert!(text.contains("@__cxa_begin_catch"));
        // The end of the catch re-raises with isUserException = 0.
        assert!(text.contains("i32 0"));
        // Personality is the Itanium routine.
        assert!(text.contains("personality @__gxx_personality_v0"));
    }

    #[test]
    fn funclet_model_builds_filters_and_pads() {
        let ir = emit_with_module_and_options(&try_catch_module(), options(EhModel::Funclet));
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = ir.to_string();
        assert!(function.find_block("catchSwitch").is_some());
        assert!(function.find_block("catchPad").is_some());
        assert!(text.contains("catchswitch"));
        assert!(text.contains("catchpad"));
        assert!(text.contains("catchret"));
        assert!(text.contains("personality @__C_specific_handler"));

        // The filter function exists, checks the OS exception code, and
        // recovers the escaped slot.
        let filter = ir.function(ir.find_function("sehFilter0").unwrap());
        let filter_text = filter.to_string();
        assert!(filter.find_block("nonWebAssemblyException").is_some());
        assert!(filter_text.contains("recoverfp"));
        assert!(filter_text.contains("localrecover"));

        // The local escape block was spliced before entry.
        let layout = function.layout();
        let first = function.block(layout[0]).name.clone();
        assert_eq!(first, "alloca");
        assert!(text.contains("localescape"));

        // The dummy call keeping the try non-empty exists.
        assert!(ir.find_function("__try_prologue").is_some());
    }

    #[test]
    fn throw_stores_arguments_in_reverse_order() {
        let ir = emit_with_module_and_options(&try_catch_module(), options(EhModel::LandingPad));
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        // One argument: an 8-byte record, stored at slot 0, thrown with
        // isUserException = 1.
        assert!(text.contains("alloca i8, count i32 8"));
        assert!(text.contains("ptrtoint"));
        assert!(text.contains("i32 1"));
    }

    #[test]
    fn rethrow_reraises_the_captured_exception() {
        let mut module = module_with_single_function(
            &[],
            &[],
            &[],
            vec![
                Try {
                    block_type: BlockType::Empty,
                },
                CatchAll,
                Rethrow { catch_depth: 0 },
                End,
                End,
            ],
        );
        module.exception_types.push(ExceptionTypeDef { params: vec![] });

        let ir = emit_with_module_and_options(&module, options(EhModel::LandingPad));
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let text = function.to_string();
        // Rethrow reads the type id back out of the exception record.
        assert!(text.contains("load i64"));
        assert!(text.contains("unreachable"));
    }
}
