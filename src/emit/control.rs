//! Structured control flow lowering
//!
//! Each lexical region becomes a (control context, branch target) pair.
//! A branch "by depth" indexes the branch-target stack from the top; the
//! target block for a loop is the loop body, for everything else the end
//! block, which is the whole of WebAssembly's branch-equals-continue /
//! branch-equals-break distinction.

use super::function::{ControlKind, FunctionEmitter};
use super::EmitError;
use crate::module::{BlockType, FunctionType};

impl FunctionEmitter<'_, '_> {
    pub(crate) fn emit_block(&mut self, block_type: BlockType) {
        let block_type = block_type.resolve(self.module);

        // Create an end block and a phi per block result.
        let end_block = self.builder.create_block("blockEnd");
        let end_phis = self.create_phis(end_block, &block_type.results);

        // Pop the block arguments.
        let block_args = self.pop_multiple(block_type.params.len());

        // Push a control context that ends at the end block/phi, and a
        // branch target for the end block/phi.
        self.push_control(
            ControlKind::Block,
            block_type.results.clone(),
            end_block,
            end_phis.clone(),
            None,
            Vec::new(),
        );
        self.push_branch_target(block_type.results, end_block, end_phis);

        // Repush the block arguments.
        self.push_multiple(&block_args);
    }

    pub(crate) fn emit_loop(&mut self, block_type: BlockType) {
        let block_type = block_type.resolve(self.module);
        let loop_entry_block = self.builder.insertion_block();

        let loop_body_block = self.builder.create_block("loopBody");
        let end_block = self.builder.create_block("loopEnd");

        // Phis for the loop's parameters, and phis for the loop result.
        let parameter_phis = self.create_phis(loop_body_block, &block_type.params);
        let end_phis = self.create_phis(end_block, &block_type.results);

        // Branch into the loop body and emit there.
        self.builder.br(loop_body_block);
        self.builder.set_insertion_point(loop_body_block);

        // The parameter phis receive their initial values from the entry
        // edge; back-branches add further incoming edges later.
        for element_index in (0..block_type.params.len()).rev() {
            let initial = self.pop();
            self.builder
                .add_phi_incoming(parameter_phis[element_index], loop_entry_block, initial);
        }

        self.push_control(
            ControlKind::Loop,
            block_type.results.clone(),
            end_block,
            end_phis,
            None,
            Vec::new(),
        );

        // The branch target is the loop body start: branches into a loop
        // loop back, not forward.
        self.push_branch_target(block_type.params, loop_body_block, parameter_phis.clone());

        self.push_multiple(&parameter_phis);
    }

    pub(crate) fn emit_if(&mut self, block_type: BlockType) {
        let block_type = block_type.resolve(self.module);

        let then_block = self.builder.create_block("ifThen");
        let else_block = self.builder.create_block("ifElse");
        let end_block = self.builder.create_block("ifElseEnd");
        let end_phis = self.create_phis(end_block, &block_type.results);

        let condition = self.pop();
        let condition = self.coerce_i32_to_bool(condition);
        self.builder.cond_br(condition, then_block, else_block, None);

        // The if arguments must reappear on the operand stack at entry to
        // the else branch, so they are saved in the control context.
        let args = self.pop_multiple(block_type.params.len());

        self.builder.set_insertion_point(then_block);

        self.push_control(
            ControlKind::IfThen,
            block_type.results.clone(),
            end_block,
            end_phis.clone(),
            Some(else_block),
            args.clone(),
        );
        self.push_branch_target(block_type.results, end_block, end_phis);

        self.push_multiple(&args);
    }

    pub(crate) fn emit_else(&mut self) -> Result<(), EmitError> {
        assert!(!self.control_stack.is_empty(), "else outside a control context");
        self.branch_to_end_of_control_context();

        let context = self.control_stack.last().expect("control stack empty").clone();
        assert_eq!(context.kind, ControlKind::IfThen, "else without a matching if");
        let else_block = context.else_block.expect("if-then context lost its else block");

        // Switch emission to the else block.
        let current = self.builder.insertion_block();
        self.builder.move_block_after(else_block, current);
        self.builder.set_insertion_point(else_block);

        // Restore the if arguments.
        self.push_multiple(&context.else_args);

        // The else opens a fresh reachable region regardless of how the
        // then arm ended.
        let context = self.control_stack.last_mut().unwrap();
        context.kind = ControlKind::IfElse;
        context.is_reachable = true;
        context.else_block = None;
        Ok(())
    }

    pub(crate) fn emit_end(&mut self) -> Result<(), EmitError> {
        assert!(!self.control_stack.is_empty(), "end with an empty control stack");
        self.branch_to_end_of_control_context();

        let context = self.control_stack.last().unwrap().clone();

        if let Some(else_block) = context.else_block {
            // An if without an else: synthesize an empty else that
            // forwards the saved if-arguments to the end phis.
            let current = self.builder.insertion_block();
            self.builder.move_block_after(else_block, current);
            self.builder.set_insertion_point(else_block);
            assert_eq!(context.else_args.len(), context.end_phis.len());
            let coerced: Vec<_> = context
                .else_args
                .iter()
                .map(|&argument| self.coerce_to_canonical_type(argument))
                .collect();
            self.builder.br(context.end_block);
            for (argument, &phi) in coerced.into_iter().zip(&context.end_phis) {
                self.builder.add_phi_incoming(phi, else_block, argument);
            }
        }

        match context.kind {
            ControlKind::Try => self.end_try(),
            ControlKind::Catch => self.end_catch()?,
            _ => {}
        }

        // Switch emission to the end block.
        let current = self.builder.insertion_block();
        self.builder.move_block_after(context.end_block, current);
        self.builder.set_insertion_point(context.end_block);

        // Push the merged results: each end phi with incoming edges, or
        // the typed zero where control never arrived with a value.
        assert_eq!(context.end_phis.len(), context.result_types.len());
        for (&phi, &result_type) in context.end_phis.iter().zip(&context.result_types) {
            if self.builder.phi_incoming_count(phi) > 0 {
                self.push(phi);
            } else {
                self.builder.erase_phi(context.end_block, phi);
                let zero = super::types::typed_zero(&mut self.builder, result_type);
                self.push(zero);
            }
        }

        // Drop the branch targets this context introduced, then the
        // context itself.
        assert!(context.outer_branch_target_stack_size <= self.branch_target_stack.len());
        self.branch_target_stack.truncate(context.outer_branch_target_stack_size);
        self.control_stack.pop();
        Ok(())
    }

    pub(crate) fn emit_br(&mut self, depth: u32) {
        let target = self.branch_target_by_depth(depth);
        assert_eq!(target.params.len(), target.phis.len());

        // Pop the branch arguments and add them to the target's phis.
        for argument_index in (0..target.params.len()).rev() {
            let argument = self.pop();
            let coerced = self.coerce_to_canonical_type(argument);
            let from = self.builder.insertion_block();
            self.builder.add_phi_incoming(target.phis[argument_index], from, coerced);
        }

        self.builder.br(target.block);
        self.enter_unreachable();
    }

    pub(crate) fn emit_br_if(&mut self, depth: u32) {
        let condition = self.pop();

        let target = self.branch_target_by_depth(depth);
        assert_eq!(target.params.len(), target.phis.len());
        // The branch arguments stay on the stack for the fall-through
        // path: peek, don't pop.
        for argument_index in 0..target.params.len() {
            let argument = self.peek(target.params.len() - argument_index - 1);
            let coerced = self.coerce_to_canonical_type(argument);
            let from = self.builder.insertion_block();
            self.builder.add_phi_incoming(target.phis[argument_index], from, coerced);
        }

        let false_block = self.builder.create_block("br_ifElse");
        let condition = self.coerce_i32_to_bool(condition);
        self.builder.cond_br(condition, target.block, false_block, None);
        self.builder.set_insertion_point(false_block);
    }

    pub(crate) fn emit_br_table(&mut self, table_index: u32, default_depth: u32) {
        let index = self.pop();

        // The default target's parameter tuple applies to every target;
        // the validator guarantees this.
        let default_target = self.branch_target_by_depth(default_depth);
        let num_args = default_target.params.len();
        let args = self.pop_multiple(num_args);

        // All case phi edges use the block the switch itself ends, so
        // snapshot it once before emitting anything else.
        let from = self.builder.insertion_block();

        let canonical_args: Vec<_> = args
            .iter()
            .map(|&argument| self.coerce_to_canonical_type(argument))
            .collect();
        for (argument_index, &argument) in canonical_args.iter().enumerate() {
            self.builder
                .add_phi_incoming(default_target.phis[argument_index], from, argument);
        }

        assert!(
            (table_index as usize) < self.def.branch_tables.len(),
            "branch table index out of range"
        );
        let target_depths = self.def.branch_tables[table_index as usize].clone();
        let mut cases = Vec::with_capacity(target_depths.len());
        for (case_index, &target_depth) in target_depths.iter().enumerate() {
            let target = self.branch_target_by_depth(target_depth);
            cases.push((case_index as u64, target.block));

            assert_eq!(target.phis.len(), num_args);
            for (argument_index, &argument) in canonical_args.iter().enumerate() {
                self.builder.add_phi_incoming(target.phis[argument_index], from, argument);
            }
        }
        self.builder.switch(index, default_target.block, cases);

        self.enter_unreachable();
    }

    pub(crate) fn emit_return(&mut self) {
        // `return` feeds the function control context's end phis: it is a
        // branch to the bottom of the control stack.
        let function_context = self.control_stack[0].clone();
        for argument_index in (0..self.function_type.results.len()).rev() {
            let argument = self.pop();
            let coerced = self.coerce_to_canonical_type(argument);
            let from = self.builder.insertion_block();
            self.builder
                .add_phi_incoming(function_context.end_phis[argument_index], from, coerced);
        }
        self.builder.br(function_context.end_block);
        self.enter_unreachable();
    }

    pub(crate) fn emit_unreachable_op(&mut self) -> Result<(), EmitError> {
        self.emit_runtime_intrinsic("unreachableTrap", &FunctionType::default(), Vec::new())?;
        self.builder.unreachable();
        self.enter_unreachable();
        Ok(())
    }

    pub(crate) fn emit_drop(&mut self) {
        self.pop();
    }

    pub(crate) fn emit_select(&mut self) {
        let condition = self.pop();
        let false_value = self.pop();
        let true_value = self.pop();
        let condition = self.coerce_i32_to_bool(condition);
        let result = self.builder.select(condition, true_value, false_value);
        self.push(result);
    }
}

#[cfg(test)]
mod tests {
    use crate::emit::test_utils::{emit_single, emit_single_with_tables};
    use crate::instruction::Instruction::*;
    use crate::ir::Terminator;
    use crate::module::{BlockType, ValueType};

    #[test]
    fn block_with_early_br_pushes_the_branch_value() {
        // (block (result i32) i32.const 1 br 0 i32.const 2 end) -> 1
        let ir = emit_single(
            &[],
            &[ValueType::I32],
            &[],
            vec![
                Block {
                    block_type: BlockType::Value(ValueType::I32),
                },
                I32Const { value: 1 },
                Br { depth: 0 },
                I32Const { value: 2 },
                End,
                End,
            ],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let end_block = function.find_block("blockEnd").unwrap();
        // The end phi has exactly one incoming edge: the br.
        assert_eq!(function.block(end_block).phis.len(), 1);
    }

    #[test]
    fn loop_branch_target_is_the_body() {
        let ir = emit_single(
            &[],
            &[],
            &[],
            vec![
                Loop {
                    block_type: BlockType::Empty,
                },
                Br { depth: 0 },
                End,
                End,
            ],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let body = function.find_block("loopBody").unwrap();
        // The br inside the loop targets the body block.
        assert!(matches!(
            function.block(body).terminator,
            Some(Terminator::Br { dest }) if dest == body
        ));
    }

    #[test]
    fn if_without_else_synthesizes_an_empty_else() {
        let ir = emit_single(
            &[ValueType::I32],
            &[],
            &[],
            vec![
                LocalGet { local_index: 0 },
                If {
                    block_type: BlockType::Empty,
                },
                Nop,
                End,
                End,
            ],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let else_block = function.find_block("ifElse").unwrap();
        let end_block = function.find_block("ifElseEnd").unwrap();
        assert!(matches!(
            function.block(else_block).terminator,
            Some(Terminator::Br { dest }) if dest == end_block
        ));
    }

    #[test]
    fn br_table_switch_covers_every_case() {
        let ir = emit_single_with_tables(
            &[ValueType::I32],
            &[],
            &[],
            vec![vec![0, 1]],
            vec![
                Block {
                    block_type: BlockType::Empty,
                },
                Block {
                    block_type: BlockType::Empty,
                },
                LocalGet { local_index: 0 },
                BrTable {
                    table_index: 0,
                    default_depth: 1,
                },
                End,
                End,
                End,
            ],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        let mut found_switch = false;
        for &block in function.layout() {
            if let Some(Terminator::Switch { cases, .. }) = &function.block(block).terminator {
                found_switch = true;
                assert_eq!(cases.len(), 2);
            }
        }
        assert!(found_switch);
    }

    #[test]
    fn unreachable_code_is_skipped_until_end() {
        let ir = emit_single(
            &[],
            &[ValueType::I32],
            &[],
            vec![
                I32Const { value: 1 },
                Return,
                // Everything below is unreachable and must emit nothing.
                I32Const { value: 2 },
                I32Const { value: 3 },
                I32Add,
                End,
            ],
        );
        let function = ir.function(ir.find_function("wasmFunction0").unwrap());
        // No add instruction anywhere in the function.
        let text = function.to_string();
        assert!(!text.contains("add i32"));
    }
}
