//! End-to-end emission tests
//!
//! Each test builds a small validated module, emits backend IR through the
//! public API, and inspects the produced functions: block structure, phi
//! wiring, trap blocks, and terminators.

use kiln::emit::{emit_module, EhModel, EmitOptions};
use kiln::instance::ModuleInstance;
use kiln::instruction::{Instruction, MemArg};
use kiln::ir::{Instr, IrFunction, IrModule, Terminator, ValueDef};
use kiln::module::{BlockType, ExceptionTypeDef, FunctionDef, FunctionType, Module, ValueType};

fn single_function_module(
    params: &[ValueType],
    results: &[ValueType],
    locals: &[ValueType],
    code: Vec<Instruction>,
) -> Module {
    let mut module = Module::new();
    let type_index = module.add_type(FunctionType::new(params.to_vec(), results.to_vec()));
    module.functions.push(FunctionDef {
        type_index,
        locals: locals.to_vec(),
        code,
        branch_tables: vec![],
    });
    module
}

fn emit(module: &Module) -> IrModule {
    let instance = ModuleInstance::for_module(module);
    emit_module(module, &instance, EmitOptions::default()).expect("emission failed")
}

fn emit_one(
    params: &[ValueType],
    results: &[ValueType],
    locals: &[ValueType],
    code: Vec<Instruction>,
) -> IrModule {
    emit(&single_function_module(params, results, locals, code))
}

fn first_function(ir: &IrModule) -> &IrFunction {
    ir.function(ir.find_function("wasmFunction0").expect("function missing"))
}

fn phi_incoming_count(function: &IrFunction, phi: kiln::ir::ValueId) -> usize {
    match &function.value(phi).def {
        ValueDef::Inst(Instr::Phi { incomings }) => incomings.len(),
        other => panic!("not a phi: {other:?}"),
    }
}

// ----------------------------------------------------------------------
// Concrete scenarios
// ----------------------------------------------------------------------

#[test]
fn div_s_traps_on_zero_and_overflow() {
    // (func (result i32) i32.const 7 i32.const 5 i32.div_s)
    let ir = emit_one(
        &[],
        &[ValueType::I32],
        &[],
        vec![
            Instruction::I32Const { value: 7 },
            Instruction::I32Const { value: 5 },
            Instruction::I32DivS,
            Instruction::End,
        ],
    );
    let function = first_function(&ir);
    let trap = function
        .find_block("divideByZeroOrIntegerOverflowTrapTrap")
        .expect("trap block missing");
    // The trap block calls the intrinsic and never returns.
    assert!(matches!(
        function.block(trap).terminator,
        Some(Terminator::Unreachable)
    ));
    assert!(function
        .find_block("divideByZeroOrIntegerOverflowTrapSkip")
        .is_some());
    assert!(function.to_string().contains("sdiv"));
}

#[test]
fn rem_s_int_min_case_yields_zero_without_trapping() {
    // (func (result i32) i32.const INT_MIN i32.const -1 i32.rem_s) -> 0
    let ir = emit_one(
        &[],
        &[ValueType::I32],
        &[],
        vec![
            Instruction::I32Const { value: i32::MIN },
            Instruction::I32Const { value: -1 },
            Instruction::I32RemS,
            Instruction::End,
        ],
    );
    let function = first_function(&ir);
    let end = function.find_block("sremEnd").expect("merge block missing");
    // The merge phi has two incoming edges: the srem result and the
    // defined zero from the overflow arm.
    assert_eq!(function.block(end).phis.len(), 1);
    assert_eq!(phi_incoming_count(function, function.block(end).phis[0]), 2);
    // Only the divide-by-zero check traps; the overflow case does not.
    assert_eq!(
        function.blocks_named("divideByZeroOrIntegerOverflowTrapTrap").len(),
        1
    );
}

#[test]
fn select_lowers_to_a_backend_select() {
    // (func (param i32 i32) (result i32)
    //     get_local 0 get_local 1 i32.const 0 select)
    let ir = emit_one(
        &[ValueType::I32, ValueType::I32],
        &[ValueType::I32],
        &[],
        vec![
            Instruction::LocalGet { local_index: 0 },
            Instruction::LocalGet { local_index: 1 },
            Instruction::I32Const { value: 0 },
            Instruction::Select,
            Instruction::End,
        ],
    );
    let text = first_function(&ir).to_string();
    assert!(text.contains("icmp ne"));
    assert!(text.contains("select"));
}

#[test]
fn block_br_feeds_the_end_phi() {
    // (func (result i32) block (result i32) i32.const 1 br 0 i32.const 2 end)
    let ir = emit_one(
        &[],
        &[ValueType::I32],
        &[],
        vec![
            Instruction::Block {
                block_type: BlockType::Value(ValueType::I32),
            },
            Instruction::I32Const { value: 1 },
            Instruction::Br { depth: 0 },
            Instruction::I32Const { value: 2 },
            Instruction::End,
            Instruction::End,
        ],
    );
    let function = first_function(&ir);
    let end = function.find_block("blockEnd").unwrap();
    let phis = &function.block(end).phis;
    assert_eq!(phis.len(), 1);
    // Exactly one edge: the br. The i32.const 2 path was unreachable.
    assert_eq!(phi_incoming_count(function, phis[0]), 1);
    let text = function.to_string();
    assert!(text.contains("i32 1"));
}

#[test]
fn float_add_survives_as_a_constrained_operation() {
    // (func (result f32) f32.const nan f32.const 1.0 f32.add)
    let ir = emit_one(
        &[],
        &[ValueType::F32],
        &[],
        vec![
            Instruction::F32Const { value: f32::NAN },
            Instruction::F32Const { value: 1.0 },
            Instruction::F32Add,
            Instruction::End,
        ],
    );
    let text = first_function(&ir).to_string();
    assert!(text.contains("constrained.fadd"));
    assert!(text.contains("round.tonearest"));
}

#[test]
fn word_sized_atomic_load_traps_on_misalignment() {
    let ir = emit_one(
        &[],
        &[ValueType::I32],
        &[],
        vec![
            Instruction::I32Const { value: 0 },
            Instruction::I32AtomicLoad {
                memarg: MemArg { align: 2, offset: 0 },
            },
            Instruction::End,
        ],
    );
    let function = first_function(&ir);
    assert!(function.find_block("misalignedAtomicTrapTrap").is_some());
    let text = function.to_string();
    assert!(text.contains("seq_cst"));
}

// ----------------------------------------------------------------------
// Invariants
// ----------------------------------------------------------------------

#[test]
fn empty_block_result_becomes_a_typed_zero() {
    // A block whose end phi has no incoming edges pushes the typed zero.
    let ir = emit_one(
        &[],
        &[ValueType::I32],
        &[],
        vec![
            Instruction::Block {
                block_type: BlockType::Value(ValueType::I32),
            },
            Instruction::Unreachable,
            Instruction::End,
            Instruction::End,
        ],
    );
    let function = first_function(&ir);
    let end = function.find_block("blockEnd").unwrap();
    // The phi was erased; the zero constant feeds the return phi instead.
    assert!(function.block(end).phis.is_empty());
}

#[test]
fn loop_back_branch_adds_a_second_phi_edge() {
    // (loop (param i32) ... br 0) : the parameter phi merges the entry
    // edge and the back edge.
    let mut module = Module::new();
    let block_type = module.add_type(FunctionType::new(vec![ValueType::I32], vec![]));
    let func_type = module.add_type(FunctionType::new(vec![ValueType::I32], vec![]));
    module.functions.push(FunctionDef {
        type_index: func_type,
        locals: vec![],
        code: vec![
            Instruction::LocalGet { local_index: 0 },
            Instruction::Loop {
                block_type: BlockType::Type(block_type),
            },
            Instruction::Br { depth: 0 },
            Instruction::End,
            Instruction::End,
        ],
        branch_tables: vec![],
    });

    let ir = emit(&module);
    let function = first_function(&ir);
    let body = function.find_block("loopBody").unwrap();
    assert_eq!(function.block(body).phis.len(), 1);
    assert_eq!(phi_incoming_count(function, function.block(body).phis[0]), 2);
}

#[test]
fn branch_depths_select_targets_from_the_top() {
    // br 1 out of two nested blocks targets the outer block's end.
    let ir = emit_one(
        &[],
        &[],
        &[],
        vec![
            Instruction::Block {
                block_type: BlockType::Empty,
            },
            Instruction::Block {
                block_type: BlockType::Empty,
            },
            Instruction::Br { depth: 1 },
            Instruction::End,
            Instruction::End,
            Instruction::End,
        ],
    );
    let function = first_function(&ir);
    let ends = function.blocks_named("blockEnd");
    assert_eq!(ends.len(), 2);
    // The outer block's end was created first, so it has the lower id;
    // the inner body branches straight to it.
    let outer_end = ends.iter().map(|block| block.index()).min().unwrap();
    let text = function.to_string();
    assert!(text.contains(&format!("br blockEnd.{outer_end}")));
}

#[test]
fn br_if_keeps_arguments_on_the_fallthrough_path() {
    let ir = emit_one(
        &[ValueType::I32],
        &[ValueType::I32],
        &[],
        vec![
            Instruction::Block {
                block_type: BlockType::Value(ValueType::I32),
            },
            Instruction::I32Const { value: 5 },
            Instruction::LocalGet { local_index: 0 },
            Instruction::BrIf { depth: 0 },
            Instruction::I32Const { value: 1 },
            Instruction::I32Add,
            Instruction::End,
            Instruction::End,
        ],
    );
    let function = first_function(&ir);
    // The fall-through continues in br_ifElse and still has the value 5
    // available for the add.
    assert!(function.find_block("br_ifElse").is_some());
    let end = function.find_block("blockEnd").unwrap();
    // Two edges into the end phi: the br_if and the fall-through add.
    assert_eq!(phi_incoming_count(function, function.block(end).phis[0]), 2);
}

#[test]
fn shift_counts_are_masked_to_the_bit_width() {
    let ir = emit_one(
        &[ValueType::I64, ValueType::I64],
        &[ValueType::I64],
        &[],
        vec![
            Instruction::LocalGet { local_index: 0 },
            Instruction::LocalGet { local_index: 1 },
            Instruction::I64Shl,
            Instruction::End,
        ],
    );
    let text = first_function(&ir).to_string();
    assert!(text.contains("i64 63"));
    assert!(text.contains("shl"));
}

#[test]
fn saturating_conversions_map_nan_to_zero() {
    let ir = emit_one(
        &[ValueType::F64],
        &[ValueType::I64],
        &[],
        vec![
            Instruction::LocalGet { local_index: 0 },
            Instruction::I64TruncSatF64S,
            Instruction::End,
        ],
    );
    let function = first_function(&ir);
    let text = function.to_string();
    // No trap block: saturation selects instead.
    assert!(function.find_block("FPToInt_nan").is_none());
    assert!(text.contains("fcmp uno"));
    assert!(text.contains("select"));
    // Both integer bounds appear as select arms.
    assert!(text.contains(&format!("i64 {}", i64::MIN as u64)));
    assert!(text.contains(&format!("i64 {}", i64::MAX as u64)));
}

// ----------------------------------------------------------------------
// Module-level behavior
// ----------------------------------------------------------------------

#[test]
fn every_emitted_function_names_the_personality() {
    let mut module = single_function_module(&[], &[], &[], vec![Instruction::End]);
    let t = module.add_type(FunctionType::new(vec![], vec![]));
    module.functions.push(FunctionDef {
        type_index: t,
        locals: vec![],
        code: vec![Instruction::End],
        branch_tables: vec![],
    });

    let instance = ModuleInstance::for_module(&module);
    let options = EmitOptions {
        eh_model: EhModel::LandingPad,
        ..EmitOptions::default()
    };
    let ir = emit_module(&module, &instance, options).unwrap();

    let personality = ir.find_function("__gxx_personality_v0").unwrap();
    for name in ["wasmFunction0", "wasmFunction1"] {
        let function = ir.function(ir.find_function(name).unwrap());
        assert_eq!(function.personality, Some(personality));
    }
    assert!(ir.debug_info_finalized());
}

#[test]
fn function_enter_exit_hooks_are_emitted_when_enabled() {
    let module = single_function_module(&[], &[], &[], vec![Instruction::End]);
    let instance = ModuleInstance::for_module(&module);
    let options = EmitOptions {
        function_enter_exit_hooks: true,
        ..EmitOptions::default()
    };
    let ir = emit_module(&module, &instance, options).unwrap();
    let text = first_function(&ir).to_string();
    // Two hook calls: enter in the prologue, exit before the return.
    let hook_calls = text.matches("call intrinsic").count();
    assert!(hook_calls >= 2, "expected enter and exit hooks: {text}");
}

#[test]
fn debug_locations_follow_operator_indices() {
    let ir = emit_one(
        &[],
        &[ValueType::I32],
        &[],
        vec![
            Instruction::I32Const { value: 1 },
            Instruction::I32Const { value: 2 },
            Instruction::I32Add,
            Instruction::End,
        ],
    );
    let function = first_function(&ir);
    // Find the add instruction and check its location is operator 2.
    let mut found = false;
    for &block in function.layout() {
        for &inst in &function.block(block).insts {
            if let ValueDef::Inst(Instr::Binary { .. }) = &function.value(inst).def {
                assert_eq!(function.value(inst).loc, Some(2));
                found = true;
            }
        }
    }
    assert!(found, "add instruction not emitted");
}

// ----------------------------------------------------------------------
// Exception handling, both models
// ----------------------------------------------------------------------

fn try_catch_module() -> Module {
    let mut module = single_function_module(
        &[ValueType::I64],
        &[],
        &[],
        vec![
            Instruction::Try {
                block_type: BlockType::Empty,
            },
            Instruction::LocalGet { local_index: 0 },
            Instruction::Throw {
                exception_type_index: 0,
            },
            Instruction::Catch {
                exception_type_index: 0,
            },
            Instruction::Drop,
            Instruction::End,
            Instruction::End,
        ],
    );
    module.exception_types.push(ExceptionTypeDef {
        params: vec![ValueType::I64],
    });
    module
}

#[test]
fn landing_pad_model_emits_invokes_inside_try() {
    let module = try_catch_module();
    let instance = ModuleInstance::for_module(&module);
    let options = EmitOptions {
        eh_model: EhModel::LandingPad,
        ..EmitOptions::default()
    };
    let ir = emit_module(&module, &instance, options).unwrap();
    let function = first_function(&ir);
    // Print with module context so callee names resolve.
    let text = ir.to_string();

    let landing_pad = function.find_block("landingPad").unwrap();
    // The throw call inside the try unwinds to the landing pad.
    assert!(text.contains(&format!("unwind landingPad.{}", landing_pad.index())));
    assert!(text.contains("landingpad"));
    assert!(text.contains("@__cxa_begin_catch"));
    // The catch compares the thrown type id against the expected one.
    assert!(function.find_block("catch").is_some());
    assert!(function.find_block("unhandled").is_some());
}

#[test]
fn funclet_model_emits_catch_switch_and_filter() {
    let module = try_catch_module();
    let instance = ModuleInstance::for_module(&module);
    let options = EmitOptions {
        eh_model: EhModel::Funclet,
        ..EmitOptions::default()
    };
    let ir = emit_module(&module, &instance, options).unwrap();
    let function = first_function(&ir);
    let text = function.to_string();

    assert!(function.find_block("catchSwitch").is_some());
    assert!(text.contains("catchswitch"));
    assert!(text.contains("catchpad"));
    // The try body opens with the dummy call that anchors frame recovery.
    assert!(ir.find_function("__try_prologue").is_some());
    // A filter function was generated and escapes the parent-frame slot.
    let filter = ir.function(ir.find_function("sehFilter0").unwrap());
    assert!(filter.to_string().contains("localrecover"));
    assert!(text.contains("localescape"));
    // The personality is the SEH one.
    let personality = ir.find_function("__C_specific_handler").unwrap();
    assert_eq!(function.personality, Some(personality));
}

#[test]
fn throw_reverses_argument_slots() {
    let mut module = single_function_module(
        &[ValueType::I64, ValueType::I64],
        &[],
        &[],
        vec![
            Instruction::LocalGet { local_index: 0 },
            Instruction::LocalGet { local_index: 1 },
            Instruction::Throw {
                exception_type_index: 0,
            },
            Instruction::End,
        ],
    );
    module.exception_types.push(ExceptionTypeDef {
        params: vec![ValueType::I64, ValueType::I64],
    });
    let instance = ModuleInstance::for_module(&module);
    let options = EmitOptions {
        eh_model: EhModel::LandingPad,
        ..EmitOptions::default()
    };
    let ir = emit_module(&module, &instance, options).unwrap();
    let text = first_function(&ir).to_string();
    // Two 8-byte slots; the value popped first lands at offset 8, the
    // second at offset 0.
    assert!(text.contains("alloca i8, count i32 16"));
    assert!(text.contains("i64 8"));
    assert!(text.contains("ptrtoint"));
}

// ----------------------------------------------------------------------
// Indirect calls
// ----------------------------------------------------------------------

#[test]
fn call_indirect_loads_token_then_pointer() {
    let mut module = single_function_module(
        &[ValueType::I32],
        &[ValueType::I32],
        &[],
        vec![
            Instruction::LocalGet { local_index: 0 },
            Instruction::CallIndirect {
                type_index: 1,
                table_index: 0,
            },
            Instruction::End,
        ],
    );
    module.add_type(FunctionType::new(vec![], vec![ValueType::I32]));

    let ir = emit(&module);
    let function = first_function(&ir);
    let text = function.to_string();
    assert!(function.find_block("indirectCallSignatureMismatchTrap").is_some());
    // The expected token is embedded as a 64-bit literal and compared
    // against the loaded element token.
    assert!(text.contains("icmp ne"));
    assert!(text.contains("load i64"));
    assert!(text.contains("load ptr"));
}
