use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kiln::emit::{emit_module, EmitOptions};
use kiln::instance::ModuleInstance;
use kiln::instruction::Instruction;
use kiln::module::{BlockType, FunctionDef, FunctionType, Module, ValueType};

/// A function with a counted loop of integer arithmetic: the shape the
/// dispatch loop spends its time on in real modules.
fn arithmetic_loop_module() -> Module {
    let mut module = Module::new();
    let type_index = module.add_type(FunctionType::new(
        vec![ValueType::I32],
        vec![ValueType::I32],
    ));

    let mut code = vec![Instruction::Block {
        block_type: BlockType::Empty,
    }];
    code.push(Instruction::Loop {
        block_type: BlockType::Empty,
    });
    for _ in 0..64 {
        code.extend([
            Instruction::LocalGet { local_index: 1 },
            Instruction::LocalGet { local_index: 0 },
            Instruction::I32Mul,
            Instruction::I32Const { value: 17 },
            Instruction::I32Add,
            Instruction::LocalSet { local_index: 1 },
        ]);
    }
    code.extend([
        Instruction::LocalGet { local_index: 0 },
        Instruction::I32Const { value: 1 },
        Instruction::I32Sub,
        Instruction::LocalTee { local_index: 0 },
        Instruction::BrIf { depth: 0 },
        Instruction::Br { depth: 1 },
        Instruction::End,
        Instruction::End,
        Instruction::LocalGet { local_index: 1 },
        Instruction::End,
    ]);

    module.functions.push(FunctionDef {
        type_index,
        locals: vec![ValueType::I32],
        code,
        branch_tables: vec![],
    });
    module
}

fn bench_emit(c: &mut Criterion) {
    let module = arithmetic_loop_module();
    let instance = ModuleInstance::for_module(&module);

    c.bench_function("emit_arithmetic_loop", |b| {
        b.iter(|| {
            let ir = emit_module(black_box(&module), &instance, EmitOptions::default()).unwrap();
            black_box(ir);
        })
    });
}

criterion_group!(benches, bench_emit);
criterion_main!(benches);
