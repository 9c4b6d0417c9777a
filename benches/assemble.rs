use criterion::{Criterion, black_box, criterion_group, criterion_main};

use wasmith::expr::ExprBuilder;
use wasmith::instruction::{BlockType, Instruction};
use wasmith::module::{Function, Module};
use wasmith::types::{FuncType, ValueType};

/// Builds a module with `count` small arithmetic functions.
fn build_module(count: u32) -> Module {
    let mut module = Module::new();
    let ty = module.func_type(FuncType::new(
        [ValueType::I32, ValueType::I32],
        [ValueType::I32],
    ));

    for i in 0..count {
        let mut body = ExprBuilder::new();
        body.emit(Instruction::LocalGet { local_idx: 0 }).unwrap()
            .emit(Instruction::LocalGet { local_idx: 1 }).unwrap()
            .emit(Instruction::I32Add).unwrap()
            .emit(Instruction::I32Const { value: i as i32 }).unwrap()
            .emit(Instruction::I32Xor).unwrap();
        module
            .function(Function::new(ty, body.finish().unwrap()))
            .unwrap();
    }
    module
}

fn bench_assemble(c: &mut Criterion) {
    c.bench_function("assemble_1000_functions", |b| {
        b.iter(|| black_box(build_module(1000).assemble()))
    });
}

fn bench_expression_builder(c: &mut Criterion) {
    c.bench_function("emit_deeply_nested_blocks", |b| {
        b.iter(|| {
            let mut body = ExprBuilder::new();
            for _ in 0..256 {
                body.emit(Instruction::Block { block_type: BlockType::Empty }).unwrap();
            }
            for _ in 0..256 {
                body.emit(Instruction::End).unwrap();
            }
            black_box(body.finish().unwrap())
        })
    });
}

criterion_group!(benches, bench_assemble, bench_expression_builder);
criterion_main!(benches);
