#![no_main]

//! Structure-aware expression fuzzer.
//!
//! Generates arbitrary instruction sequences, feeds them through the
//! expression builder (structural misuse must surface as an error, never a
//! panic), closes whatever frames remain, and asserts the finished
//! expression and a module assembled around it uphold the wire invariants.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use wasmith::expr::ExprBuilder;
use wasmith::instruction::{BlockType, Instruction, MemArg};
use wasmith::module::{Function, Module};
use wasmith::types::{FuncType, ValueType};

#[derive(Arbitrary, Debug)]
enum Op {
    Block,
    Loop,
    If,
    Else,
    End,
    Br(u8),
    BrIf(u8),
    Nop,
    Unreachable,
    Return,
    Drop,
    I32Const(i32),
    I64Const(i64),
    F64Const(f64),
    I32Add,
    I64Mul,
    I32Load { align: u8, offset: u16 },
    I32Store { align: u8, offset: u16 },
    MemoryFill,
    LocalGet(u8),
}

impl Op {
    fn instruction(&self) -> Instruction {
        match *self {
            Op::Block => Instruction::Block { block_type: BlockType::Empty },
            Op::Loop => Instruction::Loop { block_type: BlockType::Empty },
            Op::If => Instruction::If { block_type: BlockType::Value(ValueType::I32) },
            Op::Else => Instruction::Else,
            Op::End => Instruction::End,
            Op::Br(label) => Instruction::Br { label: u32::from(label) },
            Op::BrIf(label) => Instruction::BrIf { label: u32::from(label) },
            Op::Nop => Instruction::Nop,
            Op::Unreachable => Instruction::Unreachable,
            Op::Return => Instruction::Return,
            Op::Drop => Instruction::Drop,
            Op::I32Const(value) => Instruction::I32Const { value },
            Op::I64Const(value) => Instruction::I64Const { value },
            Op::F64Const(value) => Instruction::F64Const { value },
            Op::I32Add => Instruction::I32Add,
            Op::I64Mul => Instruction::I64Mul,
            Op::I32Load { align, offset } => Instruction::I32Load {
                memarg: MemArg::new(u32::from(align), u32::from(offset)),
            },
            Op::I32Store { align, offset } => Instruction::I32Store {
                memarg: MemArg::new(u32::from(align), u32::from(offset)),
            },
            Op::MemoryFill => Instruction::MemoryFill,
            Op::LocalGet(idx) => Instruction::LocalGet { local_idx: u32::from(idx) },
        }
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let mut builder = ExprBuilder::new();
    for op in &ops {
        let _ = builder.emit(op.instruction());
    }

    let open = builder.depth();
    for _ in 0..open {
        builder.emit(Instruction::End).expect("closing an open frame");
    }

    let expr = builder.finish().expect("balanced expression");
    assert_eq!(expr.bytes().last(), Some(&0x0B));

    let mut module = Module::new();
    let ty = module.func_type(FuncType::new([], []));
    module.function(Function::new(ty, expr)).unwrap();

    let wasm = module.assemble();
    assert_eq!(&wasm[0..8], [0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00]);
});
