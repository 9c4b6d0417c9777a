//! Expression building: instruction sequences for function bodies and the
//! constant expressions used by initializers.
//!
//! [`ExprBuilder`] accumulates encoded instructions while tracking the
//! nesting of structured control flow, so a malformed sequence is rejected
//! at the instruction that introduces it rather than at assembly time.
//! [`ExprBuilder::finish`] consumes the builder, appends the `end`
//! terminator, and yields an immutable [`Expr`]; further edits and double
//! finalization are ruled out by ownership.
//!
//! [`ConstExpr`] covers the closed set of instructions WebAssembly admits
//! in constant position (global initializers, segment offsets, element
//! initializers). Keeping it a separate type lets the assembler type-check
//! initializers eagerly without scanning instruction bytes.

use crate::encoding::OP_END;
use crate::instruction::Instruction;
use crate::types::RefType;

/// Errors raised while building an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("end with no open block")]
    EndWithoutOpener,
    #[error("else is only valid directly inside an if without a prior else")]
    ElseWithoutIf,
    #[error("branch label {label} exceeds current nesting depth {depth}")]
    BranchDepth { label: u32, depth: u32 },
    #[error("expression finished with {depth} unclosed block(s)")]
    UnbalancedExpr { depth: u32 },
}

/// One open structured-control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Block,
    Loop,
    If { seen_else: bool },
}

/// A finalized instruction sequence, terminated by the `end` opcode.
///
/// Produced by [`ExprBuilder::finish`] and consumed by the module
/// assembler; the bytes are immutable from here on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    bytes: Vec<u8>,
}

impl Expr {
    /// An empty body: just the `end` terminator.
    pub fn empty() -> Expr {
        Expr { bytes: vec![OP_END] }
    }

    /// The encoded instruction bytes, including the trailing `0x0B`.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Accumulates a well-structured instruction sequence.
///
/// One [`Instruction`] value per Wasm instruction; [`emit`](Self::emit)
/// appends the canonical encoding and enforces the structural rules:
/// `block`/`loop`/`if` open a frame, `end` closes one, `else` flips the
/// innermost `if`, and branch targets may not exceed the current depth
/// (the target equal to the depth is the implicit function label).
#[derive(Debug, Default)]
pub struct ExprBuilder {
    bytes: Vec<u8>,
    frames: Vec<Frame>,
}

impl ExprBuilder {
    pub fn new() -> ExprBuilder {
        ExprBuilder::default()
    }

    /// Number of currently open `block`/`loop`/`if` frames.
    pub fn depth(&self) -> u32 {
        self.frames.len() as u32
    }

    /// Appends one instruction. Returns `&mut self` so bodies can be built
    /// fluently:
    ///
    /// ```
    /// use wasmith::expr::ExprBuilder;
    /// use wasmith::instruction::Instruction;
    ///
    /// let mut body = ExprBuilder::new();
    /// body.emit(Instruction::LocalGet { local_idx: 0 }).unwrap()
    ///     .emit(Instruction::LocalGet { local_idx: 1 }).unwrap()
    ///     .emit(Instruction::I32Add).unwrap();
    /// let expr = body.finish().unwrap();
    /// assert_eq!(expr.bytes(), [0x20, 0x00, 0x20, 0x01, 0x6A, 0x0B]);
    /// ```
    pub fn emit(&mut self, inst: Instruction) -> Result<&mut Self, ExprError> {
        match &inst {
            Instruction::Block { .. } => self.frames.push(Frame::Block),
            Instruction::Loop { .. } => self.frames.push(Frame::Loop),
            Instruction::If { .. } => self.frames.push(Frame::If { seen_else: false }),
            Instruction::Else => match self.frames.last_mut() {
                Some(Frame::If { seen_else }) if !*seen_else => *seen_else = true,
                _ => return Err(ExprError::ElseWithoutIf),
            },
            Instruction::End => {
                if self.frames.pop().is_none() {
                    return Err(ExprError::EndWithoutOpener);
                }
            }
            Instruction::Br { label } | Instruction::BrIf { label } => {
                self.check_label(*label)?;
            }
            Instruction::BrTable { targets, default } => {
                for target in targets {
                    self.check_label(*target)?;
                }
                self.check_label(*default)?;
            }
            _ => {}
        }
        inst.encode(&mut self.bytes);
        Ok(self)
    }

    fn check_label(&self, label: u32) -> Result<(), ExprError> {
        let depth = self.depth();
        if label > depth {
            return Err(ExprError::BranchDepth { label, depth });
        }
        Ok(())
    }

    /// Terminates the expression: all frames must be closed; the `end`
    /// opcode is appended and the finished [`Expr`] returned.
    pub fn finish(mut self) -> Result<Expr, ExprError> {
        if !self.frames.is_empty() {
            return Err(ExprError::UnbalancedExpr { depth: self.depth() });
        }
        self.bytes.push(OP_END);
        Ok(Expr { bytes: self.bytes })
    }
}

/// A constant expression: the closed instruction set WebAssembly admits in
/// initializer position.
///
/// `global.get` is only constant when it refers to an imported global; the
/// assembler resolves and type-checks the reference at insertion.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstExpr {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    GlobalGet(u32),
    RefNull(RefType),
    RefFunc(u32),
}

impl ConstExpr {
    fn instruction(&self) -> Instruction {
        match *self {
            ConstExpr::I32(value) => Instruction::I32Const { value },
            ConstExpr::I64(value) => Instruction::I64Const { value },
            ConstExpr::F32(value) => Instruction::F32Const { value },
            ConstExpr::F64(value) => Instruction::F64Const { value },
            ConstExpr::GlobalGet(global_idx) => Instruction::GlobalGet { global_idx },
            ConstExpr::RefNull(ref_type) => Instruction::RefNull { ref_type },
            ConstExpr::RefFunc(func_idx) => Instruction::RefFunc { func_idx },
        }
    }

    /// Appends `instruction end` to `buf`.
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        self.instruction().encode(buf);
        buf.push(OP_END);
    }
}
