//! A WebAssembly 2.0 binary module assembler written in Rust.
//!
//! wasmith builds `.wasm` binaries from programmatically assembled
//! declarations: intern function signatures, add imports, memories,
//! tables, globals, functions with instruction bodies, exports and
//! data/element segments, then serialize the whole module in the canonical
//! section layout. The full non-SIMD WebAssembly 2.0 instruction set is
//! supported.
//!
//! # Modules
//!
//! - [`encoding`] -- LEB128, float, and name encoding primitives plus the
//!   wire-format constants.
//! - [`types`] -- The WebAssembly type grammar (value types, limits,
//!   signatures) and its encodings.
//! - [`instruction`] -- The instruction set and its opcode tables.
//! - [`expr`] -- The expression builder for function bodies and the
//!   constant expressions used by initializers.
//! - [`module`] -- The module assembler: insertion, validation, and
//!   section serialization.
//!
//! # Example
//!
//! Assemble a module exporting an add function:
//!
//! ```
//! use wasmith::expr::ExprBuilder;
//! use wasmith::instruction::Instruction;
//! use wasmith::module::{Function, Module};
//! use wasmith::types::{FuncType, ValueType};
//!
//! let mut module = Module::new();
//! let ty = module.func_type(FuncType::new(
//!     [ValueType::I32, ValueType::I32],
//!     [ValueType::I32],
//! ));
//!
//! let mut body = ExprBuilder::new();
//! body.emit(Instruction::LocalGet { local_idx: 0 }).unwrap()
//!     .emit(Instruction::LocalGet { local_idx: 1 }).unwrap()
//!     .emit(Instruction::I32Add).unwrap();
//!
//! let func = module.function(Function::new(ty, body.finish().unwrap())).unwrap();
//! module.export_func("add", func).unwrap();
//!
//! let bytes = module.assemble();
//! assert_eq!(&bytes[0..4], b"\0asm");
//! ```
//!
//! # Validation
//!
//! Cross-references (type, function, table, memory, and global indices)
//! are checked eagerly at insertion, expression structure is checked at
//! emit time, and initializer types are checked against their
//! declarations. Full type checking of function bodies is out of scope;
//! the output of a well-typed description validates under the
//! [WebAssembly 2.0 specification](https://webassembly.github.io/spec/core/).

pub mod encoding;
pub mod expr;
pub mod instruction;
pub mod module;
pub mod types;

pub use expr::{ConstExpr, Expr, ExprBuilder, ExprError};
pub use instruction::{BlockType, Instruction, MemArg};
pub use module::{
    BuildError, ElementInit, ElementMode, ElementSegment, EntityKind, Function, Module,
};
pub use types::{FuncType, GlobalType, Limits, RefType, TableType, ValueType};
