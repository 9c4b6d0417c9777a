//! The WebAssembly type grammar: value types, reference types, limits, and
//! the composite function/table/global types, each with its wire encoding.
//!
//! ```text
//! valtype    ::= 0x7F (i32) | 0x7E (i64) | 0x7D (f32) | 0x7C (f64)
//!              | 0x7B (v128) | 0x70 (funcref) | 0x6F (externref)
//! limits     ::= 0x00 min:vu32 | 0x01 min:vu32 max:vu32
//! functype   ::= 0x60 vec(valtype) vec(valtype)
//! tabletype  ::= reftype limits
//! globaltype ::= valtype mut
//! ```

use std::fmt;

use crate::encoding::{self, MUT_CONST, MUT_VAR, TYPE_FUNC};

/// A WebAssembly value type.
///
/// `V128` is carried for completeness of the type grammar; no SIMD
/// instructions are exposed by this crate, so it can only appear in
/// signatures and locals of modules destined for SIMD-aware consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
    V128,
    FuncRef,
    ExternRef,
}

impl ValueType {
    /// The single-byte wire encoding of this type.
    pub fn wire_byte(self) -> u8 {
        match self {
            ValueType::I32 => 0x7F,
            ValueType::I64 => 0x7E,
            ValueType::F32 => 0x7D,
            ValueType::F64 => 0x7C,
            ValueType::V128 => 0x7B,
            ValueType::FuncRef => 0x70,
            ValueType::ExternRef => 0x6F,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::V128 => "v128",
            ValueType::FuncRef => "funcref",
            ValueType::ExternRef => "externref",
        })
    }
}

/// A WebAssembly reference type, the element type of tables and the operand
/// of `ref.null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefType {
    FuncRef,
    ExternRef,
}

impl RefType {
    pub fn wire_byte(self) -> u8 {
        ValueType::from(self).wire_byte()
    }
}

impl From<RefType> for ValueType {
    fn from(rt: RefType) -> Self {
        match rt {
            RefType::FuncRef => ValueType::FuncRef,
            RefType::ExternRef => ValueType::ExternRef,
        }
    }
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ValueType::from(*self).fmt(f)
    }
}

/// Size bounds for a memory or table: a minimum and an optional maximum.
///
/// The data-model invariant `max >= min` is checked by the assembler when
/// the limits are inserted, so a failed insertion leaves no partial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub min: u32,
    pub max: Option<u32>,
}

impl Limits {
    /// Limits with a minimum and no maximum.
    pub fn at_least(min: u32) -> Limits {
        Limits { min, max: None }
    }

    /// Limits with both bounds. `max >= min` is validated on insertion.
    pub fn bounded(min: u32, max: u32) -> Limits {
        Limits { min, max: Some(max) }
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        match self.max {
            Some(max) => {
                encoding::write_vu1(buf, true);
                encoding::write_vu32(buf, self.min);
                encoding::write_vu32(buf, max);
            }
            None => {
                encoding::write_vu1(buf, false);
                encoding::write_vu32(buf, self.min);
            }
        }
    }
}

impl fmt::Display for Limits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "min {} max {}", self.min, max),
            None => write!(f, "min {}", self.min),
        }
    }
}

/// A function signature: parameter types and result types, in order.
///
/// Equality is structural; the assembler deduplicates structurally equal
/// signatures in the type section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncType {
    pub params: Vec<ValueType>,
    pub results: Vec<ValueType>,
}

impl FuncType {
    pub fn new(params: impl Into<Vec<ValueType>>, results: impl Into<Vec<ValueType>>) -> FuncType {
        FuncType {
            params: params.into(),
            results: results.into(),
        }
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(TYPE_FUNC);
        encoding::write_vu32(buf, self.params.len() as u32);
        for p in &self.params {
            buf.push(p.wire_byte());
        }
        encoding::write_vu32(buf, self.results.len() as u32);
        for r in &self.results {
            buf.push(r.wire_byte());
        }
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |types: &[ValueType]| {
            types
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        };
        write!(f, "({}) -> ({})", join(&self.params), join(&self.results))
    }
}

/// A table type: element reference type plus size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableType {
    pub ref_type: RefType,
    pub limits: Limits,
}

impl TableType {
    pub fn new(ref_type: RefType, limits: Limits) -> TableType {
        TableType { ref_type, limits }
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(self.ref_type.wire_byte());
        self.limits.encode(buf);
    }
}

/// A global type: value type plus mutability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalType {
    pub value_type: ValueType,
    pub mutable: bool,
}

impl GlobalType {
    /// An immutable global of the given type.
    pub fn immutable(value_type: ValueType) -> GlobalType {
        GlobalType {
            value_type,
            mutable: false,
        }
    }

    /// A mutable global of the given type.
    pub fn mutable(value_type: ValueType) -> GlobalType {
        GlobalType {
            value_type,
            mutable: true,
        }
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(self.value_type.wire_byte());
        buf.push(if self.mutable { MUT_VAR } else { MUT_CONST });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_wire_bytes() {
        assert_eq!(ValueType::I32.wire_byte(), 0x7F);
        assert_eq!(ValueType::I64.wire_byte(), 0x7E);
        assert_eq!(ValueType::F32.wire_byte(), 0x7D);
        assert_eq!(ValueType::F64.wire_byte(), 0x7C);
        assert_eq!(ValueType::V128.wire_byte(), 0x7B);
        assert_eq!(ValueType::FuncRef.wire_byte(), 0x70);
        assert_eq!(ValueType::ExternRef.wire_byte(), 0x6F);
    }

    #[test]
    fn limits_encoding() {
        let mut buf = Vec::new();
        Limits::at_least(1).encode(&mut buf);
        assert_eq!(buf, [0x00, 0x01]);

        let mut buf = Vec::new();
        Limits::bounded(1, 16).encode(&mut buf);
        assert_eq!(buf, [0x01, 0x01, 0x10]);
    }

    #[test]
    fn func_type_encoding() {
        let mut buf = Vec::new();
        FuncType::new([ValueType::I32, ValueType::I32], [ValueType::I32]).encode(&mut buf);
        assert_eq!(buf, [0x60, 0x02, 0x7F, 0x7F, 0x01, 0x7F]);

        let mut buf = Vec::new();
        FuncType::new([], []).encode(&mut buf);
        assert_eq!(buf, [0x60, 0x00, 0x00]);
    }

    #[test]
    fn func_type_structural_equality() {
        let a = FuncType::new([ValueType::I32], [ValueType::I64]);
        let b = FuncType::new(vec![ValueType::I32], vec![ValueType::I64]);
        let c = FuncType::new([ValueType::I64], [ValueType::I32]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn global_and_table_type_encoding() {
        let mut buf = Vec::new();
        GlobalType::mutable(ValueType::I64).encode(&mut buf);
        assert_eq!(buf, [0x7E, 0x01]);

        let mut buf = Vec::new();
        GlobalType::immutable(ValueType::F32).encode(&mut buf);
        assert_eq!(buf, [0x7D, 0x00]);

        let mut buf = Vec::new();
        TableType::new(RefType::FuncRef, Limits::bounded(0, 8)).encode(&mut buf);
        assert_eq!(buf, [0x70, 0x01, 0x00, 0x08]);
    }
}
