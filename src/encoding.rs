//! Binary encoding primitives for the WebAssembly wire format.
//!
//! LEB128 integer encoding (unsigned and signed), IEEE 754 little-endian
//! floats, and length-prefixed byte vectors, together with the wire
//! constants (section ids, descriptor kinds, segment flags) shared by the
//! rest of the crate.
//!
//! All functions append to a caller-provided `&mut Vec<u8>`. Integer
//! encodings are always minimal: the WebAssembly spec requires canonical
//! LEB128 for lengths and indices, and emitting the shortest form
//! everywhere keeps output deterministic.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io;

// ---------------------------------------------------------------------------
// Wire constants (Wasm 2.0 spec section 5)
// ---------------------------------------------------------------------------

// Section ids (§5.5.2)
pub const SECTION_CUSTOM: u8 = 0;
pub const SECTION_TYPE: u8 = 1;
pub const SECTION_IMPORT: u8 = 2;
pub const SECTION_FUNCTION: u8 = 3;
pub const SECTION_TABLE: u8 = 4;
pub const SECTION_MEMORY: u8 = 5;
pub const SECTION_GLOBAL: u8 = 6;
pub const SECTION_EXPORT: u8 = 7;
pub const SECTION_START: u8 = 8;
pub const SECTION_ELEMENT: u8 = 9;
pub const SECTION_CODE: u8 = 10;
pub const SECTION_DATA: u8 = 11;
pub const SECTION_DATA_COUNT: u8 = 12;

// Function type constructor (§5.3.6)
pub const TYPE_FUNC: u8 = 0x60;

// Import/export descriptor kinds (§5.5.5, §5.5.10)
pub const DESC_FUNC: u8 = 0x00;
pub const DESC_TABLE: u8 = 0x01;
pub const DESC_MEMORY: u8 = 0x02;
pub const DESC_GLOBAL: u8 = 0x03;

// Global mutability (§5.3.10)
pub const MUT_CONST: u8 = 0x00;
pub const MUT_VAR: u8 = 0x01;

// Element segment elemkind byte (§5.5.12); funcref is the only defined kind
pub const ELEMKIND_FUNCREF: u8 = 0x00;

// Data segment flags (§5.5.14)
pub const DATA_ACTIVE: u32 = 0;
pub const DATA_PASSIVE: u32 = 1;
pub const DATA_ACTIVE_EXPLICIT: u32 = 2;

// Expression terminator (§5.4.9)
pub const OP_END: u8 = 0x0B;

// Empty block type (§5.4.1)
pub const BLOCK_TYPE_EMPTY: u8 = 0x40;

// Module preamble: magic `\0asm` followed by version 1 (§5.5.16)
pub const PREAMBLE: [u8; 8] = [0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00];

// ---------------------------------------------------------------------------
// Unsigned LEB128
// ---------------------------------------------------------------------------

fn write_unsigned(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Appends the unsigned LEB128 encoding of a u32 to `buf`.
pub fn write_vu32(buf: &mut Vec<u8>, v: u32) {
    write_unsigned(buf, u64::from(v));
}

/// Appends the unsigned LEB128 encoding of a u64 to `buf`.
pub fn write_vu64(buf: &mut Vec<u8>, v: u64) {
    write_unsigned(buf, v);
}

/// Appends a single-bit flag as one byte (0x00 or 0x01).
pub fn write_vu1(buf: &mut Vec<u8>, v: bool) {
    buf.push(u8::from(v));
}

// ---------------------------------------------------------------------------
// Signed LEB128
// ---------------------------------------------------------------------------

fn write_signed(buf: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Appends the signed LEB128 encoding of an i32 to `buf`.
pub fn write_vs32(buf: &mut Vec<u8>, v: i32) {
    write_signed(buf, i64::from(v));
}

/// Appends the signed LEB128 encoding of a 33-bit signed value to `buf`.
///
/// Block types encode type indices in this width so the single-byte value
/// types (all >= 0x40 as sign-extended bytes) stay unambiguous.
pub fn write_vs33(buf: &mut Vec<u8>, v: i64) {
    write_signed(buf, v);
}

/// Appends the signed LEB128 encoding of an i64 to `buf`.
pub fn write_vs64(buf: &mut Vec<u8>, v: i64) {
    write_signed(buf, v);
}

// ---------------------------------------------------------------------------
// IEEE 754 floats (little-endian)
// ---------------------------------------------------------------------------

/// Appends the 4-byte little-endian IEEE 754 encoding of an f32 to `buf`.
pub fn write_f32(buf: &mut Vec<u8>, v: f32) {
    let mut bytes = [0u8; 4];
    let mut wtr = io::Cursor::new(&mut bytes[..]);
    wtr.write_f32::<LittleEndian>(v).expect("4-byte buffer");
    buf.extend_from_slice(&bytes);
}

/// Appends the 8-byte little-endian IEEE 754 encoding of an f64 to `buf`.
pub fn write_f64(buf: &mut Vec<u8>, v: f64) {
    let mut bytes = [0u8; 8];
    let mut wtr = io::Cursor::new(&mut bytes[..]);
    wtr.write_f64::<LittleEndian>(v).expect("8-byte buffer");
    buf.extend_from_slice(&bytes);
}

// ---------------------------------------------------------------------------
// Names and byte vectors
// ---------------------------------------------------------------------------

/// Appends a length-prefixed byte vector (vu32 length + raw bytes) to `buf`.
pub fn write_u8vec(buf: &mut Vec<u8>, v: &[u8]) {
    write_vu32(buf, v.len() as u32);
    buf.extend_from_slice(v);
}

/// Appends a UTF-8 name as a length-prefixed byte vector.
pub fn write_name(buf: &mut Vec<u8>, name: &str) {
    write_u8vec(buf, name.as_bytes());
}

/// Wraps section contents with a section id and LEB128 length prefix.
///
/// ```text
/// section ::= id:u8 size:vu32 contents:byte*
/// ```
pub fn write_section(buf: &mut Vec<u8>, id: u8, contents: &[u8]) {
    buf.push(id);
    write_u8vec(buf, contents);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn vu32(v: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        write_vu32(&mut buf, v);
        buf
    }

    fn vu64(v: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_vu64(&mut buf, v);
        buf
    }

    fn vs32(v: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        write_vs32(&mut buf, v);
        buf
    }

    fn vs64(v: i64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_vs64(&mut buf, v);
        buf
    }

    #[test]
    fn unsigned_leb128_known_values() {
        assert_eq!(vu32(0), [0x00]);
        assert_eq!(vu32(1), [0x01]);
        assert_eq!(vu32(127), [0x7f]);
        assert_eq!(vu32(128), [0x80, 0x01]);
        assert_eq!(vu32(624_485), [0xe5, 0x8e, 0x26]);
        assert_eq!(vu32(16_256), [0x80, 0x7f]);
        assert_eq!(vu32(u32::MAX), [0xff, 0xff, 0xff, 0xff, 0x0f]);
        assert_eq!(
            vu64(u64::MAX),
            [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]
        );
    }

    #[test]
    fn unsigned_leb128_is_minimal() {
        // Values at the 7-bit group boundaries must not grow a spurious
        // continuation byte.
        for (value, len) in [(0u32, 1), (0x7f, 1), (0x80, 2), (0x3fff, 2), (0x4000, 3)] {
            assert_eq!(vu32(value).len(), len, "non-minimal encoding for {value}");
        }
        assert!(vu32(u32::MAX).len() == 5);
    }

    #[test]
    fn signed_leb128_known_values() {
        assert_eq!(vs32(0), [0x00]);
        assert_eq!(vs32(1), [0x01]);
        assert_eq!(vs32(-1), [0x7f]);
        assert_eq!(vs32(63), [0x3f]);
        assert_eq!(vs32(64), [0xc0, 0x00]);
        assert_eq!(vs32(-64), [0x40]);
        assert_eq!(vs32(-65), [0xbf, 0x7f]);
        assert_eq!(vs32(-128), [0x80, 0x7f]);
        assert_eq!(vs32(624_485), [0xe5, 0x8e, 0x26]);
        assert_eq!(vs32(-624_485), [0x9b, 0xf1, 0x59]);
        assert_eq!(vs32(i32::MIN), [0x80, 0x80, 0x80, 0x80, 0x78]);
        assert_eq!(vs64(i64::MIN), [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x7f]);
    }

    #[test]
    fn s33_covers_the_u32_index_range() {
        let mut buf = Vec::new();
        write_vs33(&mut buf, i64::from(u32::MAX));
        assert_eq!(buf, [0xff, 0xff, 0xff, 0xff, 0x0f]);

        // Small indices stay single-byte and distinct from value-type bytes,
        // which occupy the sign-extended range 0x40..=0x7f.
        let mut buf = Vec::new();
        write_vs33(&mut buf, 0);
        assert_eq!(buf, [0x00]);
    }

    #[test]
    fn floats_encode_little_endian() {
        let mut buf = Vec::new();
        write_f32(&mut buf, 6.283_185_5);
        assert_eq!(buf, [219, 15, 201, 64]);

        let mut buf = Vec::new();
        write_f64(&mut buf, std::f64::consts::TAU);
        assert_eq!(buf, [24, 45, 68, 84, 251, 33, 25, 64]);

        // Bit patterns survive exactly, NaN payload included.
        let mut buf = Vec::new();
        write_f64(&mut buf, f64::from_bits(0x7ff8_dead_beef_0001));
        assert_eq!(buf, 0x7ff8_dead_beef_0001u64.to_le_bytes());
    }

    #[test]
    fn names_are_length_prefixed_utf8() {
        let mut buf = Vec::new();
        write_name(&mut buf, "memory");
        assert_eq!(buf, [6, b'm', b'e', b'm', b'o', b'r', b'y']);

        let mut buf = Vec::new();
        write_name(&mut buf, "héllo");
        assert_eq!(buf[0], 6); // UTF-8 byte length, not char count
    }

    #[test]
    fn sections_are_id_plus_length_prefixed_payload() {
        let mut buf = Vec::new();
        write_section(&mut buf, SECTION_TYPE, &[0xAA, 0xBB]);
        assert_eq!(buf, [SECTION_TYPE, 2, 0xAA, 0xBB]);

        let mut buf = Vec::new();
        write_section(&mut buf, SECTION_CODE, &[0u8; 200]);
        assert_eq!(&buf[0..3], [SECTION_CODE, 0xc8, 0x01]);
        assert_eq!(buf.len(), 3 + 200);
    }

    #[test]
    fn append_does_not_disturb_existing_bytes() {
        let mut buf = vec![0xAA];
        write_vu32(&mut buf, 624_485);
        assert_eq!(buf, [0xAA, 0xe5, 0x8e, 0x26]);
    }
}
