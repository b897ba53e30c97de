//! Σ₄ symbol <-> 2-bit code conversions, the DNA/K-mer half of the codec.
//!
//! Mirrors `seqkmer::feat::char_to_value` but keeps the four-symbol DNA
//! alphabet only (this crate has no protein feature split).

use crate::error::{KmerError, Result};

pub const BITS_PER_SYMBOL: u32 = 2;

/// A/C/G/T -> 2-bit code, case-insensitive. `None` for anything else.
#[inline]
pub fn char_to_code(c: u8) -> Option<u8> {
    match c {
        b'A' | b'a' => Some(0b00),
        b'C' | b'c' => Some(0b01),
        b'G' | b'g' => Some(0b10),
        b'T' | b't' => Some(0b11),
        _ => None,
    }
}

#[inline]
pub fn try_char_to_code(c: u8) -> Result<u8> {
    char_to_code(c).ok_or(KmerError::InvalidSymbol(c))
}

/// 2-bit code -> uppercase A/C/G/T.
#[inline]
pub fn code_to_char(code: u8) -> u8 {
    match code & 0b11 {
        0b00 => b'A',
        0b01 => b'C',
        0b10 => b'G',
        _ => b'T',
    }
}
