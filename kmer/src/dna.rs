//! Variable-length packed DNA: `length_tag` (1..=4, valid symbols in the
//! final byte) plus packed data bytes, 4 symbols per byte MSB-first.

use std::fmt;
use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{KmerError, Result};
use crate::kmer::Kmer;
use crate::symbol::{code_to_char, try_char_to_code};

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Dna {
    length_tag: u8,
    bytes: Vec<u8>,
}

impl Dna {
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(KmerError::EmptyDna);
        }
        let bytes_ascii = s.as_bytes();
        let n_bytes = bytes_ascii.len().div_ceil(4);
        let mut bytes = Vec::with_capacity(n_bytes);
        let mut chunk_iter = bytes_ascii.chunks(4);
        for chunk in &mut chunk_iter {
            let mut byte = 0u8;
            for &c in chunk {
                let code = try_char_to_code(c)?;
                byte = (byte << 2) | code;
            }
            // Left-shift a short final chunk so valid pairs occupy the top
            // bits: each missing symbol is one fewer 2-bit shift already
            // applied above, so pad with the same shift count here.
            byte <<= 2 * (4 - chunk.len());
            bytes.push(byte);
        }
        let rem = bytes_ascii.len() % 4;
        let length_tag = if rem == 0 { 4 } else { rem as u8 };
        Ok(Dna { length_tag, bytes })
    }

    /// True symbol count: `(byte_count) * 4 - (4 - length_tag)`.
    pub fn len(&self) -> usize {
        self.bytes.len() * 4 - (4 - self.length_tag as usize)
    }

    pub fn is_empty(&self) -> bool {
        // Invariant (iii): length > 0 always holds for a constructed Dna.
        self.len() == 0
    }

    pub fn length_tag(&self) -> u8 {
        self.length_tag
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn render(&self) -> String {
        let len = self.len();
        let mut out = String::with_capacity(len);
        let mut emitted = 0usize;
        for &byte in &self.bytes {
            for shift in [6u32, 4, 2, 0] {
                if emitted == len {
                    break;
                }
                let code = (byte >> shift) & 0b11;
                out.push(code_to_char(code) as char);
                emitted += 1;
            }
        }
        out
    }

    /// The 2-bit code at symbol offset `i` (0-indexed), `i < self.len()`.
    #[inline]
    fn symbol_at(&self, i: usize) -> u8 {
        debug_assert!(i < self.len());
        let byte = self.bytes[i / 4];
        let shift = 6 - 2 * (i % 4) as u32;
        (byte >> shift) & 0b11
    }

    /// A `len`-symbol substring starting at `start`, as a `Kmer`. Grounded
    /// directly in the original `dna.c`'s `dna_substr`/`dna_length` pair and
    /// reused by the K-mer stream's window extraction.
    pub fn substr(&self, start: usize, len: u8) -> Result<Kmer> {
        if len == 0 || len as usize > self.len() - start {
            return Err(KmerError::LengthOutOfRange(len as usize));
        }
        let mut value: u64 = 0;
        for i in start..start + len as usize {
            value = (value << 2) | self.symbol_at(i) as u64;
        }
        Kmer::from_raw(value, len)
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let total_len = 1 + self.bytes.len();
        w.write_u32::<BigEndian>(total_len as u32)?;
        w.write_u8(self.length_tag)?;
        w.write_all(&self.bytes)
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let total_len = r.read_u32::<BigEndian>()? as usize;
        if total_len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                KmerError::EmptyDna,
            ));
        }
        let length_tag = r.read_u8()?;
        if length_tag == 0 || length_tag > 4 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                KmerError::LengthOutOfRange(length_tag as usize),
            ));
        }
        let mut bytes = vec![0u8; total_len - 1];
        r.read_exact(&mut bytes)?;
        Ok(Dna { length_tag, bytes })
    }
}

impl fmt::Debug for Dna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dna({}, len={})", self.render(), self.len())
    }
}

impl fmt::Display for Dna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(Dna::parse(""), Err(KmerError::EmptyDna));
    }

    #[test]
    fn render_round_trips_arbitrary_length() {
        for s in ["A", "ACGT", "ACGTA", "ACGTAC", "ACGTACG", "ACGTACGTACGTA"] {
            let dna = Dna::parse(s).unwrap();
            assert_eq!(dna.render(), s);
            assert_eq!(dna.len(), s.len());
        }
    }

    #[test]
    fn render_is_uppercase_for_lowercase_input() {
        let dna = Dna::parse("acgtac").unwrap();
        assert_eq!(dna.render(), "ACGTAC");
    }

    #[test]
    fn packs_seven_symbols_with_tail_tag() {
        let dna = Dna::parse("ACGTACG").unwrap();
        assert_eq!(dna.length_tag(), 3);
        assert_eq!(dna.bytes(), &[0b00_01_10_11, 0b00_01_10_00]);
        assert_eq!(dna.len(), 7);
        assert_eq!(dna.render(), "ACGTACG");
    }

    #[test]
    fn substr_extracts_kmer() {
        let dna = Dna::parse("ACGTACG").unwrap();
        let m = dna.substr(1, 3).unwrap();
        assert_eq!(m.render(), "CGT");
    }

    #[test]
    fn wire_round_trip() {
        let dna = Dna::parse("ACGTACG").unwrap();
        let mut buf = Vec::new();
        dna.write_to(&mut buf).unwrap();
        let back = Dna::read_from(&mut &buf[..]).unwrap();
        assert_eq!(dna, back);
    }
}
