//! QK-mer: up to 32 IUPAC ambiguity codes packed into two 64-bit masks.

use std::fmt;
use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{KmerError, Result};
use crate::kmer::{Kmer, MAX_K};

/// IUPAC code -> 4-bit nibble (bit order A,C,G,T from MSB to LSB), or
/// `None` for anything outside the 15-letter ambiguity alphabet.
#[inline]
fn char_to_nibble(c: u8) -> Option<u8> {
    match c {
        b'A' | b'a' => Some(0b1000),
        b'C' | b'c' => Some(0b0100),
        b'G' | b'g' => Some(0b0010),
        b'T' | b't' => Some(0b0001),
        b'W' | b'w' => Some(0b1001),
        b'S' | b's' => Some(0b0110),
        b'M' | b'm' => Some(0b1100),
        b'K' | b'k' => Some(0b0011),
        b'R' | b'r' => Some(0b1010),
        b'Y' | b'y' => Some(0b0101),
        b'B' | b'b' => Some(0b0111),
        b'D' | b'd' => Some(0b1011),
        b'H' | b'h' => Some(0b1101),
        b'V' | b'v' => Some(0b1110),
        b'N' | b'n' => Some(0b1111),
        _ => None,
    }
}

/// 4-bit nibble -> uppercase IUPAC letter. `nibble` must be one of the 15
/// non-zero codes above.
fn nibble_to_char(nibble: u8) -> u8 {
    match nibble {
        0b1000 => b'A',
        0b0100 => b'C',
        0b0010 => b'G',
        0b0001 => b'T',
        0b1001 => b'W',
        0b0110 => b'S',
        0b1100 => b'M',
        0b0011 => b'K',
        0b1010 => b'R',
        0b0101 => b'Y',
        0b0111 => b'B',
        0b1011 => b'D',
        0b1101 => b'H',
        0b1110 => b'V',
        0b1111 => b'N',
        _ => unreachable!("invalid IUPAC nibble {:#06b}", nibble),
    }
}

/// The one-hot nibble for a Σ₄ 2-bit code: A->1000, C->0100, G->0010,
/// T->0001. Used to lift a plain K-mer symbol into QK-mer containment
/// masks. A bit-twiddling form (isolating the A/C/G/T bit-pairs via
/// 0x3333.../0xCCCC.../0x5555.../0xAAAA... masks) is equivalent to this
/// 4-entry table; the table is what the original `qkmer.c` actually uses
/// and is clearer to read.
#[inline]
fn code_to_nibble(code: u8) -> u8 {
    0b1000u8 >> (code & 0b11)
}

/// A QK-mer: `ac`/`gt` each pack `k` 2-bit masks, one per symbol position,
/// such that `(ac_pair << 2) | gt_pair` is that symbol's IUPAC nibble.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct QKmer {
    ac: u64,
    gt: u64,
    k: u8,
}

impl QKmer {
    pub fn parse(s: &str) -> Result<Self> {
        let len = s.len();
        if len == 0 || len > MAX_K as usize {
            return Err(KmerError::LengthOutOfRange(len));
        }
        let mut ac: u64 = 0;
        let mut gt: u64 = 0;
        for &b in s.as_bytes() {
            let nibble = char_to_nibble(b).ok_or(KmerError::InvalidSymbol(b))?;
            ac = (ac << 2) | ((nibble >> 2) as u64 & 0b11);
            gt = (gt << 2) | (nibble as u64 & 0b11);
        }
        Ok(QKmer {
            ac,
            gt,
            k: len as u8,
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.k as usize);
        for i in 0..self.k {
            let shift = 2 * (self.k - i - 1) as u32;
            let ac_pair = (self.ac >> shift) & 0b11;
            let gt_pair = (self.gt >> shift) & 0b11;
            let nibble = ((ac_pair << 2) | gt_pair) as u8;
            out.push(nibble_to_char(nibble) as char);
        }
        out
    }

    pub fn ac(&self) -> u64 {
        self.ac
    }

    pub fn gt(&self) -> u64 {
        self.gt
    }

    pub fn k(&self) -> u8 {
        self.k
    }

    /// `first_k(self, j)`: the leading `j` IUPAC codes. Precondition
    /// `j <= k`, mirroring `Kmer::first_k`.
    pub fn first_k(&self, j: u8) -> Result<Self> {
        if j > self.k {
            return Err(KmerError::PrefixTooLong { j, k: self.k });
        }
        if j == 0 {
            return Ok(QKmer { ac: 0, gt: 0, k: 0 });
        }
        let shift = 2 * (self.k - j) as u32;
        Ok(QKmer {
            ac: self.ac >> shift,
            gt: self.gt >> shift,
            k: j,
        })
    }

    /// `QK ⊇ m`: does this QK-mer accept `m`, requiring equal length?
    /// Kept distinct on purpose from [`QKmer::contains_prefix`], which
    /// truncates both operands to a shared length first — the two checks
    /// answer different questions and should not be unified into one.
    pub fn contains_equal_length(&self, m: &Kmer) -> bool {
        if self.k != m.k() {
            return false;
        }
        let (m_ac, m_gt) = kmer_to_masks(m);
        (m_ac & self.ac) == m_ac && (m_gt & self.gt) == m_gt
    }

    /// `QK ⊇ₙ m`: the length-truncated containment used during an
    /// `inner_consistent` descent, where the reconstructed value and the
    /// node prefix may be shorter than the full query.
    pub fn contains_prefix(&self, m: &Kmer, n: u8) -> Result<bool> {
        let q = self.first_k(n)?;
        let m = m.first_k(n)?;
        Ok(q.contains_equal_length(&m))
    }

    /// Mask intersection of two equal-length QK-mers (`qkmer_and` in the
    /// original `qkmer.c`). `None` if the lengths differ.
    pub fn intersect(&self, other: &QKmer) -> Option<QKmer> {
        if self.k != other.k {
            return None;
        }
        Some(QKmer {
            ac: self.ac & other.ac,
            gt: self.gt & other.gt,
            k: self.k,
        })
    }

    /// Mask union of two equal-length QK-mers (`qkmer_or` in the original
    /// `qkmer.c`). `None` if the lengths differ.
    pub fn union(&self, other: &QKmer) -> Option<QKmer> {
        if self.k != other.k {
            return None;
        }
        Some(QKmer {
            ac: self.ac | other.ac,
            gt: self.gt | other.gt,
            k: self.k,
        })
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u64::<BigEndian>(self.ac)?;
        w.write_u64::<BigEndian>(self.gt)?;
        w.write_u8(self.k)
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let ac = r.read_u64::<BigEndian>()?;
        let gt = r.read_u64::<BigEndian>()?;
        let k = r.read_u8()?;
        if k == 0 || k > MAX_K {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                KmerError::LengthOutOfRange(k as usize),
            ));
        }
        Ok(QKmer { ac, gt, k })
    }
}

/// Build the (ac, gt) one-hot mask pair for a plain K-mer: the containment
/// mask it would need to be accepted by an identical QK-mer.
fn kmer_to_masks(m: &Kmer) -> (u64, u64) {
    let mut ac: u64 = 0;
    let mut gt: u64 = 0;
    for i in 0..m.k() {
        let nibble = code_to_nibble(m.symbol_at(i));
        ac = (ac << 2) | ((nibble >> 2) as u64 & 0b11);
        gt = (gt << 2) | (nibble as u64 & 0b11);
    }
    (ac, gt)
}

impl fmt::Debug for QKmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QKmer({}, k={})", self.render(), self.k)
    }
}

impl fmt::Display for QKmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_render_round_trip() {
        let q = QKmer::parse("ANGT").unwrap();
        assert_eq!(q.render(), "ANGT");
        assert_eq!(q.k(), 4);
    }

    #[test]
    fn parse_rejects_invalid_code() {
        assert!(matches!(
            QKmer::parse("AXGT"),
            Err(KmerError::InvalidSymbol(b'X'))
        ));
    }

    #[test]
    fn contains_equal_length_rejects_mismatched_symbol() {
        let q = QKmer::parse("ANGT").unwrap();
        assert!(q.contains_equal_length(&Kmer::parse("ACGT").unwrap()));
        assert!(!q.contains_equal_length(&Kmer::parse("ATGG").unwrap()));
    }

    #[test]
    fn every_kmer_is_contained_by_its_own_qkmer() {
        for s in ["A", "ACGT", "TTTTACGTACGT"] {
            let m = Kmer::parse(s).unwrap();
            let nibbles: String = s
                .chars()
                .map(|c| match c {
                    'A' => 'A',
                    'C' => 'C',
                    'G' => 'G',
                    _ => 'T',
                })
                .collect();
            let q = QKmer::parse(&nibbles).unwrap();
            assert!(q.contains_equal_length(&m));
        }
    }

    #[test]
    fn all_n_accepts_every_kmer_of_that_length() {
        let q = QKmer::parse("NNNN").unwrap();
        for s in ["AAAA", "ACGT", "TTTT", "GCTA"] {
            assert!(q.contains_equal_length(&Kmer::parse(s).unwrap()));
        }
    }

    #[test]
    fn contains_requires_equal_length() {
        let q = QKmer::parse("ANG").unwrap();
        let m = Kmer::parse("ACGT").unwrap();
        assert!(!q.contains_equal_length(&m));
    }

    #[test]
    fn intersect_and_union_require_equal_length() {
        let a = QKmer::parse("ANGT").unwrap();
        let b = QKmer::parse("ANG").unwrap();
        assert!(a.intersect(&b).is_none());
        assert!(a.union(&b).is_none());

        let c = QKmer::parse("NNNN").unwrap();
        let intersected = a.intersect(&c).unwrap();
        assert_eq!(intersected.render(), "ANGT");
    }

    #[test]
    fn wire_round_trip() {
        let q = QKmer::parse("ANGTRYSW").unwrap();
        let mut buf = Vec::new();
        q.write_to(&mut buf).unwrap();
        let back = QKmer::read_from(&mut &buf[..]).unwrap();
        assert_eq!(q, back);
    }
}
