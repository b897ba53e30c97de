//! Fixed-length K-mer: up to 32 symbols over Σ₄ packed left-aligned into a
//! 64-bit word.

use std::cmp::Ordering;
use std::fmt;
use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{KmerError, Result};
use crate::hash::{fmix64, fold_to_u32};
use crate::symbol::{code_to_char, try_char_to_code};

pub const MAX_K: u8 = 32;

/// A K-mer: `value` packs `k` 2-bit symbols left-aligned (symbol 0 occupies
/// the highest live bit pair). Bits above `2*k` are always zero.
#[derive(Clone, Copy, Eq, Hash)]
pub struct Kmer {
    value: u64,
    k: u8,
}

impl Kmer {
    /// The empty K-mer (`k = 0`). Not producible by `parse`/`from_raw` —
    /// text and wire forms always carry at least one symbol — but a valid
    /// algebra intermediate: `last_k(m, 0)`, the leaf datum of a tuple that
    /// terminates exactly at a node's prefix, and the root's "nothing
    /// reconstructed yet" value all use it.
    pub fn empty() -> Self {
        Kmer { value: 0, k: 0 }
    }

    /// Build a K-mer from a raw packed value and length, masking off any
    /// high bits above `2*k` so the invariant `value < 2^(2k)` always holds.
    pub fn from_raw(value: u64, k: u8) -> Result<Self> {
        if k == 0 || k > MAX_K {
            return Err(KmerError::LengthOutOfRange(k as usize));
        }
        let mask = mask_for(k);
        Ok(Kmer {
            value: value & mask,
            k,
        })
    }

    /// Parse a string of 1..=32 Σ₄ characters (case-insensitive).
    pub fn parse(s: &str) -> Result<Self> {
        let len = s.len();
        if len == 0 || len > MAX_K as usize {
            return Err(KmerError::LengthOutOfRange(len));
        }
        let mut value: u64 = 0;
        for &b in s.as_bytes() {
            let code = try_char_to_code(b)?;
            value = (value << 2) | code as u64;
        }
        Ok(Kmer {
            value,
            k: len as u8,
        })
    }

    /// Render back to uppercase text.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.k as usize);
        for i in 0..self.k {
            out.push(code_to_char(self.symbol_at(i)) as char);
        }
        out
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn k(&self) -> u8 {
        self.k
    }

    /// The 2-bit code of the `i`-th symbol (0-indexed from the start).
    /// Panics if `i >= k`: this is an internal bounds error, not a user
    /// input that can be malformed by parsing.
    #[inline]
    pub fn symbol_at(&self, i: u8) -> u8 {
        debug_assert!(i < self.k, "symbol index {} out of bounds for k={}", i, self.k);
        ((self.value >> (2 * (self.k - i - 1) as u32)) & 0b11) as u8
    }

    /// `first_k(self, j)`: the leading `j` symbols. Precondition `j <= k`.
    pub fn first_k(&self, j: u8) -> Result<Self> {
        if j > self.k {
            return Err(KmerError::PrefixTooLong { j, k: self.k });
        }
        if j == 0 {
            return Ok(Kmer { value: 0, k: 0 });
        }
        let value = self.value >> (2 * (self.k - j) as u32);
        Ok(Kmer { value, k: j })
    }

    /// `last_k(self, j)`: the trailing `j` symbols. `j == 0` yields the
    /// empty K-mer.
    pub fn last_k(&self, j: u8) -> Self {
        if j == 0 {
            return Kmer { value: 0, k: 0 };
        }
        let value = self.value & mask_for(j.min(self.k));
        Kmer {
            value,
            k: j.min(self.k),
        }
    }

    /// Append `suffix` after `self`, producing a K-mer of length
    /// `self.k + suffix.k`. Used by the SPT operators to rebuild a
    /// reconstructed value from a path prefix plus a child symbol or leaf
    /// datum. Errors if the combined length would exceed 32: level + leaf
    /// length must stay within the fixed 64-bit packed word.
    pub fn concat(&self, suffix: &Kmer) -> Result<Self> {
        let total_k = self
            .k
            .checked_add(suffix.k)
            .filter(|k| *k <= MAX_K)
            .ok_or(KmerError::LengthOutOfRange((self.k as usize) + (suffix.k as usize)))?;
        if total_k == 0 {
            return Ok(Kmer { value: 0, k: 0 });
        }
        let value = (self.value << (2 * suffix.k as u32)) | suffix.value;
        Ok(Kmer { value, k: total_k })
    }

    /// `startswith(self, p)`: does `self` begin with `p`?
    pub fn startswith(&self, p: &Kmer) -> bool {
        if self.k < p.k {
            return false;
        }
        (self.value >> (2 * (self.k - p.k) as u32)) == p.value
    }

    /// A 32-bit mix of the rotated packed value. The rotation degenerates
    /// at k=32 (shift-by-64 is undefined in Rust), so that width is
    /// special-cased to leave the value unrotated.
    pub fn hash(&self) -> u32 {
        let shift = 2 * self.k as u32;
        let rotated = if shift >= 64 {
            self.value
        } else {
            (self.value << shift) ^ (self.value >> (64 - shift))
        };
        fold_to_u32(fmix64(rotated))
    }

    /// Big-endian wire form: 8-byte `value`, 1-byte `k`.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u64::<BigEndian>(self.value)?;
        w.write_u8(self.k)
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let value = r.read_u64::<BigEndian>()?;
        let k = r.read_u8()?;
        Kmer::from_raw(value, k).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[inline]
fn mask_for(k: u8) -> u64 {
    if k == 0 {
        0
    } else if k >= 32 {
        u64::MAX
    } else {
        (1u64 << (2 * k as u32)) - 1
    }
}

/// `common_prefix_len(a, b)`: the number of leading symbols `a` and `b`
/// share, in `[0, min(a.k, b.k)]`.
pub fn common_prefix_len(a: &Kmer, b: &Kmer) -> u8 {
    let n = a.k.min(b.k);
    if n == 0 {
        return 0;
    }
    // first_k never fails here: n <= both lengths by construction.
    let av = a.first_k(n).expect("n <= a.k").value;
    let bv = b.first_k(n).expect("n <= b.k").value;
    let xor = av ^ bv;
    if xor == 0 {
        return n;
    }
    let top_bit = 63 - xor.leading_zeros();
    let pair_from_lsb = top_bit / 2;
    n - 1 - pair_from_lsb as u8
}

/// `compare_first_n(a, b, n)`: lexicographic order of the leading `n`
/// symbols. Precondition `n <= min(a.k, b.k)`.
pub fn compare_first_n(a: &Kmer, b: &Kmer, n: u8) -> Result<Ordering> {
    let av = a.first_k(n)?;
    let bv = b.first_k(n)?;
    Ok(av.value.cmp(&bv.value))
}

impl PartialEq for Kmer {
    fn eq(&self, other: &Self) -> bool {
        self.k == other.k && self.value == other.value
    }
}

/// Ordering over a shared prefix only: two K-mers of different length are
/// ordered by their first `min(a.k, b.k)` symbols, then by length as a
/// tiebreak. This is *not* a claim about lexicographic order beyond the
/// shared prefix — the original `compare_kmers` truncates both operands to
/// `n` symbols before comparing, so anything past the shorter K-mer's length
/// is invisible to the comparison. Any total order an index driver needs
/// beyond this must come from the driver, not from this `Ord` impl.
impl PartialOrd for Kmer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Kmer {
    fn cmp(&self, other: &Self) -> Ordering {
        let n = self.k.min(other.k);
        match compare_first_n(self, other, n).expect("n <= both lengths") {
            Ordering::Equal => self.k.cmp(&other.k),
            ord => ord,
        }
    }
}

impl fmt::Debug for Kmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kmer({}, k={})", self.render(), self.k)
    }
}

impl fmt::Display for Kmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
