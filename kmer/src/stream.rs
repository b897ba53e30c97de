//! Lazy, non-restartable sliding window of K-mers over a [`Dna`] value.
//! Modeled as an iterator carrying explicit cursor state (byte index is
//! implicit in the symbol offset) the way `kr2r::mmscanner::Cursor` drives a
//! sliding window over raw sequence bytes, rather than via any coroutine
//! mechanism.

use crate::dna::Dna;
use crate::error::{KmerError, Result};
use crate::kmer::Kmer;

/// A forward-only stream of overlapping K-mers, step 1, emitting
/// `len - k + 1` items in order. Construction rejects `k == 0` or `k > 32`;
/// a DNA value shorter than `k` yields an empty, not-an-error stream.
pub struct DnaKmerStream<'a> {
    dna: &'a Dna,
    k: u8,
    /// Symbol offset of the next window's first symbol.
    next_start: usize,
    remaining: usize,
}

impl<'a> DnaKmerStream<'a> {
    pub fn new(dna: &'a Dna, k: u8) -> Result<Self> {
        if k == 0 || k > 32 {
            return Err(KmerError::KmerStreamK(k as usize));
        }
        let len = dna.len();
        let remaining = len.saturating_sub(k as usize - 1);
        Ok(DnaKmerStream {
            dna,
            k,
            next_start: 0,
            remaining,
        })
    }
}

impl<'a> Iterator for DnaKmerStream<'a> {
    type Item = Kmer;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let m = self
            .dna
            .substr(self.next_start, self.k)
            .expect("window stays within dna bounds by construction");
        self.next_start += 1;
        self.remaining -= 1;
        Some(m)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for DnaKmerStream<'_> {}
