//! Packed DNA, K-mer and QK-mer value types, and the K-mer algebra that
//! drives a space-partitioned radix trie (SP-GiST style) index.
//!
//! This crate is the pure, side-effect-free core: codec, value types, and
//! algebra only. It has no knowledge of any index or host — see the
//! sibling `kmer-spgist` crate for the trie operators built on top of it.

mod dna;
mod error;
mod hash;
mod kmer;
mod qkmer;
mod stream;
mod symbol;

pub use dna::Dna;
pub use error::{KmerError, Result};
pub use kmer::{common_prefix_len, compare_first_n, Kmer, MAX_K};
pub use qkmer::QKmer;
pub use stream::DnaKmerStream;
