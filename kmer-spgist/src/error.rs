use std::fmt;

use kmer::KmerError;

/// Errors raised by the SPT operators, layered over [`kmer::KmerError`] the
/// same way `kr2r`'s error types wrap lower-level I/O errors by hand rather
/// than reaching for `thiserror`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpgError {
    /// A scan key carried a strategy number outside {1, 2, 3}.
    UnknownStrategy,
    /// Combining a reconstructed value with a leaf datum (or a child
    /// symbol) would exceed 32 symbols — an internal invariant violation,
    /// not a reachable user input.
    LevelOverflow,
    /// A codec/algebra failure propagated up from the `kmer` crate.
    Kmer(KmerError),
}

impl fmt::Display for SpgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpgError::UnknownStrategy => write!(f, "scan key strategy is not in {{1, 2, 3}}"),
            SpgError::LevelOverflow => {
                write!(f, "level + leaf length exceeds the 32-symbol k-mer limit")
            }
            SpgError::Kmer(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SpgError {}

impl From<KmerError> for SpgError {
    fn from(e: KmerError) -> Self {
        match e {
            KmerError::LengthOutOfRange(_) => SpgError::LevelOverflow,
            other => SpgError::Kmer(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SpgError>;
