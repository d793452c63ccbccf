pub mod dah;
pub mod eds;
pub mod rs;

pub use dah::DataAvailabilityHeader;
pub use eds::ExtendedSquare;
use halite_da_square::{Share, Square};
pub use rs::ReedSolomonCoder;

pub(crate) const LOG_TARGET: &str = "halite::da::erasure";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid share size {0}")]
    InvalidShareSize(usize),
    #[error("Invalid extended square width {0}")]
    InvalidWidth(usize),
    #[error("Extended square of width {width} needs {expected} shares, got {actual}")]
    InvalidShareCount {
        width: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Erasure coding failed: {0}")]
    Codec(#[from] reed_solomon_erasure::Error),
    #[error("Not enough shares to recover the extended square")]
    Unrecoverable,
    #[error("Recovered shares do not form a valid extension")]
    Inconsistent,
    #[error(transparent)]
    Square(#[from] halite_da_square::Error),
}

/// Systematic extension of a `k x k` square into a `2k x 2k` one.
///
/// The original square stays in the top-left quadrant and any `k` shares of a
/// row or column are enough to recover the whole line.
pub trait ErasureCoder {
    fn extend(&self, square: &Square) -> Result<ExtendedSquare, Error>;

    /// Rebuilds an extended square of `width` from the shares that are still
    /// available, in row-major order.
    fn repair(&self, width: usize, shares: Vec<Option<Share>>) -> Result<ExtendedSquare, Error>;
}
