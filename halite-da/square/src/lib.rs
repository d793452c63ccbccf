pub mod commitment;
pub mod layout;
pub mod parse;
pub mod share;
pub mod split;
pub mod square;
pub mod writer;

pub use commitment::{create_commitment, message_commitment};
pub use parse::parse_square;
pub use share::Share;
pub use square::Square;
pub use writer::{SquareWriter, WrittenSquare};

use halite_core::message;

pub(crate) const LOG_TARGET: &str = "halite::da::square";

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SquareSizeError {
    #[error("not a supported power of two")]
    Unsupported,
    #[error("message needs {shares} shares but at most {capacity} fit")]
    TooSmall { shares: usize, capacity: usize },
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid square size {square_size}: {reason}")]
    InvalidSquareSize {
        square_size: usize,
        reason: SquareSizeError,
    },
    #[error("Invalid share size {0}")]
    InvalidShareSize(usize),
    #[error("Square of size {square_size} needs {expected} shares, got {actual}")]
    InvalidShareCount {
        square_size: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Mandatory content needs {required} shares, square holds {capacity}")]
    SquareOverflow { required: usize, capacity: usize },
    #[error("Malformed share at index {index}: {reason}")]
    MalformedShare { index: usize, reason: &'static str },
    #[error(transparent)]
    Message(#[from] message::Error),
}

pub(crate) fn ensure_square_size(square_size: usize) -> Result<(), Error> {
    if halite_core::consts::is_supported_square_size(square_size) {
        Ok(())
    } else {
        Err(Error::InvalidSquareSize {
            square_size,
            reason: SquareSizeError::Unsupported,
        })
    }
}
