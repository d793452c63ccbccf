use halite_core::consts::{is_supported_square_size, SHARE_SIZE};
use halite_da_square::{Share, Square};

use crate::Error;

/// `2k x 2k` erasure coded square in row-major order.
///
/// Quadrants: original data top-left, row parity top-right, column parity
/// bottom-left and parity of parity bottom-right.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExtendedSquare {
    width: usize,
    shares: Vec<Share>,
}

pub(crate) fn ensure_width(width: usize) -> Result<(), Error> {
    if width % 2 == 0 && is_supported_square_size(width / 2) {
        Ok(())
    } else {
        Err(Error::InvalidWidth(width))
    }
}

impl ExtendedSquare {
    pub fn new(width: usize, shares: Vec<Share>) -> Result<Self, Error> {
        ensure_width(width)?;
        let expected = width * width;
        if shares.len() != expected {
            return Err(Error::InvalidShareCount {
                width,
                expected,
                actual: shares.len(),
            });
        }
        if let Some(share) = shares.iter().find(|share| share.as_ref().len() != SHARE_SIZE) {
            return Err(Error::InvalidShareSize(share.as_ref().len()));
        }
        Ok(Self { width, shares })
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn original_width(&self) -> usize {
        self.width / 2
    }

    #[must_use]
    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    #[must_use]
    pub fn share(&self, row: usize, column: usize) -> &Share {
        &self.shares[row * self.width + column]
    }

    #[must_use]
    pub fn row(&self, index: usize) -> &[Share] {
        &self.shares[index * self.width..(index + 1) * self.width]
    }

    #[must_use]
    pub fn column(&self, index: usize) -> Vec<&Share> {
        self.shares.iter().skip(index).step_by(self.width).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Share]> + '_ {
        self.shares.chunks(self.width)
    }

    pub fn columns(&self) -> impl Iterator<Item = Vec<&Share>> + '_ {
        (0..self.width).map(|index| self.column(index))
    }

    /// Top-left quadrant as the square it was extended from.
    pub fn original_square(&self) -> Result<Square, Error> {
        let k = self.original_width();
        let shares = self
            .rows()
            .take(k)
            .flat_map(|row| row[..k].iter().cloned())
            .collect();
        Ok(Square::new(k, shares)?)
    }
}
