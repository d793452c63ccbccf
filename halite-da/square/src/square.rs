use crate::{ensure_square_size, share::Share, Error};

/// Original `k x k` data square in row-major order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Square {
    size: usize,
    shares: Vec<Share>,
}

impl Square {
    pub fn new(size: usize, shares: Vec<Share>) -> Result<Self, Error> {
        ensure_square_size(size)?;
        let expected = size * size;
        if shares.len() != expected {
            return Err(Error::InvalidShareCount {
                square_size: size,
                expected,
                actual: shares.len(),
            });
        }
        Ok(Self { size, shares })
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    #[must_use]
    pub fn row(&self, index: usize) -> &[Share] {
        &self.shares[index * self.size..(index + 1) * self.size]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Share]> + '_ {
        self.shares.chunks(self.size)
    }
}
