use halite_core::{block::DataHash, utils::merkle::MerkleRootBuilder, Hash};
use halite_da_square::Share;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{eds::ExtendedSquare, LOG_TARGET};

/// Row and column roots of an extended square plus the root over both.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DataAvailabilityHeader {
    row_roots: Vec<Hash>,
    column_roots: Vec<Hash>,
    hash: Hash,
}

fn line_roots<Line, Leaf, M>(lines: &[Line], merkle: &M) -> Vec<Hash>
where
    Line: AsRef<[Leaf]> + Sync,
    Leaf: AsRef<[u8]>,
    M: MerkleRootBuilder + Sync,
{
    #[cfg(feature = "parallel")]
    {
        lines
            .par_iter()
            .map(|line| merkle.root(line.as_ref()))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        lines.iter().map(|line| merkle.root(line.as_ref())).collect()
    }
}

impl DataAvailabilityHeader {
    pub fn build<M>(eds: &ExtendedSquare, merkle: &M) -> Self
    where
        M: MerkleRootBuilder + Sync,
    {
        let rows: Vec<&[Share]> = eds.rows().collect();
        let columns: Vec<Vec<&Share>> = eds.columns().collect();
        let row_roots = line_roots(&rows, merkle);
        let column_roots = line_roots(&columns, merkle);
        let roots = [row_roots.as_slice(), column_roots.as_slice()].concat();
        let hash = merkle.root(roots.as_slice());
        trace!(
            target: LOG_TARGET,
            width = eds.width(),
            hash = %DataHash(hash),
            "data availability header built"
        );
        Self {
            row_roots,
            column_roots,
            hash,
        }
    }

    #[must_use]
    pub fn row_roots(&self) -> &[Hash] {
        &self.row_roots
    }

    #[must_use]
    pub fn column_roots(&self) -> &[Hash] {
        &self.column_roots
    }

    /// Width of the extended square the header commits to.
    #[must_use]
    pub fn square_width(&self) -> usize {
        self.row_roots.len()
    }

    #[must_use]
    pub const fn hash(&self) -> DataHash {
        DataHash(self.hash)
    }
}
