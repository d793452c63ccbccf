use halite_core::consts::SHARE_SIZE;
use halite_da_square::{Share, Square};
use reed_solomon_erasure::galois_8::ReedSolomon;
use tracing::{debug, trace};

use crate::{
    eds::{ensure_width, ExtendedSquare},
    ErasureCoder, Error, LOG_TARGET,
};

/// Reed-Solomon over GF(2^8): every row and column holds `k` data shards and
/// `k` parity shards.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReedSolomonCoder;

type Line = Vec<Option<Vec<u8>>>;

fn encode_line(codec: &ReedSolomon, data: &[&Share]) -> Result<Vec<Share>, Error> {
    let mut shards: Vec<Vec<u8>> = Vec::with_capacity(data.len() * 2);
    for share in data {
        let bytes = share.as_ref();
        if bytes.len() != SHARE_SIZE {
            return Err(Error::InvalidShareSize(bytes.len()));
        }
        shards.push(bytes.to_vec());
    }
    shards.resize(data.len() * 2, vec![0; SHARE_SIZE]);
    codec.encode(&mut shards)?;
    Ok(shards
        .into_iter()
        .map(Share::new)
        .collect::<Result<_, _>>()?)
}

/// Reconstructs `line` in place if it has enough shards and is missing any.
fn repair_line(codec: &ReedSolomon, line: &mut Line) -> Result<bool, Error> {
    let present = line.iter().filter(|shard| shard.is_some()).count();
    if present == line.len() || present < codec.data_shard_count() {
        return Ok(false);
    }
    codec.reconstruct(line)?;
    Ok(true)
}

impl ErasureCoder for ReedSolomonCoder {
    fn extend(&self, square: &Square) -> Result<ExtendedSquare, Error> {
        let k = square.size();
        let width = 2 * k;
        let codec = ReedSolomon::new(k, k)?;

        let mut top = Vec::with_capacity(k * width);
        for row in square.rows() {
            let row: Vec<&Share> = row.iter().collect();
            top.extend(encode_line(&codec, &row)?);
        }

        let mut bottom = vec![Vec::with_capacity(width); k];
        for column in 0..width {
            let data: Vec<&Share> = top.iter().skip(column).step_by(width).collect();
            let extended = encode_line(&codec, &data)?;
            for (row, share) in bottom.iter_mut().zip(extended.into_iter().skip(k)) {
                row.push(share);
            }
        }

        top.extend(bottom.into_iter().flatten());
        trace!(target: LOG_TARGET, square_size = k, "square extended");
        ExtendedSquare::new(width, top)
    }

    fn repair(&self, width: usize, shares: Vec<Option<Share>>) -> Result<ExtendedSquare, Error> {
        ensure_width(width)?;
        if shares.len() != width * width {
            return Err(Error::InvalidShareCount {
                width,
                expected: width * width,
                actual: shares.len(),
            });
        }
        let k = width / 2;
        let codec = ReedSolomon::new(k, k)?;
        let mut grid: Line = shares
            .into_iter()
            .map(|share| share.map(|share| share.as_ref().to_vec()))
            .collect();
        if let Some(len) = grid
            .iter()
            .flatten()
            .map(Vec::len)
            .find(|len| *len != SHARE_SIZE)
        {
            return Err(Error::InvalidShareSize(len));
        }

        let mut rounds = 0;
        while grid.iter().any(Option::is_none) {
            rounds += 1;
            let mut progress = false;
            for row in 0..width {
                let mut line: Line = grid[row * width..(row + 1) * width].to_vec();
                if repair_line(&codec, &mut line)? {
                    grid[row * width..(row + 1) * width].clone_from_slice(&line);
                    progress = true;
                }
            }
            for column in 0..width {
                let mut line: Line = grid.iter().skip(column).step_by(width).cloned().collect();
                if repair_line(&codec, &mut line)? {
                    for (row, shard) in line.into_iter().enumerate() {
                        grid[row * width + column] = shard;
                    }
                    progress = true;
                }
            }
            if !progress {
                debug!(
                    target: LOG_TARGET,
                    width,
                    missing = grid.iter().filter(|shard| shard.is_none()).count(),
                    "repair stalled"
                );
                return Err(Error::Unrecoverable);
            }
        }
        trace!(target: LOG_TARGET, width, rounds, "extended square repaired");

        let shares = grid
            .into_iter()
            .flatten()
            .map(Share::new)
            .collect::<Result<Vec<_>, _>>()?;
        let repaired = ExtendedSquare::new(width, shares)?;
        if self.extend(&repaired.original_square()?)? != repaired {
            return Err(Error::Inconsistent);
        }
        Ok(repaired)
    }
}
