//! Binary wire format for everything the proposer places in a block.
//!
//! Fixed-width little-endian integers, trailing bytes rejected and a hard
//! decode limit: transactions come straight from untrusted proposals.
use bincode::Options as _;
use serde::{de::DeserializeOwned, Serialize};

use crate::consts::MAX_TX_SIZE;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("Wire codec failure: {0}")]
pub struct Error(#[from] bincode::Error);

fn options() -> impl bincode::Options {
    bincode::DefaultOptions::new()
        .with_little_endian()
        .with_fixint_encoding()
        .with_limit(MAX_TX_SIZE)
        .reject_trailing_bytes()
}

pub fn serialize<T: Serialize + ?Sized>(item: &T) -> Result<Vec<u8>> {
    Ok(options().serialize(item)?)
}

pub fn deserialize<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    Ok(options().deserialize(data)?)
}
