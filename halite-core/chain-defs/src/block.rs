use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{message::Message, utils::display_hex_bytes_newtype, Hash};

/// Block contents as handed over by the consensus engine.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockData {
    /// Width `k` of the original square, a power of two.
    pub square_size: usize,
    /// Raw transactions in block order; may contain undecodable bytes.
    pub transactions: Vec<Bytes>,
    pub messages: Vec<Message>,
}

/// Root of the data availability header a proposal commits to.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DataHash(pub Hash);

display_hex_bytes_newtype!(DataHash);

impl From<Hash> for DataHash {
    fn from(hash: Hash) -> Self {
        Self(hash)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CandidateBlock {
    pub data: BlockData,
    pub header_data_hash: DataHash,
}

impl CandidateBlock {
    #[must_use]
    pub const fn new(data: BlockData, header_data_hash: DataHash) -> Self {
        Self {
            data,
            header_data_hash,
        }
    }

    #[must_use]
    pub const fn square_size(&self) -> usize {
        self.data.square_size
    }
}
