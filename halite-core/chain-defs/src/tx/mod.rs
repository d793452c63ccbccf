mod pay_for_message;

use bytes::Bytes;
pub use pay_for_message::{MsgPayForMessage, MsgWirePayForMessage, SquareCommitment};
use serde::{Deserialize, Serialize};

use crate::{
    utils::{display_hex_bytes_newtype, serde_bytes_newtype},
    wire, Hash,
};

/// Share commitment binding a message payload to its shape inside a square
/// of a given size.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Commitment(Hash);

impl Commitment {
    #[must_use]
    pub const fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

impl From<Hash> for Commitment {
    fn from(hash: Hash) -> Self {
        Self(hash)
    }
}

impl From<Commitment> for Hash {
    fn from(commitment: Commitment) -> Self {
        commitment.0
    }
}

impl AsRef<[u8]> for Commitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

display_hex_bytes_newtype!(Commitment);
serde_bytes_newtype!(Commitment, 32);

/// Opaque application transaction. Only its bytes matter to the square.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PlainTx {
    pub payload: Bytes,
}

/// Every transaction kind the block data layer understands, decoded once.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Transaction {
    Plain(PlainTx),
    /// Block-level claim paying for one message of the same block.
    PayForMessage(MsgPayForMessage),
    /// Mempool form: carries the message and per-square-size commitments.
    /// Proposers malleate it into [`Transaction::PayForMessage`].
    WirePayForMessage(MsgWirePayForMessage),
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to decode transaction: {0}")]
pub struct DecodeError(#[from] wire::Error);

impl Transaction {
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        Ok(wire::deserialize(raw)?)
    }

    pub fn encode(&self) -> wire::Result<Bytes> {
        wire::serialize(self).map(Bytes::from)
    }

    /// The claim carried by this transaction, if any.
    #[must_use]
    pub const fn pay_for_message(&self) -> Option<&MsgPayForMessage> {
        match self {
            Self::PayForMessage(pfm) => Some(pfm),
            Self::Plain(_) | Self::WirePayForMessage(_) => None,
        }
    }
}
