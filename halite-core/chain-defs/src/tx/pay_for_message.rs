use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::Commitment;
use crate::{
    message::{self, Message},
    namespace::NamespaceId,
};

/// Claim that a message with `namespace` and `commitment` is part of the same
/// block. Claims are matched to messages by commitment only.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MsgPayForMessage {
    pub namespace: NamespaceId,
    pub message_size: u64,
    pub commitment: Commitment,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SquareCommitment {
    pub square_size: u64,
    pub commitment: Commitment,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MsgWirePayForMessage {
    pub namespace: NamespaceId,
    pub message: Bytes,
    pub commitments: Vec<SquareCommitment>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum MalleateError {
    #[error("No commitment for square size {0}")]
    MissingCommitment(usize),
    #[error(transparent)]
    Message(#[from] message::Error),
}

impl MsgWirePayForMessage {
    /// Commitment the sender signed for `square_size`, first match wins.
    #[must_use]
    pub fn commitment_for(&self, square_size: usize) -> Option<Commitment> {
        self.commitments
            .iter()
            .find(|c| usize::try_from(c.square_size).is_ok_and(|size| size == square_size))
            .map(|c| c.commitment)
    }

    /// Splits the wire transaction into the block-level claim and the message
    /// it pays for, for a square of `square_size`.
    pub fn malleate(&self, square_size: usize) -> Result<(MsgPayForMessage, Message), MalleateError> {
        let commitment = self
            .commitment_for(square_size)
            .ok_or(MalleateError::MissingCommitment(square_size))?;
        let message = Message::new(self.namespace, self.message.clone())?;
        let claim = MsgPayForMessage {
            namespace: self.namespace,
            message_size: self.message.len() as u64,
            commitment,
        };
        Ok((claim, message))
    }
}
