use halite_core::{
    block::{BlockData, CandidateBlock},
    utils::merkle::MerkleRootBuilder,
};
use halite_da_erasure::ErasureCoder;
use tracing::{debug, instrument};

use crate::{ConstructionError, ProposalValidator, LOG_TARGET};

#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    #[error("Square size {square_size} is not supported (max {max})")]
    UnsupportedSquareSize { square_size: usize, max: usize },
    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

impl<C, M> ProposalValidator<C, M>
where
    C: ErasureCoder,
    M: MerkleRootBuilder + Sync,
{
    /// Builds a candidate block out of mempool transactions.
    ///
    /// Wire transactions are malleated for `square_size` and their messages
    /// declared in square order. Whatever does not fit is left for a later
    /// block. The result passes [`ProposalValidator::validate`] under the same
    /// settings.
    #[instrument(
        level = "debug",
        skip_all,
        fields(square_size = square_size, transactions = transactions.len())
    )]
    pub fn prepare_proposal<T: AsRef<[u8]>>(
        &self,
        transactions: &[T],
        square_size: usize,
    ) -> Result<CandidateBlock, PrepareError> {
        if !self.supports_square_size(square_size) {
            return Err(PrepareError::UnsupportedSquareSize {
                square_size,
                max: self.settings.max_square_size,
            });
        }

        let (written, header) = self.build_square(transactions, &[], square_size)?;
        debug!(
            target: LOG_TARGET,
            included = written.transactions.len(),
            messages = written.messages.len(),
            hash = %header.hash(),
            "proposal prepared"
        );
        Ok(CandidateBlock::new(
            BlockData {
                square_size,
                transactions: written.transactions,
                messages: written.messages,
            },
            header.hash(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use halite_core::{
        namespace::NamespaceId,
        tx::{MsgWirePayForMessage, PlainTx, SquareCommitment, Transaction},
        Message,
    };
    use halite_da_square::message_commitment;

    use super::*;
    use crate::{ProposalValidatorSettings, Verdict};

    fn wire(namespace: NamespaceId, data: &[u8], sizes: &[usize]) -> Bytes {
        let message = Message::new(namespace, data.to_vec()).unwrap();
        Transaction::WirePayForMessage(MsgWirePayForMessage {
            namespace,
            message: Bytes::copy_from_slice(data),
            commitments: sizes
                .iter()
                .map(|&square_size| SquareCommitment {
                    square_size: square_size as u64,
                    commitment: message_commitment(&message, square_size).unwrap(),
                })
                .collect(),
        })
        .encode()
        .unwrap()
    }

    #[test]
    fn prepared_proposals_are_accepted() {
        let validator = ProposalValidator::default();
        let txs = vec![
            Transaction::Plain(PlainTx {
                payload: Bytes::from_static(b"transfer"),
            })
            .encode()
            .unwrap(),
            wire(NamespaceId::new([2; 8]), &[2u8; 300], &[4, 8]),
            wire(NamespaceId::new([1; 8]), &[1u8; 40], &[4]),
        ];
        let block = validator.prepare_proposal(&txs, 4).unwrap();
        assert_eq!(block.square_size(), 4);
        assert_eq!(block.data.transactions.len(), 3);
        assert_eq!(block.data.messages[0].namespace(), NamespaceId::new([1; 8]));
        assert_eq!(validator.process_proposal(&block), Verdict::Accept);
    }

    #[test]
    fn excluded_wire_transactions_stay_out() {
        let validator = ProposalValidator::default();
        let txs = vec![
            wire(NamespaceId::new([2; 8]), &[2u8; 100], &[2, 8]),
            wire(NamespaceId::new([3; 8]), &[3u8; 100], &[4]),
        ];
        let block = validator.prepare_proposal(&txs, 4).unwrap();
        assert_eq!(block.data.transactions.len(), 1);
        assert_eq!(block.data.messages.len(), 1);
        assert!(validator.validate(&block).is_ok());
    }

    #[test]
    fn rejects_unsupported_square_sizes() {
        let validator = ProposalValidator::new(ProposalValidatorSettings {
            max_square_size: 4,
            ..Default::default()
        });
        assert!(matches!(
            validator.prepare_proposal::<Bytes>(&[], 8),
            Err(PrepareError::UnsupportedSquareSize {
                square_size: 8,
                max: 4
            })
        ));
    }

    #[test]
    fn mandatory_transactions_must_fit() {
        let validator = ProposalValidator::default();
        let big = Transaction::Plain(PlainTx {
            payload: Bytes::from(vec![0u8; 1000]),
        })
        .encode()
        .unwrap();
        assert!(matches!(
            validator.prepare_proposal(&[big], 1),
            Err(PrepareError::Construction(ConstructionError::Square(
                halite_da_square::Error::SquareOverflow { .. }
            )))
        ));
    }
}
