mod prepare;
mod settings;

use std::collections::HashSet;

use bytes::Bytes;
use halite_core::{
    block::{CandidateBlock, DataHash},
    consts::is_supported_square_size,
    message::Message,
    tx::{Commitment, Transaction},
    utils::merkle::{Blake2bMerkle, MerkleRootBuilder},
};
use halite_da_erasure::{DataAvailabilityHeader, ErasureCoder, ReedSolomonCoder};
use halite_da_square::{
    message_commitment,
    split::{delimited_len, message_share_count, tx_share_count},
    SquareWriter, WrittenSquare,
};
pub use prepare::PrepareError;
pub use settings::{ProposalValidatorSettings, SettingsError};
use tracing::{debug, error, instrument, trace, warn};

pub(crate) const LOG_TARGET: &str = "halite::consensus::proposal";

/// Outcome handed back to the consensus engine. Reasons stay in the logs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verdict {
    Accept,
    Reject,
}

/// Checks a candidate block goes through, in order. A rejection reports the
/// last stage the block completed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum ValidationStage {
    Received,
    CommitmentsExtracted,
    CountChecked,
    CommitmentsVerified,
    SquareRebuilt,
    HeaderVerified,
}

#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    #[error(transparent)]
    Square(#[from] halite_da_square::Error),
    #[error(transparent)]
    Erasure(#[from] halite_da_erasure::Error),
    #[error("Rebuilt square holds {included} transactions, block has {expected} different ones")]
    TransactionMismatch { included: usize, expected: usize },
    #[error("Only {included} of {expected} messages fit the square")]
    DroppedMessages { included: usize, expected: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum RejectReason {
    #[error("Square size {square_size} is not supported (max {max})")]
    UnsupportedSquareSize { square_size: usize, max: usize },
    #[error("Commitment {0} is claimed more than once")]
    DuplicateCommitment(Commitment),
    #[error("{claims} distinct commitments claimed for {messages} declared messages")]
    CountMismatch { claims: usize, messages: usize },
    #[error("Declared message {index} cannot be committed to: {source}")]
    InvalidMessage {
        index: usize,
        #[source]
        source: halite_da_square::Error,
    },
    #[error("Declared message {index} with commitment {commitment} is not paid for")]
    UnpaidMessage { index: usize, commitment: Commitment },
    #[error("Square construction failed: {0}")]
    SquareConstructionFailed(#[from] ConstructionError),
    #[error("Data root mismatch: header claims {claimed}, square hashes to {computed}")]
    DataRootMismatch { claimed: DataHash, computed: DataHash },
}

impl RejectReason {
    #[must_use]
    pub const fn stage(&self) -> ValidationStage {
        match self {
            Self::UnsupportedSquareSize { .. } | Self::DuplicateCommitment(_) => {
                ValidationStage::Received
            }
            Self::CountMismatch { .. } => ValidationStage::CommitmentsExtracted,
            Self::InvalidMessage { .. } | Self::UnpaidMessage { .. } => {
                ValidationStage::CountChecked
            }
            Self::SquareConstructionFailed(_) => ValidationStage::CommitmentsVerified,
            Self::DataRootMismatch { .. } => ValidationStage::SquareRebuilt,
        }
    }
}

/// Decides whether the transactions, declared messages and header data hash
/// of a candidate block describe the same square.
///
/// Validation is a pure function of the block: nothing is cached between
/// calls.
#[derive(Clone, Debug)]
pub struct ProposalValidator<C = ReedSolomonCoder, M = Blake2bMerkle> {
    settings: ProposalValidatorSettings,
    coder: C,
    merkle: M,
}

impl ProposalValidator {
    #[must_use]
    pub const fn new(settings: ProposalValidatorSettings) -> Self {
        Self::with_backends(settings, ReedSolomonCoder, Blake2bMerkle)
    }
}

impl Default for ProposalValidator {
    fn default() -> Self {
        Self::new(ProposalValidatorSettings::default())
    }
}

fn decode_transactions(transactions: &[Bytes]) -> Vec<(&Bytes, Transaction)> {
    transactions
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| match Transaction::decode(raw) {
            Ok(tx) => Some((raw, tx)),
            Err(e) => {
                debug!(target: LOG_TARGET, index, "skipping undecodable transaction: {e}");
                None
            }
        })
        .collect()
}

/// Rejects blocks whose content alone, before any alignment padding, needs
/// more shares than the square holds.
fn ensure_content_fits(
    transactions: &[&Bytes],
    messages: &[Message],
    square_size: usize,
) -> Result<(), ConstructionError> {
    let stream_len: usize = transactions.iter().map(|raw| delimited_len(raw.len())).sum();
    let required = tx_share_count(stream_len)
        + messages
            .iter()
            .map(|message| message_share_count(message.len()))
            .sum::<usize>();
    let capacity = square_size * square_size;
    if required > capacity {
        return Err(halite_da_square::Error::SquareOverflow { required, capacity }.into());
    }
    Ok(())
}

impl<C, M> ProposalValidator<C, M>
where
    C: ErasureCoder,
    M: MerkleRootBuilder + Sync,
{
    pub const fn with_backends(settings: ProposalValidatorSettings, coder: C, merkle: M) -> Self {
        Self {
            settings,
            coder,
            merkle,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &ProposalValidatorSettings {
        &self.settings
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(
            square_size = block.data.square_size,
            transactions = block.data.transactions.len(),
            messages = block.data.messages.len()
        )
    )]
    pub fn process_proposal(&self, block: &CandidateBlock) -> Verdict {
        match self.validate(block) {
            Ok(()) => {
                debug!(target: LOG_TARGET, hash = %block.header_data_hash, "proposal accepted");
                Verdict::Accept
            }
            Err(reason) => {
                error!(
                    target: LOG_TARGET,
                    reason = %reason,
                    stage = ?reason.stage(),
                    "proposal rejected"
                );
                Verdict::Reject
            }
        }
    }

    /// Runs every check on `block` and reports the first one that fails.
    pub fn validate(&self, block: &CandidateBlock) -> Result<(), RejectReason> {
        let data = &block.data;
        let square_size = data.square_size;
        if !self.supports_square_size(square_size) {
            return Err(RejectReason::UnsupportedSquareSize {
                square_size,
                max: self.settings.max_square_size,
            });
        }
        Self::advance(ValidationStage::Received);

        let decoded = decode_transactions(&data.transactions);
        let commitments = self.claimed_commitments(&decoded)?;
        Self::advance(ValidationStage::CommitmentsExtracted);

        if commitments.len() != data.messages.len() {
            return Err(RejectReason::CountMismatch {
                claims: commitments.len(),
                messages: data.messages.len(),
            });
        }
        Self::advance(ValidationStage::CountChecked);

        for (index, message) in data.messages.iter().enumerate() {
            let commitment = message_commitment(message, square_size)
                .map_err(|source| RejectReason::InvalidMessage { index, source })?;
            if !commitments.contains(&commitment) {
                return Err(RejectReason::UnpaidMessage { index, commitment });
            }
        }
        Self::advance(ValidationStage::CommitmentsVerified);

        let transactions: Vec<&Bytes> = decoded.iter().map(|(raw, _)| *raw).collect();
        ensure_content_fits(&transactions, &data.messages, square_size)?;
        let (written, header) = self.build_square(&transactions, &data.messages, square_size)?;
        if written.transactions.len() != transactions.len()
            || written.transactions.iter().zip(&transactions).any(|(a, b)| a != *b)
        {
            return Err(ConstructionError::TransactionMismatch {
                included: written.transactions.len(),
                expected: transactions.len(),
            }
            .into());
        }
        if written.messages.len() != data.messages.len() {
            return Err(ConstructionError::DroppedMessages {
                included: written.messages.len(),
                expected: data.messages.len(),
            }
            .into());
        }
        Self::advance(ValidationStage::SquareRebuilt);

        let computed = header.hash();
        if computed != block.header_data_hash {
            return Err(RejectReason::DataRootMismatch {
                claimed: block.header_data_hash,
                computed,
            });
        }
        Self::advance(ValidationStage::HeaderVerified);
        Ok(())
    }

    fn advance(stage: ValidationStage) {
        trace!(target: LOG_TARGET, ?stage, "validation stage passed");
    }

    fn supports_square_size(&self, square_size: usize) -> bool {
        is_supported_square_size(square_size) && square_size <= self.settings.max_square_size
    }

    fn claimed_commitments(
        &self,
        decoded: &[(&Bytes, Transaction)],
    ) -> Result<HashSet<Commitment>, RejectReason> {
        let mut commitments = HashSet::new();
        for claim in decoded.iter().filter_map(|(_, tx)| tx.pay_for_message()) {
            if !commitments.insert(claim.commitment) {
                if self.settings.reject_duplicate_commitments {
                    return Err(RejectReason::DuplicateCommitment(claim.commitment));
                }
                warn!(
                    target: LOG_TARGET,
                    commitment = %claim.commitment,
                    "commitment claimed more than once"
                );
            }
        }
        Ok(commitments)
    }

    /// Lays out the square and derives its data availability header.
    fn build_square<T: AsRef<[u8]>>(
        &self,
        transactions: &[T],
        messages: &[Message],
        square_size: usize,
    ) -> Result<(WrittenSquare, DataAvailabilityHeader), ConstructionError> {
        let written = SquareWriter::new(square_size)?.write(transactions, messages)?;
        let eds = self.coder.extend(&written.square)?;
        let header = DataAvailabilityHeader::build(&eds, &self.merkle);
        Ok((written, header))
    }
}

#[cfg(test)]
mod tests {
    use halite_core::{
        block::BlockData,
        tx::{MsgPayForMessage, MsgWirePayForMessage, PlainTx, SquareCommitment},
        NamespaceId,
    };

    use super::*;

    fn claim(message: &Message, square_size: usize) -> Bytes {
        Transaction::PayForMessage(MsgPayForMessage {
            namespace: message.namespace(),
            message_size: message.len() as u64,
            commitment: message_commitment(message, square_size).unwrap(),
        })
        .encode()
        .unwrap()
    }

    fn block(square_size: usize, transactions: Vec<Bytes>, messages: Vec<Message>) -> CandidateBlock {
        CandidateBlock::new(
            BlockData {
                square_size,
                transactions,
                messages,
            },
            DataHash::default(),
        )
    }

    #[test]
    fn square_size_is_bounded_by_settings() {
        let validator = ProposalValidator::new(ProposalValidatorSettings {
            max_square_size: 8,
            ..Default::default()
        });
        for square_size in [0, 3, 16] {
            let reason = validator
                .validate(&block(square_size, Vec::new(), Vec::new()))
                .unwrap_err();
            assert!(matches!(reason, RejectReason::UnsupportedSquareSize { .. }));
            assert_eq!(reason.stage(), ValidationStage::Received);
        }
    }

    #[test]
    fn duplicate_commitments_follow_settings() {
        let message = Message::new(NamespaceId::new([2; 8]), b"payload".to_vec()).unwrap();
        let txs = vec![claim(&message, 4), claim(&message, 4)];
        let duplicated = block(4, txs, vec![message]);

        let strict = ProposalValidator::new(ProposalValidatorSettings {
            reject_duplicate_commitments: true,
            ..Default::default()
        });
        assert!(matches!(
            strict.validate(&duplicated),
            Err(RejectReason::DuplicateCommitment(_))
        ));

        // the set view passes the count check, the rebuilt square drops the
        // second claim
        assert!(matches!(
            ProposalValidator::default().validate(&duplicated),
            Err(RejectReason::SquareConstructionFailed(
                ConstructionError::TransactionMismatch {
                    included: 1,
                    expected: 2
                }
            ))
        ));
    }

    #[test]
    fn message_too_large_for_square_is_invalid() {
        let message = Message::new(NamespaceId::new([2; 8]), vec![0u8; 2000]).unwrap();
        let txs = vec![claim(&message, 8)];
        assert!(matches!(
            ProposalValidator::default().validate(&block(2, txs, vec![message])),
            Err(RejectReason::InvalidMessage { index: 0, .. })
        ));
    }

    #[test]
    fn empty_block_needs_matching_hash() {
        let validator = ProposalValidator::default();
        let empty = block(1, Vec::new(), Vec::new());
        let Err(RejectReason::DataRootMismatch { computed, .. }) = validator.validate(&empty) else {
            panic!("an all-zero hash never matches");
        };
        let empty = CandidateBlock::new(empty.data, computed);
        assert_eq!(validator.process_proposal(&empty), Verdict::Accept);
    }

    #[test]
    fn undecodable_transactions_are_ignored() {
        let validator = ProposalValidator::default();
        let plain = Transaction::Plain(PlainTx {
            payload: Bytes::from_static(b"transfer"),
        })
        .encode()
        .unwrap();
        let prepared = validator.prepare_proposal(&[plain], 1).unwrap();
        let mut data = prepared.data.clone();
        data.transactions.push(Bytes::from_static(&[0xff, 0xff]));
        let block = CandidateBlock::new(data, prepared.header_data_hash);
        assert!(validator.validate(&block).is_ok());
    }

    #[test]
    fn oversized_blocks_are_rejected_before_the_rebuild() {
        let k = 16;
        let messages: Vec<Message> = (0..300u16)
            .map(|i| Message::new(NamespaceId::new([2; 8]), i.to_le_bytes().to_vec()).unwrap())
            .collect();
        let txs = messages.iter().map(|message| claim(message, k)).collect();
        let reason = ProposalValidator::default()
            .validate(&block(k, txs, messages))
            .unwrap_err();
        assert!(matches!(
            reason,
            RejectReason::SquareConstructionFailed(ConstructionError::Square(
                halite_da_square::Error::SquareOverflow { capacity: 256, .. }
            ))
        ));
        assert_eq!(reason.stage(), ValidationStage::CommitmentsVerified);
    }

    #[test]
    fn claims_must_agree_with_their_message() {
        let k = 4;
        let message = Message::new(NamespaceId::new([2; 8]), b"payload".to_vec()).unwrap();
        let wrong_size = Transaction::PayForMessage(MsgPayForMessage {
            namespace: message.namespace(),
            message_size: message.len() as u64 + 1,
            commitment: message_commitment(&message, k).unwrap(),
        })
        .encode()
        .unwrap();
        // count and commitment checks pass, the rebuilt square leaves the
        // claim out
        assert!(matches!(
            ProposalValidator::default().validate(&block(k, vec![wrong_size], vec![message])),
            Err(RejectReason::SquareConstructionFailed(
                ConstructionError::TransactionMismatch {
                    included: 0,
                    expected: 1
                }
            ))
        ));
    }

    #[test]
    fn blocks_must_carry_malleated_claims() {
        let namespace = NamespaceId::new([2; 8]);
        let message = Message::new(namespace, b"payload".to_vec()).unwrap();
        let wire = Transaction::WirePayForMessage(MsgWirePayForMessage {
            namespace,
            message: message.data().clone(),
            commitments: vec![SquareCommitment {
                square_size: 2,
                commitment: message_commitment(&message, 2).unwrap(),
            }],
        })
        .encode()
        .unwrap();

        let validator = ProposalValidator::default();
        let prepared = validator.prepare_proposal(&[wire.clone()], 2).unwrap();
        assert!(validator.validate(&prepared).is_ok());

        let unmalleated = CandidateBlock::new(
            BlockData {
                square_size: 2,
                transactions: vec![wire],
                messages: Vec::new(),
            },
            prepared.header_data_hash,
        );
        assert!(matches!(
            validator.validate(&unmalleated),
            Err(RejectReason::SquareConstructionFailed(
                ConstructionError::TransactionMismatch { .. }
            ))
        ));
    }
}
