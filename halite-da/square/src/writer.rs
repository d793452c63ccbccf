use std::collections::{BTreeMap, HashMap, VecDeque};

use bytes::Bytes;
use halite_core::{
    message::Message,
    namespace::NamespaceId,
    tx::{Commitment, MsgPayForMessage, MsgWirePayForMessage, Transaction},
};
use tracing::{debug, trace};

use crate::{
    commitment::message_commitment,
    ensure_square_size,
    layout::{layout, message_alignment, next_aligned},
    share::Share,
    split::{delimited_len, message_share_count, split_message, split_transactions, tx_share_count},
    square::Square,
    Error, LOG_TARGET,
};

/// Square together with the subset of the input that made it in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WrittenSquare {
    pub square: Square,
    /// Raw transactions in square order. Wire transactions appear in their
    /// malleated form.
    pub transactions: Vec<Bytes>,
    /// Messages in square order: ascending namespace, then paying transaction.
    pub messages: Vec<Message>,
}

/// Deterministic layout of transactions and paid messages into a square of a
/// fixed width.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SquareWriter {
    square_size: usize,
}

struct Admitted {
    index: usize,
    raw: Bytes,
    message: Option<Message>,
}

/// Declared messages indexed by their commitment at the writer's square size.
/// Every message can back a single claim.
struct DeclaredMessages<'a> {
    messages: &'a [Message],
    by_commitment: HashMap<Commitment, VecDeque<usize>>,
}

impl<'a> DeclaredMessages<'a> {
    fn new(messages: &'a [Message], square_size: usize) -> Self {
        let mut by_commitment: HashMap<Commitment, VecDeque<usize>> = HashMap::new();
        for (index, message) in messages.iter().enumerate() {
            match message_commitment(message, square_size) {
                Ok(commitment) => by_commitment.entry(commitment).or_default().push_back(index),
                Err(e) => debug!(
                    target: LOG_TARGET,
                    index,
                    namespace = %message.namespace(),
                    "declared message cannot be committed to: {e}"
                ),
            }
        }
        Self {
            messages,
            by_commitment,
        }
    }

    fn take(&mut self, commitment: &Commitment) -> Option<usize> {
        self.by_commitment.get_mut(commitment)?.pop_front()
    }

    fn give_back(&mut self, commitment: Commitment, index: usize) {
        self.by_commitment.entry(commitment).or_default().push_front(index);
    }
}

/// Shares taken by everything admitted so far.
///
/// Fit checks are answered from running totals whenever the worst case
/// alignment padding still fits or the unpadded content already overflows.
/// Only the remaining cases walk the namespace-ordered messages.
struct Occupancy {
    square_size: usize,
    stream_len: usize,
    message_shares: usize,
    /// Upper bound on the alignment padding of the admitted messages.
    slack: usize,
    messages: BTreeMap<(NamespaceId, usize), usize>,
}

impl Occupancy {
    const fn new(square_size: usize) -> Self {
        Self {
            square_size,
            stream_len: 0,
            message_shares: 0,
            slack: 0,
            messages: BTreeMap::new(),
        }
    }

    const fn capacity(&self) -> usize {
        self.square_size * self.square_size
    }

    fn push_transaction(&mut self, raw_len: usize) {
        self.stream_len += delimited_len(raw_len);
    }

    const fn tx_shares(&self) -> usize {
        tx_share_count(self.stream_len)
    }

    /// Admits a transaction of `raw_len` bytes with the message it pays for,
    /// keyed by namespace and transaction index. On overflow nothing changes
    /// and the shares the layout would need are returned.
    fn try_admit(
        &mut self,
        raw_len: usize,
        key: (NamespaceId, usize),
        share_count: usize,
    ) -> Result<(), usize> {
        let stream_len = self.stream_len + delimited_len(raw_len);
        let tx_shares = tx_share_count(stream_len);
        let slack = message_alignment(share_count, self.square_size) - 1;

        let unpadded = tx_shares + self.message_shares + share_count;
        if unpadded > self.capacity() {
            return Err(unpadded);
        }
        self.messages.insert(key, share_count);
        if unpadded + self.slack + slack > self.capacity() {
            let end = layout(tx_shares, self.messages.values().copied(), self.square_size).end;
            if end > self.capacity() {
                self.messages.remove(&key);
                return Err(end);
            }
        }
        self.stream_len = stream_len;
        self.message_shares += share_count;
        self.slack += slack;
        Ok(())
    }
}

impl SquareWriter {
    pub fn new(square_size: usize) -> Result<Self, Error> {
        ensure_square_size(square_size)?;
        Ok(Self { square_size })
    }

    #[must_use]
    pub const fn square_size(&self) -> usize {
        self.square_size
    }

    const fn capacity(&self) -> usize {
        self.square_size * self.square_size
    }

    /// Lays out `transactions` and the `messages` their claims pay for.
    ///
    /// Undecodable transactions are skipped. Plain transactions must all fit,
    /// otherwise the whole square fails with [`Error::SquareOverflow`]. Claims
    /// and wire transactions are admitted in input order as long as the
    /// resulting layout still fits; anything else is left out together with
    /// its message.
    pub fn write<T: AsRef<[u8]>>(
        &self,
        transactions: &[T],
        messages: &[Message],
    ) -> Result<WrittenSquare, Error> {
        let decoded: Vec<(usize, &[u8], Transaction)> = transactions
            .iter()
            .enumerate()
            .filter_map(|(index, raw)| match Transaction::decode(raw.as_ref()) {
                Ok(tx) => Some((index, raw.as_ref(), tx)),
                Err(e) => {
                    debug!(target: LOG_TARGET, index, "skipping transaction: {e}");
                    None
                }
            })
            .collect();

        let mut occupancy = Occupancy::new(self.square_size);
        let mut admitted: Vec<Admitted> = decoded
            .iter()
            .filter(|(_, _, tx)| matches!(tx, Transaction::Plain(_)))
            .map(|(index, raw, _)| {
                occupancy.push_transaction(raw.len());
                Admitted {
                    index: *index,
                    raw: Bytes::copy_from_slice(raw),
                    message: None,
                }
            })
            .collect();
        let required = occupancy.tx_shares();
        if required > self.capacity() {
            return Err(Error::SquareOverflow {
                required,
                capacity: self.capacity(),
            });
        }

        let mut declared = DeclaredMessages::new(messages, self.square_size);
        for (index, raw, tx) in &decoded {
            let (candidate, claimed) = match tx {
                Transaction::Plain(_) => continue,
                Transaction::PayForMessage(claim) => {
                    match self.claim_candidate(*index, raw, claim, &mut declared) {
                        Some((candidate, slot)) => (candidate, Some((claim.commitment, slot))),
                        None => continue,
                    }
                }
                Transaction::WirePayForMessage(wire) => match self.malleate_candidate(*index, wire) {
                    Some(candidate) => (candidate, None),
                    None => continue,
                },
            };

            let share_count = candidate
                .message
                .as_ref()
                .map_or(0, |message| message_share_count(message.len()));
            let key = (
                candidate
                    .message
                    .as_ref()
                    .map_or_else(NamespaceId::default, Message::namespace),
                *index,
            );
            match occupancy.try_admit(candidate.raw.len(), key, share_count) {
                Ok(()) => admitted.push(candidate),
                Err(required) => {
                    if let Some((commitment, slot)) = claimed {
                        declared.give_back(commitment, slot);
                    }
                    debug!(
                        target: LOG_TARGET,
                        index,
                        required,
                        capacity = self.capacity(),
                        "message does not fit the square, excluding it with its transaction"
                    );
                }
            }
        }

        admitted.sort_unstable_by_key(|entry| entry.index);
        self.assemble(admitted)
    }

    fn claim_candidate(
        &self,
        index: usize,
        raw: &[u8],
        claim: &MsgPayForMessage,
        declared: &mut DeclaredMessages<'_>,
    ) -> Option<(Admitted, usize)> {
        let Some(slot) = declared.take(&claim.commitment) else {
            debug!(
                target: LOG_TARGET,
                index,
                commitment = %claim.commitment,
                "no declared message matches the claim"
            );
            return None;
        };
        let messages = declared.messages;
        let message = &messages[slot];
        if message.namespace() != claim.namespace || message.len() as u64 != claim.message_size {
            debug!(
                target: LOG_TARGET,
                index,
                namespace = %claim.namespace,
                "claim disagrees with the message matching its commitment"
            );
            declared.give_back(claim.commitment, slot);
            return None;
        }
        Some((
            Admitted {
                index,
                raw: Bytes::copy_from_slice(raw),
                message: Some(message.clone()),
            },
            slot,
        ))
    }

    fn malleate_candidate(&self, index: usize, wire: &MsgWirePayForMessage) -> Option<Admitted> {
        let (claim, message) = match wire.malleate(self.square_size) {
            Ok(parts) => parts,
            Err(e) => {
                debug!(target: LOG_TARGET, index, "cannot malleate wire transaction: {e}");
                return None;
            }
        };
        match message_commitment(&message, self.square_size) {
            Ok(commitment) if commitment == claim.commitment => {}
            Ok(commitment) => {
                debug!(
                    target: LOG_TARGET,
                    index,
                    signed = %claim.commitment,
                    computed = %commitment,
                    "wire transaction commitment does not match its message"
                );
                return None;
            }
            Err(e) => {
                debug!(target: LOG_TARGET, index, "wire transaction message rejected: {e}");
                return None;
            }
        }
        match Transaction::PayForMessage(claim).encode() {
            Ok(raw) => Some(Admitted {
                index,
                raw,
                message: Some(message),
            }),
            Err(e) => {
                debug!(target: LOG_TARGET, index, "cannot encode malleated claim: {e}");
                None
            }
        }
    }

    fn assemble(&self, admitted: Vec<Admitted>) -> Result<WrittenSquare, Error> {
        let transactions: Vec<Bytes> = admitted.iter().map(|entry| entry.raw.clone()).collect();
        let mut placed: Vec<(NamespaceId, usize, Message)> = admitted
            .into_iter()
            .filter_map(|entry| {
                entry
                    .message
                    .map(|message| (message.namespace(), entry.index, message))
            })
            .collect();
        placed.sort_unstable_by_key(|(namespace, index, _)| (*namespace, *index));

        let mut shares = split_transactions(&transactions);
        for (_, _, message) in &placed {
            let message_shares = split_message(message);
            let start = next_aligned(
                shares.len(),
                message_alignment(message_shares.len(), self.square_size),
            );
            shares.resize(start, Share::padding());
            shares.extend(message_shares);
        }
        if shares.len() > self.capacity() {
            return Err(Error::SquareOverflow {
                required: shares.len(),
                capacity: self.capacity(),
            });
        }
        trace!(
            target: LOG_TARGET,
            square_size = self.square_size,
            used = shares.len(),
            transactions = transactions.len(),
            messages = placed.len(),
            "square laid out"
        );
        shares.resize(self.capacity(), Share::padding());

        Ok(WrittenSquare {
            square: Square::new(self.square_size, shares)?,
            transactions,
            messages: placed.into_iter().map(|(_, _, message)| message).collect(),
        })
    }
}
