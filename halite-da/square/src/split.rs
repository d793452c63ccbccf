//! Share encodings of transactions and messages.
//!
//! Transactions are packed back to back as `uvarint(len) | bytes` into
//! "compact" shares whose first content byte marks where the first unit
//! starting in that share begins. Messages are written as
//! `uvarint(len) | payload` into shares of their own namespace.
use halite_core::{
    consts::{COMPACT_SHARE_RESERVED_BYTES, MSG_SHARE_DATA_SIZE, NAMESPACE_SIZE, TX_SHARE_DATA_SIZE},
    message::Message,
    namespace::TX_NAMESPACE,
};
use integer_encoding::VarInt as _;

use crate::share::Share;

/// Length of a unit once prefixed with its uvarint length.
#[must_use]
pub fn delimited_len(len: usize) -> usize {
    (len as u64).required_space() + len
}

#[must_use]
pub fn message_share_count(data_len: usize) -> usize {
    delimited_len(data_len).div_ceil(MSG_SHARE_DATA_SIZE)
}

/// Number of compact shares needed for `stream_len` bytes of delimited
/// transactions.
#[must_use]
pub const fn tx_share_count(stream_len: usize) -> usize {
    stream_len.div_ceil(TX_SHARE_DATA_SIZE)
}

fn delimit(data: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&(data.len() as u64).encode_var_vec());
    out.extend_from_slice(data);
}

#[must_use]
pub fn split_message(message: &Message) -> Vec<Share> {
    let mut stream = Vec::with_capacity(delimited_len(message.len()));
    delimit(message.data(), &mut stream);
    stream
        .chunks(MSG_SHARE_DATA_SIZE)
        .map(|chunk| Share::from_parts(message.namespace(), chunk))
        .collect()
}

pub fn split_transactions<T: AsRef<[u8]>>(transactions: &[T]) -> Vec<Share> {
    let mut stream = Vec::new();
    let mut unit_starts = Vec::with_capacity(transactions.len());
    for tx in transactions {
        unit_starts.push(stream.len());
        delimit(tx.as_ref(), &mut stream);
    }

    let mut starts = unit_starts.into_iter().peekable();
    stream
        .chunks(TX_SHARE_DATA_SIZE)
        .enumerate()
        .map(|(i, chunk)| {
            let share_begin = i * TX_SHARE_DATA_SIZE;
            let share_end = share_begin + chunk.len();
            let mut first_unit = None;
            while let Some(start) = starts.next_if(|start| *start < share_end) {
                first_unit.get_or_insert(start);
            }
            let marker = first_unit.map_or(0, |start| {
                start - share_begin + NAMESPACE_SIZE + COMPACT_SHARE_RESERVED_BYTES
            });
            let mut content = Vec::with_capacity(COMPACT_SHARE_RESERVED_BYTES + chunk.len());
            content.push(marker as u8);
            content.extend_from_slice(chunk);
            Share::from_parts(TX_NAMESPACE, &content)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use halite_core::{consts::SHARE_SIZE, namespace::NamespaceId};

    use super::*;

    #[test]
    fn message_share_counts() {
        assert_eq!(message_share_count(0), 1);
        assert_eq!(message_share_count(20), 1);
        // two bytes of length prefix plus 246 bytes fill a share exactly
        assert_eq!(message_share_count(246), 1);
        assert_eq!(message_share_count(247), 2);
        assert_eq!(message_share_count(512), 3);
    }

    #[test]
    fn split_message_layout() {
        let namespace = NamespaceId::new([2; 8]);
        let message = Message::new(namespace, vec![4u8; 512]).unwrap();
        let shares = split_message(&message);
        assert_eq!(shares.len(), message_share_count(512));
        for share in &shares {
            assert_eq!(share.namespace(), namespace);
            assert_eq!(share.as_ref().len(), SHARE_SIZE);
        }
        // 512 as uvarint is [0x80, 0x04]
        assert_eq!(&shares[0].content()[..3], &[0x80, 0x04, 4]);
    }

    #[test]
    fn split_transactions_marks_unit_starts() {
        let first = vec![1u8; 300];
        let second = vec![2u8; 10];
        let shares = split_transactions(&[first, second]);
        // 2 + 300 + 1 + 10 bytes of stream
        assert_eq!(shares.len(), tx_share_count(313));
        assert_eq!(shares.len(), 2);
        assert!(shares.iter().all(|s| s.namespace() == TX_NAMESPACE));

        let offset = NAMESPACE_SIZE + COMPACT_SHARE_RESERVED_BYTES;
        assert_eq!(shares[0].content()[0] as usize, offset);
        // second unit starts at stream byte 302, i.e. 55 bytes into share 1
        assert_eq!(shares[1].content()[0] as usize, offset + 302 - TX_SHARE_DATA_SIZE);
    }

    #[test]
    fn continuation_share_without_unit_start() {
        let shares = split_transactions(&[vec![7u8; 600]]);
        assert_eq!(shares.len(), 3);
        assert_ne!(shares[0].content()[0], 0);
        assert_eq!(shares[1].content()[0], 0);
        assert_eq!(shares[2].content()[0], 0);
    }

    #[test]
    fn no_transactions_no_shares() {
        assert!(split_transactions::<Vec<u8>>(&[]).is_empty());
    }
}
