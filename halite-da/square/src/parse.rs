use bytes::Bytes;
use halite_core::{
    block::BlockData,
    consts::MSG_SHARE_DATA_SIZE,
    message::Message,
    namespace::{PADDING_NAMESPACE, TX_NAMESPACE},
};
use integer_encoding::VarInt as _;

use crate::{
    share::Share,
    split::{message_share_count, split_transactions},
    square::Square,
    Error,
};

fn read_delimited(stream: &[u8], index: usize) -> Result<(usize, &[u8]), Error> {
    let (len, prefix) = u64::decode_var(stream).ok_or(Error::MalformedShare {
        index,
        reason: "invalid length prefix",
    })?;
    let len = usize::try_from(len).map_err(|_| Error::MalformedShare {
        index,
        reason: "length prefix out of range",
    })?;
    let body = stream
        .get(prefix..)
        .and_then(|rest| rest.get(..len))
        .ok_or(Error::MalformedShare {
            index,
            reason: "unit runs past its shares",
        })?;
    Ok((prefix + len, body))
}

fn parse_transactions(shares: &[Share]) -> Result<Vec<Bytes>, Error> {
    let stream: Vec<u8> = shares
        .iter()
        .flat_map(|share| share.content().iter().skip(1).copied())
        .collect();
    let mut transactions = Vec::new();
    let mut cursor = 0;
    // a zero length prefix starts the padding of the last share
    while cursor < stream.len() && stream[cursor] != 0 {
        let (consumed, tx) = read_delimited(&stream[cursor..], 0)?;
        transactions.push(Bytes::copy_from_slice(tx));
        cursor += consumed;
    }
    if split_transactions(&transactions) != shares {
        return Err(Error::MalformedShare {
            index: 0,
            reason: "transaction shares are not canonical",
        });
    }
    Ok(transactions)
}

/// Recovers the transactions and messages written into `square`.
///
/// Inverse of [`crate::SquareWriter::write`] on the shares it produces:
/// transaction shares come first, messages follow in namespace order and
/// everything else is padding.
pub fn parse_square(square: &Square) -> Result<BlockData, Error> {
    let shares = square.shares();
    let tx_shares = shares
        .iter()
        .take_while(|share| share.namespace() == TX_NAMESPACE)
        .count();
    let transactions = parse_transactions(&shares[..tx_shares])?;

    let mut messages = Vec::new();
    let mut index = tx_shares;
    while index < shares.len() {
        let namespace = shares[index].namespace();
        if namespace == PADDING_NAMESPACE {
            index += 1;
            continue;
        }
        if namespace == TX_NAMESPACE {
            return Err(Error::MalformedShare {
                index,
                reason: "transaction share after messages",
            });
        }

        let head = shares[index].content();
        let (len, _) = u64::decode_var(head).ok_or(Error::MalformedShare {
            index,
            reason: "invalid length prefix",
        })?;
        let count = usize::try_from(len)
            .ok()
            .filter(|len| *len <= (shares.len() - index) * MSG_SHARE_DATA_SIZE)
            .map(message_share_count)
            .ok_or(Error::MalformedShare {
                index,
                reason: "length prefix out of range",
            })?;
        let message_shares = shares
            .get(index..index + count)
            .filter(|run| run.iter().all(|share| share.namespace() == namespace))
            .ok_or(Error::MalformedShare {
                index,
                reason: "message shares are not contiguous",
            })?;
        let stream: Vec<u8> = message_shares
            .iter()
            .flat_map(|share| share.content().iter().copied())
            .collect();
        let (_, data) = read_delimited(&stream, index)?;
        messages.push(Message::new(namespace, Bytes::copy_from_slice(data))?);
        index += count;
    }

    Ok(BlockData {
        square_size: square.size(),
        transactions,
        messages,
    })
}
