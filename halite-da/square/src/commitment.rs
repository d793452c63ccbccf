use bytes::Bytes;
use halite_core::{
    message::Message, namespace::NamespaceId, tx::Commitment, utils::merkle::calculate_merkle_root,
    Hash,
};

use crate::{ensure_square_size, layout::mountain_range, split::split_message, Error, SquareSizeError};

/// Commitment to `data` posted under `namespace` in a square of width
/// `square_size`.
pub fn create_commitment(
    square_size: usize,
    namespace: NamespaceId,
    data: &[u8],
) -> Result<Commitment, Error> {
    ensure_square_size(square_size)?;
    let message = Message::new(namespace, Bytes::copy_from_slice(data))?;
    message_commitment(&message, square_size)
}

/// Merkle root over the subtree roots of the message's mountain range.
///
/// Each run is placed by the square writer at an offset that is a multiple of
/// its own length, so every subtree root is an inner node of a row tree and
/// can be checked against the published row roots.
pub fn message_commitment(message: &Message, square_size: usize) -> Result<Commitment, Error> {
    ensure_square_size(square_size)?;
    let shares = split_message(message);
    // one share is always taken by the transaction paying for the message
    let capacity = square_size * square_size - 1;
    if shares.len() > capacity {
        return Err(Error::InvalidSquareSize {
            square_size,
            reason: SquareSizeError::TooSmall {
                shares: shares.len(),
                capacity,
            },
        });
    }

    let mut cursor = 0;
    let subtree_roots: Vec<Hash> = mountain_range(shares.len(), square_size)
        .into_iter()
        .map(|run| {
            let root = calculate_merkle_root(&shares[cursor..cursor + run]);
            cursor += run;
            root
        })
        .collect();
    Ok(calculate_merkle_root(&subtree_roots).into())
}

#[cfg(test)]
mod tests {
    use halite_core::namespace::TX_NAMESPACE;
    use quickcheck_macros::quickcheck;
    use rand::{thread_rng, Rng as _, RngCore as _};

    use super::*;

    const NAMESPACE: NamespaceId = NamespaceId::new([1, 1, 1, 1, 1, 1, 1, 1]);

    #[test]
    fn single_share_commitment() {
        let message = Message::new(NAMESPACE, vec![2u8; 20]).unwrap();
        let shares = split_message(&message);
        assert_eq!(shares.len(), 1);
        let expected = calculate_merkle_root(&[calculate_merkle_root(&shares)]);
        assert_eq!(
            message_commitment(&message, 4).unwrap(),
            Commitment::from(expected)
        );
    }

    #[test]
    fn commitment_depends_on_square_size() {
        let data = vec![4u8; 512 * 6];
        let at_four = create_commitment(4, NAMESPACE, &data).unwrap();
        let at_eight = create_commitment(8, NAMESPACE, &data).unwrap();
        assert_ne!(at_four, at_eight);
    }

    #[test]
    fn commitment_depends_on_namespace() {
        let data = [7u8; 100];
        let first = create_commitment(4, NAMESPACE, &data).unwrap();
        let second = create_commitment(4, NamespaceId::new([2; 8]), &data).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn rejects_unsupported_square_sizes() {
        for square_size in [0, 3, 6, 256] {
            assert!(matches!(
                create_commitment(square_size, NAMESPACE, &[1]),
                Err(Error::InvalidSquareSize {
                    reason: SquareSizeError::Unsupported,
                    ..
                })
            ));
        }
    }

    #[test]
    fn rejects_square_too_small() {
        // 16 shares of payload cannot fit next to the paying transaction
        let data = vec![0u8; 248 * 15];
        assert!(matches!(
            create_commitment(4, NAMESPACE, &data),
            Err(Error::InvalidSquareSize {
                square_size: 4,
                reason: SquareSizeError::TooSmall { capacity: 15, .. }
            })
        ));
        assert!(create_commitment(8, NAMESPACE, &data).is_ok());
        assert!(create_commitment(1, NAMESPACE, &[1]).is_err());
    }

    #[test]
    fn rejects_reserved_namespace() {
        assert!(matches!(
            create_commitment(4, TX_NAMESPACE, &[1]),
            Err(Error::Message(_))
        ));
    }

    #[test]
    fn single_byte_changes_commitment() {
        let mut rng = thread_rng();
        let mut data = vec![0u8; 1500];
        rng.fill_bytes(&mut data);
        let original = create_commitment(8, NAMESPACE, &data).unwrap();
        let position = rng.gen_range(0..data.len());
        data[position] ^= 0x01;
        assert_ne!(create_commitment(8, NAMESPACE, &data).unwrap(), original);
    }

    #[quickcheck]
    fn commitment_is_stable(data: Vec<u8>) -> bool {
        create_commitment(16, NAMESPACE, &data).ok() == create_commitment(16, NAMESPACE, &data).ok()
    }
}
