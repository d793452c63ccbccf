//! Protocol-wide layout constants shared by every square producer and
//! validator. Changing any of these is a hard fork.

/// Length of a namespace identifier in bytes.
pub const NAMESPACE_SIZE: usize = 8;

/// Length of every share in the original and the extended square.
pub const SHARE_SIZE: usize = 256;

/// Transaction shares carry one extra byte after the namespace: the offset of
/// the first unit starting in that share.
pub const COMPACT_SHARE_RESERVED_BYTES: usize = 1;

/// Payload capacity of a transaction share.
pub const TX_SHARE_DATA_SIZE: usize = SHARE_SIZE - NAMESPACE_SIZE - COMPACT_SHARE_RESERVED_BYTES;

/// Payload capacity of a message share.
pub const MSG_SHARE_DATA_SIZE: usize = SHARE_SIZE - NAMESPACE_SIZE;

pub const MIN_SQUARE_SIZE: usize = 1;

/// Bounded by the GF(2^8) shard limit: an extended row holds `2 * k <= 256`
/// shares.
pub const MAX_SQUARE_SIZE: usize = 128;

/// Upper bound accepted when decoding a single transaction.
pub const MAX_TX_SIZE: u64 = 2 * 1024 * 1024;

/// Returns `true` for the square sizes the protocol supports.
#[must_use]
pub const fn is_supported_square_size(square_size: usize) -> bool {
    square_size >= MIN_SQUARE_SIZE
        && square_size <= MAX_SQUARE_SIZE
        && square_size.is_power_of_two()
}
