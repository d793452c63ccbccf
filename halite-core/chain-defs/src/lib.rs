pub mod block;
pub mod consts;
pub mod crypto;
pub mod message;
pub mod namespace;
pub mod tx;
pub mod utils;
pub mod wire;

pub use block::{BlockData, CandidateBlock, DataHash};
pub use message::Message;
pub use namespace::NamespaceId;
pub use tx::{Commitment, Transaction};

/// Output of every hash and Merkle root used by the protocol.
pub type Hash = [u8; 32];
