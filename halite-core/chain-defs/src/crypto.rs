use blake2::digest::consts::U32;
pub use blake2::Digest;

pub type Hasher = blake2::Blake2b<U32>;
