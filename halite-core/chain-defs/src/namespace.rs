use crate::{
    consts::NAMESPACE_SIZE,
    utils::{display_hex_bytes_newtype, serde_bytes_newtype},
};

/// Identifier partitioning the share space of a square.
///
/// Namespaces compare byte-wise; every reserved namespace sorts before any
/// namespace a message may use.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NamespaceId([u8; NAMESPACE_SIZE]);

/// Namespace of transaction shares.
pub const TX_NAMESPACE: NamespaceId = NamespaceId([0, 0, 0, 0, 0, 0, 0, 1]);

/// Highest reserved namespace. Used for alignment gaps and the square tail.
pub const PADDING_NAMESPACE: NamespaceId = NamespaceId([0, 0, 0, 0, 0, 0, 0, 0xFF]);

pub const MAX_RESERVED_NAMESPACE: NamespaceId = PADDING_NAMESPACE;

impl NamespaceId {
    #[must_use]
    pub const fn new(bytes: [u8; NAMESPACE_SIZE]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; NAMESPACE_SIZE] {
        &self.0
    }

    #[must_use]
    pub fn is_reserved(&self) -> bool {
        *self <= MAX_RESERVED_NAMESPACE
    }
}

impl From<[u8; NAMESPACE_SIZE]> for NamespaceId {
    fn from(bytes: [u8; NAMESPACE_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<NamespaceId> for [u8; NAMESPACE_SIZE] {
    fn from(namespace: NamespaceId) -> Self {
        namespace.0
    }
}

impl AsRef<[u8]> for NamespaceId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for NamespaceId {
    type Error = Error;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        <[u8; NAMESPACE_SIZE]>::try_from(slice)
            .map(Self)
            .map_err(|_| Error::InvalidSize(slice.len()))
    }
}

display_hex_bytes_newtype!(NamespaceId);
serde_bytes_newtype!(NamespaceId, 8);

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid namespace size: {0}")]
    InvalidSize(usize),
}
