use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::namespace::NamespaceId;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Message namespace {0} is reserved")]
    ReservedNamespace(NamespaceId),
}

/// Opaque payload posted under a namespace.
///
/// Construction rejects reserved namespaces, so a `Message` always sorts after
/// the transaction and padding shares of a square.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMessage")]
pub struct Message {
    namespace: NamespaceId,
    data: Bytes,
}

#[derive(Deserialize)]
struct RawMessage {
    namespace: NamespaceId,
    data: Bytes,
}

impl TryFrom<RawMessage> for Message {
    type Error = Error;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        Self::new(raw.namespace, raw.data)
    }
}

impl Message {
    pub fn new(namespace: NamespaceId, data: impl Into<Bytes>) -> Result<Self, Error> {
        if namespace.is_reserved() {
            return Err(Error::ReservedNamespace(namespace));
        }
        Ok(Self {
            namespace,
            data: data.into(),
        })
    }

    #[must_use]
    pub const fn namespace(&self) -> NamespaceId {
        self.namespace
    }

    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
