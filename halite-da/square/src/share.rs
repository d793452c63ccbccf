use bytes::{Bytes, BytesMut};
use halite_core::{
    consts::{NAMESPACE_SIZE, SHARE_SIZE},
    namespace::{NamespaceId, PADDING_NAMESPACE},
};

use crate::Error;

/// Fixed-size unit of square data. The first [`NAMESPACE_SIZE`] bytes hold the
/// namespace of the share.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Share(Bytes);

impl Share {
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self, Error> {
        let bytes = bytes.into();
        if bytes.len() != SHARE_SIZE {
            return Err(Error::InvalidShareSize(bytes.len()));
        }
        Ok(Self(bytes))
    }

    /// Builds a share from a namespace and up to `SHARE_SIZE - NAMESPACE_SIZE`
    /// bytes of content, zero padding the rest.
    pub(crate) fn from_parts(namespace: NamespaceId, content: &[u8]) -> Self {
        debug_assert!(content.len() <= SHARE_SIZE - NAMESPACE_SIZE);
        let mut buffer = BytesMut::zeroed(SHARE_SIZE);
        buffer[..NAMESPACE_SIZE].copy_from_slice(namespace.as_bytes());
        buffer[NAMESPACE_SIZE..NAMESPACE_SIZE + content.len()].copy_from_slice(content);
        Self(buffer.freeze())
    }

    #[must_use]
    pub fn padding() -> Self {
        Self::from_parts(PADDING_NAMESPACE, &[])
    }

    #[must_use]
    pub fn namespace(&self) -> NamespaceId {
        let mut namespace = [0u8; NAMESPACE_SIZE];
        namespace.copy_from_slice(&self.0[..NAMESPACE_SIZE]);
        NamespaceId::new(namespace)
    }

    /// Everything after the namespace prefix.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.0[NAMESPACE_SIZE..]
    }
}

impl AsRef<[u8]> for Share {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(Share::new(vec![0; 255]), Err(Error::InvalidShareSize(255)));
        assert_eq!(Share::new(vec![0; 257]), Err(Error::InvalidShareSize(257)));
        assert!(Share::new(vec![0; SHARE_SIZE]).is_ok());
    }

    #[test]
    fn from_parts_pads_with_zeroes() {
        let namespace = NamespaceId::new([4; 8]);
        let share = Share::from_parts(namespace, &[9, 9, 9]);
        assert_eq!(share.as_ref().len(), SHARE_SIZE);
        assert_eq!(share.namespace(), namespace);
        assert_eq!(&share.content()[..3], &[9, 9, 9]);
        assert!(share.content()[3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn padding_share_uses_reserved_namespace() {
        let padding = Share::padding();
        assert!(padding.namespace().is_reserved());
        assert!(padding.content().iter().all(|b| *b == 0));
    }
}
