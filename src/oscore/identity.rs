use core::fmt;

use super::Result;

/// Identifies an OSCORE peer pair by its sender and recipient ID.
///
/// Equality and hashing go by the content of both IDs, so two identities
/// built from the same bytes are interchangeable map keys. An identity is
/// only a lookup key and never proves anything about the peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OscoreIdentity {
    sender_id: Vec<u8>,
    recipient_id: Vec<u8>,
}

impl OscoreIdentity {
    /// Creates a new `OscoreIdentity`.
    pub fn new(sender_id: Vec<u8>, recipient_id: Vec<u8>) -> OscoreIdentity {
        OscoreIdentity {
            sender_id,
            recipient_id,
        }
    }

    /// Creates an `OscoreIdentity` from hex-encoded IDs, for configuration
    /// and diagnostics.
    ///
    /// # Arguments
    /// * `sender_id` - The hex-encoded sender ID, may be empty.
    /// * `recipient_id` - The hex-encoded recipient ID, may be empty.
    pub fn from_hex(
        sender_id: &str,
        recipient_id: &str,
    ) -> Result<OscoreIdentity> {
        Ok(OscoreIdentity::new(
            hex::decode(sender_id)?,
            hex::decode(recipient_id)?,
        ))
    }

    /// Returns the sender ID.
    pub fn sender_id(&self) -> &[u8] {
        &self.sender_id
    }

    /// Returns the recipient ID.
    pub fn recipient_id(&self) -> &[u8] {
        &self.recipient_id
    }
}

impl fmt::Display for OscoreIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "OscoreIdentity [sender_id={}, recipient_id={}]",
            hex::encode(&self.sender_id),
            hex::encode(&self.recipient_id)
        )
    }
}
