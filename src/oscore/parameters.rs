use core::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{AeadAlgorithm, HkdfAlgorithm, Result};

/// The pre-shared master secret.
///
/// Wiped on drop and never printed.
#[derive(Clone, PartialEq, Eq, Hash, Zeroize, ZeroizeOnDrop)]
pub struct MasterSecret(Vec<u8>);

impl MasterSecret {
    /// Wraps the secret bytes.
    pub fn new(bytes: Vec<u8>) -> MasterSecret {
        MasterSecret(bytes)
    }

    /// Returns the secret bytes.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the secret in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MasterSecret(<{} bytes>)", self.0.len())
    }
}

/// The raw pre-shared OSCORE input for one peer pair.
///
/// Immutable once built. A changed parameter means a new
/// `SecurityParameters` and a newly derived context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecurityParameters {
    sender_id: Vec<u8>,
    recipient_id: Vec<u8>,
    master_secret: MasterSecret,
    master_salt: Option<Vec<u8>>,
    aead_algorithm: AeadAlgorithm,
    hkdf_algorithm: HkdfAlgorithm,
}

impl SecurityParameters {
    /// Creates new `SecurityParameters`.
    pub fn new(
        sender_id: Vec<u8>,
        recipient_id: Vec<u8>,
        master_secret: MasterSecret,
        master_salt: Option<Vec<u8>>,
        aead_algorithm: AeadAlgorithm,
        hkdf_algorithm: HkdfAlgorithm,
    ) -> SecurityParameters {
        SecurityParameters {
            sender_id,
            recipient_id,
            master_secret,
            master_salt,
            aead_algorithm,
            hkdf_algorithm,
        }
    }

    pub fn sender_id(&self) -> &[u8] {
        &self.sender_id
    }

    pub fn recipient_id(&self) -> &[u8] {
        &self.recipient_id
    }

    pub fn master_secret(&self) -> &MasterSecret {
        &self.master_secret
    }

    pub fn master_salt(&self) -> Option<&[u8]> {
        self.master_salt.as_deref()
    }

    pub fn aead_algorithm(&self) -> AeadAlgorithm {
        self.aead_algorithm
    }

    pub fn hkdf_algorithm(&self) -> HkdfAlgorithm {
        self.hkdf_algorithm
    }
}

/// Source of OSCORE parameters for a peer.
///
/// `Ok(None)` means the peer isn't provisioned for OSCORE, which is an
/// expected answer and not a failure. Implementations are queried
/// concurrently from message handling threads and must only consult local
/// state.
pub trait ParameterStore: Send + Sync {
    /// Returns the parameters for the peer with these IDs, if any.
    ///
    /// # Arguments
    /// * `recipient_id` - The recipient ID carried by the message.
    /// * `sender_id` - The sender ID carried by the message.
    fn get_parameters(
        &self,
        recipient_id: &[u8],
        sender_id: &[u8],
    ) -> Result<Option<SecurityParameters>>;
}
