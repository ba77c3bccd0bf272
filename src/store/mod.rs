//! The boundary to the server's credential store.
//!
//! The credential store keeps the security configuration of every device,
//! whatever its security mode. This module defines the records and the
//! query the OSCORE layer needs, a reference in-memory store, and
//! `Lwm2mOscoreStore`, which turns store entries into `SecurityParameters`.

use core::fmt;

use crate::oscore::{MasterSecret, OscoreIdentity};

mod error;
mod memory;
mod oscore_store;

pub use error::StoreError;
pub use memory::InMemorySecurityStore;
pub use oscore_store::Lwm2mOscoreStore;

/// The result type for the `store` module.
pub type Result<T> = core::result::Result<T, StoreError>;

/// The OSCORE part of a device's security configuration, as stored.
///
/// Algorithms are kept as their COSE registry values, the interchange form
/// of the storage.
#[derive(Clone, PartialEq, Eq)]
pub struct OscoreSetting {
    sender_id: Vec<u8>,
    recipient_id: Vec<u8>,
    master_secret: MasterSecret,
    master_salt: Option<Vec<u8>>,
    aead_algorithm: i64,
    hmac_algorithm: i64,
}

impl OscoreSetting {
    /// Creates a new `OscoreSetting`.
    pub fn new(
        sender_id: Vec<u8>,
        recipient_id: Vec<u8>,
        master_secret: MasterSecret,
        master_salt: Option<Vec<u8>>,
        aead_algorithm: i64,
        hmac_algorithm: i64,
    ) -> OscoreSetting {
        OscoreSetting {
            sender_id,
            recipient_id,
            master_secret,
            master_salt,
            aead_algorithm,
            hmac_algorithm,
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

    pub fn aead_algorithm(&self) -> i64 {
        self.aead_algorithm
    }

    pub fn hmac_algorithm(&self) -> i64 {
        self.hmac_algorithm
    }

    /// Returns the identity this setting is looked up by.
    pub fn identity(&self) -> OscoreIdentity {
        OscoreIdentity::new(self.sender_id.clone(), self.recipient_id.clone())
    }
}

impl fmt::Debug for OscoreSetting {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OscoreSetting")
            .field("sender_id", &hex::encode(&self.sender_id))
            .field("recipient_id", &hex::encode(&self.recipient_id))
            .field("master_secret", &self.master_secret)
            .field("master_salt", &self.master_salt.as_ref().map(hex::encode))
            .field("aead_algorithm", &self.aead_algorithm)
            .field("hmac_algorithm", &self.hmac_algorithm)
            .finish()
    }
}

/// The security configuration of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityInfo {
    endpoint: String,
    oscore_setting: Option<OscoreSetting>,
    use_oscore: bool,
}

impl SecurityInfo {
    /// Creates a `SecurityInfo` for a device that doesn't use OSCORE.
    pub fn new(endpoint: String) -> SecurityInfo {
        SecurityInfo {
            endpoint,
            oscore_setting: None,
            use_oscore: false,
        }
    }

    /// Creates a `SecurityInfo` for a device using OSCORE.
    pub fn new_oscore(
        endpoint: String,
        setting: OscoreSetting,
    ) -> SecurityInfo {
        SecurityInfo {
            endpoint,
            oscore_setting: Some(setting),
            use_oscore: true,
        }
    }

    /// Keeps the OSCORE setting but turns its use on or off.
    pub fn with_oscore_enabled(mut self, enabled: bool) -> SecurityInfo {
        self.use_oscore = enabled && self.oscore_setting.is_some();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn oscore_setting(&self) -> Option<&OscoreSetting> {
        self.oscore_setting.as_ref()
    }

    /// Returns `true` if the device is supposed to talk OSCORE.
    pub fn use_oscore(&self) -> bool {
        self.use_oscore
    }
}

/// Read access to the credential store.
pub trait SecurityStore: Send + Sync {
    /// Returns the configuration of the device with this endpoint name.
    fn get_by_endpoint(&self, endpoint: &str) -> Option<SecurityInfo>;

    /// Returns the configuration whose OSCORE setting has these IDs.
    fn get_by_oscore_identity(
        &self,
        identity: &OscoreIdentity,
    ) -> Option<SecurityInfo>;
}

/// Gets told when a stored configuration stops being valid.
pub trait SecurityStoreListener: Send + Sync {
    /// Called after `info` was removed or replaced by a different one.
    fn security_info_removed(&self, info: &SecurityInfo);
}
