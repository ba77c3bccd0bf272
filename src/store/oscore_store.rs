use core::convert::TryFrom;
use std::sync::Arc;

use crate::oscore::{
    self, AeadAlgorithm, HkdfAlgorithm, OscoreIdentity, ParameterStore,
    SecurityParameters,
};

use super::{OscoreSetting, SecurityStore};

/// Serves OSCORE parameters out of the server's credential store.
///
/// Holds no state of its own, every call is a fresh lookup.
pub struct Lwm2mOscoreStore {
    store: Arc<dyn SecurityStore>,
}

impl Lwm2mOscoreStore {
    /// Creates a new `Lwm2mOscoreStore` on top of `store`.
    pub fn new(store: Arc<dyn SecurityStore>) -> Lwm2mOscoreStore {
        Lwm2mOscoreStore { store }
    }
}

impl ParameterStore for Lwm2mOscoreStore {
    fn get_parameters(
        &self,
        recipient_id: &[u8],
        sender_id: &[u8],
    ) -> oscore::Result<Option<SecurityParameters>> {
        let identity =
            OscoreIdentity::new(sender_id.to_vec(), recipient_id.to_vec());
        let info = match self.store.get_by_oscore_identity(&identity) {
            Some(info) if info.use_oscore() => info,
            // Not provisioned, or configured for another security mode
            _ => return Ok(None),
        };
        let setting = match info.oscore_setting() {
            Some(setting) => setting,
            None => return Ok(None),
        };

        match SecurityParameters::try_from(setting) {
            Ok(params) => Ok(Some(params)),
            Err(e) => {
                log::warn!(
                    "OSCORE setting of endpoint {} is unusable: {}",
                    info.endpoint(),
                    e
                );
                Err(e)
            }
        }
    }
}

impl TryFrom<&OscoreSetting> for SecurityParameters {
    type Error = oscore::Error;

    /// Decodes the stored algorithms and copies everything else as is.
    fn try_from(setting: &OscoreSetting) -> oscore::Result<SecurityParameters> {
        Ok(SecurityParameters::new(
            setting.sender_id().to_vec(),
            setting.recipient_id().to_vec(),
            setting.master_secret().clone(),
            setting.master_salt().map(<[u8]>::to_vec),
            AeadAlgorithm::try_from(setting.aead_algorithm())?,
            HkdfAlgorithm::try_from(setting.hmac_algorithm())?,
        ))
    }
}

impl From<&SecurityParameters> for OscoreSetting {
    /// Encodes the algorithms into their stored form.
    fn from(params: &SecurityParameters) -> OscoreSetting {
        OscoreSetting::new(
            params.sender_id().to_vec(),
            params.recipient_id().to_vec(),
            params.master_secret().clone(),
            params.master_salt().map(<[u8]>::to_vec),
            i64::from(params.aead_algorithm()),
            i64::from(params.hkdf_algorithm()),
        )
    }
}
