use crate::oscore::OscoreIdentity;

/// The error type for the `store` module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Another endpoint already uses this OSCORE identity.
    #[error("{identity} is already used by endpoint {endpoint}")]
    NonUniqueOscoreIdentity {
        identity: OscoreIdentity,
        endpoint: String,
    },
}
