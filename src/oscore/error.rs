use crate::cbor;

use super::OscoreIdentity;

/// The catch-all error type for this module.
///
/// It is `Clone` because a single failed derivation is handed to every
/// caller that was waiting on it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// No OSCORE parameters are provisioned for this peer, or the peer is
    /// not configured for OSCORE.
    #[error("No OSCORE parameters for {0}")]
    UnknownPeer(OscoreIdentity),
    /// An identity could not be built from its textual form.
    #[error("Malformed OSCORE identity: {0}")]
    MalformedIdentity(#[from] hex::FromHexError),
    /// The stored COSE algorithm identifier is not supported by this build.
    #[error("Unsupported COSE algorithm {0}")]
    UnsupportedAlgorithm(i64),
    /// Key derivation rejected otherwise well-formed parameters.
    #[error("Unable to derive security context: {0}")]
    DerivationFailure(&'static str),
    /// The sender sequence number can't grow any further without reusing
    /// a nonce.
    #[error("Sender sequence number exhausted")]
    SequenceNumberExhausted,
    /// Error using the AEAD.
    #[error("Error using AEAD")]
    Aead,
    /// Wraps errors from the `cbor` module.
    #[error("{0}")]
    Cbor(String),
}

impl From<cbor::CborError> for Error {
    fn from(e: cbor::CborError) -> Error {
        Error::Cbor(e.to_string())
    }
}

impl From<ccm::aead::Error> for Error {
    fn from(_: ccm::aead::Error) -> Error {
        Error::Aead
    }
}
