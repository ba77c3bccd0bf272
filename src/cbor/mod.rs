//! Helpful functionality around the `serde_cbor` crate.

use serde::Serialize;

mod error;
pub use error::CborError;

/// The result type for the `cbor` module.
pub type Result<T> = core::result::Result<T, CborError>;

/// Serializes an object into CBOR.
///
/// Tuples become arrays, `()` and `None` become `null` and
/// `serde_bytes::Bytes` becomes a byte string, which is all the OSCORE
/// structures need.
pub fn encode(object: impl Serialize) -> Result<Vec<u8>> {
    Ok(serde_cbor::to_vec(&object)?)
}
