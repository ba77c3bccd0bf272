/// The error type for the `cbor` module.
#[derive(Debug, thiserror::Error)]
pub enum CborError {
    /// Wraps errors from `serde_cbor`.
    #[error("CBOR error: {0}")]
    SerdeCbor(#[from] serde_cbor::Error),
}
