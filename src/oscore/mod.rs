//! OSCORE security contexts, derived from pre-shared parameters and cached
//! per peer.

mod algorithm;
mod cache;
mod context;
mod error;
mod identity;
mod parameters;
mod replay;
#[cfg(test)]
mod test_vectors;
mod util;

pub use algorithm::{AeadAlgorithm, HkdfAlgorithm};
pub use cache::{ContextCache, ContextConfig};
pub use context::SecurityContext;
pub use error::Error;
pub use identity::OscoreIdentity;
pub use parameters::{MasterSecret, ParameterStore, SecurityParameters};
pub use replay::ReplayWindow;
pub use util::{format_piv, piv_to_u64, MAX_SEQUENCE_NUMBER};

/// The result type for the `oscore` module.
pub type Result<T> = core::result::Result<T, Error>;
