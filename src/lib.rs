//! [OSCORE](https://tools.ietf.org/html/rfc8613) security contexts for a
//! LWM2M server.
//!
//! Devices using OSCORE are provisioned with a master secret, an optional
//! master salt, their sender and recipient IDs and the algorithms to use.
//! This library turns those parameters into security contexts when the
//! first message of a device arrives, keeps one context per device for the
//! messages that follow, and derives a fresh one when asked to.
//!
//! The parameters come from the server's credential store through
//! [`store::Lwm2mOscoreStore`], which implements
//! [`oscore::ParameterStore`]. Contexts live in an [`oscore::ContextCache`],
//! which is safe to share between the threads handling incoming messages.
//!
//! ```ignore
//! let security_store = Arc::new(InMemorySecurityStore::new());
//! let cache = Arc::new(ContextCache::new(Lwm2mOscoreStore::new(
//!     security_store.clone(),
//! )));
//! // Drop contexts of devices whose configuration changes
//! security_store.add_listener(&cache);
//!
//! let context = cache.get_or_derive_context(&recipient_id, &sender_id)?;
//! let piv = context.next_piv()?;
//! ```
//!
//! CoAP message framing is not part of this library, contexts hand out the
//! keys, nonces, AAD and sequence numbers needed to protect and unprotect.

mod cbor;

pub mod oscore;
pub mod store;
