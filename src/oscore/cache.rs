//! Lazily derived security contexts, one per peer.
//!
//! Lookups of a context that already exists only take the read side of the
//! map lock. The first lookup for a peer inserts an empty slot and derives
//! the context into it without holding the map lock, so a slow parameter
//! store only holds up callers asking for that same peer. Those callers
//! block on the slot and receive the outcome of that single derivation.

use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{
        Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use crate::store::{SecurityInfo, SecurityStoreListener};

use super::{
    Error, OscoreIdentity, ParameterStore, Result, SecurityContext,
    SecurityParameters,
};

/// Settings applied to every derived context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Number of sequence numbers below the highest received one that are
    /// still accepted. Clamped to `1..=64`.
    pub replay_window_size: u32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            replay_window_size: 32,
        }
    }
}

/// Holds the outcome of the one derivation for a peer.
type Slot = Arc<OnceLock<Result<Arc<SecurityContext>>>>;

/// Derives security contexts on first use and keeps them for later
/// messages.
pub struct ContextCache<S> {
    store: S,
    config: ContextConfig,
    contexts: RwLock<HashMap<OscoreIdentity, Slot>>,
}

impl<S: ParameterStore> ContextCache<S> {
    /// Creates an empty `ContextCache` with the default configuration.
    pub fn new(store: S) -> ContextCache<S> {
        ContextCache::with_config(store, ContextConfig::default())
    }

    /// Creates an empty `ContextCache`.
    ///
    /// # Arguments
    /// * `store` - Where parameters of peers without a context come from.
    /// * `config` - Settings for the derived contexts.
    pub fn with_config(store: S, config: ContextConfig) -> ContextCache<S> {
        ContextCache {
            store,
            config,
            contexts: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> ContextConfig {
        self.config
    }

    /// Returns the context for the peer, deriving it if there is none yet.
    ///
    /// # Arguments
    /// * `recipient_id` - The recipient ID carried by the message.
    /// * `sender_id` - The sender ID carried by the message.
    pub fn get_or_derive_context(
        &self,
        recipient_id: &[u8],
        sender_id: &[u8],
    ) -> Result<Arc<SecurityContext>> {
        let identity =
            OscoreIdentity::new(sender_id.to_vec(), recipient_id.to_vec());

        // Fast path for every message after the first one
        if let Some(Some(Ok(context))) =
            self.read().get(&identity).map(|slot| slot.get())
        {
            log::trace!("Using cached security context for {}", identity);
            return Ok(Arc::clone(context));
        }

        // Either there's no slot yet or someone else is filling it
        let slot =
            Arc::clone(self.write().entry(identity.clone()).or_default());
        self.resolve(&identity, &slot)
    }

    /// Throws away the context for the peer, if any, and derives a fresh one
    /// from the current parameters.
    ///
    /// The new context starts over with sequence number 0 and an empty
    /// replay window. Without a cached context this is the same as
    /// `get_or_derive_context`.
    ///
    /// Concurrent calls for the same peer share one replacement: a call
    /// that finds a derivation under way, or a context that was put in
    /// place after the call started, returns that one instead of deriving
    /// yet another.
    pub fn rederive_context(
        &self,
        recipient_id: &[u8],
        sender_id: &[u8],
    ) -> Result<Arc<SecurityContext>> {
        let identity =
            OscoreIdentity::new(sender_id.to_vec(), recipient_id.to_vec());

        // The slot this call is asked to replace
        let seen = self.read().get(&identity).cloned();

        let slot = {
            let mut contexts = self.write();
            let joined = match contexts.get(&identity) {
                Some(current) if current.get().is_none() => {
                    Some(Arc::clone(current))
                }
                Some(current)
                    if !seen
                        .as_ref()
                        .map_or(false, |seen| Arc::ptr_eq(seen, current)) =>
                {
                    Some(Arc::clone(current))
                }
                _ => None,
            };
            match joined {
                Some(slot) => {
                    log::trace!(
                        "Joining pending rederivation for {}",
                        identity
                    );
                    slot
                }
                None => {
                    let slot = Slot::default();
                    let previous =
                        contexts.insert(identity.clone(), Arc::clone(&slot));
                    if previous.is_some() {
                        log::debug!(
                            "Rederiving security context for {}",
                            identity
                        );
                    }
                    slot
                }
            }
        };
        self.resolve(&identity, &slot)
    }

    /// Removes the context for the peer, returning whether there was one.
    pub fn invalidate(&self, recipient_id: &[u8], sender_id: &[u8]) -> bool {
        self.invalidate_identity(&OscoreIdentity::new(
            sender_id.to_vec(),
            recipient_id.to_vec(),
        ))
    }

    /// Removes the context stored under `identity`, returning whether there
    /// was one.
    pub fn invalidate_identity(&self, identity: &OscoreIdentity) -> bool {
        let removed = self.write().remove(identity).is_some();
        if removed {
            log::debug!("Invalidated security context for {}", identity);
        }
        removed
    }

    /// Returns `true` if a derived context for the peer is cached.
    pub fn contains(&self, recipient_id: &[u8], sender_id: &[u8]) -> bool {
        let identity =
            OscoreIdentity::new(sender_id.to_vec(), recipient_id.to_vec());
        matches!(
            self.read().get(&identity).map(|slot| slot.get()),
            Some(Some(Ok(_)))
        )
    }

    /// Removes all contexts.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Returns the number of peers with a context or one being derived.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns the outcome of the slot's derivation, running it if nobody
    /// has yet.
    fn resolve(
        &self,
        identity: &OscoreIdentity,
        slot: &Slot,
    ) -> Result<Arc<SecurityContext>> {
        match slot.get_or_init(|| self.derive(identity)) {
            Ok(context) => Ok(Arc::clone(context)),
            Err(e) => {
                // Failures aren't kept, the next lookup asks the store again
                self.discard(identity, slot);
                Err(e.clone())
            }
        }
    }

    fn derive(
        &self,
        identity: &OscoreIdentity,
    ) -> Result<Arc<SecurityContext>> {
        let params = match self
            .store
            .get_parameters(identity.recipient_id(), identity.sender_id())
        {
            Ok(Some(params)) => params,
            Ok(None) => {
                log::debug!("No OSCORE parameters for {}", identity);
                return Err(Error::UnknownPeer(identity.clone()));
            }
            Err(e) => {
                log::warn!(
                    "Can't derive security context for {}: {}",
                    identity,
                    e
                );
                return Err(e);
            }
        };

        let derived =
            SecurityContext::derive(&params, self.config.replay_window_size);
        match derived {
            Ok(context) => {
                log::debug!("Derived security context for {}", identity);
                Ok(Arc::new(context))
            }
            Err(e) => {
                log::error!(
                    "Can't derive security context for {} ({}): {}",
                    identity,
                    Shape(&params),
                    e
                );
                Err(e)
            }
        }
    }

    /// Removes the slot, unless it has been replaced in the meantime.
    fn discard(&self, identity: &OscoreIdentity, slot: &Slot) {
        let mut contexts = self.write();
        if contexts
            .get(identity)
            .map_or(false, |current| Arc::ptr_eq(current, slot))
        {
            contexts.remove(identity);
        }
    }

    // The map stays consistent even if a thread panicked while holding the
    // lock, so the poison flag is ignored
    fn read(&self) -> RwLockReadGuard<'_, HashMap<OscoreIdentity, Slot>> {
        self.contexts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<OscoreIdentity, Slot>> {
        self.contexts.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: ParameterStore> SecurityStoreListener for ContextCache<S> {
    fn security_info_removed(&self, info: &SecurityInfo) {
        if let Some(setting) = info.oscore_setting() {
            self.invalidate_identity(&setting.identity());
        }
    }
}

/// Formats the lengths and algorithms of parameters, never their content.
struct Shape<'a>(&'a SecurityParameters);

impl core::fmt::Display for Shape<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let params = self.0;
        write!(
            f,
            "sender ID {} bytes, recipient ID {} bytes, master secret {} \
             bytes, master salt {} bytes, AEAD {}, HKDF {}",
            params.sender_id().len(),
            params.recipient_id().len(),
            params.master_secret().len(),
            params.master_salt().map_or(0, <[u8]>::len),
            i64::from(params.aead_algorithm()),
            i64::from(params.hkdf_algorithm()),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Barrier, Mutex,
        },
        thread,
        time::Duration,
    };

    use super::super::{
        test_vectors::*, AeadAlgorithm, HkdfAlgorithm, MasterSecret,
    };
    use super::*;

    /// Parameter store over a plain map that counts and optionally slows
    /// down its lookups.
    #[derive(Default)]
    struct CountingStore {
        parameters: Mutex<HashMap<OscoreIdentity, Result<SecurityParameters>>>,
        lookups: AtomicUsize,
        delay: Option<Duration>,
    }

    impl CountingStore {
        fn with_peer(params: SecurityParameters) -> CountingStore {
            let store = CountingStore::default();
            store.set(params);
            store
        }

        fn set(&self, params: SecurityParameters) {
            let identity = OscoreIdentity::new(
                params.sender_id().to_vec(),
                params.recipient_id().to_vec(),
            );
            self.parameters.lock().unwrap().insert(identity, Ok(params));
        }

        fn set_failure(&self, identity: OscoreIdentity, error: Error) {
            self.parameters.lock().unwrap().insert(identity, Err(error));
        }

        fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    impl ParameterStore for CountingStore {
        fn get_parameters(
            &self,
            recipient_id: &[u8],
            sender_id: &[u8],
        ) -> Result<Option<SecurityParameters>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                thread::sleep(delay);
            }
            let identity =
                OscoreIdentity::new(sender_id.to_vec(), recipient_id.to_vec());
            self.parameters
                .lock()
                .unwrap()
                .get(&identity)
                .cloned()
                .transpose()
        }
    }

    fn peer(secret: &[u8]) -> SecurityParameters {
        SecurityParameters::new(
            PEER_SENDER_ID.to_vec(),
            PEER_RECIPIENT_ID.to_vec(),
            MasterSecret::new(secret.to_vec()),
            None,
            AeadAlgorithm::AesCcm16_64_128,
            HkdfAlgorithm::HkdfSha256,
        )
    }

    #[test]
    fn derive_and_cache() {
        let cache = ContextCache::new(CountingStore::with_peer(peer(
            &MASTER_SECRET,
        )));
        assert!(cache.is_empty());

        let first = cache
            .get_or_derive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .unwrap();
        assert_eq!(&PEER_SENDER_KEY, first.sender_key());
        assert_eq!(&PEER_RECIPIENT_KEY, first.recipient_key());
        assert_eq!(&PEER_COMMON_IV, first.common_iv());
        assert_eq!(0, first.sender_sequence_number());

        let second = cache
            .get_or_derive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(1, cache.store().lookups());
        assert_eq!(1, cache.len());
        assert!(cache.contains(&PEER_RECIPIENT_ID, &PEER_SENDER_ID));
    }

    #[test]
    fn unknown_peer() {
        let cache = ContextCache::new(CountingStore::with_peer(peer(
            &MASTER_SECRET,
        )));
        assert_eq!(
            Error::UnknownPeer(OscoreIdentity::new(vec![0x01], vec![0x99])),
            cache.get_or_derive_context(&[0x99], &[0x01]).unwrap_err()
        );
        // Nothing is kept for the unknown peer
        assert!(cache.is_empty());

        // Once provisioned, the next lookup finds it
        cache.store().set(SecurityParameters::new(
            vec![0x01],
            vec![0x99],
            MasterSecret::new(MASTER_SECRET.to_vec()),
            None,
            AeadAlgorithm::AesCcm16_64_128,
            HkdfAlgorithm::HkdfSha256,
        ));
        assert!(cache.get_or_derive_context(&[0x99], &[0x01]).is_ok());
        assert_eq!(2, cache.store().lookups());
    }

    #[test]
    fn failing_peer_does_not_affect_others() {
        let store = CountingStore::with_peer(peer(&MASTER_SECRET));
        store.set_failure(
            OscoreIdentity::new(vec![0x05], vec![0x06]),
            Error::UnsupportedAlgorithm(11),
        );
        let cache = ContextCache::new(store);

        assert_eq!(
            Error::UnsupportedAlgorithm(11),
            cache.get_or_derive_context(&[0x06], &[0x05]).unwrap_err()
        );
        assert!(cache
            .get_or_derive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .is_ok());
        // Still failing until the entry is corrected
        assert_eq!(
            Error::UnsupportedAlgorithm(11),
            cache.get_or_derive_context(&[0x06], &[0x05]).unwrap_err()
        );
        assert_eq!(1, cache.len());
    }

    #[test]
    fn derivation_failure_not_cached() {
        // Sender ID too long for the AES-CCM-64 nonce
        let params = SecurityParameters::new(
            vec![0x01, 0x02],
            vec![0x03],
            MasterSecret::new(MASTER_SECRET.to_vec()),
            None,
            AeadAlgorithm::AesCcm64_64_128,
            HkdfAlgorithm::HkdfSha256,
        );
        let cache = ContextCache::new(CountingStore::with_peer(params));
        assert!(matches!(
            cache.get_or_derive_context(&[0x03], &[0x01, 0x02]),
            Err(Error::DerivationFailure(_))
        ));
        assert!(!cache.contains(&[0x03], &[0x01, 0x02]));
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_derivation_is_coalesced() {
        let store = CountingStore {
            delay: Some(Duration::from_millis(50)),
            ..CountingStore::default()
        };
        store.set(peer(&MASTER_SECRET));
        let cache = Arc::new(ContextCache::new(store));
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_derive_context(
                            &PEER_RECIPIENT_ID,
                            &PEER_SENDER_ID,
                        )
                        .unwrap()
                })
            })
            .collect();
        let contexts: Vec<_> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(1, cache.store().lookups());
        for context in &contexts[1..] {
            assert!(Arc::ptr_eq(&contexts[0], context));
        }
    }

    #[test]
    fn concurrent_failure_is_shared() {
        let store = CountingStore {
            delay: Some(Duration::from_millis(50)),
            ..CountingStore::default()
        };
        let cache = Arc::new(ContextCache::new(store));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.get_or_derive_context(&[0x02], &[0x01]).unwrap_err()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(
                Error::UnknownPeer(OscoreIdentity::new(vec![0x01], vec![0x02])),
                handle.join().unwrap()
            );
        }
        // Threads that arrived after the failure was discarded ask again, so
        // the count is only bounded, not exact
        assert!(cache.store().lookups() >= 1);
        assert!(cache.store().lookups() <= 8);
        assert!(cache.is_empty());
    }

    #[test]
    fn slow_peer_does_not_block_others() {
        let store = CountingStore {
            delay: Some(Duration::from_millis(1000)),
            ..CountingStore::default()
        };
        store.set(peer(&MASTER_SECRET));
        let cache = Arc::new(ContextCache::new(store));

        // Nobody will ever derive this one again, so prefill it
        let other = OscoreIdentity::new(vec![0x07], vec![0x08]);
        let ready: Slot = Slot::default();
        let _ = ready.set(Ok(Arc::new(
            SecurityContext::derive(&peer(&MASTER_SECRET), 32).unwrap(),
        )));
        cache.write().insert(other, ready);

        let slow = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                cache.get_or_derive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            })
        };
        thread::sleep(Duration::from_millis(50));
        // Answered from the cache while the slow derivation is ongoing
        assert!(cache.contains(&[0x08], &[0x07]));
        assert!(cache.get_or_derive_context(&[0x08], &[0x07]).is_ok());
        assert!(!slow.is_finished());
        assert!(slow.join().unwrap().is_ok());
    }

    #[test]
    fn rederive() {
        let cache = ContextCache::new(CountingStore::with_peer(peer(
            &MASTER_SECRET,
        )));
        let old = cache
            .get_or_derive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .unwrap();
        old.next_sequence_number().unwrap();
        old.next_sequence_number().unwrap();
        assert!(old.check_replay(3));

        let new = cache
            .rederive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .unwrap();
        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(old.sender_key(), new.sender_key());
        assert_eq!(0, new.sender_sequence_number());
        assert_eq!(None, new.highest_received());
        assert_eq!(2, cache.store().lookups());

        // The rederived context is the one served from now on
        let current = cache
            .get_or_derive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .unwrap();
        assert!(Arc::ptr_eq(&new, &current));
    }

    #[test]
    fn concurrent_rederivation_is_coalesced() {
        let store = CountingStore {
            delay: Some(Duration::from_millis(200)),
            ..CountingStore::default()
        };
        store.set(peer(&MASTER_SECRET));
        let cache = Arc::new(ContextCache::new(store));
        let old = cache
            .get_or_derive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .rederive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
                        .unwrap()
                })
            })
            .collect();
        let contexts: Vec<_> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        // One replacement, handed to both and served from now on
        assert!(Arc::ptr_eq(&contexts[0], &contexts[1]));
        assert!(!Arc::ptr_eq(&old, &contexts[0]));
        assert_eq!(2, cache.store().lookups());
        let current = cache
            .get_or_derive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .unwrap();
        assert!(Arc::ptr_eq(&contexts[0], &current));

        // Sequence numbers aren't handed out twice
        assert_eq!(0, contexts[0].next_sequence_number().unwrap());
        assert_eq!(1, contexts[1].next_sequence_number().unwrap());

        // A later rederivation replaces it again
        let later = cache
            .rederive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .unwrap();
        assert!(!Arc::ptr_eq(&current, &later));
        assert_eq!(3, cache.store().lookups());
    }

    #[test]
    fn rederive_without_context() {
        let cache = ContextCache::new(CountingStore::with_peer(peer(
            &MASTER_SECRET,
        )));
        let context = cache
            .rederive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .unwrap();
        assert_eq!(&PEER_SENDER_KEY, context.sender_key());
        assert_eq!(1, cache.len());

        assert_eq!(
            Error::UnknownPeer(OscoreIdentity::new(vec![0x01], vec![0x99])),
            cache.rederive_context(&[0x99], &[0x01]).unwrap_err()
        );
        assert_eq!(1, cache.len());
    }

    #[test]
    fn rederive_picks_up_new_parameters() {
        let cache = ContextCache::new(CountingStore::with_peer(peer(
            &MASTER_SECRET,
        )));
        let old = cache
            .get_or_derive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .unwrap();
        cache.store().set(peer(&[0x42; 16]));

        let new = cache
            .rederive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .unwrap();
        assert_ne!(old.sender_key(), new.sender_key());
    }

    #[test]
    fn invalidation() {
        let cache = ContextCache::new(CountingStore::with_peer(peer(
            &MASTER_SECRET,
        )));
        let old = cache
            .get_or_derive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .unwrap();
        assert!(cache.invalidate(&PEER_RECIPIENT_ID, &PEER_SENDER_ID));
        assert!(!cache.invalidate(&PEER_RECIPIENT_ID, &PEER_SENDER_ID));

        // Rotated secret is picked up on the next access
        cache.store().set(peer(&[0x42; 16]));
        let new = cache
            .get_or_derive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .unwrap();
        assert_ne!(old.sender_key(), new.sender_key());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn replay_window_from_config() {
        let cache = ContextCache::with_config(
            CountingStore::with_peer(peer(&MASTER_SECRET)),
            ContextConfig {
                replay_window_size: 4,
            },
        );
        let context = cache
            .get_or_derive_context(&PEER_RECIPIENT_ID, &PEER_SENDER_ID)
            .unwrap();
        assert!(context.check_replay(10));
        assert!(context.check_replay(7));
        assert!(!context.check_replay(6));
    }

    #[test]
    fn config_defaults() {
        // An empty CBOR map leaves everything at its default
        let config: ContextConfig = serde_cbor::from_slice(&[0xA0]).unwrap();
        assert_eq!(ContextConfig::default(), config);
        assert_eq!(32, config.replay_window_size);
    }
}
