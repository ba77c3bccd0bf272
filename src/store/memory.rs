use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak},
};

use crate::oscore::OscoreIdentity;

use super::{
    Result, SecurityInfo, SecurityStore, SecurityStoreListener, StoreError,
};

/// Credential store kept in memory, indexed by endpoint and by OSCORE
/// identity.
///
/// Listeners are held weakly and told about every entry that is removed or
/// replaced by a different one.
#[derive(Default)]
pub struct InMemorySecurityStore {
    entries: RwLock<Entries>,
    listeners: RwLock<Vec<Weak<dyn SecurityStoreListener>>>,
}

#[derive(Default)]
struct Entries {
    by_endpoint: HashMap<String, SecurityInfo>,
    // OSCORE identity -> endpoint
    by_oscore: HashMap<OscoreIdentity, String>,
}

impl InMemorySecurityStore {
    /// Creates an empty `InMemorySecurityStore`.
    pub fn new() -> InMemorySecurityStore {
        InMemorySecurityStore::default()
    }

    /// Adds or replaces the configuration of `info`'s endpoint, returning the
    /// previous one.
    ///
    /// Fails if the OSCORE identity is taken by another endpoint.
    pub fn add(&self, info: SecurityInfo) -> Result<Option<SecurityInfo>> {
        let previous = {
            let mut entries = write(&self.entries);

            let identity = info.oscore_setting().map(|s| s.identity());
            if let Some(identity) = &identity {
                match entries.by_oscore.get(identity) {
                    Some(owner) if owner != info.endpoint() => {
                        return Err(StoreError::NonUniqueOscoreIdentity {
                            identity: identity.clone(),
                            endpoint: owner.clone(),
                        });
                    }
                    _ => {}
                }
            }

            let endpoint = info.endpoint().to_owned();
            let previous =
                entries.by_endpoint.insert(endpoint.clone(), info.clone());
            if let Some(setting) =
                previous.as_ref().and_then(|p| p.oscore_setting())
            {
                entries.by_oscore.remove(&setting.identity());
            }
            if let Some(identity) = identity {
                entries.by_oscore.insert(identity, endpoint);
            }
            previous
        };

        if let Some(previous) = &previous {
            if *previous != info {
                self.notify(previous);
            }
        }
        Ok(previous)
    }

    /// Removes the configuration of the endpoint, returning it.
    pub fn remove(&self, endpoint: &str) -> Option<SecurityInfo> {
        let removed = {
            let mut entries = write(&self.entries);
            let removed = entries.by_endpoint.remove(endpoint)?;
            if let Some(setting) = removed.oscore_setting() {
                entries.by_oscore.remove(&setting.identity());
            }
            removed
        };

        self.notify(&removed);
        Some(removed)
    }

    /// Returns all stored configurations.
    pub fn get_all(&self) -> Vec<SecurityInfo> {
        read(&self.entries).by_endpoint.values().cloned().collect()
    }

    /// Registers a listener for removed and replaced configurations.
    ///
    /// Only a weak reference is kept, dropping the listener unregisters it.
    pub fn add_listener<L: SecurityStoreListener + 'static>(
        &self,
        listener: &Arc<L>,
    ) {
        let listener: Arc<dyn SecurityStoreListener> = listener.clone();
        write(&self.listeners).push(Arc::downgrade(&listener));
    }

    fn notify(&self, info: &SecurityInfo) {
        let listeners: Vec<_> = {
            let mut listeners = write(&self.listeners);
            listeners.retain(|l| l.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        log::debug!(
            "Security info of {} removed, notifying {} listener(s)",
            info.endpoint(),
            listeners.len()
        );
        for listener in listeners {
            listener.security_info_removed(info);
        }
    }
}

impl SecurityStore for InMemorySecurityStore {
    fn get_by_endpoint(&self, endpoint: &str) -> Option<SecurityInfo> {
        read(&self.entries).by_endpoint.get(endpoint).cloned()
    }

    fn get_by_oscore_identity(
        &self,
        identity: &OscoreIdentity,
    ) -> Option<SecurityInfo> {
        let entries = read(&self.entries);
        entries
            .by_oscore
            .get(identity)
            .and_then(|endpoint| entries.by_endpoint.get(endpoint))
            .cloned()
    }
}

// Every write leaves both maps consistent before anything can panic, so the
// poison flag is ignored
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
