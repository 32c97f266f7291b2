//! Keyed cache of connected clients.
//!
//! Owned by the calling layer, not by the resolver: identical connection
//! requests map to the same client handle, built once. The key is the
//! request itself, whose option bag is ordered, so option insertion order
//! does not matter.

use crate::request::ConnectionRequest;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Per-request slot; empty while the client is being built.
type Slot<C> = Arc<Mutex<Option<Arc<C>>>>;

/// Cache of client handles keyed by the request that built them.
pub struct ConnectionCache<C> {
    entries: Mutex<HashMap<ConnectionRequest, Slot<C>>>,
}

impl<C> Default for ConnectionCache<C> {
    fn default() -> Self {
        ConnectionCache {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<C> fmt::Debug for ConnectionCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCache")
            .field("len", &self.len())
            .finish()
    }
}

impl<C> ConnectionCache<C> {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, request: &ConnectionRequest) -> Slot<C> {
        let mut entries = self.entries.lock();
        Arc::clone(entries.entry(request.clone()).or_default())
    }

    /// Get the client cached for `request`.
    ///
    /// Waits if the client for `request` is still being built.
    pub fn get(&self, request: &ConnectionRequest) -> Option<Arc<C>> {
        let slot = self.entries.lock().get(request).cloned()?;
        let client = slot.lock().clone();
        client
    }

    /// Get the client cached for `request`, building it with `create` if
    /// there is none.
    ///
    /// Only calls for the same request wait on each other; `create` runs
    /// without holding the cache-wide lock. A failed `create` caches nothing.
    pub fn get_or_try_insert_with<F, E>(
        &self,
        request: &ConnectionRequest,
        create: F,
    ) -> Result<Arc<C>, E>
    where
        F: FnOnce(ConnectionRequest) -> Result<C, E>,
    {
        let slot = self.slot(request);
        let mut client = slot.lock();
        if let Some(client) = client.as_ref() {
            return Ok(Arc::clone(client));
        }

        match create(request.clone()) {
            Ok(created) => {
                let created = Arc::new(created);
                *client = Some(Arc::clone(&created));
                Ok(created)
            }
            Err(e) => {
                drop(client);
                self.discard_empty(request, &slot);
                Err(e)
            }
        }
    }

    /// Drop `slot` if it is still the entry for `request` and nobody filled
    /// or claimed it in the meantime.
    fn discard_empty(&self, request: &ConnectionRequest, slot: &Slot<C>) {
        let mut entries = self.entries.lock();
        let unused = entries
            .get(request)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
            && slot.try_lock().is_some_and(|client| client.is_none());
        if unused {
            entries.remove(request);
        }
    }

    /// Drop the client cached for `request`.
    pub fn remove(&self, request: &ConnectionRequest) -> Option<Arc<C>> {
        let slot = self.entries.lock().remove(request)?;
        let client = slot.lock().clone();
        client
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached requests, counting clients still being built.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
