//! In-memory content store
//!
//! The [`ContentStore`] is the single writable source of truth the
//! presentation layer reads from. Documents are replaced atomically through
//! [`ContentStore::set`], which notifies every subscriber synchronously and
//! exhaustively before returning, so observers never see a torn update.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::document::ContentDocument;
use crate::error::SyncResult;
use crate::local::LocalStore;

/// Handle returned by [`ContentStore::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Listener = Arc<dyn Fn(&ContentDocument) + Send + Sync>;

/// Holder of the currently applied content document
pub struct ContentStore {
    current: Mutex<ContentDocument>,
    subscribers: Mutex<Vec<(SubscriberId, Listener)>>,
    next_id: AtomicU64,
    /// Durable mirror of the applied document, when configured
    local: Option<LocalStore>,
}

impl ContentStore {
    /// Create a store holding the bundled default document
    pub fn new() -> Self {
        Self {
            current: Mutex::new(ContentDocument::default()),
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            local: None,
        }
    }

    /// Create a store backed by durable storage
    ///
    /// Restores the last applied document if one was persisted; otherwise
    /// starts from the bundled default. Applied documents are mirrored back
    /// to storage on every [`ContentStore::set`].
    pub fn with_local(local: LocalStore) -> SyncResult<Self> {
        let current = local.load_content()?.unwrap_or_default();
        Ok(Self {
            current: Mutex::new(current),
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            local: Some(local),
        })
    }

    /// The last applied document (bundled default if none applied yet)
    pub fn get(&self) -> ContentDocument {
        self.current.lock().expect("content lock poisoned").clone()
    }

    /// Atomically replace the document and notify all subscribers
    ///
    /// Notification runs synchronously on the caller. A listener that was
    /// unsubscribed during this notification may still receive it; listeners
    /// added during it will not.
    pub fn set(&self, document: ContentDocument) {
        {
            let mut current = self.current.lock().expect("content lock poisoned");
            *current = document.clone();
        }

        if let Some(ref local) = self.local {
            if let Err(e) = local.save_content(&document) {
                warn!("Failed to persist applied content: {}", e);
            }
        }

        // Snapshot outside the lock so listeners can subscribe/unsubscribe
        // from inside their callback without deadlocking.
        let snapshot: Vec<Listener> = {
            let subs = self.subscribers.lock().expect("subscriber lock poisoned");
            subs.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in snapshot {
            listener(&document);
        }
    }

    /// Register a listener called on every applied document
    pub fn subscribe<F>(&self, listener: F) -> SubscriberId
    where
        F: Fn(&ContentDocument) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; idempotent
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .retain(|(sid, _)| *sid != id);
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .len()
    }
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::new()
    }
}
