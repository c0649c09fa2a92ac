use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::registry::SessionRegistry;
use super::types::{Message, SessionId};
use crate::constants::ACTIVE_SESSION_KEY;
use crate::store::{KeyValueStore, StoreError};

/// Tracks which session is selected and keeps the persisted pointer current.
///
/// Whenever the tracker hands out an id, that id exists in the registry.
pub struct ActiveSessionTracker {
    store: Arc<dyn KeyValueStore>,
    active: Option<SessionId>,
    failures: Vec<StoreError>,
}

impl ActiveSessionTracker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            active: None,
            failures: Vec::new(),
        }
    }

    /// The active session id, resolving it on first use.
    ///
    /// The persisted pointer is adopted if it names a known session;
    /// otherwise a fresh session is created and adopted.
    pub fn get_active(&mut self, registry: &mut SessionRegistry) -> SessionId {
        if let Some(id) = self.active.as_ref().filter(|id| registry.contains(id)) {
            return id.clone();
        }

        if self.active.is_none() {
            if let Some(id) = self.read_pointer().filter(|id| registry.contains(id)) {
                debug!(session = %id, "restored active session");
                self.active = Some(id.clone());
                return id;
            }
        }

        self.reset_to_new_session(registry)
    }

    /// Peek at the adopted id without resolving or creating anything
    pub fn current(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Select `id` and return its messages.
    ///
    /// An unknown id yields an empty view and leaves both the pointer and
    /// storage untouched.
    pub fn switch_to(&mut self, registry: &SessionRegistry, id: &str) -> Vec<Message> {
        let Some(messages) = registry.messages(id) else {
            debug!(session = %id, "switch to unknown session ignored");
            return Vec::new();
        };

        self.adopt(id.to_string());
        messages.to_vec()
    }

    /// Create a fresh session with a default label and make it active
    pub fn reset_to_new_session(&mut self, registry: &mut SessionRegistry) -> SessionId {
        let id = registry.create_session(None);
        self.adopt(id.clone());
        id
    }

    /// Drain the write failures recorded since the last call
    pub fn take_persistence_failures(&mut self) -> Vec<StoreError> {
        std::mem::take(&mut self.failures)
    }

    pub(crate) fn adopt(&mut self, id: SessionId) {
        if let Err(e) = self
            .store
            .set(ACTIVE_SESSION_KEY, &Value::String(id.clone()))
        {
            warn!("⚠️  Failed to persist active session: {}", e);
            self.failures.push(e);
        }
        self.active = Some(id);
    }

    fn read_pointer(&self) -> Option<SessionId> {
        match self.store.get(ACTIVE_SESSION_KEY) {
            Ok(Some(Value::String(id))) => Some(id),
            Ok(Some(other)) => {
                warn!("⚠️  Ignoring malformed active session pointer: {}", other);
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("⚠️  Could not read active session pointer: {}", e);
                None
            }
        }
    }
}
