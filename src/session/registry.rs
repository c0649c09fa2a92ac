use chrono::Local;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::ids::IdGenerator;
use super::types::{Message, SessionId, SessionSummary};
use crate::constants::{MESSAGE_TIME_FORMAT, SESSIONS_KEY, SESSION_META_KEY};
use crate::store::{KeyValueStore, StoreError};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),
}

/// Owns every session's messages and labels, and writes both maps through
/// to the store.
///
/// In-memory state is authoritative. A failed write is logged and kept for
/// the caller (see [`SessionRegistry::take_persistence_failures`]) but never
/// rolls the change back.
pub struct SessionRegistry {
    store: Arc<dyn KeyValueStore>,
    ids: Box<dyn IdGenerator>,
    sessions: BTreeMap<SessionId, Vec<Message>>,
    labels: BTreeMap<SessionId, String>,
    failures: Vec<StoreError>,
}

impl SessionRegistry {
    /// Load both maps from the store. Missing or unreadable maps start empty.
    pub fn load(store: Arc<dyn KeyValueStore>, ids: Box<dyn IdGenerator>) -> Self {
        let sessions = load_map(store.as_ref(), SESSIONS_KEY);
        let labels = load_map(store.as_ref(), SESSION_META_KEY);
        debug!(
            sessions = sessions.len(),
            labels = labels.len(),
            "session registry loaded"
        );

        Self {
            store,
            ids,
            sessions,
            labels,
            failures: Vec::new(),
        }
    }

    /// Register a new empty session and return its id
    pub fn create_session(&mut self, label: Option<&str>) -> SessionId {
        let sessions = &self.sessions;
        let labels = &self.labels;
        let id = self
            .ids
            .next_id(&|id| sessions.contains_key(id) || labels.contains_key(id));

        let label = match label.map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => label.to_string(),
            None => self.default_label(),
        };

        self.sessions.insert(id.clone(), Vec::new());
        self.labels.insert(id.clone(), label);
        self.persist_sessions();
        self.persist_labels();

        info!(session = %id, "created session");
        id
    }

    /// Append a message to an existing session
    pub fn append_message(&mut self, id: &str, message: Message) -> Result<(), RegistryError> {
        let messages = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownSession(id.to_string()))?;
        messages.push(message);
        self.persist_sessions();
        Ok(())
    }

    /// Overwrite a session's label. Blank labels and unknown ids are ignored.
    ///
    /// Returns whether the label changed.
    pub fn rename_session(&mut self, id: &str, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || !self.sessions.contains_key(id) {
            return false;
        }

        self.labels.insert(id.to_string(), label.to_string());
        self.persist_labels();
        true
    }

    /// Remove a session and its label.
    ///
    /// The active pointer is not touched here.
    pub fn delete_session(&mut self, id: &str) -> bool {
        let existed = self.sessions.remove(id).is_some();
        let labelled = self.labels.remove(id).is_some();
        if !existed && !labelled {
            return false;
        }
        self.persist_sessions();
        self.persist_labels();

        if existed {
            info!(session = %id, "deleted session");
        }
        existed || labelled
    }

    /// All sessions in creation order
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        self.sessions
            .iter()
            .map(|(id, messages)| SessionSummary {
                id: id.clone(),
                label: self.display_label(id),
                message_count: messages.len(),
            })
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn messages(&self, id: &str) -> Option<&[Message]> {
        self.sessions.get(id).map(Vec::as_slice)
    }

    pub fn label(&self, id: &str) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// The label, falling back to the raw id
    pub fn display_label(&self, id: &str) -> String {
        self.label(id).unwrap_or(id).to_string()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drain the write failures recorded since the last call
    pub fn take_persistence_failures(&mut self) -> Vec<StoreError> {
        std::mem::take(&mut self.failures)
    }

    fn default_label(&self) -> String {
        format!(
            "Session {} – {}",
            self.labels.len() + 1,
            Local::now().format(MESSAGE_TIME_FORMAT)
        )
    }

    fn persist_sessions(&mut self) {
        let result = write_map(self.store.as_ref(), SESSIONS_KEY, &self.sessions);
        self.record(result);
    }

    fn persist_labels(&mut self) {
        let result = write_map(self.store.as_ref(), SESSION_META_KEY, &self.labels);
        self.record(result);
    }

    fn record(&mut self, result: Result<(), StoreError>) {
        if let Err(e) = result {
            warn!("⚠️  Failed to persist sessions: {}", e);
            self.failures.push(e);
        }
    }
}

fn load_map<V: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> BTreeMap<SessionId, V> {
    let value = match store.get(key) {
        Ok(Some(value)) => value,
        Ok(None) => return BTreeMap::new(),
        Err(e) => {
            warn!("⚠️  Could not read '{}': {}. Starting empty.", key, e);
            return BTreeMap::new();
        }
    };

    serde_json::from_value(value).unwrap_or_else(|e| {
        warn!("⚠️  Unexpected shape under '{}': {}. Starting empty.", key, e);
        BTreeMap::new()
    })
}

fn write_map<V: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    map: &BTreeMap<SessionId, V>,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(map).map_err(|source| StoreError::Corrupt {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &value)
}
