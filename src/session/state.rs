use std::sync::Arc;
use tracing::info;

use super::export::{export_session, ExportArtifact};
use super::ids::IdGenerator;
use super::registry::SessionRegistry;
use super::tracker::ActiveSessionTracker;
use super::types::{Message, SessionId, SessionSummary};
use crate::store::{KeyValueStore, StoreError};

/// Ephemeral exchange bookkeeping. Never persisted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingExchange {
    /// Exchanges begun but not yet completed
    pub in_flight: usize,
    /// Last user content submitted, for retry
    pub last_user_message: Option<String>,
}

/// Everything the presentation layer reads and mutates.
///
/// The REPL renders this state and changes it only through these methods
/// and [`crate::exchange::MessageExchange`].
pub struct ChatState {
    registry: SessionRegistry,
    tracker: ActiveSessionTracker,
    pending: PendingExchange,
}

impl ChatState {
    /// Load sessions from `store`. The active session is resolved lazily.
    pub fn load(store: Arc<dyn KeyValueStore>, ids: Box<dyn IdGenerator>) -> Self {
        Self {
            registry: SessionRegistry::load(store.clone(), ids),
            tracker: ActiveSessionTracker::new(store),
            pending: PendingExchange::default(),
        }
    }

    pub fn active_id(&mut self) -> SessionId {
        self.tracker.get_active(&mut self.registry)
    }

    pub fn active_label(&mut self) -> String {
        let id = self.active_id();
        self.registry.display_label(&id)
    }

    pub fn active_messages(&mut self) -> &[Message] {
        let id = self.active_id();
        self.registry.messages(&id).unwrap_or_default()
    }

    pub fn sessions(&self) -> Vec<SessionSummary> {
        self.registry.list_sessions()
    }

    /// Start a new conversation and make it active
    pub fn new_session(&mut self, label: Option<&str>) -> SessionId {
        let id = self.registry.create_session(label);
        self.tracker.adopt(id.clone());
        self.pending.last_user_message = None;
        id
    }

    /// "Clear": abandon the current view for a fresh default-labelled session
    pub fn reset_to_new_session(&mut self) -> SessionId {
        self.pending.last_user_message = None;
        self.tracker.reset_to_new_session(&mut self.registry)
    }

    /// Select a session. Unknown ids give an empty view and change nothing.
    pub fn switch_to(&mut self, id: &str) -> Vec<Message> {
        self.tracker.switch_to(&self.registry, id)
    }

    pub fn rename(&mut self, id: &str, label: &str) -> bool {
        self.registry.rename_session(id, label)
    }

    pub fn rename_active(&mut self, label: &str) -> bool {
        let id = self.active_id();
        self.rename(&id, label)
    }

    /// Delete a session.
    ///
    /// Deleting the active session starts a fresh one, returned here.
    /// Deleting any other session leaves the active view as it is.
    /// Unknown ids are ignored.
    pub fn delete(&mut self, id: &str) -> Option<SessionId> {
        if !self.registry.contains(id) {
            return None;
        }
        let was_active = self.active_id() == id;
        self.registry.delete_session(id);

        if was_active {
            let fresh = self.reset_to_new_session();
            info!(deleted = %id, active = %fresh, "active session deleted, started a new one");
            Some(fresh)
        } else {
            None
        }
    }

    pub fn export(&self, id: &str) -> Option<ExportArtifact> {
        export_session(&self.registry, id)
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn pending(&self) -> &PendingExchange {
        &self.pending
    }

    pub fn is_busy(&self) -> bool {
        self.pending.in_flight > 0
    }

    pub fn last_user_message(&self) -> Option<&str> {
        self.pending.last_user_message.as_deref()
    }

    /// Drain write failures from both the registry and the pointer
    pub fn take_persistence_failures(&mut self) -> Vec<StoreError> {
        let mut failures = self.registry.take_persistence_failures();
        failures.extend(self.tracker.take_persistence_failures());
        failures
    }

    pub(crate) fn registry_mut(&mut self) -> &mut SessionRegistry {
        &mut self.registry
    }

    pub(crate) fn tracker(&self) -> &ActiveSessionTracker {
        &self.tracker
    }

    pub(crate) fn pending_mut(&mut self) -> &mut PendingExchange {
        &mut self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ACTIVE_SESSION_KEY, SESSIONS_KEY};
    use crate::session::SequentialIds;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fresh_state() -> (Arc<MemoryStore>, ChatState) {
        let store = Arc::new(MemoryStore::new());
        let state = ChatState::load(store.clone(), Box::new(SequentialIds::new()));
        (store, state)
    }

    #[test]
    fn test_fresh_start_has_empty_active_session() {
        let (_, mut state) = fresh_state();
        let id = state.active_id();
        assert!(state.active_messages().is_empty());
        assert_eq!(state.sessions().len(), 1);
        assert_eq!(state.sessions()[0].id, id);
    }

    #[test]
    fn test_deleting_active_session_yields_fresh_empty_one() {
        let (store, mut state) = fresh_state();
        let old = state.active_id();
        state
            .registry_mut()
            .append_message(&old, Message::user("bye"))
            .unwrap();
        state.pending_mut().last_user_message = Some("bye".to_string());

        let fresh = state.delete(&old).expect("active session was deleted");

        assert_ne!(fresh, old);
        assert_eq!(state.active_id(), fresh);
        assert!(state.active_messages().is_empty());
        assert_eq!(state.last_user_message(), None);
        assert_eq!(store.get(ACTIVE_SESSION_KEY).unwrap(), Some(json!(fresh)));
        assert!(!state.registry().contains(&old));
    }

    #[test]
    fn test_fresh_id_is_never_a_reused_one() {
        let (_, mut state) = fresh_state();
        let mut seen = vec![state.active_id()];
        for _ in 0..5 {
            let active = state.active_id();
            let fresh = state.delete(&active).unwrap();
            assert!(!seen.contains(&fresh));
            seen.push(fresh);
        }
    }

    #[test]
    fn test_deleting_inactive_session_keeps_view() {
        let (store, mut state) = fresh_state();
        let other = state.new_session(Some("Other"));
        let active = state.new_session(Some("Active"));
        state
            .registry_mut()
            .append_message(&active, Message::user("still visible"))
            .unwrap();

        assert_eq!(state.delete(&other), None);

        assert_eq!(state.active_id(), active);
        assert_eq!(state.active_messages()[0].content, "still visible");
        assert!(store.get(SESSIONS_KEY).unwrap().unwrap().get(&other).is_none());
    }

    #[test]
    fn test_deleting_unknown_id_writes_nothing() {
        let (store, mut state) = fresh_state();
        let active = state.active_id();
        let writes = store.write_count();

        assert_eq!(state.delete("session_missing"), None);

        assert_eq!(store.write_count(), writes);
        assert_eq!(state.active_id(), active);
        assert_eq!(state.sessions().len(), 1);
    }

    #[test]
    fn test_rename_active_keeps_messages() {
        let (_, mut state) = fresh_state();
        let id = state.active_id();
        state
            .registry_mut()
            .append_message(&id, Message::user("content"))
            .unwrap();

        assert!(state.rename_active("Renamed"));

        assert_eq!(state.active_label(), "Renamed");
        assert_eq!(state.active_messages()[0].content, "content");
    }

    #[test]
    fn test_switch_round_trip() {
        let (_, mut state) = fresh_state();
        let first = state.active_id();
        state
            .registry_mut()
            .append_message(&first, Message::user("first"))
            .unwrap();
        let second = state.new_session(None);
        assert_eq!(state.active_id(), second);

        let view = state.switch_to(&first);

        assert_eq!(view.len(), 1);
        assert_eq!(state.active_id(), first);
    }

    #[test]
    fn test_state_survives_restart() {
        let (store, mut state) = fresh_state();
        let id = state.new_session(Some("Kept"));
        state
            .registry_mut()
            .append_message(&id, Message::user("persisted"))
            .unwrap();
        drop(state);

        let mut restarted = ChatState::load(store, Box::new(SequentialIds::new()));
        assert_eq!(restarted.active_id(), id);
        assert_eq!(restarted.active_label(), "Kept");
        assert_eq!(restarted.active_messages()[0].content, "persisted");
    }

    #[test]
    fn test_persistence_failures_are_collected() {
        let (store, mut state) = fresh_state();
        store.set_fail_writes(true);

        let id = state.new_session(None);

        // In memory the session is live even though nothing reached storage
        assert_eq!(state.active_id(), id);
        assert_eq!(state.take_persistence_failures().len(), 3);
        assert!(store.get(SESSIONS_KEY).unwrap().is_none());
    }
}
