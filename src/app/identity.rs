use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::IDENTITY_KEY;
use crate::store::{KeyValueStore, StoreResult};

/// Local stand-in for the identity provider.
///
/// The chat core only ever sees `authenticated` and `display_name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub authenticated: bool,
    pub display_name: Option<String>,
}

impl Identity {
    /// Load the saved identity. Anything unreadable counts as logged out.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(IDENTITY_KEY) {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!("⚠️  Ignoring malformed identity: {}", e);
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("⚠️  Could not read identity: {}", e);
                Self::default()
            }
        }
    }

    /// Log in as `name` and save
    pub fn login(store: &dyn KeyValueStore, name: &str) -> StoreResult<Self> {
        let identity = Self {
            authenticated: true,
            display_name: Some(name.trim().to_string()).filter(|n| !n.is_empty()),
        };
        identity.save(store)?;
        Ok(identity)
    }

    /// Forget the saved identity
    pub fn logout(store: &dyn KeyValueStore) -> StoreResult<()> {
        store.remove(IDENTITY_KEY)
    }

    /// Name to greet the user with
    pub fn greeting_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("guest")
    }

    fn save(&self, store: &dyn KeyValueStore) -> StoreResult<()> {
        let value = serde_json::to_value(self).map_err(|source| crate::store::StoreError::Corrupt {
            key: IDENTITY_KEY.to_string(),
            source,
        })?;
        store.set(IDENTITY_KEY, &value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_login_then_logout() {
        let store = MemoryStore::new();
        assert!(!Identity::load(&store).authenticated);

        Identity::login(&store, " Ada ").unwrap();
        let identity = Identity::load(&store);
        assert!(identity.authenticated);
        assert_eq!(identity.greeting_name(), "Ada");

        Identity::logout(&store).unwrap();
        assert_eq!(Identity::load(&store), Identity::default());
    }

    #[test]
    fn test_malformed_identity_is_logged_out() {
        let store = MemoryStore::new();
        store.set(IDENTITY_KEY, &json!("yes please")).unwrap();
        assert!(!Identity::load(&store).authenticated);
    }
}
