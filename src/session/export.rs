use std::fs;
use std::path::{Path, PathBuf};

use super::registry::SessionRegistry;
use crate::constants::EXPORT_EXTENSION;
use crate::utils::ChatboxError;

/// A session serialized for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// `<label-or-id>.json`, with path separators replaced
    pub file_name: String,
    /// Pretty-printed JSON array of the session's messages
    pub contents: String,
}

impl ExportArtifact {
    /// Write the artifact into `dir`, returning the full path
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ChatboxError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.contents)?;
        Ok(path)
    }
}

/// Serialize one session. `None` when the session does not exist.
pub fn export_session(registry: &SessionRegistry, id: &str) -> Option<ExportArtifact> {
    let messages = registry.messages(id)?;
    // A Vec of plain structs always serializes
    let contents = serde_json::to_string_pretty(messages).ok()?;

    let stem = registry
        .display_label(id)
        .replace(['/', '\\', ':'], "_");

    Some(ExportArtifact {
        file_name: format!("{stem}.{EXPORT_EXTENSION}"),
        contents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Message, SequentialIds};
    use crate::store::{KeyValueStore, MemoryStore};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn registry() -> (Arc<MemoryStore>, SessionRegistry) {
        let store = Arc::new(MemoryStore::new());
        let registry = SessionRegistry::load(store.clone(), Box::new(SequentialIds::new()));
        (store, registry)
    }

    #[test]
    fn test_export_deserializes_to_same_messages() {
        let (_, mut registry) = registry();
        let id = registry.create_session(Some("Recipes"));
        registry.append_message(&id, Message::user("hello")).unwrap();
        registry.append_message(&id, Message::bot("hi there")).unwrap();

        let artifact = export_session(&registry, &id).unwrap();

        assert_eq!(artifact.file_name, "Recipes.json");
        let parsed: Vec<Message> = serde_json::from_str(&artifact.contents).unwrap();
        assert_eq!(parsed.as_slice(), registry.messages(&id).unwrap());
        assert!(artifact.contents.contains("\n  {"), "expected pretty output");
    }

    #[test]
    fn test_export_name_falls_back_to_id_and_is_path_safe() {
        let (store, _) = registry();
        store
            .set(
                crate::constants::SESSIONS_KEY,
                &serde_json::json!({ "session_legacy": [] }),
            )
            .unwrap();
        let mut registry = SessionRegistry::load(store, Box::new(SequentialIds::new()));
        assert_eq!(
            export_session(&registry, "session_legacy").unwrap().file_name,
            "session_legacy.json"
        );

        registry.rename_session("session_legacy", "a/b");
        assert_eq!(
            export_session(&registry, "session_legacy").unwrap().file_name,
            "a_b.json"
        );
    }

    #[test]
    fn test_export_is_read_only() {
        let (store, mut registry) = registry();
        let id = registry.create_session(None);
        let writes = store.write_count();

        export_session(&registry, &id).unwrap();
        assert!(export_session(&registry, "missing").is_none());

        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn test_write_to_directory() {
        let temp_dir = TempDir::new().unwrap();
        let artifact = ExportArtifact {
            file_name: "chat.json".to_string(),
            contents: "[]".to_string(),
        };

        let path = artifact.write_to(temp_dir.path().join("out")).unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "[]");
    }

    #[test]
    fn test_write_into_a_file_path_is_an_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("taken");
        fs::write(&blocker, "not a directory").unwrap();
        let artifact = ExportArtifact {
            file_name: "chat.json".to_string(),
            contents: "[]".to_string(),
        };

        let err = artifact.write_to(&blocker).unwrap_err();

        assert!(matches!(err, ChatboxError::IoError(_)));
    }
}
