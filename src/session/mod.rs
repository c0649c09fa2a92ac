/// Session management module - Gateway

mod export;
mod ids;
mod registry;
mod selector;
mod state;
mod tracker;
mod types;

pub use export::{export_session, ExportArtifact};
pub use ids::{IdGenerator, MonotonicIds, SequentialIds};
pub use registry::{RegistryError, SessionRegistry};
pub use selector::select_session;
pub use state::{ChatState, PendingExchange};
pub use tracker::ActiveSessionTracker;
pub use types::{Message, Role, SessionId, SessionSummary};
