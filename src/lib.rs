pub mod app;
pub mod cli;
pub mod constants;
pub mod exchange;
pub mod runtime;
pub mod session;
pub mod store;
pub mod utils;

pub use app::{load_config, Config};
pub use exchange::{ExchangeOutcome, HttpBackend, InferenceBackend, MessageExchange};
pub use session::{ChatState, Message, Role};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use utils::ChatboxError;
