// Gateway module for store - follows the Train Station Pattern
// All external access must go through this gateway

mod file;
mod memory;
mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::{KeyValueStore, StoreError, StoreResult};
