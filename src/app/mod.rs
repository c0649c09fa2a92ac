// Gateway module for app - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod config;
mod identity;

// Public re-exports - the ONLY way to access app functionality
pub use config::{
    data_dir, init_config, load_config, load_config_from, save_config, BackendConfig, ChatConfig,
    Config, StorageConfig,
};
pub use identity::Identity;
