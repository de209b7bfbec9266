//! Configuration loading
//!
//! Reads `DereferenceConfig` from TOML/JSON files and `GROUPDEREF_*`
//! environment variables.

pub mod loader;

// Re-export commonly used items
pub use loader::{
    apply_env_overrides, find_config_file, load, load_from_env, load_from_file, parse_config,
};
