//! Configuration loading and merging
//!
//! Settings come from CLI flags, environment variables, a config file, and the
//! paths file, with precedence CLI > Env > File > Defaults.

pub mod loader;
pub mod merge;

pub use loader::{load_config, load_paths_file, FileConfig, DEFAULT_PATHS_FILE};
pub use merge::{merge_cli_with_config, CliOverrides, Settings};
