//! ssm-env: load AWS SSM Parameter Store parameters as environment variables
//!
//! Parameters are selected by path hierarchy, by tag, or both, fetched through
//! a paginating and rate-limit aware client, and projected onto flat uppercase
//! variable names.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod project;
pub mod render;
pub mod store;

pub use cli::load_env_vars;
pub use error::{Error, StoreError, ValidationError};
