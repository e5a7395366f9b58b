//! Parameter store client seam (SSM and in-memory implementations)

use crate::domain::{Parameter, PathSpec, TagFilter};
use crate::error::StoreError;
use async_trait::async_trait;

pub mod memory;
pub mod ssm;

pub use memory::MemoryStore;
pub use ssm::SsmStore;

/// Hard limit on names per `get_by_names` call imposed by the store.
pub const GET_PARAMETERS_BATCH_LIMIT: usize = 10;

/// One page of results plus the continuation token, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        // An empty token means the same as no token.
        let next_token = next_token.filter(|t| !t.is_empty());
        Self { items, next_token }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self { items, next_token: None }
    }
}

/// Result of a batch lookup: parameters that resolved and names that did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    pub parameters: Vec<Parameter>,
    pub invalid: Vec<String>,
}

/// The four logical operations the fetch layer needs from a parameter store.
///
/// Implementations issue exactly one request per call and never retry; retry
/// policy belongs to [`crate::fetch::retry::Retrier`].
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// List parameters recursively under `path`, decrypted.
    async fn list_by_path(
        &self,
        path: &PathSpec,
        next_token: Option<String>,
    ) -> Result<Page<Parameter>, StoreError>;

    /// Names of parameters carrying every tag in `filters`.
    async fn describe_by_tags(
        &self,
        filters: &[TagFilter],
        next_token: Option<String>,
    ) -> Result<Page<String>, StoreError>;

    /// Decrypted parameters for at most [`GET_PARAMETERS_BATCH_LIMIT`] names.
    async fn get_by_names(&self, names: &[String]) -> Result<Resolved, StoreError>;
}
