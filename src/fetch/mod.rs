//! Parameter retrieval: by path, by tag, batch resolution, and reconciliation

use crate::domain::{Parameter, ParameterSet, PathSpec, Selection, TagFilter};
use crate::error::{Error, StoreError};
use crate::store::{ParameterStore, GET_PARAMETERS_BATCH_LIMIT};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

pub mod paginate;
pub mod retry;

pub use paginate::{paginate, PartialFetch};
pub use retry::{Retrier, RetryPolicy};

/// Fetches parameters from an injected store, routing every call through a
/// shared [`Retrier`]. Calls are issued one at a time.
pub struct ParameterFetcher {
    store: Arc<dyn ParameterStore>,
    retrier: Retrier,
}

impl ParameterFetcher {
    pub fn new(store: Arc<dyn ParameterStore>, retrier: Retrier) -> Self {
        Self { store, retrier }
    }

    /// Fetch the parameters a selection describes.
    ///
    /// - tags only: names matching the tags, resolved in batches
    /// - paths only: everything under the paths
    /// - both: parameters under the paths that also match the tags
    ///
    /// The both-supplied case is the set the store would return for a path
    /// query filtered by tags; it is an intersection, not a union.
    pub async fn fetch(&self, selection: &Selection) -> Result<ParameterSet, Error> {
        let set = match (selection.paths().is_empty(), selection.tags().is_empty()) {
            (true, _) => {
                let names = self.describe_by_tags(selection.tags()).await?;
                self.resolve_names(&names).await?.into_iter().collect()
            }
            (false, true) => self.fetch_by_paths(selection.paths()).await?.into_iter().collect(),
            (false, false) => {
                let names = self.describe_by_tags(selection.tags()).await?;
                let params = self.fetch_by_paths(selection.paths()).await?;
                intersect(params, &names)
            }
        };

        info!(parameters = set.len(), "Fetched parameters");
        Ok(set)
    }

    /// All parameters recursively under each path, in path order then store order.
    pub async fn fetch_by_paths(&self, paths: &[PathSpec]) -> Result<Vec<Parameter>, Error> {
        let store = self.store.as_ref();
        let mut params = Vec::new();

        for path in paths {
            let fetched = paginate(|token| {
                self.retrier
                    .run("GetParametersByPath", move || store.list_by_path(path, token.clone()))
            })
            .await
            .map_err(|partial| {
                debug!(
                    path = %path,
                    fetched = params.len() + partial.items.len(),
                    "Path fetch failed after partial results"
                );
                partial.error
            })?;

            debug!(path = %path, count = fetched.len(), "Fetched parameters by path");
            params.extend(fetched);
        }

        Ok(params)
    }

    /// Names of parameters matching every tag filter. Values are not returned.
    pub async fn describe_by_tags(&self, tags: &[TagFilter]) -> Result<Vec<String>, Error> {
        let store = self.store.as_ref();

        let names = paginate(|token| {
            self.retrier
                .run("DescribeParameters", move || store.describe_by_tags(tags, token.clone()))
        })
        .await
        .map_err(|partial| {
            debug!(described = partial.items.len(), "Tag describe failed after partial results");
            partial.error
        })?;

        debug!(
            tags = ?tags.iter().map(TagFilter::key).collect::<Vec<_>>(),
            count = names.len(),
            "Described parameters by tag"
        );
        Ok(names)
    }

    /// Resolve names to decrypted parameters, at most
    /// [`GET_PARAMETERS_BATCH_LIMIT`] per request. Any unknown name fails the
    /// whole resolution.
    pub async fn resolve_names(&self, names: &[String]) -> Result<Vec<Parameter>, Error> {
        let store = self.store.as_ref();
        let mut params = Vec::with_capacity(names.len());

        for chunk in names.chunks(GET_PARAMETERS_BATCH_LIMIT) {
            let resolved = self.retrier.run("GetParameters", || store.get_by_names(chunk)).await?;
            if !resolved.invalid.is_empty() {
                debug!(resolved = params.len(), "Batch resolution hit invalid names");
                return Err(StoreError::InvalidParameters(resolved.invalid).into());
            }
            params.extend(resolved.parameters);
        }

        debug!(
            count = params.len(),
            batches = names.len().div_ceil(GET_PARAMETERS_BATCH_LIMIT),
            "Resolved parameters by name"
        );
        Ok(params)
    }
}

/// Keep the path-fetched parameters whose names are in `tag_names`, in path order.
pub fn intersect(params: Vec<Parameter>, tag_names: &[String]) -> ParameterSet {
    let lookup: HashSet<&str> = tag_names.iter().map(String::as_str).collect();
    params.into_iter().filter(|p| lookup.contains(p.name.as_str())).collect()
}
