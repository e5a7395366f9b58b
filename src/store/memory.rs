//! In-memory parameter store.
//!
//! Behaves like SSM for the operations the fetch layer uses: bounded pages with
//! opaque continuation tokens, recursive path listing, AND-ed tag filters, and a
//! batch lookup that reports unknown names. Failures can be scripted and every
//! call is recorded, which makes it the test double for the fetch pipeline.

use super::{Page, ParameterStore, Resolved, GET_PARAMETERS_BATCH_LIMIT};
use crate::domain::{Parameter, PathSpec, TagFilter, PATH_SEPARATOR, TAG_KEY_PREFIX};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

const DEFAULT_PAGE_SIZE: usize = 10;

/// A request received by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListByPath { path: String, next_token: Option<String> },
    DescribeByTags { filters: Vec<String>, next_token: Option<String> },
    GetByNames { names: Vec<String> },
}

struct Entry {
    parameter: Parameter,
    tags: Vec<String>,
}

pub struct MemoryStore {
    entries: Vec<Entry>,
    page_size: usize,
    scripted_failures: Mutex<VecDeque<StoreError>>,
    persistent_failure: Mutex<Option<StoreError>>,
    delayed_failure: Mutex<Option<(usize, StoreError)>>,
    calls: Mutex<Vec<StoreCall>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            scripted_failures: Mutex::new(VecDeque::new()),
            persistent_failure: Mutex::new(None),
            delayed_failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Maximum items returned per page by the listing operations.
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Add a parameter carrying the given tag keys (without the `tag:` prefix).
    pub fn parameter(mut self, parameter: Parameter, tags: &[&str]) -> Self {
        self.entries
            .push(Entry { parameter, tags: tags.iter().map(|t| t.to_string()).collect() });
        self
    }

    /// Fail the next call with `error`. Queued failures are consumed in order.
    pub fn fail_next(&self, error: StoreError) {
        lock(&self.scripted_failures).push_back(error);
    }

    /// Fail every call with `error` until [`MemoryStore::recover`] is called.
    pub fn fail_always(&self, error: StoreError) {
        *lock(&self.persistent_failure) = Some(error);
    }

    /// Let `successes` calls through, then fail every later call with `error`.
    pub fn fail_after(&self, successes: usize, error: StoreError) {
        let already = lock(&self.calls).len();
        *lock(&self.delayed_failure) = Some((already + successes, error));
    }

    pub fn recover(&self) {
        *lock(&self.persistent_failure) = None;
        *lock(&self.delayed_failure) = None;
        lock(&self.scripted_failures).clear();
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    fn record(&self, call: StoreCall) -> Result<(), StoreError> {
        let seen = {
            let mut calls = lock(&self.calls);
            calls.push(call);
            calls.len()
        };
        if let Some(err) = lock(&self.scripted_failures).pop_front() {
            return Err(err);
        }
        if let Some((threshold, err)) = lock(&self.delayed_failure).as_ref() {
            if seen > *threshold {
                return Err(err.clone());
            }
        }
        match lock(&self.persistent_failure).as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn page<T: Clone>(
        &self,
        matches: Vec<T>,
        next_token: Option<&str>,
    ) -> Result<Page<T>, StoreError> {
        let offset = match next_token {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .ok()
                .filter(|offset| *offset <= matches.len())
                .ok_or_else(|| StoreError::Other(format!("invalid next token: {token}")))?,
        };
        let end = (offset + self.page_size).min(matches.len());
        let next = (end < matches.len()).then(|| end.to_string());
        Ok(Page::new(matches[offset..end].to_vec(), next))
    }
}

#[async_trait]
impl ParameterStore for MemoryStore {
    async fn list_by_path(
        &self,
        path: &PathSpec,
        next_token: Option<String>,
    ) -> Result<Page<Parameter>, StoreError> {
        self.record(StoreCall::ListByPath {
            path: path.as_str().to_string(),
            next_token: next_token.clone(),
        })?;

        let mut prefix = path.as_str().to_string();
        if !prefix.ends_with(PATH_SEPARATOR) {
            prefix.push(PATH_SEPARATOR);
        }
        let matches: Vec<Parameter> = self
            .entries
            .iter()
            .filter(|e| e.parameter.name.starts_with(&prefix))
            .map(|e| e.parameter.clone())
            .collect();

        self.page(matches, next_token.as_deref())
    }

    async fn describe_by_tags(
        &self,
        filters: &[TagFilter],
        next_token: Option<String>,
    ) -> Result<Page<String>, StoreError> {
        self.record(StoreCall::DescribeByTags {
            filters: filters.iter().map(|f| f.key().to_string()).collect(),
            next_token: next_token.clone(),
        })?;

        let matches: Vec<String> = self
            .entries
            .iter()
            .filter(|e| {
                filters.iter().all(|f| {
                    let key = f.key().strip_prefix(TAG_KEY_PREFIX).unwrap_or(f.key());
                    e.tags.iter().any(|t| t == key)
                })
            })
            .map(|e| e.parameter.name.clone())
            .collect();

        self.page(matches, next_token.as_deref())
    }

    async fn get_by_names(&self, names: &[String]) -> Result<Resolved, StoreError> {
        self.record(StoreCall::GetByNames { names: names.to_vec() })?;

        if names.len() > GET_PARAMETERS_BATCH_LIMIT {
            return Err(StoreError::Other(format!(
                "at most {GET_PARAMETERS_BATCH_LIMIT} names per request, got {}",
                names.len()
            )));
        }

        let mut resolved = Resolved::default();
        for name in names {
            match self.entries.iter().find(|e| &e.parameter.name == name) {
                Some(entry) => resolved.parameters.push(entry.parameter.clone()),
                None => resolved.invalid.push(name.clone()),
            }
        }
        Ok(resolved)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
