//! AWS Systems Manager Parameter Store client
//!
//! Thin adapter from [`ParameterStore`] onto `aws-sdk-ssm`. The SDK's own retry
//! layer is disabled so throttling surfaces as [`StoreError::RateLimited`] and is
//! handled by the fetch layer.

use super::{Page, ParameterStore, Resolved, GET_PARAMETERS_BATCH_LIMIT};
use crate::domain::{Parameter, ParameterKind, PathSpec, TagFilter};
use crate::error::StoreError;
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_ssm::types::{self, ParameterStringFilter};
use aws_sdk_ssm::Client;

/// Error codes SSM uses for request throttling.
const THROTTLING_CODES: &[&str] = &[
    "ThrottlingException",
    "Throttling",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "TooManyUpdates",
];

#[derive(Debug, Clone)]
pub struct SsmStore {
    client: Client,
}

impl SsmStore {
    /// Build a client from the default AWS credential chain, optionally
    /// overriding the region.
    pub async fn connect(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(RetryConfig::disabled());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;
        tracing::debug!(region = ?config.region(), "Initialized SSM client");
        Self { client: Client::new(&config) }
    }
}

#[async_trait]
impl ParameterStore for SsmStore {
    async fn list_by_path(
        &self,
        path: &PathSpec,
        next_token: Option<String>,
    ) -> Result<Page<Parameter>, StoreError> {
        let output = self
            .client
            .get_parameters_by_path()
            .path(path.as_str())
            .recursive(true)
            .with_decryption(true)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(classify)?;

        let items = output.parameters().iter().filter_map(convert_parameter).collect();
        Ok(Page::new(items, output.next_token().map(str::to_string)))
    }

    async fn describe_by_tags(
        &self,
        filters: &[TagFilter],
        next_token: Option<String>,
    ) -> Result<Page<String>, StoreError> {
        let filters = filters
            .iter()
            .map(|f| {
                ParameterStringFilter::builder()
                    .key(f.key())
                    .build()
                    .map_err(|e| StoreError::Other(format!("invalid filter {}: {e}", f.key())))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .describe_parameters()
            .set_parameter_filters(Some(filters))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(classify)?;

        let names = output
            .parameters()
            .iter()
            .filter_map(|meta| meta.name().map(str::to_string))
            .collect();
        Ok(Page::new(names, output.next_token().map(str::to_string)))
    }

    async fn get_by_names(&self, names: &[String]) -> Result<Resolved, StoreError> {
        debug_assert!(names.len() <= GET_PARAMETERS_BATCH_LIMIT);

        let output = self
            .client
            .get_parameters()
            .set_names(Some(names.to_vec()))
            .with_decryption(true)
            .send()
            .await
            .map_err(classify)?;

        Ok(Resolved {
            parameters: output.parameters().iter().filter_map(convert_parameter).collect(),
            invalid: output.invalid_parameters().to_vec(),
        })
    }
}

fn convert_parameter(param: &types::Parameter) -> Option<Parameter> {
    let name = param.name()?;
    let kind = match param.r#type() {
        Some(types::ParameterType::SecureString) => ParameterKind::SecureString,
        Some(types::ParameterType::StringList) => ParameterKind::StringList,
        _ => ParameterKind::String,
    };
    Some(Parameter::new(name, param.value().unwrap_or_default(), kind))
}

/// Map an SDK error onto the store error classes the fetch layer acts on.
fn classify<E>(err: E) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    match err.code() {
        Some(code) if THROTTLING_CODES.contains(&code) => StoreError::RateLimited(message),
        Some("ParameterNotFound") => StoreError::NotFound(message),
        _ => StoreError::Other(message),
    }
}
