//! HTTP transport and resource-task construction.
//!
//! `HttpTransport` is the reqwest-backed implementation of the transport
//! capability; the helpers here wrap a transport + decode pair into a
//! runnable `Task`. HTTP semantics stay out of the orchestrator: only
//! "status in [200, 300)" is interpreted, everything else is a failure
//! routed through the classifier.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::TransportConfig;
use crate::core::classify::TaskError;
use crate::domain::Task;

use super::{Transport, TransportResponse};

/// Resource transport over HTTP
pub struct HttpTransport {
    /// Base URL resource identifiers are resolved against
    base_url: String,

    /// Shared HTTP client
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a base URL and default client settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a transport from resolved configuration
    pub fn from_config(config: &TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    /// Resolve a resource identifier to a full URL
    fn resource_url(&self, identifier: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            identifier.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, identifier: &str) -> Result<TransportResponse> {
        let url = self.resource_url(identifier);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch '{}'", url))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from '{}'", url))?;

        Ok(TransportResponse { status, body })
    }
}

/// Decode a response body into structured JSON
pub fn decode_json(body: &str) -> Result<Value> {
    serde_json::from_str(body)
        .map_err(|e| {
            TaskError::Decode {
                reason: e.to_string(),
            }
            .into()
        })
}

/// Extract a field that must be present and non-null
pub fn require_field<'a>(value: &'a Value, field: &str) -> Result<&'a Value> {
    match value.get(field) {
        Some(found) if !found.is_null() => Ok(found),
        _ => Err(TaskError::MissingField {
            field: field.to_string(),
        }
        .into()),
    }
}

/// Wrap a transport fetch + JSON decode into a task.
///
/// The task fails with a transport error on a non-2xx status, a decode
/// error on a malformed body, and a missing-field error if any of
/// `required_fields` is absent or null in the decoded value.
pub fn resource_task(
    name: impl Into<String>,
    transport: Arc<dyn Transport>,
    identifier: impl Into<String>,
    required_fields: Vec<String>,
) -> Task<Value> {
    let identifier = identifier.into();

    Task::new(name, move || async move {
        let response = transport.fetch(&identifier).await?;

        if !response.is_success() {
            return Err(TaskError::Status {
                identifier,
                status: response.status,
            }
            .into());
        }

        let value = decode_json(&response.body)?;
        for field in &required_fields {
            require_field(&value, field)?;
        }

        Ok(value)
    })
}

/// Wrap a transport fetch + typed decode into a task
pub fn typed_resource_task<T>(
    name: impl Into<String>,
    transport: Arc<dyn Transport>,
    identifier: impl Into<String>,
) -> Task<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let identifier = identifier.into();

    Task::new(name, move || async move {
        let response = transport.fetch(&identifier).await?;

        if !response.is_success() {
            return Err(TaskError::Status {
                identifier,
                status: response.status,
            }
            .into());
        }

        serde_json::from_str(&response.body).map_err(|e| {
            TaskError::Decode {
                reason: e.to_string(),
            }
            .into()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_url_joins_cleanly() {
        let transport = HttpTransport::new("http://localhost:9000/api/");

        assert_eq!(
            transport.resource_url("users/1"),
            "http://localhost:9000/api/users/1"
        );
        assert_eq!(
            transport.resource_url("/users/1"),
            "http://localhost:9000/api/users/1"
        );
    }

    #[test]
    fn test_decode_json_rejects_malformed_body() {
        let err = decode_json("{not json").unwrap_err();
        let task_error = err.downcast_ref::<TaskError>().unwrap();
        assert!(matches!(task_error, TaskError::Decode { .. }));
    }

    #[test]
    fn test_require_field() {
        let value: Value = serde_json::from_str(r#"{"id": 1, "name": null}"#).unwrap();

        assert!(require_field(&value, "id").is_ok());
        assert!(require_field(&value, "name").is_err());
        assert!(require_field(&value, "email").is_err());
    }

    #[tokio::test]
    async fn test_transport_name() {
        let transport = HttpTransport::new("http://localhost:9000");
        assert_eq!(transport.name(), "http");
    }
}
