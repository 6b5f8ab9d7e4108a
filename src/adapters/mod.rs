//! Adapter interfaces for external capabilities.
//!
//! The orchestrator consumes a transport, a decoder, and a timer at
//! their interfaces only; these modules supply the implementations and
//! the helpers that wrap them into runnable tasks.

pub mod http;
pub mod timer;

use anyhow::Result;
use async_trait::async_trait;

// Re-export the HTTP transport
pub use http::HttpTransport;

/// A response-like value produced by a transport fetch
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Status code of the underlying call
    pub status: u16,

    /// Raw, not-yet-decoded body
    pub body: String,
}

impl TransportResponse {
    /// Whether the status falls in the success range [200, 300)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for resource transports
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name
    fn name(&self) -> &str;

    /// Fetch a resource by identifier
    async fn fetch(&self, identifier: &str) -> Result<TransportResponse>;
}
