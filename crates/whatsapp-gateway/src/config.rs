//! Configuration types for the Evolution API gateway.

use crate::error::GatewayError;

/// Configuration for connecting to an Evolution API server.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the Evolution API server (e.g., "http://localhost:8080").
    pub base_url: String,
    /// API key, sent as the `apikey` header on every request.
    pub api_key: String,
    /// Instance name of the connected WhatsApp session.
    pub instance: String,
}

impl GatewayConfig {
    /// Create a new configuration.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            api_key: api_key.into(),
            instance: instance.into(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `EVOLUTION_API_URL` | `http://localhost:8080` |
    /// | `EVOLUTION_API_KEY` | (required) |
    /// | `EVOLUTION_INSTANCE` | (required) |
    pub fn from_env() -> Result<Self, GatewayError> {
        let base_url = std::env::var("EVOLUTION_API_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());
        let api_key = std::env::var("EVOLUTION_API_KEY")
            .map_err(|_| GatewayError::Config("EVOLUTION_API_KEY not set".to_string()))?;
        let instance = std::env::var("EVOLUTION_INSTANCE")
            .map_err(|_| GatewayError::Config("EVOLUTION_INSTANCE not set".to_string()))?;
        Ok(Self::new(base_url, api_key, instance))
    }

    /// Get the text-send endpoint URL.
    pub fn send_text_url(&self) -> String {
        format!("{}/message/sendText/{}", self.base_url, self.instance)
    }

    /// Get the connection-state endpoint URL.
    pub fn connection_state_url(&self) -> String {
        format!("{}/instance/connectionState/{}", self.base_url, self.instance)
    }
}
