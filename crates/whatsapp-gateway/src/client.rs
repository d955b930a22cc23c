//! Evolution API HTTP client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use notify_core::{MessageTransport, TransportError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// Request timeout for individual API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of a `sendText` request.
#[derive(Debug, Serialize)]
struct SendTextRequest<'a> {
    number: &'a str,
    text: &'a str,
}

/// Response of a `connectionState` request.
#[derive(Debug, Deserialize)]
struct ConnectionStateResponse {
    instance: InstanceState,
}

#[derive(Debug, Deserialize)]
struct InstanceState {
    state: String,
}

/// Client for sending WhatsApp messages through an Evolution API instance.
#[derive(Clone)]
pub struct WhatsAppClient {
    http: Client,
    config: GatewayConfig,
    connected: Arc<AtomicBool>,
}

impl WhatsAppClient {
    /// Build a client and verify the instance is connected.
    pub async fn connect(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Self::new(config)?;

        let state = client.connection_state().await?;
        if state != "open" {
            return Err(GatewayError::Disconnected(state));
        }
        client.connected.store(true, Ordering::SeqCst);
        info!(
            "Connected to Evolution API at {} (instance: {})",
            client.config.base_url, client.config.instance
        );

        Ok(client)
    }

    /// Build a client without checking the instance state.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(GatewayError::Http)?;

        Ok(Self {
            http,
            config,
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Whether the last state check saw the instance connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Query the instance connection state (e.g. "open", "close",
    /// "connecting").
    pub async fn connection_state(&self) -> Result<String, GatewayError> {
        let url = self.config.connection_state_url();
        debug!("Connection state check: {}", url);

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.config.api_key)
            .send()
            .await
            .map_err(GatewayError::Http)?;

        let status = response.status();
        if !status.is_success() {
            self.connected.store(false, Ordering::SeqCst);
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let state: ConnectionStateResponse =
            response.json().await.map_err(GatewayError::Http)?;
        self.connected
            .store(state.instance.state == "open", Ordering::SeqCst);
        Ok(state.instance.state)
    }

    /// Send a text message to a canonical phone number.
    pub async fn send_text(&self, number: &str, text: &str) -> Result<(), GatewayError> {
        let url = self.config.send_text_url();
        debug!("Send text to {}: {}", number, url);

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.api_key)
            .json(&SendTextRequest { number, text })
            .send()
            .await
            .map_err(GatewayError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    /// Get the configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[async_trait]
impl MessageTransport for WhatsAppClient {
    async fn send(&self, phone: &str, body: &str) -> Result<(), TransportError> {
        self.send_text(phone, body).await.map_err(|e| match e {
            GatewayError::Http(err) if err.is_timeout() => {
                TransportError::Timeout(REQUEST_TIMEOUT)
            }
            GatewayError::Rejected { status, body } => TransportError::Rejected {
                status,
                detail: body,
            },
            other => TransportError::Request(other.to_string()),
        })
    }

    fn name(&self) -> &str {
        "evolution-api"
    }
}

impl std::fmt::Debug for WhatsAppClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppClient")
            .field("base_url", &self.config.base_url)
            .field("instance", &self.config.instance)
            .field("connected", &self.is_connected())
            .finish()
    }
}
