//! Evolution API client for WhatsApp message delivery.
//!
//! Provides [`WhatsAppClient`], a thin HTTP client over an Evolution API
//! instance, and implements [`notify_core::MessageTransport`] so the
//! delivery worker can send through it.

pub mod client;
pub mod config;
pub mod error;

pub use client::WhatsAppClient;
pub use config::GatewayConfig;
pub use error::GatewayError;
