//! Outbound delivery transport.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use signet_core::config::dispatch::DispatchConfig;
use signet_core::error::{AppError, ErrorKind};
use signet_core::result::AppResult;

/// One delivery handed to the relay.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    /// Recipient address.
    #[serde(rename = "to")]
    pub recipient: String,
    /// Mail subject line.
    pub subject: String,
    /// Rendered signature, doubling as the mail body.
    pub html: String,
    /// File name under which the signature is attached.
    pub attachment_name: String,
}

/// Hands rendered signatures to an outbound delivery channel.
#[async_trait]
pub trait Courier: Send + Sync + std::fmt::Debug {
    /// Deliver one item. An error fails only this item, never the run.
    async fn deliver(&self, delivery: &Delivery) -> AppResult<()>;
}

/// Courier that posts deliveries to an HTTP mail relay.
#[derive(Debug, Clone)]
pub struct HttpCourier {
    client: reqwest::Client,
    relay_url: String,
}

impl HttpCourier {
    /// Build a courier against the configured relay.
    pub fn new(config: &DispatchConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build relay HTTP client",
                    e,
                )
            })?;
        Ok(Self {
            client,
            relay_url: config.relay_url.clone(),
        })
    }
}

#[async_trait]
impl Courier for HttpCourier {
    async fn deliver(&self, delivery: &Delivery) -> AppResult<()> {
        let response = self
            .client
            .post(&self.relay_url)
            .json(delivery)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ExternalService, "Relay request failed", e)
            })?;

        if !response.status().is_success() {
            return Err(AppError::external_service(format!(
                "Relay rejected delivery: HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}
