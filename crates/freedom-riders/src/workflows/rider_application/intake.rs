use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::payload::RiderApplicationPayload;
use crate::config::IntakeConfig;

/// Outbound seam for delivering a finished application.
#[async_trait]
pub trait ApplicationIntake: Send + Sync {
    async fn deliver(&self, payload: &RiderApplicationPayload) -> Result<IntakeReply, IntakeError>;
}

/// What the intake endpoint answered, reduced to the parts the form reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeReply {
    pub status: u16,
    pub success: bool,
    pub message: Option<String>,
}

impl IntakeReply {
    /// Successful status code and a truthy `success` indicator in the body.
    pub fn accepted(&self) -> bool {
        (200..300).contains(&self.status) && self.success
    }

    pub fn from_body(status: u16, body: &Value) -> Self {
        let success = body.get("success").map(is_truthy).unwrap_or(false);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string);

        Self {
            status,
            success,
            message,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Delivery failures that never produced a readable reply.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("failed to build intake HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("intake endpoint unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("intake response was not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),
    /// Scripted outage for unit tests.
    #[cfg(test)]
    #[error("intake unavailable: {0}")]
    Unavailable(String),
}

/// Posts applications as JSON to the configured intake endpoint.
#[derive(Debug, Clone)]
pub struct HttpIntake {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpIntake {
    pub fn new(config: &IntakeConfig) -> Result<Self, IntakeError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("freedom-riders/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(IntakeError::Client)?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ApplicationIntake for HttpIntake {
    async fn deliver(&self, payload: &RiderApplicationPayload) -> Result<IntakeReply, IntakeError> {
        let response = self
            .client
            .post(self.endpoint.as_str())
            .json(payload)
            .send()
            .await
            .map_err(IntakeError::Transport)?;

        let status = response.status().as_u16();
        let body: Value = response.json().await.map_err(IntakeError::Decode)?;
        debug!(status, endpoint = %self.endpoint, "intake endpoint replied");

        Ok(IntakeReply::from_body(status, &body))
    }
}
