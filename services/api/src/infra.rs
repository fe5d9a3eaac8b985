use async_trait::async_trait;
use freedom_riders::error::AppError;
use freedom_riders::workflows::rider_application::{
    ApplicationFields, ApplicationIntake, IntakeError, IntakeReply, RiderApplicationPayload,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Intake that keeps applications in memory; used by `demo` and `serve --dry-run`.
#[derive(Default, Clone)]
pub(crate) struct InMemoryIntake {
    received: Arc<Mutex<Vec<RiderApplicationPayload>>>,
    reject_with: Option<String>,
}

impl InMemoryIntake {
    pub(crate) fn rejecting(message: impl Into<String>) -> Self {
        Self {
            received: Arc::default(),
            reject_with: Some(message.into()),
        }
    }

    pub(crate) fn received(&self) -> Vec<RiderApplicationPayload> {
        self.received.lock().expect("intake mutex poisoned").clone()
    }
}

#[async_trait]
impl ApplicationIntake for InMemoryIntake {
    async fn deliver(&self, payload: &RiderApplicationPayload) -> Result<IntakeReply, IntakeError> {
        self.received
            .lock()
            .expect("intake mutex poisoned")
            .push(payload.clone());
        info!(email = %payload.email, "application captured in memory");

        Ok(match &self.reject_with {
            Some(message) => IntakeReply {
                status: 422,
                success: false,
                message: Some(message.clone()),
            },
            None => IntakeReply {
                status: 201,
                success: true,
                message: Some("Application received".to_string()),
            },
        })
    }
}

/// Read a JSON draft of the form fields from disk.
pub(crate) fn load_draft(path: &Path) -> Result<ApplicationFields, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
