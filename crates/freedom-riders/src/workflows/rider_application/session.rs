use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::domain::{
    ApplicationFields, SessionId, SubmissionStatus, ValidationErrors, WizardStep,
};
use super::engine::ApplicationFormEngine;
use super::intake::ApplicationIntake;

/// Random, unguessable form id such as `form-3f0c9a...`.
fn next_session_id() -> SessionId {
    SessionId(format!("form-{}", Uuid::new_v4().simple()))
}

/// One open application form.
pub struct FormSession<I> {
    pub id: SessionId,
    pub opened_at: DateTime<Utc>,
    pub engine: ApplicationFormEngine<I>,
}

impl<I> FormSession<I>
where
    I: ApplicationIntake + 'static,
{
    pub fn view(&self) -> FormSessionView {
        let state = self.engine.state();
        FormSessionView {
            session_id: self.id.clone(),
            opened_at: self.opened_at,
            current_step: StepView::from(state.current_step),
            fields: state.fields.clone(),
            validation_errors: state.validation_errors.clone(),
            submission: state.submission.clone(),
            valid: None,
        }
    }
}

pub type SharedSession<I> = Arc<Mutex<FormSession<I>>>;

struct SessionEntry<I> {
    session: SharedSession<I>,
    last_seen: DateTime<Utc>,
}

/// Open forms keyed by session id. Each form sits behind its own lock so
/// overlapping requests against the same form run one after another.
///
/// Every lookup refreshes the form's `last_seen`; forms nobody touched for a while
/// are dropped by [`purge_idle`](Self::purge_idle).
pub struct FormSessionStore<I> {
    intake: Arc<I>,
    sessions: Mutex<HashMap<SessionId, SessionEntry<I>>>,
}

impl<I> FormSessionStore<I>
where
    I: ApplicationIntake + 'static,
{
    pub fn new(intake: Arc<I>) -> Self {
        Self {
            intake,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn open(&self) -> SharedSession<I> {
        self.open_with_fields(ApplicationFields::default()).await
    }

    /// Open a form pre-filled from a saved draft.
    pub async fn open_with_fields(&self, fields: ApplicationFields) -> SharedSession<I> {
        let session = FormSession {
            id: next_session_id(),
            opened_at: Utc::now(),
            engine: ApplicationFormEngine::with_fields(self.intake.clone(), fields),
        };
        let id = session.id.clone();
        let last_seen = session.opened_at;
        let shared = Arc::new(Mutex::new(session));

        self.sessions.lock().await.insert(
            id.clone(),
            SessionEntry {
                session: shared.clone(),
                last_seen,
            },
        );
        info!(session = %id, "application form opened");
        shared
    }

    pub async fn get(&self, id: &SessionId) -> Result<SharedSession<I>, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        entry.last_seen = Utc::now();
        Ok(entry.session.clone())
    }

    /// Drop forms not looked up for longer than `max_idle`. Returns how many went.
    pub async fn purge_idle(&self, max_idle: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(max_idle)
            .ok()
            .and_then(|idle| Utc::now().checked_sub_signed(idle));
        match cutoff {
            Some(cutoff) => self.purge_idle_before(cutoff).await,
            None => 0,
        }
    }

    /// Drop forms whose last lookup happened before `cutoff`.
    pub async fn purge_idle_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = entry.last_seen >= cutoff;
            if !keep {
                debug!(
                    session = %id,
                    last_seen = %entry.last_seen,
                    "dropping idle application form"
                );
            }
            keep
        });
        let purged = before - sessions.len();
        if purged > 0 {
            info!(purged, remaining = sessions.len(), "idle application forms purged");
        }
        purged
    }

    pub async fn close(&self, id: &SessionId) -> Result<(), SessionError> {
        match self.sessions.lock().await.remove(id) {
            Some(_) => {
                info!(session = %id, "application form closed");
                Ok(())
            }
            None => Err(SessionError::NotFound(id.clone())),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("application form {0} not found")]
    NotFound(SessionId),
}

/// Wizard position as shown to the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub number: u8,
    pub total: u8,
    pub title: &'static str,
    pub description: &'static str,
}

impl From<WizardStep> for StepView {
    fn from(step: WizardStep) -> Self {
        Self {
            number: step.number(),
            total: WizardStep::COUNT,
            title: step.title(),
            description: step.description(),
        }
    }
}

/// Serializable snapshot of a form returned by every session route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSessionView {
    pub session_id: SessionId,
    pub opened_at: DateTime<Utc>,
    pub current_step: StepView,
    pub fields: ApplicationFields,
    pub validation_errors: ValidationErrors,
    pub submission: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
}
