use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::domain::{
    ApplicationFields, ApplicationState, FieldPath, FieldUpdateError, FieldValue,
    SubmissionStatus, ValidationErrors, WizardStep,
};
use super::intake::{ApplicationIntake, IntakeError, IntakeReply};
use super::payload::RiderApplicationPayload;
use super::validation;

/// Shown when the intake endpoint answers without a usable message.
pub const SUBMISSION_FAILED_MESSAGE: &str = "Application submission failed. Please try again.";

/// Shown when the intake endpoint could not be reached or answered garbage.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

/// A delivery started by [`ApplicationFormEngine::begin_submit`] and not yet
/// recorded.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    attempt: u64,
    payload: RiderApplicationPayload,
}

impl PendingSubmission {
    pub fn payload(&self) -> &RiderApplicationPayload {
        &self.payload
    }
}

/// Five-step wizard over a single [`ApplicationState`].
///
/// Forward navigation is gated on the current step's validation, backward
/// navigation never is. Submission happens once per `submit` call and only from the
/// last step; failures end up in [`SubmissionStatus::Failed`] rather than being
/// returned to the caller.
///
/// Callers that share the engine behind a lock can split `submit` into
/// [`begin_submit`](Self::begin_submit) and [`finish_submit`](Self::finish_submit) and
/// release the lock while the intake call is in flight.
pub struct ApplicationFormEngine<I> {
    intake: Arc<I>,
    state: ApplicationState,
    status: watch::Sender<SubmissionStatus>,
    attempts: u64,
}

impl<I> ApplicationFormEngine<I>
where
    I: ApplicationIntake + 'static,
{
    pub fn new(intake: Arc<I>) -> Self {
        let (status, _) = watch::channel(SubmissionStatus::Idle);
        Self {
            intake,
            state: ApplicationState::default(),
            status,
            attempts: 0,
        }
    }

    /// Start from previously captured fields, e.g. a saved draft. Navigation still
    /// begins at the first step.
    pub fn with_fields(intake: Arc<I>, fields: ApplicationFields) -> Self {
        let mut engine = Self::new(intake);
        engine.state.fields = fields;
        engine
    }

    pub fn intake(&self) -> Arc<I> {
        self.intake.clone()
    }

    pub fn state(&self) -> &ApplicationState {
        &self.state
    }

    pub fn current_step(&self) -> WizardStep {
        self.state.current_step
    }

    pub fn fields(&self) -> &ApplicationFields {
        &self.state.fields
    }

    pub fn validation_errors(&self) -> &ValidationErrors {
        &self.state.validation_errors
    }

    pub fn submission(&self) -> &SubmissionStatus {
        &self.state.submission
    }

    /// Observe submission transitions without polling the engine.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionStatus> {
        self.status.subscribe()
    }

    /// The normalized body `submit` would deliver right now.
    pub fn payload(&self) -> RiderApplicationPayload {
        RiderApplicationPayload::from_fields(&self.state.fields)
    }

    /// Write a field and drop any error recorded against it. The field is not
    /// re-validated until the applicant tries to advance again.
    pub fn update_field(
        &mut self,
        path: FieldPath,
        value: impl Into<FieldValue>,
    ) -> Result<(), FieldUpdateError> {
        self.state.fields.set(path, value.into())?;
        if self.state.validation_errors.remove(path).is_some() {
            debug!(%path, "cleared validation error on edit");
        }
        Ok(())
    }

    /// Replace the error map with the failures found for `step`.
    pub fn validate_step(&mut self, step: WizardStep) -> bool {
        let errors = validation::validate_step(&self.state.fields, step);
        let passed = errors.is_empty();
        if !passed {
            debug!(
                step = step.number(),
                failures = errors.len(),
                "step validation failed"
            );
        }
        self.state.validation_errors = errors;
        passed
    }

    pub fn next_step(&mut self) -> WizardStep {
        let step = self.state.current_step;
        if self.validate_step(step) {
            self.state.current_step = step.next();
        }
        self.state.current_step
    }

    pub fn previous_step(&mut self) -> WizardStep {
        self.state.current_step = self.state.current_step.previous();
        self.state.current_step
    }

    /// Validate the last step and deliver the application once.
    ///
    /// Calling this before the last step only re-validates the current step, and
    /// calling it after a successful delivery does nothing.
    pub async fn submit(&mut self) -> &SubmissionStatus {
        let Some(pending) = self.begin_submit() else {
            return &self.state.submission;
        };
        let outcome = self.intake.deliver(pending.payload()).await;
        self.finish_submit(pending, outcome)
    }

    /// First half of `submit`: validate, move to `Submitting` and hand back the
    /// payload to deliver. `None` means there is nothing to send.
    pub fn begin_submit(&mut self) -> Option<PendingSubmission> {
        match self.state.submission {
            SubmissionStatus::Succeeded => {
                debug!("application already delivered; ignoring submit");
                return None;
            }
            SubmissionStatus::Submitting => {
                debug!("delivery already in flight; ignoring submit");
                return None;
            }
            SubmissionStatus::Idle | SubmissionStatus::Failed { .. } => {}
        }

        let step = self.state.current_step;
        let valid = self.validate_step(step);
        if step != WizardStep::LAST {
            debug!(step = step.number(), "submit requested before the final step");
            return None;
        }
        if !valid {
            return None;
        }

        self.attempts += 1;
        self.transition(SubmissionStatus::Submitting);
        Some(PendingSubmission {
            attempt: self.attempts,
            payload: self.payload(),
        })
    }

    /// Second half of `submit`: record what the intake answered. Outcomes of an
    /// attempt superseded by `reset` or by a newer attempt are dropped.
    pub fn finish_submit(
        &mut self,
        pending: PendingSubmission,
        outcome: Result<IntakeReply, IntakeError>,
    ) -> &SubmissionStatus {
        if pending.attempt != self.attempts
            || self.state.submission != SubmissionStatus::Submitting
        {
            debug!(attempt = pending.attempt, "dropping outcome of a superseded submit");
            return &self.state.submission;
        }

        let next = match outcome {
            Ok(reply) if reply.accepted() => {
                info!(status = reply.status, "rider application accepted");
                SubmissionStatus::Succeeded
            }
            Ok(reply) => {
                warn!(
                    status = reply.status,
                    success = reply.success,
                    "rider application rejected by intake"
                );
                SubmissionStatus::Failed {
                    message: reply
                        .message
                        .unwrap_or_else(|| SUBMISSION_FAILED_MESSAGE.to_string()),
                }
            }
            Err(err) => {
                warn!(error = %err, "rider application delivery failed");
                SubmissionStatus::Failed {
                    message: NETWORK_ERROR_MESSAGE.to_string(),
                }
            }
        };

        self.transition(next);
        &self.state.submission
    }

    /// Discard everything and start a new application.
    pub fn reset(&mut self) {
        self.state = ApplicationState::default();
        self.status.send_replace(SubmissionStatus::Idle);
    }

    fn transition(&mut self, next: SubmissionStatus) {
        debug!(
            from = self.state.submission.label(),
            to = next.label(),
            "submission transition"
        );
        self.state.submission = next.clone();
        self.status.send_replace(next);
    }
}
