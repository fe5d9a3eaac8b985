//! Rider application wizard: field model, per-step validation, payload
//! normalization, delivery to the intake endpoint, and HTTP-hosted form sessions.

pub mod domain;
mod engine;
pub mod intake;
pub mod payload;
pub mod router;
pub mod session;
mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationFields, ApplicationState, EmergencyContact, FieldPath, FieldUpdateError,
    FieldValue, Gender, LicenseExperience, MotorbikeCondition, MotorbikeDetails, PersonalInfo,
    Region, SessionId, SubmissionStatus, UnknownFieldPath, UnknownOption, ValidationErrors,
    VehicleInfo, WizardStep, WorkPreferences, WorkingHours, WorkingModel,
};
pub use engine::{
    ApplicationFormEngine, PendingSubmission, NETWORK_ERROR_MESSAGE, SUBMISSION_FAILED_MESSAGE,
};
pub use intake::{ApplicationIntake, HttpIntake, IntakeError, IntakeReply};
pub use payload::{parse_leading_integer, MotorbikePayload, RiderApplicationPayload};
pub use router::{form_router, FieldUpdateRequest, ValidateStepRequest};
pub use session::{
    FormSession, FormSessionStore, FormSessionView, SessionError, SharedSession, StepView,
};
