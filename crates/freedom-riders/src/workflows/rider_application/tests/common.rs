use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::rider_application::domain::{
    ApplicationFields, EmergencyContact, FieldPath, FieldValue, Gender, LicenseExperience,
    MotorbikeCondition, MotorbikeDetails, PersonalInfo, Region, VehicleInfo, WizardStep,
    WorkPreferences, WorkingHours, WorkingModel,
};
use crate::workflows::rider_application::intake::{ApplicationIntake, IntakeError, IntakeReply};
use crate::workflows::rider_application::payload::RiderApplicationPayload;
use crate::workflows::rider_application::ApplicationFormEngine;

/// Scripted intake double. Unscripted deliveries are accepted.
#[derive(Default, Clone)]
pub(super) struct StubIntake {
    replies: Arc<Mutex<VecDeque<Result<IntakeReply, String>>>>,
    delivered: Arc<Mutex<Vec<RiderApplicationPayload>>>,
}

impl StubIntake {
    pub(super) fn replying(replies: Vec<Result<IntakeReply, String>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            delivered: Arc::default(),
        }
    }

    pub(super) fn delivered(&self) -> Vec<RiderApplicationPayload> {
        self.delivered.lock().expect("intake mutex poisoned").clone()
    }
}

#[async_trait]
impl ApplicationIntake for StubIntake {
    async fn deliver(&self, payload: &RiderApplicationPayload) -> Result<IntakeReply, IntakeError> {
        self.delivered
            .lock()
            .expect("intake mutex poisoned")
            .push(payload.clone());

        let scripted = self
            .replies
            .lock()
            .expect("intake mutex poisoned")
            .pop_front();

        match scripted {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(reason)) => Err(IntakeError::Unavailable(reason)),
            None => Ok(accepted()),
        }
    }
}

pub(super) fn accepted() -> IntakeReply {
    IntakeReply {
        status: 201,
        success: true,
        message: Some("Application received".to_string()),
    }
}

pub(super) fn rejected(status: u16, message: Option<&str>) -> IntakeReply {
    IntakeReply {
        status,
        success: false,
        message: message.map(str::to_string),
    }
}

pub(super) fn blank_engine() -> (ApplicationFormEngine<StubIntake>, Arc<StubIntake>) {
    let intake = Arc::new(StubIntake::default());
    (ApplicationFormEngine::new(intake.clone()), intake)
}

pub(super) fn set(
    engine: &mut ApplicationFormEngine<StubIntake>,
    path: FieldPath,
    value: impl Into<FieldValue>,
) {
    engine
        .update_field(path, value)
        .unwrap_or_else(|err| panic!("update of {path} failed: {err}"));
}

pub(super) fn fill_personal(engine: &mut ApplicationFormEngine<StubIntake>) {
    set(engine, FieldPath::FirstName, "Kwame");
    set(engine, FieldPath::LastName, "Mensah");
    set(engine, FieldPath::Email, "kwame.mensah@example.com");
    set(engine, FieldPath::Phone, "+233 24 555 0101");
    set(engine, FieldPath::DateOfBirth, "1994-03-06");
    set(engine, FieldPath::Gender, "male");
    set(engine, FieldPath::Address, "12 Ring Road East");
    set(engine, FieldPath::City, "Accra");
    set(engine, FieldPath::Region, "Greater Accra");
}

pub(super) fn fill_motorbike(engine: &mut ApplicationFormEngine<StubIntake>) {
    set(engine, FieldPath::HasMotorbike, true);
    set(engine, FieldPath::MotorbikeMake, "Honda");
    set(engine, FieldPath::MotorbikeModel, "Ace 125");
    set(engine, FieldPath::MotorbikeYear, "2022");
    set(engine, FieldPath::MotorbikeRegistrationNumber, "GR 4521-22");
    set(engine, FieldPath::MotorbikeCondition, "good");
}

pub(super) fn complete_fields(has_motorbike: bool) -> ApplicationFields {
    let motorbike_details = if has_motorbike {
        MotorbikeDetails {
            make: "Honda".to_string(),
            model: "Ace 125".to_string(),
            year: "2022".to_string(),
            registration_number: "GR 4521-22".to_string(),
            condition: Some(MotorbikeCondition::Good),
        }
    } else {
        MotorbikeDetails::default()
    };

    ApplicationFields {
        personal: PersonalInfo {
            first_name: "Ama".to_string(),
            last_name: "Owusu".to_string(),
            email: "ama.owusu@example.com".to_string(),
            phone: "+233 20 123 4567".to_string(),
            date_of_birth: "1998-11-21".to_string(),
            gender: Some(Gender::Female),
            address: "4 Adum Street".to_string(),
            city: "Kumasi".to_string(),
            region: Some(Region::Ashanti),
        },
        work: WorkPreferences {
            working_model: Some(WorkingModel::InHouse),
            preferred_working_hours: Some(WorkingHours::FullTime),
        },
        vehicle: VehicleInfo {
            has_motorbike: Some(has_motorbike),
            motorbike_details,
            interested_in_ownership_program: !has_motorbike,
        },
        license: LicenseExperience {
            license_number: "GH-DL-558812".to_string(),
            license_expiry_date: "2027-06-30".to_string(),
            years_of_riding_experience: "4".to_string(),
            has_commercial_experience: true,
        },
        emergency_contact: EmergencyContact {
            first_name: "Yaw".to_string(),
            last_name: "Owusu".to_string(),
            phone: "+233 24 765 4321".to_string(),
            relationship: "Brother".to_string(),
        },
    }
}

/// Engine holding a complete application, already walked to the last step.
pub(super) fn engine_at_final_step(
    intake: Arc<StubIntake>,
    has_motorbike: bool,
) -> ApplicationFormEngine<StubIntake> {
    let mut engine = ApplicationFormEngine::with_fields(intake, complete_fields(has_motorbike));
    for _ in 1..WizardStep::COUNT {
        engine.next_step();
    }
    assert_eq!(engine.current_step(), WizardStep::LAST);
    engine
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&body).expect("json payload")
}
