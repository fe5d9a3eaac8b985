use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationFields, EmergencyContact, Gender, MotorbikeCondition, MotorbikeDetails, Region,
    WorkingHours, WorkingModel,
};

/// Body posted to the rider intake endpoint.
///
/// Numeric text is converted to numbers and `motorbikeDetails` is left out
/// entirely unless the applicant owns a motorbike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderApplicationPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub gender: Option<Gender>,
    pub address: String,
    pub city: String,
    pub region: Option<Region>,
    pub working_model: Option<WorkingModel>,
    pub preferred_working_hours: Option<WorkingHours>,
    pub has_motorbike: Option<bool>,
    pub interested_in_ownership_program: bool,
    pub license_number: String,
    pub license_expiry_date: String,
    pub years_of_riding_experience: Option<i64>,
    pub has_commercial_experience: bool,
    pub emergency_contact: EmergencyContact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motorbike_details: Option<MotorbikePayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotorbikePayload {
    pub make: String,
    pub model: String,
    pub year: Option<i64>,
    pub registration_number: String,
    pub condition: Option<MotorbikeCondition>,
}

impl From<&MotorbikeDetails> for MotorbikePayload {
    fn from(details: &MotorbikeDetails) -> Self {
        Self {
            make: details.make.clone(),
            model: details.model.clone(),
            year: parse_leading_integer(&details.year),
            registration_number: details.registration_number.clone(),
            condition: details.condition,
        }
    }
}

impl RiderApplicationPayload {
    pub fn from_fields(fields: &ApplicationFields) -> Self {
        let personal = &fields.personal;
        let motorbike_details = match fields.vehicle.has_motorbike {
            Some(true) => Some(MotorbikePayload::from(&fields.vehicle.motorbike_details)),
            Some(false) | None => None,
        };

        Self {
            first_name: personal.first_name.clone(),
            last_name: personal.last_name.clone(),
            email: personal.email.clone(),
            phone: personal.phone.clone(),
            date_of_birth: personal.date_of_birth.clone(),
            gender: personal.gender,
            address: personal.address.clone(),
            city: personal.city.clone(),
            region: personal.region,
            working_model: fields.work.working_model,
            preferred_working_hours: fields.work.preferred_working_hours,
            has_motorbike: fields.vehicle.has_motorbike,
            interested_in_ownership_program: fields.vehicle.interested_in_ownership_program,
            license_number: fields.license.license_number.clone(),
            license_expiry_date: fields.license.license_expiry_date.clone(),
            years_of_riding_experience: parse_leading_integer(
                &fields.license.years_of_riding_experience,
            ),
            has_commercial_experience: fields.license.has_commercial_experience,
            emergency_contact: fields.emergency_contact.clone(),
            motorbike_details,
        }
    }
}

/// Parse the leading integer of `raw`, ignoring surrounding whitespace and any
/// trailing non-digits ("2022", " 7 years" and "+3" all parse). Returns `None`
/// when no digit leads the text or the value overflows.
pub fn parse_leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let leading: &str = match digits.find(|ch: char| !ch.is_ascii_digit()) {
        Some(end) => &digits[..end],
        None => digits,
    };
    if leading.is_empty() {
        return None;
    }

    let magnitude = leading.parse::<i64>().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
