use super::domain::{ApplicationFields, FieldPath, ValidationErrors, WizardStep};

type Requirement<'a> = (FieldPath, Presence<'a>, &'static str);

enum Presence<'a> {
    Text(&'a str),
    Choice(bool),
}

impl Presence<'_> {
    fn is_missing(&self) -> bool {
        match self {
            Presence::Text(value) => value.trim().is_empty(),
            Presence::Choice(chosen) => !chosen,
        }
    }
}

/// Collect every required-field failure for `step`.
///
/// Only presence is checked. Numeric fields are not range checked here and the
/// motorbike record is only required once the applicant says they own one.
pub(crate) fn validate_step(fields: &ApplicationFields, step: WizardStep) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    match step {
        WizardStep::Personal => {
            let personal = &fields.personal;
            require(
                &mut errors,
                [
                    (
                        FieldPath::FirstName,
                        Presence::Text(&personal.first_name),
                        "First name is required",
                    ),
                    (
                        FieldPath::LastName,
                        Presence::Text(&personal.last_name),
                        "Last name is required",
                    ),
                    (
                        FieldPath::Email,
                        Presence::Text(&personal.email),
                        "Email is required",
                    ),
                    (
                        FieldPath::Phone,
                        Presence::Text(&personal.phone),
                        "Phone number is required",
                    ),
                    (
                        FieldPath::DateOfBirth,
                        Presence::Text(&personal.date_of_birth),
                        "Date of birth is required",
                    ),
                    (
                        FieldPath::Gender,
                        Presence::Choice(personal.gender.is_some()),
                        "Gender is required",
                    ),
                    (
                        FieldPath::Address,
                        Presence::Text(&personal.address),
                        "Address is required",
                    ),
                    (
                        FieldPath::City,
                        Presence::Text(&personal.city),
                        "City is required",
                    ),
                    (
                        FieldPath::Region,
                        Presence::Choice(personal.region.is_some()),
                        "Region is required",
                    ),
                ],
            );
        }
        WizardStep::WorkPreferences => {
            let work = &fields.work;
            require(
                &mut errors,
                [
                    (
                        FieldPath::WorkingModel,
                        Presence::Choice(work.working_model.is_some()),
                        "Working model is required",
                    ),
                    (
                        FieldPath::PreferredWorkingHours,
                        Presence::Choice(work.preferred_working_hours.is_some()),
                        "Working hours preference is required",
                    ),
                ],
            );
        }
        WizardStep::Vehicle => match fields.vehicle.has_motorbike {
            None => errors.insert(
                FieldPath::HasMotorbike,
                "Please specify if you have a motorbike",
            ),
            Some(false) => {}
            Some(true) => {
                let details = &fields.vehicle.motorbike_details;
                require(
                    &mut errors,
                    [
                        (
                            FieldPath::MotorbikeMake,
                            Presence::Text(&details.make),
                            "Motorbike make is required",
                        ),
                        (
                            FieldPath::MotorbikeModel,
                            Presence::Text(&details.model),
                            "Motorbike model is required",
                        ),
                        (
                            FieldPath::MotorbikeYear,
                            Presence::Text(&details.year),
                            "Motorbike year is required",
                        ),
                        (
                            FieldPath::MotorbikeRegistrationNumber,
                            Presence::Text(&details.registration_number),
                            "Registration number is required",
                        ),
                        (
                            FieldPath::MotorbikeCondition,
                            Presence::Choice(details.condition.is_some()),
                            "Motorbike condition is required",
                        ),
                    ],
                );
            }
        },
        WizardStep::LicenseExperience => {
            let license = &fields.license;
            require(
                &mut errors,
                [
                    (
                        FieldPath::LicenseNumber,
                        Presence::Text(&license.license_number),
                        "License number is required",
                    ),
                    (
                        FieldPath::LicenseExpiryDate,
                        Presence::Text(&license.license_expiry_date),
                        "License expiry date is required",
                    ),
                    (
                        FieldPath::YearsOfRidingExperience,
                        Presence::Text(&license.years_of_riding_experience),
                        "Years of experience is required",
                    ),
                ],
            );
        }
        WizardStep::EmergencyContact => {
            let contact = &fields.emergency_contact;
            require(
                &mut errors,
                [
                    (
                        FieldPath::EmergencyFirstName,
                        Presence::Text(&contact.first_name),
                        "Emergency contact first name is required",
                    ),
                    (
                        FieldPath::EmergencyLastName,
                        Presence::Text(&contact.last_name),
                        "Emergency contact last name is required",
                    ),
                    (
                        FieldPath::EmergencyPhone,
                        Presence::Text(&contact.phone),
                        "Emergency contact phone is required",
                    ),
                    (
                        FieldPath::EmergencyRelationship,
                        Presence::Text(&contact.relationship),
                        "Relationship is required",
                    ),
                ],
            );
        }
    }

    errors
}

fn require<const N: usize>(errors: &mut ValidationErrors, requirements: [Requirement<'_>; N]) {
    for (path, presence, message) in requirements {
        if presence.is_missing() {
            errors.insert(path, message);
        }
    }
}
