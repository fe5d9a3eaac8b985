use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier wrapper for open application forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The five sequential field groups of the rider application wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Personal,
    WorkPreferences,
    Vehicle,
    LicenseExperience,
    EmergencyContact,
}

impl WizardStep {
    pub const FIRST: WizardStep = WizardStep::Personal;
    pub const LAST: WizardStep = WizardStep::EmergencyContact;
    pub const COUNT: u8 = 5;

    pub const ALL: [WizardStep; 5] = [
        WizardStep::Personal,
        WizardStep::WorkPreferences,
        WizardStep::Vehicle,
        WizardStep::LicenseExperience,
        WizardStep::EmergencyContact,
    ];

    pub const fn number(self) -> u8 {
        match self {
            WizardStep::Personal => 1,
            WizardStep::WorkPreferences => 2,
            WizardStep::Vehicle => 3,
            WizardStep::LicenseExperience => 4,
            WizardStep::EmergencyContact => 5,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|step| step.number() == number)
    }

    pub const fn title(self) -> &'static str {
        match self {
            WizardStep::Personal => "Personal Info",
            WizardStep::WorkPreferences => "Work Preferences",
            WizardStep::Vehicle => "Vehicle Details",
            WizardStep::LicenseExperience => "License & Experience",
            WizardStep::EmergencyContact => "Emergency Contact",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            WizardStep::Personal => "Basic information about you",
            WizardStep::WorkPreferences => "Your preferred working style",
            WizardStep::Vehicle => "Motorbike information",
            WizardStep::LicenseExperience => "Your riding credentials",
            WizardStep::EmergencyContact => "Someone we can reach",
        }
    }

    /// Following step, saturating at the last one.
    pub fn next(self) -> Self {
        Self::from_number(self.number() + 1).unwrap_or(Self::LAST)
    }

    /// Preceding step, saturating at the first one.
    pub fn previous(self) -> Self {
        Self::from_number(self.number().saturating_sub(1)).unwrap_or(Self::FIRST)
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::FIRST
    }
}

impl Serialize for WizardStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

/// Raised when a text value is not one of a closed enumeration's options.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! closed_options {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $($variant:ident => $value:literal, $label:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire value submitted with the application.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }

            pub const fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let trimmed = raw.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|option| option.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| UnknownOption {
                        kind: $kind,
                        value: raw.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

closed_options! {
    Gender ("gender") {
        Male => "male", "Male";
        Female => "female", "Female";
        Other => "other", "Other";
    }
}

closed_options! {
    /// Administrative regions of Ghana offered by the application form.
    Region ("region") {
        GreaterAccra => "Greater Accra", "Greater Accra";
        Ashanti => "Ashanti", "Ashanti";
        Western => "Western", "Western";
        Central => "Central", "Central";
        Eastern => "Eastern", "Eastern";
        Volta => "Volta", "Volta";
        Northern => "Northern", "Northern";
        UpperEast => "Upper East", "Upper East";
        UpperWest => "Upper West", "Upper West";
        BrongAhafo => "Brong Ahafo", "Brong Ahafo";
        WesternNorth => "Western North", "Western North";
        Ahafo => "Ahafo", "Ahafo";
        Bono => "Bono", "Bono";
        BonoEast => "Bono East", "Bono East";
        Oti => "Oti", "Oti";
        Savannah => "Savannah", "Savannah";
        NorthEast => "North East", "North East";
    }
}

closed_options! {
    /// Employment arrangement the rider is applying for.
    WorkingModel ("working model") {
        InHouse => "in-house", "In-House Rider";
        External => "external", "External Rider";
    }
}

closed_options! {
    WorkingHours ("working hours preference") {
        FullTime => "full-time", "Full-time";
        PartTime => "part-time", "Part-time";
        Flexible => "flexible", "Flexible";
    }
}

closed_options! {
    MotorbikeCondition ("motorbike condition") {
        Excellent => "excellent", "Excellent";
        Good => "good", "Good";
        Fair => "fair", "Fair";
        Poor => "poor", "Poor";
    }
}

/// Everything the applicant types into the form, grouped by wizard step.
///
/// The JSON shape is flat for the top-level groups and nested for the motorbike and
/// emergency contact records, matching the field paths used for updates and errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationFields {
    #[serde(flatten)]
    pub personal: PersonalInfo,
    #[serde(flatten)]
    pub work: WorkPreferences,
    #[serde(flatten)]
    pub vehicle: VehicleInfo,
    #[serde(flatten)]
    pub license: LicenseExperience,
    pub emergency_contact: EmergencyContact,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    #[serde(deserialize_with = "deserialize_optional_option")]
    pub gender: Option<Gender>,
    pub address: String,
    pub city: String,
    #[serde(deserialize_with = "deserialize_optional_option")]
    pub region: Option<Region>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkPreferences {
    #[serde(deserialize_with = "deserialize_optional_option")]
    pub working_model: Option<WorkingModel>,
    #[serde(deserialize_with = "deserialize_optional_option")]
    pub preferred_working_hours: Option<WorkingHours>,
}

/// Vehicle group. `has_motorbike` is tri-state: `None` means the applicant has not
/// answered yet, which fails validation on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleInfo {
    pub has_motorbike: Option<bool>,
    pub motorbike_details: MotorbikeDetails,
    pub interested_in_ownership_program: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MotorbikeDetails {
    pub make: String,
    pub model: String,
    #[serde(deserialize_with = "deserialize_numeric_text")]
    pub year: String,
    pub registration_number: String,
    #[serde(deserialize_with = "deserialize_optional_option")]
    pub condition: Option<MotorbikeCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LicenseExperience {
    pub license_number: String,
    pub license_expiry_date: String,
    #[serde(deserialize_with = "deserialize_numeric_text")]
    pub years_of_riding_experience: String,
    pub has_commercial_experience: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmergencyContact {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub relationship: String,
}

/// Dot-qualified address of a single form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldPath {
    FirstName,
    LastName,
    Email,
    Phone,
    DateOfBirth,
    Gender,
    Address,
    City,
    Region,
    WorkingModel,
    PreferredWorkingHours,
    HasMotorbike,
    MotorbikeMake,
    MotorbikeModel,
    MotorbikeYear,
    MotorbikeRegistrationNumber,
    MotorbikeCondition,
    InterestedInOwnershipProgram,
    LicenseNumber,
    LicenseExpiryDate,
    YearsOfRidingExperience,
    HasCommercialExperience,
    EmergencyFirstName,
    EmergencyLastName,
    EmergencyPhone,
    EmergencyRelationship,
}

impl FieldPath {
    pub const ALL: [FieldPath; 26] = [
        FieldPath::FirstName,
        FieldPath::LastName,
        FieldPath::Email,
        FieldPath::Phone,
        FieldPath::DateOfBirth,
        FieldPath::Gender,
        FieldPath::Address,
        FieldPath::City,
        FieldPath::Region,
        FieldPath::WorkingModel,
        FieldPath::PreferredWorkingHours,
        FieldPath::HasMotorbike,
        FieldPath::MotorbikeMake,
        FieldPath::MotorbikeModel,
        FieldPath::MotorbikeYear,
        FieldPath::MotorbikeRegistrationNumber,
        FieldPath::MotorbikeCondition,
        FieldPath::InterestedInOwnershipProgram,
        FieldPath::LicenseNumber,
        FieldPath::LicenseExpiryDate,
        FieldPath::YearsOfRidingExperience,
        FieldPath::HasCommercialExperience,
        FieldPath::EmergencyFirstName,
        FieldPath::EmergencyLastName,
        FieldPath::EmergencyPhone,
        FieldPath::EmergencyRelationship,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            FieldPath::FirstName => "firstName",
            FieldPath::LastName => "lastName",
            FieldPath::Email => "email",
            FieldPath::Phone => "phone",
            FieldPath::DateOfBirth => "dateOfBirth",
            FieldPath::Gender => "gender",
            FieldPath::Address => "address",
            FieldPath::City => "city",
            FieldPath::Region => "region",
            FieldPath::WorkingModel => "workingModel",
            FieldPath::PreferredWorkingHours => "preferredWorkingHours",
            FieldPath::HasMotorbike => "hasMotorbike",
            FieldPath::MotorbikeMake => "motorbikeDetails.make",
            FieldPath::MotorbikeModel => "motorbikeDetails.model",
            FieldPath::MotorbikeYear => "motorbikeDetails.year",
            FieldPath::MotorbikeRegistrationNumber => "motorbikeDetails.registrationNumber",
            FieldPath::MotorbikeCondition => "motorbikeDetails.condition",
            FieldPath::InterestedInOwnershipProgram => "interestedInOwnershipProgram",
            FieldPath::LicenseNumber => "licenseNumber",
            FieldPath::LicenseExpiryDate => "licenseExpiryDate",
            FieldPath::YearsOfRidingExperience => "yearsOfRidingExperience",
            FieldPath::HasCommercialExperience => "hasCommercialExperience",
            FieldPath::EmergencyFirstName => "emergencyContact.firstName",
            FieldPath::EmergencyLastName => "emergencyContact.lastName",
            FieldPath::EmergencyPhone => "emergencyContact.phone",
            FieldPath::EmergencyRelationship => "emergencyContact.relationship",
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field path '{0}'")]
pub struct UnknownFieldPath(pub String);

impl FromStr for FieldPath {
    type Err = UnknownFieldPath;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        FieldPath::ALL
            .iter()
            .copied()
            .find(|path| path.as_str() == trimmed)
            .ok_or_else(|| UnknownFieldPath(raw.to_string()))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Value handed to a field update. Which variant a path accepts depends on the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value)
    }
}

/// Rejected field update; the form state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldUpdateError {
    #[error(transparent)]
    UnknownPath(#[from] UnknownFieldPath),
    #[error("field '{path}' expects a {expected} value")]
    TypeMismatch {
        path: FieldPath,
        expected: &'static str,
    },
    #[error("field '{path}': {source}")]
    InvalidOption {
        path: FieldPath,
        #[source]
        source: UnknownOption,
    },
}

impl ApplicationFields {
    /// Write `value` at `path`.
    ///
    /// Empty text on a closed-enumeration field clears the selection. Numbers are
    /// accepted on the numeric text fields and kept as their decimal text until the
    /// payload is built.
    pub fn set(&mut self, path: FieldPath, value: FieldValue) -> Result<(), FieldUpdateError> {
        match path {
            FieldPath::FirstName => self.personal.first_name = text(path, value)?,
            FieldPath::LastName => self.personal.last_name = text(path, value)?,
            FieldPath::Email => self.personal.email = text(path, value)?,
            FieldPath::Phone => self.personal.phone = text(path, value)?,
            FieldPath::DateOfBirth => self.personal.date_of_birth = text(path, value)?,
            FieldPath::Gender => self.personal.gender = selection(path, value)?,
            FieldPath::Address => self.personal.address = text(path, value)?,
            FieldPath::City => self.personal.city = text(path, value)?,
            FieldPath::Region => self.personal.region = selection(path, value)?,
            FieldPath::WorkingModel => self.work.working_model = selection(path, value)?,
            FieldPath::PreferredWorkingHours => {
                self.work.preferred_working_hours = selection(path, value)?
            }
            FieldPath::HasMotorbike => self.vehicle.has_motorbike = Some(flag(path, value)?),
            FieldPath::MotorbikeMake => self.vehicle.motorbike_details.make = text(path, value)?,
            FieldPath::MotorbikeModel => {
                self.vehicle.motorbike_details.model = text(path, value)?
            }
            FieldPath::MotorbikeYear => {
                self.vehicle.motorbike_details.year = numeric_text(path, value)?
            }
            FieldPath::MotorbikeRegistrationNumber => {
                self.vehicle.motorbike_details.registration_number = text(path, value)?
            }
            FieldPath::MotorbikeCondition => {
                self.vehicle.motorbike_details.condition = selection(path, value)?
            }
            FieldPath::InterestedInOwnershipProgram => {
                self.vehicle.interested_in_ownership_program = flag(path, value)?
            }
            FieldPath::LicenseNumber => self.license.license_number = text(path, value)?,
            FieldPath::LicenseExpiryDate => {
                self.license.license_expiry_date = text(path, value)?
            }
            FieldPath::YearsOfRidingExperience => {
                self.license.years_of_riding_experience = numeric_text(path, value)?
            }
            FieldPath::HasCommercialExperience => {
                self.license.has_commercial_experience = flag(path, value)?
            }
            FieldPath::EmergencyFirstName => {
                self.emergency_contact.first_name = text(path, value)?
            }
            FieldPath::EmergencyLastName => self.emergency_contact.last_name = text(path, value)?,
            FieldPath::EmergencyPhone => self.emergency_contact.phone = text(path, value)?,
            FieldPath::EmergencyRelationship => {
                self.emergency_contact.relationship = text(path, value)?
            }
        }

        Ok(())
    }
}

fn text(path: FieldPath, value: FieldValue) -> Result<String, FieldUpdateError> {
    match value {
        FieldValue::Text(text) => Ok(text),
        _ => Err(FieldUpdateError::TypeMismatch {
            path,
            expected: "text",
        }),
    }
}

fn numeric_text(path: FieldPath, value: FieldValue) -> Result<String, FieldUpdateError> {
    match value {
        FieldValue::Text(text) => Ok(text),
        FieldValue::Number(number) => Ok(number.to_string()),
        FieldValue::Flag(_) => Err(FieldUpdateError::TypeMismatch {
            path,
            expected: "numeric text",
        }),
    }
}

fn flag(path: FieldPath, value: FieldValue) -> Result<bool, FieldUpdateError> {
    match value {
        FieldValue::Flag(flag) => Ok(flag),
        _ => Err(FieldUpdateError::TypeMismatch {
            path,
            expected: "boolean",
        }),
    }
}

fn selection<T>(path: FieldPath, value: FieldValue) -> Result<Option<T>, FieldUpdateError>
where
    T: FromStr<Err = UnknownOption>,
{
    let raw = text(path, value)?;
    if raw.trim().is_empty() {
        return Ok(None);
    }

    raw.parse()
        .map(Some)
        .map_err(|source| FieldUpdateError::InvalidOption { path, source })
}

/// Accept `null`, a missing key or a blank string as "nothing selected yet".
fn deserialize_optional_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = UnknownOption>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        Some(value) if !value.trim().is_empty() => {
            value.parse().map(Some).map_err(serde::de::Error::custom)
        }
        _ => Ok(None),
    }
}

/// Saved drafts may carry numeric fields as JSON numbers or as text.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumericText {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

fn deserialize_numeric_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumericText>::deserialize(deserializer)? {
        Some(NumericText::Integer(value)) => value.to_string(),
        Some(NumericText::Decimal(value)) => value.to_string(),
        Some(NumericText::Text(value)) => value,
        None => String::new(),
    })
}

/// Field path to message map produced by step validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<FieldPath, String>);

impl ValidationErrors {
    pub fn get(&self, path: FieldPath) -> Option<&str> {
        self.0.get(&path).map(String::as_str)
    }

    pub fn contains(&self, path: FieldPath) -> bool {
        self.0.contains_key(&path)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = FieldPath> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldPath, &str)> + '_ {
        self.0.iter().map(|(path, message)| (*path, message.as_str()))
    }

    pub(crate) fn insert(&mut self, path: FieldPath, message: impl Into<String>) {
        self.0.insert(path, message.into());
    }

    pub(crate) fn remove(&mut self, path: FieldPath) -> Option<String> {
        self.0.remove(&path)
    }
}

/// Outcome of the single network delivery attempted at the last step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed {
        message: String,
    },
}

impl SubmissionStatus {
    pub const fn label(&self) -> &'static str {
        match self {
            SubmissionStatus::Idle => "idle",
            SubmissionStatus::Submitting => "submitting",
            SubmissionStatus::Succeeded => "succeeded",
            SubmissionStatus::Failed { .. } => "failed",
        }
    }
}

/// Mutable record behind one open application form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationState {
    pub current_step: WizardStep,
    pub fields: ApplicationFields,
    pub validation_errors: ValidationErrors,
    pub submission: SubmissionStatus,
}
