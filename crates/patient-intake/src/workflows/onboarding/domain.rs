use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered positions of the onboarding wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Personal,
    Insurance,
    Medical,
    Emergency,
    Consent,
    Complete,
}

impl OnboardingStep {
    pub const COUNT: usize = 6;

    pub const fn ordered() -> [Self; Self::COUNT] {
        [
            Self::Personal,
            Self::Insurance,
            Self::Medical,
            Self::Emergency,
            Self::Consent,
            Self::Complete,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Insurance => "insurance",
            Self::Medical => "medical",
            Self::Emergency => "emergency",
            Self::Consent => "consent",
            Self::Complete => "complete",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Personal => "Personal Information",
            Self::Insurance => "Insurance Details",
            Self::Medical => "Medical History",
            Self::Emergency => "Emergency Contacts",
            Self::Consent => "Consent & Privacy",
            Self::Complete => "Complete",
        }
    }

    /// Section edited by the step; the completion step only displays the record.
    pub const fn section(self) -> Option<SectionKey> {
        match self {
            Self::Personal => Some(SectionKey::PersonalInfo),
            Self::Insurance => Some(SectionKey::Insurance),
            Self::Medical => Some(SectionKey::MedicalHistory),
            Self::Emergency => Some(SectionKey::EmergencyContacts),
            Self::Consent => Some(SectionKey::Consent),
            Self::Complete => None,
        }
    }
}

/// Named sections of the aggregated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKey {
    PersonalInfo,
    Insurance,
    MedicalHistory,
    EmergencyContacts,
    Consent,
}

impl SectionKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PersonalInfo => "personalInfo",
            Self::Insurance => "insurance",
            Self::MedicalHistory => "medicalHistory",
            Self::EmergencyContacts => "emergencyContacts",
            Self::Consent => "consent",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub ssn: String,
    pub gender: String,
    pub marital_status: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insurance {
    pub provider: String,
    pub policy_number: String,
    pub group_number: String,
    pub subscriber_name: String,
    #[serde(rename = "subscriberDOB")]
    pub subscriber_dob: String,
    pub relationship_to_subscriber: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistory {
    pub primary_physician: String,
    pub allergies: String,
    pub current_medications: String,
    pub medical_conditions: String,
    pub surgical_history: String,
    pub family_history: String,
}

/// Shared shape of the primary and secondary emergency contacts. Which fields are
/// mandatory is decided by the step schema, not by the type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: String,
    pub relationship: String,
    pub phone: String,
    pub email: String,
}

impl ContactDetails {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.relationship.is_empty()
            && self.phone.is_empty()
            && self.email.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContacts {
    pub primary: ContactDetails,
    pub secondary: ContactDetails,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consent {
    pub hipaa_consent: bool,
    pub treatment_consent: bool,
    pub financial_responsibility: bool,
    pub communication_consent: bool,
}

impl Consent {
    pub fn all_granted(&self) -> bool {
        self.hipaa_consent
            && self.treatment_consent
            && self.financial_responsibility
            && self.communication_consent
    }
}

/// Aggregated registration record. Every declared field is always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub personal_info: PersonalInfo,
    pub insurance: Insurance,
    pub medical_history: MedicalHistory,
    pub emergency_contacts: EmergencyContacts,
    pub consent: Consent,
}

/// Normalized data for exactly one section, as produced by a step schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "section", content = "data", rename_all = "camelCase")]
pub enum SectionData {
    PersonalInfo(PersonalInfo),
    Insurance(Insurance),
    MedicalHistory(MedicalHistory),
    EmergencyContacts(EmergencyContacts),
    Consent(Consent),
}

impl SectionData {
    pub const fn key(&self) -> SectionKey {
        match self {
            SectionData::PersonalInfo(_) => SectionKey::PersonalInfo,
            SectionData::Insurance(_) => SectionKey::Insurance,
            SectionData::MedicalHistory(_) => SectionKey::MedicalHistory,
            SectionData::EmergencyContacts(_) => SectionKey::EmergencyContacts,
            SectionData::Consent(_) => SectionKey::Consent,
        }
    }

    /// Build the typed section from a normalized field map. Missing entries fall back to the
    /// empty value so the record never loses a declared field.
    pub fn from_fields(key: SectionKey, fields: &FieldMap) -> Self {
        match key {
            SectionKey::PersonalInfo => SectionData::PersonalInfo(PersonalInfo {
                first_name: text(fields, "firstName"),
                last_name: text(fields, "lastName"),
                date_of_birth: text(fields, "dateOfBirth"),
                ssn: text(fields, "ssn"),
                gender: text(fields, "gender"),
                marital_status: text(fields, "maritalStatus"),
                phone: text(fields, "phone"),
                email: text(fields, "email"),
                address: text(fields, "address"),
                city: text(fields, "city"),
                state: text(fields, "state"),
                zip_code: text(fields, "zipCode"),
            }),
            SectionKey::Insurance => SectionData::Insurance(Insurance {
                provider: text(fields, "provider"),
                policy_number: text(fields, "policyNumber"),
                group_number: text(fields, "groupNumber"),
                subscriber_name: text(fields, "subscriberName"),
                subscriber_dob: text(fields, "subscriberDOB"),
                relationship_to_subscriber: text(fields, "relationshipToSubscriber"),
            }),
            SectionKey::MedicalHistory => SectionData::MedicalHistory(MedicalHistory {
                primary_physician: text(fields, "primaryPhysician"),
                allergies: text(fields, "allergies"),
                current_medications: text(fields, "currentMedications"),
                medical_conditions: text(fields, "medicalConditions"),
                surgical_history: text(fields, "surgicalHistory"),
                family_history: text(fields, "familyHistory"),
            }),
            SectionKey::EmergencyContacts => SectionData::EmergencyContacts(EmergencyContacts {
                primary: contact(fields, "primary"),
                secondary: contact(fields, "secondary"),
            }),
            SectionKey::Consent => SectionData::Consent(Consent {
                hipaa_consent: flag(fields, "hipaaConsent"),
                treatment_consent: flag(fields, "treatmentConsent"),
                financial_responsibility: flag(fields, "financialResponsibility"),
                communication_consent: flag(fields, "communicationConsent"),
            }),
        }
    }

    /// Flatten the section back into dotted field paths, e.g. to prefill a step.
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        match self {
            SectionData::PersonalInfo(info) => {
                put_text(&mut fields, "firstName", &info.first_name);
                put_text(&mut fields, "lastName", &info.last_name);
                put_text(&mut fields, "dateOfBirth", &info.date_of_birth);
                put_text(&mut fields, "ssn", &info.ssn);
                put_text(&mut fields, "gender", &info.gender);
                put_text(&mut fields, "maritalStatus", &info.marital_status);
                put_text(&mut fields, "phone", &info.phone);
                put_text(&mut fields, "email", &info.email);
                put_text(&mut fields, "address", &info.address);
                put_text(&mut fields, "city", &info.city);
                put_text(&mut fields, "state", &info.state);
                put_text(&mut fields, "zipCode", &info.zip_code);
            }
            SectionData::Insurance(insurance) => {
                put_text(&mut fields, "provider", &insurance.provider);
                put_text(&mut fields, "policyNumber", &insurance.policy_number);
                put_text(&mut fields, "groupNumber", &insurance.group_number);
                put_text(&mut fields, "subscriberName", &insurance.subscriber_name);
                put_text(&mut fields, "subscriberDOB", &insurance.subscriber_dob);
                put_text(
                    &mut fields,
                    "relationshipToSubscriber",
                    &insurance.relationship_to_subscriber,
                );
            }
            SectionData::MedicalHistory(history) => {
                put_text(&mut fields, "primaryPhysician", &history.primary_physician);
                put_text(&mut fields, "allergies", &history.allergies);
                put_text(&mut fields, "currentMedications", &history.current_medications);
                put_text(&mut fields, "medicalConditions", &history.medical_conditions);
                put_text(&mut fields, "surgicalHistory", &history.surgical_history);
                put_text(&mut fields, "familyHistory", &history.family_history);
            }
            SectionData::EmergencyContacts(contacts) => {
                put_contact(&mut fields, "primary", &contacts.primary);
                put_contact(&mut fields, "secondary", &contacts.secondary);
            }
            SectionData::Consent(consent) => {
                fields.insert("hipaaConsent".into(), FieldValue::Flag(consent.hipaa_consent));
                fields.insert(
                    "treatmentConsent".into(),
                    FieldValue::Flag(consent.treatment_consent),
                );
                fields.insert(
                    "financialResponsibility".into(),
                    FieldValue::Flag(consent.financial_responsibility),
                );
                fields.insert(
                    "communicationConsent".into(),
                    FieldValue::Flag(consent.communication_consent),
                );
            }
        }
        fields
    }
}

/// Flat mapping from dotted field path to scalar value.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Scalar value submitted for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    /// A JSON shape that cannot be a field value (arrays). Always rejected by the rules.
    Unsupported(&'static str),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

/// Candidate data for one step, keyed by dotted field path (`primary.phone`).
///
/// Nested JSON objects are flattened on the way in, so presentation layers can post the same
/// shape the record serializes to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct SectionInput {
    fields: FieldMap,
}

impl SectionInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Self {
        let mut fields = FieldMap::new();
        if let Value::Object(map) = value {
            for (key, nested) in map {
                flatten_into(key, nested, &mut fields);
            }
        }
        Self { fields }
    }

    pub fn with_text(mut self, field: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(field.to_string(), FieldValue::Text(value.into()));
        self
    }

    pub fn with_flag(mut self, field: &str, value: bool) -> Self {
        self.fields.insert(field.to_string(), FieldValue::Flag(value));
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

impl From<Value> for SectionInput {
    fn from(value: Value) -> Self {
        Self::from_json(&value)
    }
}

impl From<FieldMap> for SectionInput {
    fn from(fields: FieldMap) -> Self {
        Self { fields }
    }
}

impl From<&SectionData> for SectionInput {
    fn from(data: &SectionData) -> Self {
        Self {
            fields: data.to_fields(),
        }
    }
}

fn flatten_into(path: &str, value: &Value, fields: &mut FieldMap) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(&format!("{path}.{key}"), nested, fields);
            }
        }
        Value::Null => {}
        Value::String(text) => {
            fields.insert(path.to_string(), FieldValue::Text(text.clone()));
        }
        Value::Bool(flag) => {
            fields.insert(path.to_string(), FieldValue::Flag(*flag));
        }
        Value::Number(number) => {
            fields.insert(path.to_string(), FieldValue::Text(number.to_string()));
        }
        Value::Array(_) => {
            fields.insert(path.to_string(), FieldValue::Unsupported("array"));
        }
    }
}

fn text(fields: &FieldMap, key: &str) -> String {
    fields
        .get(key)
        .and_then(FieldValue::as_text)
        .unwrap_or_default()
        .to_string()
}

fn flag(fields: &FieldMap, key: &str) -> bool {
    matches!(fields.get(key), Some(FieldValue::Flag(true)))
}

fn contact(fields: &FieldMap, prefix: &str) -> ContactDetails {
    ContactDetails {
        name: text(fields, &format!("{prefix}.name")),
        relationship: text(fields, &format!("{prefix}.relationship")),
        phone: text(fields, &format!("{prefix}.phone")),
        email: text(fields, &format!("{prefix}.email")),
    }
}

fn put_text(fields: &mut FieldMap, key: &str, value: &str) {
    fields.insert(key.to_string(), FieldValue::text(value));
}

fn put_contact(fields: &mut FieldMap, prefix: &str, contact: &ContactDetails) {
    put_text(fields, &format!("{prefix}.name"), &contact.name);
    put_text(fields, &format!("{prefix}.relationship"), &contact.relationship);
    put_text(fields, &format!("{prefix}.phone"), &contact.phone);
    put_text(fields, &format!("{prefix}.email"), &contact.email);
}
