use super::domain::{OnboardingStep, SectionInput, SectionKey};
use super::rules::{FieldRule, SSN_PATTERN, ZIP_CODE_PATTERN};
use super::schema::{FieldKind, FieldSpec, SectionSchema, ValidationError, ValidationResult};

#[derive(Debug, Clone)]
pub struct StepTemplate {
    pub step: OnboardingStep,
    pub navigable_back: bool,
    /// `None` for the read-only completion step.
    pub schema: Option<SectionSchema>,
}

impl StepTemplate {
    pub fn section(&self) -> Option<SectionKey> {
        self.schema.as_ref().map(SectionSchema::section)
    }
}

/// Fixed, ordered sequence of wizard steps together with each step's schema.
#[derive(Debug, Clone)]
pub struct OnboardingBlueprint {
    steps: Vec<StepTemplate>,
}

impl OnboardingBlueprint {
    pub fn standard() -> Self {
        Self {
            steps: standard_steps(),
        }
    }

    pub fn steps(&self) -> &[StepTemplate] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&StepTemplate> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn terminal_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    /// Validate candidate data against the schema of the step at `step_index`.
    pub fn validate(&self, step_index: usize, input: &SectionInput) -> ValidationResult {
        let Some(template) = self.steps.get(step_index) else {
            return ValidationResult::Rejected(ValidationError::single(
                "step",
                format!("Step {step_index} does not exist"),
            ));
        };

        match &template.schema {
            Some(schema) => schema.validate(input),
            None => ValidationResult::Rejected(ValidationError::single(
                "step",
                format!("{} does not accept input", template.step.label()),
            )),
        }
    }
}

impl Default for OnboardingBlueprint {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_steps() -> Vec<StepTemplate> {
    vec![
        StepTemplate {
            step: OnboardingStep::Personal,
            navigable_back: false,
            schema: Some(personal_info_schema()),
        },
        StepTemplate {
            step: OnboardingStep::Insurance,
            navigable_back: true,
            schema: Some(insurance_schema()),
        },
        StepTemplate {
            step: OnboardingStep::Medical,
            navigable_back: true,
            schema: Some(medical_history_schema()),
        },
        StepTemplate {
            step: OnboardingStep::Emergency,
            navigable_back: true,
            schema: Some(emergency_contacts_schema()),
        },
        StepTemplate {
            step: OnboardingStep::Consent,
            navigable_back: true,
            schema: Some(consent_schema()),
        },
        StepTemplate {
            step: OnboardingStep::Complete,
            navigable_back: true,
            schema: None,
        },
    ]
}

fn required_text(name: &'static str, label: &'static str, message: &'static str) -> FieldSpec {
    FieldSpec::new(
        name,
        label,
        FieldKind::Text,
        true,
        FieldRule::required(message),
    )
}

fn optional_text(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec::new(name, label, FieldKind::Text, false, FieldRule::OptionalText)
}

fn required_date(name: &'static str, label: &'static str, message: &'static str) -> FieldSpec {
    FieldSpec::new(
        name,
        label,
        FieldKind::Date,
        true,
        FieldRule::All(vec![
            FieldRule::required(message),
            FieldRule::IsoDate {
                message: "Date must be in format: YYYY-MM-DD",
            },
        ]),
    )
}

pub fn personal_info_schema() -> SectionSchema {
    SectionSchema::new(
        SectionKey::PersonalInfo,
        vec![
            required_text("firstName", "First Name", "First name is required"),
            required_text("lastName", "Last Name", "Last name is required"),
            required_date(
                "dateOfBirth",
                "Date of Birth",
                "Date of birth is required",
            ),
            FieldSpec::new(
                "ssn",
                "Social Security Number",
                FieldKind::Text,
                true,
                FieldRule::pattern(&SSN_PATTERN, "SSN must be in format: 123-45-6789"),
            ),
            required_text("gender", "Gender", "Gender is required"),
            required_text(
                "maritalStatus",
                "Marital Status",
                "Marital status is required",
            ),
            FieldSpec::new("phone", "Phone Number", FieldKind::Phone, true, FieldRule::phone()),
            FieldSpec::new(
                "email",
                "Email Address",
                FieldKind::Email,
                true,
                FieldRule::Email { optional: false },
            ),
            required_text("address", "Street Address", "Address is required"),
            required_text("city", "City", "City is required"),
            required_text("state", "State", "State is required"),
            FieldSpec::new(
                "zipCode",
                "ZIP Code",
                FieldKind::Text,
                true,
                FieldRule::pattern(&ZIP_CODE_PATTERN, "ZIP code must be 5 digits"),
            ),
        ],
    )
}

pub fn insurance_schema() -> SectionSchema {
    SectionSchema::new(
        SectionKey::Insurance,
        vec![
            required_text(
                "provider",
                "Insurance Provider",
                "Insurance provider is required",
            ),
            required_text("policyNumber", "Policy Number", "Policy number is required"),
            required_text("groupNumber", "Group Number", "Group number is required"),
            required_text(
                "subscriberName",
                "Subscriber Name",
                "Subscriber name is required",
            ),
            required_date(
                "subscriberDOB",
                "Subscriber Date of Birth",
                "Subscriber date of birth is required",
            ),
            required_text(
                "relationshipToSubscriber",
                "Relationship to Subscriber",
                "Relationship to subscriber is required",
            ),
        ],
    )
}

pub fn medical_history_schema() -> SectionSchema {
    SectionSchema::new(
        SectionKey::MedicalHistory,
        vec![
            optional_text("primaryPhysician", "Primary Care Physician"),
            optional_text("allergies", "Allergies"),
            optional_text("currentMedications", "Current Medications"),
            optional_text("medicalConditions", "Medical Conditions"),
            optional_text("surgicalHistory", "Surgical History"),
            optional_text("familyHistory", "Family Medical History"),
        ],
    )
}

/// Primary contact fields are mandatory (email aside); every secondary field is optional and
/// the secondary phone is accepted free-form.
pub fn emergency_contacts_schema() -> SectionSchema {
    SectionSchema::new(
        SectionKey::EmergencyContacts,
        vec![
            required_text(
                "primary.name",
                "Primary Contact Name",
                "Primary contact name is required",
            ),
            required_text(
                "primary.relationship",
                "Primary Contact Relationship",
                "Primary contact relationship is required",
            ),
            FieldSpec::new(
                "primary.phone",
                "Primary Contact Phone",
                FieldKind::Phone,
                true,
                FieldRule::phone(),
            ),
            FieldSpec::new(
                "primary.email",
                "Primary Contact Email",
                FieldKind::Email,
                false,
                FieldRule::Email { optional: true },
            ),
            optional_text("secondary.name", "Secondary Contact Name"),
            optional_text("secondary.relationship", "Secondary Contact Relationship"),
            FieldSpec::new(
                "secondary.phone",
                "Secondary Contact Phone",
                FieldKind::Phone,
                false,
                FieldRule::OptionalText,
            ),
            FieldSpec::new(
                "secondary.email",
                "Secondary Contact Email",
                FieldKind::Email,
                false,
                FieldRule::Email { optional: true },
            ),
        ],
    )
}

fn consent_flag(name: &'static str, label: &'static str, message: &'static str) -> FieldSpec {
    FieldSpec::new(
        name,
        label,
        FieldKind::Flag,
        true,
        FieldRule::must_be_true(message),
    )
}

pub fn consent_schema() -> SectionSchema {
    SectionSchema::new(
        SectionKey::Consent,
        vec![
            consent_flag(
                "hipaaConsent",
                "HIPAA Privacy Notice",
                "HIPAA consent is required to proceed",
            ),
            consent_flag(
                "treatmentConsent",
                "Consent to Treatment",
                "Treatment consent is required to proceed",
            ),
            consent_flag(
                "financialResponsibility",
                "Financial Responsibility",
                "Financial responsibility acknowledgment is required",
            ),
            consent_flag(
                "communicationConsent",
                "Communication Preferences",
                "Communication consent is required to proceed",
            ),
        ],
    )
}
