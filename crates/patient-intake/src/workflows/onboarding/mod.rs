//! Patient onboarding wizard: step schemas, navigation, and record assembly.
//!
//! A session walks a fixed sequence of steps. Each step owns one section of the
//! registration record and only accepts data that passes its schema; the final step is
//! read-only and exposes the assembled record.

pub mod aggregate;
pub mod blueprint;
pub mod domain;
pub mod instance;
pub mod repository;
pub mod router;
pub mod rules;
pub mod schema;
pub mod service;
pub mod summary;

#[cfg(test)]
mod tests;

pub use aggregate::merge;
pub use blueprint::{OnboardingBlueprint, StepTemplate};
pub use domain::{
    Consent, ContactDetails, EmergencyContacts, FieldMap, FieldValue, Insurance, MedicalHistory,
    OnboardingStep, PersonalInfo, Record, SectionData, SectionInput, SectionKey,
};
pub use instance::{StepView, WizardState};
pub use repository::{
    FollowUpError, FollowUpKind, FollowUpPublisher, FollowUpRequest, RegistrationSink,
    RegistrationSubmission, RepositoryError, SessionId, SessionRecord, SessionRepository,
    SessionView, SinkError,
};
pub use router::onboarding_router;
pub use rules::{format_phone, is_canonical_phone, FieldRule, RuleOutcome};
pub use schema::{
    FieldDescriptor, FieldKind, FieldSpec, SectionSchema, ValidationError, ValidationResult,
};
pub use service::{OnboardingService, OnboardingServiceError};
pub use summary::{NextStep, RegistrationSummary};
