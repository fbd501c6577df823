use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::blueprint::OnboardingBlueprint;
use super::domain::Record;
use super::instance::{StepView, WizardState};

/// Identifier wrapper for in-progress onboarding sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Repository record holding one session's wizard state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: SessionId,
    pub state: WizardState,
    /// Set when the record was handed to the registration sink on arrival at the completion
    /// step; cleared when the session leaves that step.
    pub submitted: bool,
}

impl SessionRecord {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: WizardState::new(),
            submitted: false,
        }
    }

    pub fn view(&self, blueprint: &OnboardingBlueprint) -> SessionView {
        SessionView {
            session_id: self.id.clone(),
            started: self.state.is_started(),
            current_step_index: self.state.current_step_index(),
            complete: self.state.is_complete(blueprint),
            submitted: self.submitted,
            step: self.state.current_step(blueprint),
        }
    }
}

/// Public shape of a session returned to presentation layers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub started: bool,
    pub current_step_index: usize,
    pub complete: bool,
    pub submitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<StepView>,
}

/// Session storage so the service can be exercised without a particular backend.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError>;
    fn update(&self, record: SessionRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError>;
    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Completed registration handed off as an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationSubmission {
    pub session_id: SessionId,
    pub record: Record,
}

/// Outbound hook receiving completed registrations (EHR intake, e-mail, ...).
pub trait RegistrationSink: Send + Sync {
    fn submit(&self, submission: RegistrationSubmission) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("registration sink unavailable: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpKind {
    ScheduleAppointment,
    DownloadSummary,
    InsuranceVerification,
}

impl FollowUpKind {
    pub const fn label(self) -> &'static str {
        match self {
            FollowUpKind::ScheduleAppointment => "schedule_appointment",
            FollowUpKind::DownloadSummary => "download_summary",
            FollowUpKind::InsuranceVerification => "insurance_verification",
        }
    }
}

/// Request for work outside the wizard, e.g. appointment scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpRequest {
    pub kind: FollowUpKind,
    pub session_id: SessionId,
    pub details: BTreeMap<String, String>,
}

pub trait FollowUpPublisher: Send + Sync {
    fn publish(&self, request: FollowUpRequest) -> Result<(), FollowUpError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FollowUpError {
    #[error("follow-up transport unavailable: {0}")]
    Transport(String),
}
