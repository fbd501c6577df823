use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::onboarding::blueprint::OnboardingBlueprint;
use crate::workflows::onboarding::domain::SectionInput;
use crate::workflows::onboarding::instance::WizardState;
use crate::workflows::onboarding::repository::{
    FollowUpError, FollowUpPublisher, FollowUpRequest, RegistrationSink, RegistrationSubmission,
    RepositoryError, SessionId, SessionRecord, SessionRepository, SinkError,
};
use crate::workflows::onboarding::{onboarding_router, OnboardingService};

pub(super) fn personal_input() -> SectionInput {
    SectionInput::new()
        .with_text("firstName", "Jane")
        .with_text("lastName", "Doe")
        .with_text("dateOfBirth", "1990-01-01")
        .with_text("ssn", "123-45-6789")
        .with_text("gender", "female")
        .with_text("maritalStatus", "single")
        .with_text("phone", "(555) 123-4567")
        .with_text("email", "jane@example.com")
        .with_text("address", "1 Main St")
        .with_text("city", "Springfield")
        .with_text("state", "IL")
        .with_text("zipCode", "62701")
}

pub(super) fn insurance_input() -> SectionInput {
    SectionInput::new()
        .with_text("provider", "Acme Health")
        .with_text("policyNumber", "POL-1001")
        .with_text("groupNumber", "GRP-22")
        .with_text("subscriberName", "Jane Doe")
        .with_text("subscriberDOB", "1990-01-01")
        .with_text("relationshipToSubscriber", "self")
}

pub(super) fn medical_input() -> SectionInput {
    SectionInput::new()
        .with_text("primaryPhysician", "Dr. Smith")
        .with_text("allergies", "Penicillin")
}

pub(super) fn emergency_input() -> SectionInput {
    SectionInput::new()
        .with_text("primary.name", "John Doe")
        .with_text("primary.relationship", "spouse")
        .with_text("primary.phone", "(555) 987-6543")
}

pub(super) fn consent_input() -> SectionInput {
    SectionInput::new()
        .with_flag("hipaaConsent", true)
        .with_flag("treatmentConsent", true)
        .with_flag("financialResponsibility", true)
        .with_flag("communicationConsent", true)
}

/// Inputs for every editable step, in blueprint order.
pub(super) fn step_inputs() -> Vec<SectionInput> {
    vec![
        personal_input(),
        insurance_input(),
        medical_input(),
        emergency_input(),
        consent_input(),
    ]
}

/// Started state sitting at `step_index` with every earlier step accepted.
pub(super) fn state_at(blueprint: &OnboardingBlueprint, step_index: usize) -> WizardState {
    let mut state = WizardState::new();
    state.start();
    for (index, input) in step_inputs().iter().enumerate().take(step_index) {
        state
            .advance(blueprint, index, input)
            .expect("fixture step accepted");
    }
    state
}

pub(super) type TestService = OnboardingService<MemorySessions, MemorySink, MemoryFollowUps>;

pub(super) fn build_service() -> (
    TestService,
    Arc<MemorySessions>,
    Arc<MemorySink>,
    Arc<MemoryFollowUps>,
) {
    let sessions = Arc::new(MemorySessions::default());
    let sink = Arc::new(MemorySink::default());
    let follow_ups = Arc::new(MemoryFollowUps::default());
    let service = OnboardingService::new(sessions.clone(), sink.clone(), follow_ups.clone());
    (service, sessions, sink, follow_ups)
}

/// Drive a fresh session through every editable step.
pub(super) fn completed_session(service: &TestService) -> SessionId {
    let session = service.open_session().expect("session opens");
    service.start(&session.id).expect("session starts");
    for (index, input) in step_inputs().iter().enumerate() {
        service
            .advance(&session.id, index, input)
            .expect("fixture step accepted");
    }
    session.id
}

#[derive(Default, Clone)]
pub(super) struct MemorySessions {
    pub(super) records: Arc<Mutex<HashMap<SessionId, SessionRecord>>>,
}

impl SessionRepository for MemorySessions {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: SessionRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySink {
    submissions: Arc<Mutex<Vec<RegistrationSubmission>>>,
}

impl MemorySink {
    pub(super) fn submissions(&self) -> Vec<RegistrationSubmission> {
        self.submissions.lock().expect("sink mutex poisoned").clone()
    }
}

impl RegistrationSink for MemorySink {
    fn submit(&self, submission: RegistrationSubmission) -> Result<(), SinkError> {
        self.submissions
            .lock()
            .expect("sink mutex poisoned")
            .push(submission);
        Ok(())
    }
}

pub(super) struct OfflineSink;

impl RegistrationSink for OfflineSink {
    fn submit(&self, _submission: RegistrationSubmission) -> Result<(), SinkError> {
        Err(SinkError::Transport("intake endpoint offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryFollowUps {
    events: Arc<Mutex<Vec<FollowUpRequest>>>,
}

impl MemoryFollowUps {
    pub(super) fn events(&self) -> Vec<FollowUpRequest> {
        self.events.lock().expect("follow-up mutex poisoned").clone()
    }
}

impl FollowUpPublisher for MemoryFollowUps {
    fn publish(&self, request: FollowUpRequest) -> Result<(), FollowUpError> {
        self.events
            .lock()
            .expect("follow-up mutex poisoned")
            .push(request);
        Ok(())
    }
}

/// Session store that stalls on every read, widening the window between fetch and update.
#[derive(Default, Clone)]
pub(super) struct SlowSessions {
    pub(super) inner: MemorySessions,
}

impl SessionRepository for SlowSessions {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, record: SessionRecord) -> Result<(), RepositoryError> {
        self.inner.update(record)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        std::thread::sleep(std::time::Duration::from_millis(50));
        self.inner.fetch(id)
    }

    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError> {
        self.inner.remove(id)
    }
}

pub(super) struct UnavailableSessions;

impl SessionRepository for UnavailableSessions {
    fn insert(&self, _record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn update(&self, _record: SessionRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn remove(&self, _id: &SessionId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    onboarding_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
