use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use super::blueprint::OnboardingBlueprint;
use super::domain::{Record, SectionInput};
use super::repository::{
    FollowUpError, FollowUpKind, FollowUpPublisher, FollowUpRequest, RegistrationSink,
    RegistrationSubmission, RepositoryError, SessionId, SessionRecord, SessionRepository,
    SessionView, SinkError,
};
use super::schema::{ValidationError, ValidationResult};
use super::summary::RegistrationSummary;

/// Service composing the blueprint, session storage, and the outbound hooks.
///
/// Transitions on one session are serialized: each fetch, transition and update cycle holds
/// that session's lock, so concurrent requests never interleave on the same record.
pub struct OnboardingService<R, S, F> {
    blueprint: Arc<OnboardingBlueprint>,
    sessions: Arc<R>,
    sink: Arc<S>,
    follow_ups: Arc<F>,
    session_locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("session-{id:06}"))
}

impl<R, S, F> OnboardingService<R, S, F>
where
    R: SessionRepository + 'static,
    S: RegistrationSink + 'static,
    F: FollowUpPublisher + 'static,
{
    pub fn new(sessions: Arc<R>, sink: Arc<S>, follow_ups: Arc<F>) -> Self {
        Self::with_blueprint(OnboardingBlueprint::standard(), sessions, sink, follow_ups)
    }

    pub fn with_blueprint(
        blueprint: OnboardingBlueprint,
        sessions: Arc<R>,
        sink: Arc<S>,
        follow_ups: Arc<F>,
    ) -> Self {
        Self {
            blueprint: Arc::new(blueprint),
            sessions,
            sink,
            follow_ups,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn blueprint(&self) -> &OnboardingBlueprint {
        &self.blueprint
    }

    /// Create an un-started session with an empty record.
    pub fn open_session(&self) -> Result<SessionRecord, OnboardingServiceError> {
        let record = self.sessions.insert(SessionRecord::new(next_session_id()))?;
        info!(session_id = %record.id.0, "onboarding session opened");
        Ok(record)
    }

    pub fn start(&self, id: &SessionId) -> Result<SessionRecord, OnboardingServiceError> {
        let lock = self.session_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut record = self.load(id)?;
        record.state.start();
        self.sessions.update(record.clone())?;
        Ok(record)
    }

    /// Validate and merge data for the active step. Every arrival at the completion step hands
    /// the assembled record to the registration sink before the new state is stored.
    pub fn advance(
        &self,
        id: &SessionId,
        step_index: usize,
        input: &SectionInput,
    ) -> Result<SessionRecord, OnboardingServiceError> {
        let lock = self.session_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut record = self.load(id)?;
        let before = record.state.current_step_index();

        if let Err(error) = record.state.advance(&self.blueprint, step_index, input) {
            let fields: Vec<&String> = error.errors().keys().collect();
            info!(session_id = %id.0, step_index, ?fields, "step data rejected");
            return Err(error.into());
        }

        let after = record.state.current_step_index();
        if after != before {
            debug!(session_id = %id.0, from = before, to = after, "step accepted");
        }

        if after != before && record.state.is_complete(&self.blueprint) {
            self.sink.submit(RegistrationSubmission {
                session_id: record.id.clone(),
                record: record.state.record().clone(),
            })?;
            record.submitted = true;
            info!(session_id = %id.0, "registration complete and handed off");
        }

        self.sessions.update(record.clone())?;
        Ok(record)
    }

    /// Step back one position. Leaving the completion step clears `submitted`.
    pub fn retreat(&self, id: &SessionId) -> Result<SessionRecord, OnboardingServiceError> {
        let lock = self.session_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut record = self.load(id)?;
        let was_complete = record.state.is_complete(&self.blueprint);
        record.state.retreat(&self.blueprint);
        if was_complete && !record.state.is_complete(&self.blueprint) {
            record.submitted = false;
        }
        self.sessions.update(record.clone())?;
        Ok(record)
    }

    /// Discard everything entered so far and return to the introductory view.
    pub fn reset(&self, id: &SessionId) -> Result<SessionRecord, OnboardingServiceError> {
        let lock = self.session_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut record = self.load(id)?;
        record.state.reset();
        record.submitted = false;
        self.sessions.update(record.clone())?;
        info!(session_id = %id.0, "onboarding session reset");
        Ok(record)
    }

    pub fn close_session(&self, id: &SessionId) -> Result<(), OnboardingServiceError> {
        let lock = self.session_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.sessions.remove(id)?;
        self.session_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        Ok(())
    }

    pub fn current_step(&self, id: &SessionId) -> Result<SessionView, OnboardingServiceError> {
        let record = self.load(id)?;
        Ok(record.view(&self.blueprint))
    }

    pub fn assembled_record(&self, id: &SessionId) -> Result<Record, OnboardingServiceError> {
        let record = self.load(id)?;
        record
            .state
            .assembled_record(&self.blueprint)
            .cloned()
            .ok_or_else(|| OnboardingServiceError::NotComplete(id.0.clone()))
    }

    pub fn summary(&self, id: &SessionId) -> Result<RegistrationSummary, OnboardingServiceError> {
        let record = self.assembled_record(id)?;
        Ok(RegistrationSummary::from_record(&record))
    }

    /// Run a step schema without touching any session, for field feedback while typing.
    pub fn preview_step(&self, step_index: usize, input: &SectionInput) -> ValidationResult {
        self.blueprint.validate(step_index, input)
    }

    /// Ask an external collaborator to act on a completed registration.
    pub fn request_follow_up(
        &self,
        id: &SessionId,
        kind: FollowUpKind,
    ) -> Result<FollowUpRequest, OnboardingServiceError> {
        let record = self.assembled_record(id)?;

        let mut details = BTreeMap::new();
        details.insert(
            "patient_name".to_string(),
            format!(
                "{} {}",
                record.personal_info.first_name, record.personal_info.last_name
            ),
        );
        if kind == FollowUpKind::InsuranceVerification {
            details.insert("provider".to_string(), record.insurance.provider.clone());
            details.insert(
                "policy_number".to_string(),
                record.insurance.policy_number.clone(),
            );
        }

        let request = FollowUpRequest {
            kind,
            session_id: id.clone(),
            details,
        };
        self.follow_ups.publish(request.clone())?;
        info!(session_id = %id.0, kind = kind.label(), "follow-up requested");
        Ok(request)
    }

    fn session_lock(&self, id: &SessionId) -> Arc<Mutex<()>> {
        let mut locks = self
            .session_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(id.clone()).or_default().clone()
    }

    fn load(&self, id: &SessionId) -> Result<SessionRecord, OnboardingServiceError> {
        let record = self.sessions.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

/// Error raised by the onboarding service.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    FollowUp(#[from] FollowUpError),
    #[error("registration for session {0} is not complete")]
    NotComplete(String),
}
