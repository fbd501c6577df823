use metrics_exporter_prometheus::PrometheusHandle;
use patient_intake::workflows::onboarding::{
    FollowUpError, FollowUpPublisher, FollowUpRequest, RegistrationSink, RegistrationSubmission,
    RepositoryError, SessionId, SessionRecord, SessionRepository, SinkError,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Session store bounded by `APP_SESSION_CAPACITY`.
#[derive(Clone)]
pub(crate) struct InMemorySessionRepository {
    records: Arc<Mutex<HashMap<SessionId, SessionRecord>>>,
    capacity: usize,
}

impl InMemorySessionRepository {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            capacity,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        if guard.len() >= self.capacity {
            return Err(RepositoryError::Unavailable(format!(
                "session capacity of {} reached",
                self.capacity
            )));
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: SessionRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

/// Holds completed registrations until a real intake system is wired in.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRegistrationSink {
    submissions: Arc<Mutex<Vec<RegistrationSubmission>>>,
}

impl RegistrationSink for InMemoryRegistrationSink {
    fn submit(&self, submission: RegistrationSubmission) -> Result<(), SinkError> {
        info!(session_id = %submission.session_id.0, "registration received");
        let mut guard = self.submissions.lock().expect("sink mutex poisoned");
        guard.push(submission);
        Ok(())
    }
}

impl InMemoryRegistrationSink {
    pub(crate) fn submissions(&self) -> Vec<RegistrationSubmission> {
        self.submissions.lock().expect("sink mutex poisoned").clone()
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryFollowUpPublisher {
    events: Arc<Mutex<Vec<FollowUpRequest>>>,
}

impl FollowUpPublisher for InMemoryFollowUpPublisher {
    fn publish(&self, request: FollowUpRequest) -> Result<(), FollowUpError> {
        let mut guard = self.events.lock().expect("follow-up mutex poisoned");
        guard.push(request);
        Ok(())
    }
}

impl InMemoryFollowUpPublisher {
    pub(crate) fn events(&self) -> Vec<FollowUpRequest> {
        self.events.lock().expect("follow-up mutex poisoned").clone()
    }
}
