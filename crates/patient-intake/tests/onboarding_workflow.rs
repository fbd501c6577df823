//! End-to-end scenarios for the onboarding wizard, driven only through the public crate API.

mod common {
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};

    use patient_intake::workflows::onboarding::{
        FollowUpError, FollowUpPublisher, FollowUpRequest, RegistrationSink,
        RegistrationSubmission, RepositoryError, SectionInput, SessionId, SessionRecord,
        SessionRepository, SinkError,
    };

    pub(super) fn personal() -> SectionInput {
        SectionInput::from(json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "dateOfBirth": "1990-01-01",
            "ssn": "123-45-6789",
            "gender": "female",
            "maritalStatus": "married",
            "phone": "(555) 123-4567",
            "email": "jane@example.com",
            "address": "1 Main St",
            "city": "Springfield",
            "state": "IL",
            "zipCode": "62701-1234"
        }))
    }

    pub(super) fn insurance() -> SectionInput {
        SectionInput::from(json!({
            "provider": "Acme Health",
            "policyNumber": "POL-1001",
            "groupNumber": "GRP-22",
            "subscriberName": "Jane Doe",
            "subscriberDOB": "1990-01-01",
            "relationshipToSubscriber": "self"
        }))
    }

    pub(super) fn medical() -> SectionInput {
        SectionInput::from(json!({ "currentMedications": "Lisinopril" }))
    }

    pub(super) fn emergency() -> SectionInput {
        SectionInput::from(json!({
            "primary": {
                "name": "John Doe",
                "relationship": "spouse",
                "phone": "(555) 987-6543",
                "email": ""
            },
            "secondary": {
                "name": "Sam Doe",
                "relationship": "sibling",
                "phone": "call after 5pm"
            }
        }))
    }

    pub(super) fn consent(financial_responsibility: bool) -> SectionInput {
        SectionInput::from(consent_json(financial_responsibility))
    }

    pub(super) fn consent_json(financial_responsibility: bool) -> Value {
        json!({
            "hipaaConsent": true,
            "treatmentConsent": true,
            "financialResponsibility": financial_responsibility,
            "communicationConsent": true
        })
    }

    pub(super) fn all_steps() -> Vec<SectionInput> {
        vec![personal(), insurance(), medical(), emergency(), consent(true)]
    }

    #[derive(Default)]
    pub(super) struct Sessions {
        records: Mutex<Vec<SessionRecord>>,
    }

    impl SessionRepository for Sessions {
        fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
            let mut guard = self.records.lock().expect("sessions mutex poisoned");
            if guard.iter().any(|existing| existing.id == record.id) {
                return Err(RepositoryError::Conflict);
            }
            guard.push(record.clone());
            Ok(record)
        }

        fn update(&self, record: SessionRecord) -> Result<(), RepositoryError> {
            let mut guard = self.records.lock().expect("sessions mutex poisoned");
            let slot = guard
                .iter_mut()
                .find(|existing| existing.id == record.id)
                .ok_or(RepositoryError::NotFound)?;
            *slot = record;
            Ok(())
        }

        fn fetch(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
            let guard = self.records.lock().expect("sessions mutex poisoned");
            Ok(guard.iter().find(|existing| &existing.id == id).cloned())
        }

        fn remove(&self, id: &SessionId) -> Result<(), RepositoryError> {
            let mut guard = self.records.lock().expect("sessions mutex poisoned");
            guard.retain(|existing| &existing.id != id);
            Ok(())
        }
    }

    #[derive(Default)]
    pub(super) struct Sink {
        pub(super) received: Mutex<Vec<RegistrationSubmission>>,
    }

    impl RegistrationSink for Sink {
        fn submit(&self, submission: RegistrationSubmission) -> Result<(), SinkError> {
            self.received
                .lock()
                .expect("sink mutex poisoned")
                .push(submission);
            Ok(())
        }
    }

    #[derive(Default)]
    pub(super) struct FollowUps;

    impl FollowUpPublisher for FollowUps {
        fn publish(&self, _request: FollowUpRequest) -> Result<(), FollowUpError> {
            Ok(())
        }
    }

    pub(super) fn shared() -> (Arc<Sessions>, Arc<Sink>, Arc<FollowUps>) {
        (
            Arc::new(Sessions::default()),
            Arc::new(Sink::default()),
            Arc::new(FollowUps),
        )
    }
}

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use common::*;
use patient_intake::workflows::onboarding::{
    format_phone, merge, OnboardingBlueprint, OnboardingService, OnboardingStep, Record,
    SectionData, SectionInput, WizardState,
};

#[test]
fn blueprint_has_six_ordered_steps() {
    let blueprint = OnboardingBlueprint::standard();
    let steps: Vec<OnboardingStep> = blueprint.steps().iter().map(|step| step.step).collect();

    assert_eq!(blueprint.len(), OnboardingStep::COUNT);
    assert_eq!(steps, OnboardingStep::ordered().to_vec());
    assert_eq!(blueprint.terminal_index(), 5);
}

#[test]
fn jane_doe_moves_from_personal_to_insurance() {
    let blueprint = OnboardingBlueprint::standard();
    let mut state = WizardState::new();
    state.start();

    state
        .advance(&blueprint, 0, &personal())
        .expect("personal information accepted");

    assert_eq!(state.current_step_index(), 1);
    let info = &state.record().personal_info;
    assert_eq!(info.first_name, "Jane");
    assert_eq!(info.zip_code, "62701-1234");
    let view = state.current_step(&blueprint).expect("insurance step");
    assert_eq!(view.title, "Insurance Details");
}

#[test]
fn missing_financial_acknowledgment_blocks_step_four() {
    let blueprint = OnboardingBlueprint::standard();
    let mut state = WizardState::new();
    state.start();
    for (index, input) in all_steps().iter().enumerate().take(4) {
        state.advance(&blueprint, index, input).expect("accepted");
    }

    let error = state
        .advance(&blueprint, 4, &consent(false))
        .expect_err("consent gate holds");

    assert_eq!(error.errors().len(), 1);
    assert_eq!(
        error.message_for("financialResponsibility"),
        Some("Financial responsibility acknowledgment is required")
    );
    assert_eq!(state.current_step_index(), 4);
}

#[test]
fn complete_walk_assembles_every_section() {
    let blueprint = OnboardingBlueprint::standard();
    let mut state = WizardState::new();
    state.start();
    for (index, input) in all_steps().iter().enumerate() {
        state.advance(&blueprint, index, input).expect("accepted");
    }

    let record = state.assembled_record(&blueprint).expect("record assembled");
    assert_eq!(record.insurance.provider, "Acme Health");
    assert_eq!(record.medical_history.current_medications, "Lisinopril");
    assert!(record.medical_history.allergies.is_empty());
    assert_eq!(record.emergency_contacts.secondary.phone, "call after 5pm");
    assert!(record.consent.all_granted());
}

#[test]
fn retreat_then_resubmitting_same_data_is_stable() {
    let blueprint = OnboardingBlueprint::standard();
    let mut state = WizardState::new();
    state.start();
    for (index, input) in all_steps().iter().enumerate().take(3) {
        state.advance(&blueprint, index, input).expect("accepted");
    }
    let before = state.clone();

    state.retreat(&blueprint);
    state
        .advance(&blueprint, 2, &medical())
        .expect("same data accepted");

    assert_eq!(state, before);
}

#[test]
fn merge_and_prefill_agree() {
    let blueprint = OnboardingBlueprint::standard();
    let data = blueprint
        .validate(1, &insurance())
        .into_result()
        .expect("insurance accepted");

    let record = merge(&Record::default(), data.clone());
    let prefill = SectionInput::from(&record.section(data.key()));
    assert_eq!(
        blueprint.validate(1, &prefill).into_result().expect("prefill valid"),
        data
    );
    assert!(matches!(data, SectionData::Insurance(_)));
}

#[test]
fn phone_formatter_feeds_the_phone_rule() {
    let blueprint = OnboardingBlueprint::standard();
    let mut state = WizardState::new();
    state.start();

    let typed = personal().with_text("phone", format_phone("555 123 4567 ext 9"));
    state
        .advance(&blueprint, 0, &typed)
        .expect("formatted phone accepted");
    assert_eq!(state.record().personal_info.phone, "(555) 123-4567");
}

#[tokio::test]
async fn http_session_completes_and_hands_off() {
    let (sessions, sink, follow_ups) = shared();
    let service = Arc::new(OnboardingService::new(sessions, sink.clone(), follow_ups));
    let router = patient_intake::workflows::onboarding::onboarding_router(service.clone());

    let session = service.open_session().expect("session opens");
    service.start(&session.id).expect("session starts");
    for (index, input) in all_steps().iter().enumerate().take(4) {
        service
            .advance(&session.id, index, input)
            .expect("accepted");
    }

    let response = router
        .clone()
        .oneshot(
            Request::post(format!(
                "/api/v1/onboarding/sessions/{}/advance",
                session.id.0
            ))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({ "step_index": 4, "data": consent_json(true) }))
                    .unwrap(),
            ))
            .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::get(format!(
                "/api/v1/onboarding/sessions/{}/summary",
                session.id.0
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let summary: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
    assert_eq!(summary["greeting"], json!("Welcome, Jane!"));
    assert_eq!(summary["has_secondary_contact"], json!(true));

    let received = sink.received.lock().expect("sink mutex poisoned");
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].session_id, session.id);
}
