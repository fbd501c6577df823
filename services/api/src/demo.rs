use crate::infra::{
    InMemoryFollowUpPublisher, InMemoryRegistrationSink, InMemorySessionRepository,
};
use clap::Args;
use patient_intake::config::OnboardingConfig;
use patient_intake::error::AppError;
use patient_intake::workflows::onboarding::{
    format_phone, FollowUpKind, OnboardingBlueprint, OnboardingService, OnboardingServiceError,
    SectionInput, SessionView, ValidationResult,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Submit an invalid attempt before each corrected step to show field errors.
    #[arg(long)]
    pub(crate) show_rejections: bool,
    /// Print the assembled registration record as JSON at the end.
    #[arg(long)]
    pub(crate) print_record: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Zero-based step index (0 = personal information, 4 = consent)
    #[arg(long)]
    pub(crate) step: usize,
    /// JSON file holding the step data
    #[arg(long)]
    pub(crate) input: PathBuf,
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.input)?;
    let value: Value = serde_json::from_str(&raw)?;
    let blueprint = OnboardingBlueprint::standard();
    let title = blueprint
        .step(args.step)
        .map(|template| template.step.label())
        .unwrap_or("Unknown step");

    match blueprint.validate(args.step, &SectionInput::from(value)) {
        ValidationResult::Accepted(data) => {
            println!("{} ({}): accepted", title, args.input.display());
            match serde_json::to_string_pretty(&data) {
                Ok(json) => println!("{json}"),
                Err(err) => println!("Normalized data unavailable: {err}"),
            }
            Ok(())
        }
        ValidationResult::Rejected(error) => {
            println!("{} ({}): rejected", title, args.input.display());
            for (field, message) in error.errors() {
                println!("- {field}: {message}");
            }
            Err(OnboardingServiceError::from(error).into())
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        show_rejections,
        print_record,
    } = args;

    let sessions = Arc::new(InMemorySessionRepository::with_capacity(
        OnboardingConfig::default().session_capacity,
    ));
    let sink = Arc::new(InMemoryRegistrationSink::default());
    let follow_ups = Arc::new(InMemoryFollowUpPublisher::default());
    let service = OnboardingService::new(sessions.clone(), sink.clone(), follow_ups.clone());

    println!("Patient onboarding demo");
    let session = service.open_session()?;
    println!("- Opened {}", session.id.0);
    let started = service.start(&session.id)?;
    render_step(&started.view(service.blueprint()));

    for (index, (input, invalid)) in demo_steps().into_iter().enumerate() {
        if show_rejections {
            if let Some(invalid) = invalid {
                match service.advance(&session.id, index, &SectionInput::from(invalid)) {
                    Err(OnboardingServiceError::Validation(error)) => {
                        println!("  Rejected attempt:");
                        for (field, message) in error.errors() {
                            println!("    - {field}: {message}");
                        }
                    }
                    Err(other) => return Err(other.into()),
                    Ok(_) => println!("  Invalid attempt was unexpectedly accepted"),
                }
            }
        }

        let record = service.advance(&session.id, index, &SectionInput::from(input))?;
        render_step(&record.view(service.blueprint()));
    }

    let summary = service.summary(&session.id)?;
    println!("\n{}", summary.greeting);
    println!("- Patient: {} (born {})", summary.patient_name, summary.date_of_birth);
    println!("- SSN on file: {}", summary.ssn_last_four);
    println!("- Contact: {} | {}", summary.phone, summary.email);
    println!(
        "- Insurance: {} (policy {})",
        summary.insurance_provider, summary.policy_number
    );
    println!(
        "- Emergency contact: {} ({})",
        summary.emergency_contact, summary.emergency_contact_relationship
    );
    println!(
        "- Consents complete: {}",
        if summary.consents_complete { "yes" } else { "no" }
    );
    println!("Next steps:");
    for step in &summary.next_steps {
        println!("  - {}: {}", step.title, step.detail);
    }

    service.request_follow_up(&session.id, FollowUpKind::ScheduleAppointment)?;
    service.request_follow_up(&session.id, FollowUpKind::InsuranceVerification)?;

    println!(
        "\nHand-off: {} registration(s) delivered, {} follow-up(s) queued, {} session(s) stored",
        sink.submissions().len(),
        follow_ups.events().len(),
        sessions.len()
    );
    for event in follow_ups.events() {
        println!("  - {} for {}", event.kind.label(), event.session_id.0);
    }

    if print_record {
        let record = service.assembled_record(&session.id)?;
        match serde_json::to_string_pretty(&record) {
            Ok(json) => println!("\nAssembled record:\n{json}"),
            Err(err) => println!("\nAssembled record unavailable: {err}"),
        }
    }

    Ok(())
}

fn render_step(view: &SessionView) {
    match &view.step {
        Some(step) if step.is_terminal => {
            println!(
                "Step {}/{}: {} ({}%)",
                step.position, step.total_steps, step.title, step.progress_percent
            );
        }
        Some(step) => {
            let required = step.fields.iter().filter(|field| field.required).count();
            println!(
                "Step {}/{}: {} ({}%) - {} field(s), {} required",
                step.position,
                step.total_steps,
                step.title,
                step.progress_percent,
                step.fields.len(),
                required
            );
        }
        None => println!("Session {} has not started", view.session_id.0),
    }
}

/// Valid data for each editable step, paired with an optional invalid first attempt.
fn demo_steps() -> Vec<(Value, Option<Value>)> {
    let personal = json!({
        "firstName": "Jane",
        "lastName": "Doe",
        "dateOfBirth": "1990-01-01",
        "ssn": "123-45-6789",
        "gender": "female",
        "maritalStatus": "single",
        "phone": format_phone("555 123 4567"),
        "email": "jane.doe@example.com",
        "address": "1 Main St",
        "city": "Springfield",
        "state": "IL",
        "zipCode": "62701"
    });
    let mut personal_invalid = personal.clone();
    personal_invalid["phone"] = json!("5551234567");
    personal_invalid["email"] = json!("jane.doe@");

    let consent = json!({
        "hipaaConsent": true,
        "treatmentConsent": true,
        "financialResponsibility": true,
        "communicationConsent": true
    });
    let mut consent_invalid = consent.clone();
    consent_invalid["financialResponsibility"] = json!(false);

    vec![
        (personal, Some(personal_invalid)),
        (
            json!({
                "provider": "Acme Health",
                "policyNumber": "POL-1001",
                "groupNumber": "GRP-22",
                "subscriberName": "Jane Doe",
                "subscriberDOB": "1990-01-01",
                "relationshipToSubscriber": "self"
            }),
            Some(json!({ "provider": "Acme Health" })),
        ),
        (
            json!({
                "primaryPhysician": "Dr. Smith",
                "allergies": "Penicillin"
            }),
            None,
        ),
        (
            json!({
                "primary": {
                    "name": "John Doe",
                    "relationship": "spouse",
                    "phone": "(555) 987-6543"
                }
            }),
            Some(json!({ "primary": { "name": "John Doe" } })),
        ),
        (consent, Some(consent_invalid)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_steps_pass_their_schemas() {
        let blueprint = OnboardingBlueprint::standard();
        for (index, (valid, invalid)) in demo_steps().into_iter().enumerate() {
            assert!(
                blueprint
                    .validate(index, &SectionInput::from(valid))
                    .is_accepted(),
                "step {index} sample accepted"
            );
            if let Some(invalid) = invalid {
                assert!(!blueprint
                    .validate(index, &SectionInput::from(invalid))
                    .is_accepted());
            }
        }
    }

    #[test]
    fn demo_runs_end_to_end() {
        run_demo(DemoArgs {
            show_rejections: true,
            print_record: true,
        })
        .expect("demo completes");
    }
}
