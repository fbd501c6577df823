use chrono::NaiveDate;
use serde::Serialize;

use super::domain::Record;

/// Confirmation shown once every step has been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationSummary {
    pub greeting: String,
    pub patient_name: String,
    pub date_of_birth: String,
    pub ssn_last_four: String,
    pub phone: String,
    pub email: String,
    pub insurance_provider: String,
    pub policy_number: String,
    pub emergency_contact: String,
    pub emergency_contact_relationship: String,
    pub has_secondary_contact: bool,
    pub consents_complete: bool,
    pub next_steps: Vec<NextStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextStep {
    pub title: &'static str,
    pub detail: &'static str,
}

impl RegistrationSummary {
    pub fn from_record(record: &Record) -> Self {
        let personal = &record.personal_info;
        let contacts = &record.emergency_contacts;

        Self {
            greeting: format!("Welcome, {}!", personal.first_name),
            patient_name: format!("{} {}", personal.first_name, personal.last_name)
                .trim()
                .to_string(),
            date_of_birth: display_date(&personal.date_of_birth),
            ssn_last_four: mask_ssn(&personal.ssn),
            phone: personal.phone.clone(),
            email: personal.email.clone(),
            insurance_provider: record.insurance.provider.clone(),
            policy_number: record.insurance.policy_number.clone(),
            emergency_contact: contacts.primary.name.clone(),
            emergency_contact_relationship: contacts.primary.relationship.clone(),
            has_secondary_contact: !contacts.secondary.is_empty(),
            consents_complete: record.consent.all_granted(),
            next_steps: standard_next_steps(),
        }
    }
}

fn standard_next_steps() -> Vec<NextStep> {
    vec![
        NextStep {
            title: "Schedule Your First Visit",
            detail: "Book an appointment with your primary care provider to establish care.",
        },
        NextStep {
            title: "Insurance Verification",
            detail: "Insurance details will be verified before your first appointment.",
        },
    ]
}

/// `YYYY-MM-DD` becomes `MM/DD/YYYY`; anything unparseable is shown as entered.
fn display_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.format("%m/%d/%Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn mask_ssn(ssn: &str) -> String {
    let digits: Vec<char> = ssn.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return String::new();
    }
    let last_four: String = digits[digits.len() - 4..].iter().collect();
    format!("***-**-{last_four}")
}
