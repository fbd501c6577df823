use crate::workflows::onboarding::domain::FieldValue;
use crate::workflows::onboarding::rules::{
    format_phone, is_canonical_phone, FieldRule, RuleOutcome, INVALID_EMAIL_MESSAGE,
    PHONE_FORMAT_MESSAGE,
};

fn text(value: &str) -> FieldValue {
    FieldValue::text(value)
}

#[test]
fn format_phone_builds_canonical_shape_from_ten_digits() {
    let formatted = format_phone("5551234567");
    assert_eq!(formatted, "(555) 123-4567");
    assert!(is_canonical_phone(&formatted));
}

#[test]
fn format_phone_is_stable_on_canonical_input() {
    assert_eq!(format_phone("(555) 123-4567"), "(555) 123-4567");
    assert_eq!(format_phone("555.123.4567"), "(555) 123-4567");
}

#[test]
fn format_phone_formats_progressively() {
    assert_eq!(format_phone(""), "");
    assert_eq!(format_phone("55"), "(55");
    assert_eq!(format_phone("555"), "(555");
    assert_eq!(format_phone("5551"), "(555) 1");
    assert_eq!(format_phone("555123"), "(555) 123");
    assert_eq!(format_phone("5551234"), "(555) 123-4");
}

#[test]
fn format_phone_drops_digits_past_ten() {
    assert_eq!(format_phone("555123456789"), "(555) 123-4567");
}

#[test]
fn partial_phone_still_fails_pattern() {
    let formatted = format_phone("555123");
    assert_eq!(
        FieldRule::phone().check(Some(&text(&formatted))),
        RuleOutcome::Invalid(PHONE_FORMAT_MESSAGE.to_string())
    );
    assert!(FieldRule::phone()
        .check(Some(&text("(555) 123-4567")))
        .is_valid());
}

#[test]
fn required_text_rejects_blank_and_missing_values() {
    let rule = FieldRule::required("First name is required");
    let expected = RuleOutcome::Invalid("First name is required".to_string());

    assert_eq!(rule.check(None), expected);
    assert_eq!(rule.check(Some(&text("   "))), expected);
    assert_eq!(rule.check(Some(&FieldValue::Flag(true))), expected);
    assert!(rule.check(Some(&text(" Jane "))).is_valid());
}

#[test]
fn array_values_are_never_accepted_as_text() {
    let rule = FieldRule::required("First name is required");
    let outcome = rule.check(Some(&FieldValue::Unsupported("array")));
    assert_eq!(
        outcome,
        RuleOutcome::Invalid("Expected a single value".to_string())
    );
    assert!(!FieldRule::OptionalText
        .check(Some(&FieldValue::Unsupported("array")))
        .is_valid());
}

#[test]
fn optional_email_accepts_empty_but_not_malformed() {
    let rule = FieldRule::Email { optional: true };
    assert!(rule.check(None).is_valid());
    assert!(rule.check(Some(&text(""))).is_valid());
    assert!(rule.check(Some(&text("john@example.org"))).is_valid());
    assert_eq!(
        rule.check(Some(&text("john@"))),
        RuleOutcome::Invalid(INVALID_EMAIL_MESSAGE.to_string())
    );
}

#[test]
fn required_email_rejects_empty() {
    let rule = FieldRule::Email { optional: false };
    assert!(!rule.check(None).is_valid());
    assert!(!rule.check(Some(&text("  "))).is_valid());
    assert!(rule.check(Some(&text("jane@example.com"))).is_valid());
}

#[test]
fn must_be_true_only_accepts_a_true_flag() {
    let rule = FieldRule::must_be_true("HIPAA consent is required to proceed");
    assert!(rule.check(Some(&FieldValue::Flag(true))).is_valid());
    assert!(!rule.check(Some(&FieldValue::Flag(false))).is_valid());
    assert!(!rule.check(Some(&text("true"))).is_valid());
    assert!(!rule.check(None).is_valid());
}

#[test]
fn iso_date_requires_a_real_calendar_day() {
    let rule = FieldRule::IsoDate {
        message: "Date must be in format: YYYY-MM-DD",
    };
    assert!(rule.check(Some(&text("1990-01-01"))).is_valid());
    assert!(!rule.check(Some(&text("1990-02-30"))).is_valid());
    assert!(!rule.check(Some(&text("1990-1-1"))).is_valid());
    assert!(!rule.check(Some(&text("01/01/1990"))).is_valid());
}

#[test]
fn combined_rules_report_the_first_failure() {
    let rule = FieldRule::All(vec![
        FieldRule::required("Date of birth is required"),
        FieldRule::IsoDate {
            message: "Date must be in format: YYYY-MM-DD",
        },
    ]);
    assert_eq!(
        rule.check(None),
        RuleOutcome::Invalid("Date of birth is required".to_string())
    );
    assert_eq!(
        rule.check(Some(&text("tomorrow"))),
        RuleOutcome::Invalid("Date must be in format: YYYY-MM-DD".to_string())
    );
}
