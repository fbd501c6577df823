//! Field-level validation rules and the phone number formatter.
//!
//! Rules are pure and total: any candidate value, including missing or oddly shaped input,
//! produces a [`RuleOutcome`] rather than an error.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::domain::FieldValue;

pub const PHONE_FORMAT_MESSAGE: &str = "Phone must be in format: (123) 456-7890";
pub const INVALID_EMAIL_MESSAGE: &str = "Invalid email address";
const UNSUPPORTED_VALUE_MESSAGE: &str = "Expected a single value";

pub(crate) static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d{3}\) \d{3}-\d{4}$").unwrap());

pub(crate) static SSN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-\d{2}-\d{4}$").unwrap());

pub(crate) static ZIP_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").unwrap());

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$").unwrap()
});

/// Outcome of checking a single candidate value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Valid,
    Invalid(String),
}

impl RuleOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, RuleOutcome::Valid)
    }
}

/// Validation rule attached to a field of a step schema.
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// Text whose trimmed form is non-empty.
    RequiredText { message: &'static str },
    /// Any text, including missing or empty.
    OptionalText,
    /// Text fully matching a fixed-format expression.
    Pattern { regex: Regex, message: &'static str },
    /// E-mail grammar; an empty value passes only when `optional`.
    Email { optional: bool },
    /// Boolean that must be exactly `expected`.
    MustEqual {
        expected: bool,
        message: &'static str,
    },
    /// Calendar date written as `YYYY-MM-DD`.
    IsoDate { message: &'static str },
    /// Every rule must pass; the first failure is reported.
    All(Vec<FieldRule>),
}

impl FieldRule {
    pub fn required(message: &'static str) -> Self {
        FieldRule::RequiredText { message }
    }

    pub fn phone() -> Self {
        FieldRule::Pattern {
            regex: PHONE_PATTERN.clone(),
            message: PHONE_FORMAT_MESSAGE,
        }
    }

    pub fn pattern(regex: &Regex, message: &'static str) -> Self {
        FieldRule::Pattern {
            regex: regex.clone(),
            message,
        }
    }

    pub fn must_be_true(message: &'static str) -> Self {
        FieldRule::MustEqual {
            expected: true,
            message,
        }
    }

    pub fn check(&self, value: Option<&FieldValue>) -> RuleOutcome {
        match self {
            FieldRule::RequiredText { message } => match value {
                Some(FieldValue::Text(text)) if !text.trim().is_empty() => RuleOutcome::Valid,
                Some(FieldValue::Unsupported(_)) => unsupported(),
                _ => RuleOutcome::Invalid((*message).to_string()),
            },
            FieldRule::OptionalText => match value {
                None | Some(FieldValue::Text(_)) => RuleOutcome::Valid,
                Some(_) => unsupported(),
            },
            FieldRule::Pattern { regex, message } => match value {
                Some(FieldValue::Text(text)) if regex.is_match(text.trim()) => RuleOutcome::Valid,
                _ => RuleOutcome::Invalid((*message).to_string()),
            },
            FieldRule::Email { optional } => match value {
                None if *optional => RuleOutcome::Valid,
                Some(FieldValue::Text(text)) => {
                    let text = text.trim();
                    if (text.is_empty() && *optional) || EMAIL_PATTERN.is_match(text) {
                        RuleOutcome::Valid
                    } else {
                        RuleOutcome::Invalid(INVALID_EMAIL_MESSAGE.to_string())
                    }
                }
                _ => RuleOutcome::Invalid(INVALID_EMAIL_MESSAGE.to_string()),
            },
            FieldRule::MustEqual { expected, message } => match value {
                Some(FieldValue::Flag(flag)) if flag == expected => RuleOutcome::Valid,
                _ => RuleOutcome::Invalid((*message).to_string()),
            },
            FieldRule::IsoDate { message } => match value {
                Some(FieldValue::Text(text)) if is_iso_date(text.trim()) => RuleOutcome::Valid,
                _ => RuleOutcome::Invalid((*message).to_string()),
            },
            FieldRule::All(rules) => rules
                .iter()
                .map(|rule| rule.check(value))
                .find(|outcome| !outcome.is_valid())
                .unwrap_or(RuleOutcome::Valid),
        }
    }
}

fn unsupported() -> RuleOutcome {
    RuleOutcome::Invalid(UNSUPPORTED_VALUE_MESSAGE.to_string())
}

fn is_iso_date(text: &str) -> bool {
    text.len() == 10 && NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}

/// Reformat raw keystrokes into the `(DDD) DDD-DDDD` shape as digits accumulate.
///
/// Non-digits are dropped and anything past the tenth digit is discarded. The result is only
/// a display aid; partial output still fails [`FieldRule::phone`].
pub fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).take(10).collect();
    let (area, rest) = digits.split_at(digits.len().min(3));
    let (exchange, line) = rest.split_at(rest.len().min(3));

    let mut formatted = String::with_capacity(14);
    if !area.is_empty() {
        formatted.push('(');
        formatted.push_str(area);
    }
    if !exchange.is_empty() {
        formatted.push_str(") ");
        formatted.push_str(exchange);
    }
    if !line.is_empty() {
        formatted.push('-');
        formatted.push_str(line);
    }
    formatted
}

pub fn is_canonical_phone(value: &str) -> bool {
    PHONE_PATTERN.is_match(value)
}
