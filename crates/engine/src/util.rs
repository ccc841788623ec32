//! Internal helpers for input validation and conversion.
//!
//! These utilities are **not** part of the public API. They hold the checks
//! that run before any allocation state is touched, so the sweep itself can
//! assume well-formed entities.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Longest accepted funding request name, in characters.
pub(crate) const MAX_NAME_CHARS: usize = 100;

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::KeyNotFound(format!("invalid {label} id")))
}

/// Trim and collapse inner whitespace, enforcing `1..=MAX_NAME_CHARS` chars.
pub(crate) fn normalize_name_display(value: &str) -> ResultEngine<String> {
    let display = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if display.is_empty() {
        return Err(EngineError::InvalidName("name must not be empty".to_string()));
    }
    if display.chars().count() > MAX_NAME_CHARS {
        return Err(EngineError::InvalidName(format!(
            "name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(display)
}

/// Uniqueness key for a name: case, accents and punctuation are ignored.
pub(crate) fn normalize_name_key(value: &str) -> ResultEngine<String> {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in value.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    let key = out.trim_end();
    if key.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "name '{value}' has no letters or digits"
        )));
    }
    Ok(key.to_string())
}

pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn validate_positive_amount(amount: i64, label: &str) -> ResultEngine<()> {
    if amount <= 0 {
        return Err(EngineError::InvalidAmount(format!("{label} must be > 0")));
    }
    Ok(())
}
