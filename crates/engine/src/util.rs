//! Internal helpers for input validation and model conversion.
//!
//! These utilities are **not** part of the public API. They centralize the
//! field rules so every write path rejects the same inputs the same way.
//! Each `check_*` function records its failure into a [`ValidationErrors`]
//! and returns the normalized value, so callers can validate every field
//! before deciding whether to fail.

use unicode_normalization::UnicodeNormalization;

use crate::{Currency, ResultEngine, ValidationErrors};

pub(crate) const MAX_NAME_LEN: usize = 100;
pub(crate) const MAX_DESCRIPTION_LEN: usize = 255;
pub(crate) const MAX_ICON_LEN: usize = 50;
pub(crate) const MAX_CYCLE_DAY: i32 = 28;
/// Largest amount, limit or opening balance accepted on input.
pub const MAX_AMOUNT_MINOR: i64 = 1_000_000_000_000_000;

/// Trim, NFC-normalize and bound a display name.
pub(crate) fn check_name(errors: &mut ValidationErrors, field: &str, value: &str) -> String {
    let name: String = value.trim().nfc().collect();
    if name.is_empty() {
        errors.add(field, "must not be empty");
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.add(field, format!("must be at most {MAX_NAME_LEN} characters"));
    }
    name
}

pub(crate) fn check_description(errors: &mut ValidationErrors, value: &str) -> String {
    let description: String = value.trim().nfc().collect();
    if description.is_empty() {
        errors.add("description", "must not be empty");
    } else if description.chars().count() > MAX_DESCRIPTION_LEN {
        errors.add(
            "description",
            format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
        );
    }
    description
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Cosmetic color, `#RRGGBB`. Stored upper-case.
pub(crate) fn check_color(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
) -> Option<String> {
    let color = normalize_optional_text(value)?;
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        errors.add(field, "must be a hex color like #1A2B3C");
        return None;
    }
    Some(color.to_ascii_uppercase())
}

pub(crate) fn check_icon(errors: &mut ValidationErrors, value: Option<&str>) -> Option<String> {
    let icon = normalize_optional_text(value)?;
    if icon.chars().count() > MAX_ICON_LEN {
        errors.add("icon", format!("must be at most {MAX_ICON_LEN} characters"));
        return None;
    }
    Some(icon)
}

pub(crate) fn check_currency(errors: &mut ValidationErrors, value: &str) -> Option<Currency> {
    match Currency::try_from(value) {
        Ok(currency) => Some(currency),
        Err(_) => {
            errors.add("currency", "must be a three-letter currency code");
            None
        }
    }
}

/// Billing/due days are bounded to 1-28 so every month has them.
pub(crate) fn check_cycle_day(errors: &mut ValidationErrors, field: &str, value: Option<i32>) {
    if let Some(day) = value
        && !(1..=MAX_CYCLE_DAY).contains(&day)
    {
        errors.add(field, format!("must be between 1 and {MAX_CYCLE_DAY}"));
    }
}

pub(crate) fn check_last_four(errors: &mut ValidationErrors, value: Option<&str>) -> Option<String> {
    let digits = normalize_optional_text(value)?;
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        errors.add("last_four", "must be exactly 4 digits");
        return None;
    }
    Some(digits)
}

pub(crate) fn check_positive_amount(errors: &mut ValidationErrors, field: &str, amount: i64) {
    if amount <= 0 {
        errors.add(field, "must be > 0");
    } else {
        check_amount_bound(errors, field, amount);
    }
}

pub(crate) fn check_non_negative_amount(errors: &mut ValidationErrors, field: &str, amount: i64) {
    if amount < 0 {
        errors.add(field, "must be >= 0");
    } else {
        check_amount_bound(errors, field, amount);
    }
}

fn check_amount_bound(errors: &mut ValidationErrors, field: &str, amount: i64) {
    if amount > MAX_AMOUNT_MINOR {
        errors.add(field, format!("must be at most {MAX_AMOUNT_MINOR}"));
    }
}

/// Parse a currency code stored in the DB.
pub(crate) fn model_currency(value: &str) -> ResultEngine<Currency> {
    Currency::try_from(value)
}
