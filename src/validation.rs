//! Field-level validation primitives and an accumulating error set.
//!
//! The predicates are free functions over already-parsed values; anything
//! that fails to parse at all never reaches this module (the form binder
//! turns it into a 400 first). Handlers build an [`Errors`] value next to
//! the submitted form struct and feed both to the template on failure.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    /// HTML5 email pattern (the one browsers use for `<input type="email">`).
    pub static ref EMAIL_RE: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    )
    .expect("email regex is valid");
}

/// Accumulated validation outcome for one form submission.
///
/// `field_errors` maps a form field name to its message; `non_field_errors`
/// holds messages about the submission as a whole (e.g. a bad credential
/// pair). Serialized into the template context so pages can show messages
/// next to the inputs they belong to.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Errors {
    pub field_errors: BTreeMap<String, String>,
    pub non_field_errors: Vec<String>,
}

impl Errors {
    /// True iff no errors of either kind have been recorded.
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Records `message` under `field` when `ok` is false, unless the field
    /// already has a message. First error wins.
    pub fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        if !ok && !self.field_errors.contains_key(field) {
            self.add_field_error(field, message);
        }
    }

    pub fn add_field_error(&mut self, field: &str, message: &str) {
        self.field_errors
            .insert(field.to_string(), message.to_string());
    }

    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_string());
    }
}

/// False for empty or whitespace-only strings.
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Counts characters, not bytes, so multi-byte text is measured correctly.
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

pub fn matches(value: &str, re: &Regex) -> bool {
    re.is_match(value)
}

/// True when `value` is one of the permitted values.
pub fn permitted<T: PartialEq>(value: T, permitted: &[T]) -> bool {
    permitted.contains(&value)
}

/// Inclusive range check on an already-parsed numeric value.
pub fn between<T: PartialOrd>(value: T, min: T, max: T) -> bool {
    value >= min && value <= max
}
