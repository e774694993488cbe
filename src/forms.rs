//! Typed form structs and their decoding and validation rules.
//!
//! Decoding rides on `axum::extract::Form`: struct field names are the
//! submitted field names, and any body the decoder cannot map onto the
//! struct (missing field, non-integer `expires`, wrong content type) is a
//! malformed request, answered with a 400 before validation starts.
//!
//! Validation lives in `validate()` methods returning a separate
//! [`validation::Errors`] value; the structs themselves carry submitted
//! values only, so a failed submission can be re-displayed as-is.

use axum::extract::{rejection::FormRejection, Form};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::validation::{self, Errors, EMAIL_RE};

/// Unwraps a `Form` extraction, converting every rejection into a 400.
///
/// A binding failure leaves nothing the handler can trust, so the caller
/// gets no partial struct back, only the error.
pub fn bind<T>(form: Result<Form<T>, FormRejection>) -> AppResult<T> {
    let Form(value) = form.map_err(|rejection| AppError::BadRequest(rejection.to_string()))?;
    Ok(value)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnippetForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub expires: i64,
}

impl SnippetForm {
    /// Initial state for the create page: empty fields, one-year expiry
    /// preselected.
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expires: 365,
        }
    }

    pub fn validate(&self) -> Errors {
        let mut errors = Errors::default();
        errors.check_field(
            validation::not_blank(&self.title),
            "title",
            "This field cannot be blank",
        );
        errors.check_field(
            validation::max_chars(&self.title, 100),
            "title",
            "This field cannot be more than 100 characters long",
        );
        errors.check_field(
            validation::not_blank(&self.content),
            "content",
            "This field cannot be blank",
        );
        errors.check_field(
            validation::permitted(self.expires, &[1, 7, 365]),
            "expires",
            "This field must equal 1, 7 or 365",
        );
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Errors {
        let mut errors = Errors::default();
        errors.check_field(
            validation::not_blank(&self.name),
            "name",
            "This field cannot be blank",
        );
        errors.check_field(
            validation::not_blank(&self.email),
            "email",
            "This field cannot be blank",
        );
        errors.check_field(
            validation::matches(&self.email, &EMAIL_RE),
            "email",
            "This field must be a valid email address",
        );
        errors.check_field(
            validation::not_blank(&self.password),
            "password",
            "This field cannot be blank",
        );
        errors.check_field(
            validation::min_chars(&self.password, 8),
            "password",
            "This field must be at least 8 characters long",
        );
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Errors {
        let mut errors = Errors::default();
        errors.check_field(
            validation::not_blank(&self.email),
            "email",
            "This field cannot be blank",
        );
        errors.check_field(
            validation::matches(&self.email, &EMAIL_RE),
            "email",
            "This field must be a valid email address",
        );
        errors.check_field(
            validation::not_blank(&self.password),
            "password",
            "This field cannot be blank",
        );
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_form_valid() {
        let form = SnippetForm {
            title: "O snail".to_string(),
            content: "Climb Mount Fuji".to_string(),
            expires: 365,
        };
        assert!(form.validate().is_valid());
    }

    #[test]
    fn snippet_form_blank_title() {
        let form = SnippetForm {
            title: "   ".to_string(),
            content: "body".to_string(),
            expires: 7,
        };
        let errors = form.validate();
        assert_eq!(
            errors.field_errors.get("title").unwrap(),
            "This field cannot be blank"
        );
        assert!(!errors.field_errors.contains_key("content"));
        assert!(!errors.field_errors.contains_key("expires"));
    }

    #[test]
    fn snippet_form_long_title() {
        let form = SnippetForm {
            title: "a".repeat(101),
            content: "body".to_string(),
            expires: 1,
        };
        let errors = form.validate();
        assert_eq!(
            errors.field_errors.get("title").unwrap(),
            "This field cannot be more than 100 characters long"
        );
    }

    #[test]
    fn snippet_form_title_limit_counts_chars() {
        // 100 multi-byte characters must be accepted.
        let form = SnippetForm {
            title: "日".repeat(100),
            content: "body".to_string(),
            expires: 1,
        };
        assert!(form.validate().is_valid());
    }

    #[test]
    fn snippet_form_bad_expiry() {
        let form = SnippetForm {
            title: "t".to_string(),
            content: "c".to_string(),
            expires: 14,
        };
        let errors = form.validate();
        assert_eq!(
            errors.field_errors.get("expires").unwrap(),
            "This field must equal 1, 7 or 365"
        );
    }

    #[test]
    fn signup_form_bad_email_only() {
        let form = SignupForm {
            name: "Ann".to_string(),
            email: "bad-email".to_string(),
            password: "longenough12".to_string(),
        };
        let errors = form.validate();
        assert_eq!(errors.field_errors.len(), 1);
        assert_eq!(
            errors.field_errors.get("email").unwrap(),
            "This field must be a valid email address"
        );
        assert!(errors.non_field_errors.is_empty());
    }

    #[test]
    fn signup_form_short_password() {
        let form = SignupForm {
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            password: "short".to_string(),
        };
        let errors = form.validate();
        assert_eq!(
            errors.field_errors.get("password").unwrap(),
            "This field must be at least 8 characters long"
        );
    }

    #[test]
    fn signup_form_blank_email_reports_blank_first() {
        let form = SignupForm {
            name: "Ann".to_string(),
            email: "".to_string(),
            password: "longenough12".to_string(),
        };
        let errors = form.validate();
        // Both the blank and the pattern check fail; the first message wins.
        assert_eq!(
            errors.field_errors.get("email").unwrap(),
            "This field cannot be blank"
        );
    }

    #[test]
    fn login_form_requires_well_formed_email() {
        let form = LoginForm {
            email: "not-an-address".to_string(),
            password: "whatever1".to_string(),
        };
        let errors = form.validate();
        assert_eq!(
            errors.field_errors.get("email").unwrap(),
            "This field must be a valid email address"
        );
    }
}
