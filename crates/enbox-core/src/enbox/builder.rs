//! Validation and normalization of console form input.
//!
//! All checks run and every failing field is reported together.

use crate::enbox::error::{ValidationError, ValidationErrors};
use crate::enbox::types::{
    ActivationToggle, BodyFormat, CreateEnboxForm, CreateVia, EmailMessage, EnboxCreateRequest,
    SendEmailForm, ToggleAction,
};

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub fn build_create(form: &CreateEnboxForm) -> Result<EnboxCreateRequest, ValidationErrors> {
    let email = form.email.trim();
    let display_name = form.display_name.trim();
    let mut errors = Vec::new();

    if !email.contains('@') {
        errors.push(ValidationError::InvalidEmail);
    }
    if display_name.is_empty() {
        errors.push(ValidationError::EmptyDisplayName);
    }

    let password = match form.method {
        CreateVia::Invite => None,
        CreateVia::Direct => {
            let password = form.password.as_deref().filter(|p| !p.is_empty());
            match password {
                None => errors.push(ValidationError::MissingPassword),
                Some(p) if p.chars().count() < MIN_PASSWORD_LENGTH => {
                    errors.push(ValidationError::PasswordTooShort)
                }
                Some(_) => {}
            }
            if password.is_some() && form.password_confirmation.as_deref() != password {
                errors.push(ValidationError::PasswordMismatch);
            }
            password.map(str::to_string)
        }
    };

    ValidationErrors::check(errors)?;

    Ok(EnboxCreateRequest {
        email: email.to_string(),
        display_name: display_name.to_string(),
        method: form.method,
        password,
    })
}

/// Splits newline-delimited recipients, trimming entries and dropping blanks.
pub fn parse_recipients(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn build_send_email(form: &SendEmailForm) -> Result<EmailMessage, ValidationErrors> {
    let to = parse_recipients(&form.to);
    let subject = form.subject.trim();
    let body_text = non_empty(form.body_text.as_deref());
    let body_html = non_empty(form.body_html.as_deref());
    let mut errors = Vec::new();

    if to.is_empty() {
        errors.push(ValidationError::NoRecipients);
    }
    if subject.is_empty() {
        errors.push(ValidationError::EmptySubject);
    }

    let (body_text, body_html) = match form.format {
        BodyFormat::Text => {
            if body_text.is_none() {
                errors.push(ValidationError::MissingTextBody);
            }
            (body_text, None)
        }
        BodyFormat::Html => {
            if body_html.is_none() {
                errors.push(ValidationError::MissingHtmlBody);
            }
            (None, body_html)
        }
        BodyFormat::Both => {
            if body_text.is_none() && body_html.is_none() {
                errors.push(ValidationError::MissingBody);
            }
            (body_text, body_html)
        }
    };

    ValidationErrors::check(errors)?;

    Ok(EmailMessage {
        to,
        cc: parse_recipients(&form.cc),
        bcc: parse_recipients(&form.bcc),
        subject: subject.to_string(),
        body_text,
        body_html,
        send_via: form.send_via,
        scheduled_at: form.scheduled_at,
        read_receipt_requested: form.read_receipt_requested,
    })
}

/// The email comes from a listed record, so only emptiness is checked.
pub fn build_activation_toggle(
    email: &str,
    target_active: bool,
) -> Result<ActivationToggle, ValidationErrors> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::EmptyEnboxEmail.into());
    }

    let action = if target_active {
        ToggleAction::Activate
    } else {
        ToggleAction::Deactivate
    };

    Ok(ActivationToggle {
        action,
        email: email.to_string(),
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}
