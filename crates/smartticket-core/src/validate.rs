//! Form field checks run before any backend call.

use thiserror::Error;

/// Minimum password length accepted by the identity backend.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} is not a valid email address")]
    InvalidEmail { field: &'static str },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("New passwords do not match.")]
    PasswordMismatch,
}

impl FormError {
    /// The form field that failed, if the error is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Required { field }
            | Self::InvalidEmail { field }
            | Self::TooShort { field, .. } => Some(*field),
            Self::PasswordMismatch => None,
        }
    }
}

/// A non-blank value, trimmed.
pub fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormError::Required { field });
    }
    Ok(trimmed)
}

/// A non-blank value shaped like `local@domain.tld`.
pub fn email<'a>(field: &'static str, value: &'a str) -> Result<&'a str, FormError> {
    let value = required(field, value)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(FormError::InvalidEmail { field });
    }
    Ok(value)
}

/// A password the identity backend will accept. Not trimmed.
pub fn password<'a>(field: &'static str, value: &'a str) -> Result<&'a str, FormError> {
    if value.is_empty() {
        return Err(FormError::Required { field });
    }
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(FormError::TooShort {
            field,
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(value)
}

/// Change-password form: all three fields present and the new ones equal.
pub fn password_change(old: &str, new: &str, confirm: &str) -> Result<(), FormError> {
    if old.is_empty() {
        return Err(FormError::Required {
            field: "oldPassword",
        });
    }
    password("newPassword", new)?;
    if confirm.is_empty() {
        return Err(FormError::Required {
            field: "confirmPassword",
        });
    }
    if new != confirm {
        return Err(FormError::PasswordMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims() {
        assert_eq!(required("name", "  Ana "), Ok("Ana"));
        assert_eq!(
            required("name", "   "),
            Err(FormError::Required { field: "name" })
        );
    }

    #[test]
    fn email_shapes() {
        assert!(email("email", "a@b.co").is_ok());
        assert!(email("email", "first.last@agency.gov.ph").is_ok());
        assert!(email("email", "a@b").is_err());
        assert!(email("email", "@b.co").is_err());
        assert!(email("email", "a@@b.co").is_err());
        assert!(email("email", "a b@c.co").is_err());
        assert!(email("email", "a@b..co").is_err());
    }

    #[test]
    fn short_password_rejected() {
        assert_eq!(
            password("password", "abc"),
            Err(FormError::TooShort {
                field: "password",
                min: 6
            })
        );
    }

    #[test]
    fn password_change_requires_matching_confirmation() {
        assert_eq!(
            password_change("old-pass", "new-pass1", "new-pass2"),
            Err(FormError::PasswordMismatch)
        );
        assert!(password_change("old-pass", "new-pass1", "new-pass1").is_ok());
        assert_eq!(
            password_change("", "new-pass1", "new-pass1"),
            Err(FormError::Required {
                field: "oldPassword"
            })
        );
    }

    #[test]
    fn mismatch_message_matches_dialog_text() {
        assert_eq!(
            FormError::PasswordMismatch.to_string(),
            "New passwords do not match."
        );
        assert_eq!(FormError::PasswordMismatch.field(), None);
    }
}
