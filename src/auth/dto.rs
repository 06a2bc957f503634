use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::User;

/// Field name mapped to the rule it broke.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref E164_RE: Regex = Regex::new(r"^\+[1-9][0-9]{1,14}$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn check_name(errors: &mut FieldErrors, field: &'static str, value: &str) {
    let len = value.chars().count();
    if len == 0 {
        errors.insert(field, "required");
    } else if len < 2 {
        errors.insert(field, "min");
    } else if len > 100 {
        errors.insert(field, "max");
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.is_empty() {
        errors.insert("email", "required");
    } else if !is_valid_email(email) {
        errors.insert("email", "email");
    }
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date_of_birth: Option<OffsetDateTime>,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl SignUpRequest {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_name(&mut errors, "first_name", &self.first_name);
        check_name(&mut errors, "last_name", &self.last_name);
        check_email(&mut errors, &self.email);

        // Measured in bytes, not characters.
        match self.password.len() {
            0 => {
                errors.insert("password", "required");
            }
            1..=7 => {
                errors.insert("password", "min");
            }
            73.. => {
                errors.insert("password", "max");
            }
            _ => {}
        }

        if let Some(phone) = &self.phone_number {
            if !E164_RE.is_match(phone) {
                errors.insert("phone_number", "e164");
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Response returned after a successful registration.
#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for SignUpResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.insert("password", "required");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldErrors>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup() -> SignUpRequest {
        SignUpRequest {
            first_name: "John".into(),
            last_name: "Doe".into(),
            date_of_birth: None,
            email: "john.doe@example.com".into(),
            password: "P@ssw0rd".into(),
            phone_number: None,
        }
    }

    #[test]
    fn valid_signup_passes() {
        assert!(signup().validate().is_ok());
    }

    #[test]
    fn signup_reports_every_broken_field() {
        let req = SignUpRequest {
            first_name: "J".into(),
            last_name: String::new(),
            email: "not-an-email".into(),
            password: "short".into(),
            phone_number: Some("555-1234".into()),
            ..signup()
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(errors["first_name"], "min");
        assert_eq!(errors["last_name"], "required");
        assert_eq!(errors["email"], "email");
        assert_eq!(errors["password"], "min");
        assert_eq!(errors["phone_number"], "e164");
    }

    #[test]
    fn password_length_bounds() {
        let mut req = signup();
        req.password = "a".repeat(72);
        assert!(req.validate().is_ok());
        req.password = "a".repeat(73);
        assert_eq!(req.validate().unwrap_err()["password"], "max");
        req.password = "a".repeat(8);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn phone_must_be_e164() {
        let mut req = signup();
        req.phone_number = Some("+1234567890".into());
        assert!(req.validate().is_ok());
        req.phone_number = Some("+0123".into());
        assert!(req.validate().is_err());
        req.phone_number = Some("+1234567890123456".into());
        assert!(req.validate().is_err());
    }

    #[test]
    fn signup_body_accepts_rfc3339_birth_date() {
        let req: SignUpRequest = serde_json::from_str(
            r#"{"first_name":"John","last_name":"Doe","email":"j@x.com",
                "password":"P@ssw0rd","date_of_birth":"1990-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(req.date_of_birth.unwrap().year(), 1990);
        assert!(req.phone_number.is_none());
    }

    #[test]
    fn login_requires_email_and_password() {
        let req = LoginRequest {
            email: String::new(),
            password: String::new(),
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(errors["email"], "required");
        assert_eq!(errors["password"], "required");
    }

    #[test]
    fn error_response_omits_empty_details() {
        let body = ErrorResponse {
            error: "Conflict".into(),
            message: "User with this email already exists".into(),
            details: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("details"));
    }
}
