use super::{Endpoint, RelayError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email pattern"));

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

// Only non empty strings count as filled in.
fn field(body: &Value, name: &str) -> Option<String> {
    match body.get(name) {
        Some(Value::String(value)) if !value.is_empty() => Some(value.clone()),
        _ => None,
    }
}

/// A contact form submission.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ContactRequest {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) message: String,
}

impl ContactRequest {
    pub(crate) fn from_json(body: &Value) -> Result<Self, RelayError> {
        let fields = (field(body, "name"), field(body, "email"), field(body, "message"));
        let (Some(name), Some(email), Some(message)) = fields else {
            return Err(RelayError::MissingFields(Endpoint::Contact));
        };
        if !is_valid_email(&email) {
            return Err(RelayError::InvalidEmail);
        }
        Ok(Self { name, email, message })
    }
}

/// A booking form submission.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BookingRequest {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) telegram: Option<String>,
    pub(crate) project_name: String,
    pub(crate) project_description: String,
    pub(crate) budget: Option<String>,
    pub(crate) package_name: String,
    pub(crate) package_price: String,
}

impl BookingRequest {
    pub(crate) fn from_json(body: &Value) -> Result<Self, RelayError> {
        let required = ["name", "email", "projectName", "projectDescription", "packageName", "packagePrice"]
            .map(|name| field(body, name));
        let [
            Some(name),
            Some(email),
            Some(project_name),
            Some(project_description),
            Some(package_name),
            Some(package_price),
        ] = required
        else {
            return Err(RelayError::MissingFields(Endpoint::Booking));
        };
        if !is_valid_email(&email) {
            return Err(RelayError::InvalidEmail);
        }
        Ok(Self {
            name,
            email,
            telegram: field(body, "telegram"),
            project_name,
            project_description,
            budget: field(body, "budget"),
            package_name,
            package_price,
        })
    }
}
