//! A stand-in for the site's form endpoints: validates a submission, composes the notification
//! email and hands it to a [Mailer].

mod form;
mod mail;

pub(crate) use form::{BookingRequest, ContactRequest};
pub(crate) use mail::{MailSettings, Mailer, OutboxMailer, compose_booking, compose_contact};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::{io, path::PathBuf};

/// The form endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub(crate) enum Endpoint {
    Contact,
    Booking,
}

impl Endpoint {
    fn required_fields(&self) -> &'static str {
        match self {
            Self::Contact => "name, email, and message",
            Self::Booking => "name, email, projectName, projectDescription, packageName, and packagePrice",
        }
    }

    fn success_message(&self) -> &'static str {
        match self {
            Self::Contact => "Message sent successfully",
            Self::Booking => "Booking request sent successfully",
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            Self::Contact => "Failed to send message. Please try again later.",
            Self::Booking => "Failed to send booking request. Please try again later.",
        }
    }
}

/// Errors that can occur when relaying a form submission
#[derive(thiserror::Error, Debug)]
pub(crate) enum RelayError {
    #[error("Missing required fields: {} are required", .0.required_fields())]
    MissingFields(Endpoint),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("invalid address in mail settings: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("composing message: {0}")]
    Compose(#[from] lettre::error::Error),

    #[error("preparing {path}: {source}")]
    Delivery { path: PathBuf, source: io::Error },

    #[error("writing to the outbox: {0}")]
    Outbox(#[from] lettre::transport::file::Error),
}

impl RelayError {
    /// Whether this error is the submitter's fault.
    pub(crate) fn is_validation(&self) -> bool {
        matches!(self, Self::MissingFields(_) | Self::InvalidEmail)
    }
}

/// An HTTP style response: a status code and a JSON body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct RelayResponse {
    pub(crate) status: u16,
    pub(crate) body: Value,
}

impl RelayResponse {
    fn success(message: &str) -> Self {
        Self { status: 200, body: json!({ "success": true, "message": message }) }
    }

    fn error(status: u16, error: &str) -> Self {
        Self { status, body: json!({ "error": error }) }
    }
}

/// Handle one submission to `endpoint`. Never fails: every error becomes a 400 or 500 response.
pub(crate) fn handle(
    endpoint: Endpoint,
    body: &str,
    settings: &MailSettings,
    mailer: &mut dyn Mailer,
) -> RelayResponse {
    match relay(endpoint, body, settings, mailer) {
        Ok(()) => RelayResponse::success(endpoint.success_message()),
        Err(e) if e.is_validation() => {
            log::debug!("rejected {endpoint} submission: {e}");
            RelayResponse::error(400, &e.to_string())
        }
        Err(e) => {
            log::error!("{endpoint} form error: {e}");
            RelayResponse::error(500, endpoint.failure_message())
        }
    }
}

fn relay(endpoint: Endpoint, body: &str, settings: &MailSettings, mailer: &mut dyn Mailer) -> Result<(), RelayError> {
    let body: Value = serde_json::from_str(body)?;
    let message = match endpoint {
        Endpoint::Contact => compose_contact(&ContactRequest::from_json(&body)?, settings)?,
        Endpoint::Booking => compose_booking(&BookingRequest::from_json(&body)?, settings)?,
    };
    mailer.send(&message)
}
