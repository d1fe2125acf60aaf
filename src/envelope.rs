//! Response envelope normalization.
//!
//! Every API response body has the shape
//! `{ success, data, message?, code?, errors?, detail?, meta? }`. The functions
//! here turn a transport [`Outcome`] into either the unwrapped `data` or an
//! [`AppError`]. They are pure and synchronous, and they are the only place
//! outcomes become errors.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, ErrorCode, ErrorDetails};
use crate::transport::Outcome;

/// Pagination metadata carried by list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

/// A page of items together with its pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    #[must_use]
    pub const fn has_next_page(&self) -> bool {
        self.meta.page < self.meta.pages
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The success half of the wire envelope. Failed envelopes are read field by
/// field from the raw body instead.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

/// Unwraps `data` from a successful envelope.
///
/// # Errors
///
/// - `NETWORK_ERROR` / `TIMEOUT_ERROR` for transport failures
/// - the body's `code`, `VALIDATION_ERROR`, or the HTTP status for failed envelopes
/// - `UNKNOWN_ERROR` when the body cannot be decoded
pub fn normalize<T: DeserializeOwned>(outcome: Outcome) -> Result<T, AppError> {
    let (status, envelope) = decode::<T>(outcome)?;
    match envelope.data {
        Some(data) => Ok(data),
        // `null` or absent data is fine for unit-like payloads.
        None => serde_json::from_value(Value::Null).map_err(|_| {
            AppError::unknown("Response envelope is missing data").with_status(status)
        }),
    }
}

/// Unwraps a paginated list envelope (`data` array plus `meta`).
///
/// # Errors
///
/// Same as [`normalize`], plus `UNKNOWN_ERROR` when `meta` is absent.
pub fn normalize_page<T: DeserializeOwned>(outcome: Outcome) -> Result<Paginated<T>, AppError> {
    let (status, envelope) = decode::<Vec<T>>(outcome)?;
    let data = envelope.data.ok_or_else(|| {
        AppError::unknown("Response envelope is missing data").with_status(status)
    })?;
    let meta = envelope.meta.ok_or_else(|| {
        AppError::unknown("Paginated response is missing meta").with_status(status)
    })?;
    Ok(Paginated { data, meta })
}

fn decode<T: DeserializeOwned>(outcome: Outcome) -> Result<(u16, Envelope<T>), AppError> {
    match outcome {
        Outcome::NetworkError { message } => Err(AppError::network(if message.is_empty() {
            "Network error occurred".to_string()
        } else {
            message
        })),
        Outcome::TimeoutError => Err(AppError::timeout()),
        Outcome::HttpError { status, body } => Err(failure_from_body(status, &body)),
        Outcome::Ok { status, body } => {
            if !body.is_object() {
                return Err(AppError::unknown("Unexpected response body").with_status(status));
            }
            if body.get("success").and_then(Value::as_bool) != Some(true) {
                return Err(failure_from_body(status, &body));
            }
            serde_json::from_value::<Envelope<T>>(body)
                .map(|envelope| (status, envelope))
                .map_err(|e| {
                    AppError::unknown(format!("Malformed response body: {e}")).with_status(status)
                })
        }
    }
}

/// Builds an error from a failed envelope, tolerating any body shape.
///
/// Each field is read on its own, so one oddly shaped member never hides the
/// others.
fn failure_from_body(status: u16, body: &Value) -> AppError {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map_or_else(|| format!("HTTP {status} Error"), str::to_string);

    let errors = body.get("errors").and_then(field_errors);
    let code = match (body.get("code").and_then(scalar_text), &errors) {
        (Some(code), _) => ErrorCode::Server(code),
        (_, Some(_)) => ErrorCode::Validation,
        _ => ErrorCode::Http(status),
    };

    let details = errors.or_else(|| {
        body.get("detail")
            .and_then(detail_text)
            .map(|detail| ErrorDetails::from([("detail".to_string(), vec![detail])]))
    });

    let error = AppError::new(code, message).with_status(status);
    match details {
        Some(details) => error.with_details(details),
        None => error,
    }
}

/// A non-empty string or number, as text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Renders a value as a message: strings as-is, anything else as JSON.
fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// `errors` as a field map. Each field may hold one message or a list.
fn field_errors(value: &Value) -> Option<ErrorDetails> {
    let Value::Object(fields) = value else {
        return None;
    };
    let details: ErrorDetails = fields
        .iter()
        .filter_map(|(field, messages)| {
            let messages: Vec<String> = match messages {
                Value::Array(items) => items.iter().filter_map(message_text).collect(),
                other => message_text(other).into_iter().collect(),
            };
            (!messages.is_empty()).then(|| (field.clone(), messages))
        })
        .collect();
    (!details.is_empty()).then_some(details)
}

fn detail_text(value: &Value) -> Option<String> {
    message_text(value).filter(|d| !d.trim().is_empty())
}
