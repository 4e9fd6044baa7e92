//! Typed, validated request payloads.

use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::RequestError;
use crate::message::Envelope;

/// Deserialize and validate the payload of `request`.
pub fn parse<T: DeserializeOwned + Validate>(request: &Envelope) -> Result<T, RequestError> {
    let payload: T = request
        .payload()
        .map_err(|e| RequestError::InvalidPayload(format!("Invalid request: {e}")))?;
    payload
        .validate()
        .map_err(|e| RequestError::InvalidPayload(describe(&e)))?;
    Ok(payload)
}

/// Readable summary of validation failures, ordered by field name.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}
