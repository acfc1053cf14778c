//! JSON extractor that validates DTOs before handlers see them.
//!
//! Malformed bodies are rejected with 400 and a message naming the offending
//! field or value; bodies that parse but break a `#[validate]` rule with 422.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use scolaguard_core::AppError;

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                let message = match &rejection {
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing 'Content-Type: application/json' header".to_string()
                    }
                    _ => describe_rejection(&rejection.body_text()),
                };
                AppError::bad_request(anyhow::anyhow!(message))
            })?;

        value.validate().map_err(|errors| {
            AppError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                anyhow::anyhow!(format_errors(&errors)),
            )
        })?;

        Ok(ValidatedJson(value))
    }
}

/// Turns a serde rejection into something a client can act on.
fn describe_rejection(text: &str) -> String {
    if let Some(field) = between(text, "missing field `", "`") {
        return format!("{field} is required");
    }
    if let Some(value) = between(text, "unknown variant `", "`") {
        let expected = text
            .split("expected one of ")
            .nth(1)
            .map(|rest| rest.split(" at line").next().unwrap_or(rest).replace('`', ""))
            .unwrap_or_default();
        return if expected.is_empty() {
            format!("'{value}' is not an accepted value")
        } else {
            format!("'{value}' is not an accepted value, expected one of {expected}")
        };
    }
    if text.contains("invalid type") {
        return "Invalid field type in request".to_string();
    }
    "Invalid request body".to_string()
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    text.split(start).nth(1).and_then(|rest| rest.split(end).next())
}

fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => format!("{field}: {message}"),
                None => format!("{field} is invalid ({})", error.code),
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scolaguard_models::UpdateModuleStatusDto;

    #[test]
    fn test_missing_field() {
        let err = serde_json::from_str::<UpdateModuleStatusDto>("{}").unwrap_err();
        assert_eq!(describe_rejection(&err.to_string()), "status is required");
    }

    #[test]
    fn test_unknown_status_lists_accepted_values() {
        let err =
            serde_json::from_str::<UpdateModuleStatusDto>(r#"{"status":"paused"}"#).unwrap_err();
        let message = describe_rejection(&err.to_string());

        assert!(message.starts_with("'paused' is not an accepted value"));
        assert!(message.contains("maintenance"));
    }

    #[test]
    fn test_wrong_type() {
        let err = serde_json::from_str::<UpdateModuleStatusDto>(r#"{"status":3}"#).unwrap_err();
        assert_eq!(
            describe_rejection(&err.to_string()),
            "Invalid field type in request"
        );
    }

    #[test]
    fn test_validation_messages_name_the_field() {
        let dto = UpdateModuleStatusDto {
            status: scolaguard_models::ModuleStatus::Maintenance,
            reason: Some("x".repeat(501)),
        };
        let errors = dto.validate().unwrap_err();
        assert!(format_errors(&errors).starts_with("reason"));
    }
}
