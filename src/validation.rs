//! Request body validation.
//!
//! Bodies are read as loose JSON and each field is cast to the type the
//! schema expects: strings accept numbers, numbers accept numeric strings.
//! Fields are never nullable. Unknown fields are ignored.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("request body is not valid JSON: {0}")]
    Malformed(String),

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("{0} is a required field")]
    Missing(&'static str),

    #[error("{0} cannot be null")]
    Null(&'static str),

    #[error("{0} must be a `string` type")]
    NotAString(&'static str),

    #[error("{0} must be a `number` type")]
    NotANumber(&'static str),

    #[error("{0} must be an integer between {min} and {max}", min = i32::MIN, max = i32::MAX)]
    NotAnInteger(&'static str),

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },
}

/// Accessor over a validated JSON object body.
#[derive(Debug)]
pub struct Payload {
    fields: Map<String, Value>,
}

impl Payload {
    /// Unwrap the extractor result and require a JSON object.
    pub fn from_request(body: Result<Json<Value>, JsonRejection>) -> Result<Self, ValidationError> {
        let Json(value) = body.map_err(|rejection| ValidationError::Malformed(rejection.body_text()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(ValidationError::NotAnObject),
        }
    }

    fn present(&self, key: &'static str) -> Result<Option<&Value>, ValidationError> {
        match self.fields.get(key) {
            None => Ok(None),
            Some(Value::Null) => Err(ValidationError::Null(key)),
            Some(value) => Ok(Some(value)),
        }
    }

    /// Optional string field. Numbers and booleans are converted to their text.
    pub fn string(&self, key: &'static str) -> Result<Option<String>, ValidationError> {
        match self.present(key)? {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(_) => Err(ValidationError::NotAString(key)),
        }
    }

    /// Required string field. Empty strings count as missing.
    pub fn required_string(&self, key: &'static str) -> Result<String, ValidationError> {
        match self.string(key)? {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(ValidationError::Missing(key)),
        }
    }

    /// Optional integer field. Numeric strings are parsed.
    pub fn integer(&self, key: &'static str) -> Result<Option<i32>, ValidationError> {
        let number = match self.present(key)? {
            None => return Ok(None),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };

        let number = number
            .filter(|n| n.is_finite())
            .ok_or(ValidationError::NotANumber(key))?;

        if number.fract() != 0.0 || number < i32::MIN as f64 || number > i32::MAX as f64 {
            return Err(ValidationError::NotAnInteger(key));
        }

        Ok(Some(number as i32))
    }

    pub fn required_integer(&self, key: &'static str) -> Result<i32, ValidationError> {
        self.integer(key)?.ok_or(ValidationError::Missing(key))
    }
}

/// Enforce a minimum length, counted in characters.
pub fn min_len(field: &'static str, value: &str, min: usize) -> Result<(), ValidationError> {
    if value.chars().count() < min {
        return Err(ValidationError::TooShort { field, min });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        Payload::from_value(value).expect("object payload")
    }

    #[test]
    fn rejects_non_object_bodies() {
        assert_eq!(
            Payload::from_value(json!([1, 2])).unwrap_err(),
            ValidationError::NotAnObject
        );
    }

    #[test]
    fn strings_accept_numbers() {
        let body = payload(json!({ "postal_code": 12345678, "town": "Recife" }));
        assert_eq!(body.string("postal_code").unwrap().as_deref(), Some("12345678"));
        assert_eq!(body.required_string("town").unwrap(), "Recife");
    }

    #[test]
    fn strings_accept_booleans_but_not_structures() {
        let body = payload(json!({ "complement": true, "town": ["Recife"] }));
        assert_eq!(body.string("complement").unwrap().as_deref(), Some("true"));
        assert_eq!(body.string("town").unwrap_err(), ValidationError::NotAString("town"));
    }

    #[test]
    fn empty_required_string_is_missing() {
        let body = payload(json!({ "product": "" }));
        assert_eq!(
            body.required_string("product").unwrap_err(),
            ValidationError::Missing("product")
        );
    }

    #[test]
    fn null_is_never_accepted() {
        let body = payload(json!({ "complement": null }));
        assert_eq!(body.string("complement").unwrap_err(), ValidationError::Null("complement"));
    }

    #[test]
    fn integers_accept_numeric_strings() {
        let body = payload(json!({ "recipient_id": " 42 ", "deliveryman_id": 7 }));
        assert_eq!(body.required_integer("recipient_id").unwrap(), 42);
        assert_eq!(body.required_integer("deliveryman_id").unwrap(), 7);
    }

    #[test]
    fn integers_reject_garbage_and_fractions() {
        let body = payload(json!({ "a": "abc", "b": 1.5, "c": true, "d": 1e12 }));
        assert_eq!(body.integer("a").unwrap_err(), ValidationError::NotANumber("a"));
        assert_eq!(body.integer("b").unwrap_err(), ValidationError::NotAnInteger("b"));
        assert_eq!(body.integer("c").unwrap_err(), ValidationError::NotANumber("c"));
        assert_eq!(body.integer("d").unwrap_err(), ValidationError::NotAnInteger("d"));
        assert_eq!(body.integer("missing").unwrap(), None);
    }

    #[test]
    fn min_len_counts_characters() {
        assert!(min_len("name", "João S", 6).is_ok());
        assert_eq!(
            min_len("name", "Ana", 6).unwrap_err(),
            ValidationError::TooShort { field: "name", min: 6 }
        );
    }
}
