//! Request payload construction.
//!
//! Every remote operation accepts a fixed set of fields. The caller hands in
//! a JSON object with arbitrary keys; only the declared fields are copied
//! into the outgoing body, and each of them must carry a non-empty value.

use serde_json::{Map, Value};

use crate::error::GatewayError;

/// JSON object sent as the body of one operation call.
pub type Payload = Map<String, Value>;

/// Build the request body for `required_fields` out of `source`.
///
/// Fields are checked in declaration order and the first absent one aborts
/// the build. Keys of `source` that are not listed in `required_fields` never
/// reach the output. `source` is left untouched.
///
/// # Errors
/// Returns [`GatewayError::MissingField`] naming the first field that is
/// missing or empty according to [`is_absent`].
pub fn build_payload(required_fields: &[&str], source: &Payload) -> Result<Payload, GatewayError> {
    let mut payload = Payload::new();
    for &field in required_fields {
        match source.get(field) {
            Some(value) if !is_absent(value) => {
                payload.insert(field.to_owned(), value.clone());
            }
            _ => {
                return Err(GatewayError::MissingField {
                    field: field.to_owned(),
                });
            }
        }
    }
    Ok(payload)
}

/// Whether a JSON value counts as "not supplied".
///
/// `null`, `false`, numeric zero, the empty string and empty arrays/objects
/// are absent. Whitespace-only strings and the string `"0"` are values.
#[must_use]
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number
            .as_f64()
            .is_some_and(|n| n.classify() == std::num::FpCategory::Zero),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}
