//! Purpose: Convert schema-typed values to and from their on-disk text form.
//! Exports: `Value`, `NULL_TOKEN`, `encode_field`, `decode_field`.
//! Role: Single authority for cell text; append and fetch both go through here.
//! Invariants: Encode is lenient for text-like fields, strict for datetimes.
//! Invariants: Decode is strict; a bad stored cell is an error, never a guess.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;

use crate::core::error::{Error, ErrorKind};
use crate::core::field::{FieldDef, FieldType};

/// Cell text standing for an absent value, distinct from the empty string.
pub const NULL_TOKEN: &str = "\\N";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Datetime(OffsetDateTime),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Datetime(_) => "datetime",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(value: OffsetDateTime) -> Self {
        Value::Datetime(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

/// Encode one value for storage under the given field definition.
///
/// Datetime fields are strict: the value must be a datetime and must format
/// as RFC 3339. Integer fields write mismatched values in their plain text
/// form unchanged. String and other fields swallow unrepresentable values
/// into an empty cell with a warning so one bad field never aborts an
/// export.
pub fn encode_field(value: &Value, field: &FieldDef) -> Result<String, Error> {
    if let Value::Null = value {
        return Ok(NULL_TOKEN.to_string());
    }
    match field.field_type {
        FieldType::Datetime => match value {
            Value::Datetime(instant) => instant.format(&Rfc3339).map_err(|err| {
                Error::new(ErrorKind::Format)
                    .with_message("datetime value does not format as RFC 3339")
                    .with_field(&field.name)
                    .with_source(err)
            }),
            other => Err(Error::new(ErrorKind::Format)
                .with_message(format!(
                    "datetime field holds a {} value",
                    other.type_name()
                ))
                .with_field(&field.name)),
        },
        FieldType::Integer => match value {
            Value::Integer(n) => Ok(n.to_string()),
            other => Ok(plain_text_form(other).unwrap_or_else(|| empty_cell(other, field))),
        },
        FieldType::String => match value {
            Value::Text(text) => Ok(text.clone()),
            Value::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => Ok(text.to_string()),
                Err(_) => Ok(empty_cell(value, field)),
            },
            other => Ok(empty_cell(other, field)),
        },
        FieldType::Other => {
            Ok(plain_text_form(value).unwrap_or_else(|| empty_cell(value, field)))
        }
    }
}

/// Decode one stored cell back into a typed value.
pub fn decode_field(text: &str, field: &FieldDef) -> Result<Value, Error> {
    if text == NULL_TOKEN {
        return Ok(Value::Null);
    }
    match field.field_type {
        FieldType::Datetime => OffsetDateTime::parse(text, &Rfc3339)
            .map(Value::Datetime)
            .map_err(|err| {
                Error::new(ErrorKind::Format)
                    .with_message(format!("not a valid RFC 3339 datetime: {text:?}"))
                    .with_field(&field.name)
                    .with_source(err)
            }),
        FieldType::Integer => text.parse::<i64>().map(Value::Integer).map_err(|err| {
            Error::new(ErrorKind::Format)
                .with_message(format!("not a valid integer: {text:?}"))
                .with_field(&field.name)
                .with_source(err)
        }),
        FieldType::String | FieldType::Other => Ok(Value::Text(text.to_string())),
    }
}

// Best-effort text rendering; None when the value has no text form.
fn plain_text_form(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(NULL_TOKEN.to_string()),
        Value::Text(text) => Some(text.clone()),
        Value::Bytes(bytes) => std::str::from_utf8(bytes).ok().map(str::to_string),
        Value::Integer(n) => Some(n.to_string()),
        Value::Datetime(instant) => instant.format(&Rfc3339).ok(),
    }
}

fn empty_cell(value: &Value, field: &FieldDef) -> String {
    warn!(
        field = %field.name,
        value_type = value.type_name(),
        "value has no text form, writing empty cell"
    );
    String::new()
}

#[cfg(test)]
mod tests {
    use super::{decode_field, encode_field, Value, NULL_TOKEN};
    use crate::core::error::ErrorKind;
    use crate::core::field::{FieldDef, FieldType};
    use time::macros::datetime;

    #[test]
    fn integer_round_trips() {
        let field = FieldDef::new("id", FieldType::Integer);
        let original = Value::Integer(-42);
        let text = encode_field(&original, &field).expect("encode integer");
        assert_eq!(text, "-42");
        assert_eq!(decode_field(&text, &field).expect("decode integer"), original);
    }

    #[test]
    fn datetime_round_trips_preserving_instant() {
        let field = FieldDef::new("scraped_at", FieldType::Datetime);
        let original = Value::Datetime(datetime!(2024-05-01 12:00:00 +02:00));
        let text = encode_field(&original, &field).expect("encode datetime");
        assert_eq!(text, "2024-05-01T12:00:00+02:00");
        let back = decode_field(&text, &field).expect("decode datetime");
        assert_eq!(back, original);
    }

    #[test]
    fn null_marker_is_distinct_from_empty_string() {
        let field = FieldDef::new("note", FieldType::String);
        assert_eq!(
            encode_field(&Value::Null, &field).expect("encode null"),
            NULL_TOKEN
        );
        assert_eq!(decode_field(NULL_TOKEN, &field).expect("decode null"), Value::Null);
        assert_eq!(
            decode_field("", &field).expect("decode empty"),
            Value::Text(String::new())
        );
    }

    #[test]
    fn datetime_decode_is_strict() {
        let field = FieldDef::new("scraped_at", FieldType::Datetime);
        let err = decode_field("yesterday", &field).expect_err("must reject");
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn integer_decode_is_strict() {
        let field = FieldDef::new("id", FieldType::Integer);
        let err = decode_field("12abc", &field).expect_err("must reject");
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn datetime_encode_rejects_other_variants() {
        let field = FieldDef::new("scraped_at", FieldType::Datetime);
        let err = encode_field(&Value::Integer(7), &field).expect_err("must reject");
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn integer_field_writes_mismatched_text_unchanged() {
        let field = FieldDef::new("id", FieldType::Integer);
        let text =
            encode_field(&Value::Text("primary".into()), &field).expect("encode passthrough");
        assert_eq!(text, "primary");
        // The asymmetry: what leniency wrote, strict decode rejects.
        assert!(decode_field(&text, &field).is_err());
    }

    #[test]
    fn string_field_swallows_unrepresentable_values() {
        let field = FieldDef::new("title", FieldType::String);
        assert_eq!(
            encode_field(&Value::Integer(5), &field).expect("encode"),
            ""
        );
        assert_eq!(
            encode_field(&Value::Bytes(b"plain".to_vec()), &field).expect("encode"),
            "plain"
        );
        assert_eq!(
            encode_field(&Value::Bytes(vec![0xff, 0xfe]), &field).expect("encode"),
            ""
        );
    }

    #[test]
    fn other_field_tries_strategies_in_order() {
        let field = FieldDef::new("payload", FieldType::Other);
        assert_eq!(
            encode_field(&Value::Text("as-is".into()), &field).expect("encode"),
            "as-is"
        );
        assert_eq!(encode_field(&Value::Integer(9), &field).expect("encode"), "9");
        assert_eq!(
            encode_field(&Value::Datetime(datetime!(2024-01-01 00:00:00 UTC)), &field)
                .expect("encode"),
            "2024-01-01T00:00:00Z"
        );
        assert_eq!(
            encode_field(&Value::Bytes(vec![0xff]), &field).expect("encode"),
            ""
        );
    }
}
