//! Record codec: converts between [`Record`]s and the flat cells stored in a
//! row.
//!
//! Every schema field carries a [`Codec`], so the encoding of a column is
//! declared next to the column itself. List-valued fields are stored as JSON
//! text; everything else is stored as a native SQLite scalar.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use rusqlite::types::Value;
use tracing::warn;

use crate::error::{Result, StoreError};
use crate::identifier::Identifier;
use crate::schema::Schema;
use crate::value::{FieldValue, Record};

type CodecResult<T> = std::result::Result<T, String>;

/// Per-field conversion table.
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    pub name: &'static str,
    /// Field value to stored scalar.
    pub encode: fn(&FieldValue) -> CodecResult<Value>,
    /// Stored scalar to field value.
    pub decode: fn(Value) -> CodecResult<FieldValue>,
    /// Operator-entered text to field value.
    pub parse: fn(&str) -> CodecResult<FieldValue>,
}

impl Codec {
    pub const TEXT: Codec = Codec {
        name: "text",
        encode: encode_text,
        decode: decode_text,
        parse: parse_text,
    };

    pub const INTEGER: Codec = Codec {
        name: "integer",
        encode: encode_integer,
        decode: decode_integer,
        parse: parse_integer,
    };

    /// Stored as 0/1.
    pub const BOOLEAN: Codec = Codec {
        name: "boolean",
        encode: encode_boolean,
        decode: decode_boolean,
        parse: parse_boolean,
    };

    /// Stored as RFC 3339 text in UTC with nanosecond precision. Years outside
    /// 1..=9999 don't parse back from that form, so they are rejected.
    pub const TIMESTAMP: Codec = Codec {
        name: "timestamp",
        encode: encode_timestamp,
        decode: decode_timestamp,
        parse: parse_timestamp,
    };

    pub const IDENTIFIER: Codec = Codec {
        name: "identifier",
        encode: encode_identifier,
        decode: decode_identifier,
        parse: parse_identifier,
    };

    /// Stored as a JSON array of identifier strings.
    pub const JSON_ID_LIST: Codec = Codec {
        name: "json identifier list",
        encode: encode_id_list,
        decode: decode_id_list,
        parse: parse_id_list,
    };
}

/// Encode a record's fields into `(column, value)` cells using the schema's
/// codecs. Fields the schema doesn't declare are rejected.
pub fn encode(schema: &Schema, record: &Record) -> Result<Vec<(&'static str, Value)>> {
    let mut cells = Vec::with_capacity(record.fields.len());

    for (name, value) in &record.fields {
        let spec = schema
            .field(name)
            .ok_or_else(|| StoreError::malformed(schema.kind, name, "field not declared"))?;
        let encoded =
            (spec.codec.encode)(value).map_err(|e| StoreError::malformed(schema.kind, name, e))?;
        cells.push((spec.name, encoded));
    }

    Ok(cells)
}

/// Decode a stored row into a record, merging the row key in as the id.
/// Columns the schema doesn't declare are skipped.
pub fn decode(schema: &Schema, id: Identifier, cells: Vec<(String, Value)>) -> Result<Record> {
    let mut record = Record::new(Some(id));

    for (column, value) in cells {
        let Some(spec) = schema.field(&column) else {
            warn!("{} {}: skipping undeclared column {:?}", schema.kind, id, column);
            continue;
        };
        let decoded =
            (spec.codec.decode)(value).map_err(|e| StoreError::malformed(schema.kind, spec.name, e))?;
        record.fields.insert(spec.name, decoded);
    }

    Ok(record)
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Integer(_) => "integer",
        Value::Real(_) => "real",
        Value::Text(_) => "text",
        Value::Blob(_) => "blob",
    }
}

fn mismatch(expected: &str, found: &FieldValue) -> String {
    format!("expected {}, got {}", expected, found.type_name())
}

fn stored_mismatch(expected: &str, found: &Value) -> String {
    format!("expected stored {}, found {}", expected, value_type(found))
}

// -- Text --

fn encode_text(value: &FieldValue) -> CodecResult<Value> {
    match value {
        FieldValue::Null => Ok(Value::Null),
        FieldValue::Text(s) => Ok(Value::Text(s.clone())),
        other => Err(mismatch("text", other)),
    }
}

fn decode_text(value: Value) -> CodecResult<FieldValue> {
    match value {
        Value::Null => Ok(FieldValue::Null),
        Value::Text(s) => Ok(FieldValue::Text(s)),
        other => Err(stored_mismatch("text", &other)),
    }
}

fn parse_text(text: &str) -> CodecResult<FieldValue> {
    Ok(FieldValue::Text(text.to_string()))
}

// -- Integer --

fn encode_integer(value: &FieldValue) -> CodecResult<Value> {
    match value {
        FieldValue::Null => Ok(Value::Null),
        FieldValue::Integer(n) => Ok(Value::Integer(*n)),
        other => Err(mismatch("integer", other)),
    }
}

fn decode_integer(value: Value) -> CodecResult<FieldValue> {
    match value {
        Value::Null => Ok(FieldValue::Null),
        Value::Integer(n) => Ok(FieldValue::Integer(n)),
        other => Err(stored_mismatch("integer", &other)),
    }
}

fn parse_integer(text: &str) -> CodecResult<FieldValue> {
    text.trim()
        .parse()
        .map(FieldValue::Integer)
        .map_err(|e| format!("invalid integer {:?}: {}", text, e))
}

// -- Boolean --

fn encode_boolean(value: &FieldValue) -> CodecResult<Value> {
    match value {
        FieldValue::Null => Ok(Value::Null),
        FieldValue::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
        other => Err(mismatch("boolean", other)),
    }
}

fn decode_boolean(value: Value) -> CodecResult<FieldValue> {
    match value {
        Value::Null => Ok(FieldValue::Null),
        Value::Integer(0) => Ok(FieldValue::Boolean(false)),
        Value::Integer(1) => Ok(FieldValue::Boolean(true)),
        Value::Integer(n) => Err(format!("boolean out of range: {}", n)),
        other => Err(stored_mismatch("integer", &other)),
    }
}

fn parse_boolean(text: &str) -> CodecResult<FieldValue> {
    match text.trim() {
        "true" | "1" => Ok(FieldValue::Boolean(true)),
        "false" | "0" => Ok(FieldValue::Boolean(false)),
        other => Err(format!("invalid boolean {:?}", other)),
    }
}

// -- Timestamp --

const TIMESTAMP_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

fn encode_timestamp(value: &FieldValue) -> CodecResult<Value> {
    match value {
        FieldValue::Null => Ok(Value::Null),
        FieldValue::Timestamp(ts) if !TIMESTAMP_YEARS.contains(&ts.year()) => {
            Err(format!("timestamp year {} outside 1..=9999", ts.year()))
        }
        FieldValue::Timestamp(ts) => Ok(Value::Text(ts.to_rfc3339_opts(SecondsFormat::Nanos, true))),
        other => Err(mismatch("timestamp", other)),
    }
}

fn decode_timestamp(value: Value) -> CodecResult<FieldValue> {
    match value {
        Value::Null => Ok(FieldValue::Null),
        Value::Text(s) => parse_timestamp(&s),
        other => Err(stored_mismatch("text", &other)),
    }
}

fn parse_timestamp(text: &str) -> CodecResult<FieldValue> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|ts| FieldValue::Timestamp(ts.with_timezone(&Utc)))
        .map_err(|e| format!("invalid timestamp {:?}: {}", text, e))
}

// -- Identifier --

fn encode_identifier(value: &FieldValue) -> CodecResult<Value> {
    match value {
        FieldValue::Null => Ok(Value::Null),
        FieldValue::Id(id) => Ok(Value::Text(id.to_string())),
        other => Err(mismatch("identifier", other)),
    }
}

fn decode_identifier(value: Value) -> CodecResult<FieldValue> {
    match value {
        Value::Null => Ok(FieldValue::Null),
        Value::Text(s) => parse_identifier(&s),
        other => Err(stored_mismatch("text", &other)),
    }
}

fn parse_identifier(text: &str) -> CodecResult<FieldValue> {
    Identifier::parse(text)
        .map(FieldValue::Id)
        .map_err(|e| e.to_string())
}

// -- JSON identifier list --

fn encode_id_list(value: &FieldValue) -> CodecResult<Value> {
    match value {
        FieldValue::Null => Ok(Value::Null),
        FieldValue::IdList(ids) => serde_json::to_string(ids)
            .map(Value::Text)
            .map_err(|e| e.to_string()),
        other => Err(mismatch("identifier list", other)),
    }
}

fn decode_id_list(value: Value) -> CodecResult<FieldValue> {
    match value {
        Value::Null => Ok(FieldValue::Null),
        Value::Text(s) => parse_id_list(&s),
        other => Err(stored_mismatch("text", &other)),
    }
}

fn parse_id_list(text: &str) -> CodecResult<FieldValue> {
    serde_json::from_str::<Vec<Identifier>>(text)
        .map(FieldValue::IdList)
        .map_err(|e| format!("invalid JSON identifier list: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Friends, Game, GameMember};
    use crate::schema::Entity;
    use chrono::TimeZone;

    fn sample_game() -> Record {
        Record::new(Some(Identifier::generate()))
            .with("party_id", Identifier::generate())
            .with("leader_id", Identifier::generate())
            .with("current_round_id", None::<Identifier>)
            .with("winning_score", 7i64)
            .with("started", true)
            .with("date_created", Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap())
            .with("last_modified", Utc::now())
    }

    #[test]
    fn game_record_roundtrip() {
        let record = sample_game();
        let id = record.id.unwrap();

        let cells = encode(Game::SCHEMA, &record).unwrap();
        let stored: Vec<(String, Value)> =
            cells.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        let decoded = decode(Game::SCHEMA, id, stored).unwrap();

        assert_eq!(decoded, record);
    }

    #[test]
    fn list_field_is_stored_as_json_text() {
        let a = Identifier::generate();
        let b = Identifier::generate();
        let record = Record::new(None).with("friends_list", vec![a, b]);

        let cells = encode(Friends::SCHEMA, &record).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(
            cells[0],
            ("friends_list", Value::Text(format!("[\"{}\",\"{}\"]", a, b)))
        );
    }

    #[test]
    fn booleans_are_stored_as_integers() {
        let record = Record::new(None).with("started", false);
        let cells = encode(Game::SCHEMA, &record).unwrap();
        assert_eq!(cells, vec![("started", Value::Integer(0))]);
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let id = Identifier::generate();
        let cells = vec![("friends_list".to_string(), Value::Text("[not json".into()))];

        match decode(Friends::SCHEMA, id, cells) {
            Err(StoreError::MalformedField { kind, field, .. }) => {
                assert_eq!(kind, "Friends");
                assert_eq!(field, "friends_list");
            }
            other => panic!("expected MalformedField, got {:?}", other),
        }
    }

    #[test]
    fn decode_rejects_wrong_json_shape() {
        let id = Identifier::generate();
        let cells = vec![("friends_list".to_string(), Value::Text("{\"a\": 1}".into()))];
        assert!(matches!(
            decode(Friends::SCHEMA, id, cells),
            Err(StoreError::MalformedField { .. })
        ));
    }

    #[test]
    fn decode_skips_undeclared_columns() {
        let id = Identifier::generate();
        let cells = vec![
            ("status".to_string(), Value::Integer(2)),
            ("legacy_column".to_string(), Value::Text("x".into())),
        ];
        let record = decode(GameMember::SCHEMA, id, cells).unwrap();
        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.get("status"), Some(&FieldValue::Integer(2)));
    }

    #[test]
    fn encode_rejects_type_mismatch_and_unknown_fields() {
        let wrong_type = Record::new(None).with("winning_score", "seven".to_string());
        assert!(matches!(
            encode(Game::SCHEMA, &wrong_type),
            Err(StoreError::MalformedField { .. })
        ));

        let unknown = Record::new(None).with("nickname", "x".to_string());
        assert!(matches!(
            encode(Game::SCHEMA, &unknown),
            Err(StoreError::MalformedField { .. })
        ));
    }

    #[test]
    fn parse_uses_field_codec() {
        assert_eq!((Codec::INTEGER.parse)("42"), Ok(FieldValue::Integer(42)));
        assert_eq!((Codec::BOOLEAN.parse)("true"), Ok(FieldValue::Boolean(true)));
        assert!((Codec::IDENTIFIER.parse)("nope").is_err());
        assert!((Codec::TIMESTAMP.parse)("2024-03-01T12:30:00Z").is_ok());
    }

    #[test]
    fn timestamps_outside_four_digit_years_are_rejected() {
        let far_future = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        let before_epoch = Utc.with_ymd_and_hms(-1, 6, 1, 0, 0, 0).unwrap();

        for ts in [far_future, before_epoch] {
            let record = Record::new(None).with("last_modified", ts);
            match encode(Game::SCHEMA, &record) {
                Err(StoreError::MalformedField { field, .. }) => assert_eq!(field, "last_modified"),
                other => panic!("expected MalformedField for {}, got {:?}", ts, other),
            }
        }
    }

    #[test]
    fn boundary_years_roundtrip() {
        let first = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap()
            + chrono::Duration::nanoseconds(999_999_999);

        for ts in [first, last] {
            let stored = (Codec::TIMESTAMP.encode)(&FieldValue::Timestamp(ts)).unwrap();
            assert_eq!((Codec::TIMESTAMP.decode)(stored), Ok(FieldValue::Timestamp(ts)));
        }
    }
}
