use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::identifier::Identifier;
use crate::schema::Schema;

/// A single decoded field of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Id(Identifier),
    IdList(Vec<Identifier>),
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
            Self::Timestamp(_) => "timestamp",
            Self::Id(_) => "identifier",
            Self::IdList(_) => "identifier list",
        }
    }
}

/// Rust types that map onto a [`FieldValue`] variant.
pub trait FieldType: Sized {
    fn into_field(self) -> FieldValue;
    fn from_field(value: FieldValue) -> Option<Self>;
}

macro_rules! field_type {
    ($ty:ty, $variant:ident) => {
        impl FieldType for $ty {
            fn into_field(self) -> FieldValue {
                FieldValue::$variant(self)
            }

            fn from_field(value: FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

field_type!(String, Text);
field_type!(i64, Integer);
field_type!(bool, Boolean);
field_type!(DateTime<Utc>, Timestamp);
field_type!(Identifier, Id);
field_type!(Vec<Identifier>, IdList);

impl<T: FieldType> FieldType for Option<T> {
    fn into_field(self) -> FieldValue {
        self.map_or(FieldValue::Null, T::into_field)
    }

    fn from_field(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(None),
            other => T::from_field(other).map(Some),
        }
    }
}

impl FieldType for FieldValue {
    fn into_field(self) -> FieldValue {
        self
    }

    fn from_field(value: FieldValue) -> Option<Self> {
        Some(value)
    }
}

/// Generic persisted entity: an optional id plus its named fields, ordered
/// by name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub id: Option<Identifier>,
    pub fields: BTreeMap<&'static str, FieldValue>,
}

impl Record {
    pub fn new(id: Option<Identifier>) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &'static str, value: impl FieldType) -> Self {
        self.fields.insert(name, value.into_field());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Remove a field and convert it. A missing field reads as null, so only
    /// `Option<_>` targets accept it.
    pub fn take<T: FieldType>(&mut self, schema: &Schema, name: &str) -> Result<T> {
        let value = self.fields.remove(name).unwrap_or(FieldValue::Null);
        let found = value.type_name();
        T::from_field(value).ok_or_else(|| {
            let reason = if found == "null" {
                "missing value".to_string()
            } else {
                format!("unexpected {} value", found)
            };
            StoreError::malformed(schema.kind, name, reason)
        })
    }
}
