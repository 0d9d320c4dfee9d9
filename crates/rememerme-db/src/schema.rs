use crate::codec::Codec;
use crate::error::Result;
use crate::identifier::Identifier;
use crate::value::Record;

/// One declared column of an entity kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub codec: Codec,
    /// Maintained as a secondary index, so `filter_by` may query it.
    pub indexed: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, codec: Codec) -> Self {
        Self {
            name,
            codec,
            indexed: false,
        }
    }

    pub const fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }
}

/// Table-driven description of an entity kind.
#[derive(Debug)]
pub struct Schema {
    /// Human-readable kind name, used in errors and logs.
    pub kind: &'static str,
    /// Backing table. Must be a plain SQL identifier.
    pub table: &'static str,
    /// Name the id goes by in the entity (the row key is never stored as a column).
    pub id_field: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn indexed_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.indexed)
    }

    pub fn index_table(&self) -> String {
        format!("{}_index", self.table)
    }
}

/// A concrete entity kind stored through the generic store.
pub trait Entity: Sized {
    const SCHEMA: &'static Schema;

    fn id(&self) -> Option<Identifier>;

    fn set_id(&mut self, id: Identifier);

    fn to_record(&self) -> Record;

    fn from_record(record: Record) -> Result<Self>;
}
