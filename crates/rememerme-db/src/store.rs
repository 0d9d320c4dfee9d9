//! Generic entity store operations: get-by-id, filter-by-secondary-index and
//! upsert, shared by every entity kind.

use rusqlite::Connection;
use rusqlite::types::Value;
use tracing::debug;

use crate::codec;
use crate::error::{Result, StoreError};
use crate::identifier::Identifier;
use crate::schema::{Entity, Schema};
use crate::value::{FieldType, FieldValue, Record};
use crate::Database;

impl Database {
    // -- Records --

    pub fn get_record(&self, schema: &Schema, id: Identifier) -> Result<Record> {
        let cells = self.with_conn(|conn| query_row_cells(conn, schema, &id.to_string()))?;

        if cells.is_empty() {
            return Err(StoreError::NotFound {
                kind: schema.kind,
                id,
            });
        }

        codec::decode(schema, id, cells)
    }

    /// Equality lookup over a declared secondary index. Matches come back in
    /// row-key order, which for generated ids is creation order.
    pub fn filter_records(
        &self,
        schema: &Schema,
        field: &str,
        value: &FieldValue,
    ) -> Result<Vec<Record>> {
        let spec = schema
            .field(field)
            .filter(|f| f.indexed)
            .ok_or_else(|| StoreError::UnsupportedFilter {
                kind: schema.kind,
                field: field.to_string(),
            })?;
        let encoded =
            (spec.codec.encode)(value).map_err(|e| StoreError::malformed(schema.kind, field, e))?;

        let rows = self.with_conn(|conn| query_indexed_cells(conn, schema, spec.name, &encoded))?;
        debug!(
            "{} filter {} = {:?}: {} cells",
            schema.kind,
            field,
            encoded,
            rows.len()
        );

        let mut records = Vec::new();
        for (row_key, cells) in group_by_row(rows) {
            let id = Identifier::parse(&row_key)?;
            records.push(codec::decode(schema, id, cells)?);
        }

        Ok(records)
    }

    /// Upsert a record. Generates an id when the record has none, then writes
    /// each field as its own cell, leaving columns not present in this write
    /// untouched. The returned record holds exactly what was written.
    pub fn save_record(&self, schema: &Schema, mut record: Record) -> Result<Record> {
        let id = *record.id.get_or_insert_with(Identifier::generate);
        let cells = codec::encode(schema, &record)?;
        let row_key = id.to_string();

        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            {
                let mut put = tx.prepare(&format!(
                    "INSERT INTO {} (row_key, field_name, field_value) VALUES (?1, ?2, ?3)
                     ON CONFLICT(row_key, field_name) DO UPDATE SET field_value = excluded.field_value",
                    schema.table
                ))?;
                let mut put_index = tx.prepare(&format!(
                    "INSERT OR REPLACE INTO {} (field_name, row_key, field_value) VALUES (?1, ?2, ?3)",
                    schema.index_table()
                ))?;

                for (name, value) in &cells {
                    put.execute(rusqlite::params![row_key, name, value])?;

                    if schema.field(name).is_some_and(|f| f.indexed) {
                        put_index.execute(rusqlite::params![name, row_key, value])?;
                    }
                }
            }
            tx.commit()?;
            Ok(())
        })?;

        debug!("{} {} saved ({} fields)", schema.kind, id, cells.len());
        Ok(record)
    }

    // -- Entities --

    pub fn get_by_id<T: Entity>(&self, id: Identifier) -> Result<T> {
        T::from_record(self.get_record(T::SCHEMA, id)?)
    }

    /// Like [`Database::get_by_id`], but a missing id is not a lookup at all.
    pub fn get<T: Entity>(&self, id: Option<Identifier>) -> Result<Option<T>> {
        match id {
            Some(id) => self.get_by_id(id).map(Some),
            None => Ok(None),
        }
    }

    /// Like [`Database::get_by_id`], with `NotFound` mapped to `None`.
    pub fn try_get_by_id<T: Entity>(&self, id: Identifier) -> Result<Option<T>> {
        match self.get_by_id(id) {
            Ok(entity) => Ok(Some(entity)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Look up by the id's textual form.
    pub fn get_by_key<T: Entity>(&self, key: &str) -> Result<T> {
        self.get_by_id(Identifier::parse(key)?)
    }

    pub fn filter_by<T: Entity>(&self, field: &str, value: impl FieldType) -> Result<Vec<T>> {
        self.filter_records(T::SCHEMA, field, &value.into_field())?
            .into_iter()
            .map(T::from_record)
            .collect()
    }

    /// Persist the entity under its own schema, assigning a fresh id if it
    /// has none.
    pub fn save<T: Entity>(&self, entity: &mut T) -> Result<Identifier> {
        let id = entity.id().unwrap_or_else(Identifier::generate);
        let mut record = entity.to_record();
        record.id = Some(id);
        self.save_record(T::SCHEMA, record)?;
        entity.set_id(id);
        Ok(id)
    }
}

fn query_row_cells(conn: &Connection, schema: &Schema, row_key: &str) -> Result<Vec<(String, Value)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT field_name, field_value FROM {} WHERE row_key = ?1",
        schema.table
    ))?;

    let cells = stmt
        .query_map([row_key], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Value>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(cells)
}

fn query_indexed_cells(
    conn: &Connection,
    schema: &Schema,
    field: &str,
    value: &Value,
) -> Result<Vec<(String, String, Value)>> {
    // JOIN the index to fetch every matching row in a single query
    let mut stmt = conn.prepare(&format!(
        "SELECT t.row_key, t.field_name, t.field_value
         FROM {index} i
         JOIN {table} t ON t.row_key = i.row_key
         WHERE i.field_name = ?1 AND i.field_value IS ?2
         ORDER BY t.row_key",
        index = schema.index_table(),
        table = schema.table,
    ))?;

    let rows = stmt
        .query_map(rusqlite::params![field, value], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Value>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn group_by_row(rows: Vec<(String, String, Value)>) -> Vec<(String, Vec<(String, Value)>)> {
    let mut grouped: Vec<(String, Vec<(String, Value)>)> = Vec::new();

    for (row_key, field, value) in rows {
        if let Some((key, cells)) = grouped.last_mut() {
            if *key == row_key {
                cells.push((field, value));
                continue;
            }
        }
        grouped.push((row_key, vec![(field, value)]));
    }

    grouped
}
