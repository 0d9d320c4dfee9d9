use rusqlite::Connection;
use tracing::info;

use crate::error::Result;
use crate::schema::Schema;

/// Create the cell and index tables for each schema if they don't exist.
/// Existing tables are never altered.
pub fn run(conn: &Connection, schemas: &[&Schema]) -> Result<()> {
    for schema in schemas {
        ensure_tables(conn, schema)?;
    }

    info!("Entity tables ready ({} kinds)", schemas.len());
    Ok(())
}

fn ensure_tables(conn: &Connection, schema: &Schema) -> Result<()> {
    let table = schema.table;
    let index = schema.index_table();

    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS {table} (
            row_key      TEXT NOT NULL,
            field_name   TEXT NOT NULL,
            field_value,
            PRIMARY KEY (row_key, field_name)
        ) WITHOUT ROWID;

        CREATE TABLE IF NOT EXISTS {index} (
            field_name   TEXT NOT NULL,
            row_key      TEXT NOT NULL,
            field_value,
            PRIMARY KEY (field_name, row_key)
        ) WITHOUT ROWID;

        CREATE INDEX IF NOT EXISTS idx_{index}_lookup
            ON {index}(field_name, field_value);
        "
    ))?;

    Ok(())
}
