use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::info;

use rememerme_db::models::{self, ALL_SCHEMAS};
use rememerme_db::{Database, Identifier, Record, Schema, StoreConfig};

#[derive(Debug, Parser)]
#[command(name = "rememerme", version, about = "Inspect the rememerme entity store")]
struct Cli {
    /// Database file (overrides REMEMERME_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the entity tables if they don't exist
    Init,
    /// Print one record as JSON
    Get {
        /// Table name, e.g. `games` or `game_members`
        kind: String,
        id: String,
    },
    /// Print every record whose indexed field equals the value
    Filter {
        kind: String,
        field: String,
        value: String,
    },
}

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rememerme=info,rememerme_db=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = StoreConfig::from_env()?;
    if let Some(path) = cli.db {
        config.db_path = path;
    }
    let db = Database::open(&config)
        .with_context(|| format!("opening {}", config.db_path.display()))?;

    match cli.command {
        Command::Init => {
            info!(
                "{} entity kinds ready in {}",
                ALL_SCHEMAS.len(),
                config.db_path.display()
            );
        }
        Command::Get { kind, id } => {
            let schema = lookup_schema(&kind)?;
            let record = db.get_record(schema, Identifier::parse(&id)?)?;
            println!("{}", serde_json::to_string_pretty(&record_json(schema, &record)?)?);
        }
        Command::Filter { kind, field, value } => {
            let schema = lookup_schema(&kind)?;
            let spec = schema
                .field(&field)
                .ok_or_else(|| anyhow!("{} has no field {:?}", schema.kind, field))?;
            let value = (spec.codec.parse)(&value)
                .map_err(|e| anyhow!("{}.{}: {}", schema.kind, field, e))?;

            let records = db.filter_records(schema, &field, &value)?;
            let rows = records
                .iter()
                .map(|r| record_json(schema, r))
                .collect::<anyhow::Result<Vec<_>>>()?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}

fn lookup_schema(kind: &str) -> anyhow::Result<&'static Schema> {
    models::schema_for_table(kind).ok_or_else(|| {
        let known: Vec<&str> = ALL_SCHEMAS.iter().map(|s| s.table).collect();
        anyhow!("unknown kind {:?} (expected one of: {})", kind, known.join(", "))
    })
}

/// Flatten a record into one JSON object, with the id under the kind's id
/// field name.
fn record_json(schema: &Schema, record: &Record) -> anyhow::Result<Value> {
    let mut obj = Map::new();
    obj.insert(schema.id_field.to_string(), serde_json::to_value(record.id)?);
    for (name, value) in &record.fields {
        obj.insert(name.to_string(), serde_json::to_value(value)?);
    }
    Ok(Value::Object(obj))
}
