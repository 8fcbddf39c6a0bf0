use std::io::Write;

use futures_util::StreamExt;
use log::debug;
use storage::bson::{Bson, Document};
use storage::{to_document, DBError, Record, Repository};
use thiserror::Error;

use crate::Command;

pub async fn run<R: Repository, W: Write>(
    repository: &R,
    command: Command,
    out: &mut W,
) -> Result<(), CommandError> {
    debug!("Running {:?}", command);

    match command {
        Command::Create { record } => {
            let record = parse_document(record.as_deref())?;
            let inserted = repository.create(record.as_ref()).await?;
            writeln!(out, "{}", inserted)?;
        }
        Command::Read { query } => {
            let query = parse_document(query.as_deref())?;
            let mut records = repository.read(query.as_ref()).await?;
            while let Some(record) = records.next().await {
                writeln!(out, "{}", to_json(record?))?;
            }
        }
        Command::ReadOne { query } => {
            let query = parse_document(query.as_deref())?;
            match repository.read_one(query.as_ref()).await? {
                Some(record) => writeln!(out, "{}", to_json(record))?,
                None => writeln!(out, "null")?,
            }
        }
        Command::Update { query, update, multi } => {
            let query = parse_document(query.as_deref())?;
            let update = parse_document(update.as_deref())?;
            let result = repository.update(query.as_ref(), update.as_ref(), multi).await?;
            writeln!(out, "{}", serde_json::to_string(&result)?)?;
        }
        Command::Delete { query, multi } => {
            let query = parse_document(query.as_deref())?;
            let result = repository.delete(query.as_ref(), multi).await?;
            writeln!(out, "{}", serde_json::to_string(&result)?)?;
        }
        Command::Distinct { field } => {
            let values = repository.distinct(field.as_deref()).await?;
            let values: Vec<serde_json::Value> =
                values.into_iter().map(Bson::into_relaxed_extjson).collect();
            writeln!(out, "{}", serde_json::Value::Array(values))?;
        }
        Command::Count { query } => {
            let query = parse_document(query.as_deref())?;
            writeln!(out, "{}", repository.count(query.as_ref()).await?)?;
        }
    }
    Ok(())
}

/// Parses a JSON argument. Anything but a JSON object is rejected as the wrong type.
pub fn parse_document(arg: Option<&str>) -> Result<Option<Document>, CommandError> {
    let Some(arg) = arg else { return Ok(None) };
    let value: serde_json::Value = serde_json::from_str(arg)?;
    Ok(Some(to_document(&value)?))
}

fn to_json(record: Record) -> serde_json::Value {
    Bson::Document(record).into_relaxed_extjson()
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid JSON argument: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] DBError),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Whether the request was rejected as given, rather than failing on a fault.
    pub fn is_handled(&self) -> bool {
        match self {
            CommandError::Json(_) => true,
            CommandError::Storage(e) => e.is_handled(),
            CommandError::Io(_) => false,
        }
    }
}
