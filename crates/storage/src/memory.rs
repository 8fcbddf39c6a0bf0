use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use mongodb::bson::{Bson, Document};

use crate::document::{self, require};
use crate::errors::DBError;
use crate::types::{DeleteResult, Query, Record, RecordStream, UpdateResult, UpdateSpec};
use crate::Repository;

/// In-memory [`Repository`] for tests.
///
/// Queries are equality filters on top-level fields and only `$set` updates are applied.
#[derive(Default)]
pub struct MemoryRepository {
    records: Mutex<Vec<Document>>,
}

fn matches_query(record: &Document, query: &Document) -> bool {
    query.iter().all(|(key, value)| record.get(key) == Some(value))
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create(&self, record: Option<&Record>) -> Result<bool, DBError> {
        let Some(record) = record else { return Ok(false) };
        self.records.lock().unwrap().push(record.clone());
        Ok(true)
    }

    async fn read(&self, query: Option<&Query>) -> Result<RecordStream, DBError> {
        let query = require(query, "query")?;
        let matched: Vec<Result<Record, DBError>> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| matches_query(r, query))
            .cloned()
            .map(Ok)
            .collect();
        Ok(stream::iter(matched).boxed())
    }

    async fn read_one(&self, query: Option<&Query>) -> Result<Option<Record>, DBError> {
        let query = require(query, "query")?;
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| matches_query(r, query)).cloned())
    }

    async fn update(
        &self,
        query: Option<&Query>,
        update: Option<&UpdateSpec>,
        multi: bool,
    ) -> Result<UpdateResult, DBError> {
        let query = require(query, "query")?;
        let update = require(update, "update specification")?;
        document::validate_update_spec(update)?;
        let set = update.get_document("$set").cloned().unwrap_or_default();

        let mut result = UpdateResult { matched_count: 0, modified_count: 0 };
        for record in self.records.lock().unwrap().iter_mut() {
            if !matches_query(record, query) {
                continue;
            }
            result.matched_count += 1;
            let before = record.clone();
            for (key, value) in set.iter() {
                record.insert(key.clone(), value.clone());
            }
            if *record != before {
                result.modified_count += 1;
            }
            if !multi {
                break;
            }
        }
        document::check_update_outcome(result)
    }

    async fn delete(&self, query: Option<&Query>, multi: bool) -> Result<DeleteResult, DBError> {
        let query = require(query, "query")?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        if multi {
            records.retain(|r| !matches_query(r, query));
        } else if let Some(index) = records.iter().position(|r| matches_query(r, query)) {
            records.remove(index);
        }
        let deleted_count = (before - records.len()) as u64;
        document::check_delete_outcome(DeleteResult { deleted_count })
    }

    async fn distinct(&self, field_name: Option<&str>) -> Result<Vec<Bson>, DBError> {
        let field_name = document::validate_field_name(field_name)?;
        let mut values: Vec<Bson> = Vec::new();
        for record in self.records.lock().unwrap().iter() {
            if let Some(value) = record.get(field_name) {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }
        Ok(values)
    }

    async fn count(&self, query: Option<&Query>) -> Result<u64, DBError> {
        let query = require(query, "query")?;
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| matches_query(r, query)).count() as u64)
    }
}
