use futures::stream::BoxStream;
use mongodb::bson::Document;
use mongodb::results;
use serde::Serialize;

use crate::errors::DBError;

/// One stored document.
pub type Record = Document;
/// Filter selecting zero or more records.
pub type Query = Document;
/// Mutation applied to matched records, keyed by update operator.
pub type UpdateSpec = Document;

/// Lazy, forward-only sequence of records matching a query.
pub type RecordStream = BoxStream<'static, Result<Record, DBError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

impl From<results::UpdateResult> for UpdateResult {
    fn from(result: results::UpdateResult) -> Self {
        Self { matched_count: result.matched_count, modified_count: result.modified_count }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

impl From<results::DeleteResult> for DeleteResult {
    fn from(result: results::DeleteResult) -> Self {
        Self { deleted_count: result.deleted_count }
    }
}
