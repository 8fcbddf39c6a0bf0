use async_trait::async_trait;
use mongodb::bson::Bson;

use crate::errors::DBError;
use crate::types::{DeleteResult, Query, Record, RecordStream, UpdateResult, UpdateSpec};

/// CRUD operations against a single collection.
///
/// Arguments are optional so an absent query or record is rejected with
/// [`DBError::MissingArgument`] before the storage call is made.
#[async_trait]
pub trait Repository {
    /// Inserts one record. Returns `false` without touching storage when `record` is absent.
    async fn create(&self, record: Option<&Record>) -> Result<bool, DBError>;

    /// Streams the records matching `query`, identifier field excluded.
    async fn read(&self, query: Option<&Query>) -> Result<RecordStream, DBError>;

    async fn read_one(&self, query: Option<&Query>) -> Result<Option<Record>, DBError>;

    /// Applies `update` to the first match, or to every match when `multi` is set.
    async fn update(
        &self,
        query: Option<&Query>,
        update: Option<&UpdateSpec>,
        multi: bool,
    ) -> Result<UpdateResult, DBError>;

    async fn delete(&self, query: Option<&Query>, multi: bool) -> Result<DeleteResult, DBError>;

    async fn distinct(&self, field_name: Option<&str>) -> Result<Vec<Bson>, DBError>;

    async fn count(&self, query: Option<&Query>) -> Result<u64, DBError>;
}
