use std::time::Duration;

use async_trait::async_trait;
use derive_more::Display;
use futures::{StreamExt, TryStreamExt};
use log::{debug, info, warn};
use mongodb::{
    bson::{doc, Bson, Document},
    options::{ClientOptions, Credential, FindOneOptions, FindOptions, IndexOptions, ServerAddress},
    Client, Collection,
};
use serde::{de::DeserializeOwned, Serialize};

use config::MongoConfig;

use crate::document::{self, require};
use crate::errors::DBError;
use crate::types::{DeleteResult, Query, Record, RecordStream, UpdateResult, UpdateSpec};
use crate::Repository;

#[derive(Debug, Display, Clone)]
#[display(
    "MongoDBRepository {{ client: {:?}, db_name: {}, collection_name: {} }}",
    client,
    db_name,
    collection_name
)]
pub struct MongoDBRepository {
    pub client: Client,
    db_name: String,
    collection_name: String,
}

impl MongoDBRepository {
    /// Connects with the configured credentials. The driver connects lazily, so an
    /// unreachable server surfaces on the first operation rather than here.
    pub async fn new(config: &MongoConfig) -> Result<Self, DBError> {
        let credential = Credential::builder()
            .username(config.username.clone())
            .password(config.password.clone())
            .source(config.auth_db.clone())
            .build();

        let options = ClientOptions::builder()
            .hosts(vec![ServerAddress::Tcp { host: config.host.clone(), port: Some(config.port) }])
            .credential(credential)
            .server_selection_timeout(config.server_selection_timeout_ms.map(Duration::from_millis))
            .app_name(config.app_name.clone())
            .build();

        let client = Client::with_options(options)?;
        let repository =
            Self::with_client(client, config.db_name.clone(), config.collection_name.clone());

        if let Some(key) = &config.unique_index {
            if let Err(e) = repository.create_unique_index(key).await {
                repository.close().await;
                return Err(e);
            }
        }

        info!(
            "Repository ready for {}.{} on {}:{}",
            config.db_name, config.collection_name, config.host, config.port
        );
        Ok(repository)
    }

    pub fn with_client(client: Client, db_name: String, collection_name: String) -> Self {
        Self { client, db_name, collection_name }
    }

    pub fn get_collection(&self) -> Collection<Document> {
        self.client.database(&self.db_name).collection(&self.collection_name)
    }

    async fn create_unique_index(&self, key: &str) -> Result<(), DBError> {
        let collection = self.get_collection();
        let model = mongodb::IndexModel::builder()
            .keys(doc! { key: 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection.create_index(model, None).await?;
        debug!("Ensured unique index on {}", key);
        Ok(())
    }

    pub fn to_document<T: Serialize>(&self, item: &T) -> Result<Document, DBError> {
        document::to_document(item)
    }

    pub fn from_document<T: DeserializeOwned>(&self, doc: Document) -> Result<T, DBError> {
        document::from_document(doc)
    }

    /// Shuts the client down, waiting for in-flight operations to finish.
    pub async fn close(self) {
        info!("Closing connection to {}", self.db_name);
        self.client.shutdown().await;
    }
}

fn without_id() -> Document {
    doc! { "_id": 0 }
}

#[async_trait]
impl Repository for MongoDBRepository {
    async fn create(&self, record: Option<&Record>) -> Result<bool, DBError> {
        let Some(record) = record else {
            warn!("Create called without a record, nothing inserted");
            return Ok(false);
        };

        debug!("Inserting record into {}", self.collection_name);
        self.get_collection().insert_one(record, None).await?;
        Ok(true)
    }

    async fn read(&self, query: Option<&Query>) -> Result<RecordStream, DBError> {
        let query = require(query, "query")?;
        document::validate_query(query)?;

        debug!("Finding records matching {}", query);
        let options = FindOptions::builder().projection(without_id()).build();
        let cursor = self.get_collection().find(query.clone(), options).await?;
        Ok(cursor.map_err(DBError::from).boxed())
    }

    async fn read_one(&self, query: Option<&Query>) -> Result<Option<Record>, DBError> {
        let query = require(query, "query")?;
        document::validate_query(query)?;

        debug!("Finding one record matching {}", query);
        let options = FindOneOptions::builder().projection(without_id()).build();
        let record = self.get_collection().find_one(query.clone(), options).await?;
        Ok(record)
    }

    async fn update(
        &self,
        query: Option<&Query>,
        update: Option<&UpdateSpec>,
        multi: bool,
    ) -> Result<UpdateResult, DBError> {
        let query = require(query, "query")?;
        let update = require(update, "update specification")?;
        document::validate_query(query)?;
        document::validate_update_spec(update)?;

        debug!("Updating records matching {} with {} (multi: {})", query, update, multi);
        let collection = self.get_collection();
        let result = if multi {
            collection.update_many(query.clone(), update.clone(), None).await?
        } else {
            collection.update_one(query.clone(), update.clone(), None).await?
        };

        document::check_update_outcome(result.into())
    }

    async fn delete(&self, query: Option<&Query>, multi: bool) -> Result<DeleteResult, DBError> {
        let query = require(query, "query")?;
        document::validate_query(query)?;

        debug!("Deleting records matching {} (multi: {})", query, multi);
        let collection = self.get_collection();
        let result = if multi {
            collection.delete_many(query.clone(), None).await?
        } else {
            collection.delete_one(query.clone(), None).await?
        };

        document::check_delete_outcome(result.into())
    }

    async fn distinct(&self, field_name: Option<&str>) -> Result<Vec<Bson>, DBError> {
        let field_name = document::validate_field_name(field_name)?;

        debug!("Collecting distinct values of {}", field_name);
        let values = self.get_collection().distinct(field_name, None, None).await?;
        Ok(values)
    }

    async fn count(&self, query: Option<&Query>) -> Result<u64, DBError> {
        let query = require(query, "query")?;
        document::validate_query(query)?;

        debug!("Counting records matching {}", query);
        let count = self.get_collection().count_documents(query.clone(), None).await?;
        Ok(count)
    }
}
