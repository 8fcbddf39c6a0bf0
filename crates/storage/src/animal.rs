use futures::StreamExt;
use log::debug;
use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::document::{from_document, to_document};
use crate::errors::DBError;
use crate::types::{DeleteResult, Query, UpdateResult};
use crate::Repository;

/// An outcome record from the shelter collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Animal {
    pub animal_id: String,
    pub name: String,
    pub animal_type: String,
    pub breed: String,
    pub color: String,
    pub date_of_birth: String,
    pub outcome_type: String,
    pub sex_upon_outcome: String,
    pub age_upon_outcome_in_weeks: f64,
}

impl Animal {
    pub async fn save<T: Repository>(&self, repository: &T) -> Result<bool, DBError> {
        repository.create(Some(&to_document(self)?)).await
    }

    pub async fn find<T: Repository>(
        repository: &T,
        animal_id: &str,
    ) -> Result<Option<Self>, DBError> {
        let query = doc! { "animal_id": animal_id };
        repository.read_one(Some(&query)).await?.map(from_document).transpose()
    }

    /// Collects every match. Documents that do not have the shape of an `Animal` are skipped.
    pub async fn find_all<T: Repository>(
        repository: &T,
        query: &Query,
    ) -> Result<Vec<Self>, DBError> {
        let mut records = repository.read(Some(query)).await?;
        let mut animals = Vec::new();
        while let Some(record) = records.next().await {
            match from_document(record?) {
                Ok(animal) => animals.push(animal),
                Err(e) => debug!("Skipping record that is not an animal: {}", e),
            }
        }
        Ok(animals)
    }

    pub async fn update<T: Repository>(
        &self,
        repository: &T,
        changes: Document,
    ) -> Result<UpdateResult, DBError> {
        let query = doc! { "animal_id": &self.animal_id };
        let update = doc! { "$set": changes };
        repository.update(Some(&query), Some(&update), false).await
    }

    pub async fn delete<T: Repository>(&self, repository: &T) -> Result<DeleteResult, DBError> {
        let query = doc! { "animal_id": &self.animal_id };
        repository.delete(Some(&query), false).await
    }
}
