pub use mongodb::bson;

pub use animal::Animal;
pub use document::{from_document, to_document};
pub use errors::DBError;
pub use mongodb_repository::MongoDBRepository;
pub use repository::Repository;
pub use types::{DeleteResult, Query, Record, RecordStream, UpdateResult, UpdateSpec};

pub mod animal;
pub mod document;
pub mod errors;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod mongodb_repository;
pub mod repository;
pub mod types;
