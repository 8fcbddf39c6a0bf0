use mongodb::bson;
use mongodb::error::ErrorKind;
use thiserror::Error;

use crate::document::reject;

#[derive(Error, Debug)]
pub enum DBError {
    #[error("Missing argument: {0} must be provided")]
    MissingArgument(&'static str),

    #[error("Query did not return any documents to {0}")]
    NoMatch(&'static str),

    #[error("Unable to update document. Check your query and update data and try again")]
    NoChange,

    #[error("Query or data not formatted correctly: {0}")]
    MalformedArgument(String),

    #[error("{0} must be a document")]
    WrongType(&'static str),

    #[error("MongoDB error: {0}")]
    Mongo(#[source] mongodb::error::Error),

    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[error("BSON deserialization error: {0}")]
    BsonDeserialization(#[from] bson::de::Error),
}

impl DBError {
    /// Whether the failure was detected by the repository itself rather than raised by the server.
    pub fn is_handled(&self) -> bool {
        matches!(
            self,
            DBError::MissingArgument(_)
                | DBError::NoMatch(_)
                | DBError::NoChange
                | DBError::MalformedArgument(_)
                | DBError::WrongType(_)
        )
    }
}

// The driver rejects badly shaped filters and updates client-side with InvalidArgument.
impl From<mongodb::error::Error> for DBError {
    fn from(err: mongodb::error::Error) -> Self {
        if let ErrorKind::InvalidArgument { message, .. } = err.kind.as_ref() {
            return reject(DBError::MalformedArgument(message.clone()));
        }
        DBError::Mongo(err)
    }
}
