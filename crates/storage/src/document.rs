//! Argument validation shared by every [`Repository`](crate::Repository) implementation.
//!
//! All checks here run before the storage call is made.

use log::warn;
use mongodb::bson::{self, Bson, Document};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::DBError;
use crate::types::{DeleteResult, UpdateResult};

// Other top-level operators are left for the server to judge.
const LOGICAL_QUERY_OPERATORS: [&str; 3] = ["$and", "$or", "$nor"];

pub fn to_document<T: Serialize>(item: &T) -> Result<Document, DBError> {
    match bson::to_bson(item)? {
        Bson::Document(doc) => Ok(doc),
        _ => Err(reject(DBError::WrongType("value"))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, DBError> {
    let item = bson::from_bson(Bson::Document(doc))?;
    Ok(item)
}

/// Logs a handled failure and hands it back for returning.
pub(crate) fn reject(err: DBError) -> DBError {
    warn!("{}", err);
    err
}

pub fn require<'a>(arg: Option<&'a Document>, name: &'static str) -> Result<&'a Document, DBError> {
    arg.ok_or_else(|| reject(DBError::MissingArgument(name)))
}

pub fn validate_field_name(field_name: Option<&str>) -> Result<&str, DBError> {
    match field_name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(reject(DBError::MissingArgument("field name"))),
    }
}

pub fn validate_query(query: &Document) -> Result<(), DBError> {
    for (key, value) in query {
        if !LOGICAL_QUERY_OPERATORS.contains(&key.as_str()) {
            continue;
        }

        let clauses = match value {
            Bson::Array(clauses) if !clauses.is_empty() => clauses,
            _ => return Err(malformed(format!("{} must be a non-empty array", key))),
        };
        for clause in clauses {
            match clause {
                Bson::Document(clause) => validate_query(clause)?,
                _ => return Err(malformed(format!("{} clauses must be documents", key))),
            }
        }
    }
    Ok(())
}

pub fn validate_update_spec(update: &Document) -> Result<(), DBError> {
    if update.is_empty() {
        return Err(malformed("update specification is empty".to_string()));
    }

    for (key, value) in update {
        if !key.starts_with('$') {
            return Err(malformed(format!("update field {} is not an update operator", key)));
        }
        if !matches!(value, Bson::Document(_)) {
            return Err(malformed(format!("argument to {} must be a document", key)));
        }
    }
    Ok(())
}

// Both modes look at matched before modified.
pub fn check_update_outcome(result: UpdateResult) -> Result<UpdateResult, DBError> {
    if result.matched_count == 0 {
        return Err(reject(DBError::NoMatch("update")));
    }
    if result.modified_count == 0 {
        return Err(reject(DBError::NoChange));
    }
    Ok(result)
}

pub fn check_delete_outcome(result: DeleteResult) -> Result<DeleteResult, DBError> {
    if result.deleted_count == 0 {
        return Err(reject(DBError::NoMatch("delete")));
    }
    Ok(result)
}

fn malformed(reason: String) -> DBError {
    reject(DBError::MalformedArgument(reason))
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Dog {
        name: String,
        age: i32,
    }

    #[test]
    fn test_to_document_rejects_non_documents() {
        assert!(matches!(to_document(&42), Err(DBError::WrongType(_))));
        assert!(matches!(to_document(&vec!["a", "b"]), Err(DBError::WrongType(_))));
        assert!(matches!(to_document(&None::<Dog>), Err(DBError::WrongType(_))));
    }

    #[test]
    fn test_document_conversion() {
        let dog = Dog { name: "Rex".to_string(), age: 3 };
        let doc = to_document(&dog).unwrap();
        assert_eq!(doc, doc! { "name": "Rex", "age": 3 });

        let back: Dog = from_document(doc).unwrap();
        assert_eq!(back, dog);

        assert!(matches!(
            from_document::<Dog>(doc! { "name": 7 }),
            Err(DBError::BsonDeserialization(_))
        ));
    }

    #[test]
    fn test_require() {
        let query = doc! { "a": 1 };
        assert_eq!(require(Some(&query), "query").unwrap(), &query);
        assert!(matches!(require(None, "query"), Err(DBError::MissingArgument("query"))));
    }

    #[test]
    fn test_empty_query_is_allowed() {
        assert!(validate_query(&doc! {}).is_ok());
    }

    #[test]
    fn test_validate_field_name() {
        assert_eq!(validate_field_name(Some("breed")).unwrap(), "breed");
        assert!(matches!(validate_field_name(None), Err(DBError::MissingArgument(_))));
        assert!(matches!(validate_field_name(Some("")), Err(DBError::MissingArgument(_))));
        assert!(matches!(validate_field_name(Some("  ")), Err(DBError::MissingArgument(_))));
    }

    #[test]
    fn test_validate_query() {
        assert!(validate_query(&doc! { "breed": "Labrador", "age": { "$gt": 2 } }).is_ok());
        assert!(validate_query(&doc! { "$or": [{ "a": 1 }, { "b": { "$in": [1, 2] } }] }).is_ok());
        assert!(validate_query(&doc! { "$expr": { "$gt": ["$a", "$b"] } }).is_ok());
    }

    #[test]
    fn test_unknown_top_level_operators_reach_the_server() {
        assert!(validate_query(&doc! { "$sampleRate": 0.5 }).is_ok());
        assert!(validate_query(&doc! { "$and": [{ "$comment": "x" }, { "a": 1 }] }).is_ok());
    }

    #[test]
    fn test_malformed_logical_operators() {
        assert!(matches!(
            validate_query(&doc! { "$or": [] }),
            Err(DBError::MalformedArgument(_))
        ));
        assert!(matches!(
            validate_query(&doc! { "$and": { "a": 1 } }),
            Err(DBError::MalformedArgument(_))
        ));
        assert!(matches!(
            validate_query(&doc! { "$nor": [1] }),
            Err(DBError::MalformedArgument(_))
        ));
        assert!(matches!(
            validate_query(&doc! { "$and": [{ "$or": "x" }] }),
            Err(DBError::MalformedArgument(_))
        ));
    }

    #[test]
    fn test_validate_update_spec() {
        assert!(validate_update_spec(&doc! { "$set": { "status": "closed" } }).is_ok());
        assert!(validate_update_spec(&doc! { "$inc": { "n": 1 }, "$unset": { "x": "" } }).is_ok());

        assert!(matches!(validate_update_spec(&doc! {}), Err(DBError::MalformedArgument(_))));
        assert!(matches!(
            validate_update_spec(&doc! { "status": "closed" }),
            Err(DBError::MalformedArgument(_))
        ));
        assert!(matches!(
            validate_update_spec(&doc! { "$set": "closed" }),
            Err(DBError::MalformedArgument(_))
        ));
    }

    #[test]
    fn test_update_outcome_checks_match_first() {
        let none = UpdateResult { matched_count: 0, modified_count: 0 };
        assert!(matches!(check_update_outcome(none), Err(DBError::NoMatch("update"))));

        let unchanged = UpdateResult { matched_count: 1, modified_count: 0 };
        assert!(matches!(check_update_outcome(unchanged), Err(DBError::NoChange)));

        let changed = UpdateResult { matched_count: 3, modified_count: 2 };
        assert_eq!(check_update_outcome(changed).unwrap(), changed);
    }

    #[test]
    fn test_delete_outcome() {
        assert!(matches!(
            check_delete_outcome(DeleteResult { deleted_count: 0 }),
            Err(DBError::NoMatch("delete"))
        ));
        let deleted = DeleteResult { deleted_count: 4 };
        assert_eq!(check_delete_outcome(deleted).unwrap(), deleted);
    }
}
