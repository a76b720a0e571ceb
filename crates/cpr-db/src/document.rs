//! # Document Encoding
//!
//! Records are kept as JSON text in a `doc` column. These helpers turn
//! records into that text and back, naming the row when a stored document
//! no longer decodes.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DbError, DbResult};

/// A row reduced to its id and document.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DocRow {
    pub id: String,
    pub doc: String,
}

impl DocRow {
    pub fn decode<T: DeserializeOwned>(&self, entity: &str) -> DbResult<T> {
        decode(entity, &self.id, &self.doc)
    }
}

pub(crate) fn encode<T: Serialize>(record: &T) -> DbResult<String> {
    serde_json::to_string(record).map_err(|e| DbError::Internal(format!("encode document: {e}")))
}

pub(crate) fn decode<T: DeserializeOwned>(entity: &str, id: &str, doc: &str) -> DbResult<T> {
    serde_json::from_str(doc).map_err(|e| DbError::Corrupt {
        entity: entity.to_string(),
        id: id.to_string(),
        reason: e.to_string(),
    })
}

/// Decodes every row, failing on the first unreadable one.
pub(crate) fn decode_all<T: DeserializeOwned>(entity: &str, rows: Vec<DocRow>) -> DbResult<Vec<T>> {
    rows.iter().map(|r| r.decode(entity)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpr_core::Branch;

    #[test]
    fn test_corrupt_document_names_row() {
        let row = DocRow {
            id: "b1".into(),
            doc: "{not json".into(),
        };
        let err = row.decode::<Branch>("branch").unwrap_err();
        assert!(matches!(err, DbError::Corrupt { ref id, .. } if id == "b1"));
    }

    #[test]
    fn test_encode_decode() {
        let branch = Branch {
            id: "b1".into(),
            branch_name: "Mirpur".into(),
            branch_location: "Dhaka".into(),
        };
        let doc = encode(&branch).unwrap();
        let back: Branch = decode("branch", "b1", &doc).unwrap();
        assert_eq!(back, branch);
    }
}
