use crate::document::Document;
use crate::oid::ObjectId;
use crate::value::Value;

/// A cross-document reference triple: collection name, key, and optional
/// origin database, plus whatever extra fields rode along.
///
/// This is a structural convention layered on plain documents, not a wire
/// type of its own. It encodes as a document whose `$ref`/`$id`/`$db`
/// keys are written first, and the decoder rebuilds it from any document
/// whose `$`-prefixed keys are exactly drawn from that set.
#[derive(Clone, Debug, PartialEq)]
pub struct DbRef {
    /// Collection or namespace name (`$ref`).
    pub collection: String,
    /// The referenced key (`$id`). Any value kind is allowed.
    pub id: Value,
    /// Optional origin database (`$db`).
    pub db: Option<String>,
    /// Any non-`$` fields that were present alongside the triple.
    pub extra: Document,
}

impl DbRef {
    pub fn new(collection: impl Into<String>, id: impl Into<Value>) -> DbRef {
        DbRef {
            collection: collection.into(),
            id: id.into(),
            db: None,
            extra: Document::new(),
        }
    }

    pub fn with_db(mut self, db: impl Into<String>) -> DbRef {
        self.db = Some(db.into());
        self
    }

    /// The equivalent plain-document shape, `$`-keys first.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("$ref", self.collection.clone());
        doc.insert("$id", self.id.clone());
        if let Some(db) = &self.db {
            doc.insert("$db", db.clone());
        }
        for (k, v) in self.extra.iter() {
            doc.insert(k, v.clone());
        }
        doc
    }
}

/// A legacy pointer value pairing a namespace with a 12-byte identifier.
/// Kept only so old payloads still round-trip.
#[derive(Clone, Debug, PartialEq)]
pub struct DbPointer {
    pub namespace: String,
    pub id: ObjectId,
}

impl DbPointer {
    pub fn new(namespace: impl Into<String>, id: ObjectId) -> DbPointer {
        DbPointer {
            namespace: namespace.into(),
            id,
        }
    }
}
