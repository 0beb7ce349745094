use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{DocumentId, Result};

/// A stored document: a JSON object body plus its key and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Key of the document within its collection.
    pub id: DocumentId,

    /// Collection the document belongs to (e.g. "products", "orders").
    pub collection: String,

    /// The document body. Always a JSON object.
    pub body: serde_json::Value,

    /// When the document was first inserted.
    pub created_at: DateTime<Utc>,

    /// When the document was last written.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Creates a document with both timestamps set to now.
    pub fn new(collection: impl Into<String>, id: DocumentId, body: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id,
            collection: collection.into(),
            body,
            created_at: now,
            updated_at: now,
        }
    }

    /// Serializes `value` into the body of a new document.
    pub fn from_value<T: Serialize>(
        collection: impl Into<String>,
        id: DocumentId,
        value: &T,
    ) -> Result<Self> {
        Ok(Self::new(collection, id, serde_json::to_value(value)?))
    }

    /// Deserializes the body into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }

    /// Returns the integer stored at a top-level body field, if any.
    pub fn int_field(&self, field: &str) -> Option<i64> {
        self.body.get(field).and_then(serde_json::Value::as_i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Widget {
        name: String,
        quantity: u32,
    }

    #[test]
    fn from_value_and_decode() {
        let widget = Widget {
            name: "bolt".to_string(),
            quantity: 7,
        };
        let doc = Document::from_value("widgets", DocumentId::new(), &widget).unwrap();

        assert_eq!(doc.collection, "widgets");
        assert_eq!(doc.created_at, doc.updated_at);
        assert_eq!(doc.int_field("quantity"), Some(7));
        assert_eq!(doc.decode::<Widget>().unwrap(), widget);
    }

    #[test]
    fn int_field_ignores_non_integers() {
        let doc = Document::new(
            "widgets",
            DocumentId::new(),
            serde_json::json!({"name": "bolt", "ratio": 0.5}),
        );
        assert_eq!(doc.int_field("name"), None);
        assert_eq!(doc.int_field("ratio"), None);
        assert_eq!(doc.int_field("missing"), None);
    }
}
