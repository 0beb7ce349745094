use serde_json::Value;

use crate::Document;

/// Ordering of query results by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest documents first.
    #[default]
    Oldest,
    /// Newest documents first.
    Newest,
}

/// Builder for document queries.
///
/// A query selects documents of one collection whose body contains the
/// filter (see [`json_contains`]).
#[derive(Debug, Clone)]
pub struct DocumentQuery {
    /// Collection to search.
    pub collection: String,

    /// Containment filter applied to the body. `None` matches everything.
    pub filter: Option<Value>,

    /// Result ordering.
    pub order: SortOrder,

    /// Maximum number of documents to return.
    pub limit: Option<usize>,

    /// Number of documents to skip.
    pub offset: Option<usize>,
}

impl DocumentQuery {
    /// Creates a query over every document of a collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: None,
            order: SortOrder::default(),
            limit: None,
            offset: None,
        }
    }

    /// Restricts results to bodies containing `filter`.
    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Returns newest documents first.
    pub fn newest_first(mut self) -> Self {
        self.order = SortOrder::Newest;
        self
    }

    /// Sets the maximum number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of results to skip.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the document satisfies the collection and filter.
    pub fn matches(&self, document: &Document) -> bool {
        document.collection == self.collection
            && self
                .filter
                .as_ref()
                .is_none_or(|filter| json_contains(&document.body, filter))
    }
}

/// JSON containment with the semantics of PostgreSQL's `@>` operator.
///
/// Objects contain a needle object when every needle key is present and its
/// value is contained. Arrays contain a needle array when every needle element
/// is contained in some haystack element. Scalars compare by equality.
pub fn json_contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::Object(hay), Value::Object(need)) => need
            .iter()
            .all(|(key, value)| hay.get(key).is_some_and(|h| json_contains(h, value))),
        (Value::Array(hay), Value::Array(need)) => need
            .iter()
            .all(|value| hay.iter().any(|h| json_contains(h, value))),
        (hay, need) => hay == need,
    }
}
