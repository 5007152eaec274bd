//! Composed collection queries
//!
//! `where` filters are conjunctive, followed by an optional single-field
//! ordering and an optional limit. Evaluation rules:
//! - Unordered results come back in document id order
//! - Ordering drops documents missing the order field
//! - Ties on the order field break on document id
//! - Limit applies after ordering

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::filter::{compare_values, FilterExpr, FilterOperator};
use super::{path, DocumentSnapshot};

/// Maximum number of values accepted by an `in` filter
pub const MAX_IN_VALUES: usize = 30;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Ordering specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// A query over one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub collection: String,
    #[serde(default)]
    pub filters: Vec<FilterExpr>,
    #[serde(default)]
    pub order_by: Option<OrderBy>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Query {
    /// Query every document of a collection
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Add a filter
    pub fn filter(mut self, filter: FilterExpr) -> Self {
        self.filters.push(filter);
        self
    }

    /// Order results by a field
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Cap the number of results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Cap the number of results when a limit is given. Zero means no cap.
    pub fn maybe_limit(self, limit: Option<usize>) -> Self {
        match limit {
            Some(n) if n > 0 => self.limit(n),
            _ => self,
        }
    }

    /// Reject queries the store cannot run
    pub fn validate(&self) -> StoreResult<()> {
        if self.collection.is_empty() {
            return Err(StoreError::InvalidQuery("empty collection name".into()));
        }

        for filter in &self.filters {
            if filter.field.is_empty() {
                return Err(StoreError::InvalidQuery("empty field path".into()));
            }
            if filter.operator == FilterOperator::In {
                let count = filter.value.as_array().map(Vec::len).ok_or_else(|| {
                    StoreError::InvalidQuery(format!(
                        "'in' filter on {} needs an array value",
                        filter.field
                    ))
                })?;
                if count == 0 || count > MAX_IN_VALUES {
                    return Err(StoreError::InvalidQuery(format!(
                        "'in' filter on {} takes 1 to {} values, got {}",
                        filter.field, MAX_IN_VALUES, count
                    )));
                }
            }
        }

        Ok(())
    }

    /// Check whether a document passes every filter
    pub fn matches(&self, doc: &DocumentSnapshot) -> bool {
        self.filters.iter().all(|f| f.matches(&doc.data))
    }

    /// Filter, order and limit candidate documents.
    ///
    /// Candidates are expected in document id order.
    pub fn evaluate(&self, candidates: Vec<DocumentSnapshot>) -> Vec<DocumentSnapshot> {
        let mut results: Vec<DocumentSnapshot> =
            candidates.into_iter().filter(|d| self.matches(d)).collect();

        if let Some(order) = &self.order_by {
            results.retain(|d| path::resolve(&d.data, &order.field).is_some());
            // Stable sort keeps id order among ties
            results.sort_by(|a, b| {
                let va = path::resolve(&a.data, &order.field).unwrap_or(&Value::Null);
                let vb = path::resolve(&b.data, &order.field).unwrap_or(&Value::Null);
                let cmp = compare_values(va, vb);
                match order.direction {
                    SortDirection::Asc => cmp,
                    SortDirection::Desc => cmp.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            results.truncate(limit);
        }

        results
    }
}
