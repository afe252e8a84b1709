//! Search parameter types shared by the query builder and the HTTP gateway.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Default page number for paginated requests.
pub const DEFAULT_PAGE: u32 = 1;

/// Default page size for paginated requests.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Upper bound accepted for `per_page`.
pub const MAX_PER_PAGE: u32 = 100;

/// Filter fields accepted by the catalog search endpoint.
///
/// The declaration order is the canonical serialization and batch-application
/// order. Wire keys are fixed by the backend route contract
/// (`conservationReport` stays camelCase, the text query is `q`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterField {
    Id,
    Name,
    Creator,
    Format,
    Location,
    Material,
    ConservationReport,
    Tag,
    #[serde(rename = "q")]
    Query,
}

impl FilterField {
    /// All filter fields, in canonical order.
    pub const ALL: [FilterField; 9] = [
        FilterField::Id,
        FilterField::Name,
        FilterField::Creator,
        FilterField::Format,
        FilterField::Location,
        FilterField::Material,
        FilterField::ConservationReport,
        FilterField::Tag,
        FilterField::Query,
    ];

    /// Wire key used in query strings and request parameters.
    pub fn key(&self) -> &'static str {
        match self {
            FilterField::Id => "id",
            FilterField::Name => "name",
            FilterField::Creator => "creator",
            FilterField::Format => "format",
            FilterField::Location => "location",
            FilterField::Material => "material",
            FilterField::ConservationReport => "conservationReport",
            FilterField::Tag => "tag",
            FilterField::Query => "q",
        }
    }

    /// Parse a wire key back into a field. Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        FilterField::ALL.iter().copied().find(|f| f.key() == key)
    }
}

impl std::fmt::Display for FilterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A set of filter constraints keyed by field.
///
/// Values are canonical strings; a numeric `id` is stored stringified, which
/// is the documented round-trip asymmetry of query-string serialization.
/// Absence of a key means "no constraint"; an empty string is never stored
/// by the query builder (the stateless combination helpers prune empties at
/// combination time instead).
pub type SearchFilters = BTreeMap<FilterField, String>;

/// Validated search parameters: filters plus mandatory pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Page number, 1-indexed, always >= 1.
    pub page: u32,

    /// Items per page, always in 1..=100.
    pub per_page: u32,

    /// Active filter constraints.
    #[serde(default)]
    pub filters: SearchFilters,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            filters: SearchFilters::new(),
        }
    }
}

impl SearchParams {
    /// Canonical ordered key/value pairs: `page`, `per_page`, then filters in
    /// field declaration order.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(2 + self.filters.len());
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs.push(("per_page".to_string(), self.per_page.to_string()));
        for (field, value) in &self.filters {
            pairs.push((field.key().to_string(), value.clone()));
        }
        pairs
    }
}

/// Validation failure raised by the query builder before any network attempt.
///
/// The message is the localized user-facing text; `field` names the offending
/// parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Field that failed validation.
    pub field: String,

    /// Localized user-facing message.
    pub message: String,
}

impl ValidationError {
    /// A required text value was missing or all-whitespace.
    pub fn missing_content(field: &str) -> Self {
        Self {
            field: field.to_string(),
            message: "Contenuto mancante".to_string(),
        }
    }

    /// A numeric value fell below its minimum bound.
    pub fn below_minimum(field: &str, min: u32) -> Self {
        Self {
            field: field.to_string(),
            message: format!("{field} deve essere maggiore o uguale a {min}"),
        }
    }

    /// A numeric value exceeded its maximum bound.
    pub fn above_maximum(field: &str, max: u32) -> Self {
        Self {
            field: field.to_string(),
            message: format!("{field} deve essere minore o uguale a {max}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_keys_round_trip() {
        for field in FilterField::ALL {
            assert_eq!(FilterField::from_key(field.key()), Some(field));
        }
        assert_eq!(FilterField::from_key("per_page"), None);
        assert_eq!(FilterField::from_key("unknown"), None);
    }

    #[test]
    fn query_field_uses_short_wire_key() {
        assert_eq!(FilterField::Query.key(), "q");
        assert_eq!(FilterField::ConservationReport.key(), "conservationReport");
    }

    #[test]
    fn pairs_lead_with_pagination() {
        let mut params = SearchParams::default();
        params.filters.insert(FilterField::Name, "Vase".to_string());
        params.filters.insert(FilterField::Id, "7".to_string());

        let pairs = params.pairs();
        assert_eq!(pairs[0], ("page".to_string(), "1".to_string()));
        assert_eq!(pairs[1], ("per_page".to_string(), "20".to_string()));
        // Filters follow in declaration order regardless of insertion order.
        assert_eq!(pairs[2], ("id".to_string(), "7".to_string()));
        assert_eq!(pairs[3], ("name".to_string(), "Vase".to_string()));
    }

    #[test]
    fn validation_messages_are_localized() {
        assert_eq!(
            ValidationError::missing_content("name").message,
            "Contenuto mancante"
        );
        assert_eq!(
            ValidationError::below_minimum("page", 1).message,
            "page deve essere maggiore o uguale a 1"
        );
        assert_eq!(
            ValidationError::above_maximum("per_page", 100).message,
            "per_page deve essere minore o uguale a 100"
        );
    }
}
