//! Stateful accumulation of validated search parameters.

use std::borrow::Cow;

use crate::models::{
    FilterField, SearchFilters, SearchParams, ValidationError, DEFAULT_PAGE, DEFAULT_PER_PAGE,
    MAX_PER_PAGE,
};

/// Accumulates filter and pagination fields into a canonical parameter set.
///
/// Each setter validates its input: text filters store the trimmed value and
/// reject all-whitespace input, pagination setters enforce their bounds. A
/// builder is created per search session and never shared across concurrent
/// searches; [`QueryBuilder::clone`] yields a fully independent copy.
///
/// ```
/// use artifact_search::query::QueryBuilder;
///
/// # fn example() -> Result<(), artifact_search::models::ValidationError> {
/// let mut builder = QueryBuilder::new();
/// builder
///     .set_name(Some("Mona Lisa"))?
///     .set_location(Some("Louvre"))?
///     .set_pagination(2, Some(50))?;
/// assert_eq!(builder.to_query_string(), "page=2&per_page=50&name=Mona%20Lisa&location=Louvre");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBuilder {
    page: u32,
    per_page: u32,
    filters: SearchFilters,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    /// Fresh builder: page 1, per_page 20, no filters.
    pub fn new() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            filters: SearchFilters::new(),
        }
    }

    /// Permissive constructor from raw key/value pairs.
    ///
    /// Invalid or missing `page` falls back to 1, invalid or out-of-range
    /// `per_page` to 20; filter values are kept only when trimmed non-empty;
    /// unknown keys are ignored. Nothing here fails; this is the entry point
    /// for untrusted pre-parsed input such as URL parameters.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut builder = Self::new();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "page" => {
                    if let Ok(page) = value.trim().parse::<u32>() {
                        if page >= 1 {
                            builder.page = page;
                        }
                    }
                }
                "per_page" => {
                    if let Ok(per_page) = value.trim().parse::<u32>() {
                        if (1..=MAX_PER_PAGE).contains(&per_page) {
                            builder.per_page = per_page;
                        }
                    }
                }
                other => {
                    if let Some(field) = FilterField::from_key(other) {
                        let trimmed = value.trim();
                        if !trimmed.is_empty() {
                            builder.filters.insert(field, trimmed.to_string());
                        }
                    }
                }
            }
        }
        builder
    }

    /// Parse a `key=value&...` query string into a new builder.
    ///
    /// Round-trip note: serialization loses numeric typing; values come back
    /// as strings and are re-validated permissively like [`Self::from_pairs`].
    pub fn from_query_string(query: &str) -> Self {
        let pairs = query
            .trim_start_matches('?')
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (key, value) = part.split_once('=').unwrap_or((part, ""));
                (decode_component(key), decode_component(value))
            });
        Self::from_pairs(pairs)
    }

    /// Set the artifact id filter. Accepts any displayable value (the backend
    /// takes numeric and string ids alike); `None` removes the filter, as
    /// does a value that trims to nothing.
    pub fn set_id<T: ToString>(&mut self, id: Option<T>) -> &mut Self {
        match id {
            None => {
                self.filters.remove(&FilterField::Id);
            }
            Some(id) => {
                let id = id.to_string();
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    self.filters.remove(&FilterField::Id);
                } else {
                    self.filters.insert(FilterField::Id, trimmed.to_string());
                }
            }
        }
        self
    }

    pub fn set_name(&mut self, name: Option<&str>) -> Result<&mut Self, ValidationError> {
        self.set_text(FilterField::Name, name)
    }

    pub fn set_creator(&mut self, creator: Option<&str>) -> Result<&mut Self, ValidationError> {
        self.set_text(FilterField::Creator, creator)
    }

    pub fn set_format(&mut self, format: Option<&str>) -> Result<&mut Self, ValidationError> {
        self.set_text(FilterField::Format, format)
    }

    pub fn set_location(&mut self, location: Option<&str>) -> Result<&mut Self, ValidationError> {
        self.set_text(FilterField::Location, location)
    }

    pub fn set_material(&mut self, material: Option<&str>) -> Result<&mut Self, ValidationError> {
        self.set_text(FilterField::Material, material)
    }

    pub fn set_conservation_report(
        &mut self,
        report: Option<&str>,
    ) -> Result<&mut Self, ValidationError> {
        self.set_text(FilterField::ConservationReport, report)
    }

    pub fn set_tag(&mut self, tag: Option<&str>) -> Result<&mut Self, ValidationError> {
        self.set_text(FilterField::Tag, tag)
    }

    /// Set the general text search query (`q`).
    pub fn set_text_search(&mut self, query: Option<&str>) -> Result<&mut Self, ValidationError> {
        self.set_text(FilterField::Query, query)
    }

    /// Shared text-filter path: `None` removes, all-whitespace fails, the
    /// trimmed value is stored otherwise.
    fn set_text(
        &mut self,
        field: FilterField,
        value: Option<&str>,
    ) -> Result<&mut Self, ValidationError> {
        match value {
            None => {
                self.filters.remove(&field);
            }
            Some(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::missing_content(field.key()));
                }
                self.filters.insert(field, trimmed.to_string());
            }
        }
        Ok(self)
    }

    /// Set pagination. `page` must be >= 1; `per_page`, when given, must be
    /// in 1..=100. The failing bound is named in the error.
    pub fn set_pagination(
        &mut self,
        page: u32,
        per_page: Option<u32>,
    ) -> Result<&mut Self, ValidationError> {
        if page < 1 {
            return Err(ValidationError::below_minimum("page", 1));
        }
        self.page = page;

        if let Some(per_page) = per_page {
            if per_page < 1 {
                return Err(ValidationError::below_minimum("per_page", 1));
            }
            if per_page > MAX_PER_PAGE {
                return Err(ValidationError::above_maximum("per_page", MAX_PER_PAGE));
            }
            self.per_page = per_page;
        }
        Ok(self)
    }

    /// Apply every present filter through its setter, in canonical field
    /// order. Sequential semantics: the first invalid field aborts the batch
    /// with that field's error, and fields applied before it stay applied.
    pub fn set_filters(&mut self, filters: &SearchFilters) -> Result<&mut Self, ValidationError> {
        for field in FilterField::ALL {
            let Some(value) = filters.get(&field) else {
                continue;
            };
            match field {
                FilterField::Id => {
                    self.set_id(Some(value));
                }
                _ => {
                    self.set_text(field, Some(value.as_str()))?;
                }
            }
        }
        Ok(self)
    }

    /// Drop every filter, keeping pagination.
    pub fn clear_filters(&mut self) -> &mut Self {
        self.filters.clear();
        self
    }

    /// Drop one filter. Pagination fields are not filters and are never
    /// touched here.
    pub fn clear_filter(&mut self, field: FilterField) -> &mut Self {
        self.filters.remove(&field);
        self
    }

    /// Restore the initial state: page 1, per_page 20, no filters.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::new();
        self
    }

    /// Whether any filter is set, pagination excluded.
    pub fn has_active_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Number of active filters, pagination excluded.
    pub fn active_filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Finalized parameter set. Always carries both pagination fields; filter
    /// entries are trimmed and non-empty by construction.
    pub fn build(&self) -> SearchParams {
        SearchParams {
            page: self.page,
            per_page: self.per_page,
            filters: self.filters.clone(),
        }
    }

    /// Canonical `key=value&...` serialization of [`Self::build`], URL-encoded,
    /// ordered `page`, `per_page`, then filters in field order.
    pub fn to_query_string(&self) -> String {
        self.build()
            .pairs()
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn decode_component(raw: &str) -> Cow<'_, str> {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(raw),
    }
}
