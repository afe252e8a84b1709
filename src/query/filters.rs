//! Stateless filter construction and combination.
//!
//! Everything here is a pure function over [`SearchFilters`] values: single
//! field constructors, a few composite presets for the common search forms,
//! a [`combine`] reducer, and a chainable [`FilterBuilder`]. Unlike the
//! stateful query builder, these helpers accept empty input and defer the
//! pruning of empty values to combination/build time.

use crate::models::{FilterField, SearchFilters};

/// Tag input: a single tag or a list joined with commas on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagInput {
    One(String),
    Many(Vec<String>),
}

impl TagInput {
    fn into_value(self) -> String {
        match self {
            TagInput::One(tag) => tag,
            TagInput::Many(tags) => tags.join(","),
        }
    }
}

impl From<&str> for TagInput {
    fn from(tag: &str) -> Self {
        TagInput::One(tag.to_string())
    }
}

impl From<String> for TagInput {
    fn from(tag: String) -> Self {
        TagInput::One(tag)
    }
}

impl From<Vec<String>> for TagInput {
    fn from(tags: Vec<String>) -> Self {
        TagInput::Many(tags)
    }
}

impl From<&[&str]> for TagInput {
    fn from(tags: &[&str]) -> Self {
        TagInput::Many(tags.iter().map(|t| t.to_string()).collect())
    }
}

fn single(field: FilterField, value: String) -> SearchFilters {
    let mut filters = SearchFilters::new();
    filters.insert(field, value);
    filters
}

/// Artifact id filter.
pub fn id(value: impl ToString) -> SearchFilters {
    single(FilterField::Id, value.to_string())
}

/// Artifact name filter (partial match).
pub fn name(value: impl Into<String>) -> SearchFilters {
    single(FilterField::Name, value.into())
}

/// Creator name filter.
pub fn creator(value: impl Into<String>) -> SearchFilters {
    single(FilterField::Creator, value.into())
}

/// Format name filter.
pub fn format(value: impl Into<String>) -> SearchFilters {
    single(FilterField::Format, value.into())
}

/// Location name filter.
pub fn location(value: impl Into<String>) -> SearchFilters {
    single(FilterField::Location, value.into())
}

/// Material name filter.
pub fn material(value: impl Into<String>) -> SearchFilters {
    single(FilterField::Material, value.into())
}

/// Tag filter; a list is joined with commas.
pub fn tag(value: impl Into<TagInput>) -> SearchFilters {
    single(FilterField::Tag, value.into().into_value())
}

/// General text search filter.
pub fn q(value: impl Into<String>) -> SearchFilters {
    single(FilterField::Query, value.into())
}

/// Quick text search preset.
pub fn quick_search(term: impl Into<String>) -> SearchFilters {
    q(term)
}

/// Location plus optional material preset; an absent or empty material is
/// skipped.
pub fn by_location_and_material(
    location_name: impl Into<String>,
    material_name: Option<&str>,
) -> SearchFilters {
    let mut filters = location(location_name);
    if let Some(material_name) = material_name {
        if !material_name.is_empty() {
            filters.insert(FilterField::Material, material_name.to_string());
        }
    }
    filters
}

/// Multiple-tags preset, joined with commas.
pub fn by_tags(tags: &[&str]) -> SearchFilters {
    tag(tags)
}

/// Name plus format preset.
pub fn by_name_and_format(
    name_value: impl Into<String>,
    format_value: impl Into<String>,
) -> SearchFilters {
    let mut filters = name(name_value);
    filters.insert(FilterField::Format, format_value.into());
    filters
}

/// Merge any number of filter sets left to right.
///
/// Each set is first stripped of values that trim to nothing and dropped
/// entirely if nothing survives; surviving keys shallow-merge, with later
/// sets overwriting earlier ones on collision.
pub fn combine<I>(filters: I) -> SearchFilters
where
    I: IntoIterator<Item = SearchFilters>,
{
    let mut merged = SearchFilters::new();
    for filter in filters {
        let surviving: SearchFilters = filter
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .collect();
        if surviving.is_empty() {
            continue;
        }
        merged.extend(surviving);
    }
    merged
}

/// Chainable filter construction with the same pruning semantics as
/// [`combine`]: empty inputs are skipped, `build` prunes once more.
///
/// ```
/// use artifact_search::query::FilterBuilder;
///
/// let filters = FilterBuilder::new()
///     .with_location("Rome")
///     .with_material("marble")
///     .with_tags(&["ancient", "sculpture"])
///     .build();
/// assert_eq!(filters.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    filters: SearchFilters,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl ToString) -> Self {
        let id = id.to_string();
        if !id.is_empty() {
            self.filters.insert(FilterField::Id, id);
        }
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.filters.insert(FilterField::Name, name);
        }
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        let creator = creator.into();
        if !creator.is_empty() {
            self.filters.insert(FilterField::Creator, creator);
        }
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into();
        if !location.is_empty() {
            self.filters.insert(FilterField::Location, location);
        }
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        let material = material.into();
        if !material.is_empty() {
            self.filters.insert(FilterField::Material, material);
        }
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        if !tags.is_empty() {
            self.filters.insert(FilterField::Tag, tags.join(","));
        }
        self
    }

    pub fn with_search_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        if !query.is_empty() {
            self.filters.insert(FilterField::Query, query);
        }
        self
    }

    /// Finalize, pruning any value that trims to nothing.
    pub fn build(self) -> SearchFilters {
        self.filters
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .collect()
    }
}
