//! Artifact records: the backend DTO mirror and its display-ready form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single artifact as returned by the catalog backend's DTO layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactDTO {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    /// Format name (e.g. "Painting").
    pub format: Option<String>,
    /// Location name (e.g. a museum).
    pub location: Option<String>,
    pub creators: Vec<String>,
    pub materials: Vec<String>,
    pub tags: Vec<String>,
    /// Image URLs, first entry is the primary image.
    pub images: Vec<String>,
}

impl ArtifactDTO {
    /// Tolerant extraction from an untyped payload.
    ///
    /// Missing or mistyped fields fall back to their defaults instead of
    /// rejecting the whole record; non-string entries inside list fields are
    /// skipped.
    pub fn from_value(value: &Value) -> Self {
        Self {
            id: value.get("id").and_then(Value::as_i64),
            name: string_field(value, "name"),
            description: opt_string_field(value, "description"),
            format: opt_string_field(value, "format"),
            location: opt_string_field(value, "location"),
            creators: string_list(value, "creators"),
            materials: string_list(value, "materials"),
            tags: string_list(value, "tags"),
            images: string_list(value, "images"),
        }
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Artifact shaped for direct rendering: name lists joined, thumbnail derived.
///
/// Always recomputed from an [`ArtifactDTO`]; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedArtifact {
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub format: String,
    pub location: String,
    /// Comma-separated creator names.
    pub creators: String,
    /// Comma-separated material names.
    pub materials: String,
    /// Kept as a list for filtering and badges.
    pub tags: Vec<String>,
    pub primary_image: Option<String>,
    pub thumbnail_url: Option<String>,
    pub all_images: Vec<String>,
}

/// Typed view over a normalized response's pagination metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub total: Option<u64>,
    pub total_pages: Option<u64>,
}

impl PaginationMeta {
    /// Extract the typed view from a meta object. Absent or non-numeric
    /// entries stay `None`.
    pub fn from_meta(meta: &Value) -> Self {
        let field = |key: &str| meta.get(key).and_then(Value::as_u64);
        Self {
            page: field("page"),
            per_page: field("per_page"),
            total: field("total"),
            total_pages: field("total_pages"),
        }
    }
}
