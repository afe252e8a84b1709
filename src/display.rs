//! Mapping of artifact records into their UI-ready display form.
//!
//! Pure functions only: a [`FormattedArtifact`] is recomputed from its DTO on
//! every call and never cached or shared.

use serde::Serialize;
use serde_json::Value;

use crate::models::{ArtifactDTO, FormattedArtifact};
use crate::normalize::NormalizedResponse;

/// A formatted list response: display records plus the untouched meta object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedList {
    pub items: Vec<FormattedArtifact>,
    pub meta: Value,
}

/// A formatted single-item response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedItem {
    pub item: Option<FormattedArtifact>,
    pub meta: Value,
}

/// Map one artifact into display form.
///
/// Missing fields default to empty strings/lists; `creators` and `materials`
/// join with `", "`; `tags` stays a list for badge rendering; the thumbnail
/// URL derives from the primary (first) image.
pub fn format_for_display(artifact: &ArtifactDTO) -> FormattedArtifact {
    let primary_image = artifact.images.first().cloned();
    let thumbnail_url = primary_image.as_deref().map(make_thumb);

    FormattedArtifact {
        id: artifact.id,
        name: artifact.name.clone(),
        description: artifact.description.clone().unwrap_or_default(),
        format: artifact.format.clone().unwrap_or_default(),
        location: artifact.location.clone().unwrap_or_default(),
        creators: artifact.creators.join(", "),
        materials: artifact.materials.join(", "),
        tags: artifact.tags.clone(),
        primary_image,
        thumbnail_url,
        all_images: artifact.images.clone(),
    }
}

/// Thumbnail variant of an image URL: `size=thumb` appended with `&` when the
/// URL already carries a query string, `?` otherwise.
fn make_thumb(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}size=thumb")
}

/// Format a slice of artifacts.
pub fn format_list(artifacts: &[ArtifactDTO]) -> Vec<FormattedArtifact> {
    artifacts.iter().map(format_for_display).collect()
}

/// Format a raw payload expected to be a list of artifact records.
///
/// Non-list input is a caller mistake, not a failure: it is logged and
/// yields an empty sequence.
pub fn format_value_list(value: &Value) -> Vec<FormattedArtifact> {
    match value.as_array() {
        Some(items) => items
            .iter()
            .map(|item| format_for_display(&ArtifactDTO::from_value(item)))
            .collect(),
        None => {
            tracing::warn!("format_value_list received a non-list payload");
            Vec::new()
        }
    }
}

/// Format a normalized list response, passing `meta` through unchanged. An
/// item-shaped response has no list to format and yields an empty one.
pub fn format_list_response(response: &NormalizedResponse) -> FormattedList {
    match response {
        NormalizedResponse::List { items, meta } => FormattedList {
            items: items
                .iter()
                .map(|item| format_for_display(&ArtifactDTO::from_value(item)))
                .collect(),
            meta: meta.clone(),
        },
        NormalizedResponse::Item { meta, .. } => FormattedList {
            items: Vec::new(),
            meta: meta.clone(),
        },
    }
}

/// Format a normalized single-item response, passing `meta` through
/// unchanged. A list-shaped response yields no item.
pub fn format_item_response(response: &NormalizedResponse) -> FormattedItem {
    match response {
        NormalizedResponse::Item { item, meta } => FormattedItem {
            item: Some(format_for_display(&ArtifactDTO::from_value(item))),
            meta: meta.clone(),
        },
        NormalizedResponse::List { meta, .. } => FormattedItem {
            item: None,
            meta: meta.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::json;

    #[test]
    fn joins_creators_and_derives_thumbnail() {
        let dto = ArtifactDTO::from_value(&json!({
            "creators": ["A", "B"],
            "images": ["x.png"]
        }));
        let formatted = format_for_display(&dto);

        assert_eq!(formatted.creators, "A, B");
        assert_eq!(formatted.primary_image.as_deref(), Some("x.png"));
        assert_eq!(formatted.thumbnail_url.as_deref(), Some("x.png?size=thumb"));
        assert_eq!(formatted.all_images, vec!["x.png"]);
    }

    #[test]
    fn thumbnail_appends_with_ampersand_when_query_present() {
        assert_eq!(make_thumb("x.png?v=2"), "x.png?v=2&size=thumb");
        assert_eq!(make_thumb("x.png"), "x.png?size=thumb");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let formatted = format_for_display(&ArtifactDTO::default());
        assert_eq!(formatted.id, None);
        assert_eq!(formatted.name, "");
        assert_eq!(formatted.description, "");
        assert_eq!(formatted.creators, "");
        assert!(formatted.tags.is_empty());
        assert_eq!(formatted.primary_image, None);
        assert_eq!(formatted.thumbnail_url, None);
    }

    #[test]
    fn format_value_list_rejects_non_lists_quietly() {
        assert!(format_value_list(&json!({"id": 1})).is_empty());
        assert_eq!(format_value_list(&json!([{"name": "Vase"}])).len(), 1);
    }

    #[test]
    fn list_response_formats_items_and_passes_meta() {
        let normalized = normalize(Some(json!({
            "items": [{"id": 1, "name": "Vase"}],
            "meta": {"total": 1}
        })));

        let formatted = format_list_response(&normalized);
        assert_eq!(formatted.items.len(), 1);
        assert_eq!(formatted.items[0].name, "Vase");
        assert_eq!(formatted.meta, json!({"total": 1}));
    }

    #[test]
    fn item_response_formats_single_record() {
        let normalized = normalize(Some(json!({"id": 7, "name": "Vase"})));
        let formatted = format_item_response(&normalized);
        let item = formatted.item.expect("item response");
        assert_eq!(item.id, Some(7));
        assert_eq!(item.name, "Vase");

        // Shape mismatch yields no item rather than a panic.
        let as_list = format_item_response(&normalize(Some(json!([]))));
        assert!(as_list.item.is_none());
    }
}
