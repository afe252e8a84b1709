//! Normalization of heterogeneous backend payload shapes.
//!
//! The catalog backend (and the proxies in front of it) answer with several
//! envelope shapes: a bare array, `{items: [...]}`-style lists with pagination
//! fields at various keys, explicit `{item: {...}}` wrappers, or a naked
//! resource object. [`normalize`] folds all of them into one canonical shape.
//!
//! The shape predicates run in a fixed priority order that is a compatibility
//! contract: ambiguous payloads (say, an object carrying both an `items`
//! array and an `id`) resolve by rule order, not by best interpretation. Do
//! not reorder the checks.

use serde::Serialize;
use serde_json::{Map, Value};

/// List-bearing keys scanned on object payloads, in priority order.
const LIST_KEYS: [&str; 3] = ["items", "results", "data"];

/// Keys whose presence marks an object as a single resource.
const SINGLE_RESOURCE_KEYS: [&str; 4] = ["id", "_id", "uuid", "attributes"];

/// Canonical response shape produced by [`normalize`].
///
/// Exactly one of a list or a single item; `meta` is always a JSON object,
/// possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedResponse {
    /// A list of resources plus pagination metadata.
    List { items: Vec<Value>, meta: Value },
    /// A single resource plus metadata.
    Item { item: Value, meta: Value },
}

impl NormalizedResponse {
    /// An empty list with empty metadata.
    pub fn empty() -> Self {
        NormalizedResponse::List {
            items: Vec::new(),
            meta: empty_meta(),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, NormalizedResponse::List { .. })
    }

    pub fn is_item(&self) -> bool {
        matches!(self, NormalizedResponse::Item { .. })
    }

    /// The item list, when this is a list response.
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            NormalizedResponse::List { items, .. } => Some(items),
            NormalizedResponse::Item { .. } => None,
        }
    }

    /// The single resource, when this is an item response.
    pub fn item(&self) -> Option<&Value> {
        match self {
            NormalizedResponse::List { .. } => None,
            NormalizedResponse::Item { item, .. } => Some(item),
        }
    }

    /// Metadata object; empty when the payload carried none.
    pub fn meta(&self) -> &Value {
        match self {
            NormalizedResponse::List { meta, .. } | NormalizedResponse::Item { meta, .. } => meta,
        }
    }
}

/// Classify a decoded payload into the canonical shape.
///
/// Rules, first match wins:
///
/// 1. missing/null payload -> empty list
/// 2. array -> list
/// 3. object with an array under `items`/`results`/`data` (that order) ->
///    list, with the object's own `meta` or pagination synthesized from the
///    envelope's top-level fields
/// 4. object with an object-valued `item` field -> item
/// 5. object carrying `id`/`_id`/`uuid`/`attributes` -> item
/// 6. anything else -> wrapped as a one-element list
pub fn normalize(payload: Option<Value>) -> NormalizedResponse {
    let value = match payload {
        None | Some(Value::Null) => return NormalizedResponse::empty(),
        Some(value) => value,
    };

    match value {
        Value::Array(items) => NormalizedResponse::List {
            items,
            meta: empty_meta(),
        },
        Value::Object(map) => normalize_object(map),
        other => NormalizedResponse::List {
            items: vec![other],
            meta: empty_meta(),
        },
    }
}

fn normalize_object(map: Map<String, Value>) -> NormalizedResponse {
    for key in LIST_KEYS {
        if let Some(Value::Array(items)) = map.get(key) {
            let meta = map
                .get("meta")
                .cloned()
                .unwrap_or_else(|| synthesized_meta(&map));
            return NormalizedResponse::List {
                items: items.clone(),
                meta,
            };
        }
    }

    if let Some(item) = map.get("item") {
        if item.is_object() {
            let meta = map.get("meta").cloned().unwrap_or_else(empty_meta);
            return NormalizedResponse::Item {
                item: item.clone(),
                meta,
            };
        }
    }

    if SINGLE_RESOURCE_KEYS.iter().any(|key| map.contains_key(*key)) {
        return NormalizedResponse::Item {
            item: Value::Object(map),
            meta: empty_meta(),
        };
    }

    NormalizedResponse::List {
        items: vec![Value::Object(map)],
        meta: empty_meta(),
    }
}

fn empty_meta() -> Value {
    Value::Object(Map::new())
}

/// Pagination metadata assembled from an envelope's top-level fields, with
/// explicit nulls for anything absent. Alias sets match the backends seen in
/// the wild: `page`/`current_page`, `per_page`/`perPage`/`limit`,
/// `total`/`total_count`/`count`, `total_pages`/`totalPages`.
fn synthesized_meta(map: &Map<String, Value>) -> Value {
    let mut meta = Map::with_capacity(4);
    meta.insert("page".to_string(), first_of(map, &["page", "current_page"]));
    meta.insert(
        "per_page".to_string(),
        first_of(map, &["per_page", "perPage", "limit"]),
    );
    meta.insert(
        "total".to_string(),
        first_of(map, &["total", "total_count", "count"]),
    );
    meta.insert(
        "total_pages".to_string(),
        first_of(map, &["total_pages", "totalPages"]),
    );
    Value::Object(meta)
}

fn first_of(map: &Map<String, Value>, keys: &[&str]) -> Value {
    keys.iter()
        .find_map(|key| map.get(*key).filter(|value| !value.is_null()))
        .cloned()
        .unwrap_or(Value::Null)
}
