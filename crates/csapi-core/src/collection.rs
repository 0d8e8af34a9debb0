//! Collection descriptors as advertised by a server's `/collections` listing.

use crate::link::{links_from_value, Link};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// CRS assumed when a collection advertises none (OGC API default).
pub const DEFAULT_CRS: &str = "http://www.opengis.net/def/crs/OGC/1.3/CRS84";

/// A named, independently discoverable group of resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    /// Collection identifier, unique on the server.
    pub id: String,

    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Links advertised by the collection.
    #[serde(default)]
    pub links: Vec<Link>,

    /// Coordinate reference systems the collection can serve.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crs: Vec<String>,
}

impl CollectionDescriptor {
    /// Create a descriptor with just an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            links: Vec::new(),
            crs: Vec::new(),
        }
    }

    /// Add a link (builder pattern).
    #[must_use]
    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    /// Set the title (builder pattern).
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Parse one descriptor leniently.
    ///
    /// Requires a string (or numeric) `id`; every other field falls back to its
    /// default when missing or malformed.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = match obj.get("id")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            id,
            title: text("title"),
            description: text("description"),
            links: obj.get("links").map(links_from_value).unwrap_or_default(),
            crs: obj
                .get("crs")
                .and_then(Value::as_array)
                .map(|list| {
                    list.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Display name: the title when present, otherwise the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// Parse a collections document (`{ "collections": [...] }`).
///
/// Malformed documents yield an empty list and malformed entries are skipped.
#[must_use]
pub fn parse_collections(document: &Value) -> Vec<CollectionDescriptor> {
    let Some(entries) = document.get("collections").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let parsed = CollectionDescriptor::from_value(entry);
            if parsed.is_none() {
                tracing::warn!(%entry, "Skipping collection without an id");
            }
            parsed
        })
        .collect()
}
