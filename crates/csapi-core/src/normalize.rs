//! Response shape normalization.
//!
//! Servers implementing the same resource disagree on the envelope around a
//! list of entities. [`Envelope::detect`] is the single ordered discriminator
//! for those conventions; [`normalize`] turns any body into a [`NormalizedPage`].
//!
//! Priority (first match wins):
//!
//! 1. GeoJSON `FeatureCollection` (`features`, `links`)
//! 2. Bare JSON array
//! 3. `{ "items": [...], "links": [...] }`
//! 4. SensorThings `{ "value": [...] }`
//! 5. Anything else, reported as an empty page

use crate::link::{links_from_value, Link};
use crate::pagination;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope convention a response body uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Envelope {
    /// GeoJSON `FeatureCollection`
    FeatureCollection,
    /// Top-level JSON array
    BareArray,
    /// Object carrying an `items` array
    ItemsWrapped,
    /// SensorThings-style object carrying a `value` array
    SensorThings,
    /// No recognised convention
    Unrecognized,
}

impl Envelope {
    /// Determine which envelope convention `body` follows.
    #[must_use]
    pub fn detect(body: &Value) -> Self {
        if body.get("type").and_then(Value::as_str) == Some("FeatureCollection") {
            Self::FeatureCollection
        } else if body.is_array() {
            Self::BareArray
        } else if body.get("items").is_some_and(Value::is_array) {
            Self::ItemsWrapped
        } else if body.get("value").is_some_and(Value::is_array) {
            Self::SensorThings
        } else {
            Self::Unrecognized
        }
    }
}

/// Uniform view of a list response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPage {
    /// Entities in source order, untouched.
    pub items: Vec<Value>,
    /// Hypermedia links of the page itself.
    pub links: Vec<Link>,
}

impl NormalizedPage {
    /// Number of entities on the page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the page carries no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Identifiers of the entities that have one, in page order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.items.iter().filter_map(entity_id).collect()
    }

    /// The `rel=next` href, if the server advertised one.
    #[must_use]
    pub fn next_href(&self) -> Option<&str> {
        pagination::next_page_url(self)
    }
}

/// Normalize any response body into a [`NormalizedPage`].
///
/// Never fails: unrecognised shapes produce an empty page.
#[must_use]
pub fn normalize(body: &Value) -> NormalizedPage {
    let envelope = Envelope::detect(body);
    tracing::trace!(?envelope, "Normalizing response body");

    let array_at = |key: &str| {
        body.get(key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };
    let links = || body.get("links").map(links_from_value).unwrap_or_default();

    match envelope {
        Envelope::FeatureCollection => NormalizedPage {
            items: array_at("features"),
            links: links(),
        },
        Envelope::BareArray => NormalizedPage {
            items: body.as_array().cloned().unwrap_or_default(),
            links: Vec::new(),
        },
        Envelope::ItemsWrapped => NormalizedPage {
            items: array_at("items"),
            links: links(),
        },
        Envelope::SensorThings => NormalizedPage {
            items: array_at("value"),
            links: Vec::new(),
        },
        Envelope::Unrecognized => NormalizedPage::default(),
    }
}

/// Locate an entity's identifier.
///
/// Looks at the top-level `id` first and falls back to `properties.id`.
/// Numeric identifiers are rendered as strings.
#[must_use]
pub fn entity_id(entity: &Value) -> Option<String> {
    let render = |value: &Value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };

    entity
        .get("id")
        .and_then(render)
        .or_else(|| entity.get("properties")?.get("id").and_then(render))
}
