//! Landing page parsing.

use crate::link::{find_rel, links_from_value, rel, Link};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The parts of a landing page the navigator consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingPage {
    /// Service title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Service description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Links to the service's top-level resources.
    #[serde(default)]
    pub links: Vec<Link>,
}

impl LandingPage {
    /// Parse a landing page leniently. Missing fields default to empty.
    #[must_use]
    pub fn from_document(document: &Value) -> Self {
        let text = |key: &str| document.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            title: text("title"),
            description: text("description"),
            links: document.get("links").map(links_from_value).unwrap_or_default(),
        }
    }

    /// The `rel=conformance` link.
    #[must_use]
    pub fn conformance_link(&self) -> Option<&Link> {
        find_rel(&self.links, rel::CONFORMANCE)
    }

    /// The collections listing link, under any of its registered relations.
    #[must_use]
    pub fn collections_link(&self) -> Option<&Link> {
        [rel::COLLECTIONS, rel::DATA, rel::OGC_DATA]
            .into_iter()
            .find_map(|name| find_rel(&self.links, name))
    }
}
