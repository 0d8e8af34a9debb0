//! Hypermedia link model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Relation names the navigator understands.
///
/// Compared case-sensitively, as served.
pub mod rel {
    /// Landing page link to the conformance document.
    pub const CONFORMANCE: &str = "conformance";
    /// Landing page link to the collections listing.
    pub const COLLECTIONS: &str = "collections";
    /// Landing page link to the collections listing (short OGC form).
    pub const DATA: &str = "data";
    /// Landing page link to the collections listing (OGC relation URI).
    pub const OGC_DATA: &str = "http://www.opengis.net/def/rel/ogc/1.0/data";
    /// Systems resource.
    pub const SYSTEMS: &str = "systems";
    /// Datastreams resource.
    pub const DATASTREAMS: &str = "datastreams";
    /// Observations resource.
    pub const OBSERVATIONS: &str = "observations";
    /// Next page of a paginated response.
    pub const NEXT: &str = "next";
    /// The document itself.
    pub const SELF: &str = "self";
}

/// A hyperlink to a related resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The URI of the linked resource. May be relative to the document it came from.
    pub href: String,

    /// The relationship type (e.g., "self", "next", "systems").
    #[serde(default)]
    pub rel: String,

    /// The media type of the linked resource.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// A human-readable title for the link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    /// Create a new link with required fields.
    pub fn new(href: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            type_: None,
            title: None,
        }
    }

    /// Set the media type.
    #[must_use]
    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Parse a single link, returning `None` unless the value is an object with a
    /// string `href`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let href = obj.get("href")?.as_str()?;
        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            href: href.to_string(),
            rel: text("rel").unwrap_or_default(),
            type_: text("type"),
            title: text("title"),
        })
    }
}

/// Parse a JSON array of links, silently dropping malformed entries.
///
/// Anything other than an array yields an empty list.
#[must_use]
pub fn links_from_value(value: &Value) -> Vec<Link> {
    value
        .as_array()
        .map(|arr| arr.iter().filter_map(Link::from_value).collect())
        .unwrap_or_default()
}

/// Find the first link with the given relation.
#[must_use]
pub fn find_rel<'a>(links: &'a [Link], rel: &str) -> Option<&'a Link> {
    links.iter().find(|link| link.rel == rel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_full_link() {
        let link = Link::from_value(&json!({
            "href": "/conformance",
            "rel": "conformance",
            "type": "application/json",
            "title": "Conformance classes"
        }))
        .unwrap();

        assert_eq!(link.href, "/conformance");
        assert_eq!(link.rel, "conformance");
        assert_eq!(link.type_.as_deref(), Some("application/json"));
        assert_eq!(link.title.as_deref(), Some("Conformance classes"));
    }

    #[test]
    fn missing_rel_parses_as_empty() {
        let link = Link::from_value(&json!({"href": "http://example.org"})).unwrap();
        assert_eq!(link.rel, "");
        assert!(link.type_.is_none());
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let links = links_from_value(&json!([
            {"href": "/a", "rel": "self"},
            {"rel": "next"},
            {"href": 42, "rel": "next"},
            "not-a-link",
            null,
            {"href": "/b", "rel": "next"}
        ]));

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "/a");
        assert_eq!(links[1].href, "/b");
    }

    #[test]
    fn non_array_yields_no_links() {
        assert!(links_from_value(&json!({"href": "/a"})).is_empty());
        assert!(links_from_value(&Value::Null).is_empty());
    }

    #[test]
    fn find_rel_is_case_sensitive() {
        let links = vec![
            Link::new("/upper", "Systems"),
            Link::new("/lower", "systems"),
        ];
        assert_eq!(find_rel(&links, rel::SYSTEMS).unwrap().href, "/lower");
        assert!(find_rel(&links, rel::NEXT).is_none());
    }

    #[test]
    fn serialize_skips_absent_fields() {
        let value = serde_json::to_value(Link::new("/x", "self").with_type("application/json"))
            .unwrap();
        assert_eq!(
            value,
            json!({"href": "/x", "rel": "self", "type": "application/json"})
        );
    }
}
