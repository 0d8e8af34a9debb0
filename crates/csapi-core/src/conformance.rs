//! Conformance class handling.
//!
//! A server's conformance document is advisory: navigation keeps working when it
//! is missing or unreadable, so parsing never fails and degrades to an empty set.

use serde_json::Value;
use std::collections::BTreeSet;

/// Keyword substrings identifying the Connected Systems family of conformance URIs.
pub const CONNECTED_SYSTEMS_KEYWORDS: &[&str] = &["connected-systems", "sensorthings"];

/// Well-known OGC API - Connected Systems conformance class URIs.
pub mod uris {
    /// Part 1 core
    pub const CORE: &str = "http://www.opengis.net/spec/ogcapi-connected-systems-1/1.0/conf/core";
    /// Part 1 system features
    pub const SYSTEM_FEATURES: &str =
        "http://www.opengis.net/spec/ogcapi-connected-systems-1/1.0/conf/system-features";
    /// Part 1 subsystems
    pub const SUBSYSTEMS: &str =
        "http://www.opengis.net/spec/ogcapi-connected-systems-1/1.0/conf/subsystem";
    /// Part 1 deployment features
    pub const DEPLOYMENT_FEATURES: &str =
        "http://www.opengis.net/spec/ogcapi-connected-systems-1/1.0/conf/deployment-features";
    /// Part 1 procedure features
    pub const PROCEDURE_FEATURES: &str =
        "http://www.opengis.net/spec/ogcapi-connected-systems-1/1.0/conf/procedure-features";
    /// Part 1 sampling features
    pub const SAMPLING_FEATURES: &str =
        "http://www.opengis.net/spec/ogcapi-connected-systems-1/1.0/conf/sf";
    /// Part 1 property definitions
    pub const PROPERTY_DEFINITIONS: &str =
        "http://www.opengis.net/spec/ogcapi-connected-systems-1/1.0/conf/property-definitions";
    /// Part 1 GeoJSON encoding
    pub const GEOJSON: &str =
        "http://www.opengis.net/spec/ogcapi-connected-systems-1/1.0/conf/geojson";
    /// Part 1 SensorML encoding
    pub const SENSORML: &str =
        "http://www.opengis.net/spec/ogcapi-connected-systems-1/1.0/conf/sensorml";
    /// Part 2 datastreams and observations
    pub const DATASTREAMS: &str =
        "http://www.opengis.net/spec/ogcapi-connected-systems-2/1.0/conf/datastream";
    /// Part 2 control streams and commands
    pub const CONTROL_STREAMS: &str =
        "http://www.opengis.net/spec/ogcapi-connected-systems-2/1.0/conf/controlstream";
    /// Part 2 SWE Common JSON encoding
    pub const SWE_COMMON_JSON: &str =
        "http://www.opengis.net/spec/ogcapi-connected-systems-2/1.0/conf/swecommon-json";
}

/// Set of conformance class URIs a server declares.
///
/// Membership ignores ASCII case and trailing slashes. Insertion order of the
/// original URIs is kept for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConformanceSet {
    keys: BTreeSet<String>,
    uris: Vec<String>,
}

fn canonical(uri: &str) -> String {
    uri.trim().trim_end_matches('/').to_ascii_lowercase()
}

impl ConformanceSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a conformance document (`{ "conformsTo": [...] }`).
    ///
    /// Missing or malformed `conformsTo` yields an empty set; non-string entries
    /// are skipped.
    #[must_use]
    pub fn from_document(document: &Value) -> Self {
        document
            .get("conformsTo")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether `uri` is declared.
    #[must_use]
    pub fn contains(&self, uri: &str) -> bool {
        self.keys.contains(&canonical(uri))
    }

    /// Whether any declared URI contains any of the keyword substrings
    /// (case-insensitive).
    #[must_use]
    pub fn matches_any(&self, keywords: &[&str]) -> bool {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_ascii_lowercase()).collect();
        self.keys
            .iter()
            .any(|key| keywords.iter().any(|keyword| key.contains(keyword.as_str())))
    }

    /// Declared URIs that contain any of the keyword substrings.
    #[must_use]
    pub fn filter(&self, keywords: &[&str]) -> Vec<&str> {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_ascii_lowercase()).collect();
        self.uris
            .iter()
            .filter(|uri| {
                let key = canonical(uri);
                keywords.iter().any(|keyword| key.contains(keyword.as_str()))
            })
            .map(String::as_str)
            .collect()
    }

    /// Whether the server declares any Connected Systems conformance class.
    #[must_use]
    pub fn is_connected_systems(&self) -> bool {
        self.matches_any(CONNECTED_SYSTEMS_KEYWORDS)
    }

    /// Declared URIs in document order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.uris.iter().map(String::as_str)
    }

    /// Number of distinct declared URIs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.uris.len()
    }

    /// Whether nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ConformanceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::default();
        for uri in iter {
            let uri = uri.as_ref();
            if set.keys.insert(canonical(uri)) {
                set.uris.push(uri.to_string());
            }
        }
        set
    }
}
