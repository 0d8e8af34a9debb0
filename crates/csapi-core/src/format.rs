//! Content-type driven format classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Media types commonly served by Connected Systems servers.
pub mod media_types {
    /// GeoJSON media type
    pub const GEO_JSON: &str = "application/geo+json";
    /// SensorML JSON encoding
    pub const SML_JSON: &str = "application/sml+json";
    /// SWE Common JSON encoding
    pub const SWE_JSON: &str = "application/swe+json";
    /// Plain JSON media type
    pub const JSON: &str = "application/json";
}

/// Semantic format of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    /// GeoJSON features
    GeoJson,
    /// SensorML descriptions
    SensorMl,
    /// SWE Common encodings
    Swe,
    /// JSON with no more specific profile
    Json,
    /// Missing or unrecognised content type
    Unknown,
}

/// Priority table; the first row with a matching needle wins.
const RULES: &[(&[&str], FormatTag)] = &[
    (&["geo+json"], FormatTag::GeoJson),
    (&["sensorml", "sml+json", "sml+xml"], FormatTag::SensorMl),
    (&["swe+json", "swe+xml"], FormatTag::Swe),
    (&["json"], FormatTag::Json),
];

impl FormatTag {
    /// Classify a `Content-Type` header value.
    ///
    /// Matching is a case-insensitive substring test, so parameters such as
    /// `; charset=utf-8` do not interfere.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Self {
        let lowered = content_type.to_ascii_lowercase();
        RULES
            .iter()
            .find(|(needles, _)| needles.iter().any(|needle| lowered.contains(needle)))
            .map_or(Self::Unknown, |(_, tag)| *tag)
    }

    /// Lowercase tag name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GeoJson => "geojson",
            Self::SensorMl => "sensorml",
            Self::Swe => "swe",
            Self::Json => "json",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an optional `Content-Type` header. A missing header is `Unknown`.
#[must_use]
pub fn classify(content_type: Option<&str>) -> FormatTag {
    content_type.map_or(FormatTag::Unknown, FormatTag::from_content_type)
}
