//! Capability negotiation for a single collection.
//!
//! Real servers signal Connected Systems support in different ways: some
//! declare sub-resource links on the collection, others only advertise the
//! capability at service level. Negotiation runs an ordered decision table of
//! increasingly loose tiers and stops at the first one that fires. A collection
//! with no signal at all is never supported.

use crate::collection::{CollectionDescriptor, DEFAULT_CRS};
use crate::conformance::{ConformanceSet, CONNECTED_SYSTEMS_KEYWORDS};
use crate::format::FormatTag;
use crate::navigator::ResourceKind;
use serde::Serialize;
use std::collections::BTreeSet;

/// Substrings in a collection id that suggest sensor/system content.
pub const SENSOR_HINTS: &[&str] = &["sensor", "system"];

/// Capability state handed to a navigator at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigatorCapabilities {
    /// Resource kinds the collection exposes
    pub available_resources: BTreeSet<ResourceKind>,
    /// Formats advertised by the collection's links
    pub supported_formats: BTreeSet<FormatTag>,
    /// Coordinate reference systems advertised by the collection
    pub supported_crs: Vec<String>,
}

impl NavigatorCapabilities {
    /// Capabilities with only a resource set.
    pub fn with_resources(resources: impl IntoIterator<Item = ResourceKind>) -> Self {
        Self {
            available_resources: resources.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Build the full capability record for `collection` from a resource set.
    ///
    /// Formats come from classifying every link `type`; CRS falls back to
    /// [`DEFAULT_CRS`] when the collection lists none.
    #[must_use]
    pub fn for_collection(
        collection: &CollectionDescriptor,
        resources: BTreeSet<ResourceKind>,
    ) -> Self {
        let supported_formats = collection
            .links
            .iter()
            .filter_map(|link| link.type_.as_deref())
            .map(FormatTag::from_content_type)
            .filter(|tag| *tag != FormatTag::Unknown)
            .collect();

        let supported_crs = if collection.crs.is_empty() {
            vec![DEFAULT_CRS.to_string()]
        } else {
            collection.crs.clone()
        };

        Self {
            available_resources: resources,
            supported_formats,
            supported_crs,
        }
    }
}

/// Which decision tier accepted a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Tier {
    /// The collection declared `systems`/`datastreams`/`observations` links
    DeclaredLinks,
    /// Service-level conformance plus a textual hint on the collection
    ConformanceKeyword,
}

/// Outcome of negotiating one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Negotiation {
    /// The collection exposes the Connected Systems resource model
    Supported {
        /// Discovered capability state
        capabilities: NavigatorCapabilities,
        /// Tier that accepted the collection
        tier: Tier,
    },
    /// No tier fired; try the next collection
    NotSupported,
}

impl Negotiation {
    /// Whether the collection was accepted.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported { .. })
    }

    /// Capabilities when supported.
    #[must_use]
    pub fn into_capabilities(self) -> Option<NavigatorCapabilities> {
        match self {
            Self::Supported { capabilities, .. } => Some(capabilities),
            Self::NotSupported => None,
        }
    }
}

type Rule = fn(&CollectionDescriptor, &ConformanceSet) -> Option<BTreeSet<ResourceKind>>;

/// Decision table, evaluated in order.
const RULES: [(Tier, Rule); 2] = [
    (Tier::DeclaredLinks, declared_rule),
    (Tier::ConformanceKeyword, keyword_fallback),
];

fn declared_rule(
    collection: &CollectionDescriptor,
    _conformance: &ConformanceSet,
) -> Option<BTreeSet<ResourceKind>> {
    declared_resources(collection)
}

/// Tier 1: resource kinds declared through the collection's own link relations.
///
/// Returns exactly the kinds whose rel is present, or `None` when there are none.
#[must_use]
pub fn declared_resources(collection: &CollectionDescriptor) -> Option<BTreeSet<ResourceKind>> {
    let declared: BTreeSet<ResourceKind> = collection
        .links
        .iter()
        .filter_map(|link| ResourceKind::from_rel(&link.rel))
        .collect();

    (!declared.is_empty()).then_some(declared)
}

/// Tier 2: service-level Connected Systems conformance corroborated by the
/// collection itself.
///
/// Corroboration is either a collection id mentioning sensors or systems, or
/// a link whose path has a `systems` segment. Only the id is searched for
/// substrings: link hrefs carry the server's own mount path (for example
/// `/sensorhub/api`), which says nothing about the collection.
///
/// Deliberately fuzzy: a coincidentally named collection on a Connected
/// Systems server will be accepted.
#[must_use]
pub fn keyword_fallback(
    collection: &CollectionDescriptor,
    conformance: &ConformanceSet,
) -> Option<BTreeSet<ResourceKind>> {
    if !conformance.matches_any(CONNECTED_SYSTEMS_KEYWORDS) {
        return None;
    }

    let id = collection.id.to_lowercase();
    let corroborated = SENSOR_HINTS.iter().any(|hint| id.contains(hint))
        || collection.links.iter().any(|link| has_systems_segment(&link.href));

    corroborated.then(|| ResourceKind::DEFAULT_SET.into_iter().collect())
}

/// Whether the path of `href` has a `systems` segment (case-insensitive).
fn has_systems_segment(href: &str) -> bool {
    let without_query = href.split(['?', '#']).next().unwrap_or_default();
    let path = match without_query.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |start| &rest[start..]),
        None => without_query,
    };
    path.split('/')
        .any(|segment| segment.eq_ignore_ascii_case(ResourceKind::Systems.as_str()))
}

/// Decide whether `collection` exposes the Connected Systems resource model.
#[must_use]
pub fn negotiate(collection: &CollectionDescriptor, conformance: &ConformanceSet) -> Negotiation {
    for (tier, rule) in RULES {
        if let Some(resources) = rule(collection, conformance) {
            tracing::debug!(
                collection = %collection.id,
                ?tier,
                ?resources,
                "Collection negotiated"
            );
            return Negotiation::Supported {
                capabilities: NavigatorCapabilities::for_collection(collection, resources),
                tier,
            };
        }
    }

    tracing::debug!(collection = %collection.id, "Collection not supported");
    Negotiation::NotSupported
}
