//! Navigator: URL factory for one capability-negotiated collection.
//!
//! The navigator is a pure formatter. It never fetches, never validates query
//! values and never checks its own advisory capability set before building a
//! URL. Every URL it returns is an absolute URL made of the base URL, a fixed
//! relative path, percent-encoded identifiers and form-encoded query pairs.

use crate::encoding::encode_path_segment;
use crate::format::FormatTag;
use crate::negotiate::NavigatorCapabilities;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use url::Url;

/// Resource kinds a navigator can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    /// `/systems`
    Systems,
    /// `/datastreams`
    Datastreams,
    /// `/observations`
    Observations,
    /// `/systems/{id}/datastreams`
    SystemDatastreams,
    /// `/datastreams/{id}/observations`
    DatastreamObservations,
}

impl ResourceKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Systems,
        Self::Datastreams,
        Self::Observations,
        Self::SystemDatastreams,
        Self::DatastreamObservations,
    ];

    /// Top-level kinds assumed when capability is inferred rather than declared.
    pub const DEFAULT_SET: [Self; 3] = [Self::Systems, Self::Datastreams, Self::Observations];

    /// Map a link relation to the top-level kind it declares.
    #[must_use]
    pub fn from_rel(rel: &str) -> Option<Self> {
        match rel {
            "systems" => Some(Self::Systems),
            "datastreams" => Some(Self::Datastreams),
            "observations" => Some(Self::Observations),
            _ => None,
        }
    }

    /// Canonical camelCase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Systems => "systems",
            Self::Datastreams => "datastreams",
            Self::Observations => "observations",
            Self::SystemDatastreams => "systemDatastreams",
            Self::DatastreamObservations => "datastreamObservations",
        }
    }

    /// Parent and child top-level kinds of a sub-resource kind.
    #[must_use]
    pub fn parts(self) -> Option<(Self, Self)> {
        match self {
            Self::SystemDatastreams => Some((Self::Systems, Self::Datastreams)),
            Self::DatastreamObservations => Some((Self::Datastreams, Self::Observations)),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query options that know how to render themselves as ordered query pairs.
pub trait QueryParams {
    /// Pairs to append, in order. Unset options must not appear.
    fn query_pairs(&self) -> Vec<(&'static str, String)>;
}

/// Options for `/systems`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemsQuery {
    /// Maximum number of items per page
    pub limit: Option<u32>,
    /// Bounding box, joined with commas in the given order
    pub bbox: Option<Vec<f64>>,
    /// Full-text search
    pub q: Option<String>,
    /// Parent system id
    pub parent: Option<String>,
}

impl SystemsQuery {
    /// Empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `limit`.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set `bbox`.
    #[must_use]
    pub fn bbox(mut self, bbox: impl Into<Vec<f64>>) -> Self {
        self.bbox = Some(bbox.into());
        self
    }

    /// Set `q`.
    #[must_use]
    pub fn q(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    /// Set `parent`.
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

impl QueryParams for SystemsQuery {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(bbox) = &self.bbox {
            let joined = bbox
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("bbox", joined));
        }
        if let Some(q) = &self.q {
            pairs.push(("q", q.clone()));
        }
        if let Some(parent) = &self.parent {
            pairs.push(("parent", parent.clone()));
        }
        pairs
    }
}

/// Options for `/datastreams`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatastreamsQuery {
    /// Maximum number of items per page
    pub limit: Option<u32>,
    /// Observed property URI or id
    pub observed_property: Option<String>,
}

impl DatastreamsQuery {
    /// Empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `limit`.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set `observedProperty`.
    #[must_use]
    pub fn observed_property(mut self, property: impl Into<String>) -> Self {
        self.observed_property = Some(property.into());
        self
    }
}

impl QueryParams for DatastreamsQuery {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(property) = &self.observed_property {
            pairs.push(("observedProperty", property.clone()));
        }
        pairs
    }
}

/// Options for `/observations` and `/datastreams/{id}/observations`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationsQuery {
    /// Maximum number of items per page
    pub limit: Option<u32>,
    /// ISO 8601 instant or interval, passed through verbatim
    pub datetime: Option<String>,
}

impl ObservationsQuery {
    /// Empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `limit`.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set `datetime`.
    #[must_use]
    pub fn datetime(mut self, datetime: impl Into<String>) -> Self {
        self.datetime = Some(datetime.into());
        self
    }
}

impl QueryParams for ObservationsQuery {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(datetime) = &self.datetime {
            pairs.push(("datetime", datetime.clone()));
        }
        pairs
    }
}

/// Options for `/systems/{id}/datastreams`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimitQuery {
    /// Maximum number of items per page
    pub limit: Option<u32>,
}

impl LimitQuery {
    /// Query with a limit.
    #[must_use]
    pub fn limit(limit: u32) -> Self {
        Self { limit: Some(limit) }
    }
}

impl QueryParams for LimitQuery {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.limit
            .map(|limit| vec![("limit", limit.to_string())])
            .unwrap_or_default()
    }
}

/// URL factory scoped to one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    base_url: Url,
    capabilities: NavigatorCapabilities,
}

impl Navigator {
    /// Create a navigator rooted at `base_url`.
    ///
    /// Any query string or fragment on the base is dropped and a trailing slash
    /// is ignored.
    ///
    /// # Errors
    ///
    /// Returns error if `base_url` is not an absolute hierarchical URL.
    pub fn new(base_url: &str, capabilities: NavigatorCapabilities) -> Result<Self, NavigatorError> {
        let url = Url::parse(base_url)
            .map_err(|e| NavigatorError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        Self::from_url(url, capabilities)
    }

    /// Create a navigator from an already parsed base URL.
    ///
    /// # Errors
    ///
    /// Returns error if `base_url` cannot carry path segments (e.g. `mailto:`).
    pub fn from_url(
        mut base_url: Url,
        capabilities: NavigatorCapabilities,
    ) -> Result<Self, NavigatorError> {
        if base_url.cannot_be_a_base() {
            return Err(NavigatorError::InvalidBaseUrl(format!(
                "{base_url}: not a hierarchical URL"
            )));
        }

        base_url.set_query(None);
        base_url.set_fragment(None);
        let trimmed = base_url.path().trim_end_matches('/').to_string();
        base_url.set_path(&trimmed);

        tracing::debug!(
            base_url = %base_url,
            resources = ?capabilities.available_resources,
            "Navigator created"
        );

        Ok(Self {
            base_url,
            capabilities,
        })
    }

    /// The collection base URL every resource path is joined to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The frozen capability state discovered at construction.
    #[must_use]
    pub fn capabilities(&self) -> &NavigatorCapabilities {
        &self.capabilities
    }

    /// Resource kinds the collection advertised.
    #[must_use]
    pub fn available_resources(&self) -> &BTreeSet<ResourceKind> {
        &self.capabilities.available_resources
    }

    /// Formats the collection advertised.
    #[must_use]
    pub fn supported_formats(&self) -> &BTreeSet<FormatTag> {
        &self.capabilities.supported_formats
    }

    /// Coordinate reference systems the collection advertised.
    #[must_use]
    pub fn supported_crs(&self) -> &[String] {
        &self.capabilities.supported_crs
    }

    /// Advisory check against the discovered resources.
    ///
    /// A sub-resource kind counts as supported when it was advertised itself or
    /// when both its parent and child kinds were.
    #[must_use]
    pub fn supports(&self, kind: ResourceKind) -> bool {
        let available = &self.capabilities.available_resources;
        available.contains(&kind)
            || kind
                .parts()
                .is_some_and(|(parent, child)| available.contains(&parent) && available.contains(&child))
    }

    /// `{base}/systems`
    #[must_use]
    pub fn systems_url(&self, query: &SystemsQuery) -> Url {
        self.build(&["systems"], query)
    }

    /// `{base}/systems/{id}`
    #[must_use]
    pub fn system_url(&self, id: &str) -> Url {
        self.build(&["systems", encode_path_segment(id).as_str()], &LimitQuery::default())
    }

    /// `{base}/systems/{id}/datastreams`
    #[must_use]
    pub fn system_datastreams_url(&self, system_id: &str, query: &LimitQuery) -> Url {
        self.build(
            &["systems", encode_path_segment(system_id).as_str(), "datastreams"],
            query,
        )
    }

    /// `{base}/datastreams`
    #[must_use]
    pub fn datastreams_url(&self, query: &DatastreamsQuery) -> Url {
        self.build(&["datastreams"], query)
    }

    /// `{base}/datastreams/{id}`
    #[must_use]
    pub fn datastream_url(&self, id: &str) -> Url {
        self.build(
            &["datastreams", encode_path_segment(id).as_str()],
            &LimitQuery::default(),
        )
    }

    /// `{base}/datastreams/{id}/observations`
    #[must_use]
    pub fn datastream_observations_url(&self, datastream_id: &str, query: &ObservationsQuery) -> Url {
        self.build(
            &["datastreams", encode_path_segment(datastream_id).as_str(), "observations"],
            query,
        )
    }

    /// `{base}/observations`
    #[must_use]
    pub fn observations_url(&self, query: &ObservationsQuery) -> Url {
        self.build(&["observations"], query)
    }

    /// Join pre-encoded segments to the base and append the query pairs.
    fn build(&self, segments: &[&str], query: &impl QueryParams) -> Url {
        let mut url = self.base_url.clone();

        let mut path = self.base_url.path().trim_end_matches('/').to_string();
        for segment in segments {
            path.push('/');
            path.push_str(segment);
        }
        url.set_path(&path);

        let pairs = query.query_pairs();
        if !pairs.is_empty() {
            let mut serializer = url.query_pairs_mut();
            for (key, value) in &pairs {
                serializer.append_pair(key, value);
            }
        }

        url
    }
}

/// Errors that can occur creating a navigator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigatorError {
    /// Base URL is not an absolute hierarchical URL
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}
