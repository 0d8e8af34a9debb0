//! # CSAPI Core
//!
//! Network-free discovery and navigation engine for OGC API - Connected Systems.
//!
//! This crate provides:
//! - The hypermedia [`Link`] model shared by every document a server returns
//! - Lenient [`LandingPage`] and [`CollectionDescriptor`] parsing
//! - A content-type driven [`FormatTag`] classifier
//! - A response normalizer that reduces every known envelope to a [`NormalizedPage`]
//! - The [`ConformanceSet`] and the two-tier capability [`negotiate`] table
//! - The [`Navigator`] URL factory and the `rel=next` pagination decision
//!
//! Everything here operates on already-fetched JSON; network I/O lives in the
//! client crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod conformance;
pub mod encoding;
pub mod format;
pub mod landing;
pub mod link;
pub mod navigator;
pub mod negotiate;
pub mod normalize;
pub mod pagination;

pub use collection::{parse_collections, CollectionDescriptor, DEFAULT_CRS};
pub use conformance::{ConformanceSet, CONNECTED_SYSTEMS_KEYWORDS};
pub use encoding::encode_path_segment;
pub use format::{classify, FormatTag};
pub use landing::LandingPage;
pub use link::{find_rel, links_from_value, Link};
pub use navigator::{
    DatastreamsQuery, LimitQuery, Navigator, NavigatorError, ObservationsQuery, QueryParams,
    ResourceKind, SystemsQuery,
};
pub use negotiate::{negotiate, NavigatorCapabilities, Negotiation, Tier};
pub use normalize::{entity_id, normalize, Envelope, NormalizedPage};
pub use pagination::next_page_url;
