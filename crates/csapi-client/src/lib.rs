//! # CSAPI Client
//!
//! Async discovery and fetching on top of `csapi-core`.
//!
//! ## Flow
//!
//! 1. [`Endpoint`] fetches the landing page lazily and resolves conformance
//! 2. The collections listing is cached and probed sequentially
//! 3. The first collection that negotiates yields a [`csapi_core::Navigator`]
//! 4. Navigator URLs are fetched through the endpoint and normalized into pages
//! 5. [`PageWalker`] follows `rel=next` one page at a time
//!
//! Network I/O goes through the [`Transport`] trait. Request headers such as
//! credentials travel in an explicit [`FetchOptions`] value owned by the
//! endpoint; nothing here keeps process-wide state.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod endpoint;
pub mod error;
pub mod options;
pub mod resolver;
pub mod transport;
pub mod walker;

pub use endpoint::{Endpoint, FetchedPage};
pub use error::ClientError;
pub use options::FetchOptions;
pub use resolver::resolve_conformance;
pub use transport::{
    FetchResponse, HttpTransport, HttpTransportConfig, MemoryTransport, RecordedRequest, Transport,
    TransportError,
};
pub use walker::PageWalker;
