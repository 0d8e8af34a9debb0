//! Top-level discovery orchestration for one server.

use crate::error::ClientError;
use crate::options::FetchOptions;
use crate::resolver::{resolve_conformance, resolve_href};
use crate::transport::{FetchResponse, HttpTransport, HttpTransportConfig, Transport};
use crate::walker::PageWalker;
use csapi_core::{
    encode_path_segment, negotiate, next_page_url, normalize, parse_collections,
    CollectionDescriptor, ConformanceSet, Envelope, FormatTag, LandingPage, Navigator, Negotiation,
    NormalizedPage,
};
use serde_json::Value;
use tokio::sync::OnceCell;
use url::Url;

/// Statuses that mean "not available here" rather than failure.
const ADVISORY_STATUSES: [u16; 2] = [404, 501];

/// One fetched and normalized resource page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// URL the page was fetched from
    pub url: Url,
    /// HTTP status
    pub status: u16,
    /// Format of the body according to its content type
    pub format: FormatTag,
    /// Envelope convention the server used
    pub envelope: Envelope,
    /// Uniform view of the body
    pub page: NormalizedPage,
}

impl FetchedPage {
    /// The `rel=next` link resolved against this page's URL.
    #[must_use]
    pub fn next_url(&self) -> Option<Url> {
        let href = next_page_url(&self.page)?;
        match self.url.join(href) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(href, error = %e, "Ignoring unusable next link");
                None
            }
        }
    }

    /// Whether the server reported the resource as absent (404/501).
    #[must_use]
    pub fn is_absent(&self) -> bool {
        ADVISORY_STATUSES.contains(&self.status)
    }
}

/// A Connected Systems server.
///
/// The landing page, conformance set and collections listing are each fetched
/// at most once and cached for the endpoint's lifetime.
pub struct Endpoint<T = HttpTransport> {
    api_url: Url,
    transport: T,
    options: FetchOptions,
    landing: OnceCell<LandingPage>,
    conformance: OnceCell<ConformanceSet>,
    collections: OnceCell<Vec<CollectionDescriptor>>,
}

impl Endpoint<HttpTransport> {
    /// Create an endpoint backed by reqwest.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid or the HTTP client cannot be built.
    pub fn connect(api_url: &str, config: &HttpTransportConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(config).map_err(|source| ClientError::Transport {
            url: api_url.to_string(),
            source,
        })?;
        Self::new(api_url, transport)
    }
}

impl<T: Transport> Endpoint<T> {
    /// Create an endpoint for the API rooted at `api_url`.
    ///
    /// Nothing is fetched until a discovery method is called.
    ///
    /// # Errors
    ///
    /// Returns error if `api_url` is not an absolute hierarchical URL.
    pub fn new(api_url: &str, transport: T) -> Result<Self, ClientError> {
        let mut url =
            Url::parse(api_url).map_err(|e| ClientError::InvalidUrl(format!("{api_url}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!(
                "{api_url}: not a hierarchical URL"
            )));
        }
        url.set_query(None);
        url.set_fragment(None);
        let trimmed = url.path().trim_end_matches('/').to_string();
        url.set_path(&trimmed);

        Ok(Self {
            api_url: url,
            transport,
            options: FetchOptions::default(),
            landing: OnceCell::new(),
            conformance: OnceCell::new(),
            collections: OnceCell::new(),
        })
    }

    /// Replace the fetch options (builder pattern).
    #[must_use]
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Start a session with new fetch options.
    pub fn set_fetch_options(&mut self, options: FetchOptions) {
        tracing::debug!(?options, "Fetch options set");
        self.options = options;
    }

    /// End a session: return to the default options.
    pub fn reset_fetch_options(&mut self) {
        self.options = FetchOptions::default();
    }

    /// The active fetch options.
    #[must_use]
    pub fn fetch_options(&self) -> &FetchOptions {
        &self.options
    }

    /// The API root.
    #[must_use]
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `url` with the active options.
    ///
    /// # Errors
    ///
    /// Returns error when the transport fails. Statuses are not checked.
    pub async fn get(&self, url: &Url) -> Result<FetchResponse, ClientError> {
        tracing::debug!(%url, "GET");
        self.transport
            .fetch_json(url, self.options.headers())
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })
    }

    /// The landing page.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or a non-2xx status.
    pub async fn info(&self) -> Result<&LandingPage, ClientError> {
        self.landing
            .get_or_try_init(|| async {
                let response = self.get(&self.api_url).await?;
                let response = require_success(&self.api_url, response)?;
                let landing = LandingPage::from_document(&response.body);
                tracing::debug!(
                    url = %self.api_url,
                    title = landing.title.as_deref().unwrap_or(""),
                    links = landing.links.len(),
                    "Landing page loaded"
                );
                Ok::<_, ClientError>(landing)
            })
            .await
    }

    /// The conformance set advertised by the landing page.
    ///
    /// # Errors
    ///
    /// Returns error only when the landing page itself cannot be fetched.
    pub async fn conformance(&self) -> Result<&ConformanceSet, ClientError> {
        self.conformance
            .get_or_try_init(|| async {
                let landing = self.info().await?;
                Ok::<_, ClientError>(resolve_conformance(
                    &self.transport,
                    &self.options,
                    &self.api_url,
                    &landing.links,
                )
                .await)
            })
            .await
    }

    /// URL of the collections listing.
    ///
    /// Falls back to `{api}/collections` when the landing page has no link.
    ///
    /// # Errors
    ///
    /// Returns error if the landing page cannot be fetched.
    pub async fn collections_url(&self) -> Result<Url, ClientError> {
        let landing = self.info().await?;
        match landing.collections_link() {
            Some(link) => resolve_href(&self.api_url, &link.href)
                .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", link.href))),
            None => Ok(self.api_path(&["collections"])),
        }
    }

    /// The collections listing.
    ///
    /// A 404/501 listing is treated as no collections.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or another non-2xx status.
    pub async fn collections(&self) -> Result<&[CollectionDescriptor], ClientError> {
        let collections = self
            .collections
            .get_or_try_init(|| async {
                let url = self.collections_url().await?;
                let response = self.get(&url).await?;
                if ADVISORY_STATUSES.contains(&response.status) {
                    tracing::debug!(%url, status = response.status, "No collections listing");
                    return Ok(Vec::new());
                }
                let response = require_success(&url, response)?;
                let collections = parse_collections(&response.body);
                tracing::debug!(%url, count = collections.len(), "Collections loaded");
                Ok::<_, ClientError>(collections)
            })
            .await?;
        Ok(collections.as_slice())
    }

    /// `{api}/collections/{id}`
    #[must_use]
    pub fn collection_url(&self, id: &str) -> Url {
        self.api_path(&["collections", encode_path_segment(id).as_str()])
    }

    /// A collection from the cached listing.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::CollectionNotFound`] if no listed collection has `id`.
    pub async fn collection(&self, id: &str) -> Result<CollectionDescriptor, ClientError> {
        self.collections()
            .await?
            .iter()
            .find(|collection| collection.id == id)
            .cloned()
            .ok_or_else(|| ClientError::CollectionNotFound(id.to_string()))
    }

    /// Fetch the full descriptor from `{api}/collections/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::CollectionNotFound`] on 404/501, or error on any
    /// other failure.
    pub async fn describe_collection(&self, id: &str) -> Result<CollectionDescriptor, ClientError> {
        let url = self.collection_url(id);
        let response = self.get(&url).await?;
        if ADVISORY_STATUSES.contains(&response.status) {
            return Err(ClientError::CollectionNotFound(id.to_string()));
        }
        let response = require_success(&url, response)?;

        let mut descriptor = CollectionDescriptor::from_value(&response.body)
            .unwrap_or_else(|| CollectionDescriptor::new(id));
        descriptor.id = id.to_string();
        Ok(descriptor)
    }

    /// Negotiate one collection against the service conformance.
    ///
    /// A listed collection without links is described first, once.
    ///
    /// # Errors
    ///
    /// Returns error when the landing page or the collection description
    /// cannot be fetched.
    pub async fn negotiate_collection(
        &self,
        collection: &CollectionDescriptor,
    ) -> Result<Negotiation, ClientError> {
        let conformance = self.conformance().await?;

        if !collection.links.is_empty() {
            return Ok(negotiate(collection, conformance));
        }

        let described = match self.describe_collection(&collection.id).await {
            Ok(described) => described,
            Err(ClientError::CollectionNotFound(_)) => collection.clone(),
            Err(e) => return Err(e),
        };
        Ok(negotiate(&described, conformance))
    }

    /// Navigator for the listed collection `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::CollectionNotFound`] if `id` is not listed and
    /// [`ClientError::NotSupported`] if it does not negotiate.
    pub async fn navigator_for(&self, id: &str) -> Result<Navigator, ClientError> {
        let collection = self.collection(id).await?;
        let capabilities = self
            .negotiate_collection(&collection)
            .await?
            .into_capabilities()
            .ok_or_else(|| ClientError::NotSupported(id.to_string()))?;

        Navigator::from_url(self.collection_url(id), capabilities)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    /// Probe the listed collections in order and return the first that
    /// negotiates.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::CapabilityNotFound`] once every collection has
    /// been tried, or the first transport error met while probing.
    pub async fn find_navigator(&self) -> Result<(CollectionDescriptor, Navigator), ClientError> {
        let collections = self.collections().await?;

        for collection in collections {
            if let Some(capabilities) = self
                .negotiate_collection(collection)
                .await?
                .into_capabilities()
            {
                let navigator = Navigator::from_url(self.collection_url(&collection.id), capabilities)
                    .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
                tracing::debug!(collection = %collection.id, "Navigator found");
                return Ok((collection.clone(), navigator));
            }
        }

        Err(ClientError::CapabilityNotFound {
            tried: collections.len(),
        })
    }

    /// Fetch and normalize one resource page.
    ///
    /// A 404/501 answer yields an empty page.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or another non-2xx status.
    pub async fn fetch_page(&self, url: &Url) -> Result<FetchedPage, ClientError> {
        let response = self.get(url).await?;
        let format = response.format();

        if ADVISORY_STATUSES.contains(&response.status) {
            tracing::debug!(%url, status = response.status, "Resource not available");
            return Ok(FetchedPage {
                url: url.clone(),
                status: response.status,
                format,
                envelope: Envelope::Unrecognized,
                page: NormalizedPage::default(),
            });
        }

        let response = require_success(url, response)?;
        let envelope = Envelope::detect(&response.body);
        let page = normalize(&response.body);
        tracing::debug!(%url, ?envelope, items = page.len(), "Page fetched");

        Ok(FetchedPage {
            url: url.clone(),
            status: response.status,
            format,
            envelope,
            page,
        })
    }

    /// Fetch a single entity document.
    ///
    /// Returns `None` on 404/501.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or another non-2xx status.
    pub async fn fetch_entity(&self, url: &Url) -> Result<Option<Value>, ClientError> {
        let response = self.get(url).await?;
        if ADVISORY_STATUSES.contains(&response.status) {
            return Ok(None);
        }
        let response = require_success(url, response)?;
        Ok(Some(response.body))
    }

    /// Walk pages starting at `url`, one `next_page` call at a time.
    #[must_use]
    pub fn pages(&self, url: Url) -> PageWalker<'_, T> {
        PageWalker::new(self, url)
    }

    /// `{api}/{segments...}` with pre-encoded segments.
    fn api_path(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        let mut path = self.api_url.path().trim_end_matches('/').to_string();
        for segment in segments {
            path.push('/');
            path.push_str(segment);
        }
        url.set_path(&path);
        url
    }
}

fn require_success(url: &Url, response: FetchResponse) -> Result<FetchResponse, ClientError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ClientError::ApiError {
            url: url.to_string(),
            status: response.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use serde_json::json;

    fn memory_endpoint(transport: MemoryTransport) -> Endpoint<MemoryTransport> {
        Endpoint::new("http://h/api/", transport).unwrap()
    }

    #[test]
    fn api_url_is_normalized() {
        let endpoint = Endpoint::new("http://h/api/?f=json#top", MemoryTransport::new()).unwrap();
        assert_eq!(endpoint.api_url().as_str(), "http://h/api");
        assert_eq!(
            endpoint.collection_url("a b/c").as_str(),
            "http://h/api/collections/a%20b%2Fc"
        );
    }

    #[test]
    fn invalid_api_url_is_rejected() {
        assert!(matches!(
            Endpoint::new("not a url", MemoryTransport::new()),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            Endpoint::new("mailto:someone@example.com", MemoryTransport::new()),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn landing_page_is_cached() {
        let endpoint = memory_endpoint(
            MemoryTransport::new().with_json("http://h/api", json!({"title": "Hub", "links": []})),
        );

        let title = tokio_test::block_on(endpoint.info()).unwrap().title.clone();
        assert_eq!(title.as_deref(), Some("Hub"));
        tokio_test::block_on(endpoint.info()).unwrap();
        assert_eq!(endpoint.transport().requests().len(), 1);
    }

    #[test]
    fn landing_page_error_is_surfaced() {
        let endpoint = memory_endpoint(
            MemoryTransport::new()
                .with_response("http://h/api", FetchResponse::json(401, Value::Null)),
        );
        let err = tokio_test::block_on(endpoint.info()).unwrap_err();
        assert_eq!(err.status(), Some(401));

        let down = memory_endpoint(MemoryTransport::new().with_failure("http://h/api", "refused"));
        assert!(matches!(
            tokio_test::block_on(down.conformance()),
            Err(ClientError::Transport { .. })
        ));
    }

    #[test]
    fn collections_fall_back_to_default_path() {
        let endpoint = memory_endpoint(
            MemoryTransport::new()
                .with_json("http://h/api", json!({"links": []}))
                .with_json(
                    "http://h/api/collections",
                    json!({"collections": [{"id": "a"}, {"id": "b"}]}),
                ),
        );

        let ids: Vec<String> = tokio_test::block_on(endpoint.collections())
            .unwrap()
            .iter()
            .map(|c| c.id.clone())
            .collect();
        assert_eq!(ids, ["a", "b"]);

        let err = tokio_test::block_on(endpoint.collection("zzz")).unwrap_err();
        assert!(matches!(err, ClientError::CollectionNotFound(id) if id == "zzz"));
    }

    #[test]
    fn options_are_sent_and_reset() {
        let mut endpoint = memory_endpoint(
            MemoryTransport::new().with_json("http://h/api/x", json!([])),
        );
        let url = Url::parse("http://h/api/x").unwrap();

        endpoint.set_fetch_options(FetchOptions::default().with_basic_auth("admin", "admin"));
        tokio_test::block_on(endpoint.fetch_page(&url)).unwrap();
        endpoint.reset_fetch_options();
        tokio_test::block_on(endpoint.fetch_page(&url)).unwrap();

        let requests = endpoint.transport().requests();
        assert!(requests[0]
            .headers
            .iter()
            .any(|(name, value)| name == "Authorization" && value == "Basic YWRtaW46YWRtaW4="));
        assert!(!requests[1]
            .headers
            .iter()
            .any(|(name, _)| name == "Authorization"));
    }

    #[test]
    fn unlinked_collection_is_described_once() {
        let endpoint = memory_endpoint(
            MemoryTransport::new()
                .with_json("http://h/api", json!({"links": []}))
                .with_json("http://h/api/collections", json!({"collections": [{"id": "c1"}]}))
                .with_json(
                    "http://h/api/collections/c1",
                    json!({
                        "id": "c1",
                        "links": [{"href": "/api/collections/c1/datastreams", "rel": "datastreams"}]
                    }),
                ),
        );

        let navigator = tokio_test::block_on(endpoint.navigator_for("c1")).unwrap();
        assert_eq!(navigator.base_url().as_str(), "http://h/api/collections/c1");
        assert_eq!(navigator.available_resources().len(), 1);

        let describes = endpoint
            .transport()
            .requested_urls()
            .iter()
            .filter(|url| url.as_str() == "http://h/api/collections/c1")
            .count();
        assert_eq!(describes, 1);
    }

    #[test]
    fn unsupported_collection() {
        let endpoint = memory_endpoint(
            MemoryTransport::new()
                .with_json("http://h/api", json!({"links": []}))
                .with_json(
                    "http://h/api/collections",
                    json!({"collections": [{"id": "parcels", "links": [{"href": "/p", "rel": "items"}]}]}),
                ),
        );
        let err = tokio_test::block_on(endpoint.navigator_for("parcels")).unwrap_err();
        assert!(matches!(err, ClientError::NotSupported(id) if id == "parcels"));
    }

    #[test]
    fn next_url_resolves_against_page() {
        let page = FetchedPage {
            url: Url::parse("http://h/api/collections/c/systems?limit=2").unwrap(),
            status: 200,
            format: FormatTag::Json,
            envelope: Envelope::ItemsWrapped,
            page: normalize(&json!({
                "items": [],
                "links": [{"href": "systems?limit=2&offset=2", "rel": "next"}]
            })),
        };
        assert_eq!(
            page.next_url().unwrap().as_str(),
            "http://h/api/collections/c/systems?limit=2&offset=2"
        );
        assert!(!page.is_absent());
    }
}
