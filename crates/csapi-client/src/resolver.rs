//! Conformance resolution.
//!
//! Conformance is advisory: a missing link, an unreachable document or a
//! malformed body all degrade to an empty [`ConformanceSet`].

use crate::options::FetchOptions;
use crate::transport::Transport;
use csapi_core::link::{find_rel, rel, Link};
use csapi_core::ConformanceSet;
use url::Url;

/// Locate the `rel=conformance` link among `links`, fetch it and parse
/// `conformsTo`.
///
/// Relative hrefs are resolved against `api_url`. Never fails.
pub async fn resolve_conformance<T: Transport + ?Sized>(
    transport: &T,
    options: &FetchOptions,
    api_url: &Url,
    links: &[Link],
) -> ConformanceSet {
    let Some(link) = find_rel(links, rel::CONFORMANCE) else {
        tracing::debug!(%api_url, "No conformance link advertised");
        return ConformanceSet::new();
    };

    let url = match resolve_href(api_url, &link.href) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(href = %link.href, error = %e, "Unusable conformance link");
            return ConformanceSet::new();
        }
    };

    match transport.fetch_json(&url, options.headers()).await {
        Ok(response) if response.is_success() => {
            let set = ConformanceSet::from_document(&response.body);
            tracing::debug!(%url, classes = set.len(), "Conformance resolved");
            set
        }
        Ok(response) => {
            tracing::warn!(%url, status = response.status, "Conformance document unavailable");
            ConformanceSet::new()
        }
        Err(e) => {
            tracing::warn!(%url, error = %e, "Conformance fetch failed");
            ConformanceSet::new()
        }
    }
}

/// Resolve `href` against `base`, treating `base` as a directory.
///
/// `/conformance` against `http://h/api` stays host-relative
/// (`http://h/conformance`) while `conformance` becomes `http://h/api/conformance`.
///
/// # Errors
///
/// Returns error if the joined URL is invalid.
pub fn resolve_href(base: &Url, href: &str) -> Result<Url, url::ParseError> {
    let mut directory = base.clone();
    if !directory.path().ends_with('/') {
        let path = format!("{}/", directory.path());
        directory.set_path(&path);
    }
    directory.set_query(None);
    directory.set_fragment(None);
    directory.join(href)
}
