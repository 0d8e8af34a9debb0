//! Caller-driven pagination over `rel=next` links.

use crate::endpoint::{Endpoint, FetchedPage};
use crate::error::ClientError;
use crate::transport::Transport;
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// Walks a paginated resource one page per [`PageWalker::next_page`] call.
///
/// The sequence ends when a page has no `next` link, when a `next` link points
/// at an already visited URL, or when the page cap is reached.
pub struct PageWalker<'a, T> {
    endpoint: &'a Endpoint<T>,
    first: Url,
    next: Option<Url>,
    visited: HashSet<String>,
    fetched: usize,
    max_pages: Option<usize>,
}

impl<'a, T: Transport> PageWalker<'a, T> {
    /// Start a walk at `first`.
    #[must_use]
    pub fn new(endpoint: &'a Endpoint<T>, first: Url) -> Self {
        Self {
            endpoint,
            next: Some(first.clone()),
            first,
            visited: HashSet::new(),
            fetched: 0,
            max_pages: None,
        }
    }

    /// Stop after `max_pages` pages (builder pattern).
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Pages fetched since the walk (re)started.
    #[must_use]
    pub fn pages_fetched(&self) -> usize {
        self.fetched
    }

    /// Rewind to the first page.
    pub fn restart(&mut self) {
        self.next = Some(self.first.clone());
        self.visited.clear();
        self.fetched = 0;
    }

    /// Fetch the next page, or `None` when the walk is over.
    ///
    /// # Errors
    ///
    /// Returns error if the page fetch fails. The walk ends; [`restart`]
    /// begins it again.
    ///
    /// [`restart`]: PageWalker::restart
    pub async fn next_page(&mut self) -> Result<Option<FetchedPage>, ClientError> {
        if self.max_pages.is_some_and(|max| self.fetched >= max) {
            tracing::debug!(pages = self.fetched, "Page cap reached");
            return Ok(None);
        }

        let Some(url) = self.next.take() else {
            return Ok(None);
        };

        if !self.visited.insert(url.to_string()) {
            tracing::warn!(%url, "Pagination cycle detected, stopping");
            return Ok(None);
        }

        let page = self.endpoint.fetch_page(&url).await?;
        self.fetched += 1;
        self.next = page.next_url();
        Ok(Some(page))
    }

    /// Drain the remaining pages and concatenate their items.
    ///
    /// # Errors
    ///
    /// Returns the first page fetch error.
    pub async fn collect_all(&mut self) -> Result<Vec<Value>, ClientError> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page.page.items);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use serde_json::json;

    fn page(ids: &[&str], next: Option<&str>) -> Value {
        let items: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
        let links: Vec<Value> = next
            .map(|href| vec![json!({"href": href, "rel": "next"})])
            .unwrap_or_default();
        json!({"items": items, "links": links})
    }

    fn paged_endpoint() -> Endpoint<MemoryTransport> {
        let transport = MemoryTransport::new()
            .with_json("http://h/s?p=1", page(&["a", "b"], Some("http://h/s?p=2")))
            .with_json("http://h/s?p=2", page(&["c"], Some("s?p=3")))
            .with_json("http://h/s?p=3", page(&["d"], None));
        Endpoint::new("http://h", transport).unwrap()
    }

    fn ids(items: &[Value]) -> Vec<&str> {
        items.iter().filter_map(|item| item["id"].as_str()).collect()
    }

    #[test]
    fn walks_until_no_next() {
        let endpoint = paged_endpoint();
        let mut walker = endpoint.pages(Url::parse("http://h/s?p=1").unwrap());

        let items = tokio_test::block_on(walker.collect_all()).unwrap();
        assert_eq!(ids(&items), ["a", "b", "c", "d"]);
        assert_eq!(walker.pages_fetched(), 3);
        assert!(tokio_test::block_on(walker.next_page()).unwrap().is_none());
    }

    #[test]
    fn page_cap_and_restart() {
        let endpoint = paged_endpoint();
        let mut walker = endpoint
            .pages(Url::parse("http://h/s?p=1").unwrap())
            .with_max_pages(2);

        let items = tokio_test::block_on(walker.collect_all()).unwrap();
        assert_eq!(ids(&items), ["a", "b", "c"]);

        walker.restart();
        let first = tokio_test::block_on(walker.next_page()).unwrap().unwrap();
        assert_eq!(first.page.ids(), ["a", "b"]);
        assert_eq!(endpoint.transport().requests().len(), 3);
    }

    #[test]
    fn cycle_terminates() {
        let transport = MemoryTransport::new()
            .with_json("http://h/loop?p=1", page(&["a"], Some("http://h/loop?p=2")))
            .with_json("http://h/loop?p=2", page(&["b"], Some("http://h/loop?p=1")));
        let endpoint = Endpoint::new("http://h", transport).unwrap();
        let mut walker = endpoint.pages(Url::parse("http://h/loop?p=1").unwrap());

        let items = tokio_test::block_on(walker.collect_all()).unwrap();
        assert_eq!(ids(&items), ["a", "b"]);
        assert_eq!(endpoint.transport().requests().len(), 2);
    }

    #[test]
    fn error_ends_walk() {
        let transport = MemoryTransport::new()
            .with_json("http://h/s?p=1", page(&["a"], Some("http://h/s?p=2")))
            .with_failure("http://h/s?p=2", "reset by peer");
        let endpoint = Endpoint::new("http://h", transport).unwrap();
        let mut walker = endpoint.pages(Url::parse("http://h/s?p=1").unwrap());

        assert!(tokio_test::block_on(walker.next_page()).unwrap().is_some());
        assert!(tokio_test::block_on(walker.next_page()).is_err());
        assert!(tokio_test::block_on(walker.next_page()).unwrap().is_none());
    }
}
