//! Hypermedia pagination decision.
//!
//! Only the single step "where is the next page" lives here; fetching is left
//! to the caller so it keeps control of cancellation and backpressure.

use crate::link::rel;
use crate::normalize::NormalizedPage;

/// Return the `href` of the first `rel=next` link, exactly as served.
#[must_use]
pub fn next_page_url(page: &NormalizedPage) -> Option<&str> {
    page.links
        .iter()
        .find(|link| link.rel == rel::NEXT)
        .map(|link| link.href.as_str())
}
