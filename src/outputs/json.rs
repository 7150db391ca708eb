//! JSON rendering of one page of a feed.
//!
//! # Output Structure
//!
//! ```json
//! {
//!   "status": "ok",
//!   "error": null,
//!   "page": 2,
//!   "total_pages": 3,
//!   "total_results": 25,
//!   "filters": { "country": "us", "category": "business", ... },
//!   "items": [ ... ]
//! }
//! ```
//!
//! `status` is one of `loading`, `error`, `empty`, `ok`. On `error` the
//! previous items are still included, matching the text view.

use crate::fetcher::{Feed, FeedStatus};
use crate::filters::FilterState;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PageDocument<'a, T> {
    status: &'static str,
    error: Option<String>,
    page: usize,
    total_pages: usize,
    total_results: usize,
    filters: &'a FilterState,
    items: &'a [T],
}

/// Serialize the current page of `feed` with the filters that produced it.
pub fn page_to_json<T: Serialize>(
    feed: &Feed<T>,
    filters: &FilterState,
) -> Result<String, serde_json::Error> {
    let (status, error) = match feed.status() {
        FeedStatus::Loading => ("loading", None),
        FeedStatus::Failed(e) => ("error", Some(e.to_string())),
        FeedStatus::Empty => ("empty", None),
        FeedStatus::Ready => ("ok", None),
    };
    let page = feed.page();
    let doc = PageDocument {
        status,
        error,
        page: feed.pagination().current_page(),
        total_pages: page.total_pages,
        total_results: feed.items().len(),
        filters,
        items: page.items,
    };
    serde_json::to_string_pretty(&doc)
}
