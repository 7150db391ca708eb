//! Request URL derivation from a [`FilterState`].
//!
//! Three request shapes exist:
//!
//! | Shape | Path | Parameters |
//! |-------|------|------------|
//! | Source listing | `sources` | `country`, `category`*, `language`* |
//! | Keyword search | `everything` | `q`, `sortBy`, `from`*, `to`* |
//! | Category browse | `top-headlines` | `category`, `sortBy` |
//!
//! (* omitted when `all` or unset)
//!
//! The article shapes are mutually exclusive: non-blank search text selects
//! `everything`, otherwise a concrete category selects `top-headlines`, and
//! with neither the request is suppressed with [`FetchError::EmptyQuery`].
//!
//! Parameters are appended in a fixed order so equal filter states always
//! serialize to equal URL strings, which is what [`QueryMemo`] relies on.

use crate::error::{ConfigError, FetchError};
use crate::filters::{Category, DATE_FORMAT, FilterState, Language};
use tracing::{debug, instrument};
use url::Url;

/// Base URL beneath which the API paths are resolved.
///
/// Usually a proxy prefix such as `http://localhost:5173/api/`; pointing it
/// straight at the API host works the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    base: Url,
}

impl ApiEndpoint {
    /// Parse and normalize a base URL. Query and fragment are dropped and the
    /// path always ends in `/`.
    pub fn parse(base: &str) -> Result<Self, ConfigError> {
        let mut url = Url::parse(base.trim()).map_err(|source| ConfigError::BaseUrl {
            url: base.to_string(),
            source,
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::OpaqueBaseUrl(base.to_string()));
        }
        url.set_query(None);
        url.set_fragment(None);
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(ApiEndpoint { base: url })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn resolve(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let full = format!("{}{}", self.base.path(), path);
        url.set_path(&full);
        url
    }
}

/// Build the article request for the current filters.
///
/// # Errors
///
/// [`FetchError::EmptyQuery`] when the search text is blank and the category
/// is `all`.
#[instrument(level = "debug", skip_all)]
pub fn build_query(filters: &FilterState, endpoint: &ApiEndpoint) -> Result<Url, FetchError> {
    let url = if let Some(q) = filters.search_text() {
        let mut url = endpoint.resolve("everything");
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", q);
            pairs.append_pair("sortBy", filters.sort_by.as_str());
            if let Some(from) = filters.from_date {
                pairs.append_pair("from", &from.format(DATE_FORMAT).to_string());
            }
            if let Some(to) = filters.to_date {
                pairs.append_pair("to", &to.format(DATE_FORMAT).to_string());
            }
        }
        url
    } else if filters.category != Category::All {
        let mut url = endpoint.resolve("top-headlines");
        url.query_pairs_mut()
            .append_pair("category", filters.category.as_str())
            .append_pair("sortBy", filters.sort_by.as_str());
        url
    } else {
        return Err(FetchError::EmptyQuery);
    };
    debug!(%url, "Derived article query");
    Ok(url)
}

/// Build the source-listing request for the current filters.
#[instrument(level = "debug", skip_all)]
pub fn build_sources_query(filters: &FilterState, endpoint: &ApiEndpoint) -> Url {
    let mut url = endpoint.resolve("sources");
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("country", filters.country.as_str());
        if filters.category != Category::All {
            pairs.append_pair("category", filters.category.as_str());
        }
        if filters.language != Language::All {
            pairs.append_pair("language", filters.language.as_str());
        }
    }
    debug!(%url, "Derived sources query");
    url
}

/// Remembers the last URL issued by one consumer.
#[derive(Debug, Default)]
pub struct QueryMemo {
    last: Option<Url>,
}

impl QueryMemo {
    /// Record `url`; returns `false` if it equals the previous one, in which
    /// case no new request should be issued.
    pub fn refresh(&mut self, url: &Url) -> bool {
        if self.last.as_ref() == Some(url) {
            return false;
        }
        self.last = Some(url.clone());
        true
    }

    /// Drop the remembered URL so the next `refresh` always reports a change.
    pub fn forget(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterEvent, SortBy, parse_date_bound};

    fn endpoint() -> ApiEndpoint {
        ApiEndpoint::parse("http://localhost:5173/api").unwrap()
    }

    fn with(events: Vec<FilterEvent>) -> FilterState {
        events
            .into_iter()
            .fold(FilterState::default(), |f, e| f.apply(e).unwrap())
    }

    #[test]
    fn test_endpoint_normalization() {
        let e = ApiEndpoint::parse("https://proxy.example.com/api/v2?x=1#frag").unwrap();
        assert_eq!(e.base().as_str(), "https://proxy.example.com/api/v2/");
        assert!(ApiEndpoint::parse("not a url").is_err());
        assert!(ApiEndpoint::parse("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_search_shape() {
        let f = with(vec![
            FilterEvent::SetQuery("  tesla ".into()),
            FilterEvent::SetSortBy(SortBy::Popularity),
        ]);
        let url = build_query(&f, &endpoint()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5173/api/everything?q=tesla&sortBy=popularity"
        );
    }

    #[test]
    fn test_search_shape_with_dates() {
        let f = with(vec![
            FilterEvent::SetQuery("climate summit".into()),
            FilterEvent::SetFromDate(parse_date_bound("2024-01-01").unwrap()),
            FilterEvent::SetToDate(parse_date_bound("2024-01-31").unwrap()),
        ]);
        let url = build_query(&f, &endpoint()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5173/api/everything?q=climate+summit&sortBy=publishedAt&from=2024-01-01&to=2024-01-31"
        );
    }

    #[test]
    fn test_search_ignores_category() {
        let f = with(vec![
            FilterEvent::SetQuery("rust".into()),
            FilterEvent::SetCategory(Category::Sports),
        ]);
        let url = build_query(&f, &endpoint()).unwrap();
        assert_eq!(url.path(), "/api/everything");
        assert!(!url.query().unwrap().contains("category"));
    }

    #[test]
    fn test_category_shape() {
        for category in Category::ALL.iter().copied().filter(|c| *c != Category::All) {
            let f = with(vec![FilterEvent::SetCategory(category)]);
            let url = build_query(&f, &endpoint()).unwrap();
            assert_eq!(url.path(), "/api/top-headlines");
            assert_eq!(
                url.query(),
                Some(format!("category={}&sortBy=publishedAt", category).as_str())
            );
        }
    }

    #[test]
    fn test_category_shape_ignores_dates() {
        let f = with(vec![FilterEvent::SetFromDate(
            parse_date_bound("2024-01-01").unwrap(),
        )]);
        let url = build_query(&f, &endpoint()).unwrap();
        assert!(!url.query().unwrap().contains("from"));
    }

    #[test]
    fn test_empty_query_suppressed() {
        let f = with(vec![FilterEvent::SetCategory(Category::All)]);
        assert_eq!(build_query(&f, &endpoint()), Err(FetchError::EmptyQuery));
    }

    #[test]
    fn test_deterministic() {
        let f = with(vec![
            FilterEvent::SetQuery("a&b=c".into()),
            FilterEvent::SetToDate(parse_date_bound("2024-05-01").unwrap()),
        ]);
        let a = build_query(&f, &endpoint()).unwrap();
        let b = build_query(&f.clone(), &endpoint()).unwrap();
        assert_eq!(a.as_str(), b.as_str());
        assert!(a.as_str().contains("q=a%26b%3Dc"));
    }

    #[test]
    fn test_sources_query() {
        let f = FilterState::default();
        assert_eq!(
            build_sources_query(&f, &endpoint()).as_str(),
            "http://localhost:5173/api/sources?country=us&category=business"
        );

        let f = with(vec![
            FilterEvent::SetCategory(Category::All),
            FilterEvent::SetCountry("gb".parse().unwrap()),
        ]);
        assert_eq!(
            build_sources_query(&f, &endpoint()).as_str(),
            "http://localhost:5173/api/sources?country=gb"
        );

        let f = with(vec![
            FilterEvent::SetCategory(Category::Science),
            FilterEvent::SetLanguage(Language::French),
        ]);
        assert_eq!(
            build_sources_query(&f, &endpoint()).query(),
            Some("country=us&category=science&language=fr")
        );
    }

    #[test]
    fn test_memo_skips_unchanged() {
        let mut memo = QueryMemo::default();
        let f = FilterState::default();
        let url = build_query(&f, &endpoint()).unwrap();
        assert!(memo.refresh(&url));
        assert!(!memo.refresh(&build_query(&f.clone(), &endpoint()).unwrap()));

        let g = f.apply(FilterEvent::SetSortBy(SortBy::Relevancy)).unwrap();
        assert!(memo.refresh(&build_query(&g, &endpoint()).unwrap()));

        memo.forget();
        assert!(memo.refresh(&build_query(&g, &endpoint()).unwrap()));
    }
}
