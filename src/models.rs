//! Data models for news sources and articles as returned by the news API.
//!
//! This module defines the records decoded from the listing endpoints:
//! - [`Source`]: A publisher/outlet from the `sources` endpoint
//! - [`Article`]: A single news item from `top-headlines` or `everything`
//! - [`Listing`]: Ties a record type to the envelope field that holds its list
//!
//! The API speaks camelCase (`urlToImage`, `publishedAt`), so the structs use
//! `#[serde(rename_all = "camelCase")]` rather than mirroring the wire names.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record type that arrives as an array inside a JSON envelope.
///
/// The fetcher looks up [`Listing::FIELD`] in the response object and decodes
/// every element as `Self`. A missing field is a decode failure, never an
/// empty list.
pub trait Listing: DeserializeOwned + Send + 'static {
    /// Name of the envelope field carrying the array.
    const FIELD: &'static str;

    /// Human-readable plural used in log lines and the "no results" banner.
    const LABEL: &'static str;

    /// Post-decode cleanup applied to every successfully decoded list.
    fn normalize(items: Vec<Self>) -> Vec<Self> {
        items
    }
}

/// A news publisher as listed by the `sources` endpoint.
///
/// Only `id` and `name` are guaranteed; the remaining fields are present on
/// NewsAPI responses but may be dropped by a proxy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Source {
    /// Unique identifier within one response (e.g. `"bbc-news"`).
    pub id: String,
    /// Display name (e.g. `"BBC News"`).
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Listing for Source {
    const FIELD: &'static str = "sources";
    const LABEL: &'static str = "sources";

    /// Source ids must be unique; keep the first of any duplicates.
    fn normalize(items: Vec<Self>) -> Vec<Self> {
        items.into_iter().unique_by(|s| s.id.clone()).collect()
    }
}

/// The outlet reference embedded in each article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// A single news item.
///
/// Everything except `title` and `url` is optional on the wire; the view
/// substitutes "Unknown" placeholders for a missing author or source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ArticleSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Listing for Article {
    const FIELD: &'static str = "articles";
    const LABEL: &'static str = "articles";
}

impl Article {
    /// Byline shown under the headline.
    pub fn byline(&self) -> String {
        match self.author.as_deref().map(str::trim) {
            Some(author) if !author.is_empty() => format!("By: {}", author),
            _ => "Author: Unknown".to_string(),
        }
    }

    /// Publication date as `YYYY-MM-DD`, or the unknown placeholder.
    pub fn published_label(&self) -> String {
        match self.published_at {
            Some(ts) => ts.date_naive().to_string(),
            None => "Published on: Unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_minimal_deserialization() {
        let json = r#"{"id": "bbc-news", "name": "BBC News"}"#;
        let source: Source = serde_json::from_str(json).unwrap();
        assert_eq!(source.id, "bbc-news");
        assert_eq!(source.name, "BBC News");
        assert!(source.description.is_none());
    }

    #[test]
    fn test_source_full_deserialization() {
        let json = r#"{
            "id": "abc-news",
            "name": "ABC News",
            "description": "Your trusted source",
            "url": "https://abcnews.go.com",
            "category": "general",
            "language": "en",
            "country": "us"
        }"#;
        let source: Source = serde_json::from_str(json).unwrap();
        assert_eq!(source.category.as_deref(), Some("general"));
        assert_eq!(source.country.as_deref(), Some("us"));
    }

    #[test]
    fn test_article_camel_case_fields() {
        let json = r#"{
            "source": {"id": null, "name": "Example"},
            "author": "Jane Roe",
            "title": "Markets rally",
            "description": "Stocks climbed.",
            "url": "https://example.com/a",
            "urlToImage": "https://example.com/a.jpg",
            "publishedAt": "2024-03-05T10:15:00Z",
            "content": "Full text"
        }"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.url_to_image.as_deref(), Some("https://example.com/a.jpg"));
        assert_eq!(article.published_label(), "2024-03-05");
        assert_eq!(article.byline(), "By: Jane Roe");
        assert_eq!(article.source.unwrap().name, "Example");
    }

    #[test]
    fn test_article_missing_optionals() {
        let json = r#"{"title": "Untitled", "url": "https://example.com/b", "author": null}"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.byline(), "Author: Unknown");
        assert_eq!(article.published_label(), "Published on: Unknown");
        assert!(article.description.is_none());
    }

    #[test]
    fn test_blank_author_is_unknown() {
        let json = r#"{"title": "T", "url": "https://example.com/c", "author": "   "}"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.byline(), "Author: Unknown");
    }

    #[test]
    fn test_listing_fields() {
        assert_eq!(<Source as Listing>::FIELD, "sources");
        assert_eq!(<Article as Listing>::FIELD, "articles");
    }
}
