//! Plain-text views over the session state.
//!
//! Each view is a small `Display` wrapper, so callers can `print!` it or
//! `to_string()` it in tests.

use crate::fetcher::{Feed, FeedStatus};
use crate::filters::FilterState;
use crate::models::{Article, Listing, Source};
use crate::utils::{ellipsize, upcase};
use std::fmt;

const DESCRIPTION_WIDTH: usize = 160;

/// One-line summary of the active filters.
pub struct FilterBar<'a>(pub &'a FilterState);

impl fmt::Display for FilterBar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filters = self.0;
        let bound = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
        match filters.search_text() {
            Some(q) => write!(f, "Search: \"{}\"", q)?,
            None => write!(f, "Search: -")?,
        }
        writeln!(
            f,
            " | Category: {} | Sort: {} | From: {} | To: {} | Country: {} | Language: {}",
            upcase(filters.category.as_str()),
            filters.sort_by,
            bound(filters.from_date),
            bound(filters.to_date),
            filters.country,
            filters.language,
        )
    }
}

/// `Page 2 of 3  « prev  1 [2] 3  next »`
pub struct PagerBar {
    pub current: usize,
    pub total: usize,
}

impl fmt::Display for PagerBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page {} of {} ", self.current, self.total)?;
        if self.current > 1 {
            write!(f, " « prev ")?;
        }
        for page in 1..=self.total {
            if page == self.current {
                write!(f, " [{}]", page)?;
            } else {
                write!(f, " {}", page)?;
            }
        }
        if self.current < self.total {
            write!(f, "  next »")?;
        }
        writeln!(f)
    }
}

fn write_status_banner<T: Listing>(
    f: &mut fmt::Formatter<'_>,
    feed: &Feed<T>,
    empty_message: &str,
) -> Result<bool, fmt::Error> {
    match feed.status() {
        FeedStatus::Loading => {
            writeln!(f, "Loading {}...", T::LABEL)?;
            Ok(false)
        }
        FeedStatus::Failed(e) => {
            writeln!(f, "Error: {}", e)?;
            if feed.items().is_empty() {
                return Ok(false);
            }
            writeln!(f, "(showing previous {})", T::LABEL)?;
            Ok(true)
        }
        FeedStatus::Empty => {
            writeln!(f, "{}", empty_message)?;
            Ok(false)
        }
        FeedStatus::Ready => Ok(true),
    }
}

fn pager<T>(feed: &Feed<T>) -> PagerBar {
    PagerBar {
        current: feed.pagination().current_page(),
        total: feed.page().total_pages,
    }
}

fn first_number<T>(feed: &Feed<T>) -> usize {
    let p = feed.pagination();
    (p.current_page() - 1) * p.page_size() + 1
}

/// The current page of articles, or the status that replaces it.
pub struct ArticlesView<'a> {
    pub feed: &'a Feed<Article>,
    pub filters: &'a FilterState,
}

impl fmt::Display for ArticlesView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let empty = match self.filters.search_text() {
            Some(q) => format!("No articles found for \"{}\"", q),
            None => "No articles found.".to_string(),
        };
        if !write_status_banner(f, self.feed, &empty)? {
            return Ok(());
        }

        let start = first_number(self.feed);
        for (i, article) in self.feed.page().items.iter().enumerate() {
            writeln!(f, "{:>3}. {}", start + i, article.title.trim())?;
            writeln!(f, "     {} · {}", article.byline(), article.published_label())?;
            if let Some(desc) = article.description.as_deref().filter(|d| !d.trim().is_empty()) {
                writeln!(f, "     {}", ellipsize(desc, DESCRIPTION_WIDTH))?;
            }
            writeln!(f, "     {}", article.url)?;
        }
        write!(f, "{}", pager(self.feed))
    }
}

/// The current page of sources, or the status that replaces it.
pub struct SourcesView<'a> {
    pub feed: &'a Feed<Source>,
}

impl fmt::Display for SourcesView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !write_status_banner(f, self.feed, "No sources available")? {
            return Ok(());
        }

        let start = first_number(self.feed);
        for (i, source) in self.feed.page().items.iter().enumerate() {
            write!(f, "{:>3}. {} ({})", start + i, source.name, source.id)?;
            if let Some(url) = &source.url {
                write!(f, "  {}", url)?;
            }
            writeln!(f)?;
        }
        write!(f, "{}", pager(self.feed))
    }
}
