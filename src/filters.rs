//! Filter state and the pure update functions that drive it.
//!
//! Every user input (a typed search, a dropdown change, a date pick) maps to
//! one [`FilterEvent`]. [`FilterState::apply`] turns the current state plus an
//! event into the next state, or rejects the event and leaves the caller's
//! state untouched. Nothing in here performs I/O.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static COUNTRY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]{2}$").expect("static regex"));

/// Date format used on the command line and in `from`/`to` query parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Rejected filter input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown category '{0}' (expected one of: {list})", list = Category::names())]
    UnknownCategory(String),

    #[error("unknown language '{0}' (expected one of: {list})", list = Language::names())]
    UnknownLanguage(String),

    #[error("unknown sort order '{0}' (expected one of: {list})", list = SortBy::names())]
    UnknownSortBy(String),

    #[error("invalid country code '{0}' (expected two letters, e.g. us)")]
    InvalidCountry(String),

    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("date range is inverted: from {from} is after to {to}")]
    InvertedDateRange { from: NaiveDate, to: NaiveDate },
}

/// Generates a closed string enum with `as_str`, `Display`, `FromStr` and an
/// `ALL` table, matching the option lists of the filter dropdowns.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $err:ident {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            fn names() -> String {
                Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = FilterError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| FilterError::$err(s.to_string()))
            }
        }
    };
}

string_enum! {
    /// News category. `All` means "no category filter".
    Category, UnknownCategory {
        All => "all",
        Business => "business",
        Entertainment => "entertainment",
        General => "general",
        Health => "health",
        Science => "science",
        Sports => "sports",
        Technology => "technology",
    }
}

string_enum! {
    /// Source language. `All` means "no language filter".
    Language, UnknownLanguage {
        All => "all",
        Arabic => "ar",
        German => "de",
        English => "en",
        Spanish => "es",
        French => "fr",
        Italian => "it",
        Dutch => "nl",
        Portuguese => "pt",
        Russian => "ru",
        Chinese => "zh",
    }
}

string_enum! {
    /// Ordering requested from the API.
    SortBy, UnknownSortBy {
        PublishedAt => "publishedAt",
        Relevancy => "relevancy",
        Popularity => "popularity",
    }
}

/// ISO-3166 alpha-2 country code, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CountryCode {
    fn default() -> Self {
        CountryCode("us".to_string())
    }
}

impl FromStr for CountryCode {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        if COUNTRY_RE.is_match(&lowered) {
            Ok(CountryCode(lowered))
        } else {
            Err(FilterError::InvalidCountry(s.to_string()))
        }
    }
}

impl TryFrom<String> for CountryCode {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CountryCode> for String {
    fn from(value: CountryCode) -> Self {
        value.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a `YYYY-MM-DD` date. An empty string or `-` means "no bound".
pub fn parse_date_bound(s: &str) -> Result<Option<NaiveDate>, FilterError> {
    let s = s.trim();
    if s.is_empty() || s == "-" {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map(Some)
        .map_err(|_| FilterError::InvalidDate(s.to_string()))
}

/// The current set of user-chosen query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub country: CountryCode,
    pub category: Category,
    pub language: Language,
    pub query: String,
    pub sort_by: SortBy,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            country: CountryCode::default(),
            category: Category::Business,
            language: Language::All,
            query: String::new(),
            sort_by: SortBy::PublishedAt,
            from_date: None,
            to_date: None,
        }
    }
}

/// One user input against the filter bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
    SetQuery(String),
    SetCategory(Category),
    SetLanguage(Language),
    SetCountry(CountryCode),
    SetSortBy(SortBy),
    SetFromDate(Option<NaiveDate>),
    SetToDate(Option<NaiveDate>),
}

impl FilterState {
    /// The trimmed search text, or `None` when the search box is blank.
    pub fn search_text(&self) -> Option<&str> {
        let q = self.query.trim();
        (!q.is_empty()).then_some(q)
    }

    /// Apply one input event and return the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvertedDateRange`] when the event would leave
    /// `from_date` after `to_date`.
    pub fn apply(&self, event: FilterEvent) -> Result<FilterState, FilterError> {
        let mut next = self.clone();
        match event {
            FilterEvent::SetQuery(q) => next.query = q,
            FilterEvent::SetCategory(c) => next.category = c,
            FilterEvent::SetLanguage(l) => next.language = l,
            FilterEvent::SetCountry(c) => next.country = c,
            FilterEvent::SetSortBy(s) => next.sort_by = s,
            FilterEvent::SetFromDate(d) => next.from_date = d,
            FilterEvent::SetToDate(d) => next.to_date = d,
        }
        next.check_date_range()?;
        Ok(next)
    }

    fn check_date_range(&self) -> Result<(), FilterError> {
        match (self.from_date, self.to_date) {
            (Some(from), Some(to)) if from > to => Err(FilterError::InvertedDateRange { from, to }),
            _ => Ok(()),
        }
    }
}
