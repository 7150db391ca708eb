//! Command-line interface definitions for newsdesk.
//!
//! Connection options are global and can come from flags, environment
//! variables, or the YAML config file (see [`crate::config`]). Each listing
//! subcommand takes only the filters its request sends; `browse` takes all
//! of them.

use crate::filters::{
    Category, CountryCode, FilterError, FilterEvent, FilterState, Language, SortBy,
    parse_date_bound,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Command-line arguments for newsdesk.
///
/// # Examples
///
/// ```sh
/// # Top business headlines through the local proxy
/// newsdesk articles
///
/// # Keyword search, second page, as JSON
/// newsdesk articles -q "climate summit" --sort-by relevancy --page 2 --json
///
/// # Sources for Germany in German
/// newsdesk sources --country de --language de
///
/// # Interactive browsing against a remote proxy
/// newsdesk --base-url https://proxy.example.com/api/ browse
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Base URL of the news API or of the proxy in front of it
    #[arg(long, env = "NEWSDESK_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// API key, sent as the X-Api-Key header (leave unset when a proxy adds it)
    #[arg(long, env = "NEWSDESK_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Optional path to a config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List news sources for a country, category and language
    Sources(SourcesArgs),
    /// Search articles by keyword or browse top headlines by category
    Articles(ArticlesArgs),
    /// Interactive browser: change filters and pages from a prompt
    Browse(BrowseArgs),
}

/// Filter selections. Unset options keep the command's defaults.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Free-text search; when set, articles come from a keyword search
    #[arg(short, long)]
    pub query: Option<String>,

    /// Category (all, business, entertainment, general, health, science, sports, technology)
    #[arg(long)]
    pub category: Option<Category>,

    /// Source language (all, ar, de, en, es, fr, it, nl, pt, ru, zh)
    #[arg(long)]
    pub language: Option<Language>,

    /// Two-letter country code for the source listing
    #[arg(long)]
    pub country: Option<CountryCode>,

    /// Sort order (publishedAt, relevancy, popularity)
    #[arg(long)]
    pub sort_by: Option<SortBy>,

    /// Earliest publication date for keyword searches (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    /// Latest publication date for keyword searches (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,
}

/// Filters the sources request actually sends.
#[derive(Args, Debug, Default)]
pub struct SourceFilterArgs {
    /// Category (all, business, entertainment, general, health, science, sports, technology)
    #[arg(long)]
    pub category: Option<Category>,

    /// Source language (all, ar, de, en, es, fr, it, nl, pt, ru, zh)
    #[arg(long)]
    pub language: Option<Language>,

    /// Two-letter country code
    #[arg(long)]
    pub country: Option<CountryCode>,
}

impl From<&SourceFilterArgs> for FilterArgs {
    fn from(args: &SourceFilterArgs) -> Self {
        FilterArgs {
            category: args.category,
            language: args.language,
            country: args.country.clone(),
            ..Default::default()
        }
    }
}

/// Filters the article requests actually send.
#[derive(Args, Debug, Default)]
pub struct ArticleFilterArgs {
    /// Free-text search; when set, articles come from a keyword search
    #[arg(short, long)]
    pub query: Option<String>,

    /// Category for top headlines (all, business, entertainment, general, health, science, sports, technology)
    #[arg(long)]
    pub category: Option<Category>,

    /// Sort order (publishedAt, relevancy, popularity)
    #[arg(long)]
    pub sort_by: Option<SortBy>,

    /// Earliest publication date for keyword searches (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    /// Latest publication date for keyword searches (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,
}

impl From<&ArticleFilterArgs> for FilterArgs {
    fn from(args: &ArticleFilterArgs) -> Self {
        FilterArgs {
            query: args.query.clone(),
            category: args.category,
            sort_by: args.sort_by,
            from: args.from,
            to: args.to,
            ..Default::default()
        }
    }
}

/// Which page to print and how.
#[derive(Args, Debug)]
pub struct PageArgs {
    /// Page to show (clamped to the pages available)
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,

    /// Print the page as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SourcesArgs {
    #[command(flatten)]
    pub filters: SourceFilterArgs,

    #[command(flatten)]
    pub output: PageArgs,
}

#[derive(Args, Debug)]
pub struct ArticlesArgs {
    #[command(flatten)]
    pub filters: ArticleFilterArgs,

    #[command(flatten)]
    pub output: PageArgs,
}

/// The browser drives both listings from one filter state, so it takes
/// every filter. Its sources view starts from the same category as the
/// articles view (`business` unless `--category` says otherwise).
#[derive(Args, Debug)]
pub struct BrowseArgs {
    #[command(flatten)]
    pub filters: FilterArgs,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, FilterError> {
    parse_date_bound(s)?.ok_or_else(|| FilterError::InvalidDate(s.to_string()))
}

impl FilterArgs {
    /// Apply the given options on top of `base`, one event at a time, so the
    /// same validation as interactive input applies.
    pub fn to_filters(&self, base: FilterState) -> Result<FilterState, FilterError> {
        let mut events = Vec::new();
        if let Some(q) = &self.query {
            events.push(FilterEvent::SetQuery(q.clone()));
        }
        if let Some(c) = self.category {
            events.push(FilterEvent::SetCategory(c));
        }
        if let Some(l) = self.language {
            events.push(FilterEvent::SetLanguage(l));
        }
        if let Some(c) = &self.country {
            events.push(FilterEvent::SetCountry(c.clone()));
        }
        if let Some(s) = self.sort_by {
            events.push(FilterEvent::SetSortBy(s));
        }
        let state = events
            .into_iter()
            .try_fold(base, |state, event| state.apply(event))?;
        // upper bound first so a valid range never trips the check halfway
        state
            .apply(FilterEvent::SetToDate(self.to))?
            .apply(FilterEvent::SetFromDate(self.from))
    }
}
