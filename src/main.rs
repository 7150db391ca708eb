//! # newsdesk
//!
//! A terminal browser for a NewsAPI-compatible news service. It lists news
//! sources filtered by country, category and language, and lists articles
//! either by keyword search or by category headlines, ten per page.
//!
//! ## Usage
//!
//! ```sh
//! newsdesk articles -q "climate summit" --from 2024-01-01 --page 2
//! newsdesk sources --country gb --category technology
//! newsdesk browse
//! ```
//!
//! ## Architecture
//!
//! 1. **Filters**: each input becomes a pure update of the filter state
//! 2. **Query**: the filter state derives request URLs under a configurable
//!    base URL (normally a proxy that holds the API key)
//! 3. **Fetch**: requests are tagged with a generation so only the response
//!    to the latest filter state is ever applied
//! 4. **Pagination/Output**: the current page is rendered as text or JSON
//!
//! Logs go to stderr (`RUST_LOG` controls the level); stdout carries only the
//! rendered listings.

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browse;
mod cli;
mod config;
mod error;
mod fetcher;
mod filters;
mod models;
mod outputs;
mod pagination;
mod query;
mod session;
mod utils;

use cli::{Cli, Command, FilterArgs, PageArgs};
use config::Settings;
use fetcher::{Feed, HttpTransport};
use filters::{Category, FilterState};
use outputs::{json, text};
use session::{NewsSession, execute};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.command, "Parsed CLI arguments");

    let settings = match Settings::resolve(&args).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    if settings.api_key.is_some() {
        warn!("API key configured on the client; prefer a proxy that injects it");
    }
    info!(base_url = %settings.endpoint.base(), "newsdesk starting up");

    let transport = Arc::new(HttpTransport::new(
        settings.api_key.as_deref(),
        settings.timeout,
        &settings.user_agent,
    )?);

    match args.command {
        Command::Sources(list) => {
            // the source listing starts unfiltered by category, like the header dropdowns
            let base = FilterState {
                category: Category::All,
                ..FilterState::default()
            };
            let filters = FilterArgs::from(&list.filters).to_filters(base)?;
            let mut session = NewsSession::new(settings.endpoint, filters);
            if let Some(plan) = session.plan_sources() {
                let fetched = execute(transport.as_ref(), plan).await;
                session.apply(fetched);
            }
            session.sources_mut().go_to_page(list.output.page);
            emit(&list.output, session.sources(), session.filters(), |feed, _| {
                text::SourcesView { feed }.to_string()
            })?;
        }
        Command::Articles(list) => {
            let filters = FilterArgs::from(&list.filters).to_filters(FilterState::default())?;
            let mut session = NewsSession::new(settings.endpoint, filters);
            if let Some(plan) = session.plan_articles() {
                let fetched = execute(transport.as_ref(), plan).await;
                session.apply(fetched);
            }
            session.articles_mut().go_to_page(list.output.page);
            emit(&list.output, session.articles(), session.filters(), |feed, filters| {
                format!(
                    "{}\n{}",
                    text::FilterBar(filters),
                    text::ArticlesView { feed, filters }
                )
            })?;
        }
        Command::Browse(browse_args) => {
            let filters = browse_args.filters.to_filters(FilterState::default())?;
            let session = NewsSession::new(settings.endpoint, filters);
            browse::run(session, transport).await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// Print one page as JSON or text. A failed fetch still prints its view but
/// makes the process exit non-zero.
fn emit<T: serde::Serialize>(
    output: &PageArgs,
    feed: &Feed<T>,
    filters: &FilterState,
    render_text: impl FnOnce(&Feed<T>, &FilterState) -> String,
) -> Result<(), Box<dyn Error>> {
    if output.json {
        println!("{}", json::page_to_json(feed, filters)?);
    } else {
        print!("{}", render_text(feed, filters));
    }
    match feed.error() {
        Some(e) => Err(e.clone().into()),
        None => Ok(()),
    }
}
