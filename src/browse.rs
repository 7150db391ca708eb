//! Interactive browser.
//!
//! Reads one command per line from stdin and re-renders after every change.
//! Filter commands map onto [`FilterEvent`]s; the resulting fetches run in
//! background tasks and report back over a channel, so typing stays
//! responsive while a slow request is in flight. Responses to superseded
//! requests are dropped by the session.

use crate::fetcher::{Completion, Transport};
use crate::filters::{
    Category, CountryCode, FilterError, FilterEvent, Language, SortBy, parse_date_bound,
};
use crate::outputs::text::{ArticlesView, FilterBar, SourcesView};
use crate::session::{Consumer, FetchPlan, NewsSession, execute, spawn_plans};
use futures::future::join_all;
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

pub const HELP: &str = "\
Commands:
  search <text>        keyword search (everything endpoint)
  clear                clear the search text, back to category headlines
  category <name>      all, business, entertainment, general, health, science, sports, technology
  language <code>      all, ar, de, en, es, fr, it, nl, pt, ru, zh (sources)
  country <code>       two-letter country code (sources)
  sort <order>         publishedAt, relevancy, popularity
  from <date|->        earliest date, YYYY-MM-DD, '-' to unset
  to <date|->          latest date, YYYY-MM-DD, '-' to unset
  page <n> | next | prev
  articles | sources   switch the listing shown
  reload               refetch even if nothing changed
  help | quit";

/// Invalid input at the prompt.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid page number '{0}'")]
    InvalidPage(String),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// One parsed prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Filter(FilterEvent),
    Page(usize),
    Next,
    Prev,
    Show(Consumer),
    Reload,
    Help,
    Quit,
}

impl BrowseCommand {
    /// Parse a prompt line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Result<Self, CommandError>> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };
        Some(Self::parse_words(&word.to_ascii_lowercase(), rest))
    }

    fn parse_words(word: &str, rest: &str) -> Result<Self, CommandError> {
        let arg = |name: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument(name))
            } else {
                Ok(rest)
            }
        };
        let event = match word {
            "search" | "q" => FilterEvent::SetQuery(arg("search")?.to_string()),
            "clear" => FilterEvent::SetQuery(String::new()),
            "category" => FilterEvent::SetCategory(arg("category")?.parse::<Category>()?),
            "language" | "lang" => FilterEvent::SetLanguage(arg("language")?.parse::<Language>()?),
            "country" => FilterEvent::SetCountry(arg("country")?.parse::<CountryCode>()?),
            "sort" => FilterEvent::SetSortBy(arg("sort")?.parse::<SortBy>()?),
            "from" => FilterEvent::SetFromDate(parse_date_bound(arg("from")?)?),
            "to" => FilterEvent::SetToDate(parse_date_bound(arg("to")?)?),
            "page" => {
                let n = arg("page")?;
                return n
                    .parse::<usize>()
                    .map(BrowseCommand::Page)
                    .map_err(|_| CommandError::InvalidPage(n.to_string()));
            }
            "next" | "n" => return Ok(BrowseCommand::Next),
            "prev" | "p" => return Ok(BrowseCommand::Prev),
            "articles" | "show" => return Ok(BrowseCommand::Show(Consumer::Articles)),
            "sources" => return Ok(BrowseCommand::Show(Consumer::Sources)),
            "reload" => return Ok(BrowseCommand::Reload),
            "help" | "?" => return Ok(BrowseCommand::Help),
            "quit" | "exit" => return Ok(BrowseCommand::Quit),
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(BrowseCommand::Filter(event))
    }
}

/// What a handled command asks the loop to do next.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Render(Vec<FetchPlan>),
    Help,
    Quit,
}

/// Session plus the listing currently on screen.
struct Browser {
    session: NewsSession,
    showing: Consumer,
}

impl Browser {
    fn handle(&mut self, command: BrowseCommand) -> Result<Outcome, CommandError> {
        let plans = match command {
            BrowseCommand::Filter(event) => self.session.update(event)?,
            BrowseCommand::Page(n) => {
                self.go(|s, showing| match showing {
                    Consumer::Articles => s.articles_mut().go_to_page(n),
                    Consumer::Sources => s.sources_mut().go_to_page(n),
                });
                Vec::new()
            }
            BrowseCommand::Next => {
                self.go(|s, showing| match showing {
                    Consumer::Articles => s.articles_mut().next_page(),
                    Consumer::Sources => s.sources_mut().next_page(),
                });
                Vec::new()
            }
            BrowseCommand::Prev => {
                self.go(|s, showing| match showing {
                    Consumer::Articles => s.articles_mut().prev_page(),
                    Consumer::Sources => s.sources_mut().prev_page(),
                });
                Vec::new()
            }
            BrowseCommand::Show(consumer) => {
                self.showing = consumer;
                Vec::new()
            }
            BrowseCommand::Reload => self.session.reload(),
            BrowseCommand::Help => return Ok(Outcome::Help),
            BrowseCommand::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Render(plans))
    }

    fn go(&mut self, step: impl FnOnce(&mut NewsSession, Consumer) -> usize) {
        let page = step(&mut self.session, self.showing);
        debug!(page, showing = ?self.showing, "Page changed");
    }

    fn screen(&self) -> String {
        let listing = match self.showing {
            Consumer::Articles => ArticlesView {
                feed: self.session.articles(),
                filters: self.session.filters(),
            }
            .to_string(),
            Consumer::Sources => SourcesView {
                feed: self.session.sources(),
            }
            .to_string(),
        };
        format!("\n{}\n{}", FilterBar(self.session.filters()), listing)
    }
}

fn prompt() -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    write!(out, "newsdesk> ")?;
    out.flush()
}

/// Run the interactive loop until `quit` or end of input.
#[instrument(level = "info", skip_all)]
pub async fn run<R>(session: NewsSession, transport: Arc<R>) -> Result<(), Box<dyn Error>>
where
    R: Transport + Send + Sync + 'static,
{
    let mut browser = Browser {
        session,
        showing: Consumer::Articles,
    };

    // first screen waits for the initial load
    let plans = browser.session.plan();
    let results = join_all(plans.into_iter().map(|plan| execute(transport.as_ref(), plan))).await;
    for fetched in results {
        browser.session.apply(fetched);
    }
    println!("{}", browser.screen());
    println!("Type 'help' for commands.");
    prompt()?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("End of input; leaving browser");
                    break;
                };
                match BrowseCommand::parse(&line) {
                    None => {}
                    Some(Err(e)) => println!("{}", e),
                    Some(Ok(command)) => match browser.handle(command) {
                        Ok(Outcome::Quit) => break,
                        Ok(Outcome::Help) => println!("{}", HELP),
                        Ok(Outcome::Render(plans)) => {
                            spawn_plans(&transport, plans, &tx);
                            println!("{}", browser.screen());
                        }
                        Err(e) => println!("{}", e),
                    },
                }
                prompt()?;
            }
            Some(fetched) = rx.recv() => {
                let consumer = fetched.consumer();
                if browser.session.apply(fetched) == Completion::Applied && consumer == browser.showing {
                    println!("{}", browser.screen());
                    prompt()?;
                }
            }
        }
    }
    Ok(())
}
