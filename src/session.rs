//! Session view-model: owns the filter state and both feeds, turns filter
//! changes into fetch plans, and applies fetch results.
//!
//! The session itself never awaits. Callers run the plans it returns, either
//! inline with [`execute`] or in background tasks with [`spawn_plans`], and
//! hand the results back through [`NewsSession::apply`], where each feed's
//! staleness guard drops anything a later change has superseded.

use crate::error::FetchError;
use crate::fetcher::{Completion, Feed, Ticket, Transport, fetch_listing};
use crate::filters::{FilterError, FilterEvent, FilterState};
use crate::models::{Article, Source};
use crate::query::{ApiEndpoint, QueryMemo, build_query, build_sources_query};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

/// Which list a request or result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumer {
    Sources,
    Articles,
}

/// A request the session wants issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPlan {
    Sources(Ticket),
    Articles(Ticket),
}

impl FetchPlan {
    pub fn consumer(&self) -> Consumer {
        match self {
            FetchPlan::Sources(_) => Consumer::Sources,
            FetchPlan::Articles(_) => Consumer::Articles,
        }
    }
}

/// The outcome of one executed [`FetchPlan`].
#[derive(Debug)]
pub enum Fetched {
    Sources(Ticket, Result<Vec<Source>, FetchError>),
    Articles(Ticket, Result<Vec<Article>, FetchError>),
}

impl Fetched {
    pub fn consumer(&self) -> Consumer {
        match self {
            Fetched::Sources(..) => Consumer::Sources,
            Fetched::Articles(..) => Consumer::Articles,
        }
    }
}

/// Filter state plus the sources and articles feeds it drives.
#[derive(Debug)]
pub struct NewsSession {
    endpoint: ApiEndpoint,
    filters: FilterState,
    sources: Feed<Source>,
    articles: Feed<Article>,
    sources_memo: QueryMemo,
    articles_memo: QueryMemo,
}

impl NewsSession {
    pub fn new(endpoint: ApiEndpoint, filters: FilterState) -> Self {
        NewsSession {
            endpoint,
            filters,
            sources: Feed::default(),
            articles: Feed::default(),
            sources_memo: QueryMemo::default(),
            articles_memo: QueryMemo::default(),
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sources(&self) -> &Feed<Source> {
        &self.sources
    }

    pub fn articles(&self) -> &Feed<Article> {
        &self.articles
    }

    pub fn sources_mut(&mut self) -> &mut Feed<Source> {
        &mut self.sources
    }

    pub fn articles_mut(&mut self) -> &mut Feed<Article> {
        &mut self.articles
    }

    /// Apply one filter event and plan whatever requests it makes necessary.
    ///
    /// A rejected event leaves the filters and both feeds untouched.
    pub fn update(&mut self, event: FilterEvent) -> Result<Vec<FetchPlan>, FilterError> {
        self.filters = self.filters.apply(event)?;
        Ok(self.plan())
    }

    /// Plan requests for both feeds, skipping any whose URL is unchanged.
    pub fn plan(&mut self) -> Vec<FetchPlan> {
        let mut plans = Vec::new();
        plans.extend(self.plan_sources());
        plans.extend(self.plan_articles());
        plans
    }

    pub fn plan_sources(&mut self) -> Option<FetchPlan> {
        let url = build_sources_query(&self.filters, &self.endpoint);
        if !self.sources_memo.refresh(&url) {
            debug!(%url, "Sources query unchanged; not refetching");
            return None;
        }
        Some(FetchPlan::Sources(self.sources.begin(url)))
    }

    /// Plan the article request. With no search text and no category the
    /// request is suppressed and the feed shows [`FetchError::EmptyQuery`].
    pub fn plan_articles(&mut self) -> Option<FetchPlan> {
        match build_query(&self.filters, &self.endpoint) {
            Ok(url) => {
                if !self.articles_memo.refresh(&url) {
                    debug!(%url, "Article query unchanged; not refetching");
                    return None;
                }
                Some(FetchPlan::Articles(self.articles.begin(url)))
            }
            Err(e) => {
                info!(error = %e, "Article request suppressed");
                self.articles_memo.forget();
                self.articles.fail_fast(e);
                None
            }
        }
    }

    /// Forget the last URLs so the next plan refetches both feeds.
    pub fn reload(&mut self) -> Vec<FetchPlan> {
        self.sources_memo.forget();
        self.articles_memo.forget();
        self.plan()
    }

    /// Hand a result back to the feed that requested it.
    pub fn apply(&mut self, fetched: Fetched) -> Completion {
        match fetched {
            Fetched::Sources(ticket, result) => self.sources.complete(&ticket, result),
            Fetched::Articles(ticket, result) => self.articles.complete(&ticket, result),
        }
    }
}

/// Run one plan to completion.
pub async fn execute<R: Transport>(transport: &R, plan: FetchPlan) -> Fetched {
    match plan {
        FetchPlan::Sources(ticket) => {
            let result = fetch_listing::<Source, _>(transport, ticket.url()).await;
            Fetched::Sources(ticket, result)
        }
        FetchPlan::Articles(ticket) => {
            let result = fetch_listing::<Article, _>(transport, ticket.url()).await;
            Fetched::Articles(ticket, result)
        }
    }
}

/// Run each plan in its own task; results arrive on `tx` in completion order.
pub fn spawn_plans<R>(transport: &Arc<R>, plans: Vec<FetchPlan>, tx: &UnboundedSender<Fetched>)
where
    R: Transport + Send + Sync + 'static,
{
    for plan in plans {
        debug!(consumer = ?plan.consumer(), "Spawning fetch");
        let transport = Arc::clone(transport);
        let tx = tx.clone();
        tokio::spawn(async move {
            let fetched = execute(transport.as_ref(), plan).await;
            if tx.send(fetched).is_err() {
                debug!("Session closed before response arrived");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FeedStatus;
    use crate::fetcher::testing::{FakeTransport, articles_body};
    use crate::filters::{Category, Language, SortBy};
    use std::time::Duration;
    use tokio::sync::mpsc;

    const BASE: &str = "http://proxy.test/api/";

    fn session() -> NewsSession {
        NewsSession::new(ApiEndpoint::parse(BASE).unwrap(), FilterState::default())
    }

    fn sources_body() -> &'static str {
        r#"{"status":"ok","sources":[{"id":"cnn","name":"CNN"}]}"#
    }

    #[test]
    fn test_initial_plan_requests_both_feeds() {
        let mut s = session();
        let plans = s.plan();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].consumer(), Consumer::Sources);
        assert_eq!(plans[1].consumer(), Consumer::Articles);
        assert!(s.sources().is_loading());
        assert!(s.articles().is_loading());
    }

    #[test]
    fn test_unchanged_urls_are_not_refetched() {
        let mut s = session();
        s.plan();
        assert!(s.plan().is_empty());
        // same value re-selected
        let plans = s.update(FilterEvent::SetSortBy(SortBy::PublishedAt)).unwrap();
        assert!(plans.is_empty());
    }

    #[test]
    fn test_language_change_only_touches_sources() {
        let mut s = session();
        s.plan();
        let plans = s.update(FilterEvent::SetLanguage(Language::German)).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].consumer(), Consumer::Sources);
    }

    #[test]
    fn test_sort_change_only_touches_articles() {
        let mut s = session();
        s.plan();
        let plans = s.update(FilterEvent::SetSortBy(SortBy::Popularity)).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].consumer(), Consumer::Articles);
    }

    #[test]
    fn test_empty_query_suppresses_article_request() {
        let mut s = session();
        s.plan();
        let plans = s.update(FilterEvent::SetCategory(Category::All)).unwrap();
        assert!(plans.iter().all(|p| p.consumer() == Consumer::Sources));
        assert_eq!(
            s.articles().status(),
            FeedStatus::Failed(&FetchError::EmptyQuery)
        );

        // typing a search term recovers
        let plans = s.update(FilterEvent::SetQuery("tesla".into())).unwrap();
        assert_eq!(plans.len(), 1);
        assert!(s.articles().is_loading());
    }

    #[test]
    fn test_rejected_event_changes_nothing() {
        let mut s = session();
        s.plan();
        let to = crate::filters::parse_date_bound("2024-01-01").unwrap();
        let from = crate::filters::parse_date_bound("2024-02-01").unwrap();
        s.update(FilterEvent::SetQuery("x".into())).unwrap();
        s.update(FilterEvent::SetToDate(to)).unwrap();
        let before = s.filters().clone();
        assert!(s.update(FilterEvent::SetFromDate(from)).is_err());
        assert_eq!(s.filters(), &before);
    }

    #[tokio::test]
    async fn test_execute_inline() {
        let transport = FakeTransport::default()
            .route(
                "http://proxy.test/api/sources?country=us&category=business",
                Duration::ZERO,
                200,
                sources_body(),
            )
            .route(
                "http://proxy.test/api/top-headlines?category=business&sortBy=publishedAt",
                Duration::ZERO,
                200,
                &articles_body(&["a", "b", "c"]),
            );
        let mut s = session();
        for plan in s.plan() {
            let fetched = execute(&transport, plan).await;
            assert_eq!(s.apply(fetched), Completion::Applied);
        }
        assert_eq!(s.sources().items().len(), 1);
        assert_eq!(s.articles().items().len(), 3);
        assert_eq!(s.articles().status(), FeedStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_response_does_not_overwrite_newer() {
        let transport = Arc::new(
            FakeTransport::default()
                .route(
                    "http://proxy.test/api/top-headlines?category=business&sortBy=publishedAt",
                    Duration::from_millis(500),
                    200,
                    &articles_body(&["business 1", "business 2"]),
                )
                .route(
                    "http://proxy.test/api/top-headlines?category=sports&sortBy=publishedAt",
                    Duration::from_millis(20),
                    200,
                    &articles_body(&["sports 1"]),
                ),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut s = session();

        let plans: Vec<_> = s
            .plan()
            .into_iter()
            .filter(|p| p.consumer() == Consumer::Articles)
            .collect();
        spawn_plans(&transport, plans, &tx);

        let plans: Vec<_> = s
            .update(FilterEvent::SetCategory(Category::Sports))
            .unwrap()
            .into_iter()
            .filter(|p| p.consumer() == Consumer::Articles)
            .collect();
        spawn_plans(&transport, plans, &tx);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.consumer(), Consumer::Articles);
        assert_eq!(s.apply(first), Completion::Applied);
        assert_eq!(s.articles().items()[0].title, "sports 1");

        let late = rx.recv().await.unwrap();
        assert_eq!(s.apply(late), Completion::Stale);
        assert_eq!(s.articles().items().len(), 1);
        assert_eq!(s.articles().items()[0].title, "sports 1");
        assert!(!s.articles().is_loading());
        assert_eq!(transport.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_decode_failure_keeps_result_set() {
        let transport = FakeTransport::default()
            .route(
                "http://proxy.test/api/top-headlines?category=business&sortBy=publishedAt",
                Duration::ZERO,
                200,
                &articles_body(&["kept"]),
            )
            .route(
                "http://proxy.test/api/top-headlines?category=health&sortBy=publishedAt",
                Duration::ZERO,
                200,
                r#"{"status":"error"}"#,
            );
        let mut s = session();
        let plan = s.plan_articles().unwrap();
        let fetched = execute(&transport, plan).await;
        s.apply(fetched);

        let plan = s
            .update(FilterEvent::SetCategory(Category::Health))
            .unwrap()
            .into_iter()
            .find(|p| p.consumer() == Consumer::Articles)
            .unwrap();
        let fetched = execute(&transport, plan).await;
        assert_eq!(s.apply(fetched), Completion::Applied);

        assert!(matches!(
            s.articles().status(),
            FeedStatus::Failed(FetchError::InvalidFormat(_))
        ));
        assert!(!s.articles().is_loading());
        assert_eq!(s.articles().items()[0].title, "kept");
    }

    #[tokio::test]
    async fn test_new_results_reset_page() {
        let titles_25: Vec<String> = (1..=25).map(|i| format!("story {i}")).collect();
        let titles_25: Vec<&str> = titles_25.iter().map(String::as_str).collect();
        let transport = FakeTransport::default()
            .route(
                "http://proxy.test/api/top-headlines?category=business&sortBy=publishedAt",
                Duration::ZERO,
                200,
                &articles_body(&titles_25),
            )
            .route(
                "http://proxy.test/api/top-headlines?category=science&sortBy=publishedAt",
                Duration::ZERO,
                200,
                &articles_body(&["a", "b", "c", "d", "e"]),
            );
        let mut s = session();
        let plan = s.plan_articles().unwrap();
        s.apply(execute(&transport, plan).await);
        assert_eq!(s.articles_mut().go_to_page(3), 3);
        assert_eq!(s.articles().page().items.len(), 5);

        let plan = s
            .update(FilterEvent::SetCategory(Category::Science))
            .unwrap()
            .into_iter()
            .find(|p| p.consumer() == Consumer::Articles)
            .unwrap();
        s.apply(execute(&transport, plan).await);
        assert_eq!(s.articles().pagination().current_page(), 1);
        assert_eq!(s.articles().page().items.len(), 5);
        assert_eq!(s.articles().page().total_pages, 1);
    }

    #[test]
    fn test_reload_replans_everything() {
        let mut s = session();
        s.plan();
        assert!(s.plan().is_empty());
        assert_eq!(s.reload().len(), 2);
    }
}
