use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::domain::{Category, FeedSource, NewsItem};
use crate::errors::{NewsError, NewsResult};
use crate::parsing::parse_feed;
use crate::sources::Transport;

pub const DEFAULT_RESULT_CAP: usize = 20;
pub const DEFAULT_CONCURRENCY: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub result_cap: usize,
    pub per_feed_limit: Option<usize>,
    pub concurrency: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            result_cap: DEFAULT_RESULT_CAP,
            per_feed_limit: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// What one feed's fetch-and-parse pipeline produced.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: FeedSource,
    pub result: NewsResult<Vec<NewsItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source_name: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct AggregateReport {
    pub items: Vec<NewsItem>,
    pub succeeded: usize,
    pub failures: Vec<SourceFailure>,
    /// True when nothing usable came back and `items` is the placeholder.
    pub is_fallback: bool,
}

pub struct Aggregator<T: Transport> {
    transport: Arc<T>,
    options: AggregateOptions,
}

impl<T: Transport + 'static> Aggregator<T> {
    pub fn new(transport: T, options: AggregateOptions) -> Self {
        Self {
            transport: Arc::new(transport),
            options,
        }
    }

    /// Runs every feed's pipeline, at most `concurrency` at a time, and
    /// returns one outcome per source in the order the sources were given.
    ///
    /// Each pipeline runs in its own task so a panic in one feed surfaces as
    /// that feed's error instead of tearing down the batch.
    pub async fn collect(&self, sources: &[FeedSource]) -> Vec<SourceOutcome> {
        let per_feed_limit = self.options.per_feed_limit;

        stream::iter(sources.iter().cloned())
            .map(|source| {
                let transport = Arc::clone(&self.transport);
                async move {
                    let task_source = source.clone();
                    let handle = tokio::spawn(async move {
                        fetch_source(transport.as_ref(), &task_source, per_feed_limit).await
                    });

                    let result = match handle.await {
                        Ok(result) => result,
                        Err(e) => Err(NewsError::Task {
                            source_name: source.display_name.clone(),
                            reason: e.to_string(),
                        }),
                    };

                    match &result {
                        Ok(items) => {
                            tracing::debug!(feed = %source.display_name, items = items.len(), "Feed fetched")
                        }
                        Err(e) => tracing::warn!(
                            feed = %source.display_name,
                            error = %e,
                            "Feed failed, continuing with the rest"
                        ),
                    }

                    SourceOutcome { source, result }
                }
            })
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await
    }

    /// Fetches all sources and merges them into one capped, newest-first list.
    pub async fn aggregate(&self, sources: &[FeedSource]) -> AggregateReport {
        let outcomes = self.collect(sources).await;
        merge_outcomes(outcomes, self.options.result_cap, Utc::now())
    }

    /// The merged items alone; never empty.
    pub async fn aggregate_all(&self, sources: &[FeedSource]) -> Vec<NewsItem> {
        self.aggregate(sources).await.items
    }
}

/// Fetches and parses one feed, labelling items with the feed's identity.
pub async fn fetch_source<T: Transport + ?Sized>(
    transport: &T,
    source: &FeedSource,
    per_feed_limit: Option<usize>,
) -> NewsResult<Vec<NewsItem>> {
    let body = transport.fetch_text(&source.url).await?;

    let mut items = parse_feed(&body, &source.display_name);
    if let Some(limit) = per_feed_limit {
        items.truncate(limit);
    }

    Ok(items.into_iter().map(|item| source.apply_to(item)).collect())
}

/// Concatenates successful outcomes in source order, drops repeated links,
/// sorts newest first (stable, so ties keep source order) and caps the list.
/// An empty merge is replaced by [`fallback_items`].
pub fn merge_outcomes(
    outcomes: Vec<SourceOutcome>,
    result_cap: usize,
    now: DateTime<Utc>,
) -> AggregateReport {
    let mut items = Vec::new();
    let mut succeeded = 0;
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome.result {
            Ok(source_items) => {
                succeeded += 1;
                items.extend(source_items);
            }
            Err(e) => failures.push(SourceFailure {
                source_name: outcome.source.display_name,
                error: e.to_string(),
            }),
        }
    }

    let mut items = dedupe_by_link(items);
    items.sort_by(|a, b| b.published_at().cmp(&a.published_at()));
    items.truncate(result_cap.max(1));

    let is_fallback = items.is_empty();
    if is_fallback {
        tracing::warn!(failed = failures.len(), "No items from any feed, serving placeholder");
        items = fallback_items(now);
    }

    AggregateReport {
        items,
        succeeded,
        failures,
        is_fallback,
    }
}

fn dedupe_by_link(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.link().trim_end_matches('/').to_string()))
        .collect()
}

/// Placeholder shown when no feed produced anything.
pub fn fallback_items(now: DateTime<Utc>) -> Vec<NewsItem> {
    NewsItem::new(
        "טכנולוגיה חדשה בישראל מובילה בעולם",
        "https://example.com/tech-news",
        now,
        "חדשות דמו",
    )
    .map(|item| {
        item.with_description(
            "חברות טכנולוגיה ישראליות ממשיכות לחדש ולהוביל בשווקים עולמיים עם פתרונות מתקדמים",
        )
        .with_category(Category::General)
    })
    .into_iter()
    .collect()
}
