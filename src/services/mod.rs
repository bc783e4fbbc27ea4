pub mod aggregate_service;
pub mod cache_service;
pub mod news_service;

pub use aggregate_service::{AggregateOptions, AggregateReport, Aggregator, SourceOutcome};
pub use cache_service::OfflineCache;
pub use news_service::{Headlines, NewsService, Origin};
