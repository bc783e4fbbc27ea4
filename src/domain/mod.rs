pub mod cache_entry;
pub mod category;
pub mod feed_source;
pub mod news_item;

pub use cache_entry::CacheEntry;
pub use category::Category;
pub use feed_source::FeedSource;
pub use news_item::NewsItem;
