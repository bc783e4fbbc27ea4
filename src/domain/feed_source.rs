use serde::{Deserialize, Serialize};

use super::{Category, NewsItem};

/// A configured feed: where to fetch it and how to label what comes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub display_name: String,
    pub url: String,
    pub default_category: Category,
}

impl FeedSource {
    pub fn new(
        display_name: impl Into<String>,
        url: impl Into<String>,
        default_category: Category,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            url: url.into(),
            default_category,
        }
    }

    /// Stamps the item with this feed's label and, for feeds tagged with
    /// anything other than `general`, forces the feed's category.
    pub fn apply_to(&self, item: NewsItem) -> NewsItem {
        let item = item.with_source(self.display_name.clone());
        if self.default_category.is_general() {
            item
        } else {
            item.with_category(self.default_category)
        }
    }
}
