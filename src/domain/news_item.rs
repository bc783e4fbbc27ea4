use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Category;

/// One normalized article.
///
/// Built only through [`NewsItem::new`], which rejects blank titles and links,
/// so every value in circulation has both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    title: String,
    description: String,
    link: String,
    published_at: DateTime<Utc>,
    source: String,
    category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

impl NewsItem {
    /// Returns `None` when the trimmed title or link is empty.
    pub fn new(
        title: &str,
        link: &str,
        published_at: DateTime<Utc>,
        source: impl Into<String>,
    ) -> Option<Self> {
        let title = title.trim();
        let link = link.trim();
        if title.is_empty() || link.is_empty() {
            return None;
        }

        Some(Self {
            title: title.to_string(),
            description: String::new(),
            link: link.to_string(),
            published_at,
            source: source.into(),
            category: Category::General,
            image_url: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|url| !url.trim().is_empty());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}
