use opml::{Outline, OPML};
use url::Url;

use crate::domain::{Category, FeedSource};
use crate::errors::{NewsError, NewsResult};

/// Feeds read when no OPML list is configured.
const BUILTIN_FEEDS: &[(&str, &str, Category)] = &[
    ("חדשות 12", "https://storage.googleapis.com/mako-sitemaps/rssWebSub.xml", Category::General),
    ("חדשות 13", "https://13tv.co.il/feed/", Category::General),
    ("וואלה חדשות", "https://rss.walla.co.il/feed/1?type=main", Category::General),
    ("YNET חדשות", "https://www.ynet.co.il/Integration/StoryRss2.xml", Category::General),
    ("מעריב אונליין", "https://www.maariv.co.il/rss/rssfeeds", Category::General),
    ("ישראל היום", "https://www.israelhayom.co.il/rss", Category::General),
    ("הארץ", "https://www.haaretz.co.il/srv/htz---all-articles", Category::General),
    ("ספורט 5", "https://sport5.co.il/rss/feed", Category::Sports),
    ("ONE ספורט", "https://www.one.co.il/cat/coop/xml/rss/newsfeed.aspx", Category::Sports),
    ("וואלה תרבות", "https://rss.walla.co.il/feed/3?type=main", Category::Entertainment),
    ("YNET תרבות", "https://www.ynet.co.il/Integration/StoryRss3011.xml", Category::Entertainment),
];

/// The static list of feeds to aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRegistry {
    feeds: Vec<FeedSource>,
}

impl FeedRegistry {
    pub fn new(feeds: Vec<FeedSource>) -> Self {
        Self { feeds }
    }

    pub fn builtin() -> Self {
        let feeds = BUILTIN_FEEDS
            .iter()
            .map(|(name, url, category)| FeedSource::new(*name, *url, *category))
            .collect();
        Self { feeds }
    }

    /// Uses the OPML file at `path` when given, the built-in list otherwise.
    pub fn load(path: Option<&str>) -> NewsResult<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                let registry = Self::from_opml(&content)?;
                if registry.feeds.is_empty() {
                    return Err(NewsError::Config(format!("No feeds found in {}", path)));
                }
                Ok(registry)
            }
            None => Ok(Self::builtin()),
        }
    }

    /// Reads feeds from OPML outlines carrying an `xmlUrl`.
    ///
    /// An outline's `category` attribute sets the feed's default category and
    /// is inherited by nested outlines that don't set their own.
    pub fn from_opml(content: &str) -> NewsResult<Self> {
        let opml = OPML::from_str(content).map_err(|e| NewsError::OpmlParse(e.to_string()))?;

        let mut feeds = Vec::new();
        collect_outlines(&opml.body.outlines, Category::General, &mut feeds);

        Ok(Self { feeds })
    }

    pub fn to_opml(&self) -> NewsResult<String> {
        let mut opml = OPML::default();
        opml.head = Some(opml::Head {
            title: Some("Newswire Feeds".to_string()),
            ..Default::default()
        });

        for feed in &self.feeds {
            let outline = Outline {
                text: feed.display_name.clone(),
                r#type: Some("rss".to_string()),
                xml_url: Some(feed.url.clone()),
                title: Some(feed.display_name.clone()),
                category: Some(feed.default_category.to_string()),
                ..Default::default()
            };
            opml.body.outlines.push(outline);
        }

        opml.to_string()
            .map_err(|e| NewsError::OpmlParse(e.to_string()))
    }

    pub fn feeds(&self) -> &[FeedSource] {
        &self.feeds
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

impl Default for FeedRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn collect_outlines(outlines: &[Outline], inherited: Category, feeds: &mut Vec<FeedSource>) {
    for outline in outlines {
        let category = outline
            .category
            .as_deref()
            .and_then(|c| c.parse::<Category>().ok())
            .unwrap_or(inherited);

        if let Some(url) = outline.xml_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            match Url::parse(url) {
                Ok(_) => {
                    let name = outline
                        .title
                        .as_deref()
                        .filter(|t| !t.trim().is_empty())
                        .unwrap_or(&outline.text)
                        .trim();
                    let name = if name.is_empty() { url } else { name };
                    feeds.push(FeedSource::new(name, url, category));
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Skipping invalid feed URL in OPML");
                }
            }
        }

        collect_outlines(&outline.outlines, category, feeds);
    }
}
