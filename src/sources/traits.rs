use async_trait::async_trait;

use crate::errors::NewsResult;

/// Fetches raw feed documents.
///
/// Every failure comes back as [`crate::errors::NewsError::Transport`] naming
/// the requested URL, so callers can report it per feed and move on.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch_text(&self, url: &str) -> NewsResult<String>;
}
