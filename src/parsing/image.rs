use super::markup::first_img_src;

/// A URL plus the declared MIME type of an attached media element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub url: String,
    pub mime_type: Option<String>,
}

impl MediaRef {
    pub fn new(url: impl Into<String>, mime_type: Option<String>) -> Self {
        Self {
            url: url.into(),
            mime_type,
        }
    }

    fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }

    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|t| t.trim().to_ascii_lowercase().starts_with("image"))
    }

    pub fn is_image_or_untyped(&self) -> bool {
        match self.mime_type.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(_) => self.is_image(),
        }
    }
}

/// Picks a representative image for an entry.
///
/// Preference: an image-typed enclosure, then a media element that is an
/// image or carries no type, then the first `<img>` in the description.
pub fn resolve_image(
    enclosure: Option<&MediaRef>,
    media: Option<&MediaRef>,
    description_html: &str,
) -> Option<String> {
    if let Some(enclosure) = enclosure.filter(|e| e.has_url() && e.is_image()) {
        return Some(enclosure.url.trim().to_string());
    }

    if let Some(media) = media.filter(|m| m.has_url() && m.is_image_or_untyped()) {
        return Some(media.url.trim().to_string());
    }

    first_img_src(description_html)
}
