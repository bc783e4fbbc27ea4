use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::domain::NewsItem;
use crate::parsing::categorizer::categorize;
use crate::parsing::date::parse_date_or;
use crate::parsing::image::{resolve_image, MediaRef};
use crate::parsing::markup::{decode_entities, first_img_src, strip_markup};

/// Element kinds the parser reacts to. Everything else is `Ignored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Entry,
    Title,
    Link,
    Published,
    Updated,
    Description,
    Content,
    Enclosure,
    MediaContent,
    MediaThumbnail,
    Ignored,
}

impl TagKind {
    fn classify(name: &str) -> Self {
        let name = name.strip_prefix("atom:").unwrap_or(name);
        match name {
            "item" | "entry" => TagKind::Entry,
            "title" => TagKind::Title,
            "link" => TagKind::Link,
            "pubdate" | "published" | "dc:date" => TagKind::Published,
            "updated" => TagKind::Updated,
            "description" | "summary" => TagKind::Description,
            "content:encoded" | "content" => TagKind::Content,
            "enclosure" => TagKind::Enclosure,
            "media:content" => TagKind::MediaContent,
            "media:thumbnail" => TagKind::MediaThumbnail,
            _ => TagKind::Ignored,
        }
    }
}

/// Text-bearing fields collected from direct children of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Title,
    Link,
    Published,
    Updated,
    Description,
    Content,
}

impl TextField {
    fn for_kind(kind: TagKind) -> Option<Self> {
        match kind {
            TagKind::Title => Some(TextField::Title),
            TagKind::Link => Some(TextField::Link),
            TagKind::Published => Some(TextField::Published),
            TagKind::Updated => Some(TextField::Updated),
            TagKind::Description => Some(TextField::Description),
            TagKind::Content => Some(TextField::Content),
            _ => None,
        }
    }
}

struct Capture {
    field: TextField,
    /// Index of the captured element in the open-element stack.
    index: usize,
    text: String,
}

#[derive(Default)]
struct EntryDraft {
    title: Option<String>,
    link: Option<String>,
    fallback_link: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    description: Option<String>,
    content: Option<String>,
    enclosure: Option<MediaRef>,
    media: Option<MediaRef>,
    thumbnail: Option<MediaRef>,
    /// First `<img>` written as markup inside a description or content body.
    inline_image: Option<String>,
}

impl EntryDraft {
    fn set_text(&mut self, field: TextField, text: String) {
        let slot = match field {
            TextField::Title => &mut self.title,
            TextField::Link => &mut self.link,
            TextField::Published => &mut self.published,
            TextField::Updated => &mut self.updated,
            TextField::Description => &mut self.description,
            TextField::Content => &mut self.content,
        };
        fill(slot, text);
    }

    /// Reads attribute-carried data. Returns true when the element supplied
    /// its value through attributes, so its text content should be skipped.
    fn absorb_attributes(&mut self, kind: TagKind, e: &BytesStart<'_>) -> bool {
        match kind {
            TagKind::Link => {
                let Some(href) = attribute(e, "href") else {
                    return false;
                };
                let rel = attribute(e, "rel").map(|r| r.to_ascii_lowercase());
                match rel.as_deref() {
                    None | Some("alternate") => fill(&mut self.link, href),
                    Some("enclosure") => {
                        let candidate = MediaRef::new(href, attribute(e, "type"));
                        offer(&mut self.enclosure, candidate, MediaRef::is_image);
                    }
                    Some(_) => fill(&mut self.fallback_link, href),
                }
                true
            }
            TagKind::Enclosure => {
                if let Some(url) = attribute(e, "url") {
                    let candidate = MediaRef::new(url, attribute(e, "type"));
                    offer(&mut self.enclosure, candidate, MediaRef::is_image);
                }
                true
            }
            TagKind::MediaContent | TagKind::MediaThumbnail => {
                if let Some(url) = attribute(e, "url") {
                    let mime_type = attribute(e, "type").or_else(|| {
                        attribute(e, "medium")
                            .filter(|m| m.eq_ignore_ascii_case("image"))
                            .map(|_| "image".to_string())
                    });
                    let candidate = MediaRef::new(url, mime_type);
                    let slot = if kind == TagKind::MediaContent {
                        &mut self.media
                    } else {
                        &mut self.thumbnail
                    };
                    offer(slot, candidate, MediaRef::is_image_or_untyped);
                }
                true
            }
            _ => false,
        }
    }

    fn into_item(self, source_label: &str, now: DateTime<Utc>) -> Option<NewsItem> {
        let title = self.title.unwrap_or_default();
        let link = self.link.or(self.fallback_link).unwrap_or_default();
        if title.trim().is_empty() || link.trim().is_empty() {
            return None;
        }

        let description_html = self
            .description
            .or_else(|| self.content.clone())
            .unwrap_or_default();
        let description = strip_markup(&description_html);

        let media = match self.media {
            Some(media) if media.is_image_or_untyped() => Some(media),
            other => self.thumbnail.or(other),
        };
        let image_url = resolve_image(self.enclosure.as_ref(), media.as_ref(), &description_html)
            .or_else(|| self.content.as_deref().and_then(first_img_src))
            .or(self.inline_image);

        let published_at = self
            .published
            .or(self.updated)
            .map(|raw| parse_date_or(&raw, now))
            .unwrap_or(now);

        let category = categorize(&title, &description);

        NewsItem::new(&title, &link, published_at, source_label).map(|item| {
            item.with_description(description)
                .with_category(category)
                .with_image_url(image_url)
        })
    }
}

/// Keeps the first non-blank value.
fn fill(slot: &mut Option<String>, value: String) {
    if slot.is_none() && !value.trim().is_empty() {
        *slot = Some(value);
    }
}

/// Keeps the first candidate, replacing it only when a later one qualifies
/// and the current one does not.
fn offer(slot: &mut Option<MediaRef>, candidate: MediaRef, qualifies: fn(&MediaRef) -> bool) {
    let replace = match slot {
        None => true,
        Some(current) => !qualifies(current) && qualifies(&candidate),
    };
    if replace {
        *slot = Some(candidate);
    }
}

/// Attribute value with entities resolved. Values that aren't valid XML
/// (a bare `&`, HTML-only entities) are kept from the raw bytes.
fn attribute(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(key.as_bytes()))
        .map(|attr| match attr.unescape_value() {
            Ok(value) => value.trim().to_string(),
            Err(_) => decode_entities(&String::from_utf8_lossy(&attr.value)).trim().to_string(),
        })
        .filter(|v| !v.is_empty())
}

/// Records the `src` of an unescaped `<img>` element nested in a description
/// or content body, which arrives as markup events rather than text.
fn note_inline_image(draft: &mut EntryDraft, capture: Option<&Capture>, e: &BytesStart<'_>) {
    let in_body = capture.is_some_and(|c| matches!(c.field, TextField::Description | TextField::Content));
    let name = element_name(e);
    let is_img = name == "img" || name.ends_with(":img");
    if in_body && is_img && draft.inline_image.is_none() {
        draft.inline_image = attribute(e, "src");
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_lowercase()
}

/// Parses an RSS or Atom document into news items, stamping each with
/// `source_label`. Unparseable dates resolve to the current instant.
pub fn parse_feed(raw: &str, source_label: &str) -> Vec<NewsItem> {
    parse_feed_at(raw, source_label, Utc::now())
}

/// Like [`parse_feed`], with an explicit instant for undated entries.
///
/// Never fails: entries lacking a title or link are dropped, unknown elements
/// are ignored and a document that breaks mid-way yields the entries that
/// were complete before the break.
pub fn parse_feed_at(raw: &str, source_label: &str, now: DateTime<Utc>) -> Vec<NewsItem> {
    let mut reader = Reader::from_str(raw);
    reader.config_mut().check_end_names = false;

    let mut items = Vec::new();
    let mut dropped = 0usize;
    // Lower-cased names of currently open elements
    let mut open: Vec<String> = Vec::new();
    // Draft plus the index of its entry element in `open`
    let mut entry: Option<(EntryDraft, usize)> = None;
    let mut capture: Option<Capture> = None;

    let mut finish = |draft: EntryDraft, items: &mut Vec<NewsItem>| match draft.into_item(source_label, now) {
        Some(item) => items.push(item),
        None => dropped += 1,
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(&e);
                let kind = TagKind::classify(&name);
                open.push(name);

                if kind == TagKind::Entry {
                    if let Some((draft, _)) = entry.take() {
                        finish(draft, &mut items);
                    }
                    capture = None;
                    entry = Some((EntryDraft::default(), open.len() - 1));
                    continue;
                }

                if let Some((draft, entry_index)) = entry.as_mut() {
                    note_inline_image(draft, capture.as_ref(), &e);
                    let from_attributes = draft.absorb_attributes(kind, &e);
                    let direct_child = open.len() == *entry_index + 2;
                    if direct_child && capture.is_none() && !from_attributes {
                        if let Some(field) = TextField::for_kind(kind) {
                            capture = Some(Capture {
                                field,
                                index: open.len() - 1,
                                text: String::new(),
                            });
                        }
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some((draft, _)) = entry.as_mut() {
                    note_inline_image(draft, capture.as_ref(), &e);
                    let kind = TagKind::classify(&element_name(&e));
                    draft.absorb_attributes(kind, &e);
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(capture) = capture.as_mut() {
                    match t.unescape() {
                        Ok(text) => capture.text.push_str(&text),
                        Err(_) => capture.text.push_str(&decode_entities(&String::from_utf8_lossy(&t))),
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(capture) = capture.as_mut() {
                    capture.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                // Stray closing tags are ignored; a match closes everything above it
                let Some(position) = open.iter().rposition(|open_name| *open_name == name) else {
                    continue;
                };

                if capture.as_ref().is_some_and(|c| c.index >= position) {
                    if let (Some(done), Some((draft, _))) = (capture.take(), entry.as_mut()) {
                        draft.set_text(done.field, done.text);
                    }
                }

                if entry.as_ref().is_some_and(|(_, index)| *index >= position) {
                    if let Some((draft, _)) = entry.take() {
                        finish(draft, &mut items);
                    }
                }

                open.truncate(position);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(
                    source = %source_label,
                    position = reader.buffer_position(),
                    error = %e,
                    "Feed document malformed, keeping entries parsed so far"
                );
                break;
            }
            _ => {}
        }
    }

    if dropped > 0 {
        tracing::debug!(source = %source_label, dropped, "Entries without title or link dropped");
    }

    items
}
