//! Text sanitizing and media embedding for chat bodies.
//!
//! DESIGN
//! ======
//! A pure four-stage pipeline:
//!
//! 1. `sanitize_text` strips every tag (dropping `script`/`style` contents)
//!    and yields escaped text.
//! 2. `embed_media_placeholders` rewrites bare image, video and YouTube
//!    URLs into `[MEDIA:kind:url]` tokens.
//! 3. `expand_placeholders` turns tokens into fixed `<img>`, `<video>` or
//!    `<iframe>` fragments, or an inert marker when the URL is not
//!    `http(s)`.
//! 4. `sanitize_html` runs the whitelist sanitizer over the result.
//!
//! The whitelist in stage 4 is the last word: no tag or attribute outside it
//! survives even if an earlier stage misbehaves. Users can type placeholder
//! tokens directly; stage 3 validates them like any other.

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

use std::collections::HashSet;
use std::sync::OnceLock;

use ammonia::{Builder, UrlRelative};
use regex::{Captures, Regex};
use url::Url;

const ALLOWED_TAGS: [&str; 11] = ["b", "i", "em", "strong", "a", "br", "p", "img", "video", "iframe", "span"];
const ALLOWED_ATTRIBUTES: [&str; 10] = [
    "href",
    "target",
    "src",
    "alt",
    "class",
    "loading",
    "controls",
    "frameborder",
    "allowfullscreen",
    "allow",
];
const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

pub const INVALID_MEDIA_HTML: &str = r#"<span class="media-invalid">[Invalid media URL]</span>"#;

// =============================================================================
// SEGMENTS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    YouTube,
    Video,
}

impl MediaKind {
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::YouTube => "youtube",
            Self::Video => "video",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "image" => Some(Self::Image),
            "youtube" => Some(Self::YouTube),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

/// One piece of a processed message, for renderers that do not speak HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Plain text with HTML entities decoded.
    Text(String),
    Media { kind: MediaKind, url: String },
    InvalidMedia,
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Strip all markup. The result is escaped text, safe to embed in HTML.
///
/// Idempotent: `sanitize_text(&sanitize_text(x)) == sanitize_text(x)`.
#[must_use]
pub fn sanitize_text(raw: &str) -> String {
    let mut builder = Builder::empty();
    builder.clean_content_tags(HashSet::from(["script", "style"])).strip_comments(true);
    builder.clean(raw).to_string()
}

/// Whitelist sanitizer for rendered fragments.
#[must_use]
pub fn sanitize_html(html: &str) -> String {
    let mut builder = Builder::empty();
    builder
        .tags(HashSet::from(ALLOWED_TAGS))
        .generic_attributes(HashSet::from(ALLOWED_ATTRIBUTES))
        .url_schemes(HashSet::from(ALLOWED_SCHEMES))
        .url_relative(UrlRelative::Deny)
        .link_rel(None)
        .clean_content_tags(HashSet::from(["script", "style"]))
        .strip_comments(true);
    builder.clean(html).to_string()
}

/// Escape arbitrary text for HTML text or attribute positions.
#[must_use]
pub fn escape_html(text: &str) -> String {
    ammonia::clean_text(text)
}

/// Rewrite bare media URLs in sanitized text into placeholder tokens.
#[must_use]
pub fn embed_media_placeholders(text: &str) -> String {
    url_candidate_re()
        .replace_all(text, |caps: &Captures<'_>| classify_url(&caps[0]))
        .into_owned()
}

/// Expand placeholder tokens into constrained HTML.
#[must_use]
pub fn expand_placeholders(text: &str) -> String {
    placeholder_re()
        .replace_all(text, |caps: &Captures<'_>| {
            let Some(kind) = MediaKind::from_tag(&caps[1]) else {
                return caps[0].to_owned();
            };
            match validate_media_url(&caps[2]) {
                Some(url) => media_html(kind, &url),
                None => INVALID_MEDIA_HTML.to_owned(),
            }
        })
        .into_owned()
}

/// Full pipeline: strip markup, detect media, expand, re-sanitize.
#[must_use]
pub fn process_message(raw: &str) -> String {
    let text = sanitize_text(raw);
    let with_placeholders = embed_media_placeholders(&text);
    let html = expand_placeholders(&with_placeholders);
    sanitize_html(&html)
}

/// Same pipeline as [`process_message`], stopping before HTML expansion.
#[must_use]
pub fn message_segments(raw: &str) -> Vec<Segment> {
    let text = embed_media_placeholders(&sanitize_text(raw));
    let mut segments = Vec::new();
    let mut cursor = 0;

    for caps in placeholder_re().captures_iter(&text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_text(&mut segments, &text[cursor..whole.start()]);
        cursor = whole.end();

        match (MediaKind::from_tag(&caps[1]), validate_media_url(&caps[2])) {
            (Some(kind), Some(url)) => segments.push(Segment::Media { kind, url: decode_entities(&url) }),
            _ => segments.push(Segment::InvalidMedia),
        }
    }
    push_text(&mut segments, &text[cursor..]);
    segments
}

/// Accept only absolute `http`/`https` URLs; returns the normalized form.
#[must_use]
pub fn validate_media_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

// =============================================================================
// HELPERS
// =============================================================================

fn classify_url(candidate: &str) -> String {
    if let Some(m) = image_re().find(candidate) {
        return placeholder_or_raw(MediaKind::Image, m.as_str(), &candidate[m.end()..]);
    }
    if let Some(caps) = youtube_re().captures(candidate) {
        let end = caps.get(0).map_or(0, |m| m.end());
        return format!("[MEDIA:youtube:https://www.youtube.com/embed/{}]{}", &caps[1], &candidate[end..]);
    }
    if let Some(m) = video_re().find(candidate) {
        return placeholder_or_raw(MediaKind::Video, m.as_str(), &candidate[m.end()..]);
    }
    candidate.to_owned()
}

fn placeholder_or_raw(kind: MediaKind, url: &str, rest: &str) -> String {
    match validate_media_url(url) {
        Some(valid) => format!("[MEDIA:{}:{valid}]{rest}", kind.tag()),
        None => format!("{url}{rest}"),
    }
}

fn media_html(kind: MediaKind, url: &str) -> String {
    match kind {
        MediaKind::Image => {
            format!(r#"<img src="{url}" alt="Shared image" class="media-image" loading="lazy">"#)
        }
        MediaKind::YouTube => format!(
            r#"<iframe src="{url}" class="media-video" frameborder="0" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe>"#
        ),
        MediaKind::Video => format!(r#"<video src="{url}" controls class="media-video"></video>"#),
    }
}

fn push_text(segments: &mut Vec<Segment>, escaped: &str) {
    if escaped.is_empty() {
        return;
    }
    let text = decode_entities(escaped);
    if let Some(Segment::Text(prev)) = segments.last_mut() {
        prev.push_str(&text);
    } else {
        segments.push(Segment::Text(text));
    }
}

/// Reverse the entity escapes the sanitizer emits in text nodes.
pub(crate) fn decode_entities(escaped: &str) -> String {
    escaped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

fn url_candidate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)https?://[^\s<>"'\[\]]+"#).expect("url candidate regex"))
}

fn image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://\S+\.(?:jpg|jpeg|png|gif|webp|svg)(?:\?\S*)?").expect("image regex")
    })
}

fn youtube_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/)([a-zA-Z0-9_-]{11})")
            .expect("youtube regex")
    })
}

fn video_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^https?://\S+\.(?:mp4|webm|ogg)(?:\?\S*)?").expect("video regex"))
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[MEDIA:(image|youtube|video):([^\]]+)\]").expect("placeholder regex"))
}
