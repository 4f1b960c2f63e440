// src/ingest/image.rs
//! Representative image lookup across heterogeneous feed item shapes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::RawItem;

static RE_IMG_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).expect("img src regex"));

/// First `<img src>` in an HTML blob. Later images are ignored.
pub fn first_img_src(html: Option<&str>) -> Option<String> {
    let caps = RE_IMG_SRC.captures(html?)?;
    non_empty(caps.get(1).map(|m| m.as_str()))
}

/// Strict priority, first non-empty wins:
/// enclosure → media thumbnail → media content → `<img>` in content
/// → `<img>` in snippet → `<img>` in description.
pub fn extract_image(item: &RawItem) -> Option<String> {
    non_empty(item.enclosure_url.as_deref())
        .or_else(|| non_empty(item.media_thumbnail_url.as_deref()))
        .or_else(|| non_empty(item.media_content_url.as_deref()))
        .or_else(|| first_img_src(item.content.as_deref()))
        .or_else(|| first_img_src(item.content_snippet.as_deref()))
        .or_else(|| first_img_src(item.description.as_deref()))
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
