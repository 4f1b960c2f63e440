use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::types::{RawItem, SourceProvider};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

// The serde deserializer matches local names: `content:encoded` is `encoded`,
// `media:content` is `content`. Repeated elements may be interleaved with
// others (`overlapped-lists`).
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "encoded")]
    content_encoded: Option<String>,
    #[serde(default)]
    enclosure: Vec<UrlAttr>,
    #[serde(rename = "thumbnail", default)]
    media_thumbnail: Vec<UrlAttr>,
    #[serde(rename = "content", default)]
    media_content: Vec<UrlAttr>,
}

#[derive(Debug, Deserialize)]
struct UrlAttr {
    #[serde(rename = "@url")]
    url: Option<String>,
}

/// Fixed-URL RSS 2.0 feed provider.
pub struct RssProvider {
    name: String,
    mode: Mode,
}

enum Mode {
    // Owned copy so tests can hand in decoded/borrowed fixtures.
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RssProvider {
    pub fn from_url(name: impl Into<String>, url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        }
    }

    pub fn from_fixture(name: impl Into<String>, xml: &str) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn parse_items_from_str(s: &str) -> Result<Vec<RawItem>> {
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

        let out = rss
            .channel
            .item
            .into_iter()
            .map(|it| {
                // The snippet is the plain-text view of the HTML body.
                let content_snippet = it
                    .content_encoded
                    .as_deref()
                    .map(crate::ingest::normalize_text)
                    .filter(|s| !s.is_empty());
                RawItem {
                    title: it.title.map(|t| t.trim().to_string()),
                    link: it.link.map(|l| l.trim().to_string()),
                    enclosure_url: it.enclosure.into_iter().find_map(|e| e.url),
                    media_thumbnail_url: it.media_thumbnail.into_iter().find_map(|m| m.url),
                    media_content_url: it.media_content.into_iter().find_map(|m| m.url),
                    content: it.content_encoded,
                    content_snippet,
                    description: it.description,
                }
            })
            .collect();
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for RssProvider {
    async fn fetch_items(&self, limit: usize) -> Result<Vec<RawItem>> {
        let mut items = match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s)?,
            Mode::Http { url, client } => {
                let resp = match client.get(url.as_str()).send().await {
                    Ok(resp) => resp,
                    Err(e) => {
                        tracing::warn!(error = ?e, provider = %self.name, "provider http error");
                        counter!("feed_provider_http_errors_total").increment(1);
                        return Err(e).context("rss http get()");
                    }
                };
                if !resp.status().is_success() {
                    bail!("rss feed {url} returned {}", resp.status());
                }
                let body = resp.text().await.context("rss http .text()")?;
                Self::parse_items_from_str(&body)?
            }
        };
        items.truncate(limit);
        Ok(items)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Feeds routinely use HTML named entities that are not valid XML.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", "&#160;")
        .replace("&ndash;", "&#8211;")
        .replace("&mdash;", "&#8212;")
        .replace("&ldquo;", "&#8220;")
        .replace("&rdquo;", "&#8221;")
        .replace("&lsquo;", "&#8216;")
        .replace("&rsquo;", "&#8217;")
        .replace("&hellip;", "&#8230;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Test</title>
    <item>
      <title> First &ndash; story </title>
      <link>https://example.test/1</link>
      <description><![CDATA[<p>Short <b>summary</b></p>]]></description>
      <enclosure url="https://img.test/1.jpg" type="image/jpeg" length="0"/>
    </item>
    <item>
      <title>Second</title>
      <link>https://example.test/2</link>
      <media:thumbnail url="https://img.test/2-thumb.jpg"/>
      <media:content url="https://img.test/2-a.jpg"/>
      <media:content url="https://img.test/2-b.jpg"/>
      <content:encoded><![CDATA[<p>Body text</p>]]></content:encoded>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_enclosure_media_and_content() {
        let items = RssProvider::parse_items_from_str(XML).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("First \u{2013} story"));
        assert_eq!(items[0].enclosure_url.as_deref(), Some("https://img.test/1.jpg"));
        assert_eq!(
            items[1].media_thumbnail_url.as_deref(),
            Some("https://img.test/2-thumb.jpg")
        );
        assert_eq!(items[1].media_content_url.as_deref(), Some("https://img.test/2-a.jpg"));
        assert_eq!(items[1].content_snippet.as_deref(), Some("Body text"));
    }

    #[tokio::test]
    async fn fixture_respects_limit() {
        let p = RssProvider::from_fixture("Grist", XML);
        let items = p.fetch_items(1).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(p.name(), "Grist");
    }

    #[test]
    fn interleaved_media_elements_parse() {
        let xml = r#"<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <item>
      <title>C</title>
      <media:content url="https://img.test/c1.jpg"/>
      <link>https://example.test/c</link>
      <media:content url="https://img.test/c2.jpg"/>
      <enclosure url="https://img.test/e1.jpg"/>
      <description>text</description>
      <enclosure url="https://img.test/e2.jpg"/>
    </item>
    <item>
      <title>D</title>
      <link>https://example.test/d</link>
    </item>
  </channel>
</rss>"#;
        let items = RssProvider::parse_items_from_str(xml).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].link.as_deref(), Some("https://example.test/c"));
        assert_eq!(items[0].media_content_url.as_deref(), Some("https://img.test/c1.jpg"));
        assert_eq!(items[0].enclosure_url.as_deref(), Some("https://img.test/e1.jpg"));
        assert_eq!(items[1].media_content_url, None);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(RssProvider::parse_items_from_str("<html>nope</html>").is_err());
    }
}
