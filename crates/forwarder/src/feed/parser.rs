use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use paperbot_common::time::utc_from_naive;
use paperbot_common::types::FeedEntry;

use super::FeedError;

/// Naive layouts seen in the wild; interpreted as UTC.
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse an RSS 2.0, RSS 1.0 (RDF) or Atom document into entries, in document order.
///
/// Entries without an id and a link, or without a usable date, are skipped
/// with a warning rather than failing the whole feed.
pub fn parse_feed(xml: &[u8]) -> Result<Vec<FeedEntry>, FeedError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut buf = Vec::new();

    let mut saw_root = false;
    let mut depth = 0usize;
    // (depth of <item>/<entry>, fields collected so far)
    let mut current: Option<(usize, EntryBuilder)> = None;
    // (depth of the direct child being read, which field it fills)
    let mut field: Option<(usize, Field)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                let name = e.local_name();
                if !saw_root {
                    check_root(name.as_ref())?;
                    saw_root = true;
                }

                if current.is_none() {
                    if is_entry(name.as_ref()) {
                        current = Some((depth, EntryBuilder::default()));
                    }
                } else if let Some((entry_depth, builder)) = current.as_mut()
                    && field.is_none()
                    && depth == *entry_depth + 1
                {
                    let kind = Field::from_name(name.as_ref());
                    if kind == Field::Link {
                        builder.take_link_href(&e);
                    }
                    field = Some((depth, kind));
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.local_name();
                if !saw_root {
                    check_root(name.as_ref())?;
                    saw_root = true;
                }

                // Atom: <link rel="alternate" href="..."/>
                if let Some((entry_depth, builder)) = current.as_mut()
                    && field.is_none()
                    && depth == *entry_depth
                    && Field::from_name(name.as_ref()) == Field::Link
                {
                    builder.take_link_href(&e);
                }
            }
            Ok(Event::End(_)) => {
                if matches!(field, Some((field_depth, _)) if field_depth == depth) {
                    field = None;
                }
                if matches!(current, Some((entry_depth, _)) if entry_depth == depth)
                    && let Some((_, builder)) = current.take()
                {
                    if let Some(entry) = builder.build() {
                        entries.push(entry);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(e)) => {
                if let (Some((_, builder)), Some((_, kind))) = (current.as_mut(), field) {
                    let text = e
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                    builder.append(kind, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let (Some((_, builder)), Some((_, kind))) = (current.as_mut(), field) {
                    builder.append(kind, &String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(FeedError::Parse(format!(
                    "XML error at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
        }
        buf.clear();
    }

    if !saw_root {
        return Err(FeedError::Parse("empty document".to_string()));
    }

    Ok(entries)
}

/// Parse a feed date (RFC 2822, RFC 3339, or a naive timestamp taken as UTC).
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) =
        DateTime::parse_from_rfc2822(raw).or_else(|_| DateTime::parse_from_rfc3339(raw))
    {
        return Some(date.with_timezone(&Utc));
    }

    NAIVE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(utc_from_naive)
}

fn check_root(name: &[u8]) -> Result<(), FeedError> {
    match name {
        b"rss" | b"feed" | b"RDF" => Ok(()),
        other => Err(FeedError::Parse(format!(
            "unexpected root element <{}>, expected RSS or Atom",
            String::from_utf8_lossy(other)
        ))),
    }
}

fn is_entry(name: &[u8]) -> bool {
    matches!(name, b"item" | b"entry")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Link,
    Title,
    Summary,
    Content,
    Published,
    Updated,
    Ignored,
}

impl Field {
    fn from_name(name: &[u8]) -> Self {
        match name {
            b"guid" | b"id" => Field::Id,
            b"link" => Field::Link,
            b"title" => Field::Title,
            b"description" | b"summary" => Field::Summary,
            b"content" | b"encoded" => Field::Content,
            b"pubDate" | b"published" | b"issued" => Field::Published,
            b"updated" | b"date" | b"modified" => Field::Updated,
            _ => Field::Ignored,
        }
    }
}

#[derive(Debug, Default)]
struct EntryBuilder {
    id: String,
    link_href: Option<String>,
    link_text: String,
    title: String,
    summary: String,
    content: String,
    published: String,
    updated: String,
}

impl EntryBuilder {
    fn append(&mut self, field: Field, text: &str) {
        let target = match field {
            Field::Id => &mut self.id,
            Field::Link => &mut self.link_text,
            Field::Title => &mut self.title,
            Field::Summary => &mut self.summary,
            Field::Content => &mut self.content,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
            Field::Ignored => return,
        };
        target.push_str(text);
    }

    /// Keep the first `href` whose `rel` is absent or `alternate`.
    fn take_link_href(&mut self, element: &BytesStart<'_>) {
        if self.link_href.is_some() {
            return;
        }

        let mut href = None;
        let mut rel_ok = true;
        for attr in element.attributes().flatten() {
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            match attr.key.local_name().as_ref() {
                b"href" => href = Some(value),
                b"rel" => rel_ok = value == "alternate",
                _ => {}
            }
        }

        if rel_ok {
            self.link_href = href.filter(|h| !h.trim().is_empty());
        }
    }

    fn build(self) -> Option<FeedEntry> {
        let link = self
            .link_href
            .or_else(|| Some(self.link_text.trim().to_string()))
            .filter(|l| !l.is_empty());

        let id = Some(self.id.trim().to_string())
            .filter(|id| !id.is_empty())
            .or_else(|| link.clone());
        let Some(id) = id else {
            tracing::warn!(title = %self.title.trim(), "Skipping feed entry without id or link");
            return None;
        };

        let published = parse_feed_date(&self.published).or_else(|| parse_feed_date(&self.updated));
        let Some(published) = published else {
            tracing::warn!(
                entry_id = %id,
                published = %self.published.trim(),
                "Skipping feed entry without a parseable publication date"
            );
            return None;
        };

        let summary = if self.summary.trim().is_empty() {
            self.content
        } else {
            self.summary
        };

        Some(FeedEntry {
            id,
            title: self.title.trim().to_string(),
            summary: summary.trim().to_string(),
            published,
            link,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>New papers</title>
    <link>https://example.com/</link>
    <atom:link href="https://example.com/feed.xml" rel="self"/>
    <item>
      <title>Attention Is Still All You Need</title>
      <link>https://example.com/papers/1</link>
      <guid isPermaLink="false">paper-1</guid>
      <description><![CDATA[<p>Transformers, again.</p>]]></description>
      <pubDate>Mon, 23 Dec 2024 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Sparse &amp; Fast</title>
      <link>https://example.com/papers/2</link>
      <description>No guid here</description>
      <pubDate>Tue, 24 Dec 2024 09:30:00 +0800</pubDate>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Preprints</title>
  <id>urn:feed</id>
  <updated>2024-12-23T10:00:00Z</updated>
  <entry>
    <title type="html">Graph Nets</title>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <link rel="self" href="https://example.com/self/1"/>
    <link rel="alternate" href="https://example.com/entries/1"/>
    <published>2024-12-23T10:00:00+08:00</published>
    <updated>2024-12-23T12:00:00Z</updated>
    <summary>Message passing.</summary>
  </entry>
  <entry>
    <title>Only Updated</title>
    <link href="https://example.com/entries/2"/>
    <updated>2024-12-22T01:02:03Z</updated>
    <content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml">Body text</div></content>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let entries = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].id, "paper-1");
        assert_eq!(entries[0].title, "Attention Is Still All You Need");
        assert_eq!(entries[0].summary, "<p>Transformers, again.</p>");
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/papers/1"));
        assert_eq!(
            entries[0].published,
            Utc.with_ymd_and_hms(2024, 12, 23, 8, 0, 0).unwrap()
        );

        // No guid: the link doubles as the id.
        assert_eq!(entries[1].id, "https://example.com/papers/2");
        assert_eq!(entries[1].title, "Sparse & Fast");
        assert_eq!(
            entries[1].published,
            Utc.with_ymd_and_hms(2024, 12, 24, 1, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_atom() {
        let entries = parse_feed(ATOM.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].id, "urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a");
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/entries/1"));
        assert_eq!(entries[0].summary, "Message passing.");
        assert_eq!(
            entries[0].published,
            Utc.with_ymd_and_hms(2024, 12, 23, 2, 0, 0).unwrap()
        );

        assert_eq!(entries[1].id, "https://example.com/entries/2");
        assert_eq!(entries[1].summary, "Body text");
        assert_eq!(
            entries[1].published,
            Utc.with_ymd_and_hms(2024, 12, 22, 1, 2, 3).unwrap()
        );
    }

    #[test]
    fn test_skips_entries_without_date_or_id() {
        let xml = r#"<rss version="2.0"><channel>
            <item><title>No date</title><guid>a</guid></item>
            <item><title>No id</title><pubDate>Mon, 23 Dec 2024 08:00:00 GMT</pubDate></item>
            <item><title>Good</title><guid>c</guid><pubDate>Mon, 23 Dec 2024 08:00:00 GMT</pubDate></item>
        </channel></rss>"#;

        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "c");
    }

    #[test]
    fn test_empty_channel() {
        let xml = r#"<rss version="2.0"><channel><title>Quiet</title></channel></rss>"#;
        assert!(parse_feed(xml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_feed_documents() {
        let err = parse_feed(b"<html><body>Not found</body></html>").unwrap_err();
        assert!(err.to_string().contains("<html>"));

        assert!(parse_feed(b"").is_err());
        assert!(parse_feed(b"<rss><channel><item></channel></rss>").is_err());
    }

    #[test]
    fn test_parse_feed_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 12, 23, 8, 0, 0).unwrap();
        assert_eq!(parse_feed_date("Mon, 23 Dec 2024 08:00:00 GMT"), Some(expected));
        assert_eq!(parse_feed_date("Mon, 23 Dec 2024 16:00:00 +0800"), Some(expected));
        assert_eq!(parse_feed_date("2024-12-23T08:00:00Z"), Some(expected));
        assert_eq!(parse_feed_date("2024-12-23T08:00:00"), Some(expected));
        assert_eq!(parse_feed_date(" 2024-12-23 08:00:00 "), Some(expected));
        assert_eq!(parse_feed_date("last tuesday"), None);
        assert_eq!(parse_feed_date(""), None);
    }
}
