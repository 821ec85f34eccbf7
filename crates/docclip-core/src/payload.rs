//! Rich clipboard payloads and their head schema.
//!
//! Rich content travels as an HTML document. Protocol fields live in the
//! `<head>` as tagged elements:
//!
//! ```html
//! <meta name="docclip-schema" content="1">
//! <title>docclip:stub/v1</title>              <!-- stubs only -->
//! <meta name="origin" content="{url-encoded OriginTag}">
//! ```
//!
//! The fields are read with a small tag tokenizer rather than substring
//! search, so marker text inside the document body never counts.

use std::borrow::Cow;
use std::ops::Range;

use pulldown_cmark_escape::{FmtWriter, escape_html};

use crate::origin::OriginTag;

/// Head schema version written by this crate.
pub const SCHEMA_VERSION: u32 = 1;

/// `<title>` content marking a stub payload.
pub const STUB_MARKER: &str = "docclip:stub/v1";

const SCHEMA_META: &str = "docclip-schema";
const ORIGIN_META: &str = "origin";

/// A rich payload as written to, or read back from, the platform clipboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RichPayload {
    /// Producing session, if known.
    pub origin: Option<OriginTag>,
    /// Whether this is a placeholder for content not available locally.
    pub stub: bool,
    /// Body markup.
    pub body: String,
}

impl RichPayload {
    /// Real content with known provenance.
    pub fn tagged(body: impl Into<String>, origin: OriginTag) -> Self {
        Self {
            origin: Some(origin),
            stub: false,
            body: body.into(),
        }
    }

    /// Encode as a complete HTML document.
    pub fn to_html(&self) -> String {
        format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\">{}</head><body>{}</body></html>",
            head_fields(self.origin.as_ref(), self.stub),
            self.body
        )
    }

    /// Parse a payload read back from the clipboard. Never fails: unknown
    /// shapes come back as an untagged, non-stub payload.
    pub fn parse(html: &str) -> Self {
        let head = scan_head(html);
        let origin = match head.schema {
            Some(version) if version > SCHEMA_VERSION => None,
            _ => head
                .origin
                .as_deref()
                .and_then(|raw| urlencoding::decode(raw).ok())
                .and_then(|raw| OriginTag::decode(&raw)),
        };
        let stub = head.title.as_deref().map(str::trim) == Some(STUB_MARKER);
        let body = html[head.content(html.len())].to_string();
        Self { origin, stub, body }
    }
}

/// True if `html` is a stub payload. Only the head `<title>` is considered.
pub fn is_stub(html: &str) -> bool {
    scan_head(html).title.as_deref().map(str::trim) == Some(STUB_MARKER)
}

/// Read only the provenance of `html`.
pub fn origin_of(html: &str) -> Option<OriginTag> {
    RichPayload::parse(html).origin
}

/// Embed `origin` into `html`, replacing any provenance already present.
///
/// Full documents keep their own head content (styles, charset); fragments
/// are wrapped into a document.
pub fn originate(html: &str, origin: &OriginTag) -> String {
    let head = scan_head(html);
    let fields = head_fields(Some(origin), false);

    if let Some(at) = head.head_open {
        splice(html, &head.owned, at, &fields)
    } else if let Some(at) = head.html_open {
        splice(html, &head.owned, at, &format!("<head>{fields}</head>"))
    } else {
        let stripped = splice(html, &head.owned, 0, "");
        RichPayload::tagged(stripped, origin.clone()).to_html()
    }
}

/// First `<a href>` target in `html`.
pub fn first_link_target(html: &str) -> Option<String> {
    TagScanner::new(html)
        .filter(|tag| tag.name == "a" && !tag.closing)
        .find_map(|tag| tag.attr("href").map(|href| href.into_owned()))
        .filter(|href| !href.is_empty())
}

/// Text content of the document body, with line breaks after block
/// elements. Used when only HTML of a selection is known.
pub fn plain_text(html: &str) -> String {
    let body = &html[scan_head(html).content(html.len())];

    let mut out = String::with_capacity(body.len());
    let mut pos = 0;
    let mut raw: Option<String> = None;
    for tag in TagScanner::new(body) {
        if let Some(name) = &raw {
            // Script and style contents are not text.
            if tag.closing && tag.name == *name {
                raw = None;
                pos = tag.span.end;
            }
            continue;
        }
        out.push_str(&unescape(&body[pos..tag.span.start]));
        pos = tag.span.end;
        let breaks = match (tag.name.as_str(), tag.closing) {
            ("script" | "style" | "title", false) => {
                raw = Some(tag.name.clone());
                false
            }
            ("br", _) => true,
            ("p" | "div" | "li" | "tr" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6", true) => true,
            _ => false,
        };
        if breaks {
            out.push('\n');
        }
    }
    if raw.is_none() {
        out.push_str(&unescape(&body[pos..]));
    }
    out.trim_end().to_string()
}

/// HTML-escape `text` onto `out`.
pub(crate) fn escape_into(out: &mut String, text: &str) {
    // Writing into a String cannot fail.
    let _ = escape_html(FmtWriter(out), text);
}

fn head_fields(origin: Option<&OriginTag>, stub: bool) -> String {
    let mut out = format!("<meta name=\"{SCHEMA_META}\" content=\"{SCHEMA_VERSION}\">");
    if stub {
        out.push_str("<title>");
        out.push_str(STUB_MARKER);
        out.push_str("</title>");
    }
    if let Some(origin) = origin {
        out.push_str("<meta name=\"");
        out.push_str(ORIGIN_META);
        out.push_str("\" content=\"");
        escape_into(&mut out, &urlencoding::encode(&origin.encode()));
        out.push_str("\">");
    }
    out
}

/// Copy `src` without the `skip` spans, inserting `text` at byte `at`.
fn splice(src: &str, skip: &[Range<usize>], at: usize, text: &str) -> String {
    let mut out = String::with_capacity(src.len() + text.len());
    let mut pos = 0;
    let mut inserted = false;
    for range in skip {
        if !inserted && at <= range.start {
            out.push_str(&src[pos..at]);
            out.push_str(text);
            pos = at;
            inserted = true;
        }
        out.push_str(&src[pos..range.start]);
        pos = range.end;
    }
    if !inserted {
        out.push_str(&src[pos..at.max(pos)]);
        out.push_str(text);
        pos = at.max(pos);
    }
    out.push_str(&src[pos..]);
    out
}

#[derive(Debug, Default)]
struct HeadInfo {
    schema: Option<u32>,
    title: Option<String>,
    origin: Option<String>,
    /// Byte offset just past `<html ...>`.
    html_open: Option<usize>,
    /// Byte offset just past `<head ...>`.
    head_open: Option<usize>,
    /// Byte offset just past `</head>`.
    head_close: Option<usize>,
    /// Spans of schema/origin metas we own and rewrite.
    owned: Vec<Range<usize>>,
    body: Option<Range<usize>>,
}

impl HeadInfo {
    /// Byte range of the document content: the body, else whatever follows
    /// the head, else everything.
    fn content(&self, len: usize) -> Range<usize> {
        match (&self.body, self.head_close) {
            (Some(body), _) => body.clone(),
            (None, Some(end)) => end..len,
            (None, None) => 0..len,
        }
    }
}

fn scan_head(html: &str) -> HeadInfo {
    let lower = html.to_ascii_lowercase();
    let mut info = HeadInfo::default();
    // Protocol fields are only read before `</head>`; the scan continues to
    // find where the body starts.
    let mut in_head = true;

    for tag in TagScanner::new(html) {
        match (tag.name.as_str(), tag.closing) {
            ("html", false) => info.html_open = Some(tag.span.end),
            ("head", false) => info.head_open = Some(tag.span.end),
            ("head", true) => {
                in_head = false;
                info.head_close = Some(tag.span.end);
            }
            ("body", false) => {
                let start = tag.span.end;
                let end = lower
                    .rfind("</body>")
                    .filter(|end| *end >= start)
                    .unwrap_or(html.len());
                info.body = Some(start..end);
                break;
            }
            ("title", false) if in_head && info.title.is_none() => {
                let start = tag.span.end;
                if let Some(len) = lower[start..].find("</title>") {
                    info.title = Some(html[start..start + len].to_string());
                }
            }
            ("meta", false) if in_head => {
                let name = tag.attr("name").map(|n| n.to_ascii_lowercase());
                let content = tag.attr("content");
                match (name.as_deref(), content) {
                    (Some(SCHEMA_META), content) => {
                        info.schema = content.and_then(|c| c.trim().parse().ok());
                        info.owned.push(tag.span.clone());
                    }
                    (Some(ORIGIN_META), Some(content)) => {
                        if info.origin.is_none() {
                            info.origin = Some(content.into_owned());
                        }
                        info.owned.push(tag.span.clone());
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    info
}

#[derive(Debug)]
struct Tag<'a> {
    /// Lowercased element name.
    name: String,
    closing: bool,
    attrs: Vec<(String, Cow<'a, str>)>,
    span: Range<usize>,
}

impl<'a> Tag<'a> {
    fn attr(&self, key: &str) -> Option<Cow<'a, str>> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}

struct TagScanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> TagScanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }
}

impl<'a> Iterator for TagScanner<'a> {
    type Item = Tag<'a>;

    fn next(&mut self) -> Option<Tag<'a>> {
        loop {
            let start = self.pos + self.src.get(self.pos..)?.find('<')?;
            let rest = &self.src[start..];
            if rest.starts_with("<!--") {
                let end = rest
                    .find("-->")
                    .map(|end| start + end + 3)
                    .unwrap_or(self.src.len());
                self.pos = end;
                return Some(Tag {
                    name: "!--".to_string(),
                    closing: false,
                    attrs: Vec::new(),
                    span: start..end,
                });
            }
            match parse_tag(self.src, start) {
                Some(tag) => {
                    self.pos = tag.span.end;
                    return Some(tag);
                }
                None => self.pos = start + 1,
            }
        }
    }
}

fn parse_tag(src: &str, start: usize) -> Option<Tag<'_>> {
    let bytes = src.as_bytes();
    let mut i = start + 1;
    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }

    let name_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'!') {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    let name = src[name_start..i].to_ascii_lowercase();

    let mut attrs = Vec::new();
    loop {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if *bytes.get(i)? == b'>' {
            return Some(Tag {
                name,
                closing,
                attrs,
                span: start..i + 1,
            });
        }

        let key_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let key = src[key_start..i].to_ascii_lowercase();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        if bytes.get(i) != Some(&b'=') {
            attrs.push((key, Cow::Borrowed("")));
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let value = match *bytes.get(i)? {
            quote @ (b'"' | b'\'') => {
                let value_start = i + 1;
                let len = src[value_start..].find(quote as char)?;
                i = value_start + len + 1;
                &src[value_start..value_start + len]
            }
            _ => {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                &src[value_start..i]
            }
        };
        attrs.push((key, unescape(value)));
    }
}

fn unescape(value: &str) -> Cow<'_, str> {
    if !value.contains('&') {
        return Cow::Borrowed(value);
    }
    Cow::Owned(
        value
            .replace("&quot;", "\"")
            .replace("&#34;", "\"")
            .replace("&apos;", "'")
            .replace("&#39;", "'")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&"),
    )
}
