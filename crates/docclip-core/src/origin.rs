//! Provenance tags for clipboard content.
//!
//! An [`OriginTag`] names the editing session that produced a rich payload.
//! Its string form doubles as the URL of that session's clipboard-metadata
//! endpoint:
//!
//! ```text
//! {service_root}/clipboard?WOPISrc={doc}&ServerId={server}&ViewId={view}&Tag={tag}
//! ```
//!
//! Every component is percent-encoded and the fields always appear in that
//! order, so distinct triples never share an encoding and decoding a
//! well-formed tag then encoding it again reproduces the input exactly.

use std::borrow::Cow;
use std::fmt;

use smol_str::SmolStr;

/// Path segment (including the query separator) of the metadata endpoint.
pub const ENDPOINT_PATH: &str = "/clipboard?";

/// Query suffix asking the endpoint for HTML rather than the richest form.
pub const HTML_MIME_QUERY: &str = "&MimeType=text/html";

const FIELDS: [&str; 4] = ["WOPISrc", "ServerId", "ViewId", "Tag"];

/// Identifies the session that produced a piece of clipboard content.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OriginTag {
    /// Scheme, host and path prefix the endpoint hangs off. Never contains `?`.
    pub service_root: String,
    /// Document-source identifier (the WOPI source URL of the document).
    pub doc_source: String,
    /// Backend server process identity.
    pub server_id: SmolStr,
    /// Session/view identity on that server.
    pub view_id: SmolStr,
    /// Access tag current when the tag was issued.
    pub access_tag: SmolStr,
}

impl OriginTag {
    pub fn new(
        service_root: impl Into<String>,
        doc_source: impl Into<String>,
        server_id: impl Into<SmolStr>,
        view_id: impl Into<SmolStr>,
        access_tag: impl Into<SmolStr>,
    ) -> Self {
        Self {
            service_root: service_root.into(),
            doc_source: doc_source.into(),
            server_id: server_id.into(),
            view_id: view_id.into(),
            access_tag: access_tag.into(),
        }
    }

    /// Same session identity, different access tag.
    pub fn with_access_tag(&self, access_tag: impl Into<SmolStr>) -> Self {
        Self {
            access_tag: access_tag.into(),
            ..self.clone()
        }
    }

    /// Encode into the canonical string form.
    pub fn encode(&self) -> String {
        format!(
            "{}{}WOPISrc={}&ServerId={}&ViewId={}&Tag={}",
            self.service_root,
            ENDPOINT_PATH,
            urlencoding::encode(&self.doc_source),
            urlencoding::encode(&self.server_id),
            urlencoding::encode(&self.view_id),
            urlencoding::encode(&self.access_tag),
        )
    }

    /// Decode a raw tag. Returns `None` for anything that is not a canonical,
    /// complete tag; content from outside the application lands here.
    pub fn decode(raw: &str) -> Option<Self> {
        let (service_root, query) = raw.split_once(ENDPOINT_PATH)?;
        if service_root.contains('?') {
            return None;
        }

        let mut values: [Option<Cow<'_, str>>; 4] = Default::default();
        let mut pairs = query.split('&');
        for (slot, expected) in values.iter_mut().zip(FIELDS) {
            let (key, value) = pairs.next()?.split_once('=')?;
            if key != expected || value.is_empty() {
                return None;
            }
            let decoded = urlencoding::decode(value).ok()?;
            // Non-canonical escapes would break encode(decode(s)) == s.
            if urlencoding::encode(&decoded) != value {
                return None;
            }
            *slot = Some(decoded);
        }
        if pairs.next().is_some() {
            return None;
        }

        let [doc_source, server_id, view_id, access_tag] = values;
        Some(Self {
            service_root: service_root.to_string(),
            doc_source: doc_source?.into_owned(),
            server_id: SmolStr::new(server_id?),
            view_id: SmolStr::new(view_id?),
            access_tag: SmolStr::new(access_tag?),
        })
    }

    /// URL of this session's clipboard-metadata endpoint.
    pub fn endpoint(&self) -> String {
        self.encode()
    }

    /// Endpoint URL requesting the HTML form of the selection.
    pub fn html_endpoint(&self) -> String {
        let mut url = self.encode();
        url.push_str(HTML_MIME_QUERY);
        url
    }

    /// True when both tags name the same document view on the same server,
    /// regardless of access tag.
    pub fn same_view(&self, other: &OriginTag) -> bool {
        self.service_root == other.service_root
            && self.doc_source == other.doc_source
            && self.server_id == other.server_id
            && self.view_id == other.view_id
    }
}

impl fmt::Display for OriginTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> OriginTag {
        OriginTag::new(
            "https://office.example.org/cool",
            "https://wopi.example.org/files/42",
            "srv-1",
            "7",
            "a&b=c",
        )
    }

    #[test]
    fn test_encode_shape() {
        let encoded = sample().encode();
        assert_eq!(
            encoded,
            "https://office.example.org/cool/clipboard?WOPISrc=https%3A%2F%2Fwopi.example.org%2Ffiles%2F42&ServerId=srv-1&ViewId=7&Tag=a%26b%3Dc"
        );
    }

    #[test]
    fn test_decode_roundtrip_exact() {
        let encoded = sample().encode();
        let decoded = OriginTag::decode(&encoded).expect("well-formed tag");
        assert_eq!(decoded, sample());
        assert_eq!(decoded.encode(), encoded);
    }

    #[test]
    fn test_decode_missing_field() {
        let raw = "https://x/clipboard?WOPISrc=d&ServerId=s&Tag=t";
        assert_eq!(OriginTag::decode(raw), None);
    }

    #[test]
    fn test_decode_foreign_content() {
        assert_eq!(OriginTag::decode("https://example.com/page"), None);
        assert_eq!(OriginTag::decode(""), None);
        assert_eq!(OriginTag::decode("/clipboard?"), None);
    }

    #[test]
    fn test_decode_rejects_reordered_and_extra_fields() {
        let reordered = "/clipboard?ServerId=s&WOPISrc=d&ViewId=v&Tag=t";
        assert_eq!(OriginTag::decode(reordered), None);
        let extra = "/clipboard?WOPISrc=d&ServerId=s&ViewId=v&Tag=t&MimeType=text%2Fhtml";
        assert_eq!(OriginTag::decode(extra), None);
    }

    #[test]
    fn test_decode_rejects_non_canonical_escape() {
        // `+` is a legal form encoding of space but not the canonical one.
        let raw = "/clipboard?WOPISrc=a+b&ServerId=s&ViewId=v&Tag=t";
        assert_eq!(OriginTag::decode(raw), None);
    }

    #[test]
    fn test_relative_service_root() {
        let tag = OriginTag::new("", "doc", "s", "v", "t");
        let decoded = OriginTag::decode(&tag.encode());
        assert_eq!(decoded, Some(tag));
    }

    #[test]
    fn test_html_endpoint() {
        let tag = OriginTag::new("https://h", "d", "s", "v", "t");
        assert_eq!(
            tag.html_endpoint(),
            "https://h/clipboard?WOPISrc=d&ServerId=s&ViewId=v&Tag=t&MimeType=text/html"
        );
    }

    #[test]
    fn test_same_view_ignores_access_tag() {
        let a = sample();
        let b = a.with_access_tag("rotated");
        assert!(a.same_view(&b));
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn prop_roundtrip(
            root in "(https?://[a-z0-9.]{1,12}(/[a-z]{1,6}){0,2})?",
            doc in "\\PC{1,24}",
            server in "\\PC{1,12}",
            view in "\\PC{1,8}",
            tag in "\\PC{1,16}",
        ) {
            let direct = OriginTag::new(root, doc, server.as_str(), view.as_str(), tag.as_str());
            let encoded = direct.encode();
            let decoded = OriginTag::decode(&encoded);
            prop_assert_eq!(decoded.as_ref(), Some(&direct));
            prop_assert_eq!(decoded.map(|t| t.encode()), Some(encoded));
        }

        #[test]
        fn prop_distinct_triples_distinct_tags(
            a in ("\\PC{1,6}", "\\PC{1,6}", "\\PC{1,6}"),
            b in ("\\PC{1,6}", "\\PC{1,6}", "\\PC{1,6}"),
        ) {
            prop_assume!(a != b);
            let ta = OriginTag::new("r", "d", a.0.as_str(), a.1.as_str(), a.2.as_str());
            let tb = OriginTag::new("r", "d", b.0.as_str(), b.1.as_str(), b.2.as_str());
            prop_assert_ne!(ta.encode(), tb.encode());
        }
    }
}
