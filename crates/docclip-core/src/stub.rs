//! Placeholder payloads for content not yet available locally.
//!
//! A stub goes on the platform clipboard whenever the real selection cannot
//! be serialized client-side (nothing selected, or a complex selection still
//! on the server). A foreign session reading it back sees the stub marker and
//! knows not to attempt a silent relay.

use crate::origin::OriginTag;
use crate::payload::{self, RichPayload};

/// Builds stub payloads tagged with the current session's origin.
#[derive(Clone, Debug)]
pub struct StubContentBuilder {
    origin: OriginTag,
}

impl StubContentBuilder {
    pub fn new(origin: OriginTag) -> Self {
        Self { origin }
    }

    /// Stub carrying a human-readable notice for whoever pastes it elsewhere.
    pub fn build_stub(&self, reason: &str) -> RichPayload {
        RichPayload {
            origin: Some(self.origin.clone()),
            stub: true,
            body: format!("<div>{}</div>", escape_text(reason)),
        }
    }

    pub fn origin(&self) -> &OriginTag {
        &self.origin
    }
}

/// True iff `html` was produced by [`StubContentBuilder::build_stub`].
pub fn is_stub(html: &str) -> bool {
    payload::is_stub(html)
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    payload::escape_into(&mut out, text);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn builder() -> StubContentBuilder {
        StubContentBuilder::new(OriginTag::new("", "doc", "s", "v", "t"))
    }

    #[test]
    fn test_stub_document() {
        let html = builder().build_stub("Download <first>").to_html();
        insta::assert_snapshot!(html, @r#"<!DOCTYPE html><html><head><meta charset="utf-8"><meta name="docclip-schema" content="1"><title>docclip:stub/v1</title><meta name="origin" content="%2Fclipboard%3FWOPISrc%3Ddoc%26ServerId%3Ds%26ViewId%3Dv%26Tag%3Dt"></head><body><div>Download &lt;first&gt;</div></body></html>"#);
    }

    #[test]
    fn test_stub_detected_and_tagged() {
        let html = builder().build_stub("please download first").to_html();
        assert!(is_stub(&html));
        let parsed = RichPayload::parse(&html);
        assert!(parsed.stub);
        assert_eq!(parsed.origin.as_ref(), Some(builder().origin()));
    }

    #[test]
    fn test_real_content_is_not_stub() {
        let html = RichPayload::tagged("<p>Hello</p>", builder().origin().clone()).to_html();
        assert!(!is_stub(&html));
        assert!(!is_stub("<p>Hello</p>"));
        assert!(!is_stub("<html><head><title>Quarterly report</title></head></html>"));
    }

    #[test]
    fn test_marker_in_body_is_not_stub() {
        let html = "<html><head></head><body><title>docclip:stub/v1</title></body></html>";
        assert!(!is_stub(html));
    }

    proptest! {
        #[test]
        fn prop_user_content_never_stub(body in "\\PC{0,200}") {
            prop_assume!(!body.contains(payload::STUB_MARKER));
            prop_assert!(!is_stub(&body));
            let wrapped = format!("<html><head><title>{body}</title></head><body>{body}</body></html>");
            prop_assert!(!is_stub(&wrapped));
        }
    }
}
