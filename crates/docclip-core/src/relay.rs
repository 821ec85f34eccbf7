//! Cross-session content relay.
//!
//! A paste whose payload carries a foreign [`OriginTag`] cannot be served by
//! the local session: the rich content lives on the source session's backend.
//! The relay downloads it from there and uploads it to the local session's
//! endpoint, then asks the local session to paste.
//!
//! ```text
//! Start → Downloading → Uploading → Done
//!              └→ FallbackEncoding ┘
//! (any) → Failed
//! ```

use std::rc::Rc;

use bytes::Bytes;
use web_time::Instant;

use crate::blob;
use crate::error::TransportError;
use crate::notice::{DocumentCommand, DocumentHost, Notice, NoticeSink, PasteTarget};
use crate::origin::OriginTag;
use crate::payload;
use crate::progress::{Leg, TransferProgress};
use crate::transport::{ClipboardTransport, FormField, UploadForm};

/// One cross-session relay attempt.
#[derive(Clone, Debug)]
pub struct TransferSession {
    /// Session the content came from.
    pub source: OriginTag,
    /// Local clipboard-metadata endpoint.
    pub destination: String,
    /// HTML the paste event handed over, used if the download fails.
    pub fallback: Option<String>,
    /// Captured when the paste gesture started.
    pub target: PasteTarget,
}

/// Relay state machine states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayState {
    Start,
    Downloading,
    FallbackEncoding,
    Uploading,
    Done,
    Failed(RelayFailure),
}

impl RelayState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RelayState::Done | RelayState::Failed(_))
    }
}

/// Why a relay ended in [`RelayState::Failed`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayFailure {
    /// Only a stub is available at the source; retrying cannot help.
    SourceUnavailable,
    /// The destination refused the upload.
    Upload(String),
}

/// Outcome of one relay, with every state visited in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayReport {
    pub state: RelayState,
    pub visited: Vec<RelayState>,
}

impl RelayReport {
    pub fn visited(&self, state: &RelayState) -> bool {
        self.visited.contains(state)
    }
}

/// What a successful download turned out to contain.
enum Downloaded {
    Content(Bytes),
    Stub,
}

/// Performs relays. Holds no per-session state, so concurrent relays on one
/// instance never interfere.
pub struct TransferRelay<T> {
    transport: Rc<T>,
    host: Rc<dyn DocumentHost>,
    notices: Rc<dyn NoticeSink>,
}

impl<T: ClipboardTransport> TransferRelay<T> {
    pub fn new(transport: Rc<T>, host: Rc<dyn DocumentHost>, notices: Rc<dyn NoticeSink>) -> Self {
        Self {
            transport,
            host,
            notices,
        }
    }

    pub fn transport(&self) -> &Rc<T> {
        &self.transport
    }

    /// Run `session` to a terminal state.
    pub async fn relay(&self, session: TransferSession) -> RelayReport {
        let started = Instant::now();
        let mut visited = vec![RelayState::Start];
        let mut progress = TransferProgress::new();

        tracing::debug!(source = %session.source, "relay: downloading");
        visited.push(RelayState::Downloading);
        let downloaded = {
            let notices = &self.notices;
            let mut on_progress = |p: u8| notices.progress(progress.advance(Leg::Download, p));
            self.transport
                .download(&session.source.endpoint(), &mut on_progress)
                .await
        };

        let body = match downloaded.and_then(classify) {
            Ok(Downloaded::Content(body)) => body,
            Ok(Downloaded::Stub) => {
                tracing::debug!("relay: source only holds a stub");
                return self.fail(visited, RelayFailure::SourceUnavailable, Notice::DownloadFailed);
            }
            Err(err) => {
                tracing::warn!(%err, "relay: download failed");
                match session.fallback.as_deref() {
                    Some(html) if !payload::is_stub(html) => {
                        visited.push(RelayState::FallbackEncoding);
                        blob::encode_html(html)
                    }
                    _ => {
                        return self.fail(
                            visited,
                            RelayFailure::SourceUnavailable,
                            Notice::DownloadFailed,
                        );
                    }
                }
            }
        };

        tracing::debug!(destination = %session.destination, bytes = body.len(), "relay: uploading");
        visited.push(RelayState::Uploading);
        let form = UploadForm {
            field: FormField::Data,
            body,
        };
        let uploaded = {
            let notices = &self.notices;
            let mut on_progress = |p: u8| notices.progress(progress.advance(Leg::Upload, p));
            self.transport
                .upload(&session.destination, form, &mut on_progress)
                .await
        };

        match uploaded {
            Ok(()) => {
                visited.push(RelayState::Done);
                self.notices.progress_closed();
                self.host.dispatch(DocumentCommand::for_paste(session.target));
                tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "relay: done");
                RelayReport {
                    state: RelayState::Done,
                    visited,
                }
            }
            Err(err) => {
                tracing::warn!(%err, "relay: upload failed");
                self.fail(visited, RelayFailure::Upload(err.to_string()), Notice::TransferFailed)
            }
        }
    }

    /// Upload content that has no source session (raw platform data) and paste
    /// it. Skips the download leg entirely.
    pub async fn adopt(&self, destination: &str, body: Bytes, target: PasteTarget) -> RelayReport {
        let mut visited = vec![RelayState::Start, RelayState::Uploading];
        let form = UploadForm {
            field: FormField::File,
            body,
        };
        let uploaded = {
            let notices = &self.notices;
            let mut on_progress = |p: u8| notices.progress(p.min(100));
            self.transport
                .upload(destination, form, &mut on_progress)
                .await
        };

        match uploaded {
            Ok(()) => {
                visited.push(RelayState::Done);
                self.notices.progress_closed();
                self.host.dispatch(DocumentCommand::for_paste(target));
                RelayReport {
                    state: RelayState::Done,
                    visited,
                }
            }
            Err(err) => {
                tracing::warn!(%err, "adopt: upload failed");
                self.fail(visited, RelayFailure::Upload(err.to_string()), Notice::TransferFailed)
            }
        }
    }

    fn fail(
        &self,
        mut visited: Vec<RelayState>,
        failure: RelayFailure,
        notice: Notice,
    ) -> RelayReport {
        let state = RelayState::Failed(failure);
        visited.push(state.clone());
        self.notices.progress_closed();
        self.notices.notify(notice);
        RelayReport { state, visited }
    }
}

/// Validate a downloaded body: a relay blob or an HTML document. HTML is
/// normalized into a one-record blob.
fn classify(body: Bytes) -> Result<Downloaded, TransportError> {
    if let Some(records) = blob::decode(&body) {
        if blob::html_record(&records).is_some_and(payload::is_stub) {
            return Ok(Downloaded::Stub);
        }
        return Ok(Downloaded::Content(body));
    }

    match std::str::from_utf8(&body) {
        Ok(html) if html.trim_start().starts_with('<') => {
            if payload::is_stub(html) {
                Ok(Downloaded::Stub)
            } else {
                Ok(Downloaded::Content(blob::encode_html(html)))
            }
        }
        _ => Err(TransportError::Malformed(format!(
            "{} bytes, neither relay blob nor HTML",
            body.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::BlobRecord;
    use crate::stub::StubContentBuilder;
    use crate::testing::{RecordingHost, RecordingNotices, ScriptedTransport};

    fn source() -> OriginTag {
        OriginTag::new("https://b.example", "doc-b", "srv-2", "4", "T2")
    }

    fn session(fallback: Option<String>, target: PasteTarget) -> TransferSession {
        TransferSession {
            source: source(),
            destination: "https://a.example/clipboard?WOPISrc=doc-a&ServerId=srv-1&ViewId=1&Tag=T1"
                .to_string(),
            fallback,
            target,
        }
    }

    fn relay(
        transport: ScriptedTransport,
    ) -> (
        TransferRelay<ScriptedTransport>,
        Rc<RecordingHost>,
        Rc<RecordingNotices>,
    ) {
        let host = Rc::new(RecordingHost::default());
        let notices = Rc::new(RecordingNotices::default());
        let relay = TransferRelay::new(Rc::new(transport), host.clone(), notices.clone());
        (relay, host, notices)
    }

    #[tokio::test]
    async fn test_cross_session_success() {
        let bytes = blob::encode(&[BlobRecord::new("text/html", "<p>B</p>")]);
        let (relay, host, notices) = relay(ScriptedTransport::serving(bytes.clone()));

        let report = relay.relay(session(None, PasteTarget::Document)).await;

        assert_eq!(report.state, RelayState::Done);
        assert_eq!(
            report.visited,
            vec![
                RelayState::Start,
                RelayState::Downloading,
                RelayState::Uploading,
                RelayState::Done
            ]
        );
        assert_eq!(host.commands(), vec![DocumentCommand::Paste]);
        let uploads = relay.transport().uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].1.body, bytes);
        assert_eq!(uploads[0].1.field, FormField::Data);
        assert_eq!(relay.transport().downloads(), vec![source().endpoint()]);
        assert!(notices.notices().is_empty());
        assert_eq!(notices.last_progress(), Some(100));
        assert!(notices.closed() >= 1);
    }

    #[tokio::test]
    async fn test_download_failure_uses_fallback_and_dialog_target() {
        let (relay, host, _notices) = relay(ScriptedTransport::failing_download());

        let report = relay
            .relay(session(Some("<p>cached</p>".into()), PasteTarget::Dialog))
            .await;

        assert_eq!(report.state, RelayState::Done);
        assert!(report.visited(&RelayState::FallbackEncoding));
        assert_eq!(host.commands(), vec![DocumentCommand::DialogPaste]);
        let uploads = relay.transport().uploads();
        assert_eq!(uploads[0].1.body, blob::encode_html("<p>cached</p>"));
    }

    #[tokio::test]
    async fn test_downloaded_stub_fails_without_fallback() {
        let stub = StubContentBuilder::new(source()).build_stub("n/a").to_html();
        let (relay, host, notices) = relay(ScriptedTransport::serving(Bytes::from(stub.clone())));

        let report = relay
            .relay(session(Some("<p>cached</p>".into()), PasteTarget::Document))
            .await;

        assert_eq!(report.state, RelayState::Failed(RelayFailure::SourceUnavailable));
        assert!(!report.visited(&RelayState::FallbackEncoding));
        assert!(!report.visited(&RelayState::Uploading));
        assert_eq!(notices.notices(), vec![Notice::DownloadFailed]);
        assert!(host.commands().is_empty());
        assert!(relay.transport().uploads().is_empty());
    }

    #[tokio::test]
    async fn test_download_failure_with_stub_fallback_is_terminal() {
        let stub = StubContentBuilder::new(source()).build_stub("n/a").to_html();
        let (relay, _host, notices) = relay(ScriptedTransport::failing_download());

        let report = relay.relay(session(Some(stub), PasteTarget::Document)).await;

        assert_eq!(report.state, RelayState::Failed(RelayFailure::SourceUnavailable));
        assert!(!report.visited(&RelayState::FallbackEncoding));
        assert_eq!(notices.notices(), vec![Notice::DownloadFailed]);
    }

    #[tokio::test]
    async fn test_malformed_download_falls_back() {
        let (relay, _host, _notices) =
            relay(ScriptedTransport::serving(Bytes::from_static(b"\x00\x01garbage")));

        let report = relay
            .relay(session(Some("<p>cached</p>".into()), PasteTarget::Document))
            .await;

        assert_eq!(report.state, RelayState::Done);
        assert!(report.visited(&RelayState::FallbackEncoding));
    }

    #[tokio::test]
    async fn test_upload_failure() {
        let transport = ScriptedTransport::serving(Bytes::from_static(b"<p>B</p>")).failing_upload();
        let (relay, host, notices) = relay(transport);

        let report = relay.relay(session(None, PasteTarget::Document)).await;

        assert!(matches!(report.state, RelayState::Failed(RelayFailure::Upload(_))));
        assert_eq!(notices.notices(), vec![Notice::TransferFailed]);
        assert!(host.commands().is_empty());
    }

    #[tokio::test]
    async fn test_adopt_uploads_file_field() {
        let (relay, host, _notices) = relay(ScriptedTransport::default());
        let body = blob::encode(&[BlobRecord::new("image/png", &b"\x89PNG"[..])]);

        let report = relay.adopt("https://a/clipboard", body.clone(), PasteTarget::Document).await;

        assert_eq!(report.state, RelayState::Done);
        assert!(!report.visited(&RelayState::Downloading));
        let uploads = relay.transport().uploads();
        assert_eq!(uploads[0].1.field, FormField::File);
        assert_eq!(uploads[0].1.body, body);
        assert_eq!(host.commands(), vec![DocumentCommand::Paste]);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_across_legs() {
        let (relay, _host, notices) = relay(ScriptedTransport::serving(Bytes::from_static(b"<p>B</p>")));
        relay.relay(session(None, PasteTarget::Document)).await;
        let seen = notices.progress_values();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
    }
}
