//! Network legs of a clipboard transfer.
//!
//! `GET` on a clipboard-metadata endpoint returns the session's serialized
//! selection; `POST` with a `multipart/form-data` body asks it to adopt the
//! supplied bytes as its pending-paste buffer.

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;

use crate::error::TransportError;

/// Name of the multipart field carrying the upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    /// Relayed content from another session.
    Data,
    /// Raw platform clipboard content with no known provenance.
    File,
}

impl FormField {
    pub fn name(&self) -> &'static str {
        match self {
            FormField::Data => "data",
            FormField::File => "file",
        }
    }
}

/// Body of an upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadForm {
    pub field: FormField,
    pub body: Bytes,
}

/// Transport for the clipboard-metadata endpoints.
///
/// Progress callbacks receive per-leg percentages (0–100).
#[allow(async_fn_in_trait)]
pub trait ClipboardTransport {
    async fn download(
        &self,
        url: &str,
        progress: &mut dyn FnMut(u8),
    ) -> Result<Bytes, TransportError>;

    async fn upload(
        &self,
        url: &str,
        form: UploadForm,
        progress: &mut dyn FnMut(u8),
    ) -> Result<(), TransportError>;
}

/// `reqwest`-backed transport. Works natively and on `wasm32` (fetch).
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ClipboardTransport for ReqwestTransport {
    async fn download(
        &self,
        url: &str,
        progress: &mut dyn FnMut(u8),
    ) -> Result<Bytes, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::request(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total = response.content_length().filter(|len| *len > 0);
        let stream = response.bytes_stream();
        futures_util::pin_mut!(stream);

        let mut body = BytesMut::new();
        progress(0);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| TransportError::Body(e.to_string()))?;
            body.extend_from_slice(&chunk);
            if let Some(total) = total {
                progress((body.len() as u64 * 100 / total).min(100) as u8);
            }
        }
        progress(100);

        tracing::debug!(url, bytes = body.len(), "clipboard download complete");
        Ok(body.freeze())
    }

    async fn upload(
        &self,
        url: &str,
        form: UploadForm,
        progress: &mut dyn FnMut(u8),
    ) -> Result<(), TransportError> {
        let len = form.body.len();
        let part = reqwest::multipart::Part::bytes(form.body.to_vec()).file_name("clipboard");
        let multipart = reqwest::multipart::Form::new().part(form.field.name(), part);

        progress(0);
        let response = self
            .client
            .post(url)
            .multipart(multipart)
            .send()
            .await
            .map_err(|e| TransportError::request(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        progress(100);

        tracing::debug!(url, bytes = len, field = form.field.name(), "clipboard upload complete");
        Ok(())
    }
}
