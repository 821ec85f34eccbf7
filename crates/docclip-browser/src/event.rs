//! `ClipboardEventData` over a web-sys `ClipboardEvent`.

use bytes::Bytes;
use futures_util::future::LocalBoxFuture;
use wasm_bindgen_futures::JsFuture;
use web_sys::{ClipboardEvent, DataTransfer, File};

use docclip_core::{ClipboardEventData, PendingFile, PlatformError};

/// Browser clipboard event with its DataTransfer, if the browser exposed one.
pub struct BrowserClipboardEvent<'a> {
    event: &'a ClipboardEvent,
    data: Option<DataTransfer>,
}

impl<'a> BrowserClipboardEvent<'a> {
    pub fn new(event: &'a ClipboardEvent) -> Self {
        Self {
            event,
            data: event.clipboard_data(),
        }
    }
}

impl ClipboardEventData for BrowserClipboardEvent<'_> {
    fn has_data(&self) -> bool {
        self.data.is_some()
    }

    fn get_data(&self, mime: &str) -> Option<String> {
        let data = self.data.as_ref()?;
        data.get_data(mime).ok().filter(|s| !s.is_empty())
    }

    fn set_data(&self, mime: &str, data: &str) -> Result<(), PlatformError> {
        let transfer = self
            .data
            .as_ref()
            .ok_or_else(|| PlatformError::from("event has no clipboard data"))?;
        transfer
            .set_data(mime, data)
            .map_err(|e| PlatformError(format!("setData({mime}) failed: {e:?}")))
    }

    fn types(&self) -> Vec<String> {
        match &self.data {
            Some(data) => data.types().iter().filter_map(|t| t.as_string()).collect(),
            None => Vec::new(),
        }
    }

    fn files(&self) -> Vec<Box<dyn PendingFile>> {
        let Some(list) = self.data.as_ref().and_then(|d| d.files()) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .map(|file| Box::new(BrowserFile::new(file)) as Box<dyn PendingFile>)
            .collect()
    }

    fn prevent_default(&self) {
        self.event.prevent_default();
    }
}

/// A pasted file, read through `Blob.arrayBuffer()`.
pub struct BrowserFile {
    mime: String,
    file: File,
}

impl BrowserFile {
    pub fn new(file: File) -> Self {
        Self {
            mime: file.type_(),
            file,
        }
    }
}

impl PendingFile for BrowserFile {
    fn mime(&self) -> &str {
        &self.mime
    }

    fn read(self: Box<Self>) -> LocalBoxFuture<'static, Option<Bytes>> {
        Box::pin(async move {
            let buffer = match JsFuture::from(self.file.array_buffer()).await {
                Ok(buffer) => buffer,
                Err(e) => {
                    tracing::warn!("reading pasted {} failed: {:?}", self.mime, e);
                    return None;
                }
            };
            Some(Bytes::from(js_sys::Uint8Array::new(&buffer).to_vec()))
        })
    }
}
