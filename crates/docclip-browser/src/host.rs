//! Host callbacks supplied from JavaScript.

use js_sys::{Function, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use docclip_core::{DocumentCommand, DocumentHost, Notice, NoticeSink};

/// Forwards document commands and notices to JS callbacks.
///
/// Expected shape:
/// ```js
/// {
///   dispatch(command) {},        // ".uno:Paste", "dialogpaste", ...
///   notify(code, detail) {},     // "clipboard-access-limited", "paste"
///   progress(percent) {},        // optional; null when the transfer ends
///   dialogOpen() { return false } // optional
/// }
/// ```
pub struct JsHost {
    dispatch: Function,
    notify: Function,
    progress: Option<Function>,
    dialog_open: Option<Function>,
}

impl JsHost {
    pub fn from_object(callbacks: &JsValue) -> Result<Self, JsError> {
        Ok(Self {
            dispatch: required(callbacks, "dispatch")?,
            notify: required(callbacks, "notify")?,
            progress: optional(callbacks, "progress"),
            dialog_open: optional(callbacks, "dialogOpen"),
        })
    }
}

fn optional(callbacks: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(callbacks, &JsValue::from_str(name))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
}

fn required(callbacks: &JsValue, name: &str) -> Result<Function, JsError> {
    optional(callbacks, name).ok_or_else(|| JsError::new(&format!("missing callback: {name}")))
}

/// Stable string code and detail for a notice, as passed to JS.
pub fn notice_code(notice: &Notice) -> (&'static str, Option<&'static str>) {
    match notice {
        Notice::ClipboardAccessLimited { op } => ("clipboard-access-limited", Some(op.as_str())),
        Notice::DownloadFailed => ("download-failed", None),
        Notice::DownloadInProgress => ("download-in-progress", None),
        Notice::CopyDisabled => ("copy-disabled", None),
        Notice::TransferFailed => ("transfer-failed", None),
    }
}

impl DocumentHost for JsHost {
    fn dispatch(&self, command: DocumentCommand) {
        if let Err(e) = self
            .dispatch
            .call1(&JsValue::NULL, &JsValue::from_str(command.uno()))
        {
            tracing::warn!("dispatch({}) callback threw: {:?}", command.uno(), e);
        }
    }

    fn modal_dialog_open(&self) -> bool {
        self.dialog_open
            .as_ref()
            .and_then(|f| f.call0(&JsValue::NULL).ok())
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

impl NoticeSink for JsHost {
    fn notify(&self, notice: Notice) {
        let (code, detail) = notice_code(&notice);
        let detail = detail.map(JsValue::from_str).unwrap_or(JsValue::NULL);
        if let Err(e) = self
            .notify
            .call2(&JsValue::NULL, &JsValue::from_str(code), &detail)
        {
            tracing::warn!("notify({}) callback threw: {:?}", code, e);
        }
    }

    fn progress(&self, percent: u8) {
        if let Some(progress) = &self.progress {
            let _ = progress.call1(&JsValue::NULL, &JsValue::from(percent));
        }
    }

    fn progress_closed(&self) {
        if let Some(progress) = &self.progress {
            let _ = progress.call1(&JsValue::NULL, &JsValue::NULL);
        }
    }
}
