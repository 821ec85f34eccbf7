//! JsClipboard - the clipboard controller exposed to JavaScript.

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::EventTarget;

use docclip_core::{
    CascadeOutcome, ClipboardConfig, ClipboardController, Collaborators, DocumentCommand,
    ReqwestTransport, SerialTracker,
};

use crate::hooks::{ClipboardHooks, DomHooks};
use crate::host::JsHost;
use crate::platform::BrowserPlatform;
use crate::runtime::{LocalSpawner, TimeoutScheduler};

thread_local! {
    /// Clipboard events seen by any controller on this page.
    static PAGE_SERIAL: SerialTracker = SerialTracker::new();
}

pub type BrowserController = ClipboardController<ReqwestTransport>;

/// Parse a config object and check it.
pub fn parse_config(config: JsValue) -> Result<ClipboardConfig, JsError> {
    let config: ClipboardConfig = serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsError::new(&format!("Invalid clipboard config: {}", e)))?;
    config
        .validate()
        .map_err(|e| JsError::new(&docclip_core::Error::from(e).to_string()))?;
    Ok(config)
}

/// Build a controller wired to the browser platform, without installing any
/// event hooks.
pub fn browser_controller(config: ClipboardConfig, host: Rc<JsHost>) -> Rc<BrowserController> {
    let platform = Rc::new(BrowserPlatform::new(config.host_origin.clone()));
    let serial = PAGE_SERIAL.with(SerialTracker::clone);
    ClipboardController::attach(
        config,
        serial,
        Collaborators {
            transport: Rc::new(ReqwestTransport::default()),
            platform,
            host: host.clone(),
            notices: host,
            scheduler: Rc::new(TimeoutScheduler),
            spawner: Rc::new(LocalSpawner),
        },
    )
}

/// Clipboard support for one document view.
#[wasm_bindgen]
pub struct JsClipboard {
    controller: Rc<BrowserController>,
    hooks: Option<ClipboardHooks>,
}

#[wasm_bindgen]
impl JsClipboard {
    /// Create a controller from a config object and host callbacks.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, callbacks: JsValue) -> Result<JsClipboard, JsError> {
        let config = parse_config(config)?;
        let host = Rc::new(JsHost::from_object(&callbacks)?);
        Ok(Self {
            controller: browser_controller(config, host),
            hooks: None,
        })
    }

    /// Listen for clipboard events on `target`, or on the document.
    pub fn attach(&mut self, target: Option<EventTarget>) -> Result<(), JsError> {
        let registrar = match target {
            Some(target) => DomHooks::new(target),
            None => DomHooks::document().ok_or_else(|| JsError::new("No document"))?,
        };
        self.hooks = Some(self.controller.register_platform_clipboard_hooks(&registrar));
        Ok(())
    }

    /// Remove event hooks and stop all pending checks.
    pub fn detach(&mut self) {
        self.hooks = None;
        self.controller.detach();
    }

    #[wasm_bindgen(js_name = setTextSelection)]
    pub fn set_text_selection(&self, html: String, plain: String) {
        self.controller.set_text_selection(html, plain);
    }

    #[wasm_bindgen(js_name = setComplexSelection)]
    pub fn set_complex_selection(&self) {
        self.controller.set_complex_selection();
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&self) {
        self.controller.clear_selection();
    }

    #[wasm_bindgen(js_name = rotateAccessTag)]
    pub fn rotate_access_tag(&self, tag: &str) {
        self.controller.rotate_access_tag(tag);
    }

    /// Encoded origin tag of content copied now.
    pub fn origin(&self) -> String {
        self.controller.origin().encode()
    }

    // === Scripted commands ===

    pub fn copy(&self) -> String {
        outcome_name(self.controller.execute(DocumentCommand::Copy)).to_string()
    }

    pub fn cut(&self) -> String {
        outcome_name(self.controller.execute(DocumentCommand::Cut)).to_string()
    }

    pub fn paste(&self) -> String {
        outcome_name(self.controller.execute(DocumentCommand::Paste)).to_string()
    }

    #[wasm_bindgen(js_name = copyHyperlinkLocation)]
    pub fn copy_hyperlink_location(&self) -> String {
        outcome_name(self.controller.execute(DocumentCommand::CopyHyperlinkLocation)).to_string()
    }

    /// Download the HTML of a complex selection. Resolves to true when the
    /// next copy will carry real content.
    #[wasm_bindgen(js_name = prepareComplexSelection)]
    pub fn prepare_complex_selection(&self) -> js_sys::Promise {
        let controller = self.controller.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            Ok(JsValue::from_bool(controller.prepare_complex_selection().await))
        })
    }
}

pub fn outcome_name(outcome: CascadeOutcome) -> &'static str {
    match outcome {
        CascadeOutcome::Native => "native",
        CascadeOutcome::Element => "element",
        CascadeOutcome::HostBridge => "host",
        CascadeOutcome::Pending => "pending",
        CascadeOutcome::Reentrant => "reentrant",
        CascadeOutcome::Detached => "detached",
    }
}
