//! Browser implementation of the clipboard capability probes.
//!
//! Every probe only *attempts* an operation. Whether the clipboard was
//! actually reached is decided by the controller, which watches for the
//! clipboard event the attempt should have produced.

use std::cell::RefCell;

use gloo_utils::format::JsValueSerdeExt;
use js_sys::Reflect;
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlDocument, HtmlElement};

use docclip_core::{ClipboardOp, PlatformClipboard};

/// Text kept in the off-screen element between uses, so a stray selection of
/// it never copies anything meaningful.
pub const OFFSCREEN_PLACEHOLDER: &str = "\u{a0}";

const OFFSCREEN_CLASS: &str = "docclip-offscreen";

/// Message posted to the embedding frame asking it to paste on our behalf.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct HostBridgeMessage<'a> {
    message_id: &'a str,
    values: HostBridgeValues<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct HostBridgeValues<'a> {
    command: &'a str,
}

pub struct BrowserPlatform {
    host_origin: Option<String>,
    offscreen: RefCell<Option<HtmlElement>>,
}

impl BrowserPlatform {
    /// `host_origin` is the embedding frame allowed to receive paste
    /// requests; `None` disables the host bridge.
    pub fn new(host_origin: Option<String>) -> Self {
        Self {
            host_origin,
            offscreen: RefCell::new(None),
        }
    }

    /// The off-screen editable element, created on first use.
    pub fn offscreen_element(&self) -> Option<HtmlElement> {
        if let Some(element) = self.offscreen.borrow().as_ref() {
            return Some(element.clone());
        }

        let document = document()?;
        let element: HtmlElement = document.create_element("div").ok()?.dyn_into().ok()?;
        element.set_class_name(OFFSCREEN_CLASS);
        let _ = element.set_attribute("contenteditable", "true");
        let _ = element.set_attribute("aria-hidden", "true");
        let _ = element.set_attribute("tabindex", "-1");
        let style = element.style();
        for (name, value) in [
            ("position", "fixed"),
            ("left", "-10000px"),
            ("top", "0"),
            ("width", "1px"),
            ("height", "1px"),
            ("overflow", "hidden"),
            ("opacity", "0"),
        ] {
            let _ = style.set_property(name, value);
        }
        reset(&element);
        document.body()?.append_child(&element).ok()?;

        *self.offscreen.borrow_mut() = Some(element.clone());
        Some(element)
    }
}

impl PlatformClipboard for BrowserPlatform {
    fn readable(&self) -> bool {
        async_clipboard_has("readText")
    }

    fn writable(&self) -> bool {
        async_clipboard_has("writeText")
    }

    fn try_native_op(&self, op: ClipboardOp) -> bool {
        exec_command(op)
    }

    fn try_element_op(&self, op: ClipboardOp) -> bool {
        let Some(element) = self.offscreen_element() else {
            return false;
        };
        let previous = document()
            .and_then(|d| d.active_element())
            .and_then(|e| e.dyn_into::<HtmlElement>().ok());

        reset(&element);
        let _ = element.focus();
        select_contents(&element);
        let attempted = exec_command(op);
        reset(&element);

        if let Some(previous) = previous {
            let _ = previous.focus();
        }
        attempted
    }

    fn try_host_bridge(&self, op: ClipboardOp) -> bool {
        let Some(origin) = self.host_origin.as_deref() else {
            return false;
        };
        let Some(window) = web_sys::window() else {
            return false;
        };
        let parent = match window.parent() {
            Ok(Some(parent)) if !js_sys::Object::is(&parent, &window) => parent,
            _ => return false,
        };

        let message = HostBridgeMessage {
            message_id: "UI_Paste",
            values: HostBridgeValues {
                command: op.as_str(),
            },
        };
        let message = match JsValue::from_serde(&message) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("could not encode host bridge message: {}", e);
                return false;
            }
        };
        match parent.post_message(&message, origin) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("host bridge post failed: {:?}", e);
                false
            }
        }
    }
}

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn reset(element: &HtmlElement) {
    element.set_text_content(Some(OFFSCREEN_PLACEHOLDER));
}

fn select_contents(element: &HtmlElement) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let (Some(document), Ok(Some(selection))) = (window.document(), window.get_selection()) else {
        return;
    };
    if let Ok(range) = document.create_range() {
        if range.select_node_contents(element).is_ok() {
            let _ = selection.remove_all_ranges();
            let _ = selection.add_range(&range);
        }
    }
}

fn exec_command(op: ClipboardOp) -> bool {
    let Some(document) = document().and_then(|d| d.dyn_into::<HtmlDocument>().ok()) else {
        return false;
    };
    match document.exec_command(op.as_str()) {
        Ok(done) => done,
        Err(e) => {
            tracing::debug!("execCommand({}) threw: {:?}", op.as_str(), e);
            false
        }
    }
}

fn async_clipboard_has(method: &str) -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let navigator = window.navigator();
    match Reflect::get(&navigator, &JsValue::from_str("clipboard")) {
        Ok(clipboard) if clipboard.is_object() => {
            Reflect::has(&clipboard, &JsValue::from_str(method)).unwrap_or(false)
        }
        _ => false,
    }
}
