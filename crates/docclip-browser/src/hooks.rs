//! Wires controller handlers to DOM `copy`, `cut` and `paste` events.

use gloo_events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use web_sys::{ClipboardEvent, EventTarget};

use docclip_core::{ClipboardEventData, ClipboardHandlers, HookRegistrar};

use crate::event::BrowserClipboardEvent;

/// Registers clipboard hooks on one event target, usually the document.
pub struct DomHooks {
    target: EventTarget,
}

impl DomHooks {
    pub fn new(target: EventTarget) -> Self {
        Self { target }
    }

    /// Hooks on `window.document`.
    pub fn document() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self::new(document.unchecked_into()))
    }
}

/// Live listeners. Dropping this removes them.
pub struct ClipboardHooks {
    _listeners: [EventListener; 3],
}

impl HookRegistrar for DomHooks {
    type Guard = ClipboardHooks;

    fn register_platform_clipboard_hooks(&self, handlers: ClipboardHandlers) -> ClipboardHooks {
        let ClipboardHandlers {
            on_copy,
            on_cut,
            on_paste,
        } = handlers;

        // Handlers call prevent_default themselves, so the listeners must not
        // be passive.
        let options = EventListenerOptions::enable_prevent_default();
        let listen = |name: &'static str, handler: Box<dyn Fn(&dyn ClipboardEventData)>| {
            EventListener::new_with_options(&self.target, name, options, move |event| {
                match event.dyn_ref::<ClipboardEvent>() {
                    Some(event) => handler(&BrowserClipboardEvent::new(event)),
                    None => tracing::warn!("{} event is not a ClipboardEvent", name),
                }
            })
        };

        tracing::debug!("registering clipboard hooks");
        ClipboardHooks {
            _listeners: [
                listen(
                    "copy",
                    Box::new(move |event: &dyn ClipboardEventData| {
                        on_copy(event);
                    }),
                ),
                listen(
                    "cut",
                    Box::new(move |event: &dyn ClipboardEventData| {
                        on_cut(event);
                    }),
                ),
                listen("paste", on_paste),
            ],
        }
    }
}
