//! Browser clipboard layer for docclip.
//!
//! Implements the platform traits of `docclip-core` with web-sys and exposes
//! a `JsClipboard` binding. It assumes a `wasm32-unknown-unknown` target
//! environment.
//!
//! # Architecture
//!
//! - `event`: `ClipboardEvent` / `DataTransfer` access
//! - `platform`: `execCommand`, the off-screen element and the host-frame bridge
//! - `runtime`: `setTimeout` scheduler and local spawner
//! - `hooks`: DOM listeners for copy, cut and paste
//! - `host`: JS callbacks for commands, notices and progress
//! - `clipboard`: the `JsClipboard` binding
//!
//! # Re-exports
//!
//! This crate re-exports `docclip-core` for convenience, so consumers only
//! need to depend on `docclip-browser`.

pub use docclip_core;
pub use docclip_core::*;

pub mod clipboard;
pub mod event;
pub mod hooks;
pub mod host;
pub mod platform;
pub mod runtime;

pub use clipboard::{BrowserController, JsClipboard, browser_controller, parse_config};
pub use event::{BrowserClipboardEvent, BrowserFile};
pub use hooks::{ClipboardHooks, DomHooks};
pub use host::{JsHost, notice_code};
pub use platform::BrowserPlatform;
pub use runtime::{LocalSpawner, TimeoutScheduler};

use wasm_bindgen::prelude::*;

/// Install the panic hook and console tracing.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    // Ignore the error when a host page already installed a subscriber.
    let _ = set_global_default(Registry::default().with(wasm_layer));
}
