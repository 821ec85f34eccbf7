//! Platform abstraction traits for clipboard operations.
//!
//! These traits define the interface between the clipboard protocol and the
//! host platform (browser DOM, test doubles). The controller only ever talks
//! to the platform through them, so the protocol runs unchanged without a
//! real browser.

use std::time::Duration;

use bytes::Bytes;
use futures_util::future::LocalBoxFuture;

/// Error type for platform operations.
#[derive(Debug, Clone)]
pub struct PlatformError(pub String);

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// The three platform clipboard operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClipboardOp {
    Copy,
    Cut,
    Paste,
}

impl ClipboardOp {
    /// Name of the platform command (`document.execCommand` argument).
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipboardOp::Copy => "copy",
            ClipboardOp::Cut => "cut",
            ClipboardOp::Paste => "paste",
        }
    }
}

/// Data carried by one platform clipboard event.
///
/// Valid only for the synchronous duration of the event handler.
pub trait ClipboardEventData {
    /// Whether the event exposes a data store at all.
    fn has_data(&self) -> bool;

    /// Read one format. Empty strings are reported as `None`.
    fn get_data(&self, mime: &str) -> Option<String>;

    fn set_data(&self, mime: &str, data: &str) -> Result<(), PlatformError>;

    /// Format names in platform order. Files show up as `"Files"`.
    fn types(&self) -> Vec<String>;

    /// Files attached to the event.
    fn files(&self) -> Vec<Box<dyn PendingFile>>;

    /// Suppress the platform's default handling.
    fn prevent_default(&self);
}

/// A file from a clipboard event whose bytes can only be read asynchronously.
pub trait PendingFile {
    fn mime(&self) -> &str;

    fn read(self: Box<Self>) -> LocalBoxFuture<'static, Option<Bytes>>;
}

/// Capability probes for platforms that refuse scripted clipboard access.
///
/// Every `try_*` call reports whether the primitive could be invoked at all;
/// whether it actually reached the clipboard is judged by the serial.
pub trait PlatformClipboard {
    /// Whether the async read API is available.
    fn readable(&self) -> bool;

    /// Whether the async write API is available.
    fn writable(&self) -> bool;

    /// Ask the platform's generic command primitive to run `op`.
    fn try_native_op(&self, op: ClipboardOp) -> bool;

    /// Run `op` against the off-screen editable element.
    fn try_element_op(&self, op: ClipboardOp) -> bool;

    /// Ask a hosting parent frame to perform `op` (paste only).
    fn try_host_bridge(&self, op: ClipboardOp) -> bool;
}

/// One-shot delayed task execution.
pub trait Scheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>);
}

/// Runs futures on the single-threaded event loop.
pub trait Spawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// Handler for copy and cut. Returns true when the caller must suppress the
/// platform default.
pub type CopyCutHandler = Box<dyn Fn(&dyn ClipboardEventData) -> bool>;

/// Handler for paste. Prevents default itself when it takes over.
pub type PasteHandler = Box<dyn Fn(&dyn ClipboardEventData)>;

/// Event handlers to be wired to the platform's clipboard events.
pub struct ClipboardHandlers {
    pub on_copy: CopyCutHandler,
    pub on_cut: CopyCutHandler,
    pub on_paste: PasteHandler,
}

/// Installs [`ClipboardHandlers`] on the platform.
pub trait HookRegistrar {
    /// Keeps the hooks alive; dropping it unregisters them.
    type Guard;

    fn register_platform_clipboard_hooks(&self, handlers: ClipboardHandlers) -> Self::Guard;
}
