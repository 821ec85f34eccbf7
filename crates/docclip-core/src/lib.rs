//! docclip-core: clipboard transfer logic for a browser document editor,
//! without platform dependencies.
//!
//! This crate provides:
//! - `OriginTag` - provenance of copied content, embedded in the HTML payload
//! - `StubContentBuilder` - placeholders for content that lives on the server
//! - `SerialTracker` - detects whether a clipboard event actually happened
//! - `TransferRelay` - moves content between two backend sessions
//! - `ClipboardController` - platform handlers, scripted commands and the
//!   legacy fallback cascade
//!
//! Platform access goes through the traits in [`platform`]; the browser layer
//! lives in `docclip-browser`.

pub mod blob;
pub mod config;
pub mod controller;
pub mod error;
pub mod notice;
pub mod origin;
pub mod payload;
pub mod platform;
pub mod progress;
pub mod relay;
pub mod serial;
pub mod session;
pub mod stub;
pub mod transport;

#[cfg(test)]
mod testing;

pub use blob::BlobRecord;
pub use config::ClipboardConfig;
pub use controller::{CascadeOutcome, ClipboardController, Collaborators, PasteRoute};
pub use error::{ConfigError, Error, TransportError};
pub use notice::{DocumentCommand, DocumentHost, Notice, NoticeSink, PasteTarget};
pub use origin::OriginTag;
pub use payload::RichPayload;
pub use platform::{
    ClipboardEventData, ClipboardHandlers, ClipboardOp, HookRegistrar, PendingFile,
    PlatformClipboard, PlatformError, Scheduler, Spawner,
};
pub use relay::{RelayFailure, RelayReport, RelayState, TransferRelay, TransferSession};
pub use serial::SerialTracker;
pub use session::{AccessTagHistory, ClipboardSessionState, SelectionState};
pub use smol_str::SmolStr;
pub use stub::StubContentBuilder;
pub use transport::{ClipboardTransport, FormField, ReqwestTransport, UploadForm};
