//! Outbound signals: user-facing notices and downstream document commands.
//!
//! Rendering of notices and execution of commands belong to the host UI and
//! backend connection; this crate only fires them.

use crate::platform::ClipboardOp;

/// One-shot notices surfaced to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Scripted clipboard access was refused; explain keyboard shortcuts.
    ClipboardAccessLimited { op: ClipboardOp },
    /// Content could not be fetched from its source; the user should re-copy.
    DownloadFailed,
    /// A complex-selection download is already running.
    DownloadInProgress,
    /// The document forbids copying to the system clipboard.
    CopyDisabled,
    /// The relay failed after content was obtained.
    TransferFailed,
}

/// Receives notices and transfer progress.
pub trait NoticeSink {
    fn notify(&self, notice: Notice);

    /// Combined transfer progress, 0–100.
    fn progress(&self, percent: u8);

    /// The transfer ended; hide any progress indicator.
    fn progress_closed(&self);
}

/// Where a completed paste should land.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PasteTarget {
    #[default]
    Document,
    /// A modal dialog was open when the paste gesture started.
    Dialog,
}

/// Commands sent to the document session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentCommand {
    /// Let the backend serialize the selection into its clipboard.
    Copy,
    Cut,
    CopyHyperlinkLocation,
    /// Paste the pending-paste buffer into the document.
    Paste,
    /// Paste into the currently open modal dialog.
    DialogPaste,
}

impl DocumentCommand {
    pub fn for_paste(target: PasteTarget) -> Self {
        match target {
            PasteTarget::Document => DocumentCommand::Paste,
            PasteTarget::Dialog => DocumentCommand::DialogPaste,
        }
    }

    /// UNO command name understood by the backend.
    pub fn uno(&self) -> &'static str {
        match self {
            DocumentCommand::Copy => ".uno:Copy",
            DocumentCommand::Cut => ".uno:Cut",
            DocumentCommand::CopyHyperlinkLocation => ".uno:CopyHyperlinkLocation",
            DocumentCommand::Paste => ".uno:Paste",
            DocumentCommand::DialogPaste => "dialogpaste",
        }
    }
}

/// The document view/session this controller is attached to.
pub trait DocumentHost {
    fn dispatch(&self, command: DocumentCommand);

    fn modal_dialog_open(&self) -> bool;

    fn paste_target(&self) -> PasteTarget {
        if self.modal_dialog_open() {
            PasteTarget::Dialog
        } else {
            PasteTarget::Document
        }
    }
}
