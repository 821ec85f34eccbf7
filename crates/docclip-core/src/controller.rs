//! The clipboard controller: platform event handlers, scripted clipboard
//! commands and the legacy fallback cascade.
//!
//! Copy and cut serialize the current selection into a tagged rich payload.
//! Paste looks at the payload's [`OriginTag`]: content from this view is
//! pasted straight from the backend's own clipboard, content from another
//! session goes through the [`TransferRelay`], and untagged content is
//! uploaded as raw platform data.
//!
//! Scripted commands (toolbar, context menu) cannot touch the clipboard
//! directly on most platforms, so they walk a cascade of increasingly
//! indirect attempts. Each rung only counts if it produced a real clipboard
//! event, observed as an advance of the [`SerialTracker`]. When every rung
//! fails a check is scheduled; if still nothing happened by then the user is
//! told to use keyboard shortcuts.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::blob::{self, BlobRecord};
use crate::config::ClipboardConfig;
use crate::notice::{DocumentCommand, DocumentHost, Notice, NoticeSink, PasteTarget};
use crate::origin::OriginTag;
use crate::payload;
use crate::platform::{
    ClipboardEventData, ClipboardHandlers, ClipboardOp, HookRegistrar, PendingFile,
    PlatformClipboard, Scheduler, Spawner,
};
use crate::relay::{TransferRelay, TransferSession};
use crate::serial::SerialTracker;
use crate::session::{ClipboardSessionState, SelectionState};
use crate::stub::StubContentBuilder;
use crate::transport::ClipboardTransport;

/// Everything the controller talks to.
pub struct Collaborators<T> {
    pub transport: Rc<T>,
    pub platform: Rc<dyn PlatformClipboard>,
    pub host: Rc<dyn DocumentHost>,
    pub notices: Rc<dyn NoticeSink>,
    pub scheduler: Rc<dyn Scheduler>,
    pub spawner: Rc<dyn Spawner>,
}

/// Which rung of the legacy cascade took effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CascadeOutcome {
    Native,
    Element,
    HostBridge,
    /// Nothing reached the clipboard yet; a refusal check is scheduled.
    Pending,
    /// A cascade was already running (the attempt re-entered the handlers).
    Reentrant,
    Detached,
}

/// What a paste event was handed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasteRoute {
    /// Tagged by this view: pasted from the backend's own clipboard.
    Internal,
    /// Tagged by another session: relayed.
    Relayed,
    /// Untagged: uploaded as raw platform data.
    Uploaded,
    /// No data on the event; the legacy cascade took over.
    Legacy(CascadeOutcome),
    Ignored,
}

pub struct ClipboardController<T> {
    config: ClipboardConfig,
    state: RefCell<ClipboardSessionState>,
    serial: SerialTracker,
    relay: Rc<TransferRelay<T>>,
    platform: Rc<dyn PlatformClipboard>,
    host: Rc<dyn DocumentHost>,
    notices: Rc<dyn NoticeSink>,
    scheduler: Rc<dyn Scheduler>,
    spawner: Rc<dyn Spawner>,
    this: Weak<Self>,
    in_cascade: Cell<bool>,
}

impl<T: ClipboardTransport + 'static> ClipboardController<T> {
    /// Attach a controller to one document view.
    ///
    /// `serial` is shared by every controller in the page and by the platform
    /// layer that observes clipboard events.
    pub fn attach(
        config: ClipboardConfig,
        serial: SerialTracker,
        parts: Collaborators<T>,
    ) -> Rc<Self> {
        let Collaborators {
            transport,
            platform,
            host,
            notices,
            scheduler,
            spawner,
        } = parts;
        let state = ClipboardSessionState::new(config.identity(), serial.clone());
        let relay = Rc::new(TransferRelay::new(transport, host.clone(), notices.clone()));
        tracing::debug!(origin = %state.origin(), "clipboard controller attached");

        Rc::new_cyclic(|this| Self {
            config,
            state: RefCell::new(state),
            serial,
            relay,
            platform,
            host,
            notices,
            scheduler,
            spawner,
            this: this.clone(),
            in_cascade: Cell::new(false),
        })
    }

    /// Stop reacting to events and drop any pending refusal check.
    pub fn detach(&self) {
        let mut state = self.state.borrow_mut();
        state.attached = false;
        state.pending_check = None;
        tracing::debug!("clipboard controller detached");
    }

    pub fn is_attached(&self) -> bool {
        self.state.borrow().attached
    }

    pub fn config(&self) -> &ClipboardConfig {
        &self.config
    }

    pub fn serial(&self) -> &SerialTracker {
        &self.serial
    }

    pub fn relay(&self) -> &Rc<TransferRelay<T>> {
        &self.relay
    }

    /// Origin tag stamped on content copied now.
    pub fn origin(&self) -> OriginTag {
        self.state.borrow().origin()
    }

    pub fn rotate_access_tag(&self, tag: &str) {
        self.state.borrow_mut().rotate_access_tag(tag);
    }

    /// The view reported a rich-text selection.
    pub fn set_text_selection(&self, html: impl Into<String>, plain: impl Into<String>) {
        self.state.borrow_mut().set_selection(SelectionState::Text {
            html: html.into(),
            plain: plain.into(),
        });
    }

    /// The view reported a selection whose content stays on the server.
    pub fn set_complex_selection(&self) {
        self.state.borrow_mut().set_selection(SelectionState::Complex);
    }

    pub fn clear_selection(&self) {
        self.state.borrow_mut().set_selection(SelectionState::None);
    }

    pub fn selection(&self) -> SelectionState {
        self.state.borrow().selection().clone()
    }

    /// Write the current selection to `event` as plain text and tagged HTML.
    ///
    /// Complex selections and copy-disabled documents produce a stub. A
    /// pending "copy hyperlink location" writes only the link, unless copying
    /// is disabled.
    pub fn populate_clipboard(&self, event: &dyn ClipboardEventData) -> bool {
        let (command, selection, origin) = {
            let state = self.state.borrow();
            if !state.attached {
                return false;
            }
            (state.pending_command, state.selection().clone(), state.origin())
        };

        let (html, plain) = if self.config.disable_copy {
            self.notices.notify(Notice::CopyDisabled);
            let notice = &self.config.copy_disabled_notice;
            let stub = StubContentBuilder::new(origin).build_stub(notice);
            (stub.to_html(), notice.clone())
        } else if command == Some(DocumentCommand::CopyHyperlinkLocation) {
            let link = match &selection {
                SelectionState::Text { html, plain } => {
                    payload::first_link_target(html).unwrap_or_else(|| plain.trim().to_string())
                }
                _ => String::new(),
            };
            if link.is_empty() {
                return false;
            }
            return match event.set_data("text/plain", &link) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(%err, "could not write hyperlink to clipboard");
                    false
                }
            };
        } else {
            match selection {
                SelectionState::Text { html, plain } => (payload::originate(&html, &origin), plain),
                SelectionState::Complex | SelectionState::None => {
                    let notice = &self.config.stub_notice;
                    let stub = StubContentBuilder::new(origin).build_stub(notice);
                    (stub.to_html(), notice.clone())
                }
            }
        };

        let written = event
            .set_data("text/plain", &plain)
            .and_then(|()| event.set_data("text/html", &html));
        match written {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%err, "could not write clipboard event data");
                false
            }
        }
    }

    /// Copy or cut event. Returns true when the platform default must be
    /// suppressed (our data was installed).
    pub fn on_copy_or_cut(&self, event: &dyn ClipboardEventData, op: ClipboardOp) -> bool {
        if !self.populate_clipboard(event) {
            return false;
        }
        event.prevent_default();
        let serial = self.serial.next();

        let command = self.state.borrow().pending_command.unwrap_or(match op {
            ClipboardOp::Cut => DocumentCommand::Cut,
            _ => DocumentCommand::Copy,
        });
        tracing::debug!(op = op.as_str(), serial, "clipboard data installed");
        self.host.dispatch(command);
        true
    }

    /// Paste event.
    pub fn on_paste(&self, event: &dyn ClipboardEventData) -> PasteRoute {
        if !self.is_attached() {
            return PasteRoute::Ignored;
        }
        if !event.has_data() {
            return PasteRoute::Legacy(self.run_cascade(ClipboardOp::Paste));
        }

        let target = self.host.paste_target();
        let html = event.get_data("text/html");
        let origin = html.as_deref().and_then(payload::origin_of);

        match origin {
            Some(origin) if self.state.borrow().is_own(&origin) => {
                event.prevent_default();
                self.serial.next();
                tracing::debug!("internal paste");
                self.host.dispatch(DocumentCommand::for_paste(target));
                PasteRoute::Internal
            }
            Some(origin) => {
                event.prevent_default();
                self.serial.next();
                let session = TransferSession {
                    source: origin,
                    destination: self.state.borrow().endpoint(),
                    fallback: html,
                    target,
                };
                tracing::debug!(source = %session.source, "relaying foreign paste");
                let relay = self.relay.clone();
                self.spawner.spawn(Box::pin(async move {
                    relay.relay(session).await;
                }));
                PasteRoute::Relayed
            }
            None => self.upload_raw(event, html, target),
        }
    }

    /// Untagged paste: images first, then every other offered format, with
    /// plain HTML last if the format list did not include it.
    fn upload_raw(
        &self,
        event: &dyn ClipboardEventData,
        html: Option<String>,
        target: PasteTarget,
    ) -> PasteRoute {
        let files: Vec<Box<dyn PendingFile>> = event
            .files()
            .into_iter()
            .filter(|file| file.mime().starts_with("image/"))
            .collect();

        let mut records: Vec<BlobRecord> = event
            .types()
            .into_iter()
            .filter(|mime| mime != "Files")
            .filter_map(|mime| {
                let data = event.get_data(&mime)?;
                Some(BlobRecord::new(mime, data))
            })
            .collect();
        if let Some(html) = html {
            if !records.iter().any(|r| r.mime == "text/html") {
                records.push(BlobRecord::new("text/html", html));
            }
        }

        if files.is_empty() && records.is_empty() {
            return PasteRoute::Legacy(self.run_cascade(ClipboardOp::Paste));
        }

        event.prevent_default();
        self.serial.next();
        let destination = self.state.borrow().endpoint();
        let relay = self.relay.clone();
        let notices = self.notices.clone();
        tracing::debug!(files = files.len(), formats = records.len(), "uploading untagged paste");
        self.spawner.spawn(Box::pin(async move {
            let mut ordered = Vec::with_capacity(files.len() + records.len());
            for file in files {
                let mime = file.mime().to_string();
                match file.read().await {
                    Some(data) => ordered.push(BlobRecord::new(mime, data)),
                    None => tracing::warn!(%mime, "could not read pasted file"),
                }
            }
            ordered.extend(records);
            if ordered.is_empty() {
                notices.notify(Notice::TransferFailed);
                return;
            }
            relay.adopt(&destination, blob::encode(&ordered), target).await;
        }));
        PasteRoute::Uploaded
    }

    /// Run a scripted clipboard command (toolbar, menu, shortcut emulation).
    pub fn execute(&self, command: DocumentCommand) -> CascadeOutcome {
        let op = match command {
            DocumentCommand::Copy | DocumentCommand::CopyHyperlinkLocation => ClipboardOp::Copy,
            DocumentCommand::Cut => ClipboardOp::Cut,
            DocumentCommand::Paste | DocumentCommand::DialogPaste => ClipboardOp::Paste,
        };
        self.state.borrow_mut().pending_command = Some(command);
        let outcome = self.run_cascade(op);
        self.state.borrow_mut().pending_command = None;
        outcome
    }

    /// Native command, then the off-screen element, then (paste only) the
    /// host bridge. A rung succeeds only if a clipboard event actually ran.
    fn run_cascade(&self, op: ClipboardOp) -> CascadeOutcome {
        if !self.is_attached() {
            return CascadeOutcome::Detached;
        }
        if self.in_cascade.replace(true) {
            return CascadeOutcome::Reentrant;
        }

        let before = self.serial.snapshot();
        // An attempt's return value is only logged; the serial decides.
        let reached = |attempted: bool| {
            tracing::trace!(op = op.as_str(), attempted, "cascade rung tried");
            self.serial.has_advanced_since(before)
        };

        let outcome = if reached(self.platform.try_native_op(op)) {
            CascadeOutcome::Native
        } else if reached(self.platform.try_element_op(op)) {
            CascadeOutcome::Element
        } else if op == ClipboardOp::Paste && reached(self.platform.try_host_bridge(op)) {
            CascadeOutcome::HostBridge
        } else {
            self.arm_refusal_check(op, before);
            CascadeOutcome::Pending
        };
        self.in_cascade.set(false);

        tracing::debug!(op = op.as_str(), ?outcome, "clipboard cascade");
        outcome
    }

    fn arm_refusal_check(&self, op: ClipboardOp, before: u64) {
        let generation = self.state.borrow_mut().arm_check();
        let this = self.this.clone();
        self.scheduler.schedule(
            self.config.refusal_timeout(),
            Box::new(move || {
                if let Some(this) = this.upgrade() {
                    this.check_refusal(generation, op, before);
                }
            }),
        );
    }

    fn check_refusal(&self, generation: u64, op: ClipboardOp, before: u64) {
        {
            let mut state = self.state.borrow_mut();
            if !state.attached || !state.take_check(generation) {
                return;
            }
        }
        if !self.serial.has_advanced_since(before) {
            tracing::info!(op = op.as_str(), "scripted clipboard access refused");
            self.notices.notify(Notice::ClipboardAccessLimited { op });
        }
    }

    /// Fetch the HTML of a complex selection so a following copy carries real
    /// content instead of a stub. Returns true if the selection was replaced.
    pub async fn prepare_complex_selection(&self) -> bool {
        let (url, generation) = {
            let mut state = self.state.borrow_mut();
            if !state.attached || !state.selection().is_complex() {
                return false;
            }
            if state.downloading {
                drop(state);
                self.notices.notify(Notice::DownloadInProgress);
                return false;
            }
            state.downloading = true;
            (state.origin().html_endpoint(), state.selection_generation())
        };

        let result = {
            let notices = &self.notices;
            let mut on_progress = |p: u8| notices.progress(p);
            self.relay.transport().download(&url, &mut on_progress).await
        };
        self.notices.progress_closed();
        self.state.borrow_mut().downloading = false;

        let html = match result
            .ok()
            .and_then(|body| String::from_utf8(body.to_vec()).ok())
        {
            Some(html) if !payload::is_stub(&html) => html,
            _ => {
                tracing::warn!(%url, "complex selection download failed");
                self.notices.notify(Notice::DownloadFailed);
                return false;
            }
        };

        let mut state = self.state.borrow_mut();
        if state.selection_generation() != generation {
            tracing::debug!("selection changed during download, dropping content");
            return false;
        }
        let plain = payload::plain_text(&html);
        state.set_selection(SelectionState::Text { html, plain });
        true
    }

    /// Platform event handlers bound to this controller. They hold only a
    /// weak reference, so registered hooks do not keep it alive.
    pub fn handlers(&self) -> ClipboardHandlers {
        let copy = self.this.clone();
        let cut = self.this.clone();
        let paste = self.this.clone();
        ClipboardHandlers {
            on_copy: Box::new(move |event| {
                copy.upgrade()
                    .is_some_and(|this| this.on_copy_or_cut(event, ClipboardOp::Copy))
            }),
            on_cut: Box::new(move |event| {
                cut.upgrade()
                    .is_some_and(|this| this.on_copy_or_cut(event, ClipboardOp::Cut))
            }),
            on_paste: Box::new(move |event| {
                if let Some(this) = paste.upgrade() {
                    this.on_paste(event);
                }
            }),
        }
    }

    pub fn register_platform_clipboard_hooks<R: HookRegistrar>(&self, registrar: &R) -> R::Guard {
        registrar.register_platform_clipboard_hooks(self.handlers())
    }
}
