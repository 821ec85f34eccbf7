//! Recording test doubles for the platform, transport and host traits.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::LocalBoxFuture;

use crate::error::TransportError;
use crate::notice::{DocumentCommand, DocumentHost, Notice, NoticeSink};
use crate::platform::{
    ClipboardEventData, ClipboardOp, PendingFile, PlatformClipboard, PlatformError, Scheduler,
    Spawner,
};
use crate::serial::SerialTracker;
use crate::transport::{ClipboardTransport, UploadForm};

#[derive(Default)]
pub struct RecordingHost {
    commands: RefCell<Vec<DocumentCommand>>,
    pub dialog_open: Cell<bool>,
}

impl RecordingHost {
    pub fn commands(&self) -> Vec<DocumentCommand> {
        self.commands.borrow().clone()
    }
}

impl DocumentHost for RecordingHost {
    fn dispatch(&self, command: DocumentCommand) {
        self.commands.borrow_mut().push(command);
    }

    fn modal_dialog_open(&self) -> bool {
        self.dialog_open.get()
    }
}

#[derive(Default)]
pub struct RecordingNotices {
    notices: RefCell<Vec<Notice>>,
    progress: RefCell<Vec<u8>>,
    closed: Cell<usize>,
}

impl RecordingNotices {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn progress_values(&self) -> Vec<u8> {
        self.progress.borrow().clone()
    }

    pub fn last_progress(&self) -> Option<u8> {
        self.progress.borrow().last().copied()
    }

    pub fn closed(&self) -> usize {
        self.closed.get()
    }
}

impl NoticeSink for RecordingNotices {
    fn notify(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }

    fn progress(&self, percent: u8) {
        self.progress.borrow_mut().push(percent);
    }

    fn progress_closed(&self) {
        self.closed.set(self.closed.get() + 1);
    }
}

/// Transport answering every download with the same body.
#[derive(Default)]
pub struct ScriptedTransport {
    body: Option<Bytes>,
    fail_upload: bool,
    during_download: RefCell<Option<Box<dyn FnOnce()>>>,
    downloads: RefCell<Vec<String>>,
    uploads: RefCell<Vec<(String, UploadForm)>>,
}

impl ScriptedTransport {
    pub fn serving(body: Bytes) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn failing_download() -> Self {
        Self::default()
    }

    pub fn failing_upload(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    /// Run `hook` while the next download is in flight.
    pub fn during_download(&self, hook: impl FnOnce() + 'static) {
        *self.during_download.borrow_mut() = Some(Box::new(hook));
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.borrow().clone()
    }

    pub fn uploads(&self) -> Vec<(String, UploadForm)> {
        self.uploads.borrow().clone()
    }

    pub fn calls(&self) -> usize {
        self.downloads.borrow().len() + self.uploads.borrow().len()
    }
}

impl ClipboardTransport for ScriptedTransport {
    async fn download(
        &self,
        url: &str,
        progress: &mut dyn FnMut(u8),
    ) -> Result<Bytes, TransportError> {
        self.downloads.borrow_mut().push(url.to_string());
        progress(0);
        let hook = self.during_download.borrow_mut().take();
        if let Some(hook) = hook {
            hook();
        }
        match &self.body {
            Some(body) => {
                progress(50);
                progress(100);
                Ok(body.clone())
            }
            None => Err(TransportError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    async fn upload(
        &self,
        url: &str,
        form: UploadForm,
        progress: &mut dyn FnMut(u8),
    ) -> Result<(), TransportError> {
        self.uploads.borrow_mut().push((url.to_string(), form));
        progress(0);
        if self.fail_upload {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: 500,
            });
        }
        progress(100);
        Ok(())
    }
}

/// Platform whose probes succeed or fail as configured. A probe that
/// "reaches" the clipboard advances the shared serial, standing in for the
/// synthesized clipboard event the real platform would dispatch.
#[derive(Default)]
pub struct MockPlatform {
    pub serial: SerialTracker,
    pub native_reaches: Cell<bool>,
    pub element_reaches: Cell<bool>,
    pub host_reaches: Cell<bool>,
    /// Attempts return false even when they reach the clipboard.
    pub report_failure: Cell<bool>,
    pub attempts: RefCell<Vec<(&'static str, ClipboardOp)>>,
}

impl MockPlatform {
    pub fn refusing(serial: SerialTracker) -> Self {
        Self {
            serial,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> Vec<(&'static str, ClipboardOp)> {
        self.attempts.borrow().clone()
    }
}

impl PlatformClipboard for MockPlatform {
    fn readable(&self) -> bool {
        false
    }

    fn writable(&self) -> bool {
        false
    }

    fn try_native_op(&self, op: ClipboardOp) -> bool {
        self.attempts.borrow_mut().push(("native", op));
        if self.native_reaches.get() {
            self.serial.next();
        }
        !self.report_failure.get()
    }

    fn try_element_op(&self, op: ClipboardOp) -> bool {
        self.attempts.borrow_mut().push(("element", op));
        if self.element_reaches.get() {
            self.serial.next();
        }
        !self.report_failure.get()
    }

    fn try_host_bridge(&self, op: ClipboardOp) -> bool {
        self.attempts.borrow_mut().push(("host", op));
        if self.host_reaches.get() {
            self.serial.next();
        }
        !self.report_failure.get()
    }
}

/// Scheduler that holds tasks until the test fires them.
#[derive(Default)]
pub struct ManualScheduler {
    tasks: RefCell<Vec<(Duration, Box<dyn FnOnce()>)>>,
}

impl ManualScheduler {
    pub fn pending(&self) -> Vec<Duration> {
        self.tasks.borrow().iter().map(|(d, _)| *d).collect()
    }

    /// Run every pending task (the timers elapsed).
    pub fn fire_all(&self) {
        let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
        for (_, task) in tasks {
            task();
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        self.tasks.borrow_mut().push((delay, task));
    }
}

/// Spawner that queues futures for the test to await.
#[derive(Default)]
pub struct QueueSpawner {
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
}

impl QueueSpawner {
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub async fn run_all(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                task.await;
            }
        }
    }
}

impl Spawner for QueueSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.tasks.borrow_mut().push(task);
    }
}

/// In-memory clipboard event.
#[derive(Default)]
pub struct MockEvent {
    pub detached: bool,
    pub data: RefCell<BTreeMap<String, String>>,
    pub order: RefCell<Vec<String>>,
    /// `None` data stands for a file that cannot be read.
    pub files: RefCell<Vec<(String, Option<Bytes>)>>,
    pub prevented: Cell<bool>,
}

impl MockEvent {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Event with no data store at all.
    pub fn without_data() -> Self {
        Self {
            detached: true,
            ..Self::default()
        }
    }

    pub fn with(self, mime: &str, data: &str) -> Self {
        self.data.borrow_mut().insert(mime.to_string(), data.to_string());
        self.order.borrow_mut().push(mime.to_string());
        self
    }

    pub fn with_file(self, mime: &str, data: &'static [u8]) -> Self {
        self.push_file(mime, Some(Bytes::from_static(data)))
    }

    pub fn with_unreadable_file(self, mime: &str) -> Self {
        self.push_file(mime, None)
    }

    fn push_file(self, mime: &str, data: Option<Bytes>) -> Self {
        if !self.order.borrow().iter().any(|t| t == "Files") {
            self.order.borrow_mut().push("Files".to_string());
        }
        self.files.borrow_mut().push((mime.to_string(), data));
        self
    }

    pub fn data(&self, mime: &str) -> Option<String> {
        self.data.borrow().get(mime).cloned()
    }
}

struct ReadyFile {
    mime: String,
    data: Option<Bytes>,
}

impl PendingFile for ReadyFile {
    fn mime(&self) -> &str {
        &self.mime
    }

    fn read(self: Box<Self>) -> LocalBoxFuture<'static, Option<Bytes>> {
        Box::pin(async move { self.data })
    }
}

impl ClipboardEventData for MockEvent {
    fn has_data(&self) -> bool {
        !self.detached
    }

    fn get_data(&self, mime: &str) -> Option<String> {
        self.data(mime).filter(|d| !d.is_empty())
    }

    fn set_data(&self, mime: &str, data: &str) -> Result<(), PlatformError> {
        if self.detached {
            return Err("no data transfer".into());
        }
        if self.data.borrow_mut().insert(mime.to_string(), data.to_string()).is_none() {
            self.order.borrow_mut().push(mime.to_string());
        }
        Ok(())
    }

    fn types(&self) -> Vec<String> {
        self.order.borrow().clone()
    }

    fn files(&self) -> Vec<Box<dyn PendingFile>> {
        self.files
            .borrow()
            .iter()
            .map(|(mime, data)| {
                Box::new(ReadyFile {
                    mime: mime.clone(),
                    data: data.clone(),
                }) as Box<dyn PendingFile>
            })
            .collect()
    }

    fn prevent_default(&self) {
        self.prevented.set(true);
    }
}
