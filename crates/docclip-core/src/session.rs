//! Per-view clipboard session state.

use smol_str::SmolStr;

use crate::notice::DocumentCommand;
use crate::origin::OriginTag;
use crate::serial::SerialTracker;

/// The two most recent access tags of this session.
///
/// The backend re-keys a session from time to time; content tagged just
/// before a rotation must still be recognized as ours.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessTagHistory {
    current: SmolStr,
    previous: Option<SmolStr>,
}

impl AccessTagHistory {
    pub fn new(current: impl Into<SmolStr>) -> Self {
        Self {
            current: current.into(),
            previous: None,
        }
    }

    pub fn current(&self) -> &SmolStr {
        &self.current
    }

    pub fn previous(&self) -> Option<&SmolStr> {
        self.previous.as_ref()
    }

    /// Make `tag` current; the old current becomes previous. Re-announcing the
    /// current tag is a no-op so the previous one is not lost.
    pub fn rotate(&mut self, tag: impl Into<SmolStr>) {
        let tag = tag.into();
        if tag == self.current {
            return;
        }
        self.previous = Some(std::mem::replace(&mut self.current, tag));
    }

    pub fn matches(&self, tag: &str) -> bool {
        self.current == tag || self.previous.as_deref() == Some(tag)
    }
}

/// The richest form of the current selection the view has reported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    None,
    /// Serialized rich text, ready to go on the clipboard.
    Text { html: String, plain: String },
    /// Graphics, tables and the like; content stays on the server.
    Complex,
}

impl SelectionState {
    pub fn is_complex(&self) -> bool {
        matches!(self, SelectionState::Complex)
    }
}

/// Mutable state owned by one attached controller.
#[derive(Debug)]
pub struct ClipboardSessionState {
    identity: OriginTag,
    tags: AccessTagHistory,
    selection: SelectionState,
    /// Bumped on every selection change.
    selection_generation: u64,
    pub serial: SerialTracker,
    /// Command behind the clipboard operation currently in flight.
    pub pending_command: Option<DocumentCommand>,
    /// Generation of the refusal check that may still fire.
    pub pending_check: Option<u64>,
    check_generation: u64,
    /// A complex-selection download is running.
    pub downloading: bool,
    pub attached: bool,
}

impl ClipboardSessionState {
    pub fn new(identity: OriginTag, serial: SerialTracker) -> Self {
        let tags = AccessTagHistory::new(identity.access_tag.clone());
        Self {
            identity,
            tags,
            selection: SelectionState::None,
            selection_generation: 0,
            serial,
            pending_command: None,
            pending_check: None,
            check_generation: 0,
            downloading: false,
            attached: true,
        }
    }

    /// Origin tag for content produced now.
    pub fn origin(&self) -> OriginTag {
        self.identity.with_access_tag(self.tags.current().clone())
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selection_generation(&self) -> u64 {
        self.selection_generation
    }

    /// Replace the selection. Work started for an older selection can tell
    /// it is stale by its generation.
    pub fn set_selection(&mut self, selection: SelectionState) -> u64 {
        self.selection = selection;
        self.selection_generation += 1;
        self.selection_generation
    }

    /// Local clipboard-metadata endpoint.
    pub fn endpoint(&self) -> String {
        self.origin().endpoint()
    }

    pub fn rotate_access_tag(&mut self, tag: impl Into<SmolStr>) {
        self.tags.rotate(tag);
    }

    pub fn access_tags(&self) -> &AccessTagHistory {
        &self.tags
    }

    /// True if `origin` names this view under its current or previous tag.
    pub fn is_own(&self, origin: &OriginTag) -> bool {
        origin.same_view(&self.identity) && self.tags.matches(&origin.access_tag)
    }

    /// Start a new refusal check, superseding any pending one.
    pub fn arm_check(&mut self) -> u64 {
        self.check_generation += 1;
        self.pending_check = Some(self.check_generation);
        self.check_generation
    }

    /// Consume the check if `generation` is still the pending one.
    pub fn take_check(&mut self, generation: u64) -> bool {
        if self.pending_check == Some(generation) {
            self.pending_check = None;
            true
        } else {
            false
        }
    }
}
