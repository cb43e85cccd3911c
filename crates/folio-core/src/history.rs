//! Human-readable edit history.
//!
//! The editor framework keeps its own structural undo stack. This tracker keeps a second, much
//! smaller list of *described* actions ("Changed case to UPPERCASE", "Toggled bold") for the
//! history popover, together with the edit ops that produced them.
//!
//! The list is ordered oldest-first and bounded: appending beyond capacity evicts the oldest
//! entry. Timestamps are wall-clock milliseconds forced to be strictly increasing.
//!
//! # Reverting
//!
//! [`HistoryTracker::revert_to`] is a logical jump, not a structural undo: it drops every entry
//! newer than the target and hands the target back so its ops can be re-applied to the live
//! document. It does not guarantee the document returns to the exact state it had when the
//! action was first recorded.

use crate::case::CaseChange;
use crate::host::{EditOp, Transaction};
use crate::node::Mark;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Default number of actions kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Source of wall-clock time for history timestamps.
pub trait Clock: Send {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A manually driven clock, shareable between a tracker and a test.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    /// Create a clock reading `millis`.
    pub fn new(millis: i64) -> Self {
        Self(Arc::new(AtomicI64::new(millis)))
    }

    /// Set the current reading.
    pub fn set(&self, millis: i64) {
        self.0.store(millis, Ordering::SeqCst);
    }

    /// Advance the current reading.
    pub fn advance(&self, millis: i64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// What kind of edit an action records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryActionType {
    /// Capitalization change.
    Capitalization(CaseChange),
    /// Character style (mark) toggle.
    CharacterStyle(Mark),
    /// Indentation change.
    Indent,
    /// Paragraph alignment change.
    Alignment,
    /// Content insertion.
    Insert,
    /// Content deletion.
    Delete,
    /// Other formatting.
    Format,
    /// An application-defined action.
    Custom(String),
}

impl HistoryActionType {
    /// Short label for the history popover.
    pub fn label(&self) -> String {
        match self {
            HistoryActionType::Capitalization(case) => format!("Case: {}", case.label()),
            HistoryActionType::CharacterStyle(mark) => format!("Style: {}", mark.type_name()),
            HistoryActionType::Indent => "Indent".to_string(),
            HistoryActionType::Alignment => "Alignment".to_string(),
            HistoryActionType::Insert => "Insert".to_string(),
            HistoryActionType::Delete => "Delete".to_string(),
            HistoryActionType::Format => "Format".to_string(),
            HistoryActionType::Custom(name) => name.clone(),
        }
    }
}

/// Opaque identifier of a history action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(u64);

impl ActionId {
    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A recorded action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryAction {
    /// Action id (monotonically increasing).
    pub id: ActionId,
    /// Action kind.
    pub action_type: HistoryActionType,
    /// Milliseconds since the Unix epoch, strictly increasing across the list.
    pub timestamp: i64,
    /// The affected text, as shown in the popover.
    pub content: String,
    /// Human-readable description.
    pub description: String,
    /// The document ops to re-apply on revert.
    pub ops: Vec<EditOp>,
}

/// Bounded list of described actions.
pub struct HistoryTracker {
    actions: VecDeque<HistoryAction>,
    capacity: usize,
    next_id: u64,
    last_timestamp: Option<i64>,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for HistoryTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryTracker")
            .field("len", &self.actions.len())
            .field("capacity", &self.capacity)
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Default for HistoryTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryTracker {
    /// Create a tracker using the system clock. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, SystemClock)
    }

    /// Create a tracker with a custom clock.
    pub fn with_clock<C>(capacity: usize, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        Self {
            actions: VecDeque::new(),
            capacity: capacity.max(1),
            next_id: 0,
            last_timestamp: None,
            clock: Box::new(clock),
        }
    }

    /// Maximum number of actions kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of actions kept.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions, oldest first.
    pub fn actions(&self) -> impl DoubleEndedIterator<Item = &HistoryAction> + ExactSizeIterator {
        self.actions.iter()
    }

    /// The newest action.
    pub fn latest(&self) -> Option<&HistoryAction> {
        self.actions.back()
    }

    /// Look up an action by id.
    pub fn get(&self, id: ActionId) -> Option<&HistoryAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Forget every action.
    pub fn clear(&mut self) {
        self.actions.clear();
    }

    fn next_timestamp(&mut self) -> i64 {
        let now = self.clock.now_millis();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    /// Append an action, evicting the oldest when over capacity.
    pub fn track(
        &mut self,
        action_type: HistoryActionType,
        description: impl Into<String>,
        content: impl Into<String>,
        ops: Vec<EditOp>,
    ) -> ActionId {
        let id = ActionId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let timestamp = self.next_timestamp();

        self.actions.push_back(HistoryAction {
            id,
            action_type,
            timestamp,
            content: content.into(),
            description: description.into(),
            ops,
        });

        while self.actions.len() > self.capacity {
            if let Some(evicted) = self.actions.pop_front() {
                log::debug!("history full; evicted action {}", evicted.id.get());
            }
        }

        id
    }

    /// Record a transaction if it carries tracked-edit metadata.
    pub fn observe(&mut self, transaction: &Transaction) -> Option<ActionId> {
        let tracked = transaction.tracked.as_ref()?;
        let ops = transaction
            .ops
            .iter()
            .filter(|op| op.changes_document())
            .cloned()
            .collect();
        Some(self.track(
            tracked.action_type.clone(),
            tracked.description.clone(),
            tracked.content.clone(),
            ops,
        ))
    }

    /// Jump back to the action `id`.
    ///
    /// Drops every newer action and returns the target so the caller can re-apply its ops.
    /// Returns `None` (and changes nothing) if `id` is not in the list.
    pub fn revert_to(&mut self, id: ActionId) -> Option<HistoryAction> {
        let Some(pos) = self.actions.iter().position(|a| a.id == id) else {
            log::info!("revert to unknown history action {}; ignored", id.get());
            return None;
        };
        let dropped = self.actions.len() - pos - 1;
        self.actions.truncate(pos + 1);
        log::debug!("reverted to action {} ({dropped} newer dropped)", id.get());
        self.actions.get(pos).cloned()
    }
}
