//! "Run after commit" callbacks.
//!
//! Some follow-up work must wait until a transaction has been committed to the editor (for
//! example moving focus to a node that was just inserted). Instead of ad hoc timers, callers
//! [`defer`](PostCommitQueue::defer) a task and the owner of the commit point
//! [`flush`](PostCommitQueue::flush)es the queue once the commit is done.
//!
//! # Example
//!
//! ```rust
//! use folio_core::PostCommitQueue;
//!
//! let mut queue: PostCommitQueue<Vec<&str>> = PostCommitQueue::new();
//! queue.defer("log", |log| log.push("after commit"));
//!
//! let mut log = vec!["commit"];
//! assert_eq!(queue.flush(&mut log), 1);
//! assert_eq!(log, vec!["commit", "after commit"]);
//! ```

use std::collections::VecDeque;

/// A deferred task.
pub type PostCommitTask<T> = Box<dyn FnOnce(&mut T)>;

/// FIFO queue of tasks run against `T` after the next commit.
pub struct PostCommitQueue<T> {
    tasks: VecDeque<(String, PostCommitTask<T>)>,
}

impl<T> Default for PostCommitQueue<T> {
    fn default() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }
}

impl<T> std::fmt::Debug for PostCommitQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostCommitQueue")
            .field("pending", &self.labels())
            .finish()
    }
}

impl<T> PostCommitQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task`. `label` identifies it in logs.
    pub fn defer<F>(&mut self, label: impl Into<String>, task: F)
    where
        F: FnOnce(&mut T) + 'static,
    {
        self.tasks.push_back((label.into(), Box::new(task)));
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Labels of pending tasks, in run order.
    pub fn labels(&self) -> Vec<&str> {
        self.tasks.iter().map(|(label, _)| label.as_str()).collect()
    }

    /// Drop every pending task without running it.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Run the tasks that were pending when the flush started, in FIFO order.
    ///
    /// Tasks queued while flushing wait for the next flush. Returns the number of tasks run.
    pub fn flush(&mut self, target: &mut T) -> usize {
        let batch = std::mem::take(&mut self.tasks);
        let count = batch.len();
        for (label, task) in batch {
            log::debug!("post-commit: {label}");
            task(target);
        }
        count
    }
}
