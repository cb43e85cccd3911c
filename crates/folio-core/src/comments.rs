//! Review comments anchored to document nodes.
//!
//! A comment points at a node id (the commented paragraph or text run) and may carry a thread
//! of replies. Comments can be resolved and reopened; deleting a comment drops its replies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Opaque identifier of a comment or reply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CommentId(u64);

impl CommentId {
    /// Wrap a raw id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reply in a comment thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    /// Reply id.
    pub id: CommentId,
    /// Author name.
    pub author: String,
    /// Reply text.
    pub body: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// A comment thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment id.
    pub id: CommentId,
    /// Id of the node the comment is attached to.
    pub node_id: String,
    /// Author name.
    pub author: String,
    /// Comment text.
    pub body: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Whether the thread is resolved.
    #[serde(default)]
    pub resolved: bool,
    /// Replies, oldest first.
    #[serde(default)]
    pub replies: Vec<Reply>,
}

/// Comment errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommentError {
    /// No comment with this id.
    #[error("comment {0} not found")]
    NotFound(CommentId),
    /// Comment and reply bodies must contain text.
    #[error("comment body is empty")]
    EmptyBody,
    /// Comments need an anchor node.
    #[error("comment anchor is empty")]
    MissingAnchor,
}

/// The comments of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    items: BTreeMap<CommentId, Comment>,
    next_id: u64,
}

fn check_body(body: &str) -> Result<(), CommentError> {
    if body.trim().is_empty() {
        return Err(CommentError::EmptyBody);
    }
    Ok(())
}

impl Comments {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted comments. Later duplicates of an id are dropped.
    pub fn from_comments(comments: impl IntoIterator<Item = Comment>) -> Self {
        let mut out = Self::new();
        for comment in comments {
            if out.items.contains_key(&comment.id) {
                log::warn!("duplicate comment id {} dropped", comment.id);
                continue;
            }
            let max_id = comment
                .replies
                .iter()
                .map(|r| r.id.get())
                .chain(std::iter::once(comment.id.get()))
                .max()
                .unwrap_or(0);
            out.next_id = out.next_id.max(max_id.saturating_add(1));
            out.items.insert(comment.id, comment);
        }
        out
    }

    fn allocate_id(&mut self) -> CommentId {
        let id = CommentId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    fn get_mut(&mut self, id: CommentId) -> Result<&mut Comment, CommentError> {
        self.items.get_mut(&id).ok_or(CommentError::NotFound(id))
    }

    /// Number of threads.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if there are no comments.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a thread.
    pub fn get(&self, id: CommentId) -> Option<&Comment> {
        self.items.get(&id)
    }

    /// Threads in id (creation) order.
    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.items.values()
    }

    /// Threads attached to `node_id`.
    pub fn for_node<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Comment> + 'a {
        self.items.values().filter(move |c| c.node_id == node_id)
    }

    /// Unresolved threads.
    pub fn open(&self) -> impl Iterator<Item = &Comment> {
        self.items.values().filter(|c| !c.resolved)
    }

    /// Start a thread on `node_id`.
    pub fn add(
        &mut self,
        node_id: impl Into<String>,
        author: impl Into<String>,
        body: impl Into<String>,
        created_at: i64,
    ) -> Result<CommentId, CommentError> {
        let node_id = node_id.into();
        let body = body.into();
        if node_id.is_empty() {
            return Err(CommentError::MissingAnchor);
        }
        check_body(&body)?;

        let id = self.allocate_id();
        self.items.insert(
            id,
            Comment {
                id,
                node_id,
                author: author.into(),
                body,
                created_at,
                resolved: false,
                replies: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Replace a thread's body. Returns `true` if the text changed.
    pub fn edit(&mut self, id: CommentId, body: impl Into<String>) -> Result<bool, CommentError> {
        let body = body.into();
        check_body(&body)?;
        let comment = self.get_mut(id)?;
        if comment.body == body {
            return Ok(false);
        }
        comment.body = body;
        Ok(true)
    }

    /// Append a reply. Replying to a resolved thread reopens it.
    pub fn reply(
        &mut self,
        id: CommentId,
        author: impl Into<String>,
        body: impl Into<String>,
        created_at: i64,
    ) -> Result<CommentId, CommentError> {
        let body = body.into();
        check_body(&body)?;
        if !self.items.contains_key(&id) {
            return Err(CommentError::NotFound(id));
        }
        let reply_id = self.allocate_id();
        let comment = self.get_mut(id)?;
        comment.resolved = false;
        comment.replies.push(Reply {
            id: reply_id,
            author: author.into(),
            body,
            created_at,
        });
        Ok(reply_id)
    }

    /// Mark a thread resolved or open. Returns `true` if the state changed.
    pub fn set_resolved(&mut self, id: CommentId, resolved: bool) -> Result<bool, CommentError> {
        let comment = self.get_mut(id)?;
        if comment.resolved == resolved {
            return Ok(false);
        }
        comment.resolved = resolved;
        Ok(true)
    }

    /// Delete a thread and its replies.
    pub fn delete(&mut self, id: CommentId) -> Result<Comment, CommentError> {
        self.items.remove(&id).ok_or(CommentError::NotFound(id))
    }

    /// Delete every thread anchored to a node that `exists` rejects. Returns the count removed.
    pub fn prune(&mut self, mut exists: impl FnMut(&str) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(|_, c| exists(&c.node_id));
        let removed = before - self.items.len();
        if removed > 0 {
            log::debug!("pruned {removed} orphaned comments");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_lifecycle() {
        let mut comments = Comments::new();
        let id = comments.add("p1", "ana", "Check this reading", 10).unwrap();
        assert!(comments.set_resolved(id, true).unwrap());
        assert!(!comments.set_resolved(id, true).unwrap());

        let reply = comments.reply(id, "ben", "Agreed", 20).unwrap();
        assert_ne!(reply, id);
        let thread = comments.get(id).unwrap();
        assert!(!thread.resolved);
        assert_eq!(thread.replies.len(), 1);

        assert!(comments.edit(id, "Check this variant").unwrap());
        assert!(!comments.edit(id, "Check this variant").unwrap());

        comments.delete(id).unwrap();
        assert!(comments.is_empty());
        assert_eq!(comments.delete(id), Err(CommentError::NotFound(id)));
    }

    #[test]
    fn test_rejects_empty_input() {
        let mut comments = Comments::new();
        assert_eq!(comments.add("p1", "ana", "  ", 0), Err(CommentError::EmptyBody));
        assert_eq!(comments.add("", "ana", "x", 0), Err(CommentError::MissingAnchor));
    }

    #[test]
    fn test_from_comments_continues_ids() {
        let mut source = Comments::new();
        let a = source.add("p1", "ana", "one", 0).unwrap();
        source.reply(a, "ben", "two", 1).unwrap();

        let mut restored = Comments::from_comments(source.iter().cloned().collect::<Vec<_>>());
        let next = restored.add("p2", "ana", "three", 2).unwrap();
        assert_eq!(next.get(), 2);
    }

    #[test]
    fn test_prune_orphans() {
        let mut comments = Comments::new();
        comments.add("p1", "ana", "keep", 0).unwrap();
        comments.add("gone", "ana", "drop", 0).unwrap();
        assert_eq!(comments.prune(|id| id == "p1"), 1);
        assert_eq!(comments.for_node("p1").count(), 1);
    }
}
