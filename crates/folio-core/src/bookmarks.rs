//! Named bookmarks.
//!
//! A bookmark gives a node a user-visible name that can be jumped to. Names are unique
//! (compared case-insensitively, after trimming); ids are stable across renames so
//! [`crate::Mark::Bookmark`] marks in the document keep pointing at the right entry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Stable id (`bookmark-<n>`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Id of the bookmarked node.
    pub node_id: String,
}

/// Bookmark errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookmarkError {
    /// Another bookmark already uses this name.
    #[error("a bookmark named `{0}` already exists")]
    DuplicateName(String),
    /// Names must contain text.
    #[error("bookmark name is empty")]
    EmptyName,
    /// No bookmark with this id.
    #[error("bookmark `{0}` not found")]
    NotFound(String),
}

/// The bookmarks of one document, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bookmarks {
    items: Vec<Bookmark>,
    next_id: u64,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Bookmarks {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted bookmarks, dropping entries whose id or name is already taken.
    pub fn from_bookmarks(bookmarks: impl IntoIterator<Item = Bookmark>) -> Self {
        let mut out = Self::new();
        for bookmark in bookmarks {
            if out.get(&bookmark.id).is_some() || out.by_name(&bookmark.name).is_some() {
                log::warn!("duplicate bookmark `{}` dropped", bookmark.name);
                continue;
            }
            if let Some(n) = bookmark
                .id
                .strip_prefix("bookmark-")
                .and_then(|n| n.parse::<u64>().ok())
            {
                out.next_id = out.next_id.max(n.saturating_add(1));
            }
            out.items.push(bookmark);
        }
        out
    }

    fn check_name(&self, name: &str, except: Option<&str>) -> Result<(), BookmarkError> {
        if name.trim().is_empty() {
            return Err(BookmarkError::EmptyName);
        }
        let key = normalize(name);
        let taken = self
            .items
            .iter()
            .any(|b| Some(b.id.as_str()) != except && normalize(&b.name) == key);
        if taken {
            return Err(BookmarkError::DuplicateName(name.trim().to_string()));
        }
        Ok(())
    }

    /// Number of bookmarks.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if there are no bookmarks.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bookmarks in creation order.
    pub fn iter(&self) -> std::slice::Iter<'_, Bookmark> {
        self.items.iter()
    }

    /// Look up by id.
    pub fn get(&self, id: &str) -> Option<&Bookmark> {
        self.items.iter().find(|b| b.id == id)
    }

    /// Look up by name (case-insensitive).
    pub fn by_name(&self, name: &str) -> Option<&Bookmark> {
        let key = normalize(name);
        self.items.iter().find(|b| normalize(&b.name) == key)
    }

    /// Add a bookmark on `node_id`. Returns the new id.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        node_id: impl Into<String>,
    ) -> Result<String, BookmarkError> {
        let name = name.into();
        self.check_name(&name, None)?;
        let id = format!("bookmark-{}", self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.items.push(Bookmark {
            id: id.clone(),
            name: name.trim().to_string(),
            node_id: node_id.into(),
        });
        Ok(id)
    }

    /// Rename a bookmark. Returns `true` if the name changed.
    pub fn rename(&mut self, id: &str, name: impl Into<String>) -> Result<bool, BookmarkError> {
        let name = name.into();
        let pos = self
            .items
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| BookmarkError::NotFound(id.to_string()))?;
        self.check_name(&name, Some(id))?;
        let name = name.trim().to_string();
        if self.items[pos].name == name {
            return Ok(false);
        }
        self.items[pos].name = name;
        Ok(true)
    }

    /// Remove a bookmark.
    pub fn remove(&mut self, id: &str) -> Result<Bookmark, BookmarkError> {
        let pos = self
            .items
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| BookmarkError::NotFound(id.to_string()))?;
        Ok(self.items.remove(pos))
    }
}
