//! Apparatus panels: the auxiliary text panels stacked beside the main text.
//!
//! A critical edition keeps several parallel texts next to the main one: the critical
//! apparatus proper, page notes, section notes and the two margins. The registry tracks which
//! panels exist, their order (panel stacking order), visibility, and each panel's content.
//!
//! Constraints are enforced in two ways: every mutating operation returns an
//! [`ApparatusError`] and leaves the registry unchanged when it would break a rule, and the
//! `can_*` / [`ApparatusRegistry::menu_state`] queries let the host disable the corresponding
//! menu entries up front.
//!
//! Rules:
//! - at most one [`ApparatusType::InnerMargin`] and one [`ApparatusType::OuterMargin`];
//! - at least one apparatus at all times;
//! - at least one visible apparatus at all times;
//! - a panel's type cannot change once it holds text.

use crate::node::Document;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Apparatus panel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApparatusType {
    /// Critical apparatus (variant readings).
    Critical,
    /// Notes at the foot of the page.
    PageNotes,
    /// Notes at the end of a section.
    SectionNotes,
    /// Inner margin notes.
    InnerMargin,
    /// Outer margin notes.
    OuterMargin,
}

impl ApparatusType {
    /// All types, in menu order.
    pub const ALL: [ApparatusType; 5] = [
        ApparatusType::Critical,
        ApparatusType::PageNotes,
        ApparatusType::SectionNotes,
        ApparatusType::InnerMargin,
        ApparatusType::OuterMargin,
    ];

    /// Returns `true` for types of which at most one may exist.
    pub fn is_singleton(self) -> bool {
        matches!(self, ApparatusType::InnerMargin | ApparatusType::OuterMargin)
    }

    /// Default panel title.
    pub fn default_title(self) -> &'static str {
        match self {
            ApparatusType::Critical => "Critical Apparatus",
            ApparatusType::PageNotes => "Page Notes",
            ApparatusType::SectionNotes => "Section Notes",
            ApparatusType::InnerMargin => "Inner Margin",
            ApparatusType::OuterMargin => "Outer Margin",
        }
    }
}

/// Opaque identifier of an apparatus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApparatusId(u64);

impl ApparatusId {
    /// Wrap a raw id (e.g. from a persisted layout).
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ApparatusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An apparatus panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apparatus {
    /// Identifier.
    pub id: ApparatusId,
    /// Panel title.
    pub title: String,
    /// Panel type.
    pub kind: ApparatusType,
    /// Whether the panel is shown.
    pub visible: bool,
    /// Whether editing in the panel is disabled.
    pub disabled: bool,
    /// Panel content.
    pub content: Document,
}

impl Apparatus {
    /// Create a visible, enabled, empty panel.
    pub fn new(id: ApparatusId, kind: ApparatusType, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            kind,
            visible: true,
            disabled: false,
            content: Document::default(),
        }
    }
}

/// Registry errors. A failed operation leaves the registry unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApparatusError {
    /// The id is not in the registry.
    #[error("apparatus {0} not found")]
    NotFound(ApparatusId),
    /// A singleton type already exists.
    #[error("an apparatus of type {0:?} already exists")]
    SingletonInUse(ApparatusType),
    /// The last apparatus cannot be removed.
    #[error("the last apparatus cannot be removed")]
    LastApparatus,
    /// The last visible apparatus cannot be hidden.
    #[error("the last visible apparatus cannot be hidden")]
    LastVisible,
    /// The apparatus holds text, so its type cannot change.
    #[error("apparatus {0} has content; its type cannot change")]
    HasContent(ApparatusId),
    /// A reorder request is not a permutation of the current ids.
    #[error("reorder must list every apparatus exactly once")]
    InvalidOrder,
}

/// Enabled/disabled state of one "add apparatus" menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    /// Apparatus type offered by the entry.
    pub kind: ApparatusType,
    /// Whether the entry is enabled.
    pub enabled: bool,
}

/// Ordered collection of apparatus panels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApparatusRegistry {
    entries: Vec<Apparatus>,
    next_id: u64,
}

impl Default for ApparatusRegistry {
    fn default() -> Self {
        Self::with_types(&[ApparatusType::Critical])
    }
}

impl ApparatusRegistry {
    /// Create a registry holding one panel per listed type (duplicate singletons are dropped).
    ///
    /// An empty list yields a single critical apparatus.
    pub fn with_types(types: &[ApparatusType]) -> Self {
        let mut registry = Self {
            entries: Vec::new(),
            next_id: 0,
        };
        for &kind in types {
            if let Err(err) = registry.add(kind) {
                log::warn!("default apparatus {kind:?} skipped: {err}");
            }
        }
        registry.ensure_non_empty();
        registry
    }

    /// Rebuild a registry from persisted entries.
    ///
    /// Duplicate ids and duplicate singleton types are dropped (first wins). If nothing is left
    /// a default critical apparatus is created; if nothing is visible the first entry is shown.
    pub fn from_entries(entries: Vec<Apparatus>) -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(entries.len()),
            next_id: 0,
        };
        for entry in entries {
            if registry.get(entry.id).is_some() {
                log::warn!("duplicate apparatus id {} dropped", entry.id);
                continue;
            }
            if entry.kind.is_singleton() && registry.has_type(entry.kind) {
                log::warn!("duplicate {:?} apparatus {} dropped", entry.kind, entry.id);
                continue;
            }
            registry.next_id = registry.next_id.max(entry.id.get().saturating_add(1));
            registry.entries.push(entry);
        }
        registry.ensure_non_empty();
        if !registry.entries.iter().any(|a| a.visible)
            && let Some(first) = registry.entries.first_mut()
        {
            first.visible = true;
        }
        registry
    }

    fn ensure_non_empty(&mut self) {
        if self.entries.is_empty() {
            let id = self.allocate_id();
            self.entries.push(Apparatus::new(
                id,
                ApparatusType::Critical,
                ApparatusType::Critical.default_title(),
            ));
        }
    }

    fn allocate_id(&mut self) -> ApparatusId {
        let id = ApparatusId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    fn position(&self, id: ApparatusId) -> Result<usize, ApparatusError> {
        self.entries
            .iter()
            .position(|a| a.id == id)
            .ok_or(ApparatusError::NotFound(id))
    }

    fn has_type(&self, kind: ApparatusType) -> bool {
        self.entries.iter().any(|a| a.kind == kind)
    }

    /// Number of panels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: a registry holds at least one panel.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Panels in stacking order.
    pub fn iter(&self) -> std::slice::Iter<'_, Apparatus> {
        self.entries.iter()
    }

    /// Panels in stacking order, as a slice.
    pub fn as_slice(&self) -> &[Apparatus] {
        &self.entries
    }

    /// Visible panels in stacking order.
    pub fn visible(&self) -> impl Iterator<Item = &Apparatus> {
        self.entries.iter().filter(|a| a.visible)
    }

    /// Look up a panel.
    pub fn get(&self, id: ApparatusId) -> Option<&Apparatus> {
        self.entries.iter().find(|a| a.id == id)
    }

    /// Whether `add(kind)` would succeed.
    pub fn can_add(&self, kind: ApparatusType) -> bool {
        !(kind.is_singleton() && self.has_type(kind))
    }

    /// Whether `remove(id)` would succeed.
    pub fn can_remove(&self, id: ApparatusId) -> bool {
        self.get(id).is_some() && self.entries.len() > 1
    }

    /// Whether `toggle_visibility(id)` would succeed.
    pub fn can_toggle_visibility(&self, id: ApparatusId) -> bool {
        match self.get(id) {
            Some(a) if a.visible => self.visible().count() > 1,
            Some(_) => true,
            None => false,
        }
    }

    /// Whether `change_type(id, kind)` would succeed.
    pub fn can_change_type(&self, id: ApparatusId, kind: ApparatusType) -> bool {
        self.check_change_type(id, kind).is_ok()
    }

    /// Enabled state of each "add apparatus" menu entry.
    pub fn menu_state(&self) -> Vec<MenuItem> {
        ApparatusType::ALL
            .iter()
            .map(|&kind| MenuItem {
                kind,
                enabled: self.can_add(kind),
            })
            .collect()
    }

    /// Append a new visible panel of `kind`.
    pub fn add(&mut self, kind: ApparatusType) -> Result<ApparatusId, ApparatusError> {
        if !self.can_add(kind) {
            log::debug!("rejected second {kind:?} apparatus");
            return Err(ApparatusError::SingletonInUse(kind));
        }

        let same_kind = self.entries.iter().filter(|a| a.kind == kind).count();
        let title = if same_kind == 0 {
            kind.default_title().to_string()
        } else {
            format!("{} {}", kind.default_title(), same_kind + 1)
        };

        let id = self.allocate_id();
        self.entries.push(Apparatus::new(id, kind, title));
        Ok(id)
    }

    /// Remove a panel and its content.
    pub fn remove(&mut self, id: ApparatusId) -> Result<Apparatus, ApparatusError> {
        let pos = self.position(id)?;
        if self.entries.len() == 1 {
            return Err(ApparatusError::LastApparatus);
        }
        let removed = self.entries.remove(pos);
        // Removing the only visible panel must not leave the layout blank.
        if removed.visible
            && !self.entries.iter().any(|a| a.visible)
            && let Some(first) = self.entries.first_mut()
        {
            first.visible = true;
        }
        Ok(removed)
    }

    /// Flip a panel's visibility. Returns the new visibility.
    pub fn toggle_visibility(&mut self, id: ApparatusId) -> Result<bool, ApparatusError> {
        let pos = self.position(id)?;
        if self.entries[pos].visible && self.visible().count() == 1 {
            return Err(ApparatusError::LastVisible);
        }
        let entry = &mut self.entries[pos];
        entry.visible = !entry.visible;
        Ok(entry.visible)
    }

    /// Replace the stacking order.
    ///
    /// `order` must list every current id exactly once. Entries are moved, not rebuilt.
    pub fn reorder(&mut self, order: &[ApparatusId]) -> Result<(), ApparatusError> {
        if order.len() != self.entries.len() {
            return Err(ApparatusError::InvalidOrder);
        }
        let mut slots: Vec<Option<Apparatus>> = self.entries.drain(..).map(Some).collect();
        let mut reordered = Vec::with_capacity(slots.len());
        for id in order {
            let taken = slots
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|a| a.id == *id))
                .and_then(Option::take);
            match taken {
                Some(entry) => reordered.push(entry),
                None => {
                    // Restore the original order before reporting.
                    let mut restored: Vec<Apparatus> = Vec::with_capacity(slots.len());
                    let mut moved = reordered.into_iter();
                    for slot in slots {
                        match slot {
                            Some(entry) => restored.push(entry),
                            None => restored.extend(moved.next()),
                        }
                    }
                    self.entries = restored;
                    return Err(ApparatusError::InvalidOrder);
                }
            }
        }
        self.entries = reordered;
        Ok(())
    }

    fn check_change_type(
        &self,
        id: ApparatusId,
        kind: ApparatusType,
    ) -> Result<usize, ApparatusError> {
        let pos = self.position(id)?;
        let entry = &self.entries[pos];
        if entry.kind == kind {
            return Ok(pos);
        }
        if entry.content.has_text() {
            return Err(ApparatusError::HasContent(id));
        }
        if kind.is_singleton() && self.has_type(kind) {
            return Err(ApparatusError::SingletonInUse(kind));
        }
        Ok(pos)
    }

    /// Change a panel's type. Rejected if the panel holds text or the target singleton exists.
    pub fn change_type(
        &mut self,
        id: ApparatusId,
        kind: ApparatusType,
    ) -> Result<(), ApparatusError> {
        let pos = self.check_change_type(id, kind)?;
        let entry = &mut self.entries[pos];
        if entry.kind != kind {
            log::debug!("apparatus {id} type {:?} -> {kind:?}", entry.kind);
            entry.kind = kind;
        }
        Ok(())
    }

    /// Rename a panel.
    pub fn rename(
        &mut self,
        id: ApparatusId,
        title: impl Into<String>,
    ) -> Result<(), ApparatusError> {
        let pos = self.position(id)?;
        self.entries[pos].title = title.into();
        Ok(())
    }

    /// Enable or disable editing in a panel.
    pub fn set_disabled(
        &mut self,
        id: ApparatusId,
        disabled: bool,
    ) -> Result<(), ApparatusError> {
        let pos = self.position(id)?;
        self.entries[pos].disabled = disabled;
        Ok(())
    }

    /// Replace a panel's content.
    pub fn set_content(
        &mut self,
        id: ApparatusId,
        content: Document,
    ) -> Result<(), ApparatusError> {
        let pos = self.position(id)?;
        self.entries[pos].content = content;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DocNode;

    #[test]
    fn test_default_has_one_critical() {
        let registry = ApparatusRegistry::default();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.as_slice()[0].kind, ApparatusType::Critical);
        assert_eq!(registry.as_slice()[0].title, "Critical Apparatus");
    }

    #[test]
    fn test_titles_are_numbered() {
        let mut registry = ApparatusRegistry::default();
        let id = registry.add(ApparatusType::Critical).unwrap();
        assert_eq!(registry.get(id).map(|a| a.title.as_str()), Some("Critical Apparatus 2"));
    }

    #[test]
    fn test_menu_state_disables_used_singletons() {
        let mut registry = ApparatusRegistry::default();
        registry.add(ApparatusType::OuterMargin).unwrap();
        let menu = registry.menu_state();
        let outer = menu.iter().find(|m| m.kind == ApparatusType::OuterMargin).unwrap();
        let inner = menu.iter().find(|m| m.kind == ApparatusType::InnerMargin).unwrap();
        assert!(!outer.enabled);
        assert!(inner.enabled);
    }

    #[test]
    fn test_removing_only_visible_panel_shows_another() {
        let mut registry = ApparatusRegistry::default();
        let first = registry.as_slice()[0].id;
        let second = registry.add(ApparatusType::PageNotes).unwrap();
        registry.toggle_visibility(second).unwrap();
        registry.remove(first).unwrap();
        assert!(registry.get(second).unwrap().visible);
    }

    #[test]
    fn test_reorder_rejects_unknown_ids_and_keeps_order() {
        let mut registry = ApparatusRegistry::default();
        let a = registry.as_slice()[0].id;
        let b = registry.add(ApparatusType::PageNotes).unwrap();
        let before = registry.clone();

        let err = registry.reorder(&[b, ApparatusId::new(99)]).unwrap_err();
        assert_eq!(err, ApparatusError::InvalidOrder);
        assert_eq!(registry, before);

        let err = registry.reorder(&[b, b]).unwrap_err();
        assert_eq!(err, ApparatusError::InvalidOrder);
        assert_eq!(registry, before);

        registry.reorder(&[b, a]).unwrap();
        let ids: Vec<_> = registry.iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[test]
    fn test_from_entries_drops_duplicates() {
        let entries = vec![
            Apparatus::new(ApparatusId::new(4), ApparatusType::InnerMargin, "Inner"),
            Apparatus::new(ApparatusId::new(7), ApparatusType::InnerMargin, "Inner again"),
            Apparatus::new(ApparatusId::new(4), ApparatusType::Critical, "Same id"),
        ];
        let mut registry = ApparatusRegistry::from_entries(entries);
        assert_eq!(registry.len(), 1);
        let id = registry.add(ApparatusType::Critical).unwrap();
        assert_eq!(id, ApparatusId::new(5));
    }

    #[test]
    fn test_change_type_rules() {
        let mut registry = ApparatusRegistry::default();
        let a = registry.as_slice()[0].id;
        let margin = registry.add(ApparatusType::InnerMargin).unwrap();
        let b = registry.add(ApparatusType::PageNotes).unwrap();

        assert_eq!(
            registry.change_type(b, ApparatusType::InnerMargin),
            Err(ApparatusError::SingletonInUse(ApparatusType::InnerMargin))
        );
        // Changing a singleton to its own type is a no-op, not a conflict.
        registry.change_type(margin, ApparatusType::InnerMargin).unwrap();

        registry
            .set_content(a, Document::new(vec![DocNode::paragraph("variant")]))
            .unwrap();
        assert_eq!(
            registry.change_type(a, ApparatusType::SectionNotes),
            Err(ApparatusError::HasContent(a))
        );
        assert!(!registry.can_change_type(a, ApparatusType::SectionNotes));

        registry.change_type(b, ApparatusType::SectionNotes).unwrap();
        assert_eq!(registry.get(b).unwrap().kind, ApparatusType::SectionNotes);
    }
}
