use folio_core::{
    Action, ApparatusAction, ApparatusError, ApparatusRegistry, ApparatusType, DocNode, Document,
    Store, StoreError,
};
use pretty_assertions::assert_eq;

#[test]
fn test_inner_margin_is_a_singleton() {
    let mut registry = ApparatusRegistry::default();
    registry.add(ApparatusType::InnerMargin).unwrap();
    assert_eq!(
        registry.add(ApparatusType::InnerMargin),
        Err(ApparatusError::SingletonInUse(ApparatusType::InnerMargin))
    );
    let count = registry
        .iter()
        .filter(|a| a.kind == ApparatusType::InnerMargin)
        .count();
    assert_eq!(count, 1);
    assert!(!registry.can_add(ApparatusType::InnerMargin));
    assert!(registry.can_add(ApparatusType::Critical));
}

#[test]
fn test_sole_apparatus_cannot_be_removed() {
    let mut registry = ApparatusRegistry::with_types(&[ApparatusType::Critical]);
    let id = registry.as_slice()[0].id;
    let before = registry.clone();

    assert!(!registry.can_remove(id));
    assert_eq!(registry.remove(id), Err(ApparatusError::LastApparatus));
    assert_eq!(registry, before);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_last_visible_cannot_be_hidden() {
    let mut registry = ApparatusRegistry::default();
    let first = registry.as_slice()[0].id;
    let second = registry.add(ApparatusType::SectionNotes).unwrap();

    assert_eq!(registry.toggle_visibility(first), Ok(false));
    assert!(!registry.can_toggle_visibility(second));
    assert_eq!(
        registry.toggle_visibility(second),
        Err(ApparatusError::LastVisible)
    );
    assert_eq!(registry.visible().count(), 1);
    assert_eq!(registry.toggle_visibility(first), Ok(true));
}

#[test]
fn test_type_change_blocked_by_content() {
    let mut registry = ApparatusRegistry::default();
    let id = registry.as_slice()[0].id;

    // Whitespace-only content does not count as text.
    registry
        .set_content(id, Document::new(vec![DocNode::paragraph("   ")]))
        .unwrap();
    registry.change_type(id, ApparatusType::PageNotes).unwrap();

    registry
        .set_content(id, Document::new(vec![DocNode::paragraph("om. A")]))
        .unwrap();
    assert_eq!(
        registry.change_type(id, ApparatusType::Critical),
        Err(ApparatusError::HasContent(id))
    );
    assert_eq!(registry.get(id).map(|a| a.kind), Some(ApparatusType::PageNotes));
}

#[test]
fn test_reorder_keeps_entries() {
    let mut registry = ApparatusRegistry::default();
    let a = registry.as_slice()[0].id;
    let b = registry.add(ApparatusType::PageNotes).unwrap();
    let c = registry.add(ApparatusType::OuterMargin).unwrap();
    registry.rename(b, "Footnotes").unwrap();
    registry.set_disabled(c, true).unwrap();

    registry.reorder(&[c, a, b]).unwrap();
    let order: Vec<_> = registry.iter().map(|x| (x.id, x.title.as_str(), x.disabled)).collect();
    assert_eq!(
        order,
        vec![(c, "Outer Margin", true), (a, "Critical Apparatus", false), (b, "Footnotes", false)]
    );
}

#[test]
fn test_menu_state_through_store() {
    let mut store = Store::default();
    store
        .dispatch(Action::Apparatus(ApparatusAction::Add(ApparatusType::OuterMargin)))
        .unwrap();

    let menu = store.state().apparatus.menu_state();
    let disabled: Vec<_> = menu.iter().filter(|m| !m.enabled).map(|m| m.kind).collect();
    assert_eq!(disabled, vec![ApparatusType::OuterMargin]);

    let err = store
        .dispatch(Action::Apparatus(ApparatusAction::Add(ApparatusType::OuterMargin)))
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::Apparatus(ApparatusError::SingletonInUse(ApparatusType::OuterMargin))
    );
    assert_eq!(store.state().apparatus.len(), 2);
}

#[test]
fn test_from_entries_recovers_invariants() {
    let mut hidden = ApparatusRegistry::default();
    let id = hidden.as_slice()[0].id;
    let mut entry = hidden.get(id).cloned().unwrap();
    entry.visible = false;
    hidden = ApparatusRegistry::from_entries(vec![entry]);
    assert_eq!(hidden.visible().count(), 1);

    let empty = ApparatusRegistry::from_entries(Vec::new());
    assert_eq!(empty.len(), 1);
    assert_eq!(empty.as_slice()[0].kind, ApparatusType::Critical);
}
