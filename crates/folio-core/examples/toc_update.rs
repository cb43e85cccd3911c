//! Table of contents example
//!
//! Builds a small edition, subscribes to store changes, renders the table of contents into the
//! document and prints it.

use folio_core::{
    Action, DocNode, Document, DocumentSession, EditorAction, EditorHost, FolioConfig,
    MemoryEditor, TabLeader, TocSettings, Zone, extract,
};
use std::sync::{Arc, Mutex};

fn main() {
    println!("=== Table of contents ===\n");

    let doc = Document::new(vec![
        DocNode::paragraph("Sigla codicum").with_zone(Zone::Intro),
        DocNode::heading(1, "Liber primus").with_id("l1").with_zone(Zone::MainText),
        DocNode::heading(2, "De bello").with_id("l1c1").with_zone(Zone::MainText),
        DocNode::heading(2, "De pace").with_id("l1c2").with_zone(Zone::MainText),
        DocNode::heading(1, "Liber secundus").with_id("l2").with_zone(Zone::MainText),
        DocNode::paragraph("Editiones").with_zone(Zone::Bibliography),
    ]);
    let mut session = DocumentSession::new(MemoryEditor::new(doc), &FolioConfig::default());

    let change_count = Arc::new(Mutex::new(0));
    let change_count_clone = change_count.clone();
    session.store_mut().subscribe(move |change| {
        let mut count = change_count_clone.lock().unwrap();
        *count += 1;
        println!(
            "  change #{}: {:?} (version {} -> {})",
            *count, change.slice, change.old_version, change.new_version
        );
    });

    println!("1. Roman chapters, dotted leader:");
    let settings = TocSettings {
        level1_format: "Book I".to_string(),
        level2_format: "1.".to_string(),
        tab_leader: TabLeader::Dots,
        ..TocSettings::default()
    };
    session
        .dispatch(Action::Editor(EditorAction::SetTocSettings(settings)))
        .unwrap();

    println!("\n2. Rendering:");
    session.update_table_of_contents().unwrap();
    for node in extract(session.host().document(), Zone::Toc) {
        println!("  {}", node.text_content());
    }

    println!(
        "\n3. Selection after update: {:?}",
        session.host().selection()
    );
    println!("   Store changes observed: {}", *change_count.lock().unwrap());
}
