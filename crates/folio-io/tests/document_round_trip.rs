use folio_core::{
    Action, ApparatusAction, ApparatusType, DocumentSession, EditorHost, FolioConfig, MemoryEditor, Zone,
};
use folio_io::{FolioIoError, load_config_str, load_from_str, parse_document, save_to_string};
use pretty_assertions::assert_eq;
use serde_json::json;

fn editor_json() -> serde_json::Value {
    json!({
        "type": "doc",
        "content": [
            { "type": "paragraph", "attrs": { "sectionType": "intro", "id": "i" },
              "content": [{ "type": "text", "text": "Sigla" }] },
            { "type": "heading", "attrs": { "level": 1, "sectionType": "maintext", "id": "h1" },
              "content": [{ "type": "text", "text": "Liber I" }] },
            { "type": "paragraph",
              "attrs": { "sectionType": "maintext", "id": "p1", "lineNumber": 12 },
              "content": [{ "type": "text", "text": "Gallia est omnis divisa",
                            "marks": [{ "type": "comment", "attrs": { "commentId": "c1" } }] }] },
            { "type": "heading", "attrs": { "level": 2, "sectionType": "maintext", "id": "h2" },
              "content": [{ "type": "text", "text": "Caput 1" }] },
            { "type": "paragraph", "attrs": { "sectionType": "bibliography" },
              "content": [{ "type": "text", "text": "Hering 1987" }] }
        ]
    })
}

#[test]
fn test_session_save_and_reopen() {
    let config = load_config_str(
        r#"
historyCapacity = 20
apparatus = ["CRITICAL", "PAGE_NOTES"]

[toc]
level1Format = "Liber I"
"#,
    )
    .unwrap();

    let editor = MemoryEditor::new(parse_document(&editor_json()));
    let mut session = DocumentSession::new(editor, &config);
    session
        .dispatch(Action::Apparatus(ApparatusAction::Add(ApparatusType::OuterMargin)))
        .unwrap();
    session.update_table_of_contents().unwrap();
    assert_eq!(session.toc().items[0].number_label, "Liber I");

    let text = save_to_string(&session.snapshot()).unwrap();
    let loaded = load_from_str(&text).unwrap();
    assert_eq!(loaded, session.snapshot());

    let mut reopened = DocumentSession::new(MemoryEditor::empty(), &FolioConfig::default());
    reopened.restore(&loaded).unwrap();
    assert_eq!(reopened.host().document(), session.host().document());
    assert_eq!(reopened.toc(), session.toc());

    let kinds: Vec<_> = reopened
        .store()
        .state()
        .apparatus
        .iter()
        .map(|a| a.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![ApparatusType::Critical, ApparatusType::PageNotes, ApparatusType::OuterMargin]
    );
}

#[test]
fn test_editor_attributes_survive_a_save() {
    let doc = parse_document(&editor_json());
    let session = DocumentSession::new(MemoryEditor::new(doc), &FolioConfig::default());
    let text = save_to_string(&session.snapshot()).unwrap();

    let saved: serde_json::Value = serde_json::from_str(&text).unwrap();
    let main = saved["zones"]
        .as_array()
        .unwrap()
        .iter()
        .find(|z| z["zone"] == json!("maintext"))
        .unwrap();
    assert_eq!(main["content"][1]["attrs"]["lineNumber"], json!(12));
    assert_eq!(
        main["content"][1]["content"][0]["marks"][0],
        json!({ "type": "comment", "attrs": { "commentId": "c1" } })
    );

    let loaded = load_from_str(&text).unwrap();
    assert_eq!(loaded.zone(Zone::MainText).len(), 3);
    assert_eq!(loaded.zone(Zone::Intro).len(), 1);
}

#[test]
fn test_rejects_bad_input() {
    assert!(matches!(load_from_str("not json"), Err(FolioIoError::Json(_))));
    assert!(matches!(
        load_from_str(r#"{ "version": 9 }"#),
        Err(FolioIoError::UnsupportedVersion(9))
    ));
    assert!(matches!(
        load_from_str(r#"{ "zones": {} }"#),
        Err(FolioIoError::Malformed(_))
    ));
    assert!(matches!(
        load_config_str("historyCapacity = \"many\""),
        Err(FolioIoError::Toml(_))
    ));
}
