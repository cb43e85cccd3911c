use folio_core::{
    DocNode, Document, TocItem, TocSettings, TocTree, Zone, build_toc, extract, render_toc,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn labels(items: &[TocItem]) -> Vec<(String, String, Vec<(String, String)>)> {
    items
        .iter()
        .map(|item| {
            (
                item.number_label.clone(),
                item.title.clone(),
                item.children
                    .iter()
                    .map(|c| (c.number_label.clone(), c.title.clone()))
                    .collect(),
            )
        })
        .collect()
}

fn heading_doc(levels: &[u8]) -> Document {
    Document::new(
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| {
                DocNode::heading(level, format!("H{i}"))
                    .with_id(format!("h{i}"))
                    .with_zone(Zone::MainText)
            })
            .collect(),
    )
}

#[test]
fn test_intro_background_method() {
    let doc = Document::new(vec![
        DocNode::heading(1, "Intro").with_zone(Zone::MainText),
        DocNode::heading(2, "Background").with_zone(Zone::MainText),
        DocNode::heading(1, "Method").with_zone(Zone::MainText),
    ]);
    let settings = TocSettings {
        levels: 2,
        level1_format: "1".to_string(),
        level2_format: "1".to_string(),
        ..TocSettings::default()
    };

    let toc = build_toc(&extract(&doc, Zone::MainText), &settings);

    assert_eq!(
        labels(&toc.items),
        vec![
            (
                "1".to_string(),
                "Intro".to_string(),
                vec![("1.1".to_string(), "Background".to_string())]
            ),
            ("2".to_string(), "Method".to_string(), vec![]),
        ]
    );
}

#[test]
fn test_only_main_text_headings_are_listed() {
    let doc = Document::new(vec![
        DocNode::heading(1, "Preface").with_zone(Zone::Intro),
        DocNode::heading(1, "Chapter").with_zone(Zone::MainText),
        DocNode::heading(1, "Sources").with_zone(Zone::Bibliography),
        DocNode::heading(1, "Stray"),
    ]);
    let toc = build_toc(&extract(&doc, Zone::MainText), &TocSettings::default());
    let titles: Vec<_> = toc.flatten_preorder().iter().map(|i| i.title.clone()).collect();
    assert_eq!(titles, vec!["Chapter"]);
}

#[test]
fn test_formats_and_separator() {
    let doc = heading_doc(&[1, 2, 2, 3, 1, 2]);
    let settings = TocSettings {
        number_separator: "-".to_string(),
        level1_format: "Part I".to_string(),
        level2_format: "a)".to_string(),
        level3_format: "i".to_string(),
        ..TocSettings::default()
    };
    let toc = build_toc(&extract(&doc, Zone::MainText), &settings);
    let got: Vec<_> = toc
        .flatten_preorder()
        .iter()
        .map(|i| i.number_label.clone())
        .collect();
    assert_eq!(got, vec!["Part I", "I-a)", "I-b)", "I-b-i", "Part II", "II-a)"]);
}

#[test]
fn test_skipped_level_renders_zero_counter() {
    let doc = heading_doc(&[1, 3, 2]);
    let toc = build_toc(&extract(&doc, Zone::MainText), &TocSettings::default());
    let got: Vec<_> = toc
        .flatten_preorder()
        .iter()
        .map(|i| i.number_label.clone())
        .collect();
    assert_eq!(got, vec!["1", "1.0.1", "1.1"]);
    // Both the level-3 and the level-2 heading hang off the level-1 entry.
    assert_eq!(toc.items.len(), 1);
    assert_eq!(toc.items[0].children.len(), 2);
}

#[test]
fn test_numbering_disabled() {
    let doc = heading_doc(&[1, 2]);
    let settings = TocSettings {
        show_heading_numbers: false,
        ..TocSettings::default()
    };
    let toc = build_toc(&extract(&doc, Zone::MainText), &settings);
    assert!(toc.flatten_preorder().iter().all(|i| i.number_label.is_empty()));
}

#[test]
fn test_breadcrumb() {
    let doc = heading_doc(&[1, 2, 3, 2]);
    let toc = build_toc(&extract(&doc, Zone::MainText), &TocSettings::default());
    let path: Vec<_> = toc.breadcrumb("h2").iter().map(|i| i.id.as_str()).collect();
    assert_eq!(path, vec!["h0", "h1", "h2"]);
    assert!(toc.breadcrumb("missing").is_empty());
}

fn check_tree_shape(items: &[TocItem], parent_level: u8) {
    for item in items {
        assert!(item.level > parent_level);
        check_tree_shape(&item.children, item.level);
    }
}

#[test]
fn test_random_sequences_count_and_reset() {
    let mut rng = StdRng::seed_from_u64(0x70c);

    for _ in 0..200 {
        let count = rng.gen_range(0..40);
        let levels: Vec<u8> = (0..count).map(|_| rng.gen_range(1..=6)).collect();
        let max_level = rng.gen_range(1..=6u8);
        let settings = TocSettings {
            levels: max_level,
            ..TocSettings::default()
        };

        let doc = heading_doc(&levels);
        let toc: TocTree = build_toc(&extract(&doc, Zone::MainText), &settings);

        let expected = levels.iter().filter(|&&l| l <= max_level).count();
        assert_eq!(toc.len(), expected, "levels {levels:?}, max {max_level}");
        check_tree_shape(&toc.items, 0);

        // Pre-order equals document order; the own counter restarts at 1 after any
        // shallower heading and otherwise counts up.
        let mut last: [Option<u32>; 7] = [None; 7];
        for item in toc.flatten_preorder() {
            let own: u32 = item
                .number_label
                .rsplit('.')
                .next()
                .and_then(|n| n.parse().ok())
                .unwrap();
            let level = usize::from(item.level);
            assert_eq!(own, last[level].map_or(1, |n| n + 1), "levels {levels:?}");
            last[level] = Some(own);
            for deeper in &mut last[level + 1..] {
                *deeper = None;
            }
        }
    }
}

#[test]
fn test_render_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(7);
    let levels: Vec<u8> = (0..25).map(|_| rng.gen_range(1..=4)).collect();
    let doc = heading_doc(&levels);
    let settings = TocSettings::default();
    let toc = build_toc(&extract(&doc, Zone::MainText), &settings);

    let a = render_toc(&toc, &settings, 60);
    let b = render_toc(&toc, &settings, 60);
    assert_eq!(a, b);
    assert_eq!(a.len(), toc.len() + 1);
    assert!(a.iter().all(|n| n.attrs.section.as_ref().and_then(|m| m.zone()) == Some(Zone::Toc)));
}
