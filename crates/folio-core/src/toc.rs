//! Table-of-contents model and builder.
//!
//! The table of contents is a derived view: it is rebuilt from the main-text headings and the
//! current [`TocSettings`] whenever either changes, and is never stored on its own.
//!
//! # Example
//!
//! ```rust
//! use folio_core::{DocNode, TocSettings, build_toc};
//!
//! let intro = DocNode::heading(1, "Intro");
//! let background = DocNode::heading(2, "Background");
//! let method = DocNode::heading(1, "Method");
//!
//! let settings = TocSettings { levels: 2, ..TocSettings::default() };
//! let toc = build_toc(&[&intro, &background, &method], &settings);
//!
//! assert_eq!(toc.items[0].number_label, "1");
//! assert_eq!(toc.items[0].children[0].number_label, "1.1");
//! assert_eq!(toc.items[1].number_label, "2");
//! ```

use crate::node::DocNode;
use crate::sections::headings;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Deepest heading level the editor supports.
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Filler drawn between an entry's title and its page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabLeader {
    /// `.....`
    #[default]
    Dots,
    /// `-----`
    Dashes,
    /// `_____`
    Underline,
    /// Blank space.
    None,
}

impl TabLeader {
    /// The leader fill character.
    pub fn fill_char(self) -> char {
        match self {
            TabLeader::Dots => '.',
            TabLeader::Dashes => '-',
            TabLeader::Underline => '_',
            TabLeader::None => ' ',
        }
    }
}

/// Table-of-contents settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TocSettings {
    /// Deepest heading level included (1..=6).
    pub levels: u8,
    /// Whether entries carry computed number labels.
    pub show_heading_numbers: bool,
    /// Separator placed between per-level number components (`"."` gives `1.2.3`).
    pub number_separator: String,
    /// Number format for level 1 headings.
    pub level1_format: String,
    /// Number format for level 2 headings.
    pub level2_format: String,
    /// Number format for level 3 headings.
    pub level3_format: String,
    /// Number format for level 4 headings.
    pub level4_format: String,
    /// Number format for level 5 headings.
    pub level5_format: String,
    /// Number format for level 6 headings.
    pub level6_format: String,
    /// Whether nested entries are indented.
    pub indent_levels: bool,
    /// Whether entries end with a leader and a page-number placeholder.
    pub show_page_numbers: bool,
    /// Leader fill style.
    pub tab_leader: TabLeader,
    /// Title paragraph rendered above the entries (empty for none).
    pub title: String,
}

impl Default for TocSettings {
    fn default() -> Self {
        Self {
            levels: 3,
            show_heading_numbers: true,
            number_separator: ".".to_string(),
            level1_format: "1".to_string(),
            level2_format: "1".to_string(),
            level3_format: "1".to_string(),
            level4_format: "1".to_string(),
            level5_format: "1".to_string(),
            level6_format: "1".to_string(),
            indent_levels: true,
            show_page_numbers: true,
            tab_leader: TabLeader::Dots,
            title: "Table of Contents".to_string(),
        }
    }
}

impl TocSettings {
    /// The raw format string for `level` (1-based). Out-of-range levels use arabic numbering.
    pub fn format_string(&self, level: u8) -> &str {
        match level {
            1 => &self.level1_format,
            2 => &self.level2_format,
            3 => &self.level3_format,
            4 => &self.level4_format,
            5 => &self.level5_format,
            6 => &self.level6_format,
            _ => "1",
        }
    }

    /// The parsed number format for `level` (1-based).
    pub fn level_format(&self, level: u8) -> LevelFormat {
        LevelFormat::parse(self.format_string(level))
    }

    /// `levels` clamped into `1..=6`.
    pub fn effective_levels(&self) -> u8 {
        self.levels.clamp(1, MAX_HEADING_LEVEL)
    }
}

/// Numbering style of a single level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberStyle {
    /// `1, 2, 3`
    Arabic,
    /// `a, b, ..., z, aa`
    LowerAlpha,
    /// `A, B, ..., Z, AA`
    UpperAlpha,
    /// `i, ii, iii`
    LowerRoman,
    /// `I, II, III`
    UpperRoman,
}

impl NumberStyle {
    /// Format `n` in this style.
    ///
    /// Zero (a skipped intermediate level) and roman values beyond 3999 are written in arabic.
    pub fn format(self, n: u32) -> String {
        if n == 0 {
            return "0".to_string();
        }
        match self {
            NumberStyle::Arabic => n.to_string(),
            NumberStyle::LowerAlpha => to_alpha(n),
            NumberStyle::UpperAlpha => to_alpha(n).to_ascii_uppercase(),
            NumberStyle::LowerRoman => {
                to_roman(n).map_or_else(|| n.to_string(), |r| r.to_ascii_lowercase())
            }
            NumberStyle::UpperRoman => to_roman(n).unwrap_or_else(|| n.to_string()),
        }
    }
}

/// A parsed per-level format string such as `"1"`, `"a)"` or `"Chapter I."`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelFormat {
    /// Literal text before the number.
    pub prefix: String,
    /// Numbering style.
    pub style: NumberStyle,
    /// Literal text after the number.
    pub suffix: String,
}

static LEVEL_FORMAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<prefix>.*?)\b(?P<token>[1aAiI])\b(?P<suffix>.*)$")
        .expect("level format pattern is valid")
});

impl LevelFormat {
    /// Plain arabic numbering.
    pub fn arabic() -> Self {
        Self {
            prefix: String::new(),
            style: NumberStyle::Arabic,
            suffix: String::new(),
        }
    }

    /// Parse a format string. Strings without a style token fall back to arabic.
    pub fn parse(format: &str) -> Self {
        let Some(caps) = LEVEL_FORMAT_RE.captures(format) else {
            log::debug!("number format {format:?} has no style token; using arabic");
            return Self::arabic();
        };
        let style = match &caps["token"] {
            "a" => NumberStyle::LowerAlpha,
            "A" => NumberStyle::UpperAlpha,
            "i" => NumberStyle::LowerRoman,
            "I" => NumberStyle::UpperRoman,
            _ => NumberStyle::Arabic,
        };
        Self {
            prefix: caps["prefix"].to_string(),
            style,
            suffix: caps["suffix"].to_string(),
        }
    }

    /// Format `n` including prefix and suffix.
    pub fn format(&self, n: u32) -> String {
        format!("{}{}{}", self.prefix, self.style.format(n), self.suffix)
    }
}

fn to_alpha(mut n: u32) -> String {
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn to_roman(mut n: u32) -> Option<String> {
    const TABLE: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    if n == 0 || n > 3999 {
        return None;
    }
    let mut out = String::new();
    for (value, numeral) in TABLE {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    Some(out)
}

/// A single table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocItem {
    /// Id of the heading this entry points at.
    pub id: String,
    /// Heading text, trimmed.
    pub title: String,
    /// Heading level (1-based).
    pub level: u8,
    /// Computed number label (empty when numbering is disabled).
    pub number_label: String,
    /// Nested entries.
    pub children: Vec<TocItem>,
}

impl TocItem {
    /// Collect this item and all descendants in pre-order.
    pub fn flatten_preorder<'a>(&'a self, out: &mut Vec<&'a TocItem>) {
        out.push(self);
        for child in &self.children {
            child.flatten_preorder(out);
        }
    }

    fn path_to<'a>(&'a self, id: &str, path: &mut Vec<&'a TocItem>) -> bool {
        path.push(self);
        if self.id == id || self.children.iter().any(|c| c.path_to(id, path)) {
            return true;
        }
        path.pop();
        false
    }
}

/// A built table of contents (a forest of root entries).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TocTree {
    /// Root entries.
    pub items: Vec<TocItem>,
}

impl TocTree {
    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total entry count, nested entries included.
    pub fn len(&self) -> usize {
        self.flatten_preorder().len()
    }

    /// Flatten all entries in pre-order.
    pub fn flatten_preorder(&self) -> Vec<&TocItem> {
        let mut out = Vec::new();
        for item in &self.items {
            item.flatten_preorder(&mut out);
        }
        out
    }

    /// Find an entry by heading id.
    pub fn find_by_id(&self, id: &str) -> Option<&TocItem> {
        self.flatten_preorder().into_iter().find(|item| item.id == id)
    }

    /// Root-to-entry path for the heading `id` (empty if not present).
    pub fn breadcrumb(&self, id: &str) -> Vec<&TocItem> {
        let mut path = Vec::new();
        for item in &self.items {
            if item.path_to(id, &mut path) {
                break;
            }
        }
        path
    }
}

fn number_label(counters: &[u32], level: u8, settings: &TocSettings) -> String {
    if !settings.show_heading_numbers {
        return String::new();
    }
    let level = usize::from(level);
    let mut parts = Vec::with_capacity(level);
    for (idx, &count) in counters[..level].iter().enumerate() {
        let format = settings.level_format(idx as u8 + 1);
        if idx + 1 == level {
            parts.push(format.format(count));
        } else {
            parts.push(format.style.format(count));
        }
    }
    parts.join(&settings.number_separator)
}

fn attach(stack: &mut Vec<TocItem>, roots: &mut Vec<TocItem>, item: TocItem) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(item),
        None => roots.push(item),
    }
}

/// Build the table of contents for the given main-text nodes.
///
/// Headings are visited in document order. A heading of level `L` closes every open entry of
/// level `>= L`, increments the level-`L` counter, resets all deeper counters, and becomes a
/// child of the nearest open shallower entry (or a root). Headings deeper than
/// `settings.levels` produce no entry and leave the counters untouched.
pub fn build_toc(nodes: &[&DocNode], settings: &TocSettings) -> TocTree {
    let max_level = settings.effective_levels();
    let mut counters = [0u32; MAX_HEADING_LEVEL as usize];
    let mut stack: Vec<TocItem> = Vec::new();
    let mut roots: Vec<TocItem> = Vec::new();

    for (position, (level, node)) in headings(nodes).into_iter().enumerate() {
        if level == 0 || level > max_level {
            continue;
        }

        while stack.last().is_some_and(|open| open.level >= level) {
            if let Some(done) = stack.pop() {
                attach(&mut stack, &mut roots, done);
            }
        }

        let idx = usize::from(level) - 1;
        counters[idx] += 1;
        for deeper in &mut counters[idx + 1..] {
            *deeper = 0;
        }

        stack.push(TocItem {
            id: node
                .id()
                .map_or_else(|| format!("heading-{position}"), str::to_string),
            title: node.text_content().trim().to_string(),
            level,
            number_label: number_label(&counters, level, settings),
            children: Vec::new(),
        });
    }

    while let Some(done) = stack.pop() {
        attach(&mut stack, &mut roots, done);
    }

    TocTree { items: roots }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_styles() {
        assert_eq!(NumberStyle::Arabic.format(12), "12");
        assert_eq!(NumberStyle::LowerAlpha.format(1), "a");
        assert_eq!(NumberStyle::LowerAlpha.format(26), "z");
        assert_eq!(NumberStyle::LowerAlpha.format(27), "aa");
        assert_eq!(NumberStyle::UpperAlpha.format(28), "AB");
        assert_eq!(NumberStyle::UpperRoman.format(1994), "MCMXCIV");
        assert_eq!(NumberStyle::LowerRoman.format(4), "iv");
        assert_eq!(NumberStyle::UpperRoman.format(4000), "4000");
        assert_eq!(NumberStyle::UpperRoman.format(0), "0");
    }

    #[test]
    fn test_level_format_parse() {
        assert_eq!(LevelFormat::parse("1"), LevelFormat::arabic());
        let chapter = LevelFormat::parse("Chapter I.");
        assert_eq!(chapter.prefix, "Chapter ");
        assert_eq!(chapter.style, NumberStyle::UpperRoman);
        assert_eq!(chapter.suffix, ".");
        assert_eq!(chapter.format(3), "Chapter III.");

        let paren = LevelFormat::parse("a)");
        assert_eq!(paren.style, NumberStyle::LowerAlpha);
        assert_eq!(paren.format(2), "b)");

        assert_eq!(LevelFormat::parse("§").style, NumberStyle::Arabic);
    }

    #[test]
    fn test_skipped_intermediate_level_counts_zero() {
        let a = DocNode::heading(1, "A");
        let c = DocNode::heading(3, "C");
        let toc = build_toc(&[&a, &c], &TocSettings::default());
        assert_eq!(toc.items.len(), 1);
        assert_eq!(toc.items[0].children[0].number_label, "1.0.1");
    }

    #[test]
    fn test_numbering_disabled() {
        let a = DocNode::heading(1, "A");
        let settings = TocSettings {
            show_heading_numbers: false,
            ..TocSettings::default()
        };
        let toc = build_toc(&[&a], &settings);
        assert_eq!(toc.items[0].number_label, "");
    }

    #[test]
    fn test_breadcrumb() {
        let a = DocNode::heading(1, "A").with_id("a");
        let b = DocNode::heading(2, "B").with_id("b");
        let c = DocNode::heading(3, "C").with_id("c");
        let d = DocNode::heading(1, "D").with_id("d");
        let toc = build_toc(&[&a, &b, &c, &d], &TocSettings::default());

        let path: Vec<_> = toc.breadcrumb("c").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(path, vec!["a", "b", "c"]);
        let path: Vec<_> = toc.breadcrumb("d").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(path, vec!["d"]);
        assert!(toc.breadcrumb("zzz").is_empty());
        assert_eq!(toc.find_by_id("b").map(|i| i.title.as_str()), Some("B"));
    }
}
