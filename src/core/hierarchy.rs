//! Expandable tag hierarchies ("Places", "Topics", …).
//!
//! A forest of [`Hier`] nodes mirrors a hierarchical tag taxonomy.  Each
//! node owns its children outright, so every operation here is a plain
//! structural recursion over `&mut [Hier]` with no cycle risk.
//!
//! The open/closed flag is pure UI state: the renderer lists a node's
//! children only while the node is open.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::metadata::null_as_default;

// ───────────────────────────────────────── node ──────────────

/// A single named node in a tag hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Hier {
    /// Unique among siblings.
    pub name: String,
    /// `None` means closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<Hier>,
}

impl Hier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            open: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(name: impl Into<String>, children: Vec<Hier>) -> Self {
        Self {
            name: name.into(),
            open: None,
            children,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.unwrap_or(false)
    }
}

// ───────────────────────────────────────── open / close ──────

/// Mark every node in the forest closed, recursively.
pub fn close_hierarchy(forest: &mut [Hier]) {
    for node in forest {
        node.open = Some(false);
        close_hierarchy(&mut node.children);
    }
}

/// Open each node along `path` (segments separated by `/`, whitespace around
/// a segment ignored).
///
/// The walk stops silently at the first segment with no matching sibling, or
/// when a matched node has no children left to descend into.  Nodes opened
/// before the stop stay open.
pub fn open_hierarchy_path(forest: &mut [Hier], path: &str) {
    let mut level: &mut [Hier] = forest;
    for segment in path.split('/').map(str::trim) {
        let siblings = level;
        let Some(node) = siblings.iter_mut().find(|h| h.name == segment) else {
            return;
        };
        node.open = Some(true);
        if node.children.is_empty() {
            return;
        }
        level = node.children.as_mut_slice();
    }
}

// ───────────────────────────────────────── values ────────────

/// Why a string could not be read as a [`HierValue`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierValueError {
    #[error("hierarchical values cannot contain | characters")]
    Pipe,
    #[error("hierarchical values cannot have empty components")]
    EmptyComponent,
}

/// A parsed hierarchical tag value, e.g. `Places / USA / California`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HierValue(Vec<String>);

impl HierValue {
    pub fn components(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for HierValue {
    fn from(components: Vec<String>) -> Self {
        Self(components)
    }
}

impl fmt::Display for HierValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" / "))
    }
}

impl FromStr for HierValue {
    type Err = HierValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hier_value(s)
    }
}

/// Split a `/`-separated tag value into trimmed components.
///
/// A blank string is the empty value.
pub fn parse_hier_value(s: &str) -> Result<HierValue, HierValueError> {
    if s.trim().is_empty() {
        return Ok(HierValue::default());
    }
    let mut components = Vec::new();
    for word in s.split('/') {
        if word.contains('|') {
            return Err(HierValueError::Pipe);
        }
        let word = word.trim();
        if word.is_empty() {
            return Err(HierValueError::EmptyComponent);
        }
        components.push(word.to_string());
    }
    Ok(HierValue(components))
}

// ───────────────────────────────────────── building ──────────

/// Insert `value` as a path into the forest, reusing nodes that already
/// exist.  New nodes are placed so every sibling list stays sorted by name.
pub fn add_to_hierarchy(forest: &mut Vec<Hier>, value: &HierValue) {
    insert_components(forest, value.components());
}

fn insert_components(forest: &mut Vec<Hier>, components: &[String]) {
    let Some((first, rest)) = components.split_first() else {
        return;
    };
    if let Some(existing) = forest.iter_mut().find(|h| &h.name == first) {
        insert_components(&mut existing.children, rest);
        return;
    }
    let mut node = Hier::new(first.clone());
    insert_components(&mut node.children, rest);
    forest.push(node);
    forest.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Build a fresh forest from a set of tag values.
pub fn build_hierarchy<'a>(values: impl IntoIterator<Item = &'a HierValue>) -> Vec<Hier> {
    let mut forest = Vec::new();
    for value in values {
        add_to_hierarchy(&mut forest, value);
    }
    forest
}

// ───────────────────────────────────────── addressing ────────

/// Path of child indices from the forest root to a node.
pub type NodePath = Vec<usize>;

pub fn node_at_mut<'a>(forest: &'a mut [Hier], path: &[usize]) -> Option<&'a mut Hier> {
    let (&first, rest) = path.split_first()?;
    let node = forest.get_mut(first)?;
    if rest.is_empty() {
        Some(node)
    } else {
        node_at_mut(&mut node.children, rest)
    }
}

/// The tag value named by walking `path`, e.g. `Places / USA`.
pub fn value_at(forest: &[Hier], path: &[usize]) -> Option<HierValue> {
    let mut names = Vec::with_capacity(path.len());
    let mut level = forest;
    for &i in path {
        let node = level.get(i)?;
        names.push(node.name.clone());
        level = node.children.as_slice();
    }
    if names.is_empty() {
        None
    } else {
        Some(HierValue(names))
    }
}

/// Set the open flag of the node at `path`.  Returns `false` when the path
/// does not address a node.
pub fn set_open(forest: &mut [Hier], path: &[usize], open: bool) -> bool {
    match node_at_mut(forest, path) {
        Some(node) => {
            node.open = Some(open);
            true
        }
        None => false,
    }
}

// ───────────────────────────────────────── flattening ────────

/// One renderable row of a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierRow {
    pub path: NodePath,
    pub depth: usize,
    pub name: String,
    pub has_children: bool,
    pub open: bool,
}

/// Flatten the forest into the rows currently visible: children are listed
/// only beneath open nodes.
pub fn visible_rows(forest: &[Hier]) -> Vec<HierRow> {
    let mut rows = Vec::new();
    let mut path = Vec::new();
    collect_rows(forest, &mut path, &mut rows);
    rows
}

fn collect_rows(level: &[Hier], path: &mut NodePath, rows: &mut Vec<HierRow>) {
    for (i, node) in level.iter().enumerate() {
        path.push(i);
        rows.push(HierRow {
            path: path.clone(),
            depth: path.len() - 1,
            name: node.name.clone(),
            has_children: !node.children.is_empty(),
            open: node.is_open(),
        });
        if node.is_open() {
            collect_rows(&node.children, path, rows);
        }
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn places() -> Vec<Hier> {
        vec![
            Hier::with_children(
                "Animals",
                vec![Hier::with_children(
                    "Birds",
                    vec![Hier::new("Robin"), Hier::new("Sparrow")],
                )],
            ),
            Hier::with_children("USA", vec![Hier::new("California"), Hier::new("Oregon")]),
        ]
    }

    fn all_closed(forest: &[Hier]) -> bool {
        forest
            .iter()
            .all(|h| !h.is_open() && all_closed(&h.children))
    }

    #[test]
    fn close_hierarchy_closes_every_descendant() {
        let mut forest = places();
        open_hierarchy_path(&mut forest, "Animals / Birds / Sparrow");
        open_hierarchy_path(&mut forest, "USA/Oregon");

        close_hierarchy(&mut forest);
        assert!(all_closed(&forest));
    }

    #[test]
    fn close_hierarchy_is_idempotent() {
        let mut once = places();
        open_hierarchy_path(&mut once, "Animals / Birds");
        close_hierarchy(&mut once);

        let mut twice = once.clone();
        close_hierarchy(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn open_path_opens_each_level() {
        let mut forest = vec![Hier::with_children("A", vec![Hier::new("B")])];
        open_hierarchy_path(&mut forest, "A / B");
        assert_eq!(forest[0].open, Some(true));
        assert_eq!(forest[0].children[0].open, Some(true));
    }

    #[test]
    fn open_path_deeper_than_tree_stops_at_leaf() {
        let mut forest = vec![Hier::new("A")];
        open_hierarchy_path(&mut forest, "A/B");
        assert_eq!(forest[0].open, Some(true));
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn open_path_without_top_level_match_changes_nothing() {
        let mut forest = vec![Hier::new("X")];
        let before = forest.clone();
        open_hierarchy_path(&mut forest, "A");
        assert_eq!(forest, before);
    }

    #[test]
    fn partial_match_keeps_opened_prefix() {
        let mut forest = places();
        open_hierarchy_path(&mut forest, "Animals / Fish / Trout");
        assert!(forest[0].is_open());
        assert!(!forest[0].children[0].is_open());
        assert!(!forest[1].is_open());
    }

    #[test]
    fn parse_trims_components() {
        let value = parse_hier_value(" USA /California/ San Mateo ").unwrap();
        assert_eq!(value.components(), ["USA", "California", "San Mateo"]);
        assert_eq!(value.to_string(), "USA / California / San Mateo");
        assert!(parse_hier_value("   ").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_bad_components() {
        assert_eq!(parse_hier_value("a | b"), Err(HierValueError::Pipe));
        assert_eq!(parse_hier_value("a //b"), Err(HierValueError::EmptyComponent));
        assert_eq!("/a".parse::<HierValue>(), Err(HierValueError::EmptyComponent));
    }

    #[test]
    fn add_keeps_siblings_sorted_and_merges_prefixes() {
        let values: Vec<HierValue> = ["USA / Oregon", "Canada", "USA / California / LA"]
            .iter()
            .map(|s| parse_hier_value(s).unwrap())
            .collect();
        let forest = build_hierarchy(&values);

        let names: Vec<_> = forest.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["Canada", "USA"]);
        let usa: Vec<_> = forest[1].children.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(usa, ["California", "Oregon"]);
        assert_eq!(forest[1].children[0].children[0].name, "LA");
    }

    #[test]
    fn add_preserves_open_state() {
        let mut forest = places();
        open_hierarchy_path(&mut forest, "USA");
        add_to_hierarchy(&mut forest, &parse_hier_value("USA / Nevada").unwrap());
        assert!(forest[1].is_open());
        assert_eq!(forest[1].children.len(), 3);
    }

    #[test]
    fn visible_rows_follow_open_flags() {
        let mut forest = places();
        assert_eq!(visible_rows(&forest).len(), 2);

        open_hierarchy_path(&mut forest, "Animals / Birds");
        let rows = visible_rows(&forest);
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Animals", "Birds", "Robin", "Sparrow", "USA"]);
        assert_eq!(rows[3].path, vec![0, 0, 1]);
        assert_eq!(rows[3].depth, 2);
        assert_eq!(
            value_at(&forest, &rows[3].path).unwrap().to_string(),
            "Animals / Birds / Sparrow"
        );
    }

    #[test]
    fn set_open_addresses_nodes_by_path() {
        let mut forest = places();
        assert!(set_open(&mut forest, &[1], true));
        assert!(forest[1].is_open());
        assert!(set_open(&mut forest, &[1, 0], true));
        assert!(forest[1].children[0].is_open());
        assert!(!set_open(&mut forest, &[9], true));
        assert!(!set_open(&mut forest, &[], true));
    }

    #[test]
    fn deserializes_wire_shape() {
        let json = r#"[{"Name":"A","Children":[{"Name":"B","Children":null}]},{"Name":"C"}]"#;
        let forest: Vec<Hier> = serde_json::from_str(json).unwrap();
        assert_eq!(forest[0].children[0].name, "B");
        assert!(forest[0].children[0].children.is_empty());
        assert!(forest[1].children.is_empty());
        assert_eq!(forest[0].open, None);

        let out = serde_json::to_string(&forest[1]).unwrap();
        assert_eq!(out, r#"{"Name":"C","Children":[]}"#);
    }
}
