//! `ReplacementProjection` (spec.md §3, §4.7).
//!
//! Maps the raw buffer onto a visible string by substituting the text covered by
//! certain node types (e.g. a heading's `#` run becomes `H1`). The projection never
//! touches the buffer itself; it is a read-only, derived view, recomputed whenever
//! the tree changes.

use crate::interner::Symbol;
use crate::node::Node;
use crate::range::TextRange;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// How a node type's matched text is rendered in the visible string.
#[derive(Clone)]
pub enum Substitution {
    /// A fixed replacement, independent of the node's content or position.
    Fixed(Vec<u16>),
    /// A replacement computed from the node and its raw start index, for
    /// variable-length substitutions (e.g. `H1`/`H2`/`H3` from a heading marker's
    /// length).
    Function(Arc<dyn Fn(&Node, u32) -> Vec<u16> + Send + Sync>),
}

impl Substitution {
    fn apply(&self, node: &Node, raw_start: u32) -> Vec<u16> {
        match self {
            Substitution::Fixed(units) => units.clone(),
            Substitution::Function(f) => f(node, raw_start),
        }
    }
}

pub type SubstitutionTable = FxHashMap<Symbol, Substitution>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementInterval {
    pub raw: TextRange,
    pub visible: Vec<u16>,
}

/// Walks `root` in document order, emitting a [`ReplacementInterval`] for every node
/// whose type has an entry in `table`. When a replaced node contains a replaced
/// descendant, the outer node wins and the descendant is not recursed into.
pub fn compute_text_replacements(root: &Node, table: &SubstitutionTable) -> Vec<ReplacementInterval> {
    let mut out = Vec::new();
    walk(root, 0, table, &mut out);
    out
}

fn walk(node: &Node, raw_start: u32, table: &SubstitutionTable, out: &mut Vec<ReplacementInterval>) {
    if let Some(kind) = node.kind() {
        if let Some(sub) = table.get(&kind) {
            out.push(ReplacementInterval {
                raw: TextRange::new(raw_start, raw_start + node.length()),
                visible: sub.apply(node, raw_start),
            });
            return;
        }
    }
    let mut offset = raw_start;
    for child in node.children() {
        walk(child, offset, table, out);
        offset += child.length();
    }
}

/// The raw-to-visible mapping derived from one `compute_text_replacements` pass, plus
/// the bidirectional coordinate translation built on top of it.
#[derive(Debug, Clone, Default)]
pub struct ReplacementProjection {
    /// Sorted by `raw.start()`, non-overlapping.
    intervals: Vec<ReplacementInterval>,
    raw_length: u32,
}

impl ReplacementProjection {
    pub fn new(root: &Node, table: &SubstitutionTable) -> Self {
        let mut intervals = compute_text_replacements(root, table);
        intervals.sort_by_key(|i| i.raw.start());
        Self {
            intervals,
            raw_length: root.length(),
        }
    }

    pub fn intervals(&self) -> &[ReplacementInterval] {
        &self.intervals
    }

    pub fn raw_length(&self) -> u32 {
        self.raw_length
    }

    pub fn visible_length(&self) -> u32 {
        self.index_after_replacements(self.raw_length)
    }

    /// Converts a raw index to a visible index. A raw index inside a replaced range
    /// maps to the visible index of that range's start.
    pub fn index_after_replacements(&self, raw: u32) -> u32 {
        let mut visible = 0u32;
        let mut prev_raw_end = 0u32;
        for interval in &self.intervals {
            if raw < interval.raw.start() {
                return visible + (raw - prev_raw_end);
            }
            visible += interval.raw.start() - prev_raw_end;
            if raw < interval.raw.end() {
                return visible;
            }
            visible += interval.visible.len() as u32;
            prev_raw_end = interval.raw.end();
        }
        visible + (raw - prev_raw_end)
    }

    /// Converts a visible index to a raw index. A visible index inside a substituted
    /// region maps to the raw index of the replaced node's start.
    pub fn index_before_replacements(&self, visible: u32) -> u32 {
        let mut visible_cursor = 0u32;
        let mut raw_cursor = 0u32;
        for interval in &self.intervals {
            let gap = interval.raw.start() - raw_cursor;
            if visible < visible_cursor + gap {
                return raw_cursor + (visible - visible_cursor);
            }
            visible_cursor += gap;
            raw_cursor = interval.raw.start();
            let sub_len = interval.visible.len() as u32;
            if visible < visible_cursor + sub_len {
                return interval.raw.start();
            }
            visible_cursor += sub_len;
            raw_cursor = interval.raw.end();
        }
        raw_cursor + (visible - visible_cursor)
    }

    /// Applies spec.md §4.7's update rule for an edit starting at raw index `lo`:
    /// content before `lo` keeps its raw coordinates unchanged, so intervals entirely
    /// before it are kept as-is; everything from `lo` onward is supplied fresh from
    /// `new_root`, which is already a complete, correctly-ordered re-parse.
    pub fn update_for_edit(&mut self, lo: u32, new_root: &Node, table: &SubstitutionTable) {
        let mut kept: Vec<ReplacementInterval> = self
            .intervals
            .iter()
            .filter(|interval| interval.raw.end() <= lo)
            .cloned()
            .collect();
        kept.extend(
            compute_text_replacements(new_root, table)
                .into_iter()
                .filter(|fresh| fresh.raw.start() >= lo),
        );
        kept.sort_by_key(|i| i.raw.start());
        self.intervals = kept;
        self.raw_length = new_root.length();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeBuilder;

    fn table_with_fixed(kind: &str, replacement: &str) -> SubstitutionTable {
        let mut table = SubstitutionTable::default();
        table.insert(
            Symbol::intern(kind),
            Substitution::Fixed(replacement.encode_utf16().collect()),
        );
        table
    }

    #[test]
    fn replaced_leaf_shrinks_the_visible_string() {
        let mut root_builder = NodeBuilder::regular(Symbol::intern("document"));
        root_builder.append_child(Node::leaf(Symbol::intern("marker"), 4));
        root_builder.append_child(Node::leaf(Symbol::intern("text"), 6));
        let root = root_builder.finish();

        let table = table_with_fixed("marker", "\t");
        let projection = ReplacementProjection::new(&root, &table);

        assert_eq!(projection.visible_length(), 1 + 6);
        assert_eq!(projection.index_after_replacements(0), 0);
        assert_eq!(projection.index_after_replacements(2), 0);
        assert_eq!(projection.index_after_replacements(4), 1);
        assert_eq!(projection.index_after_replacements(7), 4);
    }

    #[test]
    fn outer_replacement_suppresses_replaced_descendant() {
        let mut inner_builder = NodeBuilder::regular(Symbol::intern("inner"));
        inner_builder.append_child(Node::leaf(Symbol::intern("text"), 3));
        let inner = inner_builder.finish();

        let mut outer_builder = NodeBuilder::regular(Symbol::intern("outer"));
        outer_builder.append_child(inner);
        let outer = outer_builder.finish();

        let mut table = table_with_fixed("outer", "X");
        table.insert(Symbol::intern("inner"), Substitution::Fixed(vec!['Y' as u16]));

        let intervals = compute_text_replacements(&outer, &table);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].raw, TextRange::new(0, 3));
    }

    #[test]
    fn round_trip_through_replacements_finds_replaced_leafs_start() {
        let mut root_builder = NodeBuilder::regular(Symbol::intern("document"));
        root_builder.append_child(Node::leaf(Symbol::intern("marker"), 4));
        root_builder.append_child(Node::leaf(Symbol::intern("text"), 6));
        let root = root_builder.finish();
        let table = table_with_fixed("marker", "\t");
        let projection = ReplacementProjection::new(&root, &table);

        for raw in [0u32, 5, 9] {
            let visible = projection.index_after_replacements(raw);
            let back = projection.index_before_replacements(visible);
            if raw < 4 {
                assert_eq!(back, 0);
            } else {
                assert_eq!(back, raw);
            }
        }
    }

    #[test]
    fn update_for_edit_recomputes_intervals_from_the_edit_point_onward() {
        let mut root_builder = NodeBuilder::regular(Symbol::intern("document"));
        root_builder.append_child(Node::leaf(Symbol::intern("text"), 5));
        root_builder.append_child(Node::leaf(Symbol::intern("marker"), 4));
        let root = root_builder.finish();
        let table = table_with_fixed("marker", "\t");
        let mut projection = ReplacementProjection::new(&root, &table);
        assert_eq!(projection.intervals()[0].raw, TextRange::new(5, 9));

        let mut new_root_builder = NodeBuilder::regular(Symbol::intern("document"));
        new_root_builder.append_child(Node::leaf(Symbol::intern("text"), 8));
        new_root_builder.append_child(Node::leaf(Symbol::intern("marker"), 4));
        let new_root = new_root_builder.finish();

        projection.update_for_edit(0, &new_root, &table);
        assert_eq!(projection.intervals()[0].raw, TextRange::new(8, 12));
    }

    #[test]
    fn update_for_edit_keeps_intervals_strictly_before_the_edit_point() {
        let mut root_builder = NodeBuilder::regular(Symbol::intern("document"));
        root_builder.append_child(Node::leaf(Symbol::intern("marker"), 4));
        root_builder.append_child(Node::leaf(Symbol::intern("text"), 6));
        let root = root_builder.finish();
        let table = table_with_fixed("marker", "\t");
        let mut projection = ReplacementProjection::new(&root, &table);
        assert_eq!(projection.intervals()[0].raw, TextRange::new(0, 4));

        // An edit at raw index 6 (inside the trailing text) leaves the marker at
        // [0, 4) untouched; a fresh pass over the new tree would rebuild the same
        // interval from scratch, so the kept copy must match it exactly.
        let mut new_root_builder = NodeBuilder::regular(Symbol::intern("document"));
        new_root_builder.append_child(Node::leaf(Symbol::intern("marker"), 4));
        new_root_builder.append_child(Node::leaf(Symbol::intern("text"), 9));
        let new_root = new_root_builder.finish();

        projection.update_for_edit(6, &new_root, &table);
        assert_eq!(projection.intervals().len(), 1);
        assert_eq!(projection.intervals()[0].raw, TextRange::new(0, 4));
    }
}
