//! `ParsedString` (spec.md §4.8): the top-level façade gluing the buffer, grammar,
//! memo table, tree, and projection together behind a single edit/query API.

use crate::grammar::Grammar;
use crate::interner::Symbol;
use crate::memo::MemoTable;
use crate::node::Node;
use crate::parser::PackratParser;
use crate::piece_table::PieceTable;
use crate::projection::{ReplacementProjection, SubstitutionTable};
use crate::range::TextRange;
use crate::subscriber::{ChangeMask, EditNotification, EditSubscriber};

/// One step of a [`ParsedString::path`] result: the node found and its raw range.
pub struct PathStep {
    pub node: Node,
    pub raw_range: TextRange,
}

/// Holds the buffer, grammar, memo table, current tree, and projection for one
/// document, and mediates every edit and query against them.
pub struct ParsedString {
    buffer: PieceTable,
    grammar: Grammar,
    memo: MemoTable,
    tree: Option<Node>,
    projection: ReplacementProjection,
    substitutions: SubstitutionTable,
    subscribers: Vec<Box<dyn EditSubscriber>>,
    /// Set when the last parse left a suffix unconsumed; surfaced to the caller but
    /// does not block further edits. The partial tree is retained.
    incomplete_at: Option<u32>,
}

impl ParsedString {
    pub fn new(initial: &str, grammar: Grammar, substitutions: SubstitutionTable) -> Self {
        let buffer = PieceTable::new(initial);
        let mut memo = MemoTable::new();
        let result = PackratParser::parse(&grammar, &buffer, &mut memo);

        let incomplete_at = if result.succeeded() && result.length() < buffer.len() {
            Some(result.length())
        } else {
            None
        };
        let tree = result.into_node();
        let projection = tree
            .as_ref()
            .map(|n| ReplacementProjection::new(n, &substitutions))
            .unwrap_or_default();

        Self {
            buffer,
            grammar,
            memo,
            tree,
            projection,
            substitutions,
            subscribers: Vec::new(),
            incomplete_at,
        }
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn EditSubscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn string(&self) -> String {
        let raw = self.buffer.to_string();
        let raw_units: Vec<u16> = raw.encode_utf16().collect();
        let mut out = Vec::new();
        let mut raw_pos = 0u32;
        for interval in self.projection.intervals() {
            out.extend_from_slice(&raw_units[raw_pos as usize..interval.raw.start() as usize]);
            out.extend_from_slice(&interval.visible);
            raw_pos = interval.raw.end();
        }
        out.extend_from_slice(&raw_units[raw_pos as usize..]);
        String::from_utf16_lossy(&out)
    }

    pub fn raw_string(&self) -> String {
        self.buffer.to_string()
    }

    pub fn length(&self) -> u32 {
        self.projection.visible_length()
    }

    pub fn raw_length(&self) -> u32 {
        self.buffer.len()
    }

    pub fn incomplete_parsing_position(&self) -> Option<u32> {
        self.incomplete_at
    }

    /// The current root of the parse tree, if the grammar's start rule produced one.
    pub fn tree(&self) -> Option<&Node> {
        self.tree.as_ref()
    }

    /// The chain of nodes from the root down to the leaf containing `visible_index`,
    /// each paired with its raw range.
    pub fn path(&self, visible_index: u32) -> crate::error::Result<Vec<PathStep>> {
        let raw_index = self.projection.index_before_replacements(visible_index);
        let Some(root) = &self.tree else {
            return Err(crate::error::ParchmentError::OutOfBounds {
                index: visible_index,
                length: 0,
            });
        };
        if raw_index >= root.length() {
            return Err(crate::error::ParchmentError::OutOfBounds {
                index: visible_index,
                length: self.length(),
            });
        }
        let mut steps = Vec::new();
        collect_path(root, 0, raw_index, &mut steps);
        Ok(steps)
    }

    /// Delegated to an external styling layer (spec.md §6). This core has no concept
    /// of attributes, so it reports only the node covering `visible_index`.
    pub fn node_at(&self, visible_index: u32) -> crate::error::Result<Node> {
        self.path(visible_index)
            .map(|mut steps| steps.pop().expect("path always yields at least one step").node)
    }

    /// Applies `replacement` over `raw_range`, per spec.md §4.8's six-step algorithm.
    /// On success, runs the full edit/reparse/projection pipeline and notifies
    /// subscribers with the minimal visible range touched. On rule failure or an
    /// unrecoverable error, the previous tree and buffer are left exactly as they
    /// were and the error is returned.
    pub fn replace_characters(&mut self, raw_range: TextRange, replacement: &str) -> crate::error::Result<()> {
        let span = tracing::debug_span!(
            "replace_characters",
            start = raw_range.start(),
            end = raw_range.end(),
            replacement_len = replacement.len()
        );
        let _enter = span.enter();

        let lo = raw_range.start();
        let hi = raw_range.end();

        let previous_buffer = self.buffer.clone();
        let previous_tree = self.tree.clone();
        let previous_projection = self.projection.clone();
        let previous_incomplete = self.incomplete_at;

        let replacement_len = replacement.encode_utf16().count() as u32;
        self.buffer.replace_characters(lo..hi, replacement);

        self.memo.invalidate(lo, hi, replacement_len);

        let result = PackratParser::parse(&self.grammar, &self.buffer, &mut self.memo);

        if !result.succeeded() {
            tracing::warn!("reparse failed after edit; retaining previous tree");
            self.buffer = previous_buffer;
            self.tree = previous_tree;
            self.projection = previous_projection;
            self.incomplete_at = previous_incomplete;
            return Err(crate::error::ParchmentError::IncompleteParsing { position: lo });
        }

        self.incomplete_at = if result.length() < self.buffer.len() {
            tracing::warn!(position = result.length(), "parse left an unparsed suffix");
            Some(result.length())
        } else {
            None
        };

        let new_tree = result.node().cloned();

        let old_visible_start = previous_projection.index_after_replacements(lo.min(previous_projection.raw_length()));
        self.projection.update_for_edit(
            lo,
            new_tree.as_ref().unwrap_or(&Node::leaf(Symbol::intern("empty"), 0)),
            &self.substitutions,
        );
        let new_visible_end_of_edit = self.projection.index_after_replacements((lo + replacement_len).min(self.buffer.len()));

        self.tree = new_tree;

        let edited_range = TextRange::new(
            old_visible_start.min(new_visible_end_of_edit),
            old_visible_start.max(new_visible_end_of_edit),
        );
        let change_in_length = self.length() as i64 - previous_projection.visible_length() as i64;

        let notification = EditNotification {
            mask: ChangeMask::CHARACTERS_EDITED,
            edited_range,
            change_in_length,
        };
        for subscriber in &mut self.subscribers {
            subscriber.will_process_editing(notification);
        }
        for subscriber in &mut self.subscribers {
            subscriber.did_process_editing(notification);
        }

        Ok(())
    }
}

fn collect_path(node: &Node, raw_start: u32, target: u32, out: &mut Vec<PathStep>) {
    out.push(PathStep {
        node: node.clone(),
        raw_range: TextRange::new(raw_start, raw_start + node.length()),
    });
    let mut offset = raw_start;
    for child in node.children() {
        let child_len = child.length();
        if target < offset + child_len {
            collect_path(child, offset, target, out);
            return;
        }
        offset += child_len;
    }
}
