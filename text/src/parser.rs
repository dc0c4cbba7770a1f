//! `PackratParser` (spec.md §4.5, §9).
//!
//! A thin driver over [`Grammar::parse`]: the actual packrat memoization lives in
//! [`crate::memo::MemoTable`] and is consulted inline by `Grammar::parse_rule`'s
//! `Named` arm, so this module's job is just to own the top-level entry point and its
//! logging, the way the teacher's `syntax::incremental` module wraps tree-sitter's
//! incremental reparse call with its own tracing span.

use crate::grammar::{Grammar, ParseContext};
use crate::memo::MemoTable;
use crate::parse_result::ParseResult;
use crate::piece_table::PieceTable;

pub struct PackratParser;

impl PackratParser {
    /// Parses the full buffer against `grammar`'s start rule, reusing whatever
    /// `memo` already holds (a fresh, empty table for a first parse; a table already
    /// adjusted by [`MemoTable::invalidate`] for a re-parse after an edit).
    pub fn parse(grammar: &Grammar, buffer: &PieceTable, memo: &mut MemoTable) -> ParseResult {
        let span = tracing::debug_span!("packrat_parse", len = buffer.len());
        let _enter = span.enter();

        let mut ctx = ParseContext { buffer, memo };
        let result = grammar.parse(&mut ctx, 0, buffer.len());

        if result.succeeded() && result.length() < buffer.len() {
            tracing::warn!(
                consumed = result.length(),
                total = buffer.len(),
                "parse did not consume the whole buffer"
            );
        }

        result
    }
}
