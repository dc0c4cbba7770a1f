//! `parchment`: an incremental, memoizing packrat parser over an editable,
//! UTF-16-indexed text buffer.
//!
//! A [`ParsedString`](parsed_string::ParsedString) owns a piece-table buffer, a
//! grammar built from the combinators in [`grammar`], a memo table that survives
//! edits, the resulting parse tree, and a projection that maps parsed nodes to a
//! substituted visible string. [`ParsedString::replace_characters`] runs the full
//! mutate/invalidate/reparse/notify cycle in one call.
//!
//! # Core concepts
//!
//! - **`PieceTable`**: the source-of-truth buffer, 16-bit code units, edited without
//!   copying unchanged spans.
//! - **`Grammar` / `GrammarBuilder`**: a DAG of rules (literal, character class,
//!   sequence, choice, repetition, lookahead, named, absorb, scoped) parsed via a
//!   stateless recursive-descent dispatch with no backtracking out of a repetition.
//! - **`MemoTable`**: caches named-rule results by `(rule, position)`, invalidated and
//!   position-shifted on each edit rather than rebuilt from scratch.
//! - **`Node`**: an `Arc`-backed, immutable parse tree node; a memo hit hands back the
//!   exact same node instance across reparses.
//! - **`ReplacementProjection`**: the ordered, non-overlapping map from raw node
//!   ranges to their visible substitutions, updated incrementally on edit.
//! - **`EditSubscriber`**: notified with matching `will_process_editing` /
//!   `did_process_editing` calls around every edit.

pub mod error;
pub mod grammar;
pub mod grammars;
pub mod interner;
pub mod iter;
pub mod memo;
pub mod node;
pub mod parse_result;
pub mod parsed_string;
pub mod parser;
pub mod piece_table;
pub mod projection;
pub mod range;
pub mod subscriber;

pub use error::{ParchmentError, Result};
pub use grammar::{Grammar, GrammarBuilder, RuleId};
pub use interner::Symbol;
pub use memo::MemoTable;
pub use node::{Node, NodeBuilder};
pub use parse_result::ParseResult;
pub use parsed_string::{ParsedString, PathStep};
pub use parser::PackratParser;
pub use piece_table::PieceTable;
pub use projection::{ReplacementInterval, ReplacementProjection, Substitution, SubstitutionTable};
pub use range::TextRange;
pub use subscriber::{ChangeMask, EditNotification, EditSubscriber};

// Re-export text-size for convenience
pub use text_size::{TextLen, TextSize};
