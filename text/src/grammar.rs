//! `Grammar` / `Rule` combinators and the recursive-descent dispatch that drives them
//! (spec.md §4.4, §4.5, §9 "Grammar as data, not inheritance").
//!
//! Rules are a tagged variant (`RuleSpec`) stored in a flat arena rather than trait
//! objects, per the design note: a rule's identity is a plain arena index
//! (`RuleId`), portable and `Copy`, usable directly as half of a memo-table key.

use crate::error::ParchmentError;
use crate::interner::Symbol;
use crate::iter::{ScopeKind, ScopedIterator, StringLiteralPattern};
use crate::memo::MemoTable;
use crate::node::{Node, NodeBuilder};
use crate::parse_result::ParseResult;
use crate::piece_table::PieceTable;
use std::sync::Arc;

/// A stable identity for a rule in a [`Grammar`], assigned by [`GrammarBuilder`] in
/// construction order. Used as half of a memo-table key; `Copy` and hashable, unlike
/// a pointer, so it stays portable if the grammar is ever serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(u32);

impl RuleId {
    #[cfg(test)]
    pub fn for_test(n: u32) -> Self {
        RuleId(n)
    }
}

enum RuleSpec {
    Undefined,
    Literal(Vec<u16>),
    CharacterClass(Arc<dyn Fn(u16) -> bool + Send + Sync>),
    Sequence(Vec<RuleId>),
    Choice(Vec<RuleId>),
    Repetition {
        inner: RuleId,
        min: u32,
        max: Option<u32>,
    },
    Lookahead {
        inner: RuleId,
        positive: bool,
    },
    Named {
        inner: RuleId,
    },
    Absorb {
        kind: Symbol,
        inner: RuleId,
    },
    Scoped {
        kind: ScopeKind,
        pattern: StringLiteralPattern,
        inner: RuleId,
    },
}

/// Constructs a [`Grammar`]. Rules reference each other by the `RuleId` an earlier
/// builder call returned, so a grammar is built bottom-up; [`GrammarBuilder::reserve`]
/// plus [`GrammarBuilder::define`] support the one case that needs a forward
/// reference before its definition is known (a rule used recursively).
#[derive(Default)]
pub struct GrammarBuilder {
    rules: Vec<RuleSpec>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, spec: RuleSpec) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(spec);
        id
    }

    /// Allocates a placeholder slot for a rule to be defined later with [`Self::define`].
    pub fn reserve(&mut self) -> RuleId {
        self.push(RuleSpec::Undefined)
    }

    pub fn define_literal(&mut self, id: RuleId, literal: &str) {
        self.rules[id.0 as usize] = RuleSpec::Literal(literal.encode_utf16().collect());
    }

    pub fn literal(&mut self, literal: &str) -> RuleId {
        self.push(RuleSpec::Literal(literal.encode_utf16().collect()))
    }

    pub fn character_class(&mut self, pred: impl Fn(u16) -> bool + Send + Sync + 'static) -> RuleId {
        self.push(RuleSpec::CharacterClass(Arc::new(pred)))
    }

    pub fn sequence(&mut self, parts: impl Into<Vec<RuleId>>) -> RuleId {
        self.push(RuleSpec::Sequence(parts.into()))
    }

    pub fn choice(&mut self, alts: impl Into<Vec<RuleId>>) -> RuleId {
        self.push(RuleSpec::Choice(alts.into()))
    }

    pub fn repetition(&mut self, inner: RuleId, min: u32, max: Option<u32>) -> RuleId {
        self.push(RuleSpec::Repetition { inner, min, max })
    }

    pub fn lookahead(&mut self, inner: RuleId, positive: bool) -> RuleId {
        self.push(RuleSpec::Lookahead { inner, positive })
    }

    pub fn named(&mut self, inner: RuleId) -> RuleId {
        self.push(RuleSpec::Named { inner })
    }

    /// Defines a previously [`Self::reserve`]d id as `Named(inner)`, for rules that
    /// reference themselves (directly or through a cycle).
    pub fn define_named(&mut self, id: RuleId, inner: RuleId) {
        self.rules[id.0 as usize] = RuleSpec::Named { inner };
    }

    pub fn absorb(&mut self, kind: &str, inner: RuleId) -> RuleId {
        self.push(RuleSpec::Absorb {
            kind: Symbol::intern(kind),
            inner,
        })
    }

    pub fn scoped(&mut self, kind: ScopeKind, pattern: &str, inner: RuleId) -> RuleId {
        self.push(RuleSpec::Scoped {
            kind,
            pattern: StringLiteralPattern::new(pattern),
            inner,
        })
    }

    /// Finalizes the grammar. Fails if `start` was never defined, or any `reserve`d id
    /// was never filled in by `define_named`.
    pub fn build(self, start: RuleId) -> Result<Grammar, ParchmentError> {
        if start.0 as usize >= self.rules.len() {
            return Err(ParchmentError::ProgrammingError {
                message: "start rule id is not part of this grammar".to_string(),
            });
        }
        for (i, rule) in self.rules.iter().enumerate() {
            if matches!(rule, RuleSpec::Undefined) {
                return Err(ParchmentError::ProgrammingError {
                    message: format!("rule {i} was reserved but never defined"),
                });
            }
        }
        Ok(Grammar {
            rules: self.rules,
            start,
        })
    }
}

/// An immutable, fully-resolved grammar ready to drive a [`crate::parser::PackratParser`].
pub struct Grammar {
    rules: Vec<RuleSpec>,
    start: RuleId,
}

/// Borrowed state threaded through a single parse: the buffer being read and the memo
/// table being consulted/populated. Position and the active scope limit are passed as
/// plain parameters instead, since they change on every recursive call. `Choice` needs
/// no backtracking machinery; each alternative starts its own recursion at the same
/// `position`.
pub struct ParseContext<'a> {
    pub buffer: &'a PieceTable,
    pub memo: &'a mut MemoTable,
}

fn bounded_at(buffer: &PieceTable, position: u32, limit: u32) -> Option<u16> {
    if position < limit {
        buffer.at(position)
    } else {
        None
    }
}

/// Runs `pattern` as a scope over `buffer` starting at `from`. Returns the index where
/// that scope's visible content ends (spec.md §4.2's scope-popping position) and
/// whether a terminator was actually matched before the buffer ran out; the latter
/// tells the caller whether the terminator's own code units fall inside the scan.
fn scope_boundary(
    buffer: &PieceTable,
    from: u32,
    kind: ScopeKind,
    pattern: &StringLiteralPattern,
) -> (u32, bool) {
    let mut it = ScopedIterator::new(buffer, from);
    it.push(kind, pattern.clone());
    while it.next().is_some() {}
    (it.position(), it.top_scope_matched())
}

impl Grammar {
    pub fn start(&self) -> RuleId {
        self.start
    }

    pub fn parse(&self, ctx: &mut ParseContext<'_>, position: u32, limit: u32) -> ParseResult {
        self.parse_rule(self.start, ctx, position, limit)
    }

    pub(crate) fn parse_rule(
        &self,
        id: RuleId,
        ctx: &mut ParseContext<'_>,
        position: u32,
        limit: u32,
    ) -> ParseResult {
        match &self.rules[id.0 as usize] {
            RuleSpec::Undefined => {
                unreachable!("GrammarBuilder::build rejects grammars with undefined rules")
            }

            RuleSpec::Literal(units) => {
                let mut offset = 0u32;
                for &expected in units {
                    match bounded_at(ctx.buffer, position + offset, limit) {
                        Some(actual) if actual == expected => offset += 1,
                        Some(_) => return ParseResult::failure(offset + 1),
                        None => return ParseResult::failure(offset),
                    }
                }
                ParseResult::success(offset, offset, None)
            }

            RuleSpec::CharacterClass(pred) => match bounded_at(ctx.buffer, position, limit) {
                Some(unit) if pred(unit) => ParseResult::success(1, 1, None),
                Some(_) => ParseResult::failure(1),
                None => ParseResult::failure(0),
            },

            RuleSpec::Sequence(parts) => {
                let mut total_len = 0u32;
                let mut total_examined = 0u32;
                let mut builder = NodeBuilder::fragment();
                for &part in parts {
                    let r = self.parse_rule(part, ctx, position + total_len, limit);
                    total_examined += r.examined_length();
                    if !r.succeeded() {
                        return ParseResult::failure(total_examined);
                    }
                    total_len += r.length();
                    if let Some(node) = r.into_node() {
                        builder.append_child(node);
                    }
                }
                ParseResult::success(total_len, total_examined, Some(builder.finish()))
            }

            RuleSpec::Choice(alts) => {
                let mut max_examined = 0u32;
                for &alt in alts {
                    let r = self.parse_rule(alt, ctx, position, limit);
                    max_examined = max_examined.max(r.examined_length());
                    if r.succeeded() {
                        return ParseResult::success(r.length(), max_examined, r.into_node());
                    }
                }
                ParseResult::failure(max_examined)
            }

            RuleSpec::Repetition { inner, min, max } => {
                let mut count = 0u32;
                let mut total_len = 0u32;
                let mut total_examined = 0u32;
                let mut builder = NodeBuilder::fragment();
                loop {
                    if let Some(max) = max {
                        if count >= *max {
                            break;
                        }
                    }
                    let r = self.parse_rule(*inner, ctx, position + total_len, limit);
                    total_examined += r.examined_length();
                    if !r.succeeded() {
                        break;
                    }
                    count += 1;
                    let zero_width = r.length() == 0;
                    total_len += r.length();
                    if let Some(node) = r.into_node() {
                        builder.append_child(node);
                    }
                    if zero_width {
                        // A rule that can match nothing must not spin forever.
                        break;
                    }
                }
                if count >= *min {
                    ParseResult::success(total_len, total_examined, Some(builder.finish()))
                } else {
                    ParseResult::failure(total_examined)
                }
            }

            RuleSpec::Lookahead { inner, positive } => {
                let r = self.parse_rule(*inner, ctx, position, limit);
                let examined = r.examined_length();
                let ok = r.succeeded() == *positive;
                if ok {
                    ParseResult::success(0, examined, None)
                } else {
                    ParseResult::failure(examined)
                }
            }

            RuleSpec::Named { inner } => {
                if let Some(cached) = ctx.memo.get(id, position) {
                    return cached;
                }
                let r = self.parse_rule(*inner, ctx, position, limit);
                ctx.memo.insert(id, position, r.clone());
                r
            }

            RuleSpec::Absorb { kind, inner } => {
                let r = self.parse_rule(*inner, ctx, position, limit);
                if !r.succeeded() {
                    return ParseResult::failure(r.examined_length());
                }
                let length = r.length();
                let examined = r.examined_length();
                let mut builder = NodeBuilder::regular(*kind);
                if let Some(inner_node) = r.into_node() {
                    builder.append_child(inner_node);
                }
                ParseResult::success(length, examined, Some(builder.finish_with_length(length)))
            }

            RuleSpec::Scoped { kind, pattern, inner } => {
                let (raw_boundary, terminator_matched) = scope_boundary(ctx.buffer, position, *kind, pattern);
                let boundary = raw_boundary.min(limit);
                let r = self.parse_rule(*inner, ctx, position, boundary);

                // The terminator's own code units decided where the scope ends, so
                // they're part of what this rule depends on even though `inner` never
                // reads them. An edit landing there must still invalidate this rule's
                // memo entry, which only happens if `examined_length` reaches past it.
                let terminator_scan = if terminator_matched && raw_boundary < limit {
                    pattern.len()
                } else {
                    0
                };
                let examined = r.examined_length().max(boundary - position + terminator_scan);

                if r.succeeded() {
                    ParseResult::success(r.length(), examined, r.into_node())
                } else {
                    ParseResult::failure(examined)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digit() -> impl Fn(u16) -> bool + Send + Sync + 'static {
        |u: u16| (b'0'..=b'9').contains(&(u as u8)) && u < 128
    }

    #[test]
    fn literal_matches_and_reports_examined_length() {
        let mut b = GrammarBuilder::new();
        let lit = b.literal("ab");
        let g = b.build(lit).unwrap();
        let buf = PieceTable::new("abc");
        let mut memo = MemoTable::new();
        let mut ctx = ParseContext { buffer: &buf, memo: &mut memo };
        let r = g.parse(&mut ctx, 0, buf.len());
        assert!(r.succeeded());
        assert_eq!(r.length(), 2);
        assert_eq!(r.examined_length(), 2);
    }

    #[test]
    fn literal_mismatch_fails_with_examined_length_through_mismatch() {
        let mut b = GrammarBuilder::new();
        let lit = b.literal("ax");
        let g = b.build(lit).unwrap();
        let buf = PieceTable::new("abc");
        let mut memo = MemoTable::new();
        let mut ctx = ParseContext { buffer: &buf, memo: &mut memo };
        let r = g.parse(&mut ctx, 0, buf.len());
        assert!(!r.succeeded());
        assert_eq!(r.examined_length(), 2);
    }

    #[test]
    fn choice_picks_first_success_even_if_later_alternative_is_longer() {
        let mut b = GrammarBuilder::new();
        let short = b.literal("a");
        let long = b.literal("ab");
        let choice = b.choice([short, long]);
        let g = b.build(choice).unwrap();
        let buf = PieceTable::new("ab");
        let mut memo = MemoTable::new();
        let mut ctx = ParseContext { buffer: &buf, memo: &mut memo };
        let r = g.parse(&mut ctx, 0, buf.len());
        assert!(r.succeeded());
        assert_eq!(r.length(), 1);
    }

    #[test]
    fn repetition_is_greedy_and_respects_minimum() {
        let mut b = GrammarBuilder::new();
        let d = b.character_class(digit());
        let rep = b.repetition(d, 1, None);
        let g = b.build(rep).unwrap();
        let buf = PieceTable::new("123x");
        let mut memo = MemoTable::new();
        let mut ctx = ParseContext { buffer: &buf, memo: &mut memo };
        let r = g.parse(&mut ctx, 0, buf.len());
        assert!(r.succeeded());
        assert_eq!(r.length(), 3);
    }

    #[test]
    fn repetition_below_minimum_fails() {
        let mut b = GrammarBuilder::new();
        let d = b.character_class(digit());
        let rep = b.repetition(d, 2, None);
        let g = b.build(rep).unwrap();
        let buf = PieceTable::new("1x");
        let mut memo = MemoTable::new();
        let mut ctx = ParseContext { buffer: &buf, memo: &mut memo };
        let r = g.parse(&mut ctx, 0, buf.len());
        assert!(!r.succeeded());
    }

    #[test]
    fn absorb_wraps_sequence_fragment_into_a_tagged_node() {
        let mut b = GrammarBuilder::new();
        let open = b.literal("[");
        let digit_rule = b.character_class(digit());
        let body = b.repetition(digit_rule, 1, None);
        let body = b.absorb("digits", body);
        let close = b.literal("]");
        let seq = b.sequence([open, body, close]);
        let bracketed = b.absorb("bracketed", seq);
        let g = b.build(bracketed).unwrap();
        let buf = PieceTable::new("[42]");
        let mut memo = MemoTable::new();
        let mut ctx = ParseContext { buffer: &buf, memo: &mut memo };
        let r = g.parse(&mut ctx, 0, buf.len());
        assert!(r.succeeded());
        assert_eq!(r.length(), 4);
        assert_eq!(r.node().unwrap().compact_structure(), "(bracketed digits)");
    }

    #[test]
    fn named_rule_memoizes_and_reuses_the_same_node() {
        let mut b = GrammarBuilder::new();
        let not_space = b.character_class(|u: u16| u != b' ' as u16);
        let word = b.repetition(not_space, 1, None);
        let word = b.absorb("word", word);
        let named = b.named(word);
        let g = b.build(named).unwrap();
        let buf = PieceTable::new("hi");
        let mut memo = MemoTable::new();
        let mut ctx = ParseContext { buffer: &buf, memo: &mut memo };
        let r1 = g.parse(&mut ctx, 0, buf.len());
        assert_eq!(memo.len(), 1);
        let r2 = g.parse(&mut ctx, 0, buf.len());
        assert!(Node::ptr_eq(r1.node().unwrap(), r2.node().unwrap()));
    }

    #[test]
    fn scoped_rule_examined_length_reaches_past_the_terminator() {
        let mut b = GrammarBuilder::new();
        let not_nl = b.character_class(|u: u16| u != b'\n' as u16);
        let body = b.repetition(not_nl, 0, None);
        let scoped = b.scoped(ScopeKind::EndBeforePattern, "\n", body);
        let g = b.build(scoped).unwrap();
        let buf = PieceTable::new("abc\nxyz");
        let mut memo = MemoTable::new();
        let mut ctx = ParseContext { buffer: &buf, memo: &mut memo };
        let r = g.parse(&mut ctx, 0, buf.len());
        assert!(r.succeeded());
        assert_eq!(r.length(), 3);
        // The "\n" at index 3 is what decided the boundary; a memo entry built from
        // this result must cover it, or an edit to the terminator won't invalidate it.
        assert_eq!(r.examined_length(), 4);
    }

    #[test]
    fn scoped_rule_stops_inner_parsing_at_the_terminator() {
        let mut b = GrammarBuilder::new();
        let not_star = b.character_class(|u: u16| u != b'*' as u16);
        let body = b.repetition(not_star, 0, None);
        let scoped = b.scoped(ScopeKind::EndBeforePattern, "**", body);
        let g = b.build(scoped).unwrap();
        let buf = PieceTable::new("hello**world");
        let mut memo = MemoTable::new();
        let mut ctx = ParseContext { buffer: &buf, memo: &mut memo };
        let r = g.parse(&mut ctx, 0, buf.len());
        assert!(r.succeeded());
        assert_eq!(r.length(), 5);
    }
}
