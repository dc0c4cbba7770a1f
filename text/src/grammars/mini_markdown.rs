//! A small markdown-flavored grammar built entirely from the core combinators, used as
//! the worked example for headings, emphasis, strong emphasis, and code spans.
//!
//! Every delimiter and separator that carries raw length gets its own [`absorb`]
//! wrapper (`headerDelimiter`, `softTab`, `delimiter`, `blank`), so a parent's
//! children always tile its full raw span with no untyped gaps. Without that, the
//! offset arithmetic in [`crate::projection`] and [`crate::parsed_string`] (which
//! locates a child's raw start by summing the lengths of its preceding siblings)
//! would place later siblings at the wrong position whenever a literal match
//! contributed length but no node.
//!
//! [`absorb`]: crate::grammar::GrammarBuilder::absorb

use crate::grammar::{Grammar, GrammarBuilder};
use crate::interner::Symbol;
use crate::iter::ScopeKind;
use crate::projection::{Substitution, SubstitutionTable};
use std::sync::Arc;

/// Builds the grammar: `document := ((paragraph blank)* paragraph?)`, where a
/// `paragraph` is either a `heading` (`#`-prefixed line) or a `line` of inline
/// elements (plain text, `**strong**`, `*emphasis*`, `` `code` ``).
pub fn build() -> Grammar {
    let mut b = GrammarBuilder::new();

    let any = b.character_class(|_u: u16| true);

    // heading := headerDelimiter softTab text
    let hash = b.literal("#");
    let hash_run = b.repetition(hash, 1, Some(6));
    let header_delimiter = b.absorb("headerDelimiter", hash_run);

    let space = b.literal(" ");
    let soft_tab = b.absorb("softTab", space);

    let heading_body = b.repetition(any, 0, None);
    let heading_body = b.scoped(ScopeKind::EndBeforePattern, "\n", heading_body);
    let heading_text = b.absorb("text", heading_body);

    let heading_seq = b.sequence([header_delimiter, soft_tab, heading_text]);
    let heading_node = b.absorb("heading", heading_seq);
    let heading = b.named(heading_node);

    // strong_emphasis := "**" delimiter text "**" delimiter
    let strong_open = b.literal("**");
    let strong_open = b.absorb("delimiter", strong_open);
    let strong_body = b.repetition(any, 1, None);
    let strong_body = b.scoped(ScopeKind::EndBeforePattern, "**", strong_body);
    let strong_text = b.absorb("text", strong_body);
    let strong_close = b.literal("**");
    let strong_close = b.absorb("delimiter", strong_close);
    let strong_seq = b.sequence([strong_open, strong_text, strong_close]);
    let strong_node = b.absorb("strong_emphasis", strong_seq);
    let strong_emphasis = b.named(strong_node);

    // emphasis := "*" delimiter text "*" delimiter
    let em_open = b.literal("*");
    let em_open = b.absorb("delimiter", em_open);
    let em_body = b.repetition(any, 1, None);
    let em_body = b.scoped(ScopeKind::EndBeforePattern, "*", em_body);
    let em_text = b.absorb("text", em_body);
    let em_close = b.literal("*");
    let em_close = b.absorb("delimiter", em_close);
    let em_seq = b.sequence([em_open, em_text, em_close]);
    let em_node = b.absorb("emphasis", em_seq);
    let emphasis = b.named(em_node);

    // code_span := "`" delimiter text "`" delimiter
    let code_open = b.literal("`");
    let code_open = b.absorb("delimiter", code_open);
    let code_body = b.repetition(any, 1, None);
    let code_body = b.scoped(ScopeKind::EndBeforePattern, "`", code_body);
    let code_text = b.absorb("text", code_body);
    let code_close = b.literal("`");
    let code_close = b.absorb("delimiter", code_close);
    let code_seq = b.sequence([code_open, code_text, code_close]);
    let code_node = b.absorb("code_span", code_seq);
    let code_span = b.named(code_node);

    // Any run of characters that isn't a delimiter or a line break.
    let plain_unit = b.character_class(|u: u16| {
        u != b'*' as u16 && u != b'`' as u16 && u != b'\n' as u16
    });
    let plain_run = b.repetition(plain_unit, 1, None);
    let plain_text = b.absorb("text", plain_run);

    let inline_element = b.choice([strong_emphasis, emphasis, code_span, plain_text]);
    let line = b.repetition(inline_element, 1, None);

    let paragraph_content = b.choice([heading, line]);
    let paragraph_node = b.absorb("paragraph", paragraph_content);
    let paragraph = b.named(paragraph_node);

    let newline = b.literal("\n");
    let blank_run = b.repetition(newline, 1, None);
    let blank = b.absorb("blank", blank_run);

    let paragraph_then_blank = b.sequence([paragraph, blank]);
    let paragraphs_with_blanks = b.repetition(paragraph_then_blank, 0, None);
    let trailing_paragraph = b.repetition(paragraph, 0, Some(1));
    let document_seq = b.sequence([paragraphs_with_blanks, trailing_paragraph]);
    let document = b.absorb("document", document_seq);

    b.build(document).expect("mini_markdown grammar is fully defined")
}

/// The node-type -> visible-substitution table this grammar's output is designed for:
/// a `headerDelimiter` run of `n` `#` characters renders as `H{n}`, and a `softTab`
/// single space renders as a tab.
pub fn substitution_table() -> SubstitutionTable {
    let mut table = SubstitutionTable::default();
    table.insert(Symbol::intern("softTab"), Substitution::Fixed(vec!['\t' as u16]));
    table.insert(
        Symbol::intern("headerDelimiter"),
        Substitution::Function(Arc::new(|node, _raw_start| {
            format!("H{}", node.length()).encode_utf16().collect()
        })),
    );
    table
}
