//! Concrete grammar instances built on the core combinator surface (spec.md §1, §6:
//! "Grammar provider"). The core itself defines no grammar; this module is a consumer
//! of [`crate::grammar::GrammarBuilder`], not part of the core's own surface, kept
//! separate so it could be lifted into its own crate without touching the core.

pub mod mini_markdown;
