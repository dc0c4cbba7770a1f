//! `MemoTable` (spec.md §3, §4.5, §9 "Memo invalidation").
//!
//! Keyed by `(rule-id, start-position)`. An edit touching an entry's examined-length
//! window `[p, p+examinedLength)` purges it, even when the entry only matched a
//! shorter `[p, p+length)`; the examined window can extend past the match through
//! failed lookahead or a terminator scan.

use crate::grammar::RuleId;
use crate::parse_result::ParseResult;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct MemoTable {
    entries: FxHashMap<(RuleId, u32), ParseResult>,
}

impl MemoTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, rule: RuleId, position: u32) -> Option<ParseResult> {
        self.entries.get(&(rule, position)).cloned()
    }

    pub fn insert(&mut self, rule: RuleId, position: u32, result: ParseResult) {
        self.entries.insert((rule, position), result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Applies an edit that replaced raw range `[lo, hi)` with `replacement_len` code
    /// units (spec.md §4.5, §9). Entries whose examined window intersects the edit are
    /// purged; surviving entries starting at or after `hi` have their position key
    /// shifted by the edit's net length delta; entries entirely before the edit are
    /// untouched.
    pub fn invalidate(&mut self, lo: u32, hi: u32, replacement_len: u32) {
        let delta = replacement_len as i64 - (hi - lo) as i64;
        let entries = std::mem::take(&mut self.entries);
        self.entries = entries
            .into_iter()
            .filter_map(|((rule, pos), result)| {
                let window_end = pos + result.examined_length();
                let intersects_edit = pos < hi && lo < window_end;
                if intersects_edit {
                    return None;
                }
                let new_pos = if pos >= hi {
                    (pos as i64 + delta) as u32
                } else {
                    pos
                };
                Some(((rule, new_pos), result))
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::RuleId;

    fn rid(n: u32) -> RuleId {
        RuleId::for_test(n)
    }

    #[test]
    fn entry_intersecting_edit_window_is_purged() {
        let mut memo = MemoTable::new();
        memo.insert(rid(0), 10, ParseResult::success(3, 5, None));
        // examined window is [10, 15); an edit touching index 12 intersects it.
        memo.invalidate(12, 13, 1);
        assert!(memo.get(rid(0), 10).is_none());
    }

    #[test]
    fn entry_entirely_before_edit_is_untouched() {
        let mut memo = MemoTable::new();
        memo.insert(rid(0), 0, ParseResult::success(3, 3, None));
        memo.invalidate(10, 12, 1);
        assert!(memo.get(rid(0), 0).is_some());
    }

    #[test]
    fn entry_after_edit_shifts_by_length_delta() {
        let mut memo = MemoTable::new();
        memo.insert(rid(0), 20, ParseResult::success(3, 3, None));
        // Replacing 2 code units with 5 nets a +3 shift for anything at or after index 2.
        memo.invalidate(2, 4, 5);
        assert!(memo.get(rid(0), 20).is_none());
        assert!(memo.get(rid(0), 23).is_some());
    }
}
