//! `EditSubscriber` and the edit-notification contract (spec.md §5, §6).
//!
//! For each edit, a [`ParsedString`](crate::parsed_string::ParsedString) calls
//! `will_process_editing` then `did_process_editing` on every registered subscriber,
//! with identical mask/range/delta on both calls. Notifications are never nested: a
//! subscriber that itself triggers an edit (which it must not do from inside these
//! callbacks) would violate the single-owner concurrency model of spec.md §5, not
//! just this contract.

use crate::range::TextRange;

bitflags::bitflags! {
    /// What kind of change a notification describes. `ATTRIBUTES_EDITED` is reserved
    /// for the external styling layer (spec.md §6). This core never sets it alone,
    /// since it has no concept of attributes, but carries the bit so a downstream
    /// styling layer can reuse the same notification type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChangeMask: u8 {
        const CHARACTERS_EDITED = 0b01;
        const ATTRIBUTES_EDITED = 0b10;
    }
}

/// The payload delivered to both `will_process_editing` and `did_process_editing` for
/// one edit. `edited_range` and `change_in_length` are in visible coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditNotification {
    pub mask: ChangeMask,
    pub edited_range: TextRange,
    pub change_in_length: i64,
}

/// A collaborator that observes edits to a [`ParsedString`](crate::parsed_string::ParsedString).
pub trait EditSubscriber {
    fn will_process_editing(&mut self, notification: EditNotification);
    fn did_process_editing(&mut self, notification: EditNotification);
}
