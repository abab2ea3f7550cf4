//! Round-robin selection
//!
//! The scan is a pure function over a roster slice, a cursor, and an
//! availability predicate. Starting at the cursor it walks the roster
//! circularly for at most one full lap; the first available agent wins
//! and the next cursor points just past the winner. When nobody is
//! available the cursor must not move, so no `Selection` is produced.
//!
//! Fairness: with a fully available roster of size K, N selections pick
//! each agent ⌊N/K⌋ or ⌈N/K⌉ times, in strict round-trip order.

use crate::agent::types::AgentId;

/// Outcome of a round-robin scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The selected agent
    pub agent_id: AgentId,

    /// Index of the selected agent in the roster
    pub agent_index: usize,

    /// Cursor to persist: one past the selected agent, modulo roster size
    pub next_cursor: usize,
}

/// Pick the next available agent, or `None` when the whole roster is busy
///
/// A cursor outside `[0, len)` is normalized before the scan, so callers
/// holding a stale cursor after a roster edit still get a valid
/// selection.
pub fn select_next<F>(roster: &[AgentId], cursor: usize, is_available: F) -> Option<Selection>
where
    F: Fn(&AgentId) -> bool,
{
    if roster.is_empty() {
        return None;
    }

    let len = roster.len();
    let start = cursor % len;

    for step in 0..len {
        let index = (start + step) % len;
        if is_available(&roster[index]) {
            return Some(Selection {
                agent_id: roster[index].clone(),
                agent_index: index,
                next_cursor: (index + 1) % len,
            });
        }
    }

    None
}
