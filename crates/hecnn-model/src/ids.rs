// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter backing auto-generated query/result identifiers.
///
/// The original server seeded a 31-bit PRNG off wall-clock time for this
/// purpose, which collides under sustained load. A process-local atomic
/// counter can't collide and is cheaper besides. Key-ids are not drawn from
/// here — they are client-chosen, per spec.md §3.
static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct QueryId(pub u64);

impl QueryId {
    pub fn new() -> Self {
        Self(NEXT_QUERY_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for QueryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_ids_are_monotonic_and_unique() {
        let a = QueryId::new();
        let b = QueryId::new();
        assert!(b.0 > a.0);
    }
}
