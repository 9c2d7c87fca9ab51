//! Cell reference registry
//!
//! Every reference a stored formula makes is interned here, one entry per
//! distinct target address, with a use count. Entries whose count drops to
//! zero are reclaimed and their slots reused, so the arena stays bounded by
//! the number of live references rather than by evaluation history.

use ahash::AHashMap;
use tabulon_common::CellAddress;

/// Handle to an interned reference target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefId(usize);

#[derive(Debug)]
struct RefEntry {
    addr: CellAddress,
    uses: u32,
}

/// Arena of reference targets with use counting.
#[derive(Debug, Default)]
pub struct RefArena {
    entries: Vec<Option<RefEntry>>,
    index: AHashMap<CellAddress, RefId>,
    free: Vec<usize>,
}

impl RefArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `addr`, reusing the existing entry if one is live.
    pub fn intern(&mut self, addr: CellAddress) -> RefId {
        if let Some(&id) = self.index.get(&addr) {
            if let Some(entry) = self.entries[id.0].as_mut() {
                entry.uses += 1;
                return id;
            }
        }
        let entry = RefEntry { addr, uses: 1 };
        let id = match self.free.pop() {
            Some(slot) => {
                self.entries[slot] = Some(entry);
                RefId(slot)
            }
            None => {
                self.entries.push(Some(entry));
                RefId(self.entries.len() - 1)
            }
        };
        self.index.insert(addr, id);
        id
    }

    /// Drop one use of `id`, reclaiming the entry when the count hits zero.
    /// Releasing an already-reclaimed id is a no-op.
    pub fn release(&mut self, id: RefId) {
        let Some(slot) = self.entries.get_mut(id.0) else {
            return;
        };
        let Some(entry) = slot.as_mut() else {
            return;
        };
        entry.uses -= 1;
        if entry.uses == 0 {
            self.index.remove(&entry.addr);
            *slot = None;
            self.free.push(id.0);
        }
    }

    pub fn get(&self, id: RefId) -> Option<CellAddress> {
        self.entries.get(id.0)?.as_ref().map(|e| e.addr)
    }

    /// Number of live entries.
    pub fn live_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(x: u32, y: u32) -> CellAddress {
        CellAddress::new(0, x, y)
    }

    #[test]
    fn test_interning_reuses_entries() {
        let mut arena = RefArena::new();
        let a = arena.intern(addr(0, 0));
        let b = arena.intern(addr(0, 0));
        assert_eq!(a, b);
        assert_eq!(arena.live_count(), 1);
        assert_eq!(arena.get(a), Some(addr(0, 0)));
    }

    #[test]
    fn test_release_reclaims_at_zero() {
        let mut arena = RefArena::new();
        let a = arena.intern(addr(0, 0));
        let _ = arena.intern(addr(0, 0));
        arena.release(a);
        assert_eq!(arena.live_count(), 1, "one use still outstanding");
        arena.release(a);
        assert_eq!(arena.live_count(), 0);
        assert_eq!(arena.get(a), None);
    }

    #[test]
    fn test_reclaimed_slots_are_reused() {
        let mut arena = RefArena::new();
        let a = arena.intern(addr(0, 0));
        arena.release(a);
        let b = arena.intern(addr(5, 5));
        // same slot, new target
        assert_eq!(a, b);
        assert_eq!(arena.get(b), Some(addr(5, 5)));
        assert_eq!(arena.live_count(), 1);
    }

    #[test]
    fn test_release_after_reclaim_is_noop() {
        let mut arena = RefArena::new();
        let a = arena.intern(addr(0, 0));
        arena.release(a);
        arena.release(a);
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn test_distinct_addresses_get_distinct_entries() {
        let mut arena = RefArena::new();
        let a = arena.intern(addr(0, 0));
        let b = arena.intern(addr(1, 0));
        let c = arena.intern(CellAddress::new(1, 0, 0));
        assert!(a != b && b != c && a != c);
        assert_eq!(arena.live_count(), 3);
    }
}
