//! Index-stable slot table with tombstone deletion.
//!
//! A `SlotTable` stores opaque GPU handles by position. Removing a handle
//! leaves an empty slot behind instead of shifting later entries, so an index
//! handed out to one owner never changes meaning because another owner
//! released its own slot. Empty slots are reused by the next insertion
//! (first-fit scan from the front).

/// An index-addressed sequence of handles with tombstone-based deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTable<H> {
    slots: Vec<Option<H>>,
}

impl<H> Default for SlotTable<H> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<H: Copy> SlotTable<H> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `handle` in the first empty slot, appending a new slot if
    /// every existing one is occupied. Returns the slot index.
    pub fn insert(&mut self, handle: H) -> usize {
        match self.slots.iter().position(Option::is_none) {
            Some(index) => {
                self.slots[index] = Some(handle);
                index
            }
            None => {
                self.slots.push(Some(handle));
                self.slots.len() - 1
            }
        }
    }

    /// Returns the handle stored at `index`, or `None` if the slot is empty
    /// or out of range.
    pub fn get(&self, index: usize) -> Option<H> {
        self.slots.get(index).copied().flatten()
    }

    /// Empties the slot at `index` and returns the handle it held.
    ///
    /// The slot itself stays in the table; other indices are unaffected.
    pub fn remove(&mut self, index: usize) -> Option<H> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Removes every handle and shrinks the table to zero slots.
    ///
    /// Returns the live handles in slot order so the caller can destroy them.
    pub fn drain(&mut self) -> Vec<H> {
        self.slots.drain(..).flatten().collect()
    }

    /// Returns whether `index` refers to an occupied slot.
    pub fn is_live(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Number of slots, occupied or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the table has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of occupied slots.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterates over `(index, handle)` pairs for every occupied slot.
    pub fn iter(&self) -> impl Iterator<Item = (usize, H)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|h| (i, h)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_appends_when_no_free_slot() {
        let mut table = SlotTable::new();
        assert_eq!(table.insert(10_u32), 0);
        assert_eq!(table.insert(11), 1);
        assert_eq!(table.insert(12), 2);
        assert_eq!(table.len(), 3);
        assert_eq!(table.live_count(), 3);
    }

    #[test]
    fn remove_leaves_tombstone_and_keeps_other_indices() {
        let mut table = SlotTable::new();
        let a = table.insert(1_u32);
        let b = table.insert(2);
        let c = table.insert(3);

        assert_eq!(table.remove(b), Some(2));
        assert_eq!(table.len(), 3, "slot must not be erased");
        assert_eq!(table.get(a), Some(1));
        assert_eq!(table.get(b), None);
        assert_eq!(table.get(c), Some(3));
    }

    #[test]
    fn insert_reuses_first_empty_slot() {
        let mut table = SlotTable::new();
        for h in 0..4_u32 {
            table.insert(h);
        }
        table.remove(3);
        table.remove(1);
        assert_eq!(table.insert(99), 1);
        assert_eq!(table.insert(98), 3);
        assert_eq!(table.insert(97), 4);
    }

    #[test]
    fn remove_twice_returns_none() {
        let mut table = SlotTable::new();
        let i = table.insert(7_u32);
        assert_eq!(table.remove(i), Some(7));
        assert_eq!(table.remove(i), None);
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let mut table: SlotTable<u32> = SlotTable::new();
        assert_eq!(table.remove(42), None);
        assert!(table.is_empty());
    }

    #[test]
    fn drain_returns_live_handles_and_empties_table() {
        let mut table = SlotTable::new();
        table.insert(5_u32);
        let mid = table.insert(6);
        table.insert(7);
        table.remove(mid);

        assert_eq!(table.drain(), vec![5, 7]);
        assert!(table.is_empty());
        assert_eq!(table.live_count(), 0);
    }

    #[test]
    fn iter_skips_tombstones() {
        let mut table = SlotTable::new();
        table.insert('a');
        let b = table.insert('b');
        table.insert('c');
        table.remove(b);
        let pairs: Vec<_> = table.iter().collect();
        assert_eq!(pairs, vec![(0, 'a'), (2, 'c')]);
    }

    // -- Property-based tests --

    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashMap;

        #[derive(Debug, Clone)]
        enum Op {
            Create,
            Delete(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![Just(Op::Create), (0_usize..32).prop_map(Op::Delete)]
        }

        proptest! {
            #[test]
            fn live_indices_survive_unrelated_deletes(ops in prop::collection::vec(op(), 1..200)) {
                let mut table = SlotTable::new();
                // Model: index -> handle for every index the caller still owns.
                let mut owned: HashMap<usize, u32> = HashMap::new();
                let mut next_handle = 1_u32;

                for op in ops {
                    match op {
                        Op::Create => {
                            let index = table.insert(next_handle);
                            prop_assert!(
                                !owned.contains_key(&index),
                                "insert returned live index {index}"
                            );
                            owned.insert(index, next_handle);
                            next_handle += 1;
                        }
                        Op::Delete(pick) => {
                            let mut keys: Vec<usize> = owned.keys().copied().collect();
                            keys.sort_unstable();
                            if keys.is_empty() {
                                continue;
                            }
                            let index = keys[pick % keys.len()];
                            let expected = owned.remove(&index);
                            prop_assert_eq!(table.remove(index), expected);
                        }
                    }

                    for (&index, &handle) in &owned {
                        prop_assert_eq!(
                            table.get(index),
                            Some(handle),
                            "index {} lost its handle", index
                        );
                    }
                    prop_assert_eq!(table.live_count(), owned.len());
                }
            }

            #[test]
            fn freed_slot_is_reused_before_growing(count in 1_usize..64, victim in 0_usize..64) {
                let mut table = SlotTable::new();
                for h in 0..count {
                    table.insert(h);
                }
                let victim = victim % count;
                table.remove(victim);
                let len_before = table.len();
                prop_assert_eq!(table.insert(1000), victim);
                prop_assert_eq!(table.len(), len_before);
            }
        }
    }
}
