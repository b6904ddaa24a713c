//! Generational slot pool for high-churn entities.
//!
//! Enemies and projectiles are acquired and released every few ticks, so
//! their storage is recycled instead of reallocated. Each slot carries a
//! generation counter that is bumped on release; a handle only resolves
//! while its generation still matches, so a stale handle held elsewhere can
//! never observe a recycled occupant.

/// Per-use state that must be cleared before a slot is recycled.
pub(crate) trait PoolItem: Default {
    /// Restores the value to its idle state.
    fn reset(&mut self);
}

/// Handle to a pooled slot, valid until the slot is released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Slot {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    generation: u32,
    active: bool,
}

/// Fixed-capacity-with-growth recycler backed by a free list.
#[derive(Debug)]
pub(crate) struct Pool<T: PoolItem> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
}

impl<T: PoolItem> Pool<T> {
    /// Creates a pool pre-warmed with `initial` idle slots.
    ///
    /// The initial size is a hint, not a cap: the pool grows on demand.
    pub(crate) fn with_prewarm(initial: usize) -> Self {
        let mut entries = Vec::with_capacity(initial);
        let mut free = Vec::with_capacity(initial);
        for index in 0..initial {
            entries.push(Entry {
                value: T::default(),
                generation: 0,
                active: false,
            });
            free.push(index as u32);
        }
        Self { entries, free }
    }

    /// Activates an idle slot, constructing a new one if none are free.
    pub(crate) fn acquire(&mut self) -> Slot {
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.active = true;
            return Slot {
                index,
                generation: entry.generation,
            };
        }

        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            value: T::default(),
            generation: 0,
            active: true,
        });
        Slot {
            index,
            generation: 0,
        }
    }

    /// Resolves a handle to its occupant, if the slot is still live.
    pub(crate) fn get(&self, slot: Slot) -> Option<&T> {
        self.entries
            .get(slot.index as usize)
            .filter(|entry| entry.active && entry.generation == slot.generation)
            .map(|entry| &entry.value)
    }

    /// Mutable variant of [`Pool::get`].
    pub(crate) fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        self.entries
            .get_mut(slot.index as usize)
            .filter(|entry| entry.active && entry.generation == slot.generation)
            .map(|entry| &mut entry.value)
    }

    /// Returns the slot to the free list after clearing its per-use state.
    ///
    /// Releasing a stale or already-idle slot is a safe no-op, since an
    /// entity can be marked terminal through two paths within one tick.
    pub(crate) fn release(&mut self, slot: Slot) -> bool {
        let Some(entry) = self.entries.get_mut(slot.index as usize) else {
            return false;
        };
        if !entry.active || entry.generation != slot.generation {
            return false;
        }

        entry.value.reset();
        entry.generation = entry.generation.wrapping_add(1);
        entry.active = false;
        self.free.push(slot.index);
        true
    }

    /// Iterates live occupants in ascending slot order.
    pub(crate) fn iter_active(&self) -> impl Iterator<Item = (Slot, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.active)
            .map(|(index, entry)| {
                (
                    Slot {
                        index: index as u32,
                        generation: entry.generation,
                    },
                    &entry.value,
                )
            })
    }

    /// Collects the handles of all live occupants in ascending slot order.
    pub(crate) fn active_slots(&self) -> Vec<Slot> {
        self.iter_active().map(|(slot, _)| slot).collect()
    }

    /// Number of live occupants.
    pub(crate) fn active_len(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    /// Number of idle slots awaiting reuse.
    pub(crate) fn idle_len(&self) -> usize {
        self.free.len()
    }

    /// Total slots ever constructed.
    pub(crate) fn capacity(&self) -> usize {
        self.entries.len()
    }
}
