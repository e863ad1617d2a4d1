//! Object recycling
//!
//! The scheduler never allocates a fresh record per task step. Records and
//! suspension descriptors are handed out by the containers in this module and
//! returned to them when they are no longer needed.
//!
//! - [`Pool`] hands out owned values and takes them back into a bounded free list.
//! - [`Arena`] keeps values in place and hands out [`SlotId`]s. A slot's
//!   generation is bumped on every release, so a stale id never reaches a
//!   recycled value.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Reset hooks invoked by [`Pool`] and [`Arena`].
pub trait Recycle {
    /// Called every time the value is handed out.
    fn on_spawn(&mut self) {}

    /// Called every time the value is handed back.
    ///
    /// Implementations must drop anything the value owns and return every
    /// field to its neutral default.
    fn on_despawn(&mut self);
}

/// Counters shared by both recycling containers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Values handed out.
    pub spawned: usize,
    /// Values handed out that came from the free list.
    pub reused: usize,
    /// Values handed back.
    pub despawned: usize,
    /// Values handed back but dropped because the free list was full.
    pub discarded: usize,
}

impl PoolStats {
    /// Fraction of spawns served from the free list.
    pub fn reuse_rate(&self) -> f64 {
        if self.spawned == 0 {
            return 0.0;
        }
        self.reused as f64 / self.spawned as f64
    }
}

/// Free-list pool of owned values.
pub struct Pool<T> {
    free: Vec<T>,
    max_retained: usize,
    stats: PoolStats,
}

impl<T: Recycle + Default> Pool<T> {
    /// Create an unbounded pool.
    #[inline]
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// Create a pool that retains at most `max_retained` idle values.
    pub fn with_limit(max_retained: usize) -> Self {
        Self {
            free: Vec::new(),
            max_retained,
            stats: PoolStats::default(),
        }
    }

    /// Fill the free list with `count` fresh values (bounded by the limit).
    pub fn prewarm(
        &mut self,
        count: usize,
    ) {
        let target = count.min(self.max_retained);
        while self.free.len() < target {
            self.free.push(T::default());
        }
    }

    /// Take a value out of the pool, creating one if the free list is empty.
    pub fn spawn(&mut self) -> T {
        let mut value = match self.free.pop() {
            Some(value) => {
                self.stats.reused += 1;
                value
            }
            None => T::default(),
        };
        self.stats.spawned += 1;
        value.on_spawn();
        value
    }

    /// Hand a value back to the pool.
    pub fn despawn(
        &mut self,
        mut value: T,
    ) {
        value.on_despawn();
        self.stats.despawned += 1;
        if self.free.len() < self.max_retained {
            self.free.push(value);
        } else {
            self.stats.discarded += 1;
        }
    }

    /// Number of idle values ready for reuse.
    #[inline]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Snapshot of the pool counters.
    #[inline]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Drop every idle value.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl<T: Recycle + Default> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Pool")
            .field("available", &self.free.len())
            .field("max_retained", &self.max_retained)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Handle to a value stored in an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    index: u32,
    generation: u32,
}

impl SlotId {
    /// Position of the slot inside the arena.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Generation the slot had when this id was handed out.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SlotId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Slot({}v{})", self.index, self.generation)
    }
}

struct Slot<T> {
    value: T,
    generation: u32,
    occupied: bool,
}

/// Slot arena whose released slots are recycled in place.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
    stats: PoolStats,
}

impl<T: Recycle + Default> Arena<T> {
    /// Create an empty arena.
    #[inline]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            stats: PoolStats::default(),
        }
    }

    /// Create `count` idle slots up front.
    pub fn prewarm(
        &mut self,
        count: usize,
    ) {
        while self.free.len() < count {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                value: T::default(),
                generation: 0,
                occupied: false,
            });
            self.free.push(index);
        }
    }

    /// Occupy a slot, reusing a released one when possible.
    pub fn spawn(&mut self) -> SlotId {
        self.stats.spawned += 1;
        self.live += 1;

        if let Some(index) = self.free.pop() {
            self.stats.reused += 1;
            let slot = &mut self.slots[index as usize];
            slot.occupied = true;
            slot.value.on_spawn();
            return SlotId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        let mut value = T::default();
        value.on_spawn();
        self.slots.push(Slot {
            value,
            generation: 0,
            occupied: true,
        });
        SlotId {
            index,
            generation: 0,
        }
    }

    /// Release a slot. Returns `false` for a stale or unknown id.
    pub fn despawn(
        &mut self,
        id: SlotId,
    ) -> bool {
        match self.slots.get_mut(id.index()) {
            Some(slot) if slot.occupied && slot.generation == id.generation => {
                slot.value.on_despawn();
                slot.occupied = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                self.live -= 1;
                self.stats.despawned += 1;
                true
            }
            _ => false,
        }
    }

    /// Check whether `id` still refers to an occupied slot.
    #[inline]
    pub fn contains(
        &self,
        id: SlotId,
    ) -> bool {
        self.get(id).is_some()
    }

    /// Borrow the value behind `id`.
    pub fn get(
        &self,
        id: SlotId,
    ) -> Option<&T> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.occupied && slot.generation == id.generation)
            .map(|slot| &slot.value)
    }

    /// Mutably borrow the value behind `id`.
    pub fn get_mut(
        &mut self,
        id: SlotId,
    ) -> Option<&mut T> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.occupied && slot.generation == id.generation)
            .map(|slot| &mut slot.value)
    }

    /// Iterate over occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.occupied)
            .map(|(index, slot)| {
                (
                    SlotId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    &slot.value,
                )
            })
    }

    /// Number of occupied slots.
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    /// Number of released slots waiting for reuse.
    #[inline]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Total number of slots ever created.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Snapshot of the arena counters.
    #[inline]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Release every occupied slot.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.occupied {
                slot.value.on_despawn();
                slot.occupied = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                self.stats.despawned += 1;
            }
        }
        self.live = 0;
    }
}

impl<T: Recycle + Default> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Recycle + Default> Index<SlotId> for Arena<T> {
    type Output = T;

    fn index(
        &self,
        id: SlotId,
    ) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("stale arena handle {}", id),
        }
    }
}

impl<T: Recycle + Default> IndexMut<SlotId> for Arena<T> {
    fn index_mut(
        &mut self,
        id: SlotId,
    ) -> &mut T {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("stale arena handle {}", id),
        }
    }
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.slots.len())
            .field("live", &self.live)
            .field("available", &self.free.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests;
