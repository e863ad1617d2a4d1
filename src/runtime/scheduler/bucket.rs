//! Phase buckets
//!
//! Each phase owns an intrusive doubly-linked list threaded through the task
//! records (`prev` / `next`). New records go to the front, so a walk visits the
//! most recently started task first. One extra lane holds records parked until
//! the end-of-phase hook.

use crate::runtime::phase::Phase;
use crate::runtime::pool::{Arena, SlotId};

use super::task::TaskRecord;

/// Which list a record is threaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lane {
    Phase(Phase),
    EndOfPhase,
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Bucket {
    head: Option<SlotId>,
    len: usize,
}

impl Bucket {
    #[inline]
    pub fn head(&self) -> Option<SlotId> {
        self.head
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    fn push_front(
        &mut self,
        records: &mut Arena<TaskRecord>,
        slot: SlotId,
    ) {
        let old_head = self.head;
        {
            let record = &mut records[slot];
            record.prev = None;
            record.next = old_head;
        }
        if let Some(head) = old_head {
            records[head].prev = Some(slot);
        }
        self.head = Some(slot);
        self.len += 1;
    }

    fn unlink(
        &mut self,
        records: &mut Arena<TaskRecord>,
        slot: SlotId,
    ) {
        let (prev, next) = {
            let record = &mut records[slot];
            (record.prev.take(), record.next.take())
        };
        match prev {
            Some(prev) => records[prev].next = next,
            None => self.head = next,
        }
        if let Some(next) = next {
            records[next].prev = prev;
        }
        self.len -= 1;
    }
}

/// All lanes of one scheduler.
#[derive(Debug, Default)]
pub(crate) struct Buckets {
    phases: [Bucket; Phase::COUNT],
    end_of_phase: Bucket,
}

impl Buckets {
    #[inline]
    pub fn lane(
        &self,
        lane: Lane,
    ) -> &Bucket {
        match lane {
            Lane::Phase(phase) => &self.phases[phase.index()],
            Lane::EndOfPhase => &self.end_of_phase,
        }
    }

    #[inline]
    fn lane_mut(
        &mut self,
        lane: Lane,
    ) -> &mut Bucket {
        match lane {
            Lane::Phase(phase) => &mut self.phases[phase.index()],
            Lane::EndOfPhase => &mut self.end_of_phase,
        }
    }

    /// Thread `slot` into the front of `lane`, leaving its current lane first.
    pub fn insert(
        &mut self,
        records: &mut Arena<TaskRecord>,
        slot: SlotId,
        lane: Lane,
    ) {
        self.remove(records, slot);
        self.lane_mut(lane).push_front(records, slot);
        records[slot].lane = Some(lane);
    }

    /// Unthread `slot` from whatever lane holds it. No-op when it is in none.
    pub fn remove(
        &mut self,
        records: &mut Arena<TaskRecord>,
        slot: SlotId,
    ) {
        if let Some(lane) = records[slot].lane.take() {
            self.lane_mut(lane).unlink(records, slot);
        }
    }

    /// Detach every record of `lane` into `out`, front to back.
    pub fn drain(
        &mut self,
        records: &mut Arena<TaskRecord>,
        lane: Lane,
        out: &mut Vec<SlotId>,
    ) {
        let bucket = self.lane_mut(lane);
        let mut cursor = bucket.head.take();
        bucket.len = 0;
        while let Some(slot) = cursor {
            let record = &mut records[slot];
            cursor = record.next.take();
            record.prev = None;
            record.lane = None;
            out.push(slot);
        }
    }

    /// Forget every lane without touching the records.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
