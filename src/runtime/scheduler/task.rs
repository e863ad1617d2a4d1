//! Task records
//!
//! A [`TaskRecord`] is the recyclable state of one in-flight routine. Records
//! live in the scheduler's arena and are linked to each other through
//! [`SlotId`]s: a parent owns its single child link, the child keeps a
//! lookup-only back link. Both links are cleared whenever either record is
//! released, so a recycled slot never inherits a stale relationship.

use std::borrow::Cow;
use std::fmt;

use crate::runtime::clock::ClockKind;
use crate::runtime::phase::Phase;
use crate::runtime::pool::{Recycle, SlotId};

use super::bucket::Lane;
use super::error::SchedulerError;
use super::link::HostLink;
use super::routine::Routine;
use super::wait::ConditionWait;

/// Opaque task identifier. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(i32);

impl TaskId {
    /// Wrap a raw id. Returns `None` for values that can never be live.
    #[inline]
    pub fn from_raw(raw: i32) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// The raw integer value.
    #[inline]
    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

impl TryFrom<i32> for TaskId {
    type Error = SchedulerError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Self::from_raw(raw).ok_or(SchedulerError::InvalidId(raw))
    }
}

/// Monotonic id source.
///
/// Ids wrap back to 1 after `i32::MAX`; ids still held by live tasks are
/// skipped.
#[derive(Debug, Default)]
pub struct TaskIdGenerator {
    last: i32,
}

impl TaskIdGenerator {
    #[inline]
    pub fn new() -> Self {
        Self { last: 0 }
    }

    /// Start counting after `last`. Non-positive values restart at 1.
    pub fn starting_after(last: i32) -> Self {
        Self { last: last.max(0) }
    }

    /// Produce the next id for which `in_use` is false.
    pub fn next_free(
        &mut self,
        in_use: impl Fn(TaskId) -> bool,
    ) -> TaskId {
        loop {
            self.last = self.last.wrapping_add(1);
            if self.last <= 0 {
                self.last = 1;
            }
            let id = TaskId(self.last);
            if !in_use(id) {
                return id;
            }
        }
    }
}

/// Why a record is parked.
#[derive(Default)]
pub(crate) enum Suspension {
    /// Eligible on the next visit.
    #[default]
    None,
    /// Eligible once `clock` reaches `threshold`.
    Until { threshold: f64, clock: ClockKind },
    /// Eligible once the pooled predicate reports the expected value.
    Condition(ConditionWait),
    /// Parked in the end-of-phase lane.
    EndOfPhase,
}

impl fmt::Debug for Suspension {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Suspension::None => f.write_str("None"),
            Suspension::Until { threshold, clock } => f
                .debug_struct("Until")
                .field("threshold", threshold)
                .field("clock", clock)
                .finish(),
            Suspension::Condition(wait) => f.debug_tuple("Condition").field(wait).finish(),
            Suspension::EndOfPhase => f.write_str("EndOfPhase"),
        }
    }
}

/// One in-flight task.
#[derive(Default)]
pub(crate) struct TaskRecord {
    pub id: Option<TaskId>,
    pub done: bool,
    pub phase: Phase,
    pub routine: Option<Box<dyn Routine>>,
    pub parent: Option<SlotId>,
    pub child: Option<SlotId>,
    pub suspension: Suspension,
    pub paused: bool,
    pub parent_paused: bool,
    pub host: Option<HostLink>,
    pub tag: Option<Cow<'static, str>>,
    /// Tick count of the owning phase when the last child finished. The
    /// record is not resumed before the following tick.
    pub wake_after: Option<u64>,
    pub lane: Option<Lane>,
    pub prev: Option<SlotId>,
    pub next: Option<SlotId>,
}

impl TaskRecord {
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused || self.parent_paused
    }

    /// Detach the held descriptor so the caller can return it to its pool.
    #[inline]
    pub fn take_suspension(&mut self) -> Suspension {
        std::mem::take(&mut self.suspension)
    }
}

impl Recycle for TaskRecord {
    fn on_despawn(&mut self) {
        self.id = None;
        self.done = false;
        self.phase = Phase::default();
        self.routine = None;
        self.parent = None;
        self.child = None;
        self.suspension = Suspension::None;
        self.paused = false;
        self.parent_paused = false;
        self.host = None;
        self.tag = None;
        self.wake_after = None;
        self.lane = None;
        self.prev = None;
        self.next = None;
    }
}

impl fmt::Debug for TaskRecord {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TaskRecord")
            .field("id", &self.id)
            .field("done", &self.done)
            .field("phase", &self.phase)
            .field("parent", &self.parent)
            .field("child", &self.child)
            .field("suspension", &self.suspension)
            .field("paused", &self.paused)
            .field("parent_paused", &self.parent_paused)
            .field("linked", &self.host.is_some())
            .field("tag", &self.tag)
            .field("lane", &self.lane)
            .finish()
    }
}
