//! Cooperative task scheduler
//!
//! This module provides the [`Scheduler`], which drives resumable routines
//! from per-frame phase ticks on the calling thread. No task ever runs in
//! parallel with another; a task only gives up control at a [`Yield`].
//!
//! # Tick protocol
//!
//! For each record of the ticked phase, front to back:
//!
//! 1. finished records are unlinked and recycled,
//! 2. records whose host link reports the host gone are cancelled,
//! 3. paused records, records with a live child and records parked on the
//!    end-of-phase hook are skipped,
//! 4. records whose time threshold or predicate is not yet met are skipped,
//! 5. everything else is resumed and its [`Step`] interpreted.
//!
//! The next record is read before the current one is visited, and records are
//! only recycled at their own visit, so neighbours are never skipped.

mod bucket;
pub mod error;
pub mod link;
pub mod routine;
pub mod task;
pub mod wait;

pub use error::SchedulerError;
pub use link::{Component, HostLink, LinkKind};
pub use routine::{from_fn, Continuous, Delayed, Finish, FromFn, Periodic, Routine, TaskContext, TaskOptions};
pub use task::{TaskId, TaskIdGenerator};
pub use wait::{Condition, Delay, PendingOperation, Step, Yield};

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, error, trace, warn};

use crate::runtime::clock::{ClockKind, SystemClock, TimeSnapshot, TimeSource};
use crate::runtime::phase::Phase;
use crate::runtime::pool::{Arena, Pool, PoolStats, SlotId};

use self::bucket::{Buckets, Lane};
use self::error::catch_fault;
use self::task::{Suspension, TaskRecord};
use self::wait::ConditionWait;

/// What happens to a parent when its child faults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultPolicy {
    /// The parent sees an ordinary completion and resumes.
    #[default]
    Suppress,
    /// Every ancestor of the faulting task is stopped.
    Propagate,
}

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Task records created up front.
    #[serde(default = "default_prewarm_records")]
    pub prewarm_records: usize,
    /// Predicate descriptors created up front.
    #[serde(default = "default_prewarm_conditions")]
    pub prewarm_conditions: usize,
    /// Idle predicate descriptors kept for reuse.
    #[serde(default = "default_max_pooled_conditions")]
    pub max_pooled_conditions: usize,
    /// Child fault handling.
    #[serde(default)]
    pub fault_policy: FaultPolicy,
    /// Log unusable yields at WARN instead of DEBUG.
    #[serde(default = "default_warn_on_unrecognized_yield")]
    pub warn_on_unrecognized_yield: bool,
    /// Phase used when a start call names none.
    #[serde(default)]
    pub default_phase: Phase,
}

fn default_prewarm_records() -> usize {
    64
}

fn default_prewarm_conditions() -> usize {
    16
}

fn default_max_pooled_conditions() -> usize {
    256
}

fn default_warn_on_unrecognized_yield() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            prewarm_records: default_prewarm_records(),
            prewarm_conditions: default_prewarm_conditions(),
            max_pooled_conditions: default_max_pooled_conditions(),
            fault_policy: FaultPolicy::default(),
            warn_on_unrecognized_yield: default_warn_on_unrecognized_yield(),
            default_phase: Phase::default(),
        }
    }
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Tasks started, internal children included.
    pub started: usize,
    /// Tasks that returned [`Step::Done`].
    pub completed: usize,
    /// Explicit stops, one per `stop` target.
    pub stopped: usize,
    /// Tasks cancelled because their host went away.
    pub cancelled: usize,
    /// Tasks retired by a fault.
    pub faulted: usize,
}

/// Single-threaded cooperative scheduler.
pub struct Scheduler {
    config: SchedulerConfig,
    records: Arena<TaskRecord>,
    conditions: Pool<ConditionWait>,
    buckets: Buckets,
    index: HashMap<TaskId, SlotId>,
    ids: TaskIdGenerator,
    clock: Box<dyn TimeSource>,
    ticks: [u64; Phase::COUNT],
    /// Depth of active walks and resumes. While non-zero, stopped records are
    /// only marked and queued in `deferred`.
    busy: u32,
    scratch: Vec<SlotId>,
    /// Records marked done while busy, released once the outermost walk or
    /// resume returns.
    deferred: Vec<SlotId>,
    stats: SchedulerStats,
}

impl Scheduler {
    /// Create a scheduler reading time from `clock`.
    pub fn new(clock: impl TimeSource + 'static) -> Self {
        Self::with_config(clock, SchedulerConfig::default())
    }

    /// Create a scheduler with custom configuration.
    pub fn with_config(
        clock: impl TimeSource + 'static,
        config: SchedulerConfig,
    ) -> Self {
        let mut records = Arena::new();
        records.prewarm(config.prewarm_records);
        let mut conditions = Pool::with_limit(config.max_pooled_conditions);
        conditions.prewarm(config.prewarm_conditions);

        Self {
            config,
            records,
            conditions,
            buckets: Buckets::default(),
            index: HashMap::new(),
            ids: TaskIdGenerator::new(),
            clock: Box::new(clock),
            ticks: [0; Phase::COUNT],
            busy: 0,
            scratch: Vec::new(),
            deferred: Vec::new(),
            stats: SchedulerStats::default(),
        }
    }

    /// Configuration this scheduler was built with.
    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Starting
    // ------------------------------------------------------------------

    /// Start `routine` in `phase` and run it up to its first suspension.
    pub fn start(
        &mut self,
        routine: impl Routine + 'static,
        phase: Phase,
    ) -> TaskId {
        self.start_boxed(Box::new(routine), TaskOptions::new().phase(phase))
    }

    /// Start `routine` in `phase`, cancelled once `host` stops being live.
    pub fn start_linked(
        &mut self,
        routine: impl Routine + 'static,
        phase: Phase,
        host: HostLink,
    ) -> TaskId {
        self.start_boxed(
            Box::new(routine),
            TaskOptions::new().phase(phase).linked_to(host),
        )
    }

    /// Start `routine` with explicit options.
    pub fn start_with(
        &mut self,
        routine: impl Routine + 'static,
        options: TaskOptions,
    ) -> TaskId {
        self.start_boxed(Box::new(routine), options)
    }

    fn start_boxed(
        &mut self,
        routine: Box<dyn Routine>,
        options: TaskOptions,
    ) -> TaskId {
        let phase = options.phase.unwrap_or(self.config.default_phase);
        let (slot, id) = self.spawn_record(routine, phase, options.host, options.tag);
        debug!(task = %id, phase = %phase, "task started");

        // The first resume reads live time: a task started mid-tick must not
        // see the snapshot taken at the start of that tick.
        let now = self.clock.now(phase);
        self.resume(slot, now);
        self.release_deferred();
        id
    }

    fn spawn_record(
        &mut self,
        routine: Box<dyn Routine>,
        phase: Phase,
        host: Option<HostLink>,
        tag: Option<std::borrow::Cow<'static, str>>,
    ) -> (SlotId, TaskId) {
        let index = &self.index;
        let id = self.ids.next_free(|id| index.contains_key(&id));

        let slot = self.records.spawn();
        {
            let record = &mut self.records[slot];
            record.id = Some(id);
            record.phase = phase;
            record.routine = Some(routine);
            record.host = host;
            record.tag = tag;
        }
        self.index.insert(id, slot);
        self.buckets.insert(&mut self.records, slot, Lane::Phase(phase));
        self.stats.started += 1;
        (slot, id)
    }

    // ------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------

    /// Run one tick of `phase`.
    pub fn tick(
        &mut self,
        phase: Phase,
    ) {
        self.ticks[phase.index()] += 1;
        let now = self.clock.now(phase);
        trace!(
            phase = %phase,
            tick = self.ticks[phase.index()],
            queued = self.buckets.lane(Lane::Phase(phase)).len(),
            "phase tick"
        );

        self.busy += 1;
        let mut cursor = self.buckets.lane(Lane::Phase(phase)).head();
        while let Some(slot) = cursor {
            cursor = self.records[slot].next;
            self.visit(slot, now);
        }
        self.busy -= 1;
        self.release_deferred();
    }

    /// Run the end-of-phase hook: every record parked on it is resumed once.
    pub fn end_of_phase(&mut self) {
        if self.buckets.lane(Lane::EndOfPhase).is_empty() {
            return;
        }
        self.busy += 1;
        let mut parked = std::mem::take(&mut self.scratch);
        self.buckets
            .drain(&mut self.records, Lane::EndOfPhase, &mut parked);
        trace!(parked = parked.len(), "end-of-phase hook");

        for &slot in &parked {
            self.visit_end_of_phase(slot);
        }

        parked.clear();
        self.scratch = parked;
        self.busy -= 1;
        self.release_deferred();
    }

    fn visit(
        &mut self,
        slot: SlotId,
        now: TimeSnapshot,
    ) {
        if self.records[slot].done {
            self.discard(slot);
            return;
        }
        if !self.host_is_live(slot) {
            return;
        }

        let phase_tick = self.ticks[self.records[slot].phase.index()];
        let record = &mut self.records[slot];
        if record.is_paused() || record.child.is_some() {
            return;
        }
        if record.wake_after.is_some_and(|tick| tick >= phase_tick) {
            return;
        }

        let ready = match &mut record.suspension {
            Suspension::None => Ok(true),
            Suspension::EndOfPhase => Ok(false),
            Suspension::Until { threshold, clock } => Ok(now.get(*clock) >= *threshold),
            Suspension::Condition(wait) => catch_fault(|| Ok(wait.is_satisfied())),
        };
        match ready {
            Ok(true) => {}
            Ok(false) => return,
            Err(fault) => {
                self.fault(slot, fault);
                return;
            }
        }

        self.clear_suspension(slot);
        self.records[slot].wake_after = None;
        self.resume(slot, now);
    }

    fn visit_end_of_phase(
        &mut self,
        slot: SlotId,
    ) {
        if self.records[slot].done {
            self.discard(slot);
            return;
        }
        if !self.host_is_live(slot) {
            return;
        }
        let phase = self.records[slot].phase;
        self.clear_suspension(slot);
        self.buckets
            .insert(&mut self.records, slot, Lane::Phase(phase));
        // A paused record rejoins its phase and waits there like any other.
        if self.records[slot].is_paused() {
            return;
        }
        let now = self.clock.now(phase);
        self.resume(slot, now);
    }

    /// Check the host link. Cancels or faults the task when it is not live.
    fn host_is_live(
        &mut self,
        slot: SlotId,
    ) -> bool {
        let check = match &self.records[slot].host {
            Some(host) => catch_fault(|| host.is_live()),
            None => return true,
        };
        match check {
            Ok(true) => true,
            Ok(false) => {
                let record = &self.records[slot];
                debug!(task = ?record.id, phase = %record.phase, "host gone, cancelling task");
                self.stats.cancelled += 1;
                self.retire(slot);
                false
            }
            Err(fault) => {
                self.fault(slot, fault);
                false
            }
        }
    }

    /// Resume a record and interpret what it hands back.
    fn resume(
        &mut self,
        slot: SlotId,
        now: TimeSnapshot,
    ) {
        let (id, phase, routine) = {
            let record = &mut self.records[slot];
            (record.id, record.phase, record.routine.take())
        };
        let (Some(id), Some(mut routine)) = (id, routine) else {
            debug_assert!(false, "resume of {slot} without a routine");
            return;
        };

        self.busy += 1;
        let outcome = {
            let mut cx = TaskContext::new(self, id, phase, now);
            catch_fault(|| routine.resume(&mut cx))
        };
        self.busy -= 1;

        // Nothing is recycled while a resume is running, so the slot is
        // still this task's.
        self.records[slot].routine = Some(routine);
        if self.records[slot].done {
            self.discard(slot);
            return;
        }

        match outcome {
            Ok(Step::Done) => {
                trace!(task = %id, "task completed");
                self.stats.completed += 1;
                self.discard(slot);
            }
            Ok(Step::Yield(value)) => self.interpret(slot, value, now),
            Err(fault) => self.fault(slot, fault),
        }
    }

    fn fault(
        &mut self,
        slot: SlotId,
        fault: anyhow::Error,
    ) {
        let record = &self.records[slot];
        error!(
            task = ?record.id,
            phase = %record.phase,
            error = %format!("{fault:#}"),
            "task faulted"
        );
        self.stats.faulted += 1;

        let root = match (self.config.fault_policy, record.parent) {
            (FaultPolicy::Propagate, Some(mut root)) => {
                while let Some(parent) = self.records[root].parent {
                    root = parent;
                }
                Some(root)
            }
            _ => None,
        };
        self.retire(slot);
        if let Some(root) = root {
            if self.records.contains(root) && !self.records[root].done {
                self.stop_slot(root);
            }
        }
    }

    /// Finish `slot` now. Its descendants are recycled now, or once the
    /// outermost walk or resume returns.
    fn retire(
        &mut self,
        slot: SlotId,
    ) {
        let chain = self.mark_chain_done(slot);
        if self.busy == 0 {
            for &member in chain.iter().rev() {
                self.discard(member);
            }
        } else {
            self.discard(slot);
            self.deferred.extend(chain.iter().skip(1).copied());
        }
    }

    /// Apply a yielded value to the record that produced it.
    fn interpret(
        &mut self,
        slot: SlotId,
        value: Yield,
        now: TimeSnapshot,
    ) {
        match value {
            Yield::Next => {}
            Yield::Task(target) => match self.index.get(&target).copied() {
                Some(child) if self.can_adopt(slot, child) => self.link(slot, child),
                _ => self.unrecognized(slot, &Yield::Task(target)),
            },
            Yield::Nested(routine) => {
                let phase = self.records[slot].phase;
                let (child, id) = self.spawn_record(routine, phase, None, None);
                debug!(task = %id, parent = ?self.records[slot].id, "nested task started");
                self.link(slot, child);
                let live = self.clock.now(phase);
                self.resume(child, live);
            }
            Yield::Delay(delay) => {
                let threshold = delay.threshold_from(now.get(delay.clock));
                self.set_suspension(
                    slot,
                    Suspension::Until {
                        threshold,
                        clock: delay.clock,
                    },
                );
            }
            Yield::EndOfPhase => {
                self.set_suspension(slot, Suspension::EndOfPhase);
                self.buckets
                    .insert(&mut self.records, slot, Lane::EndOfPhase);
            }
            Yield::Pending(operation) => {
                match catch_fault(|| Ok(operation.is_done())) {
                    Ok(true) => return,
                    Ok(false) => {}
                    Err(fault) => {
                        self.fault(slot, fault);
                        return;
                    }
                }
                let phase = self.records[slot].phase;
                let (child, id) = self.spawn_record(Box::new(Finish), phase, None, None);
                let mut wait = self.conditions.spawn();
                wait.arm_with(Box::new(move || operation.is_done()), true);
                self.records[child].suspension = Suspension::Condition(wait);
                trace!(task = %id, "waiting on external operation");
                self.link(slot, child);
            }
            Yield::Condition(condition) => {
                let mut wait = self.conditions.spawn();
                wait.arm(condition);
                self.set_suspension(slot, Suspension::Condition(wait));
            }
        }
    }

    fn unrecognized(
        &self,
        slot: SlotId,
        value: &Yield,
    ) {
        let id = self.records[slot].id;
        if self.config.warn_on_unrecognized_yield {
            warn!(task = ?id, value = ?value, "unusable yield, resuming next tick");
        } else {
            debug!(task = ?id, value = ?value, "unusable yield, resuming next tick");
        }
    }

    /// A live, parentless task that is not one of `parent`'s ancestors.
    fn can_adopt(
        &self,
        parent: SlotId,
        child: SlotId,
    ) -> bool {
        if parent == child {
            return false;
        }
        let candidate = &self.records[child];
        if candidate.done || candidate.parent.is_some() {
            return false;
        }
        let mut cursor = self.records[parent].parent;
        while let Some(ancestor) = cursor {
            if ancestor == child {
                return false;
            }
            cursor = self.records[ancestor].parent;
        }
        true
    }

    fn link(
        &mut self,
        parent: SlotId,
        child: SlotId,
    ) {
        self.records[parent].child = Some(child);
        self.records[child].parent = Some(parent);
        if self.records[parent].is_paused() {
            self.propagate_parent_paused(child, true);
        }
    }

    // ------------------------------------------------------------------
    // Suspension bookkeeping
    // ------------------------------------------------------------------

    fn set_suspension(
        &mut self,
        slot: SlotId,
        suspension: Suspension,
    ) {
        self.clear_suspension(slot);
        self.records[slot].suspension = suspension;
    }

    fn clear_suspension(
        &mut self,
        slot: SlotId,
    ) {
        if let Suspension::Condition(wait) = self.records[slot].take_suspension() {
            self.conditions.despawn(wait);
        }
    }

    // ------------------------------------------------------------------
    // Stopping and recycling
    // ------------------------------------------------------------------

    /// Stop a task and its whole child chain.
    ///
    /// Returns `false` when `id` is not running. The ids leave the index right
    /// away. Records are recycled immediately, or once the running tick or
    /// resume returns when called from a routine.
    pub fn stop(
        &mut self,
        id: TaskId,
    ) -> bool {
        match self.index.get(&id).copied() {
            Some(slot) => {
                debug!(task = %id, "task stopped");
                self.stop_slot(slot);
                true
            }
            None => false,
        }
    }

    /// Stop every task, or every task of one phase.
    pub fn stop_all(
        &mut self,
        phase: Option<Phase>,
    ) {
        let targets: Vec<SlotId> = self
            .index
            .values()
            .copied()
            .filter(|slot| phase.is_none_or(|phase| self.records[*slot].phase == phase))
            .collect();
        debug!(phase = ?phase, count = targets.len(), "stopping tasks");
        for slot in targets {
            if self.records.contains(slot) && !self.records[slot].done {
                self.stop_slot(slot);
            }
        }
    }

    /// Stop every task carrying `tag`. Returns how many were stopped.
    pub fn stop_tag(
        &mut self,
        tag: &str,
    ) -> usize {
        let targets: Vec<SlotId> = self
            .index
            .values()
            .copied()
            .filter(|slot| self.records[*slot].tag.as_deref() == Some(tag))
            .collect();
        let mut stopped = 0;
        for slot in targets {
            if self.records.contains(slot) && !self.records[slot].done {
                self.stop_slot(slot);
                stopped += 1;
            }
        }
        stopped
    }

    fn stop_slot(
        &mut self,
        slot: SlotId,
    ) {
        self.stats.stopped += 1;
        let chain = self.mark_chain_done(slot);
        if self.busy == 0 {
            for &member in chain.iter().rev() {
                self.discard(member);
            }
        } else {
            self.deferred.extend(chain);
        }
    }

    /// Recycle records stopped while busy. A no-op inside a walk or resume.
    fn release_deferred(&mut self) {
        if self.busy != 0 || self.deferred.is_empty() {
            return;
        }
        let mut deferred = std::mem::take(&mut self.deferred);
        for &slot in deferred.iter().rev() {
            if self.records.get(slot).is_some_and(|record| record.done) {
                self.discard(slot);
            }
        }
        deferred.clear();
        self.deferred = deferred;
    }

    /// Mark `slot` and its descendants done, drop their ids from the index
    /// and wake `slot`'s parent.
    fn mark_chain_done(
        &mut self,
        slot: SlotId,
    ) -> SmallVec<[SlotId; 8]> {
        self.detach_from_parent(slot);

        let mut chain = SmallVec::new();
        let mut cursor = Some(slot);
        while let Some(member) = cursor {
            let record = &mut self.records[member];
            record.done = true;
            if let Some(id) = record.id {
                if self.index.get(&id) == Some(&member) {
                    self.index.remove(&id);
                }
            }
            chain.push(member);
            cursor = record.child;
        }
        chain
    }

    fn detach_from_parent(
        &mut self,
        slot: SlotId,
    ) {
        let Some(parent) = self.records[slot].parent.take() else {
            return;
        };
        if let Some(record) = self.records.get_mut(parent) {
            if record.child == Some(slot) {
                record.child = None;
                record.wake_after = Some(self.ticks[record.phase.index()]);
            }
        }
    }

    /// Unlink, unindex and recycle a record. Tolerates already recycled slots.
    fn discard(
        &mut self,
        slot: SlotId,
    ) {
        if !self.records.contains(slot) {
            return;
        }
        self.detach_from_parent(slot);
        if let Some(child) = self.records[slot].child.take() {
            if let Some(record) = self.records.get_mut(child) {
                record.parent = None;
            }
        }
        if let Some(id) = self.records[slot].id {
            if self.index.get(&id) == Some(&slot) {
                self.index.remove(&id);
            }
        }
        self.buckets.remove(&mut self.records, slot);
        self.clear_suspension(slot);
        self.records.despawn(slot);
    }

    /// Release every task and descriptor back to the pools.
    ///
    /// Tick counters restart; the id counter keeps running so ids handed out
    /// before the reset never alias new tasks.
    pub fn reset(&mut self) {
        debug!(live = self.index.len(), "scheduler reset");
        let occupied: Vec<SlotId> = self.records.iter().map(|(slot, _)| slot).collect();
        for slot in occupied {
            self.clear_suspension(slot);
        }
        self.records.clear();
        self.buckets.clear();
        self.index.clear();
        self.deferred.clear();
        self.ticks = [0; Phase::COUNT];
    }

    // ------------------------------------------------------------------
    // Pausing
    // ------------------------------------------------------------------

    /// Set or clear the direct pause flag of a running task.
    ///
    /// Descendants are marked parent-paused down to the first descendant that
    /// is itself directly paused.
    pub fn set_paused(
        &mut self,
        id: TaskId,
        paused: bool,
    ) -> Result<(), SchedulerError> {
        let slot = self
            .index
            .get(&id)
            .copied()
            .ok_or(SchedulerError::NotRunning(id))?;
        let record = &mut self.records[slot];
        if record.paused == paused {
            return Ok(());
        }
        record.paused = paused;
        debug!(task = %id, paused, "pause state changed");

        // An ancestor already pauses the whole subtree.
        if record.parent_paused {
            return Ok(());
        }
        if let Some(child) = record.child {
            self.propagate_parent_paused(child, paused);
        }
        Ok(())
    }

    /// Pause a running task and, through it, its child chain.
    #[inline]
    pub fn pause(
        &mut self,
        id: TaskId,
    ) -> Result<(), SchedulerError> {
        self.set_paused(id, true)
    }

    /// Clear a task's own pause flag.
    #[inline]
    pub fn unpause(
        &mut self,
        id: TaskId,
    ) -> Result<(), SchedulerError> {
        self.set_paused(id, false)
    }

    fn propagate_parent_paused(
        &mut self,
        from: SlotId,
        paused: bool,
    ) {
        let mut cursor = Some(from);
        while let Some(slot) = cursor {
            let record = &mut self.records[slot];
            record.parent_paused = paused;
            if record.paused {
                break;
            }
            cursor = record.child;
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether `id` belongs to a live task. Paused tasks count.
    #[inline]
    pub fn is_running(
        &self,
        id: TaskId,
    ) -> bool {
        self.index.contains_key(&id)
    }

    /// Whether `id` is paused directly or through an ancestor. Stale ids
    /// read as not paused.
    pub fn is_paused(
        &self,
        id: TaskId,
    ) -> bool {
        self.index
            .get(&id)
            .is_some_and(|slot| self.records[*slot].is_paused())
    }

    /// Id of the task `id` is waiting on, if any.
    pub fn child_of(
        &self,
        id: TaskId,
    ) -> Option<TaskId> {
        let slot = self.index.get(&id)?;
        let child = self.records[*slot].child?;
        self.records.get(child).and_then(|record| record.id)
    }

    /// Id of the task waiting on `id`, if any.
    pub fn parent_of(
        &self,
        id: TaskId,
    ) -> Option<TaskId> {
        let slot = self.index.get(&id)?;
        let parent = self.records[*slot].parent?;
        self.records.get(parent).and_then(|record| record.id)
    }

    /// Running tasks, optionally restricted to one phase.
    pub fn task_count(
        &self,
        phase: Option<Phase>,
    ) -> usize {
        match phase {
            None => self.index.len(),
            Some(phase) => self
                .index
                .values()
                .filter(|slot| self.records[**slot].phase == phase)
                .count(),
        }
    }

    /// Running tasks carrying `tag`.
    pub fn count_tagged(
        &self,
        tag: &str,
    ) -> usize {
        self.index
            .values()
            .filter(|slot| self.records[**slot].tag.as_deref() == Some(tag))
            .count()
    }

    /// Number of ticks `phase` has seen.
    #[inline]
    pub fn tick_count(
        &self,
        phase: Phase,
    ) -> u64 {
        self.ticks[phase.index()]
    }

    /// Lifetime counters since construction.
    #[inline]
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Records currently holding a task, including stopped ones awaiting
    /// their final visit.
    #[inline]
    pub fn live_records(&self) -> usize {
        self.records.live()
    }

    /// Records idle in the pool.
    #[inline]
    pub fn pooled_records(&self) -> usize {
        self.records.available()
    }

    /// Counters of the task record arena.
    #[inline]
    pub fn record_pool_stats(&self) -> PoolStats {
        self.records.stats()
    }

    /// Counters of the predicate descriptor pool.
    #[inline]
    pub fn condition_pool_stats(&self) -> PoolStats {
        self.conditions.stats()
    }

    /// Idle predicate descriptors.
    #[inline]
    pub fn pooled_conditions(&self) -> usize {
        self.conditions.available()
    }

    // ------------------------------------------------------------------
    // Convenience tasks
    // ------------------------------------------------------------------

    /// Call `callback` once after `seconds` of scaled time.
    pub fn call_delayed(
        &mut self,
        seconds: f64,
        phase: Phase,
        callback: impl FnOnce() + 'static,
    ) -> TaskId {
        let delay = Delay::new(seconds, ClockKind::Scaled);
        self.start(Delayed::new(delay, callback), phase)
    }

    /// Call `callback` every `interval` seconds of scaled time until stopped.
    pub fn call_periodically(
        &mut self,
        interval: f64,
        phase: Phase,
        callback: impl FnMut() + 'static,
    ) -> TaskId {
        let interval = Delay::new(interval, ClockKind::Scaled);
        self.start(Periodic::new(interval, callback), phase)
    }

    /// Call `callback` on every tick for `duration` seconds of scaled time.
    pub fn call_continuously(
        &mut self,
        duration: f64,
        phase: Phase,
        callback: impl FnMut(f64) + 'static,
    ) -> TaskId {
        self.start(Continuous::new(duration, ClockKind::Scaled, callback), phase)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SystemClock::new())
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("running", &self.index.len())
            .field("records", &self.records)
            .field("conditions", &self.conditions)
            .field("ticks", &self.ticks)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
