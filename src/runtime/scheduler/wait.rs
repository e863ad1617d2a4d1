//! Suspension descriptors
//!
//! A routine hands one [`Yield`] back to the scheduler each time it suspends.
//! The set of variants is closed: adding a new way of waiting means adding a
//! variant here and handling it wherever `Yield` is matched.

use std::fmt;
use std::rc::Rc;

use crate::runtime::clock::ClockKind;
use crate::runtime::pool::Recycle;

use super::routine::Routine;
use super::task::TaskId;

/// Result of one resume.
pub enum Step {
    /// Suspend with the given descriptor.
    Yield(Yield),
    /// The routine has finished.
    Done,
}

impl Step {
    /// Suspend until the next tick of the same phase.
    #[inline]
    pub fn next() -> Self {
        Step::Yield(Yield::Next)
    }
}

impl From<Yield> for Step {
    fn from(value: Yield) -> Self {
        Step::Yield(value)
    }
}

impl fmt::Debug for Step {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Step::Yield(value) => f.debug_tuple("Yield").field(value).finish(),
            Step::Done => f.write_str("Done"),
        }
    }
}

/// What a suspended routine is waiting for.
pub enum Yield {
    /// Resume on the next tick of the same phase.
    Next,
    /// Resume after another live task completes.
    Task(TaskId),
    /// Run a child routine to completion, then resume.
    Nested(Box<dyn Routine>),
    /// Resume once a clock has advanced by a duration.
    Delay(Delay),
    /// Resume once at the end of the current frame's phases.
    EndOfPhase,
    /// Resume after an external operation reports completion.
    Pending(Box<dyn PendingOperation>),
    /// Resume once a predicate reports the expected value.
    Condition(Condition),
}

impl Yield {
    /// Wait `seconds` of scaled time.
    #[inline]
    pub fn seconds(seconds: f64) -> Self {
        Yield::Delay(Delay::new(seconds, ClockKind::Scaled))
    }

    /// Wait `seconds`, measured in unscaled time when `unscaled` is set.
    #[inline]
    pub fn seconds_on(
        seconds: f64,
        unscaled: bool,
    ) -> Self {
        let clock = if unscaled {
            ClockKind::Unscaled
        } else {
            ClockKind::Scaled
        };
        Yield::Delay(Delay::new(seconds, clock))
    }

    /// Wait `seconds` of real time.
    #[inline]
    pub fn real_seconds(seconds: f64) -> Self {
        Yield::Delay(Delay::new(seconds, ClockKind::Unscaled))
    }

    #[inline]
    pub fn end_of_phase() -> Self {
        Yield::EndOfPhase
    }

    /// Wait until `predicate` returns true.
    pub fn until(predicate: impl FnMut() -> bool + 'static) -> Self {
        Yield::Condition(Condition::new(predicate, true))
    }

    /// Wait as long as `predicate` returns true.
    pub fn wait_while(predicate: impl FnMut() -> bool + 'static) -> Self {
        Yield::Condition(Condition::new(predicate, false))
    }

    /// Wait for another task to finish.
    #[inline]
    pub fn task(id: TaskId) -> Self {
        Yield::Task(id)
    }

    /// Run `routine` as a child task and wait for it.
    pub fn nested(routine: impl Routine + 'static) -> Self {
        Yield::Nested(Box::new(routine))
    }

    /// Wait for an external operation.
    pub fn pending(operation: impl PendingOperation + 'static) -> Self {
        Yield::Pending(Box::new(operation))
    }

    /// Short variant name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Yield::Next => "next",
            Yield::Task(_) => "task",
            Yield::Nested(_) => "nested",
            Yield::Delay(_) => "delay",
            Yield::EndOfPhase => "end-of-phase",
            Yield::Pending(_) => "pending",
            Yield::Condition(_) => "condition",
        }
    }
}

impl fmt::Debug for Yield {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Yield::Task(id) => f.debug_tuple("Task").field(id).finish(),
            Yield::Delay(delay) => f.debug_tuple("Delay").field(delay).finish(),
            Yield::Condition(condition) => f.debug_tuple("Condition").field(condition).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// Resume-at-time descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delay {
    pub seconds: f64,
    pub clock: ClockKind,
}

impl Delay {
    pub fn new(
        seconds: f64,
        clock: ClockKind,
    ) -> Self {
        Self { seconds, clock }
    }

    /// Absolute threshold relative to `now`. NaN durations count as zero.
    #[inline]
    pub fn threshold_from(
        &self,
        now: f64,
    ) -> f64 {
        if self.seconds.is_nan() {
            now
        } else {
            now + self.seconds
        }
    }
}

/// Predicate descriptor.
pub struct Condition {
    predicate: Box<dyn FnMut() -> bool>,
    expected: bool,
}

impl Condition {
    /// Satisfied once `predicate()` equals `expected`.
    pub fn new(
        predicate: impl FnMut() -> bool + 'static,
        expected: bool,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            expected,
        }
    }

    /// Whether this waits for the predicate to turn true (`wait until`) or
    /// false (`wait while`).
    #[inline]
    pub fn expected(&self) -> bool {
        self.expected
    }
}

impl fmt::Debug for Condition {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Condition")
            .field("expected", &self.expected)
            .finish_non_exhaustive()
    }
}

/// Handle to work that finishes outside the scheduler.
pub trait PendingOperation {
    fn is_done(&self) -> bool;
}

impl<T: PendingOperation + ?Sized> PendingOperation for Rc<T> {
    fn is_done(&self) -> bool {
        (**self).is_done()
    }
}

impl<T: PendingOperation + ?Sized> PendingOperation for Box<T> {
    fn is_done(&self) -> bool {
        (**self).is_done()
    }
}

/// Pooled predicate-wait record held by a parked task.
#[derive(Default)]
pub(crate) struct ConditionWait {
    predicate: Option<Box<dyn FnMut() -> bool>>,
    expected: bool,
}

impl ConditionWait {
    /// Load a descriptor into this record.
    pub fn arm(
        &mut self,
        condition: Condition,
    ) {
        self.predicate = Some(condition.predicate);
        self.expected = condition.expected;
    }

    /// Load a raw predicate into this record.
    pub fn arm_with(
        &mut self,
        predicate: Box<dyn FnMut() -> bool>,
        expected: bool,
    ) {
        self.predicate = Some(predicate);
        self.expected = expected;
    }

    /// Evaluate the predicate. An unarmed record is always satisfied.
    pub fn is_satisfied(&mut self) -> bool {
        match self.predicate.as_mut() {
            Some(predicate) => predicate() == self.expected,
            None => true,
        }
    }
}

impl Recycle for ConditionWait {
    fn on_despawn(&mut self) {
        self.predicate = None;
        self.expected = true;
    }
}

impl fmt::Debug for ConditionWait {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ConditionWait")
            .field("armed", &self.predicate.is_some())
            .field("expected", &self.expected)
            .finish()
    }
}
