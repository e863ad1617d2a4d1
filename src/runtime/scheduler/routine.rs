//! Resumable routines
//!
//! A [`Routine`] is a hand-written state machine. Each call to
//! [`Routine::resume`] runs it up to its next suspension point and returns a
//! [`Step`]. Returning `Err` (or panicking) is a fault: the task is logged and
//! retired, siblings keep running.

use std::borrow::Cow;

use crate::runtime::clock::{ClockKind, TimeSnapshot};
use crate::runtime::phase::Phase;

use super::error::SchedulerError;
use super::link::HostLink;
use super::task::TaskId;
use super::wait::{Delay, Step, Yield};
use super::Scheduler;

/// One resumable unit of cooperative work.
pub trait Routine {
    fn resume(
        &mut self,
        cx: &mut TaskContext<'_>,
    ) -> anyhow::Result<Step>;
}

impl<R: Routine + ?Sized> Routine for Box<R> {
    fn resume(
        &mut self,
        cx: &mut TaskContext<'_>,
    ) -> anyhow::Result<Step> {
        (**self).resume(cx)
    }
}

/// Closure-backed routine, see [`from_fn`].
pub struct FromFn<F> {
    f: F,
}

/// Build a routine from a closure called once per resume.
///
/// ```
/// use tickflow::{routine, Step, Yield};
///
/// let mut left = 3;
/// let countdown = routine::from_fn(move |_cx| {
///     left -= 1;
///     Ok(if left == 0 { Step::Done } else { Yield::Next.into() })
/// });
/// # let _ = countdown;
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut(&mut TaskContext<'_>) -> anyhow::Result<Step>,
{
    FromFn { f }
}

impl<F> Routine for FromFn<F>
where
    F: FnMut(&mut TaskContext<'_>) -> anyhow::Result<Step>,
{
    fn resume(
        &mut self,
        cx: &mut TaskContext<'_>,
    ) -> anyhow::Result<Step> {
        (self.f)(cx)
    }
}

/// Completes on its first resume.
#[derive(Debug, Clone, Copy, Default)]
pub struct Finish;

impl Routine for Finish {
    fn resume(
        &mut self,
        _cx: &mut TaskContext<'_>,
    ) -> anyhow::Result<Step> {
        Ok(Step::Done)
    }
}

/// Runs a callback once after a delay.
pub struct Delayed<F> {
    delay: Delay,
    callback: Option<F>,
    armed: bool,
}

impl<F: FnOnce()> Delayed<F> {
    pub fn new(
        delay: Delay,
        callback: F,
    ) -> Self {
        Self {
            delay,
            callback: Some(callback),
            armed: false,
        }
    }
}

impl<F: FnOnce()> Routine for Delayed<F> {
    fn resume(
        &mut self,
        _cx: &mut TaskContext<'_>,
    ) -> anyhow::Result<Step> {
        if !self.armed {
            self.armed = true;
            return Ok(Yield::Delay(self.delay).into());
        }
        if let Some(callback) = self.callback.take() {
            callback();
        }
        Ok(Step::Done)
    }
}

/// Runs a callback every `interval` until stopped.
pub struct Periodic<F> {
    interval: Delay,
    callback: F,
    started: bool,
}

impl<F: FnMut()> Periodic<F> {
    pub fn new(
        interval: Delay,
        callback: F,
    ) -> Self {
        Self {
            interval,
            callback,
            started: false,
        }
    }
}

impl<F: FnMut()> Routine for Periodic<F> {
    fn resume(
        &mut self,
        _cx: &mut TaskContext<'_>,
    ) -> anyhow::Result<Step> {
        if self.started {
            (self.callback)();
        }
        self.started = true;
        Ok(Yield::Delay(self.interval).into())
    }
}

/// Runs a callback on every tick until `duration` has elapsed.
///
/// The callback receives the elapsed time since the first resume.
pub struct Continuous<F> {
    duration: f64,
    clock: ClockKind,
    started_at: Option<f64>,
    callback: F,
}

impl<F: FnMut(f64)> Continuous<F> {
    pub fn new(
        duration: f64,
        clock: ClockKind,
        callback: F,
    ) -> Self {
        Self {
            duration,
            clock,
            started_at: None,
            callback,
        }
    }
}

impl<F: FnMut(f64)> Routine for Continuous<F> {
    fn resume(
        &mut self,
        cx: &mut TaskContext<'_>,
    ) -> anyhow::Result<Step> {
        let now = cx.now().get(self.clock);
        let started_at = *self.started_at.get_or_insert(now);
        let elapsed = now - started_at;
        if elapsed >= self.duration {
            return Ok(Step::Done);
        }
        (self.callback)(elapsed);
        Ok(Step::next())
    }
}

/// Options for starting a task.
#[derive(Debug, Default)]
pub struct TaskOptions {
    pub(crate) phase: Option<Phase>,
    pub(crate) host: Option<HostLink>,
    pub(crate) tag: Option<Cow<'static, str>>,
}

impl TaskOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase to run in. Defaults to the scheduler's configured phase.
    #[inline]
    pub fn phase(
        mut self,
        phase: Phase,
    ) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Cancel the task once `host` stops being live.
    #[inline]
    pub fn linked_to(
        mut self,
        host: HostLink,
    ) -> Self {
        self.host = Some(host);
        self
    }

    /// Label used by [`Scheduler::stop_tag`].
    #[inline]
    pub fn tag(
        mut self,
        tag: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// View of the scheduler handed to a routine while it runs.
pub struct TaskContext<'a> {
    scheduler: &'a mut Scheduler,
    id: TaskId,
    phase: Phase,
    now: TimeSnapshot,
}

impl<'a> TaskContext<'a> {
    pub(crate) fn new(
        scheduler: &'a mut Scheduler,
        id: TaskId,
        phase: Phase,
        now: TimeSnapshot,
    ) -> Self {
        Self {
            scheduler,
            id,
            phase,
            now,
        }
    }

    /// Id of the running task.
    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Phase the running task belongs to.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Time this resume was scheduled with.
    #[inline]
    pub fn now(&self) -> TimeSnapshot {
        self.now
    }

    /// Scaled time of this resume.
    #[inline]
    pub fn time(&self) -> f64 {
        self.now.scaled
    }

    /// Unscaled time of this resume.
    #[inline]
    pub fn real_time(&self) -> f64 {
        self.now.unscaled
    }

    /// Start a task in the same phase.
    pub fn start(
        &mut self,
        routine: impl Routine + 'static,
    ) -> TaskId {
        let phase = self.phase;
        self.scheduler.start(routine, phase)
    }

    /// Start a task in another phase.
    pub fn start_in(
        &mut self,
        routine: impl Routine + 'static,
        phase: Phase,
    ) -> TaskId {
        self.scheduler.start(routine, phase)
    }

    /// Start a task with explicit options. The phase defaults to this task's.
    pub fn start_with(
        &mut self,
        routine: impl Routine + 'static,
        mut options: TaskOptions,
    ) -> TaskId {
        options.phase.get_or_insert(self.phase);
        self.scheduler.start_with(routine, options)
    }

    pub fn stop(
        &mut self,
        id: TaskId,
    ) -> bool {
        self.scheduler.stop(id)
    }

    pub fn pause(
        &mut self,
        id: TaskId,
    ) -> Result<(), SchedulerError> {
        self.scheduler.pause(id)
    }

    pub fn unpause(
        &mut self,
        id: TaskId,
    ) -> Result<(), SchedulerError> {
        self.scheduler.unpause(id)
    }

    #[inline]
    pub fn is_running(
        &self,
        id: TaskId,
    ) -> bool {
        self.scheduler.is_running(id)
    }

    #[inline]
    pub fn is_paused(
        &self,
        id: TaskId,
    ) -> bool {
        self.scheduler.is_paused(id)
    }
}
