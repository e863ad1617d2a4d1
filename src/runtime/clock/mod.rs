//! Time sources
//!
//! The scheduler samples a [`TimeSource`] once per phase tick. Two clocks are
//! reported: scaled time (affected by the host's time scale, e.g. slow motion
//! or pause) and unscaled real time.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::runtime::phase::Phase;

/// Which clock a time threshold is measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClockKind {
    /// Host time, affected by the time scale.
    #[default]
    Scaled,
    /// Real time.
    Unscaled,
}

/// Scaled and unscaled time, in seconds, at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSnapshot {
    pub scaled: f64,
    pub unscaled: f64,
}

impl TimeSnapshot {
    #[inline]
    pub fn new(
        scaled: f64,
        unscaled: f64,
    ) -> Self {
        Self { scaled, unscaled }
    }

    /// Read one of the two clocks.
    #[inline]
    pub fn get(
        &self,
        clock: ClockKind,
    ) -> f64 {
        match clock {
            ClockKind::Scaled => self.scaled,
            ClockKind::Unscaled => self.unscaled,
        }
    }
}

/// Provides the current time for a phase.
pub trait TimeSource {
    fn now(
        &self,
        phase: Phase,
    ) -> TimeSnapshot;
}

/// Host-advanced clock.
///
/// Clones share the same time, so a host (or a test) keeps one handle and
/// hands another to the scheduler.
#[derive(Clone, Default)]
pub struct ManualClock {
    inner: Rc<Cell<TimeSnapshot>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time.
    #[inline]
    pub fn now(&self) -> TimeSnapshot {
        self.inner.get()
    }

    /// Set both clocks.
    pub fn set(
        &self,
        scaled: f64,
        unscaled: f64,
    ) {
        self.inner.set(TimeSnapshot::new(scaled, unscaled));
    }

    /// Advance both clocks by `dt` seconds.
    pub fn advance(
        &self,
        dt: f64,
    ) {
        let now = self.inner.get();
        self.inner.set(TimeSnapshot::new(now.scaled + dt, now.unscaled + dt));
    }

    /// Advance only scaled time.
    pub fn advance_scaled(
        &self,
        dt: f64,
    ) {
        let now = self.inner.get();
        self.inner.set(TimeSnapshot::new(now.scaled + dt, now.unscaled));
    }

    /// Advance only unscaled time.
    pub fn advance_unscaled(
        &self,
        dt: f64,
    ) {
        let now = self.inner.get();
        self.inner.set(TimeSnapshot::new(now.scaled, now.unscaled + dt));
    }
}

impl TimeSource for ManualClock {
    fn now(
        &self,
        _phase: Phase,
    ) -> TimeSnapshot {
        self.inner.get()
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_tuple("ManualClock").field(&self.inner.get()).finish()
    }
}

/// Monotonic wall clock with an adjustable time scale.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
    /// Unscaled time at the last scale change.
    anchor_unscaled: Cell<f64>,
    /// Scaled time at the last scale change.
    anchor_scaled: Cell<f64>,
    scale: Cell<f64>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            anchor_unscaled: Cell::new(0.0),
            anchor_scaled: Cell::new(0.0),
            scale: Cell::new(1.0),
        }
    }

    /// Current time scale.
    #[inline]
    pub fn time_scale(&self) -> f64 {
        self.scale.get()
    }

    /// Change the time scale. Scaled time stays continuous across the change.
    pub fn set_time_scale(
        &self,
        scale: f64,
    ) {
        let now = self.sample();
        self.anchor_unscaled.set(now.unscaled);
        self.anchor_scaled.set(now.scaled);
        self.scale.set(scale.max(0.0));
    }

    fn sample(&self) -> TimeSnapshot {
        let unscaled = self.origin.elapsed().as_secs_f64();
        let scaled =
            self.anchor_scaled.get() + (unscaled - self.anchor_unscaled.get()) * self.scale.get();
        TimeSnapshot::new(scaled, unscaled)
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn now(
        &self,
        _phase: Phase,
    ) -> TimeSnapshot {
        self.sample()
    }
}
