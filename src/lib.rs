//! tickflow
//!
//! A cooperative, phase-driven task scheduler. Tasks are resumable routines
//! that run on the caller's thread and suspend by yielding: for the next tick,
//! for a delay, for another task, for a predicate, or for the end-of-phase
//! hook. Task records and wait descriptors are recycled through pools.
//!
//! # Example
//!
//! ```
//! use tickflow::{routine, ManualClock, Phase, Scheduler, Step, Yield};
//!
//! let clock = ManualClock::new();
//! let mut scheduler = Scheduler::new(clock.clone());
//!
//! let mut waited = false;
//! let id = scheduler.start(
//!     routine::from_fn(move |_cx| {
//!         if waited {
//!             return Ok(Step::Done);
//!         }
//!         waited = true;
//!         Ok(Yield::seconds(1.0).into())
//!     }),
//!     Phase::EarlyUpdate,
//! );
//!
//! clock.advance(1.0);
//! scheduler.tick(Phase::EarlyUpdate);
//! assert!(!scheduler.is_running(id));
//! ```

#![doc(html_root_url = "https://docs.rs/tickflow")]
#![warn(rust_2018_idioms)]

// Public modules
pub mod runtime;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};

pub use runtime::clock::{ClockKind, ManualClock, SystemClock, TimeSnapshot, TimeSource};
pub use runtime::host::{FrameDriver, PhaseListener, SubscriptionId};
pub use runtime::phase::Phase;
pub use runtime::pool::{Arena, Pool, PoolStats, Recycle, SlotId};
pub use runtime::scheduler::routine;
pub use runtime::scheduler::{
    Component, Condition, Delay, FaultPolicy, HostLink, LinkKind, PendingOperation, Routine,
    Scheduler, SchedulerConfig, SchedulerError, SchedulerStats, Step, TaskContext, TaskId,
    TaskOptions, Yield,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "tickflow";
