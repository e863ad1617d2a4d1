//! Host frame contract
//!
//! The scheduler does not own a frame loop. A host registers listeners with a
//! [`FrameDriver`], which calls them once per phase in priority order and then
//! fires the end-of-phase hook and any one-shot callbacks.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::runtime::phase::Phase;
use crate::runtime::scheduler::Scheduler;

/// Receives phase callbacks from a [`FrameDriver`].
pub trait PhaseListener {
    /// Called once per phase per frame.
    fn on_phase(
        &mut self,
        phase: Phase,
    );

    /// Called once per frame after every phase.
    fn on_end_of_phase(&mut self) {}
}

impl PhaseListener for Scheduler {
    fn on_phase(
        &mut self,
        phase: Phase,
    ) {
        self.tick(phase);
    }

    fn on_end_of_phase(&mut self) {
        self.end_of_phase();
    }
}

/// Token returned by [`FrameDriver::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    priority: i32,
    listener: Rc<RefCell<dyn PhaseListener>>,
}

/// Dispatches phases to listeners.
///
/// Lower priorities run first; equal priorities run in subscription order.
#[derive(Default)]
pub struct FrameDriver {
    subscribers: Vec<Subscriber>,
    deferred: Vec<Box<dyn FnOnce()>>,
    next_subscription: u64,
    frame: u64,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe(
        &mut self,
        priority: i32,
        listener: Rc<RefCell<dyn PhaseListener>>,
    ) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        // Insert after every subscriber with the same or lower priority.
        let position = self
            .subscribers
            .partition_point(|subscriber| subscriber.priority <= priority);
        self.subscribers.insert(
            position,
            Subscriber {
                id,
                priority,
                listener,
            },
        );
        id
    }

    /// Remove a listener. Returns `false` for an unknown id.
    pub fn unsubscribe(
        &mut self,
        id: SubscriptionId,
    ) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|subscriber| subscriber.id != id);
        self.subscribers.len() != before
    }

    /// Run `callback` once, after the end-of-phase hook of the current frame.
    pub fn defer(
        &mut self,
        callback: impl FnOnce() + 'static,
    ) {
        self.deferred.push(Box::new(callback));
    }

    /// Dispatch one phase to every listener.
    pub fn run_phase(
        &mut self,
        phase: Phase,
    ) {
        for subscriber in &self.subscribers {
            subscriber.listener.borrow_mut().on_phase(phase);
        }
    }

    /// Fire the end-of-phase hook, then the deferred callbacks.
    pub fn run_end_of_phase(&mut self) {
        for subscriber in &self.subscribers {
            subscriber.listener.borrow_mut().on_end_of_phase();
        }
        for callback in std::mem::take(&mut self.deferred) {
            callback();
        }
    }

    /// Run every phase in frame order, then the end-of-phase hook.
    pub fn run_frame(&mut self) {
        self.frame += 1;
        trace!(frame = self.frame, "frame start");
        for phase in Phase::ALL {
            self.run_phase(phase);
        }
        self.run_end_of_phase();
    }

    /// Frames run so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl fmt::Debug for FrameDriver {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let priorities: Vec<i32> = self.subscribers.iter().map(|s| s.priority).collect();
        f.debug_struct("FrameDriver")
            .field("priorities", &priorities)
            .field("deferred", &self.deferred.len())
            .field("frame", &self.frame)
            .finish()
    }
}
