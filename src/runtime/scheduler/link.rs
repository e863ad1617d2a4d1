//! Lifetime linking
//!
//! A task can be tied to a host object. The link is checked every time the
//! scheduler visits the task; once the check reports the host gone, the task
//! and its child chain are cancelled without the host calling `stop`.

use std::fmt;
use std::rc::{Rc, Weak};

/// A host that can be switched off while it still exists.
pub trait Component {
    fn is_active(&self) -> bool;
}

impl<T: Component + ?Sized> Component for std::cell::RefCell<T> {
    fn is_active(&self) -> bool {
        self.try_borrow().map(|host| host.is_active()).unwrap_or(true)
    }
}

/// Which liveness rule a link applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Live while the host exists.
    Object,
    /// Live while the host exists and reports itself active.
    Component,
}

type Check = Box<dyn Fn() -> anyhow::Result<bool>>;

/// Liveness link between a task and its host.
pub struct HostLink {
    kind: LinkKind,
    check: Check,
}

impl HostLink {
    /// Live while `host` has strong references.
    pub fn object<T: ?Sized + 'static>(host: &Rc<T>) -> Self {
        let weak: Weak<T> = Rc::downgrade(host);
        Self {
            kind: LinkKind::Object,
            check: Box::new(move || Ok(weak.strong_count() > 0)),
        }
    }

    /// Live while `host` has strong references and is active.
    pub fn component<T: Component + ?Sized + 'static>(host: &Rc<T>) -> Self {
        let weak: Weak<T> = Rc::downgrade(host);
        Self {
            kind: LinkKind::Component,
            check: Box::new(move || Ok(weak.upgrade().is_some_and(|host| host.is_active()))),
        }
    }

    /// Custom check. An `Err` is handled like a task fault.
    pub fn from_check(
        kind: LinkKind,
        check: impl Fn() -> anyhow::Result<bool> + 'static,
    ) -> Self {
        Self {
            kind,
            check: Box::new(check),
        }
    }

    #[inline]
    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    /// Run the check.
    #[inline]
    pub fn is_live(&self) -> anyhow::Result<bool> {
        (self.check)()
    }
}

impl fmt::Debug for HostLink {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("HostLink").field("kind", &self.kind).finish_non_exhaustive()
    }
}
