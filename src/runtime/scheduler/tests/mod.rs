//! Scheduler 单元测试
//!
//! Routines here are small scripts: each resume pops the next yield value and
//! the script completes once it runs out.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::runtime::clock::ManualClock;
use crate::runtime::phase::Phase;
use crate::runtime::scheduler::*;


const EARLY: Phase = Phase::EarlyUpdate;

/// Yields its values in order, then completes.
struct Script {
    steps: VecDeque<Yield>,
    resumes: Rc<Cell<u32>>,
}

impl Routine for Script {
    fn resume(
        &mut self,
        _cx: &mut TaskContext<'_>,
    ) -> anyhow::Result<Step> {
        self.resumes.set(self.resumes.get() + 1);
        Ok(match self.steps.pop_front() {
            Some(value) => value.into(),
            None => Step::Done,
        })
    }
}

fn script(
    resumes: &Rc<Cell<u32>>,
    steps: impl IntoIterator<Item = Yield>,
) -> Script {
    Script {
        steps: steps.into_iter().collect(),
        resumes: resumes.clone(),
    }
}

/// Yields `Next` forever.
fn forever(resumes: &Rc<Cell<u32>>) -> impl Routine + 'static {
    let resumes = resumes.clone();
    from_fn(move |_cx| {
        resumes.set(resumes.get() + 1);
        Ok(Step::next())
    })
}

fn counter() -> Rc<Cell<u32>> {
    Rc::new(Cell::new(0))
}

fn flag(value: bool) -> Rc<Cell<bool>> {
    Rc::new(Cell::new(value))
}

fn scheduler() -> (Scheduler, ManualClock) {
    let clock = ManualClock::new();
    (Scheduler::new(clock.clone()), clock)
}

/// Builds a chain of nested tasks `depth` levels below the root, recording
/// every id root first. Each link completes on the resume after its child
/// finishes; the innermost task runs until stopped.
fn nest(
    depth: usize,
    ids: &Rc<RefCell<Vec<TaskId>>>,
) -> Box<dyn Routine> {
    let ids = ids.clone();
    let mut spawned = false;
    Box::new(from_fn(move |cx| {
        if !spawned {
            spawned = true;
            ids.borrow_mut().push(cx.id());
            if depth > 0 {
                return Ok(Yield::Nested(nest(depth - 1, &ids)).into());
            }
        }
        if depth == 0 {
            return Ok(Step::next());
        }
        Ok(Step::Done)
    }))
}

mod task_id_tests {
    use super::*;

    #[test]
    fn test_task_id_from_raw() {
        assert_eq!(TaskId::from_raw(7).map(TaskId::get), Some(7));
        assert!(TaskId::from_raw(0).is_none());
        assert!(TaskId::from_raw(-3).is_none());
    }

    #[test]
    fn test_task_id_try_from() {
        assert_eq!(TaskId::try_from(-1), Err(SchedulerError::InvalidId(-1)));
        assert_eq!(TaskId::try_from(4).map(TaskId::get), Ok(4));
    }

    #[test]
    fn test_task_id_display() {
        let id = TaskId::from_raw(5).unwrap();
        assert_eq!(id.to_string(), "Task(5)");
    }

    #[test]
    fn test_generator_wraps_and_skips_live_ids() {
        let mut ids = TaskIdGenerator::starting_after(i32::MAX - 1);
        assert_eq!(ids.next_free(|_| false).get(), i32::MAX);
        let next = ids.next_free(|id| id.get() == 1);
        assert_eq!(next.get(), 2);
    }
}
