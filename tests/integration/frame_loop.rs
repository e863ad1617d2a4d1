//! Scheduler driven by a host frame loop

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tickflow::{
    routine, FrameDriver, ManualClock, Phase, PhaseListener, Scheduler, Step, TaskId, Yield,
};

fn driven() -> (FrameDriver, Rc<RefCell<Scheduler>>, ManualClock) {
    let clock = ManualClock::new();
    let scheduler = Rc::new(RefCell::new(Scheduler::new(clock.clone())));
    let mut driver = FrameDriver::new();
    driver.subscribe(0, scheduler.clone());
    (driver, scheduler, clock)
}

#[test]
fn test_frame_runs_each_phase_once() {
    let (mut driver, scheduler, _clock) = driven();
    let seen = Rc::new(RefCell::new(Vec::new()));
    for phase in Phase::ALL {
        let seen = seen.clone();
        scheduler.borrow_mut().start(
            routine::from_fn(move |cx| {
                seen.borrow_mut().push(cx.phase());
                Ok(Step::next())
            }),
            phase,
        );
    }
    seen.borrow_mut().clear();

    driver.run_frame();
    assert_eq!(
        *seen.borrow(),
        vec![Phase::PhysicsUpdate, Phase::EarlyUpdate, Phase::LateUpdate]
    );
    let scheduler = scheduler.borrow();
    for phase in Phase::ALL {
        assert_eq!(scheduler.tick_count(phase), 1);
    }
}

#[test]
fn test_end_of_phase_fires_after_late_update() {
    let (mut driver, scheduler, _clock) = driven();
    let log = Rc::new(RefCell::new(Vec::new()));
    {
        let log = log.clone();
        let mut step = 0;
        scheduler.borrow_mut().start(
            routine::from_fn(move |_cx| {
                step += 1;
                log.borrow_mut().push(format!("eop-task:{step}"));
                Ok(if step == 1 {
                    Yield::end_of_phase().into()
                } else {
                    Step::Done
                })
            }),
            Phase::EarlyUpdate,
        );
    }
    {
        let log = log.clone();
        scheduler.borrow_mut().start(
            routine::from_fn(move |_cx| {
                log.borrow_mut().push("late".to_string());
                Ok(Step::next())
            }),
            Phase::LateUpdate,
        );
    }
    log.borrow_mut().clear();

    driver.run_frame();
    assert_eq!(*log.borrow(), vec!["late", "eop-task:2"]);
}

#[test]
fn test_delay_across_frames() {
    let (mut driver, scheduler, clock) = driven();
    let fired = Rc::new(Cell::new(0u32));
    {
        let fired = fired.clone();
        scheduler
            .borrow_mut()
            .call_delayed(0.05, Phase::EarlyUpdate, move || fired.set(fired.get() + 1));
    }

    for _ in 0..10 {
        clock.advance(1.0 / 60.0);
        driver.run_frame();
    }
    assert_eq!(fired.get(), 1);
    assert_eq!(scheduler.borrow().task_count(None), 0);
}

#[test]
fn test_periodic_and_continuous_helpers() {
    let (mut driver, scheduler, clock) = driven();
    let ticks = Rc::new(Cell::new(0u32));
    let samples = Rc::new(RefCell::new(Vec::new()));
    let periodic = {
        let ticks = ticks.clone();
        scheduler
            .borrow_mut()
            .call_periodically(1.0, Phase::LateUpdate, move || ticks.set(ticks.get() + 1))
    };
    {
        let samples = samples.clone();
        scheduler.borrow_mut().call_continuously(2.0, Phase::PhysicsUpdate, move |elapsed| {
            samples.borrow_mut().push(elapsed)
        });
    }

    for _ in 0..4 {
        clock.advance(1.0);
        driver.run_frame();
    }
    assert_eq!(ticks.get(), 4);
    assert_eq!(*samples.borrow(), vec![0.0, 1.0]);

    assert!(scheduler.borrow_mut().stop(periodic));
    clock.advance(1.0);
    driver.run_frame();
    assert_eq!(ticks.get(), 4);
}

#[test]
fn test_parent_resumes_the_frame_after_child_completes() {
    let (mut driver, scheduler, _clock) = driven();
    let parent_frames = Rc::new(RefCell::new(Vec::new()));
    let frame = Rc::new(Cell::new(0u64));
    {
        let parent_frames = parent_frames.clone();
        let frame = frame.clone();
        let mut child_frames = 0;
        let mut child = Some(routine::from_fn(move |_cx| {
            child_frames += 1;
            Ok(if child_frames < 3 { Step::next() } else { Step::Done })
        }));
        scheduler.borrow_mut().start(
            routine::from_fn(move |_cx| {
                parent_frames.borrow_mut().push(frame.get());
                Ok(match child.take() {
                    Some(child) => Yield::nested(child).into(),
                    None => Step::Done,
                })
            }),
            Phase::EarlyUpdate,
        );
    }

    for n in 1..=4 {
        frame.set(n);
        driver.run_frame();
    }
    assert_eq!(*parent_frames.borrow(), vec![0, 3]);
}

#[test]
fn test_listener_priority_with_other_systems() {
    struct Physics {
        steps: Rc<Cell<u32>>,
    }

    impl PhaseListener for Physics {
        fn on_phase(
            &mut self,
            phase: Phase,
        ) {
            if phase == Phase::PhysicsUpdate {
                self.steps.set(self.steps.get() + 1);
            }
        }
    }

    let clock = ManualClock::new();
    let scheduler = Rc::new(RefCell::new(Scheduler::new(clock)));
    let steps = Rc::new(Cell::new(0));
    let observed = Rc::new(RefCell::new(Vec::new()));
    let mut driver = FrameDriver::new();
    driver.subscribe(10, scheduler.clone());
    driver.subscribe(
        -10,
        Rc::new(RefCell::new(Physics {
            steps: steps.clone(),
        })),
    );
    {
        let steps = steps.clone();
        let observed = observed.clone();
        scheduler.borrow_mut().start(
            routine::from_fn(move |_cx| {
                observed.borrow_mut().push(steps.get());
                Ok(Step::next())
            }),
            Phase::PhysicsUpdate,
        );
    }

    driver.run_frame();
    driver.run_frame();
    assert_eq!(*observed.borrow(), vec![0, 1, 2]);
}

#[test]
fn test_deferred_stop_after_frame() {
    let (mut driver, scheduler, _clock) = driven();
    let resumes = Rc::new(Cell::new(0));
    let id: TaskId = {
        let resumes = resumes.clone();
        scheduler.borrow_mut().start(
            routine::from_fn(move |_cx| {
                resumes.set(resumes.get() + 1);
                Ok(Step::next())
            }),
            Phase::EarlyUpdate,
        )
    };
    {
        let scheduler = scheduler.clone();
        driver.defer(move || {
            scheduler.borrow_mut().stop(id);
        });
    }

    driver.run_frame();
    driver.run_frame();
    assert_eq!(resumes.get(), 2);
    assert!(!scheduler.borrow().is_running(id));
}
