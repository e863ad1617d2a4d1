//! Tasks owned by host objects

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tickflow::{
    routine, Component, FrameDriver, HostLink, LinkKind, ManualClock, Phase, Scheduler, Step,
    TaskOptions, Yield,
};

struct Enemy {
    alive: bool,
    blinks: Rc<Cell<u32>>,
}

impl Component for Enemy {
    fn is_active(&self) -> bool {
        self.alive
    }
}

fn blink(blinks: Rc<Cell<u32>>) -> impl tickflow::Routine + 'static {
    routine::from_fn(move |_cx| {
        blinks.set(blinks.get() + 1);
        Ok(Yield::seconds(0.5).into())
    })
}

#[test]
fn test_disabled_component_cancels_its_tasks() {
    let clock = ManualClock::new();
    let scheduler = Rc::new(RefCell::new(Scheduler::new(clock.clone())));
    let mut driver = FrameDriver::new();
    driver.subscribe(0, scheduler.clone());

    let blinks = Rc::new(Cell::new(0));
    let enemy = Rc::new(RefCell::new(Enemy {
        alive: true,
        blinks: blinks.clone(),
    }));
    let id = scheduler.borrow_mut().start_with(
        blink(enemy.borrow().blinks.clone()),
        TaskOptions::new()
            .linked_to(HostLink::component(&enemy))
            .tag("enemy"),
    );

    for _ in 0..4 {
        clock.advance(0.5);
        driver.run_frame();
    }
    assert_eq!(blinks.get(), 5);

    enemy.borrow_mut().alive = false;
    clock.advance(0.5);
    driver.run_frame();
    assert_eq!(blinks.get(), 5);
    assert!(!scheduler.borrow().is_running(id));
    assert_eq!(scheduler.borrow().count_tagged("enemy"), 0);
    assert_eq!(scheduler.borrow().stats().cancelled, 1);
}

#[test]
fn test_dropped_object_cancels_nested_work() {
    let clock = ManualClock::new();
    let mut scheduler = Scheduler::new(clock.clone());
    let owner = Rc::new(String::from("door"));
    let blinks = Rc::new(Cell::new(0));
    let mut child = Some(blink(blinks.clone()));
    let parent = scheduler.start_linked(
        routine::from_fn(move |_cx| {
            Ok(match child.take() {
                Some(child) => Yield::nested(child).into(),
                None => Step::Done,
            })
        }),
        Phase::LateUpdate,
        HostLink::object(&owner),
    );
    let child = scheduler.child_of(parent).expect("nested child");

    drop(owner);
    scheduler.tick(Phase::LateUpdate);
    assert!(!scheduler.is_running(parent));
    assert!(!scheduler.is_running(child));

    scheduler.tick(Phase::LateUpdate);
    assert_eq!(scheduler.live_records(), 0);
    assert_eq!(blinks.get(), 1);
}

#[test]
fn test_custom_check() {
    let mut scheduler = Scheduler::new(ManualClock::new());
    let open = Rc::new(Cell::new(true));
    let link = {
        let open = open.clone();
        HostLink::from_check(LinkKind::Object, move || Ok(open.get()))
    };
    assert_eq!(link.kind(), LinkKind::Object);
    let id = scheduler.start_linked(
        routine::from_fn(|_cx| Ok(Step::next())),
        Phase::EarlyUpdate,
        link,
    );

    scheduler.tick(Phase::EarlyUpdate);
    assert!(scheduler.is_running(id));
    open.set(false);
    scheduler.tick(Phase::EarlyUpdate);
    assert!(!scheduler.is_running(id));
}
