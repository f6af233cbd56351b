use crate::sim::{Event, SimTime, Simulator, World};
use std::any::Any;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct DummyWorld {
    ticks: usize,
}

impl World for DummyWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_tick(&mut self, _sim: &mut Simulator) {
        self.ticks = self.ticks.saturating_add(1);
    }
}

struct Push {
    id: u32,
    log: Arc<Mutex<Vec<u32>>>,
}

impl Event for Push {
    fn execute(self: Box<Self>, _sim: &mut Simulator, _world: &mut dyn World) {
        let Push { id, log } = *self;
        log.lock().expect("log lock").push(id);
    }
}

/// 每秒触发一次并重新布置自己，没有结束条件
struct Repeat {
    log: Arc<Mutex<Vec<u32>>>,
}

impl Event for Repeat {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        let secs = (sim.now().0 / 1_000_000_000) as u32;
        self.log.lock().expect("log lock").push(secs);
        sim.schedule_in(SimTime::from_secs(1), Repeat { log: self.log });
    }
}

struct Halt;

impl Event for Halt {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        sim.halt();
    }
}

fn push(id: u32, log: &Arc<Mutex<Vec<u32>>>) -> Push {
    Push {
        id,
        log: Arc::clone(log),
    }
}

#[test]
fn scheduled_events_order_by_time_then_seq() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(SimTime(10), push(1, &log));
    sim.schedule(SimTime(5), push(2, &log));
    sim.schedule(SimTime(10), push(3, &log));

    let mut world = DummyWorld::default();
    sim.run(&mut world);

    assert_eq!(&*log.lock().expect("log lock"), &[2, 1, 3]);
    assert_eq!(world.ticks, 3);
    assert_eq!(sim.now(), SimTime(10));
}

#[test]
fn run_until_executes_events_scheduled_exactly_at_until() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(SimTime(5), push(1, &log));
    sim.schedule(SimTime(6), push(2, &log));

    let mut world = DummyWorld::default();
    sim.run_until(SimTime(5), &mut world);

    assert_eq!(&*log.lock().expect("log lock"), &[1]);
    assert_eq!(sim.now(), SimTime(5));
}

#[test]
fn run_until_advances_time_even_if_there_are_no_events() {
    let mut sim = Simulator::default();
    let mut world = DummyWorld::default();

    sim.run_until(SimTime(7), &mut world);
    assert_eq!(sim.now(), SimTime(7));
    assert_eq!(world.ticks, 0);
}

#[test]
fn stop_at_bounds_a_self_rescheduling_event() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(SimTime::from_secs(1), Repeat { log: Arc::clone(&log) });
    sim.stop_at(SimTime::from_secs(3));

    let mut world = DummyWorld::default();
    sim.run(&mut world);

    assert_eq!(&*log.lock().expect("log lock"), &[1, 2, 3]);
    assert_eq!(sim.now(), SimTime::from_secs(3));
    // 第 4 秒的触发仍挂在队列里
    assert_eq!(sim.pending(), 1);
}

#[test]
fn cancelled_event_never_runs() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(SimTime(1), push(1, &log));
    let id = sim.schedule(SimTime(2), push(2, &log));
    sim.schedule(SimTime(3), push(3, &log));

    assert!(sim.cancel(id));
    assert!(!sim.cancel(id), "second cancel is a no-op");
    assert_eq!(sim.pending(), 2);

    let mut world = DummyWorld::default();
    sim.run(&mut world);

    assert_eq!(&*log.lock().expect("log lock"), &[1, 3]);
    assert_eq!(world.ticks, 2);
}

#[test]
fn cancel_of_executed_event_returns_false() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    let id = sim.schedule(SimTime(1), push(1, &log));
    let mut world = DummyWorld::default();
    sim.run(&mut world);

    assert!(!sim.cancel(id));
}

#[test]
fn halt_stops_after_current_event() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(SimTime(1), push(1, &log));
    sim.schedule(SimTime(2), Halt);
    sim.schedule(SimTime(3), push(3, &log));

    let mut world = DummyWorld::default();
    sim.run(&mut world);

    assert!(sim.is_halted());
    assert_eq!(&*log.lock().expect("log lock"), &[1]);
    assert_eq!(sim.now(), SimTime(2));
}

#[test]
fn destroy_discards_pending_events() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(SimTime(1), push(1, &log));
    sim.schedule(SimTime(2), push(2, &log));
    sim.destroy();
    assert_eq!(sim.pending(), 0);

    let mut world = DummyWorld::default();
    sim.run(&mut world);
    assert!(log.lock().expect("log lock").is_empty());
}
