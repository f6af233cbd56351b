use std::fs;
use std::path::Path;

use super::unique_temp_dir;
use crate::error::ExperimentError;
use crate::experiment::ManetWorld;
use crate::measure::{CSV_HEADER, ReceiveEvent, ResultsWriter, SampleLabels, ThroughputSampler};
use crate::net::{Network, NodeId};
use crate::sim::{Event, SimTime, Simulator, World};

/// 测试用：直接往累加器里送一个接收通知
struct Inject {
    size_bytes: u32,
}

impl Event for Inject {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = ManetWorld::downcast(world);
        w.accumulator.on_receive(&ReceiveEvent {
            node: NodeId(0),
            source: None,
            size_bytes: self.size_bytes,
            arrival: sim.now(),
        });
    }
}

fn world_writing_to(path: &Path, sink_count: usize) -> ManetWorld {
    let sampler = ThroughputSampler::new(
        SimTime::from_secs(1),
        SampleLabels {
            sink_count,
            protocol_label: "AODV".to_string(),
            tx_power_dbm: 7.5,
        },
    );
    let mut world = ManetWorld::new(Network::default(), sampler, ResultsWriter::new(path));
    world.echo_receptions = false;
    world
}

fn data_lines(path: &Path) -> Vec<String> {
    let raw = fs::read_to_string(path).expect("read csv");
    let mut lines = raw.lines().map(str::to_string);
    assert_eq!(lines.next().as_deref(), Some(CSV_HEADER));
    lines.collect()
}

#[test]
fn each_row_reports_only_its_own_interval() {
    let dir = unique_temp_dir("sampler-window");
    let path = dir.join("out.csv");
    let mut world = world_writing_to(&path, 2);
    let mut sim = Simulator::default();

    sim.schedule(SimTime::from_millis(500), Inject { size_bytes: 512 });
    sim.schedule(SimTime::from_millis(1_500), Inject { size_bytes: 512 });
    world.results.write_header().expect("header");
    world.sampler.arm(&mut sim);

    sim.stop_at(SimTime::from_secs(3));
    sim.run(&mut world);
    assert!(world.sampler.disarm(&mut sim));

    assert_eq!(
        data_lines(&path),
        [
            "1,4.096,1,2,AODV,7.5",
            "2,4.096,1,2,AODV,7.5",
            "3,0,0,2,AODV,7.5",
        ]
    );
    assert!(world.take_failure().is_none());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn timestamps_form_an_arithmetic_sequence_until_the_end() {
    let dir = unique_temp_dir("sampler-sequence");
    let path = dir.join("out.csv");
    let mut world = world_writing_to(&path, 0);
    let mut sim = Simulator::default();

    world.results.write_header().expect("header");
    world.sampler.arm(&mut sim);
    sim.stop_at(SimTime::from_secs(10));
    sim.run(&mut world);

    let stamps: Vec<f64> = data_lines(&path)
        .iter()
        .map(|l| l.split(',').next().expect("timestamp").parse().expect("f64"))
        .collect();
    let expected: Vec<f64> = (1..=10).map(f64::from).collect();
    assert_eq!(stamps, expected);
    assert!(data_lines(&path).iter().all(|l| l.ends_with(",0,0,0,AODV,7.5")));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn run_shorter_than_one_interval_writes_no_rows() {
    let dir = unique_temp_dir("sampler-short");
    let path = dir.join("out.csv");
    let mut world = world_writing_to(&path, 1);
    let mut sim = Simulator::default();

    world.results.write_header().expect("header");
    world.sampler.arm(&mut sim);
    sim.stop_at(SimTime::from_millis(999));
    sim.run(&mut world);

    assert!(data_lines(&path).is_empty());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn disarmed_sampler_stays_silent() {
    let dir = unique_temp_dir("sampler-disarm");
    let path = dir.join("out.csv");
    let mut world = world_writing_to(&path, 1);
    let mut sim = Simulator::default();

    world.results.write_header().expect("header");
    world.sampler.arm(&mut sim);
    sim.run_until(SimTime::from_secs(2), &mut world);
    assert!(world.sampler.is_armed());
    assert!(world.sampler.disarm(&mut sim));
    assert!(!world.sampler.is_armed());

    // 继续推进很久也不会再有新行
    sim.run_until(SimTime::from_secs(50), &mut world);
    assert_eq!(data_lines(&path).len(), 2);
    assert!(!world.sampler.disarm(&mut sim));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn write_failure_halts_the_run() {
    let dir = unique_temp_dir("sampler-fail");
    // 没有写表头，文件不存在，追加必然失败
    let path = dir.join("missing").join("out.csv");
    let mut world = world_writing_to(&path, 1);
    let mut sim = Simulator::default();

    world.sampler.arm(&mut sim);
    sim.stop_at(SimTime::from_secs(5));
    sim.run(&mut world);

    assert!(sim.is_halted());
    assert_eq!(sim.now(), SimTime::from_secs(1));
    assert!(!world.sampler.is_armed());
    assert!(matches!(world.take_failure(), Some(ExperimentError::Io { .. })));

    let _ = fs::remove_dir_all(&dir);
}
