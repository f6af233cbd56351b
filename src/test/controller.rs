use std::fs;
use std::path::{Path, PathBuf};

use super::unique_temp_dir;
use crate::error::{ConfigError, ExperimentError};
use crate::experiment::{ExperimentConfig, ExperimentController};
use crate::measure::CSV_HEADER;
use crate::net::RoutingProtocol;

fn config_in(dir: &Path) -> ExperimentConfig {
    ExperimentConfig {
        csv_file_name: dir.join("out.csv"),
        trace_dir: dir.to_path_buf(),
        trace_mobility: false,
        ..ExperimentConfig::default()
    }
}

fn run(cfg: ExperimentConfig) -> crate::error::Result<crate::experiment::RunSummary> {
    ExperimentController::new(cfg).with_echo_receptions(false).run()
}

fn csv_rows(path: &PathBuf) -> Vec<Vec<String>> {
    let raw = fs::read_to_string(path).expect("read csv");
    let mut lines = raw.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));
    lines
        .map(|l| l.split(',').map(str::to_string).collect())
        .collect()
}

#[test]
fn zero_sinks_still_samples_zeros() {
    let dir = unique_temp_dir("ctl-zero-sinks");
    let cfg = ExperimentConfig {
        sink_count: 0,
        total_duration_secs: 3.0,
        ..config_in(&dir)
    };
    let csv = cfg.csv_file_name.clone();

    let summary = run(cfg).expect("run");
    assert_eq!(summary.flows, 0);
    assert_eq!(summary.rows_written, 3);

    let rows = csv_rows(&csv);
    assert_eq!(rows.len(), 3);
    for (i, r) in rows.iter().enumerate() {
        assert_eq!(r[0], (i + 1).to_string());
        assert_eq!(&r[1..], ["0", "0", "0", "AODV", "7.5"]);
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn default_scenario_reports_every_delivered_packet() {
    let dir = unique_temp_dir("ctl-default");
    let cfg = ExperimentConfig {
        trace_mobility: true,
        ..config_in(&dir)
    };
    let csv = cfg.csv_file_name.clone();
    let trace = dir.join(format!("{}.mob.json", cfg.trace_name()));

    let summary = run(cfg).expect("run");
    assert_eq!(summary.protocol, "AODV");
    assert_eq!(summary.flows, 15);
    assert_eq!(summary.rows_written, 103);
    // 每个 source 在 [102, 103) 秒内恰好发出一个包
    assert_eq!(summary.net.sent_pkts, 15);
    assert!(summary.net.delivered_pkts <= summary.net.sent_pkts);

    let rows = csv_rows(&csv);
    assert_eq!(rows.len(), 103);
    let packets: u64 = rows.iter().map(|r| r[2].parse::<u64>().expect("packets")).sum();
    let kbits: f64 = rows.iter().map(|r| r[1].parse::<f64>().expect("rate")).sum();
    assert_eq!(packets, summary.net.delivered_pkts);
    assert!((kbits - packets as f64 * 512.0 * 8.0 / 1000.0).abs() < 1e-9);
    assert!(rows.iter().all(|r| r[3] == "15" && r[4] == "AODV" && r[5] == "7.5"));
    // 启动前没有流量
    assert!(rows[..100].iter().all(|r| r[2] == "0"));

    let raw = fs::read_to_string(&trace).expect("read mobility trace");
    let samples: serde_json::Value = serde_json::from_str(&raw).expect("parse trace");
    assert_eq!(samples.as_array().map(Vec::len), Some(30 * 104));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn every_protocol_runs_and_labels_its_rows() {
    for p in RoutingProtocol::ALL {
        let dir = unique_temp_dir("ctl-protocols");
        let cfg = ExperimentConfig {
            protocol: p,
            sink_count: 3,
            total_duration_secs: 102.0,
            ..config_in(&dir)
        };
        let csv = cfg.csv_file_name.clone();

        let summary = run(cfg).expect("run");
        assert_eq!(summary.protocol, p.label());
        let rows = csv_rows(&csv);
        assert_eq!(rows.len(), 102);
        assert!(rows.iter().all(|r| r[4] == p.label()));

        let _ = fs::remove_dir_all(&dir);
    }
}

#[test]
fn same_seed_gives_identical_results() {
    let a_dir = unique_temp_dir("ctl-seed-a");
    let b_dir = unique_temp_dir("ctl-seed-b");
    let a = run(ExperimentConfig {
        tx_power_dbm: 0.0,
        ..config_in(&a_dir)
    })
    .expect("run a");
    let b = run(ExperimentConfig {
        tx_power_dbm: 0.0,
        ..config_in(&b_dir)
    })
    .expect("run b");

    assert_eq!(a, b);
    assert_eq!(
        fs::read_to_string(a_dir.join("out.csv")).expect("a"),
        fs::read_to_string(b_dir.join("out.csv")).expect("b")
    );

    let _ = fs::remove_dir_all(&a_dir);
    let _ = fs::remove_dir_all(&b_dir);
}

#[test]
fn too_many_sinks_fails_before_the_csv_exists() {
    let dir = unique_temp_dir("ctl-too-many");
    let cfg = ExperimentConfig {
        sink_count: 16,
        ..config_in(&dir)
    };
    let csv = cfg.csv_file_name.clone();

    let err = run(cfg).expect_err("16 pairs need 32 nodes");
    assert!(matches!(
        err,
        ExperimentError::Config(ConfigError::TooManySinks { .. })
    ));
    assert!(!csv.exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_output_directory_is_a_config_error() {
    let dir = unique_temp_dir("ctl-bad-path");
    let cfg = ExperimentConfig {
        csv_file_name: dir.join("nope").join("out.csv"),
        ..config_in(&dir)
    };

    let err = run(cfg).expect_err("parent missing");
    assert!(matches!(
        err,
        ExperimentError::Config(ConfigError::OutputPath { .. })
    ));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn non_positive_durations_are_rejected() {
    let dir = unique_temp_dir("ctl-durations");
    for (total, interval) in [(0.0, 1.0), (-5.0, 1.0), (10.0, 0.0), (f64::NAN, 1.0)] {
        let cfg = ExperimentConfig {
            sink_count: 0,
            total_duration_secs: total,
            sample_interval_secs: interval,
            ..config_in(&dir)
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositive { .. })
        ));
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn zero_send_interval_is_rejected_before_scheduling() {
    let dir = unique_temp_dir("ctl-send-interval");
    for (packet_size_bytes, data_rate_bps) in [(0, 2048), (512, u64::MAX)] {
        let cfg = ExperimentConfig {
            packet_size_bytes,
            data_rate_bps,
            sink_count: 1,
            total_duration_secs: 101.5,
            ..config_in(&dir)
        };
        let csv = cfg.csv_file_name.clone();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositive { .. })
        ));
        // 校验失败时 run 立即返回，不会进入零间隔的发送循环
        let err = run(cfg).expect_err("zero send interval");
        assert!(matches!(
            err,
            ExperimentError::Config(ConfigError::NonPositive { .. })
        ));
        assert!(!csv.exists());
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn scenario_file_fills_missing_fields_with_defaults() {
    let dir = unique_temp_dir("ctl-scenario");
    let path = dir.join("scenario.json");
    fs::write(&path, r#"{ "protocol": 4, "sink_count": 5, "seed": 42 }"#).expect("write");

    let cfg = ExperimentConfig::from_json_file(&path).expect("load");
    assert_eq!(cfg.protocol, RoutingProtocol::Dsr);
    assert_eq!(cfg.sink_count, 5);
    assert_eq!(cfg.seed, 42);
    assert_eq!(cfg.total_duration_secs, 103.0);
    assert_eq!(
        cfg.trace_name(),
        "manet-routing-compare_DSR_15nodes_20speed_0pause_2048bpsrate"
    );

    fs::write(&path, r#"{ "protocol": "olsr" }"#).expect("write");
    let cfg = ExperimentConfig::from_json_file(&path).expect("load by name");
    assert_eq!(cfg.protocol, RoutingProtocol::Olsr);

    fs::write(&path, r#"{ "sink_count": "many" }"#).expect("write");
    assert!(matches!(
        ExperimentConfig::from_json_file(&path),
        Err(ExperimentError::Json { .. })
    ));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unknown_protocol_in_scenario_file_is_a_config_error() {
    let dir = unique_temp_dir("ctl-scenario-protocol");
    let path = dir.join("scenario.json");
    for (raw, selector) in [
        (r#"{ "protocol": 7 }"#, "7"),
        (r#"{ "protocol": 0 }"#, "0"),
        (r#"{ "protocol": "batman" }"#, "batman"),
        (r#"{ "protocol": -1 }"#, "-1"),
    ] {
        fs::write(&path, raw).expect("write");
        match ExperimentConfig::from_json_file(&path) {
            Err(ExperimentError::Config(ConfigError::UnknownProtocol(s))) => assert_eq!(s, selector),
            other => panic!("{raw}: expected UnknownProtocol, got {other:?}"),
        }
    }

    let _ = fs::remove_dir_all(&dir);
}
