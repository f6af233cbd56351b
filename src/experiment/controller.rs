//! 实验控制器
//!
//! 按固定顺序编排一次实验：
//! 校验配置 → 搭建网络 → 规划并安装流量 → 写表头 → 布置采样器 →
//! 运行到总时长 → 停止采样器 → 写出追踪文件 → 清理调度器。

use tracing::{debug, info, warn};

use super::config::ExperimentConfig;
use super::trace::MobilityTrace;
use super::world::ManetWorld;
use crate::error::Result;
use crate::measure::{ResultsWriter, SampleLabels, ThroughputSampler};
use crate::net::{Channel, Mobility, Network, RandomWaypoint, Stats};
use crate::sim::{SimTime, Simulator, stream_rng};
use crate::traffic::{Endpoint, SourceParams, TrafficPlanner, install_flows};

/// 移动模型的随机数流编号从这里开始（每个节点一条）
const MOBILITY_STREAM_BASE: u64 = 16;

/// 一次实验的汇总
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub protocol: String,
    pub rows_written: u64,
    pub flows: usize,
    pub net: Stats,
    pub final_time: SimTime,
}

pub struct ExperimentController {
    config: ExperimentConfig,
    /// 是否把每次接收打印到标准输出
    echo_receptions: bool,
}

impl ExperimentController {
    pub fn new(config: ExperimentConfig) -> Self {
        Self {
            config,
            echo_receptions: true,
        }
    }

    pub fn with_echo_receptions(mut self, on: bool) -> Self {
        self.echo_receptions = on;
        self
    }

    /// 按配置搭建节点：先移动节点，后静止节点；地址按节点顺序分配
    pub fn build_network(config: &ExperimentConfig) -> Network {
        let mut net = Network::new(Channel::new(config.tx_power_dbm), config.protocol);
        let pause = SimTime::from_secs_f64(config.node_pause_secs);
        for i in 0..config.mobile_nodes {
            let rng = stream_rng(config.seed, MOBILITY_STREAM_BASE + i as u64);
            net.add_node(Mobility::RandomWaypoint(RandomWaypoint::new(
                config.area(),
                config.node_speed_mps,
                pause,
                rng,
            )));
        }
        let grid = config.grid();
        for i in 0..config.static_nodes {
            net.add_node(Mobility::Static(grid.position(i)));
        }
        net
    }

    #[tracing::instrument(skip(self), fields(protocol = %self.config.protocol))]
    pub fn run(&self) -> Result<RunSummary> {
        let cfg = &self.config;
        cfg.validate()?;

        let net = Self::build_network(cfg);
        info!(
            nodes = net.node_count(),
            range_m = net.channel().range_m(),
            "网络已搭建"
        );

        let labels = SampleLabels {
            sink_count: cfg.sink_count,
            protocol_label: cfg.protocol.label().to_string(),
            tx_power_dbm: cfg.tx_power_dbm,
        };
        let sampler = ThroughputSampler::new(cfg.sample_interval(), labels);
        let results = ResultsWriter::new(cfg.csv_file_name.clone());
        let mut world = ManetWorld::new(net, sampler, results);
        world.echo_receptions = self.echo_receptions;
        let mut sim = Simulator::default();

        let endpoints: Vec<Endpoint> = world
            .net
            .nodes()
            .map(|(node, addr)| Endpoint { node, addr })
            .collect();
        let flows = TrafficPlanner::new(cfg.seed).build_flows(&cfg.traffic_plan(), &endpoints)?;
        install_flows(
            &flows,
            SourceParams {
                packet_size: cfg.packet_size_bytes,
                data_rate_bps: cfg.data_rate_bps,
            },
            &mut sim,
            &mut world,
        )?;

        world.results.write_header()?;
        world.sampler.arm(&mut sim);
        if cfg.trace_mobility {
            let mut trace = MobilityTrace::new(SimTime::from_secs(1));
            trace.arm(&mut sim);
            world.mobility_trace = Some(trace);
        }

        let total = cfg.total_duration();
        info!(total = %total, flows = flows.len(), "开始运行实验");
        sim.stop_at(total);
        sim.run(&mut world);

        world.sampler.disarm(&mut sim);
        if let Some(trace) = world.mobility_trace.as_mut() {
            trace.disarm(&mut sim);
        }
        if let Some(err) = world.take_failure() {
            warn!(error = %err, "实验中止");
            sim.destroy();
            return Err(err);
        }

        if let Some(trace) = &world.mobility_trace {
            let path = cfg.trace_dir.join(format!("{}.mob.json", cfg.trace_name()));
            trace.write_json(&path)?;
        }
        debug!(pending = sim.pending(), "清理剩余事件");
        sim.destroy();

        let summary = RunSummary {
            protocol: cfg.protocol.label().to_string(),
            rows_written: world.results.rows_written(),
            flows: flows.len(),
            net: world.net.stats.clone(),
            final_time: sim.now(),
        };
        info!(
            rows = summary.rows_written,
            sent = summary.net.sent_pkts,
            delivered = summary.net.delivered_pkts,
            dropped = summary.net.dropped_pkts(),
            "✅ 实验完成"
        );
        Ok(summary)
    }
}
