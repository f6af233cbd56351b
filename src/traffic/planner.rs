//! 流量规划
//!
//! 把前 `sink_count` 个节点作为 sink、紧随其后的 `sink_count` 个节点作为 source 配成对，
//! 为每一对抽取带抖动的启动时间：sink 在 `[0, 1)` 秒内启动，source 在 `[100, 101)` 秒内启动，
//! 两者都在实验结束时停止。

use std::net::{Ipv4Addr, SocketAddrV4};
use std::ops::Range;

use rand::Rng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::error::ConfigError;
use crate::net::{FlowId, NodeId};
use crate::sim::{SimTime, stream_rng};

/// sink 启动时间窗口
pub const SINK_START_WINDOW: Range<SimTime> = SimTime(0)..SimTime(1_000_000_000);
/// source 启动时间窗口
pub const SOURCE_START_WINDOW: Range<SimTime> = SimTime(100_000_000_000)..SimTime(101_000_000_000);

const SINK_START_STREAM: u64 = 0;
const SOURCE_START_STREAM: u64 = 1;

/// 可承担 sink/source 角色的节点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub node: NodeId,
    pub addr: Ipv4Addr,
}

/// 一条流的端点与时间安排；规划后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSpec {
    pub flow: FlowId,
    pub sink_node: NodeId,
    pub source_node: NodeId,
    pub sink_start: SimTime,
    pub sink_stop: SimTime,
    pub source_start: SimTime,
    pub source_stop: SimTime,
    /// sink 监听的地址（sink 节点地址 + 端口）
    pub destination: SocketAddrV4,
    pub port: u16,
}

/// 规划所需的实验参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficPlan {
    pub sink_count: usize,
    pub port: u16,
    pub stop: SimTime,
}

/// 流量规划器。sink 与 source 的启动时间来自两条独立的随机数流。
#[derive(Debug)]
pub struct TrafficPlanner {
    sink_starts: StdRng,
    source_starts: StdRng,
}

impl TrafficPlanner {
    pub fn new(seed: u64) -> Self {
        Self {
            sink_starts: stream_rng(seed, SINK_START_STREAM),
            source_starts: stream_rng(seed, SOURCE_START_STREAM),
        }
    }

    /// 生成 `plan.sink_count` 条流。
    ///
    /// 端点不够配对、或实验在 source 最晚启动时间之前结束，都是配置错误。
    pub fn build_flows(
        &mut self,
        plan: &TrafficPlan,
        endpoints: &[Endpoint],
    ) -> Result<Vec<FlowSpec>, ConfigError> {
        let needed = plan.sink_count.saturating_mul(2);
        if endpoints.len() < needed {
            return Err(ConfigError::TooManySinks {
                sinks: plan.sink_count,
                nodes: endpoints.len(),
                needed,
            });
        }
        if plan.sink_count > 0 && plan.stop < SOURCE_START_WINDOW.end {
            return Err(ConfigError::FlowWindow {
                total: plan.stop.as_secs_f64(),
                latest: SOURCE_START_WINDOW.end.as_secs_f64(),
            });
        }

        let mut flows = Vec::with_capacity(plan.sink_count);
        for i in 0..plan.sink_count {
            let sink = endpoints[i];
            let source = endpoints[i + plan.sink_count];
            let sink_start = draw(&mut self.sink_starts, &SINK_START_WINDOW);
            let source_start = draw(&mut self.source_starts, &SOURCE_START_WINDOW);
            let flow = FlowSpec {
                flow: FlowId(i),
                sink_node: sink.node,
                source_node: source.node,
                sink_start,
                sink_stop: plan.stop,
                source_start,
                source_stop: plan.stop,
                destination: SocketAddrV4::new(sink.addr, plan.port),
                port: plan.port,
            };
            debug!(
                flow = i,
                sink = ?flow.sink_node,
                source = ?flow.source_node,
                sink_start = %flow.sink_start,
                source_start = %flow.source_start,
                "规划流"
            );
            flows.push(flow);
        }
        Ok(flows)
    }
}

/// 在半开区间内均匀抽取（纳秒精度，保证严格小于上界）
fn draw(rng: &mut StdRng, window: &Range<SimTime>) -> SimTime {
    SimTime(rng.random_range(window.start.0..window.end.0))
}
