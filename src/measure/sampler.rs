//! 吞吐量采样器
//!
//! 一个重复定时器：每个区间触发一次，取走累加器中的计数，换算成 kbps，
//! 追加一行结果，然后在 `now + interval` 重新布置自己。
//! 采样器本身不检查结束条件；由实验控制器在总时长到达后 `disarm`，取消挂起的下一次触发。

use tracing::{debug, error};

use super::accumulator::ReceiveAccumulator;
use super::results::SampleRow;
use crate::experiment::ManetWorld;
use crate::sim::{Event, EventId, SimTime, Simulator, World};

/// 每行结果中的静态字段
#[derive(Debug, Clone, PartialEq)]
pub struct SampleLabels {
    pub sink_count: usize,
    pub protocol_label: String,
    pub tx_power_dbm: f64,
}

/// 采样器状态：`pending` 为 Some 表示已布置（Armed）
#[derive(Debug)]
pub struct ThroughputSampler {
    interval: SimTime,
    labels: SampleLabels,
    pending: Option<EventId>,
}

impl ThroughputSampler {
    pub fn new(interval: SimTime, labels: SampleLabels) -> Self {
        Self {
            interval,
            labels,
            pending: None,
        }
    }

    pub fn interval(&self) -> SimTime {
        self.interval
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// 在 `now + interval` 布置下一次触发
    pub fn arm(&mut self, sim: &mut Simulator) {
        self.pending = Some(sim.schedule_in(self.interval, CheckThroughput));
    }

    /// 取消挂起的触发；返回此前是否处于布置状态
    pub fn disarm(&mut self, sim: &mut Simulator) -> bool {
        match self.pending.take() {
            Some(id) => {
                sim.cancel(id);
                debug!("采样器已停止");
                true
            }
            None => false,
        }
    }

    /// 取走累加器计数并生成本区间的结果行
    pub fn sample(&self, now: SimTime, acc: &mut ReceiveAccumulator) -> SampleRow {
        let (bytes, packets) = acc.drain_and_reset();
        SampleRow {
            timestamp: now,
            rate_kbps: bytes as f64 * 8.0 / 1000.0,
            packets_received: packets,
            sink_count: self.labels.sink_count,
            protocol_label: self.labels.protocol_label.clone(),
            tx_power_dbm: self.labels.tx_power_dbm,
        }
    }
}

/// 事件：一次采样触发
#[derive(Debug)]
pub struct CheckThroughput;

impl Event for CheckThroughput {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = ManetWorld::downcast(world);
        w.sampler.pending = None;

        let row = w.sampler.sample(sim.now(), &mut w.accumulator);
        debug!(
            t = %row.timestamp,
            rate_kbps = row.rate_kbps,
            packets = row.packets_received,
            "采样"
        );
        if let Err(e) = w.results.append_row(&row) {
            error!(error = %e, "写入结果失败，终止实验");
            w.fail(sim, e);
            return;
        }
        w.sampler.arm(sim);
    }
}
