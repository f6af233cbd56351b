//! 移动轨迹追踪
//!
//! 每秒记录一次所有节点的位置（存内存），实验结束时写成 JSON 文件，供离线分析或回放。

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::world::ManetWorld;
use crate::error::{ExperimentError, Result};
use crate::net::{NodeId, Position};
use crate::sim::{Event, EventId, SimTime, Simulator, World};

/// 某一时刻某节点的位置
#[derive(Debug, Clone, Serialize)]
pub struct MobilitySample {
    /// 仿真时间（纳秒，和 `SimTime.0` 同口径）
    pub t_ns: u64,
    pub node: NodeId,
    #[serde(flatten)]
    pub pos: Position,
}

#[derive(Debug)]
pub struct MobilityTrace {
    interval: SimTime,
    samples: Vec<MobilitySample>,
    pending: Option<EventId>,
}

impl MobilityTrace {
    pub fn new(interval: SimTime) -> Self {
        Self {
            interval,
            samples: Vec::new(),
            pending: None,
        }
    }

    /// 立即记录一次，并开始周期采样
    pub fn arm(&mut self, sim: &mut Simulator) {
        self.pending = Some(sim.schedule(sim.now(), SampleMobility));
    }

    pub fn disarm(&mut self, sim: &mut Simulator) {
        if let Some(id) = self.pending.take() {
            sim.cancel(id);
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let io = |e| ExperimentError::io(path, e);
        let mut out = BufWriter::new(File::create(path).map_err(io)?);
        serde_json::to_writer(&mut out, &self.samples).map_err(|source| ExperimentError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        out.flush().map_err(io)?;
        info!(path = %path.display(), samples = self.samples.len(), "写出移动轨迹");
        Ok(())
    }
}

/// 事件：记录一次所有节点的位置
#[derive(Debug)]
pub struct SampleMobility;

impl Event for SampleMobility {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = ManetWorld::downcast(world);
        let now = sim.now();
        let positions = w.net.positions(now);
        let Some(trace) = w.mobility_trace.as_mut() else {
            return;
        };
        trace
            .samples
            .extend(positions.into_iter().enumerate().map(|(i, pos)| MobilitySample {
                t_ns: now.0,
                node: NodeId(i),
                pos,
            }));
        trace.pending = Some(sim.schedule_in(trace.interval, SampleMobility));
    }
}
