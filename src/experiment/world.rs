//! 实验世界
//!
//! 所有事件共享的可变状态：网络、套接字、发送端应用、测量组件与辅助追踪。

use std::any::Any;

use tracing::trace;

use super::trace::MobilityTrace;
use crate::app::{OnOffApp, SocketTable};
use crate::error::ExperimentError;
use crate::measure::{ReceiveAccumulator, ReceiveEvent, ResultsWriter, ThroughputSampler};
use crate::net::{Network, NodeId, Packet};
use crate::sim::{SimTime, Simulator, World};

pub struct ManetWorld {
    pub net: Network,
    pub sockets: SocketTable,
    /// 按 `FlowId` 下标存放
    pub sources: Vec<OnOffApp>,
    pub accumulator: ReceiveAccumulator,
    pub sampler: ThroughputSampler,
    pub results: ResultsWriter,
    pub mobility_trace: Option<MobilityTrace>,
    /// 是否把每次接收打印到标准输出
    pub echo_receptions: bool,
    failure: Option<ExperimentError>,
}

impl ManetWorld {
    pub fn new(net: Network, sampler: ThroughputSampler, results: ResultsWriter) -> Self {
        Self {
            net,
            sockets: SocketTable::default(),
            sources: Vec::new(),
            accumulator: ReceiveAccumulator::default(),
            sampler,
            results,
            mobility_trace: None,
            echo_receptions: true,
            failure: None,
        }
    }

    /// 事件中把 `&mut dyn World` 还原成具体类型
    pub fn downcast(world: &mut dyn World) -> &mut ManetWorld {
        world
            .as_any_mut()
            .downcast_mut::<ManetWorld>()
            .expect("world must be ManetWorld")
    }

    /// 记录致命错误并立即停止仿真；只保留第一个错误
    pub fn fail(&mut self, sim: &mut Simulator, err: ExperimentError) {
        if self.failure.is_none() {
            self.failure = Some(err);
        }
        sim.halt();
    }

    pub fn take_failure(&mut self) -> Option<ExperimentError> {
        self.failure.take()
    }

    /// 数据包到达目的节点：交给监听中的 sink 套接字，转成一次接收通知
    pub fn on_packet_arrival(&mut self, node: NodeId, pkt: Packet, now: SimTime) {
        let listening = self
            .sockets
            .lookup(&pkt.to)
            .is_some_and(|s| s.node == node && s.listening);
        if !listening {
            trace!(to = %pkt.to, "没有监听中的套接字，丢弃");
            return;
        }
        let ev = ReceiveEvent {
            node,
            source: pkt.from,
            size_bytes: pkt.size_bytes,
            arrival: now,
        };
        if self.echo_receptions {
            println!("{}", ev.log_line());
        }
        self.accumulator.on_receive(&ev);
    }
}

impl World for ManetWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
