//! 发送端（恒定速率 on/off 应用）
//!
//! on 时间恒为 1、off 时间恒为 0，即启动后一直处于 on 状态：
//! 每隔 `packet_size * 8 / data_rate` 秒发送一个固定大小的数据包，首包在启动后一个间隔发出。

use std::net::SocketAddrV4;

use tracing::{debug, trace};

use crate::experiment::ManetWorld;
use crate::net::{FlowId, NodeId};
use crate::sim::{Event, EventId, SimTime, Simulator, World};

#[derive(Debug)]
pub struct OnOffApp {
    pub flow: FlowId,
    pub node: NodeId,
    pub local: SocketAddrV4,
    pub remote: SocketAddrV4,
    pub packet_size: u32,
    pub interval: SimTime,
    running: bool,
    pending: Option<EventId>,
    sent: u64,
}

impl OnOffApp {
    pub fn new(
        flow: FlowId,
        node: NodeId,
        local: SocketAddrV4,
        remote: SocketAddrV4,
        packet_size: u32,
        data_rate_bps: u64,
    ) -> Self {
        Self {
            flow,
            node,
            local,
            remote,
            packet_size,
            interval: Self::send_interval(packet_size, data_rate_bps).max(SimTime(1)),
            running: false,
            pending: None,
            sent: 0,
        }
    }

    /// 两次发送之间的间隔 `packet_size * 8 / data_rate`；可能舍入为 0，由配置校验拒绝
    pub fn send_interval(packet_size: u32, data_rate_bps: u64) -> SimTime {
        let bits = packet_size as f64 * 8.0;
        SimTime::from_secs_f64(bits / data_rate_bps.max(1) as f64)
    }
}

/// 事件：source 启动
#[derive(Debug)]
pub struct SourceStart {
    pub flow: FlowId,
}

impl Event for SourceStart {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = ManetWorld::downcast(world);
        let app = &mut w.sources[self.flow.0];
        debug!(flow = self.flow.0, node = ?app.node, now = ?sim.now(), "source 启动");
        app.running = true;
        app.pending = Some(sim.schedule_in(app.interval, SendPacket { flow: self.flow }));
    }
}

/// 事件：source 停止
#[derive(Debug)]
pub struct SourceStop {
    pub flow: FlowId,
}

impl Event for SourceStop {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = ManetWorld::downcast(world);
        let app = &mut w.sources[self.flow.0];
        debug!(flow = self.flow.0, sent = app.sent, now = ?sim.now(), "source 停止");
        app.running = false;
        if let Some(id) = app.pending.take() {
            sim.cancel(id);
        }
    }
}

/// 事件：发送一个数据包并布置下一次发送
#[derive(Debug)]
pub struct SendPacket {
    pub flow: FlowId,
}

impl Event for SendPacket {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = ManetWorld::downcast(world);
        let app = &mut w.sources[self.flow.0];
        app.pending = None;
        if !app.running {
            return;
        }
        let (node, local, remote, size) = (app.node, app.local, app.remote, app.packet_size);
        app.sent += 1;
        app.pending = Some(sim.schedule_in(app.interval, SendPacket { flow: self.flow }));

        let routed = w.net.send(self.flow, node, local, remote, size, sim);
        trace!(flow = self.flow.0, routed, "发送数据包");
    }
}
