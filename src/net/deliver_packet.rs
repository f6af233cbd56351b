//! 数据包交付事件
//!
//! 定义网络模拟中的数据包交付事件。

use super::id::NodeId;
use super::packet::Packet;
use crate::experiment::ManetWorld;
use crate::sim::{Event, Simulator, World};
use tracing::trace;

/// 事件：把一个 packet 交给某个节点处理。
#[derive(Debug)]
pub struct DeliverPacket {
    pub to: NodeId,
    pub pkt: Packet,
}

impl Event for DeliverPacket {
    #[tracing::instrument(skip(self, sim, world), fields(pkt_id = self.pkt.id, flow_id = self.pkt.flow_id.0, to = ?self.to))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverPacket { to, pkt } = *self;
        trace!(hop = pkt.hop, now = ?sim.now(), "数据包到达节点");

        let w = ManetWorld::downcast(world);
        if let Some(pkt) = w.net.deliver(to, pkt, sim) {
            w.on_packet_arrival(to, pkt, sim.now());
        }
    }
}
