//! 无线自组网
//!
//! 持有节点（地址 + 移动模型）、信道与所选协议的路由代理，负责数据包的逐跳转发。

use std::net::{Ipv4Addr, SocketAddrV4};

use tracing::{debug, trace};

use super::channel::Channel;
use super::deliver_packet::DeliverPacket;
use super::id::{FlowId, NodeId};
use super::mobility::{Mobility, Position};
use super::packet::Packet;
use super::routing::{RoutingAgent, RoutingProtocol, Topology};
use super::stats::Stats;
use crate::sim::{SimTime, Simulator};

/// 节点地址从 10.1.1.1 起按节点编号顺序分配
const ADDRESS_BASE: Ipv4Addr = Ipv4Addr::new(10, 1, 1, 0);

/// 网络节点
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub addr: Ipv4Addr,
    pub mobility: Mobility,
}

/// 自组网
pub struct Network {
    nodes: Vec<Node>,
    channel: Channel,
    agent: Box<dyn RoutingAgent>,
    /// 最近一次计算的拓扑及其时刻
    topo: Topology,
    topo_at: Option<SimTime>,
    next_pkt_id: u64,
    pub stats: Stats,
}

impl Default for Network {
    fn default() -> Self {
        Self::new(Channel::default(), RoutingProtocol::Aodv)
    }
}

impl Network {
    pub fn new(channel: Channel, protocol: RoutingProtocol) -> Self {
        Self {
            nodes: Vec::new(),
            channel,
            agent: protocol.agent(),
            topo: Topology::default(),
            topo_at: None,
            next_pkt_id: 0,
            stats: Stats::default(),
        }
    }

    pub fn protocol(&self) -> RoutingProtocol {
        self.agent.protocol()
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// 添加节点并分配地址
    pub fn add_node(&mut self, mobility: Mobility) -> NodeId {
        let id = NodeId(self.nodes.len());
        let addr = Ipv4Addr::from(u32::from(ADDRESS_BASE).wrapping_add(id.0 as u32 + 1));
        self.nodes.push(Node { id, addr, mobility });
        self.topo_at = None;
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_addr(&self, id: NodeId) -> Ipv4Addr {
        self.nodes[id.0].addr
    }

    /// 按地址反查节点
    pub fn node_by_addr(&self, addr: Ipv4Addr) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.addr == addr).map(|n| n.id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, Ipv4Addr)> + '_ {
        self.nodes.iter().map(|n| (n.id, n.addr))
    }

    /// 所有节点在 `now` 时刻的位置
    pub fn positions(&mut self, now: SimTime) -> Vec<Position> {
        self.nodes
            .iter_mut()
            .map(|n| n.mobility.position_at(now))
            .collect()
    }

    /// `now` 时刻的一跳连通图
    pub fn topology(&mut self, now: SimTime) -> &Topology {
        self.refresh_topology(now);
        &self.topo
    }

    fn refresh_topology(&mut self, now: SimTime) {
        if self.topo_at == Some(now) {
            return;
        }
        let pos = self.positions(now);
        let mut adj = vec![Vec::new(); pos.len()];
        for a in 0..pos.len() {
            for b in (a + 1)..pos.len() {
                if self.channel.in_range(pos[a].distance(&pos[b])) {
                    adj[a].push(NodeId(b));
                    adj[b].push(NodeId(a));
                }
            }
        }
        self.topo = Topology::new(adj);
        self.topo_at = Some(now);
        trace!(now = ?now, "重新计算拓扑");
    }

    /// 从 `src` 节点发出一个数据包；没有路由时丢弃并返回 false
    #[tracing::instrument(skip(self, sim), fields(flow = flow_id.0))]
    pub fn send(
        &mut self,
        flow_id: FlowId,
        src: NodeId,
        from: SocketAddrV4,
        to: SocketAddrV4,
        size_bytes: u32,
        sim: &mut Simulator,
    ) -> bool {
        let now = sim.now();
        self.stats.sent_pkts += 1;

        let Some(dst) = self.node_by_addr(*to.ip()) else {
            debug!(to = %to, "目的地址不属于任何节点");
            self.stats.no_route_drops += 1;
            return false;
        };
        self.refresh_topology(now);
        let Some(route) = self.agent.route(src, dst, now, &self.topo) else {
            debug!(src = ?src, dst = ?dst, "无可用路由，丢弃");
            self.stats.no_route_drops += 1;
            return false;
        };

        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        let pkt = Packet {
            id,
            flow_id,
            size_bytes,
            from: Some(from),
            to,
            route: route.path,
            hop: 0,
        };
        // 先在源节点"到达"一次，路由发现时延在这里体现
        sim.schedule_in(route.setup_delay, DeliverPacket { to: src, pkt });
        true
    }

    /// 数据包到达 `to`：到达目的地则返回它，否则继续转发
    #[tracing::instrument(skip(self, pkt, sim), fields(pkt_id = pkt.id, to = ?to))]
    pub fn deliver(&mut self, to: NodeId, pkt: Packet, sim: &mut Simulator) -> Option<Packet> {
        if to == pkt.dst() {
            self.stats.delivered_pkts += 1;
            self.stats.delivered_bytes += pkt.size_bytes as u64;
            trace!(delivered_pkts = self.stats.delivered_pkts, "数据包送达目的地");
            return Some(pkt);
        }
        self.forward_from(to, pkt, sim);
        None
    }

    /// 从 `from` 向路径上的下一跳发送
    fn forward_from(&mut self, from: NodeId, pkt: Packet, sim: &mut Simulator) {
        let Some(next) = pkt.next() else {
            return;
        };
        let now = sim.now();
        self.refresh_topology(now);
        if !self.topo.has_link(from, next) {
            debug!(from = ?from, next = ?next, pkt_id = pkt.id, "下一跳不可达，丢弃");
            self.stats.link_break_drops += 1;
            self.agent.link_broken(from, next);
            return;
        }
        let a = self.nodes[from.0].mobility.position_at(now);
        let b = self.nodes[next.0].mobility.position_at(now);
        let arrive = now.saturating_add(self.channel.hop_delay(pkt.size_bytes, a.distance(&b)));
        trace!(next = ?next, arrive = ?arrive, "调度下一跳到达");
        sim.schedule(arrive, DeliverPacket { to: next, pkt: pkt.advance() });
    }
}
