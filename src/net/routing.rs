//! 路由协议
//!
//! 路由协议本身不是测量对象：这里只为 OLSR/AODV/DSDV/DSR 各提供一个最小化的代理，
//! 让实验按所选协议给出路径。两类行为：
//! - 主动式（OLSR、DSDV）：周期性地基于当时的拓扑重建最短跳数路由表，两次重建之间表可能过期；
//! - 按需式（AODV、DSR）：首次发送时做路由发现（带一次往返的发现时延），之后使用缓存，
//!   转发时发现断链才作废缓存。

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::id::NodeId;
use crate::error::ConfigError;
use crate::sim::SimTime;

/// 路由发现时每跳的往返处理时延
const DISCOVERY_HOP_DELAY: SimTime = SimTime(5_000_000);

/// 某一时刻的一跳连通图（无线链路对称）
#[derive(Debug, Clone, Default)]
pub struct Topology {
    adj: Vec<Vec<NodeId>>,
}

impl Topology {
    pub fn new(adj: Vec<Vec<NodeId>>) -> Self {
        Self { adj }
    }

    pub fn node_count(&self) -> usize {
        self.adj.len()
    }

    pub fn neighbors(&self, n: NodeId) -> &[NodeId] {
        self.adj.get(n.0).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn has_link(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// 最短跳数路径（含两端）；同跳数时选编号更小的前驱，保证确定性
    pub fn shortest_path(&self, src: NodeId, dst: NodeId) -> Option<Vec<NodeId>> {
        if src.0 >= self.adj.len() || dst.0 >= self.adj.len() {
            return None;
        }
        if src == dst {
            return Some(vec![src]);
        }
        let mut prev: Vec<Option<NodeId>> = vec![None; self.adj.len()];
        let mut seen = vec![false; self.adj.len()];
        let mut q = VecDeque::new();
        seen[src.0] = true;
        q.push_back(src);
        while let Some(v) = q.pop_front() {
            for &nb in &self.adj[v.0] {
                if seen[nb.0] {
                    continue;
                }
                seen[nb.0] = true;
                prev[nb.0] = Some(v);
                if nb == dst {
                    let mut path = vec![dst];
                    let mut cur = dst;
                    while let Some(p) = prev[cur.0] {
                        path.push(p);
                        cur = p;
                    }
                    path.reverse();
                    return Some(path);
                }
                q.push_back(nb);
            }
        }
        None
    }
}

/// 最短跳数下一跳表：`(from, dst) -> next`
#[derive(Debug, Default, Clone)]
pub struct RoutingTable {
    next_hop: HashMap<(NodeId, NodeId), NodeId>,
}

impl RoutingTable {
    /// 基于拓扑重建。对每个 dst 做一次 BFS 得到距离 dist[*]，
    /// 再为每个 from 选出满足 dist[next] = dist[from] - 1 的编号最小邻居。
    pub fn build(topo: &Topology) -> Self {
        let n = topo.node_count();
        let mut next_hop = HashMap::new();
        let mut dist: Vec<u32> = vec![u32::MAX; n];
        let mut q: VecDeque<NodeId> = VecDeque::new();

        for dst_idx in 0..n {
            dist.fill(u32::MAX);
            q.clear();
            dist[dst_idx] = 0;
            q.push_back(NodeId(dst_idx));

            while let Some(v) = q.pop_front() {
                let dv = dist[v.0];
                for &nb in topo.neighbors(v) {
                    if dist[nb.0] == u32::MAX {
                        dist[nb.0] = dv + 1;
                        q.push_back(nb);
                    }
                }
            }

            for from_idx in 0..n {
                let df = dist[from_idx];
                if from_idx == dst_idx || df == u32::MAX {
                    continue;
                }
                let best = topo
                    .neighbors(NodeId(from_idx))
                    .iter()
                    .copied()
                    .filter(|nh| dist[nh.0] == df - 1)
                    .min();
                if let Some(nh) = best {
                    next_hop.insert((NodeId(from_idx), NodeId(dst_idx)), nh);
                }
            }
        }
        Self { next_hop }
    }

    pub fn next_hop(&self, from: NodeId, dst: NodeId) -> Option<NodeId> {
        self.next_hop.get(&(from, dst)).copied()
    }

    /// 沿表逐跳展开成完整路径；表中存在环或缺项时返回 None
    pub fn path(&self, src: NodeId, dst: NodeId) -> Option<Vec<NodeId>> {
        let mut path = vec![src];
        let mut cur = src;
        while cur != dst {
            cur = self.next_hop(cur, dst)?;
            if path.contains(&cur) {
                return None;
            }
            path.push(cur);
        }
        Some(path)
    }
}

/// 候选路由协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ProtocolSelector", into = "String")]
pub enum RoutingProtocol {
    Olsr,
    Aodv,
    Dsdv,
    Dsr,
}

impl RoutingProtocol {
    pub const ALL: [RoutingProtocol; 4] = [
        RoutingProtocol::Olsr,
        RoutingProtocol::Aodv,
        RoutingProtocol::Dsdv,
        RoutingProtocol::Dsr,
    ];

    /// 数字编码：1=OLSR, 2=AODV, 3=DSDV, 4=DSR
    pub fn code(self) -> u8 {
        match self {
            RoutingProtocol::Olsr => 1,
            RoutingProtocol::Aodv => 2,
            RoutingProtocol::Dsdv => 3,
            RoutingProtocol::Dsr => 4,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() as u64 == code)
    }

    /// 输出到 CSV 的协议名
    pub fn label(self) -> &'static str {
        match self {
            RoutingProtocol::Olsr => "OLSR",
            RoutingProtocol::Aodv => "AODV",
            RoutingProtocol::Dsdv => "DSDV",
            RoutingProtocol::Dsr => "DSR",
        }
    }

    /// 为该协议创建路由代理
    pub fn agent(self) -> Box<dyn RoutingAgent> {
        match self {
            RoutingProtocol::Olsr => Box::new(ProactiveAgent::new(self, SimTime::from_secs(2))),
            RoutingProtocol::Dsdv => Box::new(ProactiveAgent::new(self, SimTime::from_secs(15))),
            RoutingProtocol::Aodv => Box::new(ReactiveAgent::new(self, Some(SimTime::from_secs(3)))),
            RoutingProtocol::Dsr => Box::new(ReactiveAgent::new(self, None)),
        }
    }
}

impl fmt::Display for RoutingProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RoutingProtocol {
    type Err = ConfigError;

    /// 接受数字编码或大小写不敏感的协议名
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u64>() {
            return Self::from_code(code).ok_or_else(|| ConfigError::UnknownProtocol(s.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownProtocol(s.to_string()))
    }
}

impl From<RoutingProtocol> for String {
    fn from(p: RoutingProtocol) -> String {
        p.label().to_string()
    }
}

/// 场景文件里协议字段既可以写数字也可以写名字
#[derive(Deserialize)]
#[serde(untagged)]
enum ProtocolSelector {
    Code(u64),
    Name(String),
}

impl TryFrom<ProtocolSelector> for RoutingProtocol {
    type Error = ConfigError;

    fn try_from(sel: ProtocolSelector) -> Result<Self, Self::Error> {
        match sel {
            ProtocolSelector::Code(code) => RoutingProtocol::from_code(code)
                .ok_or_else(|| ConfigError::UnknownProtocol(code.to_string())),
            ProtocolSelector::Name(name) => name.parse(),
        }
    }
}

/// 路由查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: Vec<NodeId>,
    /// 首个数据包在源端等待的时延（按需路由发现）
    pub setup_delay: SimTime,
}

/// 路由代理接口
pub trait RoutingAgent: Send {
    fn protocol(&self) -> RoutingProtocol;

    /// 查询 src -> dst 的路径；`topo` 是 `now` 时刻的真实拓扑
    fn route(&mut self, src: NodeId, dst: NodeId, now: SimTime, topo: &Topology) -> Option<Route>;

    /// 转发时发现 from -> to 已断开
    fn link_broken(&mut self, from: NodeId, to: NodeId);
}

/// 主动式路由：按固定周期重建整张表
pub struct ProactiveAgent {
    protocol: RoutingProtocol,
    refresh: SimTime,
    built_at: Option<SimTime>,
    table: RoutingTable,
}

impl ProactiveAgent {
    pub fn new(protocol: RoutingProtocol, refresh: SimTime) -> Self {
        Self {
            protocol,
            refresh,
            built_at: None,
            table: RoutingTable::default(),
        }
    }
}

impl RoutingAgent for ProactiveAgent {
    fn protocol(&self) -> RoutingProtocol {
        self.protocol
    }

    fn route(&mut self, src: NodeId, dst: NodeId, now: SimTime, topo: &Topology) -> Option<Route> {
        let stale = match self.built_at {
            None => true,
            Some(at) => now >= at.saturating_add(self.refresh),
        };
        if stale {
            self.table = RoutingTable::build(topo);
            self.built_at = Some(now);
            debug!(protocol = %self.protocol, now = ?now, "重建路由表");
        }
        let path = self.table.path(src, dst)?;
        Some(Route {
            path,
            setup_delay: SimTime::ZERO,
        })
    }

    fn link_broken(&mut self, _from: NodeId, _to: NodeId) {
        // 断链要等下一次周期性更新才会体现在表里
    }
}

/// 按需路由：发现 + 缓存
pub struct ReactiveAgent {
    protocol: RoutingProtocol,
    /// 缓存寿命；None 表示直到断链前一直有效（DSR 路由缓存）
    lifetime: Option<SimTime>,
    cache: HashMap<(NodeId, NodeId), (Vec<NodeId>, SimTime)>,
}

impl ReactiveAgent {
    pub fn new(protocol: RoutingProtocol, lifetime: Option<SimTime>) -> Self {
        Self {
            protocol,
            lifetime,
            cache: HashMap::new(),
        }
    }

    fn expiry(&self, now: SimTime) -> SimTime {
        self.lifetime.map_or(SimTime::MAX, |l| now.saturating_add(l))
    }
}

impl RoutingAgent for ReactiveAgent {
    fn protocol(&self) -> RoutingProtocol {
        self.protocol
    }

    fn route(&mut self, src: NodeId, dst: NodeId, now: SimTime, topo: &Topology) -> Option<Route> {
        let expiry = self.expiry(now);
        if let Some((path, expires)) = self.cache.get_mut(&(src, dst)) {
            if now < *expires {
                // 活跃路由每次使用都会续期
                *expires = expiry;
                trace!(protocol = %self.protocol, hops = path.len() - 1, "命中路由缓存");
                return Some(Route {
                    path: path.clone(),
                    setup_delay: SimTime::ZERO,
                });
            }
        }

        let path = topo.shortest_path(src, dst)?;
        let hops = (path.len() - 1) as u64;
        let setup_delay = SimTime(DISCOVERY_HOP_DELAY.0.saturating_mul(2 * hops));
        debug!(protocol = %self.protocol, src = ?src, dst = ?dst, hops, "路由发现");
        self.cache.insert((src, dst), (path.clone(), expiry));
        Some(Route { path, setup_delay })
    }

    fn link_broken(&mut self, from: NodeId, to: NodeId) {
        self.cache.retain(|_, (path, _)| {
            !path
                .windows(2)
                .any(|w| (w[0] == from && w[1] == to) || (w[0] == to && w[1] == from))
        });
    }
}
