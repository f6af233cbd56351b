//! 网络模拟模块
//!
//! 此模块包含无线自组网的组成部分：节点移动、信道、路由协议代理与逐跳转发。

// 子模块声明
mod channel;
mod deliver_packet;
mod id;
mod mobility;
mod network;
mod packet;
mod routing;
mod stats;

// 重新导出公共接口
pub use channel::Channel;
pub use deliver_packet::DeliverPacket;
pub use id::{FlowId, NodeId};
pub use mobility::{Area, Grid, Mobility, Position, RandomWaypoint};
pub use network::{Network, Node};
pub use packet::Packet;
pub use routing::{
    ProactiveAgent, ReactiveAgent, Route, RoutingAgent, RoutingProtocol, RoutingTable, Topology,
};
pub use stats::Stats;
