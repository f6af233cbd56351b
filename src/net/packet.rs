//! 数据包类型
//!
//! 定义网络数据包及其相关操作。数据包携带路由协议给出的完整路径（源路由），
//! 逐跳转发时沿路径前进。

use std::net::SocketAddrV4;

use super::id::{FlowId, NodeId};

/// 网络数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    pub flow_id: FlowId,
    pub size_bytes: u32,
    /// 发送端套接字地址；未知时为 None
    pub from: Option<SocketAddrV4>,
    /// 目的套接字地址（sink 绑定的地址与端口）
    pub to: SocketAddrV4,
    pub route: Vec<NodeId>,
    pub hop: usize, // 当前所在节点在 route 中的索引
}

impl Packet {
    /// 获取目标节点
    pub fn dst(&self) -> NodeId {
        *self.route.last().expect("route non-empty")
    }

    /// 获取下一跳节点（如果有）
    pub fn next(&self) -> Option<NodeId> {
        self.route.get(self.hop + 1).copied()
    }

    /// 前进到下一跳
    pub fn advance(mut self) -> Self {
        self.hop += 1;
        self
    }
}
