//! 统计信息
//!
//! 定义网络仿真统计数据结构。

/// 网络统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    pub sent_pkts: u64,
    pub delivered_pkts: u64,
    pub delivered_bytes: u64,
    /// 路由协议找不到路径而丢弃
    pub no_route_drops: u64,
    /// 转发时下一跳已不在通信范围内而丢弃
    pub link_break_drops: u64,
}

impl Stats {
    pub fn dropped_pkts(&self) -> u64 {
        self.no_route_drops + self.link_break_drops
    }
}
