//! 接收累加器
//!
//! 由套接字接收回调驱动，累计自上次采样以来收到的字节数与包数。

use std::net::SocketAddrV4;

use crate::net::NodeId;
use crate::sim::SimTime;

/// 一次数据包接收通知；立即被累加器消费，不会保存
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiveEvent {
    /// 接收节点
    pub node: NodeId,
    /// 发送端地址；无法识别时为 None
    pub source: Option<SocketAddrV4>,
    pub size_bytes: u32,
    pub arrival: SimTime,
}

impl ReceiveEvent {
    /// 控制台输出的接收记录：`<时间> <节点> received one packet from <地址>`
    pub fn log_line(&self) -> String {
        match self.source {
            Some(addr) => format!(
                "{} {} received one packet from {}",
                self.arrival,
                self.node.0,
                addr.ip()
            ),
            None => format!("{} {} received one packet!", self.arrival, self.node.0),
        }
    }
}

/// 自上次采样以来的接收计数。
///
/// 单线程协作式调度下接收与采样不会交错，因此是普通结构体，不需要锁。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReceiveAccumulator {
    bytes_since_last_sample: u64,
    packets_since_last_sample: u64,
}

impl ReceiveAccumulator {
    pub fn on_receive(&mut self, ev: &ReceiveEvent) {
        self.bytes_since_last_sample = self
            .bytes_since_last_sample
            .saturating_add(ev.size_bytes as u64);
        self.packets_since_last_sample = self.packets_since_last_sample.saturating_add(1);
    }

    /// 读出 `(bytes, packets)` 并清零
    pub fn drain_and_reset(&mut self) -> (u64, u64) {
        let bytes = std::mem::take(&mut self.bytes_since_last_sample);
        let packets = std::mem::take(&mut self.packets_since_last_sample);
        (bytes, packets)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes_since_last_sample
    }

    pub fn packets(&self) -> u64 {
        self.packets_since_last_sample
    }
}
