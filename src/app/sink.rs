//! 接收端（packet sink）
//!
//! 每个 sink 在建立实验时绑定 `(节点地址, 端口)`；在启动与停止时间之间处于监听状态，
//! 只有监听中的套接字才会把到达的数据包交给接收累加器。

use std::collections::HashMap;
use std::net::SocketAddrV4;

use tracing::debug;

use crate::error::{ExperimentError, Result};
use crate::experiment::ManetWorld;
use crate::net::{FlowId, NodeId};
use crate::sim::{Event, Simulator, World};

/// 已绑定的接收套接字
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSocket {
    pub node: NodeId,
    pub flow: FlowId,
    pub listening: bool,
}

/// 按本地地址索引的套接字表
#[derive(Debug, Default)]
pub struct SocketTable {
    bound: HashMap<SocketAddrV4, SinkSocket>,
}

impl SocketTable {
    pub fn bind(&mut self, node: NodeId, addr: SocketAddrV4, flow: FlowId) -> Result<()> {
        if self.bound.contains_key(&addr) {
            return Err(ExperimentError::Bind { node, addr });
        }
        self.bound.insert(
            addr,
            SinkSocket {
                node,
                flow,
                listening: false,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, addr: &SocketAddrV4) -> Option<&SinkSocket> {
        self.bound.get(addr)
    }

    pub fn set_listening(&mut self, addr: &SocketAddrV4, listening: bool) {
        if let Some(s) = self.bound.get_mut(addr) {
            s.listening = listening;
        }
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

/// 事件：sink 开始监听
#[derive(Debug)]
pub struct SinkStart {
    pub addr: SocketAddrV4,
}

impl Event for SinkStart {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = ManetWorld::downcast(world);
        debug!(addr = %self.addr, now = ?sim.now(), "sink 启动");
        w.sockets.set_listening(&self.addr, true);
    }
}

/// 事件：sink 停止监听
#[derive(Debug)]
pub struct SinkStop {
    pub addr: SocketAddrV4,
}

impl Event for SinkStop {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = ManetWorld::downcast(world);
        debug!(addr = %self.addr, now = ?sim.now(), "sink 停止");
        w.sockets.set_listening(&self.addr, false);
    }
}
