//! 把规划好的流安装到节点上：绑定 sink 套接字、创建 source 应用，
//! 并在调度器上登记各自的启动/停止事件。

use std::net::SocketAddrV4;

use tracing::info;

use super::planner::FlowSpec;
use crate::app::{OnOffApp, SinkStart, SinkStop, SourceStart, SourceStop};
use crate::error::Result;
use crate::experiment::ManetWorld;
use crate::sim::Simulator;

/// source 的本地端口从这里开始分配
const EPHEMERAL_PORT_BASE: u16 = 49153;

/// 发送端参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceParams {
    pub packet_size: u32,
    pub data_rate_bps: u64,
}

pub fn install_flows(
    flows: &[FlowSpec],
    params: SourceParams,
    sim: &mut Simulator,
    world: &mut ManetWorld,
) -> Result<()> {
    for spec in flows {
        world
            .sockets
            .bind(spec.sink_node, spec.destination, spec.flow)?;
        sim.schedule(spec.sink_start, SinkStart { addr: spec.destination });
        sim.schedule(spec.sink_stop, SinkStop { addr: spec.destination });

        let local = SocketAddrV4::new(
            world.net.node_addr(spec.source_node),
            EPHEMERAL_PORT_BASE.wrapping_add(spec.flow.0 as u16),
        );
        debug_assert_eq!(world.sources.len(), spec.flow.0);
        world.sources.push(OnOffApp::new(
            spec.flow,
            spec.source_node,
            local,
            spec.destination,
            params.packet_size,
            params.data_rate_bps,
        ));
        sim.schedule(spec.source_start, SourceStart { flow: spec.flow });
        sim.schedule(spec.source_stop, SourceStop { flow: spec.flow });
    }
    info!(flows = flows.len(), "流量已安装");
    Ok(())
}
