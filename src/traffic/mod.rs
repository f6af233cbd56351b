//! 流量规划与安装

mod install;
mod planner;

pub use install::{SourceParams, install_flows};
pub use planner::{
    Endpoint, FlowSpec, SINK_START_WINDOW, SOURCE_START_WINDOW, TrafficPlan, TrafficPlanner,
};
