//! 实验配置
//!
//! 运行开始时构造一次、之后只读；默认值即原实验场景（30 个节点、AODV、15 对流、103 秒）。
//! 可以从 JSON 场景文件加载，缺省字段取默认值。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::OnOffApp;
use crate::error::{ConfigError, ExperimentError, Result};
use crate::net::{Area, Grid, RoutingProtocol};
use crate::sim::SimTime;
use crate::traffic::{SOURCE_START_WINDOW, TrafficPlan};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub sink_count: usize,
    pub tx_power_dbm: f64,
    pub csv_file_name: PathBuf,
    pub total_duration_secs: f64,
    pub protocol: RoutingProtocol,

    /// 随机路点移动的节点数
    pub mobile_nodes: usize,
    /// 网格摆放的静止节点数
    pub static_nodes: usize,
    pub packet_size_bytes: u32,
    pub data_rate_bps: u64,
    pub port: u16,
    pub node_speed_mps: f64,
    pub node_pause_secs: f64,
    pub area_width_m: f64,
    pub area_height_m: f64,
    pub grid_delta_x_m: f64,
    pub grid_delta_y_m: f64,
    pub grid_width: usize,
    pub sample_interval_secs: f64,
    pub seed: u64,
    pub trace_mobility: bool,
    pub trace_dir: PathBuf,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            sink_count: 15,
            tx_power_dbm: 7.5,
            csv_file_name: PathBuf::from("AODV-simulation.csv"),
            total_duration_secs: 103.0,
            protocol: RoutingProtocol::Aodv,
            mobile_nodes: 15,
            static_nodes: 15,
            packet_size_bytes: 512,
            data_rate_bps: 2048,
            port: 9,
            node_speed_mps: 20.0,
            node_pause_secs: 0.0,
            area_width_m: 1500.0,
            area_height_m: 300.0,
            grid_delta_x_m: 50.0,
            grid_delta_y_m: 200.0,
            grid_width: 3,
            sample_interval_secs: 1.0,
            seed: 1,
            trace_mobility: true,
            trace_dir: PathBuf::from("."),
        }
    }
}

impl ExperimentConfig {
    /// 从 JSON 场景文件加载。
    ///
    /// 协议字段先单独解析，未知协议和命令行一样报 `ConfigError::UnknownProtocol`。
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = |source| ExperimentError::Json {
            path: path.to_path_buf(),
            source,
        };
        let text = fs::read_to_string(path).map_err(|e| ExperimentError::io(path, e))?;
        let mut raw: Value = serde_json::from_str(&text).map_err(json)?;
        if let Some(sel) = raw.get_mut("protocol") {
            let protocol = protocol_from_json(sel)?;
            *sel = Value::from(protocol.label());
        }
        serde_json::from_value(raw).map_err(json)
    }

    pub fn total_nodes(&self) -> usize {
        self.mobile_nodes + self.static_nodes
    }

    pub fn total_duration(&self) -> SimTime {
        SimTime::from_secs_f64(self.total_duration_secs)
    }

    pub fn sample_interval(&self) -> SimTime {
        SimTime::from_secs_f64(self.sample_interval_secs)
    }

    pub fn area(&self) -> Area {
        Area {
            width: self.area_width_m,
            height: self.area_height_m,
        }
    }

    pub fn grid(&self) -> Grid {
        Grid {
            delta_x: self.grid_delta_x_m,
            delta_y: self.grid_delta_y_m,
            width: self.grid_width,
        }
    }

    pub fn traffic_plan(&self) -> TrafficPlan {
        TrafficPlan {
            sink_count: self.sink_count,
            port: self.port,
            stop: self.total_duration(),
        }
    }

    /// 辅助追踪文件的基础名，例如
    /// `manet-routing-compare_AODV_15nodes_20speed_0pause_2048bpsrate`
    pub fn trace_name(&self) -> String {
        format!(
            "manet-routing-compare_{}_{}nodes_{}speed_{}pause_{}bpsrate",
            self.protocol.label(),
            self.mobile_nodes,
            self.node_speed_mps,
            self.node_pause_secs,
            self.data_rate_bps
        )
    }

    /// 在任何调度开始之前检查配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("total_duration_secs", self.total_duration_secs),
            ("sample_interval_secs", self.sample_interval_secs),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if self.sample_interval().0 == 0 {
            return Err(ConfigError::NonPositive {
                name: "sample_interval_secs",
                value: self.sample_interval_secs,
            });
        }
        if self.data_rate_bps == 0 {
            return Err(ConfigError::NonPositive {
                name: "data_rate_bps",
                value: 0.0,
            });
        }
        if self.packet_size_bytes == 0 {
            return Err(ConfigError::NonPositive {
                name: "packet_size_bytes",
                value: 0.0,
            });
        }
        if OnOffApp::send_interval(self.packet_size_bytes, self.data_rate_bps).0 == 0 {
            return Err(ConfigError::NonPositive {
                name: "send_interval_secs",
                value: 0.0,
            });
        }
        if !self.tx_power_dbm.is_finite() {
            return Err(ConfigError::NonPositive {
                name: "tx_power_dbm",
                value: self.tx_power_dbm,
            });
        }

        let needed = self.sink_count.saturating_mul(2);
        if needed > self.total_nodes() {
            return Err(ConfigError::TooManySinks {
                sinks: self.sink_count,
                nodes: self.total_nodes(),
                needed,
            });
        }
        if self.sink_count > 0 && self.total_duration() < SOURCE_START_WINDOW.end {
            return Err(ConfigError::FlowWindow {
                total: self.total_duration_secs,
                latest: SOURCE_START_WINDOW.end.as_secs_f64(),
            });
        }

        let csv = &self.csv_file_name;
        if csv.as_os_str().is_empty() || csv.file_name().is_none() {
            return Err(ConfigError::OutputPath {
                path: csv.clone(),
                reason: "not a file name",
            });
        }
        if let Some(parent) = csv.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(ConfigError::OutputPath {
                    path: csv.clone(),
                    reason: "parent directory does not exist",
                });
            }
        }
        if self.trace_mobility && !self.trace_dir.is_dir() {
            return Err(ConfigError::OutputPath {
                path: self.trace_dir.clone(),
                reason: "trace directory does not exist",
            });
        }
        Ok(())
    }
}

/// 场景文件里的协议字段：数字编码或协议名
fn protocol_from_json(sel: &Value) -> Result<RoutingProtocol, ConfigError> {
    match sel {
        Value::String(name) => name.parse(),
        Value::Number(n) => n
            .as_u64()
            .and_then(RoutingProtocol::from_code)
            .ok_or_else(|| ConfigError::UnknownProtocol(n.to_string())),
        other => Err(ConfigError::UnknownProtocol(other.to_string())),
    }
}
