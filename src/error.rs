//! 错误类型
//!
//! 实验是一次性的确定性运行：任何错误都直接终止本次实验，不做重试。

use std::net::SocketAddrV4;
use std::path::PathBuf;

use thiserror::Error;

use crate::net::NodeId;

/// 配置错误：在调度开始之前检出。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown routing protocol selector `{0}` (expected 1=OLSR, 2=AODV, 3=DSDV, 4=DSR)")]
    UnknownProtocol(String),

    #[error("{sinks} sinks need {needed} nodes but only {nodes} exist")]
    TooManySinks {
        sinks: usize,
        nodes: usize,
        needed: usize,
    },

    #[error("invalid output path `{}`: {reason}", path.display())]
    OutputPath { path: PathBuf, reason: &'static str },

    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("total duration {total}s ends before sources can start (latest start {latest}s)")]
    FlowWindow { total: f64, latest: f64 },
}

/// 实验运行错误
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error on `{}`: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("node {node:?} cannot bind {addr}: address already in use")]
    Bind { node: NodeId, addr: SocketAddrV4 },
}

impl ExperimentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExperimentError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ExperimentError> = std::result::Result<T, E>;
