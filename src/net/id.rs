//! 标识符类型
//!
//! 定义节点与流的唯一标识符。

use serde::Serialize;

/// 节点标识符（同时也是节点在网络中的下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// 流标识符（一对 sink/source 对应一个流）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowId(pub usize);
