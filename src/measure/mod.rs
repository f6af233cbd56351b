//! 测量模块
//!
//! 接收累加器 → 吞吐量采样器 → 结果 CSV。

mod accumulator;
mod results;
mod sampler;

pub use accumulator::{ReceiveAccumulator, ReceiveEvent};
pub use results::{CSV_HEADER, ResultsWriter, SampleRow};
pub use sampler::{CheckThroughput, SampleLabels, ThroughputSampler};
