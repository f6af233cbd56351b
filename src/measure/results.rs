//! 结果输出
//!
//! 只追加的 CSV：实验开始时写一次表头，之后每个采样点追加一行。
//! 每行都重新以追加方式打开、写入、刷新并关闭文件，保证下一次采样前结果已落盘。

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ExperimentError, Result};
use crate::sim::SimTime;

pub const CSV_HEADER: &str =
    "SimulationSecond,ReceiveRate,PacketsReceived,NumberOfSinks,RoutingProtocol,TransmissionPower";

/// 一个采样区间的结果
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub timestamp: SimTime,
    pub rate_kbps: f64,
    pub packets_received: u64,
    pub sink_count: usize,
    pub protocol_label: String,
    pub tx_power_dbm: f64,
}

impl SampleRow {
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.timestamp,
            self.rate_kbps,
            self.packets_received,
            self.sink_count,
            self.protocol_label,
            self.tx_power_dbm
        )
    }
}

/// 结果 CSV 的唯一写入者
#[derive(Debug, Clone)]
pub struct ResultsWriter {
    path: PathBuf,
    rows_written: u64,
}

impl ResultsWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rows_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// 创建（或清空）文件并写入表头
    pub fn write_header(&mut self) -> Result<()> {
        let mut f = File::create(&self.path).map_err(|e| ExperimentError::io(&self.path, e))?;
        writeln!(f, "{CSV_HEADER}").map_err(|e| ExperimentError::io(&self.path, e))?;
        self.rows_written = 0;
        debug!(path = %self.path.display(), "写入 CSV 表头");
        Ok(())
    }

    pub fn append_row(&mut self, row: &SampleRow) -> Result<()> {
        let io = |e| ExperimentError::io(&self.path, e);
        let mut f = OpenOptions::new().append(true).open(&self.path).map_err(io)?;
        writeln!(f, "{}", row.to_csv_line()).map_err(io)?;
        f.flush().map_err(io)?;
        self.rows_written += 1;
        Ok(())
    }
}
