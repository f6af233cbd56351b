//! MANET 路由协议对比实验
//!
//! 在同一移动与流量场景下运行一种路由协议，每秒输出一行接收速率到 CSV。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use manet_compare::error::{ExperimentError, Result};
use manet_compare::experiment::{ExperimentConfig, ExperimentController};
use manet_compare::net::RoutingProtocol;

#[derive(Debug, Parser)]
#[command(
    name = "manet-compare",
    about = "在随机路点移动场景下比较 OLSR/AODV/DSDV/DSR 的接收吞吐量"
)]
struct Args {
    /// JSON 场景文件；命令行参数覆盖其中的字段
    #[arg(long)]
    config: Option<PathBuf>,

    /// 结果 CSV 文件名
    #[arg(long)]
    csv_file_name: Option<PathBuf>,

    /// 是否记录移动轨迹
    #[arg(long, action = clap::ArgAction::Set)]
    trace_mobility: Option<bool>,

    /// 追踪文件输出目录
    #[arg(long)]
    trace_dir: Option<PathBuf>,

    /// 路由协议：1=OLSR, 2=AODV, 3=DSDV, 4=DSR（也可直接写名字）
    #[arg(long)]
    protocol: Option<String>,

    /// sink/source 对数
    #[arg(long)]
    sinks: Option<usize>,

    /// 发射功率（dBm）
    #[arg(long)]
    tx_power_dbm: Option<f64>,

    /// 仿真总时长（秒）
    #[arg(long)]
    total_time_secs: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// 不打印逐包接收记录
    #[arg(long)]
    quiet: bool,
}

fn build_config(args: &Args) -> Result<ExperimentConfig> {
    let mut cfg = match &args.config {
        Some(path) => ExperimentConfig::from_json_file(path)?,
        None => ExperimentConfig::default(),
    };
    if let Some(sel) = &args.protocol {
        cfg.protocol = sel.parse::<RoutingProtocol>()?;
    }
    if let Some(v) = &args.csv_file_name {
        cfg.csv_file_name = v.clone();
    }
    if let Some(v) = args.trace_mobility {
        cfg.trace_mobility = v;
    }
    if let Some(v) = &args.trace_dir {
        cfg.trace_dir = v.clone();
    }
    if let Some(v) = args.sinks {
        cfg.sink_count = v;
    }
    if let Some(v) = args.tx_power_dbm {
        cfg.tx_power_dbm = v;
    }
    if let Some(v) = args.total_time_secs {
        cfg.total_duration_secs = v;
    }
    if let Some(v) = args.seed {
        cfg.seed = v;
    }
    Ok(cfg)
}

fn run(args: &Args) -> Result<()> {
    let cfg = build_config(args)?;
    let summary = ExperimentController::new(cfg)
        .with_echo_receptions(!args.quiet)
        .run()?;
    println!(
        "done @ {}s, protocol={}, rows={}, sent_pkts={}, delivered_pkts={}, dropped_pkts={}",
        summary.final_time,
        summary.protocol,
        summary.rows_written,
        summary.net.sent_pkts,
        summary.net.delivered_pkts,
        summary.net.dropped_pkts()
    );
    Ok(())
}

fn main() -> ExitCode {
    // 日志写到 stderr，stdout 只留接收记录与汇总
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "实验失败");
            if matches!(e, ExperimentError::Config(_)) {
                return ExitCode::from(2);
            }
            ExitCode::FAILURE
        }
    }
}
