//! 实验编排：配置、共享世界状态、控制器与辅助追踪。

mod config;
mod controller;
mod trace;
mod world;

pub use config::ExperimentConfig;
pub use controller::{ExperimentController, RunSummary};
pub use trace::{MobilitySample, MobilityTrace, SampleMobility};
pub use world::ManetWorld;
