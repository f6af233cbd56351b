//! 无线信道
//!
//! Friis 自由空间传播 + 接收灵敏度门限：接收功率不低于门限即视为一跳可达。
//! 每跳时延 = 以 PHY 速率发送的串行化时间 + 光速传播时延。

use crate::sim::SimTime;

const SPEED_OF_LIGHT_MPS: f64 = 299_792_458.0;

/// 信道参数
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub tx_power_dbm: f64,
    /// 802.11b 信道 1
    pub frequency_hz: f64,
    pub rx_sensitivity_dbm: f64,
    /// PHY 速率（DsssRate11Mbps）
    pub phy_rate_bps: u64,
}

impl Channel {
    pub fn new(tx_power_dbm: f64) -> Self {
        Self {
            tx_power_dbm,
            ..Self::default()
        }
    }

    fn wavelength(&self) -> f64 {
        SPEED_OF_LIGHT_MPS / self.frequency_hz
    }

    /// 距离 `distance_m` 处的接收功率（dBm）
    pub fn rx_power_dbm(&self, distance_m: f64) -> f64 {
        if distance_m <= 0.0 {
            return self.tx_power_dbm;
        }
        let loss_db = 20.0 * (4.0 * std::f64::consts::PI * distance_m / self.wavelength()).log10();
        self.tx_power_dbm - loss_db.max(0.0)
    }

    pub fn in_range(&self, distance_m: f64) -> bool {
        self.rx_power_dbm(distance_m) >= self.rx_sensitivity_dbm
    }

    /// 最大一跳距离（米），用于日志展示
    pub fn range_m(&self) -> f64 {
        let budget_db = self.tx_power_dbm - self.rx_sensitivity_dbm;
        if budget_db <= 0.0 {
            return 0.0;
        }
        self.wavelength() / (4.0 * std::f64::consts::PI) * 10f64.powf(budget_db / 20.0)
    }

    /// 计算一跳发送 `bytes` 字节、距离 `distance_m` 的总时延
    pub fn hop_delay(&self, bytes: u32, distance_m: f64) -> SimTime {
        // ceil(bytes*8 / bps) 秒 -> 纳秒
        let tx = if self.phy_rate_bps == 0 {
            SimTime(u64::MAX / 4)
        } else {
            let bits = (bytes as u128).saturating_mul(8);
            let nanos = (bits.saturating_mul(1_000_000_000u128) + (self.phy_rate_bps as u128 - 1))
                / self.phy_rate_bps as u128;
            SimTime(nanos.min(u64::MAX as u128) as u64)
        };
        tx.saturating_add(SimTime::from_secs_f64(distance_m.max(0.0) / SPEED_OF_LIGHT_MPS))
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            tx_power_dbm: 7.5,
            frequency_hz: 2.412e9,
            rx_sensitivity_dbm: -96.0,
            phy_rate_bps: 11_000_000,
        }
    }
}
