use crate::market::error::ChartError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 窗口长度上限，窗口在构建时一次性分配
pub const MAX_WINDOW_LEN: usize = 100_000;

/// tick 周期与去抖时长上限（一天）
pub const MAX_PERIOD_MS: u64 = 86_400_000;

/// 价格中枢、开盘浮动与影线长度的量级上限
pub const MAX_PRICE_MAGNITUDE: f64 = 1e12;

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chart: ChartConfig,
    pub log: LogConfig,
}

/// # Summary
/// 合成行情引擎参数。
///
/// # Invariants
/// - 默认值即图表的固定常量：窗口 50 根，间隔 10，tick 周期 10 秒，去抖 300 毫秒。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    // 窗口长度
    pub window_len: usize,
    // 相邻 K 线的时间间隔，同时也是实体幅度的上限
    pub tick_interval: u32,
    // 墙钟 tick 周期（毫秒）
    pub tick_period_ms: u64,
    // resize 去抖静默时长（毫秒）
    pub resize_debounce_ms: u64,
    // 首根 K 线开盘价中枢
    pub base_price: f64,
    // 首根开盘价在中枢两侧的浮动幅度
    pub open_spread: f64,
    // 上下影线的最大长度
    pub max_wick: f64,
    // 随机种子，None 时使用系统熵
    pub seed: Option<u64>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            window_len: 50,
            tick_interval: 10,
            tick_period_ms: 10_000,
            resize_debounce_ms: 300,
            base_price: 100.0,
            open_spread: 50.0,
            max_wick: 5.0,
            seed: None,
        }
    }
}

impl ChartConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    /// # Summary
    /// 校验配置是否可用于构建引擎。
    ///
    /// # Logic
    /// 1. 长度、间隔与周期必须为正，且不超过各自上限（窗口一次性分配，周期参与 `Instant` 运算）。
    /// 2. 价格中枢的绝对值、开盘浮动与影线长度都不超过 `MAX_PRICE_MAGNITUDE`，
    ///    保证 `base ± spread` 与采样区间宽度 `2 * spread` 都是有限值。
    /// 3. 浮动与影线必须为正，否则采样区间为空。
    ///
    /// # Returns
    /// 合法返回 Ok，否则返回 `ChartError::InvalidConfig`。
    pub fn validate(&self) -> Result<(), ChartError> {
        if self.window_len == 0 || self.window_len > MAX_WINDOW_LEN {
            return Err(ChartError::InvalidConfig(format!(
                "window_len must be in 1..={}",
                MAX_WINDOW_LEN
            )));
        }
        if self.tick_interval == 0 {
            return Err(ChartError::InvalidConfig("tick_interval must be > 0".into()));
        }
        for (name, value) in [
            ("tick_period_ms", self.tick_period_ms),
            ("resize_debounce_ms", self.resize_debounce_ms),
        ] {
            if value == 0 || value > MAX_PERIOD_MS {
                return Err(ChartError::InvalidConfig(format!(
                    "{} must be in 1..={}",
                    name, MAX_PERIOD_MS
                )));
            }
        }
        if !(self.base_price.is_finite() && self.base_price.abs() <= MAX_PRICE_MAGNITUDE) {
            return Err(ChartError::InvalidConfig(format!(
                "base_price must be finite with magnitude <= {:e}",
                MAX_PRICE_MAGNITUDE
            )));
        }
        for (name, value) in [("open_spread", self.open_spread), ("max_wick", self.max_wick)] {
            if !(value.is_finite() && value > 0.0 && value <= MAX_PRICE_MAGNITUDE) {
                return Err(ChartError::InvalidConfig(format!(
                    "{} must be in (0, {:e}]",
                    name, MAX_PRICE_MAGNITUDE
                )));
            }
        }
        Ok(())
    }
}

/// 日志配置，`RUST_LOG` 优先
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
