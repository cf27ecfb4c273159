use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// K 线涨跌方向，仅用于渲染着色，不参与后续计算。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// # Summary
    /// 根据开收盘价推导方向。
    ///
    /// # Logic
    /// 收盘价严格大于开盘价为 Up，其余（含持平）为 Down。
    pub fn of(open: f64, close: f64) -> Self {
        if close > open {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

/// # Summary
/// 单根合成 K 线。
///
/// # Invariants
/// - `low <= min(open, close) <= max(open, close) <= high`。
/// - `time` 以秒为单位，窗口内相邻两根恰好相差一个 tick 间隔。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    // K 线时间戳（秒）
    pub time: i64,
    // 开盘价
    pub open: f64,
    // 最高价
    pub high: f64,
    // 最低价
    pub low: f64,
    // 收盘价
    pub close: f64,
    // 涨跌方向 (由 open/close 推导)
    pub direction: Direction,
}

impl Candle {
    /// # Summary
    /// 构造 K 线并自动推导方向。
    ///
    /// # Arguments
    /// * `time`: 时间戳（秒）。
    /// * `open`, `high`, `low`, `close`: 四个价格。
    ///
    /// # Returns
    /// 新的 Candle 实例。
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            direction: Direction::of(open, close),
        }
    }

    /// 将秒级时间戳转换为 UTC 时间，超出可表示范围时返回 None。
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.time, 0).single()
    }

    /// # Summary
    /// 校验 OHLC 包络不变量。
    ///
    /// # Returns
    /// 最高/最低价完整包住实体时返回 true。
    pub fn is_bracketed(&self) -> bool {
        self.low <= self.open.min(self.close) && self.open.max(self.close) <= self.high
    }
}

/// # Summary
/// 方向偏置状态，由外部点击驱动循环切换。
///
/// # Invariants
/// - 循环顺序固定为 `Neutral -> Up -> Down -> Neutral`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiasState {
    #[default]
    Neutral,
    Up,
    Down,
}

impl BiasState {
    /// # Summary
    /// 循环中的下一个状态。
    ///
    /// # Logic
    /// 全函数，覆盖所有三个状态。
    pub fn next(self) -> Self {
        match self {
            BiasState::Neutral => BiasState::Up,
            BiasState::Up => BiasState::Down,
            BiasState::Down => BiasState::Neutral,
        }
    }

    /// 状态徽章上展示的文案。
    pub fn label(self) -> &'static str {
        match self {
            BiasState::Neutral => "Default",
            BiasState::Up => "Increase",
            BiasState::Down => "Decrease",
        }
    }
}

impl std::fmt::Display for BiasState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// # Summary
/// 视口尺寸，resize 信号的载荷。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// # Summary
/// 渲染端初始可见的时间区间（秒）。
///
/// # Invariants
/// - `from <= to`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleRange {
    pub from: i64,
    pub to: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_derivation() {
        assert_eq!(Candle::new(0, 1.0, 3.0, 0.5, 2.0).direction, Direction::Up);
        assert_eq!(Candle::new(0, 2.0, 3.0, 0.5, 1.0).direction, Direction::Down);
        // 持平视为下跌
        assert_eq!(Candle::new(0, 2.0, 3.0, 0.5, 2.0).direction, Direction::Down);
    }

    #[test]
    fn test_bias_cycle_labels() {
        let mut state = BiasState::default();
        let mut labels = Vec::new();
        for _ in 0..4 {
            labels.push(state.label());
            state = state.next();
        }
        assert_eq!(labels, ["Default", "Increase", "Decrease", "Default"]);
    }

    #[test]
    fn test_candle_serialization_shape() {
        let candle = Candle::new(1_700_000_000, 100.0, 105.0, 95.0, 102.0);
        let json = serde_json::to_value(candle).unwrap();
        assert_eq!(json["time"], 1_700_000_000);
        assert_eq!(json["direction"], "up");
        assert!(candle.datetime().is_some());
    }
}
