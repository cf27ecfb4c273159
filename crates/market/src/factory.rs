use candlefeed_core::config::ChartConfig;
use candlefeed_core::market::entity::{BiasState, Candle};
use rand::Rng;

/// # Summary
/// 合成 K 线工厂。
///
/// # Invariants
/// - 无状态，输出只依赖输入、随机源与传入的偏置。
/// - 有前收盘价时 `open == prior_close`，价格路径连续无跳空。
/// - 生成的每根 K 线都满足 OHLC 包络不变量。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandleFactory {
    // 首根开盘价中枢
    base_price: f64,
    // 首根开盘价的浮动幅度
    open_spread: f64,
    // 实体幅度上限，等于 tick 间隔
    max_body: f64,
    // 影线长度上限
    max_wick: f64,
}

impl CandleFactory {
    /// # Summary
    /// 按配置构造工厂。
    ///
    /// # Arguments
    /// * `config`: 已校验过的图表配置。
    ///
    /// # Returns
    /// CandleFactory 实例。
    pub fn new(config: &ChartConfig) -> Self {
        Self {
            base_price: config.base_price,
            open_spread: config.open_spread,
            max_body: f64::from(config.tick_interval),
            max_wick: config.max_wick,
        }
    }

    /// # Summary
    /// 生成一根 K 线。
    ///
    /// # Logic
    /// 1. 无前收盘价时开盘价取 `base ± U(spread)`，否则沿用前收盘价。
    /// 2. 从 `[0, max_body)` 抽取实体幅度。
    /// 3. 按偏置决定方向：Up 上涨，Down 下跌，Neutral 每根独立抛硬币。
    /// 4. 在实体两端各加一段 `[0, max_wick)` 的随机影线。
    ///
    /// # Arguments
    /// * `rng`: 随机源。
    /// * `time`: K 线时间戳（秒）。
    /// * `prior_close`: 上一根的收盘价，窗口首根为 None。
    /// * `bias`: 生成时刻的偏置状态。
    ///
    /// # Returns
    /// 新生成的 K 线。
    pub fn generate<R: Rng>(
        &self,
        rng: &mut R,
        time: i64,
        prior_close: Option<f64>,
        bias: BiasState,
    ) -> Candle {
        let open = match prior_close {
            Some(close) => close,
            None => self.base_price + rng.random_range(-self.open_spread..self.open_spread),
        };
        let offset = rng.random_range(0.0..self.max_body);

        let rising = match bias {
            BiasState::Up => true,
            BiasState::Down => false,
            BiasState::Neutral => rng.random_bool(0.5),
        };
        let close = if rising { open + offset } else { open - offset };

        let high = open.max(close) + rng.random_range(0.0..self.max_wick);
        let low = open.min(close) - rng.random_range(0.0..self.max_wick);

        Candle::new(time, open, high, low, close)
    }
}
