use crate::factory::CandleFactory;
use candlefeed_core::market::entity::{BiasState, Candle, VisibleRange};
use candlefeed_core::market::error::ChartError;
use rand::Rng;

/// # Summary
/// 固定容量的滚动 K 线窗口，是当前序列的唯一权威来源。
///
/// # Invariants
/// - 内存空间在创建时一次性分配，后续不再扩容。
/// - 初始化后长度恒为 `capacity`，每次滑动淘汰最旧一根并追加一根。
/// - 按时间顺序遍历时，相邻两根恰好相差 `tick_interval` 秒，且 `open` 等于前一根的 `close`。
#[derive(Debug, Clone)]
pub struct DataWindow {
    // 内部存储容器
    data: Vec<Candle>,
    // 固定容量
    capacity: usize,
    // 已满后下一次覆盖的位置，同时也是最旧元素的位置
    cursor: usize,
    // 相邻 K 线的时间间隔（秒）
    tick_interval: u32,
}

impl DataWindow {
    /// # Summary
    /// 创建一个空窗口。
    ///
    /// # Arguments
    /// * `capacity`: 窗口长度。
    /// * `tick_interval`: 时间步长。
    ///
    /// # Returns
    /// 未初始化的空窗口。
    pub fn new(capacity: usize, tick_interval: u32) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
            tick_interval,
        }
    }

    /// # Summary
    /// 用合成数据填满窗口。
    ///
    /// # Logic
    /// 1. 清空已有内容。
    /// 2. 从 `start_time` 开始逐根生成，首根没有前收盘价，之后每根接续上一根收盘价。
    /// 3. 每步时间前进 `tick_interval`，直到达到容量。
    ///
    /// # Arguments
    /// * `factory`: K 线工厂。
    /// * `rng`: 随机源。
    /// * `bias`: 当前偏置。
    /// * `start_time`: 首根时间戳（已截断到整秒）。
    pub fn initialize<R: Rng>(
        &mut self,
        factory: &CandleFactory,
        rng: &mut R,
        bias: BiasState,
        start_time: i64,
    ) {
        self.data.clear();
        self.cursor = 0;

        let mut time = start_time;
        let mut prior_close = None;
        while self.data.len() < self.capacity {
            let candle = factory.generate(rng, time, prior_close, bias);
            prior_close = Some(candle.close);
            self.push(candle);
            time += i64::from(self.tick_interval);
        }
    }

    /// # Summary
    /// 窗口向前滑动一格。
    ///
    /// # Logic
    /// 1. 取最新一根，空窗口视为不变量破坏，直接返回错误且不做修改。
    /// 2. 以 `last.time + tick_interval` 与 `last.close` 生成新 K 线。
    /// 3. 覆盖最旧的一根并推进游标。
    ///
    /// # Returns
    /// 成功返回新追加的 K 线，空窗口返回 `ChartError::EmptyWindow`。
    pub fn slide<R: Rng>(
        &mut self,
        factory: &CandleFactory,
        rng: &mut R,
        bias: BiasState,
    ) -> Result<Candle, ChartError> {
        let last = *self.last().ok_or(ChartError::EmptyWindow)?;
        let candle = factory.generate(
            rng,
            last.time + i64::from(self.tick_interval),
            Some(last.close),
            bias,
        );
        self.push(candle);
        Ok(candle)
    }

    /// # Summary
    /// 写入新元素。
    ///
    /// # Logic
    /// 未满时直接 push；已满时覆盖 cursor 处的最旧元素并递增（取模）cursor。
    fn push(&mut self, candle: Candle) {
        if self.data.len() < self.capacity {
            self.data.push(candle);
        } else {
            self.data[self.cursor] = candle;
            self.cursor = (self.cursor + 1) % self.capacity;
        }
    }

    /// 最旧的一根
    pub fn first(&self) -> Option<&Candle> {
        if self.data.len() < self.capacity {
            self.data.first()
        } else {
            self.data.get(self.cursor)
        }
    }

    /// 最新的一根
    pub fn last(&self) -> Option<&Candle> {
        if self.data.len() < self.capacity {
            self.data.last()
        } else {
            let last_idx = if self.cursor == 0 {
                self.capacity - 1
            } else {
                self.cursor - 1
            };
            self.data.get(last_idx)
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 按时间顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        let split = if self.data.len() < self.capacity {
            0
        } else {
            self.cursor
        };
        self.data[split..].iter().chain(self.data[..split].iter())
    }

    /// # Summary
    /// 获取按时间排序的只读快照。
    ///
    /// # Logic
    /// 通过 cursor 切割并重组两段数据，确保返回的 Vec 是有序的。
    ///
    /// # Returns
    /// 窗口内全部 K 线的有序副本。
    pub fn snapshot(&self) -> Vec<Candle> {
        let mut result = Vec::with_capacity(self.data.len());
        result.extend(self.iter().copied());
        result
    }

    /// # Summary
    /// 计算初始可见区间。
    ///
    /// # Logic
    /// 以窗口跨度的一半向两侧外扩，使序列位于画面中部。
    ///
    /// # Returns
    /// 空窗口返回 None。
    pub fn visible_range(&self) -> Option<VisibleRange> {
        let first = self.first()?.time;
        let last = self.last()?.time;
        let half = (last - first) / 2;
        Some(VisibleRange {
            from: first - half,
            to: last + half,
        })
    }
}
