//! 测试用的端口录制实现，仅在 `test-utils` 特性下编译。

use crate::market::entity::{BiasState, Candle, Viewport, VisibleRange};
use crate::market::port::{BiasObserver, ViewportSink, WindowObserver};
use std::sync::Mutex;
use tokio::time::Instant;

/// # Summary
/// 记录每次发布的窗口快照与可见区间。
#[derive(Default)]
pub struct RecordingWindowObserver {
    snapshots: Mutex<Vec<Vec<Candle>>>,
    ranges: Mutex<Vec<VisibleRange>>,
}

impl RecordingWindowObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已收到的快照数量
    pub fn count(&self) -> usize {
        self.snapshots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// 最近一次快照
    pub fn last(&self) -> Option<Vec<Candle>> {
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    pub fn snapshots(&self) -> Vec<Vec<Candle>> {
        self.snapshots.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn ranges(&self) -> Vec<VisibleRange> {
        self.ranges.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl WindowObserver for RecordingWindowObserver {
    fn on_window_updated(&self, snapshot: &[Candle]) {
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(snapshot.to_vec());
    }

    fn on_visible_range(&self, range: VisibleRange) {
        self.ranges
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(range);
    }
}

/// # Summary
/// 记录偏置状态的发布序列。
#[derive(Default)]
pub struct RecordingBiasObserver {
    states: Mutex<Vec<BiasState>>,
}

impl RecordingBiasObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> Vec<BiasState> {
        self.states.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// 按发布顺序返回徽章文案
    pub fn labels(&self) -> Vec<&'static str> {
        self.states().into_iter().map(BiasState::label).collect()
    }
}

impl BiasObserver for RecordingBiasObserver {
    fn on_bias_changed(&self, state: BiasState) {
        self.states
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(state);
    }
}

/// # Summary
/// 记录去抖后的 resize 回调及其触发时刻（tokio 时钟，可被暂停/拨动）。
#[derive(Default)]
pub struct RecordingViewportSink {
    events: Mutex<Vec<(Instant, Viewport)>>,
}

impl RecordingViewportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(Instant, Viewport)> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl ViewportSink for RecordingViewportSink {
    fn on_resize(&self, viewport: Viewport) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((Instant::now(), viewport));
    }
}
