use crate::market::entity::{BiasState, Candle, Viewport, VisibleRange};

/// # Summary
/// 窗口快照订阅者（渲染协作方）接口。
///
/// # Invariants
/// - 回调在事件循环内同步执行，实现者不得阻塞。
/// - 快照只读，所有权始终归引擎。
pub trait WindowObserver: Send + Sync {
    /// # Summary
    /// 接收完整的有序 K 线序列。
    ///
    /// # Logic
    /// 初始化完成后调用一次，此后每次滑动调用一次。
    ///
    /// # Arguments
    /// * `snapshot`: 按时间升序排列的窗口快照。
    fn on_window_updated(&self, snapshot: &[Candle]);

    /// # Summary
    /// 接收初始可见区间。
    ///
    /// # Logic
    /// 仅在窗口初始化后调用一次；默认忽略。
    ///
    /// # Arguments
    /// * `range`: 首尾各外扩半个窗口跨度后的时间区间。
    fn on_visible_range(&self, _range: VisibleRange) {}
}

/// # Summary
/// 偏置状态订阅者（状态徽章）接口。
pub trait BiasObserver: Send + Sync {
    /// 偏置状态变化（或引擎启动）时回调。
    fn on_bias_changed(&self, state: BiasState);
}

/// # Summary
/// 去抖后的重绘尺寸接收方。
///
/// # Invariants
/// - 每个静默窗口最多收到一次回调，且为静默开始时的最终尺寸。
pub trait ViewportSink: Send + Sync {
    fn on_resize(&self, viewport: Viewport);
}
