use candlefeed_core::market::entity::Viewport;
use candlefeed_core::market::port::ViewportSink;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
struct Debounce {
    // 静默窗口内最近一次收到的尺寸
    pending: Option<Viewport>,
    // 每次 notify / cancel 递增，过期的计时器据此放弃发射
    generation: u64,
    timer: Option<AbortHandle>,
}

/// # Summary
/// resize 去抖适配器。
///
/// # Invariants
/// - 最后一次原始通知之后静默满 `debounce` 才发射一次，载荷为最后一次的尺寸。
/// - 同一时刻至多一个挂起的计时器。
/// - `cancel` 返回后不会再有发射，直到下一次 `notify`。
pub struct ResizeSignal {
    debounce: Duration,
    sink: Arc<dyn ViewportSink>,
    state: Arc<Mutex<Debounce>>,
}

impl ResizeSignal {
    pub fn new(debounce: Duration, sink: Arc<dyn ViewportSink>) -> Self {
        Self {
            debounce,
            sink,
            state: Arc::new(Mutex::new(Debounce::default())),
        }
    }

    /// # Summary
    /// 接收一次原始 resize 通知。
    ///
    /// # Logic
    /// 1. 以当前时刻计算截止时间。
    /// 2. 覆盖挂起尺寸并中止旧计时器。
    /// 3. 启动新计时器，到期时在锁内确认自己仍是最新一代并取走尺寸，释放锁后发射。
    ///
    /// # Arguments
    /// * `viewport`: 新的视口尺寸。
    pub fn notify(&self, viewport: Viewport) {
        let deadline = Instant::now() + self.debounce;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.generation += 1;
        state.pending = Some(viewport);
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        let generation = state.generation;
        let shared = Arc::clone(&self.state);
        let sink = Arc::clone(&self.sink);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let settled = {
                let mut state = shared.lock().unwrap_or_else(|e| e.into_inner());
                if state.generation != generation {
                    return;
                }
                state.timer = None;
                state.pending.take()
            };
            if let Some(viewport) = settled {
                debug!("Resize settled at {}x{}", viewport.width, viewport.height);
                sink.on_resize(viewport);
            }
        });
        state.timer = Some(handle.abort_handle());
    }

    /// 取消挂起的计时器，可重复调用。
    pub fn cancel(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.generation += 1;
        state.pending = None;
        if let Some(timer) = state.timer.take() {
            timer.abort();
            debug!("Pending resize cancelled");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pending
            .is_some()
    }
}

impl Drop for ResizeSignal {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candlefeed_core::testing::RecordingViewportSink;
    use tokio::time::sleep;

    fn viewport(width: u32, height: u32) -> Viewport {
        Viewport { width, height }
    }

    fn setup() -> (ResizeSignal, Arc<RecordingViewportSink>) {
        let sink = Arc::new(RecordingViewportSink::new());
        let signal = ResizeSignal::new(Duration::from_millis(300), sink.clone());
        (signal, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_emits_once_with_final_size() {
        let (signal, sink) = setup();
        let start = Instant::now();

        signal.notify(viewport(800, 600));
        sleep(Duration::from_millis(50)).await;
        signal.notify(viewport(900, 600));
        sleep(Duration::from_millis(50)).await;
        signal.notify(viewport(1000, 650));
        sleep(Duration::from_millis(50)).await;
        signal.notify(viewport(1024, 768));

        sleep(Duration::from_millis(280)).await;
        assert_eq!(sink.count(), 0);
        assert!(signal.is_pending());

        sleep(Duration::from_millis(40)).await;
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1, viewport(1024, 768));
        let elapsed = events[0].0 - start;
        assert!(elapsed >= Duration::from_millis(450) && elapsed < Duration::from_millis(460));
        assert!(!signal.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_silences_emit_separately() {
        let (signal, sink) = setup();
        signal.notify(viewport(640, 480));
        sleep(Duration::from_millis(400)).await;
        signal.notify(viewport(1280, 720));
        sleep(Duration::from_millis(400)).await;

        let sizes: Vec<_> = sink.events().into_iter().map(|(_, v)| v).collect();
        assert_eq!(sizes, vec![viewport(640, 480), viewport(1280, 720)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_emission() {
        let (signal, sink) = setup();
        signal.cancel();

        signal.notify(viewport(640, 480));
        sleep(Duration::from_millis(100)).await;
        signal.cancel();
        signal.cancel();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(sink.count(), 0);
        assert!(!signal.is_pending());
    }

    /// 收到尺寸后把宽度收窄一半再通知回去，只做一次
    struct ShrinkingSink {
        signal: std::sync::OnceLock<std::sync::Weak<ResizeSignal>>,
        seen: Mutex<Vec<Viewport>>,
    }

    impl ViewportSink for ShrinkingSink {
        fn on_resize(&self, viewport: Viewport) {
            let first = {
                let mut seen = self.seen.lock().unwrap();
                seen.push(viewport);
                seen.len() == 1
            };
            if !first {
                return;
            }
            if let Some(signal) = self.signal.get().and_then(|w| w.upgrade()) {
                signal.notify(Viewport {
                    width: viewport.width / 2,
                    height: viewport.height,
                });
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_can_notify_from_its_callback() {
        let sink = Arc::new(ShrinkingSink {
            signal: std::sync::OnceLock::new(),
            seen: Mutex::new(Vec::new()),
        });
        let signal = Arc::new(ResizeSignal::new(Duration::from_millis(300), sink.clone()));
        sink.signal.set(Arc::downgrade(&signal)).unwrap();

        signal.notify(viewport(1000, 500));
        sleep(Duration::from_millis(350)).await;
        assert!(signal.is_pending());

        sleep(Duration::from_millis(350)).await;
        assert_eq!(
            *sink.seen.lock().unwrap(),
            vec![viewport(1000, 500), viewport(500, 500)]
        );
        assert!(!signal.is_pending());
    }
}
