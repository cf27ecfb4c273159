use crate::bias::BiasController;
use crate::factory::CandleFactory;
use crate::resize::ResizeSignal;
use crate::scheduler::UpdateScheduler;
use crate::window::DataWindow;
use candlefeed_core::common::time::TimeProvider;
use candlefeed_core::config::ChartConfig;
use candlefeed_core::market::entity::{BiasState, Candle, Viewport};
use candlefeed_core::market::error::ChartError;
use candlefeed_core::market::port::{BiasObserver, ViewportSink, WindowObserver};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// # Summary
/// 引擎对外协作方集合，由调用方组装后注入。
pub struct EnginePorts {
    // 窗口快照订阅者（图表渲染）
    pub window: Arc<dyn WindowObserver>,
    // 偏置状态订阅者（状态徽章）
    pub bias: Arc<dyn BiasObserver>,
    // 去抖后的重绘尺寸接收方
    pub viewport: Arc<dyn ViewportSink>,
}

/// # Summary
/// 引擎生命周期状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Idle,
    Running,
}

/// 窗口与随机源总是一起被修改
struct Series {
    window: DataWindow,
    rng: StdRng,
    // start 时置位，stop 时清除；滑动前在同一把锁内检查
    live: bool,
}

/// # Summary
/// tick 回调与引擎共享的行情推进部分。
///
/// # Invariants
/// - 订阅者回调总在释放窗口锁之后执行，回调内可以重入引擎。
struct SeriesFeed {
    factory: CandleFactory,
    bias: BiasController,
    series: Mutex<Series>,
    observer: Arc<dyn WindowObserver>,
}

impl SeriesFeed {
    /// # Summary
    /// 滑动一格并发布快照。
    ///
    /// # Logic
    /// 1. 在窗口锁内确认仍处于运行期，读取当前偏置并滑动，取出快照。
    /// 2. 释放锁后再发布快照。
    ///
    /// # Returns
    /// 新追加的 K 线；已停止返回 `ChartError::NotRunning`，空窗口返回 `ChartError::EmptyWindow`。
    fn slide(&self) -> Result<Candle, ChartError> {
        let (candle, snapshot) = {
            let mut series = self.series.lock().unwrap_or_else(|e| e.into_inner());
            if !series.live {
                return Err(ChartError::NotRunning);
            }
            let Series { window, rng, .. } = &mut *series;
            let candle = window.slide(&self.factory, rng, self.bias.current())?;
            (candle, window.snapshot())
        };
        self.observer.on_window_updated(&snapshot);
        Ok(candle)
    }

    /// 结束运行期，此后的滑动全部被拒绝
    fn halt(&self) {
        self.series.lock().unwrap_or_else(|e| e.into_inner()).live = false;
    }
}

/// # Summary
/// 合成行情引擎，持有窗口、偏置、调度器与 resize 去抖器。
///
/// # Invariants
/// - 窗口只在 `start` 时初始化，此后只能通过滑动修改。
/// - 偏置只由 `tap` 修改，`start`（重新初始化）时复位为 Neutral。
/// - `stop` 幂等，未启动时调用也是安全的；析构时自动调用。
pub struct ChartEngine {
    // 时钟，仅初始化时读取
    clock: Arc<dyn TimeProvider>,
    // 与 tick 协程共享的行情推进部分
    feed: Arc<SeriesFeed>,
    // 周期调度器
    scheduler: UpdateScheduler,
    // resize 去抖器
    resize: ResizeSignal,
    // 偏置订阅者
    bias_observer: Arc<dyn BiasObserver>,
    // 生命周期状态，同时充当输入订阅的开关
    status: Mutex<EngineStatus>,
}

impl ChartEngine {
    /// # Summary
    /// 构建引擎（不启动任何计时器）。
    ///
    /// # Logic
    /// 1. 校验配置。
    /// 2. 按 `seed` 构造确定性随机源，未配置时使用系统熵。
    /// 3. 创建空窗口、调度器与去抖器。
    ///
    /// # Arguments
    /// * `config`: 图表配置。
    /// * `clock`: 时间供给器。
    /// * `ports`: 外部协作方。
    ///
    /// # Returns
    /// 成功返回处于 Idle 的引擎，配置非法返回 `ChartError::InvalidConfig`。
    pub fn new(
        config: &ChartConfig,
        clock: Arc<dyn TimeProvider>,
        ports: EnginePorts,
    ) -> Result<Self, ChartError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let feed = Arc::new(SeriesFeed {
            factory: CandleFactory::new(config),
            bias: BiasController::new(),
            series: Mutex::new(Series {
                window: DataWindow::new(config.window_len, config.tick_interval),
                rng,
                live: false,
            }),
            observer: ports.window,
        });

        Ok(Self {
            clock,
            feed,
            scheduler: UpdateScheduler::new(config.tick_period()),
            resize: ResizeSignal::new(config.resize_debounce(), ports.viewport),
            bias_observer: ports.bias,
            status: Mutex::new(EngineStatus::Idle),
        })
    }

    /// # Summary
    /// 初始化窗口并开始周期推进。必须在 tokio 运行时内调用。
    ///
    /// # Logic
    /// 1. 已在运行则拒绝。
    /// 2. 偏置复位为 Neutral。
    /// 3. 从时钟当前整秒开始填满窗口，取出快照与初始可见区间。
    /// 4. 启动调度器，每个 tick 滑动一格并发布。
    /// 5. 释放所有锁后依次发布偏置、快照与可见区间。
    ///
    /// # Returns
    /// 成功返回 Ok，重复启动返回 `ChartError::AlreadyRunning`。
    pub fn start(&self) -> Result<(), ChartError> {
        let start_time = self.clock.now_seconds();
        let (snapshot, range) = {
            let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
            if *status == EngineStatus::Running {
                return Err(ChartError::AlreadyRunning);
            }

            self.feed.bias.reset();
            let published = {
                let mut series = self.feed.series.lock().unwrap_or_else(|e| e.into_inner());
                let Series { window, rng, live } = &mut *series;
                window.initialize(&self.feed.factory, rng, BiasState::Neutral, start_time);
                *live = true;
                (window.snapshot(), window.visible_range())
            };

            let feed = Arc::clone(&self.feed);
            let started = self.scheduler.start(move || match feed.slide() {
                Ok(candle) => debug!(
                    "Tick appended candle at {} (close {:.2})",
                    candle.time, candle.close
                ),
                Err(ChartError::NotRunning) => debug!("Tick skipped, engine stopped"),
                Err(e) => error!("Tick failed: {}", e),
            });
            if let Err(e) = started {
                self.feed.halt();
                return Err(e);
            }

            *status = EngineStatus::Running;
            published
        };
        info!("Chart engine started at {}", start_time);

        self.bias_observer.on_bias_changed(BiasState::Neutral);
        self.feed.observer.on_window_updated(&snapshot);
        if let Some(range) = range {
            self.feed.observer.on_visible_range(range);
        }
        Ok(())
    }

    /// # Summary
    /// 处理一次点击：推进偏置并发布。
    ///
    /// # Logic
    /// 未运行时输入订阅视为已释放，忽略点击。发布在释放状态锁之后进行。
    ///
    /// # Returns
    /// 处理后的当前偏置。
    pub fn tap(&self) -> BiasState {
        let state = {
            let status = self.status.lock().unwrap_or_else(|e| e.into_inner());
            if *status != EngineStatus::Running {
                debug!("Tap ignored, engine not running");
                return self.feed.bias.current();
            }
            self.feed.bias.advance()
        };
        debug!("Bias advanced to {}", state);
        self.bias_observer.on_bias_changed(state);
        state
    }

    /// 转发原始 resize 通知，未运行时忽略。
    pub fn resize(&self, viewport: Viewport) {
        let status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        if *status == EngineStatus::Running {
            self.resize.notify(viewport);
        }
    }

    /// # Summary
    /// 立即滑动一格并发布，与一次 tick 等价。
    ///
    /// # Returns
    /// 新追加的 K 线；未启动或已停止时返回 `ChartError::NotRunning`，窗口不变。
    pub fn slide_now(&self) -> Result<Candle, ChartError> {
        self.feed.slide()
    }

    /// 当前窗口的有序快照
    pub fn snapshot(&self) -> Vec<Candle> {
        self.feed
            .series
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .window
            .snapshot()
    }

    pub fn bias(&self) -> BiasState {
        self.feed.bias.current()
    }

    pub fn status(&self) -> EngineStatus {
        *self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// # Summary
    /// 拆除引擎。
    ///
    /// # Logic
    /// 1. 停止调度器，并在窗口锁内结束运行期，之后任何滑动都被拒绝。
    /// 2. 取消挂起的去抖计时器。
    /// 3. 切回 Idle，后续点击与 resize 被忽略。
    pub fn stop(&self) {
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        self.scheduler.stop();
        self.feed.halt();
        self.resize.cancel();
        if *status == EngineStatus::Running {
            *status = EngineStatus::Idle;
            info!("Chart engine stopped");
        }
    }
}

impl Drop for ChartEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
