use candlefeed_core::market::error::ChartError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// # Summary
/// 调度器运行状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// 调度闸门：每次 tick 先在锁内确认本轮仍有效
#[derive(Debug)]
struct Gate {
    state: SchedulerState,
    // 每次 start 递增，旧协程凭此识别自己已过期
    epoch: u64,
    handle: Option<AbortHandle>,
}

/// # Summary
/// 固定周期的 tick 调度器。
///
/// # Invariants
/// - 首次 tick 发生在 start 之后一个完整周期。
/// - tick 不合并也不跳过 (`MissedTickBehavior::Burst`)。
/// - 是否触发在闸门锁内判定，回调在释放锁之后执行，回调内可以调用 `stop`/`state`。
/// - `stop` 之后协程在下一次判定时退出，不会为过期的一轮再触发回调。
pub struct UpdateScheduler {
    // tick 周期
    period: Duration,
    // 与后台协程共享的闸门
    gate: Arc<Mutex<Gate>>,
}

impl UpdateScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            gate: Arc::new(Mutex::new(Gate {
                state: SchedulerState::Idle,
                epoch: 0,
                handle: None,
            })),
        }
    }

    /// # Summary
    /// 启动周期 tick。
    ///
    /// # Logic
    /// 1. 已在运行则拒绝。
    /// 2. 递增 epoch 并切换到 Running。
    /// 3. 在当前 tokio 运行时上启动后台协程，每个周期在闸门锁内确认 epoch，释放锁后调用一次 `on_tick`。
    ///
    /// # Arguments
    /// * `on_tick`: 每次 tick 的同步回调。
    ///
    /// # Returns
    /// 成功返回 Ok，重复启动返回 `ChartError::AlreadyRunning`。
    pub fn start<F>(&self, mut on_tick: F) -> Result<(), ChartError>
    where
        F: FnMut() + Send + 'static,
    {
        let mut gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        if gate.state == SchedulerState::Running {
            return Err(ChartError::AlreadyRunning);
        }
        gate.epoch += 1;
        gate.state = SchedulerState::Running;

        let epoch = gate.epoch;
        let period = self.period;
        let first_tick = Instant::now() + period;
        let shared = Arc::clone(&self.gate);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(first_tick, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                let current = {
                    let gate = shared.lock().unwrap_or_else(|e| e.into_inner());
                    gate.state == SchedulerState::Running && gate.epoch == epoch
                };
                if !current {
                    debug!("Scheduler run {} is stale, exiting", epoch);
                    break;
                }
                on_tick();
            }
        });
        gate.handle = Some(handle.abort_handle());

        info!("Update scheduler started, period {:?}", period);
        Ok(())
    }

    /// # Summary
    /// 停止周期 tick。
    ///
    /// # Logic
    /// 1. 切回 Idle 并中止后台协程。
    /// 2. 可以在 tick 回调内部调用。
    /// 3. 未运行时为空操作，可重复调用。
    pub fn stop(&self) {
        let mut gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = gate.handle.take() {
            handle.abort();
        }
        if gate.state == SchedulerState::Running {
            gate.state = SchedulerState::Idle;
            info!("Update scheduler stopped");
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.gate.lock().unwrap_or_else(|e| e.into_inner()).state
    }
}

impl Drop for UpdateScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn counting(scheduler: &UpdateScheduler) -> Arc<AtomicUsize> {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        scheduler
            .start(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        ticks
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_tick_per_period() {
        let scheduler = UpdateScheduler::new(Duration::from_secs(10));
        let ticks = counting(&scheduler);
        assert_eq!(scheduler.state(), SchedulerState::Running);

        // 首次 tick 不会立即触发
        sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(20)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_after_stop() {
        let scheduler = UpdateScheduler::new(Duration::from_secs(10));
        let ticks = counting(&scheduler);
        sleep(Duration::from_millis(10_500)).await;
        scheduler.stop();
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        sleep(Duration::from_secs(100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_start_rejected_twice() {
        let scheduler = UpdateScheduler::new(Duration::from_secs(10));
        scheduler.stop();
        scheduler.stop();
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        let _ticks = counting(&scheduler);
        assert_eq!(scheduler.start(|| {}), Err(ChartError::AlreadyRunning));
        scheduler.stop();
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_does_not_revive_previous_run() {
        let scheduler = UpdateScheduler::new(Duration::from_secs(10));
        let first = counting(&scheduler);
        sleep(Duration::from_secs(5)).await;
        scheduler.stop();
        let second = counting(&scheduler);

        sleep(Duration::from_millis(10_500)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_callback_can_stop_its_scheduler() {
        let scheduler = Arc::new(UpdateScheduler::new(Duration::from_secs(10)));
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let weak = Arc::downgrade(&scheduler);
        scheduler
            .start(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                if let Some(scheduler) = weak.upgrade() {
                    assert_eq!(scheduler.state(), SchedulerState::Running);
                    scheduler.stop();
                }
            })
            .unwrap();

        sleep(Duration::from_secs(45)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }
}
