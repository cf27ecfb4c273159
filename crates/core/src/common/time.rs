use chrono::{DateTime, Utc};
use std::sync::RwLock;

/// # Summary
/// 时间供给器接口，用于隔离物理系统时钟。
/// 引擎只在窗口初始化时读取一次当前时间，之后的时间戳全部由 tick 间隔推导。
pub trait TimeProvider: Send + Sync {
    /// 获取当前挂载的时间
    fn now(&self) -> DateTime<Utc>;

    /// 当前时间截断到整秒后的 Unix 时间戳
    fn now_seconds(&self) -> i64 {
        self.now().timestamp()
    }
}

/// # Summary
/// 真实时钟，直接返回操作系统当前时间。
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// # Summary
/// 测试专用虚拟时钟，允许主动拨快或回退时间。
///
/// # Invariants
/// - 内部利用 `RwLock` 提供并发安全的读写；锁中毒时沿用内部值。
pub struct FakeClockProvider {
    current_time: RwLock<DateTime<Utc>>,
}

impl FakeClockProvider {
    /// 使用指定的初始时间创建虚拟时钟
    pub fn new(initial_time: DateTime<Utc>) -> Self {
        Self {
            current_time: RwLock::new(initial_time),
        }
    }

    /// 强制修改时钟的当前时间
    pub fn set_time(&self, new_time: DateTime<Utc>) {
        let mut time = self.current_time.write().unwrap_or_else(|e| e.into_inner());
        *time = new_time;
    }
}

impl TimeProvider for FakeClockProvider {
    fn now(&self) -> DateTime<Utc> {
        *self.current_time.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fake_clock_truncates_to_seconds() {
        let base = Utc.timestamp_opt(1_700_000_000, 999_000_000).unwrap();
        let clock = FakeClockProvider::new(base);
        assert_eq!(clock.now_seconds(), 1_700_000_000);

        clock.set_time(Utc.timestamp_opt(1_700_000_042, 0).unwrap());
        assert_eq!(clock.now_seconds(), 1_700_000_042);
    }
}
