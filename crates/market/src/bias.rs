use candlefeed_core::market::entity::BiasState;
use std::sync::Mutex;

/// # Summary
/// 方向偏置控制器，持有当前的 `BiasState`。
///
/// # Invariants
/// - 只有点击处理路径调用 `advance`，生成路径只读。
/// - 每次切换是单步赋值，读者总能看到最近一次完成的切换。
#[derive(Debug, Default)]
pub struct BiasController {
    state: Mutex<BiasState>,
}

impl BiasController {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Summary
    /// 推进到循环中的下一个状态。
    ///
    /// # Logic
    /// `Neutral -> Up -> Down -> Neutral`，高频连续调用时每次只前进一步。
    ///
    /// # Returns
    /// 切换后的状态。
    pub fn advance(&self) -> BiasState {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = state.next();
        *state
    }

    /// 读取当前状态，不做修改。
    pub fn current(&self) -> BiasState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 回到 `Neutral`，仅在引擎重新初始化时使用。
    pub fn reset(&self) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = BiasState::Neutral;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_advances_return_to_neutral() {
        let bias = BiasController::new();
        assert_eq!(bias.current(), BiasState::Neutral);
        assert_eq!(bias.advance(), BiasState::Up);
        assert_eq!(bias.advance(), BiasState::Down);
        assert_eq!(bias.advance(), BiasState::Neutral);
    }

    #[test]
    fn test_current_does_not_mutate() {
        let bias = BiasController::new();
        bias.advance();
        assert_eq!(bias.current(), BiasState::Up);
        assert_eq!(bias.current(), BiasState::Up);
    }

    #[test]
    fn test_rapid_taps_and_reset() {
        let bias = BiasController::new();
        for _ in 0..301 {
            bias.advance();
        }
        // 301 % 3 == 1
        assert_eq!(bias.current(), BiasState::Up);
        bias.reset();
        assert_eq!(bias.current(), BiasState::Neutral);
    }
}
