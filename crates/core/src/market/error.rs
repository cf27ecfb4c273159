use thiserror::Error;

/// # Summary
/// 图表引擎域错误枚举。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 生成逻辑本身是全函数，这里只承载不变量破坏与生命周期误用。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    // 窗口为空时无法延续价格路径（初始化后不应出现）
    #[error("Data window is empty, nothing to continue from")]
    EmptyWindow,
    // 重复启动
    #[error("Engine already running")]
    AlreadyRunning,
    // 引擎未运行（未启动或已停止）
    #[error("Engine is not running")]
    NotRunning,
    // 配置值非法
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
