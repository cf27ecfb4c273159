use candlefeed_core::market::entity::Viewport;
use std::io::BufRead;
use std::str::FromStr;
use tokio::sync::mpsc;

/// # Summary
/// 控制台输入命令，替代指针点击与窗口 resize 事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // 点击图表区域
    Tap,
    // 视口尺寸变化
    Resize(Viewport),
    // 退出
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let head = parts.next().map(str::to_lowercase);
        let command = match head.as_deref() {
            Some("tap") | Some("t") => Command::Tap,
            Some("quit") | Some("q") | Some("exit") => Command::Quit,
            Some("resize") | Some("r") => {
                let mut dimension = |name: &str| -> Result<u32, String> {
                    parts
                        .next()
                        .ok_or_else(|| format!("resize: missing {}", name))?
                        .parse::<u32>()
                        .map_err(|e| format!("resize: bad {}: {}", name, e))
                };
                let width = dimension("width")?;
                let height = dimension("height")?;
                Command::Resize(Viewport { width, height })
            }
            Some(other) => return Err(format!("Unknown command: {}", other)),
            None => return Err("Empty command".to_string()),
        };
        if parts.next().is_some() {
            return Err(format!("Trailing arguments in: {}", s.trim()));
        }
        Ok(command)
    }
}

/// # Summary
/// 在独立线程中阻塞读取 stdin，逐行送入事件循环。
///
/// # Logic
/// 读取线程与事件循环解耦，退出时无需等待挂起的读操作；
/// 输入结束或接收端关闭时线程自行退出。
///
/// # Returns
/// 行接收端；线程创建失败时返回 IO 错误。
pub fn spawn_reader() -> std::io::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(64);
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}
