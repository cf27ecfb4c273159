use candlefeed_core::market::entity::{BiasState, Candle, Viewport, VisibleRange};
use candlefeed_core::market::port::{BiasObserver, ViewportSink, WindowObserver};
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;
use tracing::warn;

/// 输出到渲染端的一行事件
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Frame<'a> {
    Series { candles: &'a [Candle] },
    VisibleRange { from: i64, to: i64 },
    Bias { label: &'static str },
    Resize { width: u32, height: u32 },
}

/// # Summary
/// 无界面渲染端：把引擎的每次发布写成一行 JSON。
///
/// # Invariants
/// - 一次发布对应恰好一行输出；写失败只记录日志，不回传给引擎。
pub struct ConsoleRenderer<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// 取回底层写入端（仅供测试）
    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, frame: &Frame<'_>) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let written = serde_json::to_writer(&mut *out, frame)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(out))
            .and_then(|()| out.flush());
        if let Err(e) = written {
            warn!("Failed to render frame: {}", e);
        }
    }
}

impl<W: Write + Send> WindowObserver for ConsoleRenderer<W> {
    fn on_window_updated(&self, snapshot: &[Candle]) {
        self.emit(&Frame::Series { candles: snapshot });
    }

    fn on_visible_range(&self, range: VisibleRange) {
        self.emit(&Frame::VisibleRange {
            from: range.from,
            to: range.to,
        });
    }
}

impl<W: Write + Send> BiasObserver for ConsoleRenderer<W> {
    fn on_bias_changed(&self, state: BiasState) {
        self.emit(&Frame::Bias {
            label: state.label(),
        });
    }
}

impl<W: Write + Send> ViewportSink for ConsoleRenderer<W> {
    fn on_resize(&self, viewport: Viewport) {
        self.emit(&Frame::Resize {
            width: viewport.width,
            height: viewport.height,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(renderer: ConsoleRenderer<Vec<u8>>) -> Vec<serde_json::Value> {
        let bytes = renderer.into_inner();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_each_publication_is_one_json_line() {
        let renderer = ConsoleRenderer::new(Vec::new());
        let candles = [
            Candle::new(10, 100.0, 104.0, 98.0, 103.0),
            Candle::new(20, 103.0, 105.0, 95.0, 96.5),
        ];
        renderer.on_window_updated(&candles);
        renderer.on_visible_range(VisibleRange { from: 5, to: 25 });
        renderer.on_bias_changed(BiasState::Down);
        renderer.on_resize(Viewport {
            width: 1280,
            height: 300,
        });

        let frames = lines(renderer);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0]["event"], "series");
        assert_eq!(frames[0]["candles"][1]["direction"], "down");
        assert_eq!(frames[1]["event"], "visible_range");
        assert_eq!(frames[1]["to"], 25);
        assert_eq!(frames[2]["label"], "Decrease");
        assert_eq!(frames[3]["event"], "resize");
        assert_eq!(frames[3]["width"], 1280);
    }
}
