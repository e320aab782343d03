//! 进度报告
//!
//! 每处理完一个文件报告一次 `(已完成比例, 当前条目说明)`

use tracing::info;

/// 进度回调
pub trait ProgressReporter {
    fn report(&mut self, fraction: f32, label: &str);
}

impl<F> ProgressReporter for F
where
    F: FnMut(f32, &str),
{
    fn report(&mut self, fraction: f32, label: &str) {
        self(fraction, label)
    }
}

/// 把进度写到日志
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&mut self, fraction: f32, label: &str) {
        info!("[{:>5.1}%] {}", fraction * 100.0, label);
    }
}

/// 不报告进度
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _fraction: f32, _label: &str) {}
}

/// `index / count`，count 为 0 时返回 0
pub fn fraction(index: usize, count: usize) -> f32 {
    if count == 0 {
        0.0
    } else {
        index as f32 / count as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_reporter() {
        let mut seen = Vec::new();
        {
            let mut reporter = |f: f32, label: &str| seen.push((f, label.to_string()));
            reporter.report(fraction(1, 4), "Grading 2/4: b.py");
        }
        assert_eq!(seen, vec![(0.25, "Grading 2/4: b.py".to_string())]);
        assert_eq!(fraction(0, 0), 0.0);
    }
}
