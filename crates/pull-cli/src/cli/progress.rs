//! Terminal progress: one spinner line per chunk.

use std::sync::Mutex;

use indicatif::{HumanBytes, MultiProgress, ProgressBar, ProgressStyle};
use pull_core::progress::ProgressSnapshot;
use pull_core::render::ProgressSink;
use pull_core::segmenter::ChunkRange;

const TICK_CHARS: &str = "⠄⠆⠇⠋⠙⠸⠰⠠⠰⠸⠙⠋⠇⠆✓";

/// Draws each chunk as `<spinner> Downloading: <start> to <end>  <pct>%`.
pub struct SpinnerSink {
    multi: MultiProgress,
    bars: Mutex<Vec<ProgressBar>>,
}

impl SpinnerSink {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(Vec::new()),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(TICK_CHARS)
    }
}

/// Whole percent, floored: 100 is only shown once a chunk is complete.
pub(crate) fn percent(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * 100.0).floor() as u64
}

pub(crate) fn chunk_label(chunk: &ChunkRange) -> String {
    format!(
        "Downloading: {} to {}",
        HumanBytes(chunk.start),
        HumanBytes(chunk.end)
    )
}

impl ProgressSink for SpinnerSink {
    fn started(&self, plan: &[ChunkRange]) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        for chunk in plan {
            let bar = self.multi.add(ProgressBar::new(100));
            bar.set_style(Self::style());
            bar.set_message(chunk_label(chunk));
            bars.push(bar);
        }
    }

    fn render(&self, snapshot: &ProgressSnapshot) {
        let Ok(bars) = self.bars.lock() else {
            return;
        };
        for (index, (bar, &fraction)) in bars.iter().zip(snapshot.fractions()).enumerate() {
            if bar.is_finished() {
                continue;
            }
            bar.set_position(percent(fraction));
            if snapshot.is_complete(index) {
                bar.finish();
            } else {
                bar.tick();
            }
        }
    }

    fn stopped(&self) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        for bar in bars.drain(..) {
            bar.finish_and_clear();
        }
        let _ = self.multi.clear();
    }

    fn merging(&self, index: usize, count: usize) {
        if index == 0 {
            eprintln!("Merging {} chunks...", count);
        }
        tracing::debug!(index, count, "merging chunk");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_floors_partial_progress() {
        assert_eq!(percent(0.0), 0);
        assert_eq!(percent(0.499), 49);
        assert_eq!(percent(1.0 - f64::EPSILON), 99);
        assert_eq!(percent(1.0), 100);
    }

    #[test]
    fn label_names_the_byte_span() {
        let chunk = ChunkRange {
            index: 1,
            start: 0,
            end: 2048,
        };
        assert_eq!(chunk_label(&chunk), "Downloading: 0 B to 2.00 KiB");
    }

    #[test]
    fn sink_tracks_plan_and_clears_on_stop() {
        let sink = SpinnerSink::new();
        sink.multi
            .set_draw_target(indicatif::ProgressDrawTarget::hidden());
        let plan = vec![
            ChunkRange { index: 0, start: 0, end: 10 },
            ChunkRange { index: 1, start: 10, end: 20 },
        ];
        sink.started(&plan);
        assert_eq!(sink.bars.lock().unwrap().len(), 2);
        sink.stopped();
        assert!(sink.bars.lock().unwrap().is_empty());
    }
}
