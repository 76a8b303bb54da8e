use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Barrier progress: one tick per observed worker completion
///
/// Only the coordinator touches the bar, so workers stay free of any shared state.
#[derive(Clone)]
pub struct PartitionProgress {
    bar: ProgressBar,
    failed: usize,
}

impl PartitionProgress {
    pub fn new(total_partitions: usize, label: &str) -> Self {
        let style = ProgressStyle::with_template(
            "{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} partitions {spinner} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");

        let bar = ProgressBar::with_draw_target(
            Some(total_partitions as u64),
            ProgressDrawTarget::stderr(),
        );
        bar.set_style(style);
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar, failed: 0 }
    }

    /// Progress that draws nothing, used by tests and quiet runs
    pub fn hidden(total_partitions: usize) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total_partitions as u64);
        Self { bar, failed: 0 }
    }

    /// Record one completion, in the order the barrier observed it
    pub fn record(&mut self, partition: usize, succeeded: bool) {
        if !succeeded {
            self.failed += 1;
        }
        self.bar.inc(1);
        if self.failed > 0 {
            self.bar
                .set_message(format!("partition {partition} done, {} failed", self.failed));
        } else {
            self.bar.set_message(format!("partition {partition} done"));
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
