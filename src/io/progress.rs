//! Progress bars for analysis repeats with a job bar for large batches

use std::sync::LazyLock;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::algorithm::batch::BatchObserver;
use crate::io::configuration::MAX_INDIVIDUAL_PROGRESS_BARS;

/// Coordinates progress display for analysis jobs
///
/// Shows one repeat bar per job for small batches. Larger batches get an
/// extra bar counting jobs, while the repeat bars roll over the most
/// recent jobs.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    batch_bar: Option<ProgressBar>,
    job_bars: Vec<ProgressBar>,
    /// Stores (`label`, `current_repeat`, `repeats`) for the rolling window
    job_states: Vec<(String, usize, usize)>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{msg} [{bar:30.cyan/blue}] {prefix}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] Jobs: [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

impl ProgressManager {
    /// Create a progress manager without bars
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            batch_bar: None,
            job_bars: Vec::new(),
            job_states: Vec::new(),
        }
    }

    /// Create the bars for a number of jobs
    pub fn initialize(&mut self, job_count: usize) {
        if job_count > MAX_INDIVIDUAL_PROGRESS_BARS + 1 {
            let batch_bar = ProgressBar::new(job_count as u64);
            batch_bar.set_style(BATCH_STYLE.clone());
            self.batch_bar = Some(self.multi_progress.add(batch_bar));
        }

        for _ in 0..job_count.min(MAX_INDIVIDUAL_PROGRESS_BARS) {
            let bar = ProgressBar::new(0);
            bar.set_style(PROGRESS_STYLE.clone());
            self.job_bars.push(self.multi_progress.add(bar));
        }
    }

    /// Number of jobs seen so far
    pub fn job_count(&self) -> usize {
        self.job_states.iter().filter(|(label, ..)| !label.is_empty()).count()
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.finish_with_message("All jobs processed");
        }
        let _ = self.multi_progress.clear();
    }

    // Show the most recent jobs in the available bars
    fn update_bars(&self) {
        let active: Vec<&(String, usize, usize)> = self
            .job_states
            .iter()
            .filter(|(label, ..)| !label.is_empty())
            .collect();
        let start = active.len().saturating_sub(MAX_INDIVIDUAL_PROGRESS_BARS);
        let visible = active.get(start..).unwrap_or(&[]);

        for (bar_index, (label, current, max)) in visible.iter().enumerate() {
            if let Some(bar) = self.job_bars.get(bar_index) {
                bar.set_length(*max as u64);
                bar.set_position(*current as u64);
                let width = max.to_string().len();
                bar.set_message(format!("{current:>width$}/{max}"));
                bar.set_prefix(label.clone());
            }
        }

        for bar in self.job_bars.iter().skip(visible.len()) {
            bar.set_length(0);
            bar.set_position(0);
            bar.set_message(String::new());
            bar.set_prefix(String::new());
        }
    }
}

impl BatchObserver for ProgressManager {
    fn job_started(&mut self, index: usize, label: &str, repeats: usize) {
        if index >= self.job_states.len() {
            self.job_states.resize(index + 1, (String::new(), 0, 0));
        }
        if let Some(state) = self.job_states.get_mut(index) {
            *state = (label.to_string(), 0, repeats);
        }
        self.update_bars();
    }

    fn repeat_finished(&mut self, index: usize, repeat: usize) {
        if let Some(state) = self.job_states.get_mut(index) {
            state.1 = repeat;
        }
        self.update_bars();
    }

    fn job_finished(&mut self, index: usize) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.inc(1);
        }
        if let Some(state) = self.job_states.get_mut(index) {
            state.0 = format!("✓ {}", state.0);
            state.1 = state.2;
        }
        self.update_bars();
    }
}
