use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use pipelens::notify::ProgressEvent;

use super::styling::{bright, failure, success, warning};

const SPINNER_TEMPLATE: &str = "  {msg} {spinner}";
const BAR_TEMPLATE: &str = "  {msg} [{bar:30.cyan/blue}] {pos}/{len}";

/// Renders aggregation progress events on stderr.
///
/// Starts as a spinner showing status messages, switches to a bar once the
/// skeleton arrives and advances it with every batch.
pub struct CatalogProgress {
    pb: ProgressBar,
    failed: bool,
}

impl CatalogProgress {
    pub fn start() -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Pipelines").underlined());
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(spinner_style());
        pb.set_message(warning("Starting").to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb, failed: false }
    }

    pub fn handle(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::StatusMessage { message } => {
                self.failed = message.starts_with("Failed") || message.contains("timed out");
                let text = if self.failed {
                    failure(message)
                } else {
                    warning(message)
                };
                self.pb.set_message(text.to_string());
            }
            ProgressEvent::Skeleton { pipelines } => {
                self.pb.set_style(bar_style());
                self.pb.set_length(pipelines.len() as u64);
                self.pb.set_position(0);
                self.pb.set_message(
                    warning(format!("Enriching {} pipelines", pipelines.len())).to_string(),
                );
            }
            ProgressEvent::Batch {
                processed, total, ..
            } => {
                self.pb.set_length(*total as u64);
                self.pb.set_position(*processed as u64);
            }
            ProgressEvent::Complete { summary } => {
                let mut text = format!(
                    "Loaded {} pipelines in {:.1}s",
                    summary.total_count,
                    Duration::from_millis(summary.elapsed_ms).as_secs_f64()
                );
                if summary.items_with_warnings > 0 {
                    text.push_str(&format!(" ({} with warnings)", summary.items_with_warnings));
                }
                self.pb
                    .finish_with_message(success(format!("{text} ✓")).to_string());
            }
        }
    }

    /// Stops the display; a bar left unfinished by a failure keeps its last message.
    pub fn finish(self) {
        if !self.pb.is_finished() {
            if self.failed {
                self.pb.abandon();
            } else {
                self.pb.finish();
            }
        }
        eprintln!();
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}
