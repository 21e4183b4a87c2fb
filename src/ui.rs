//! Terminal output for a backlog run — spinner and colored summary.
//!
//! Uses `indicatif` for the run spinner and `console` for styling. The
//! per-record lines are printed by the pipeline as it goes; this module
//! frames the run and renders the final summary.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::pipeline::RunSummary;

/// Visual indicator for a backlog run in the terminal.
pub struct RunProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl RunProgress {
    /// Start the spinner and return the progress handle.
    pub fn start() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message("processing pending backlog");
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Stop the spinner and print the one-line run result.
    pub fn complete(&self, summary: &RunSummary) {
        self.pb.finish_and_clear();
        let line = format!(
            "{} processed: {} done, {} failed, {} skipped, {} items",
            summary.processed, summary.succeeded, summary.failed, summary.skipped, summary.items
        );
        if summary.failed == 0 {
            println!("  {} {line}", self.green.apply_to("✓"));
        } else if summary.succeeded > 0 {
            println!("  {} {line}", self.yellow.apply_to("!"));
        } else {
            println!("  {} {line}", self.red.apply_to("✗"));
        }
    }

    /// Print the full run summary as styled JSON.
    pub fn print_summary(&self, summary: &RunSummary) {
        let heading = if summary.failed == 0 {
            &self.green
        } else {
            &self.yellow
        };
        println!();
        println!("{}", heading.apply_to("─── Run Summary ───"));
        println!(
            "{}",
            serde_json::to_string_pretty(summary).unwrap_or_default()
        );
    }
}
