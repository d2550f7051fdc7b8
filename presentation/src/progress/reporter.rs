//! Progress reporting for consultations

use colored::Colorize;
use council_application::ports::progress::ProgressNotifier;
use council_domain::{CouncilPhase, ExpertKind, SessionStatus};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports progress with one bar per phase
pub struct ProgressReporter {
    multi: MultiProgress,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            phase_bar: Mutex::new(None),
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(bar) = self.phase_bar.lock()
            && let Some(bar) = bar.as_ref()
        {
            f(bar);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// `v`/`x`/`-` marker for a finished session
fn status_mark(status: SessionStatus) -> String {
    match status {
        SessionStatus::Completed => "v".green().to_string(),
        SessionStatus::Cancelled => "-".yellow().to_string(),
        _ => "x".red().to_string(),
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_phase_start(&self, phase: &CouncilPhase, total_tasks: usize) {
        let bar = self.multi.add(ProgressBar::new(total_tasks as u64));
        bar.set_style(Self::phase_style());
        bar.set_prefix(phase.display_name());
        bar.set_message("Starting...");

        if let Ok(mut slot) = self.phase_bar.lock() {
            *slot = Some(bar);
        }
    }

    fn on_expert_start(&self, expert: ExpertKind, _session_id: &str) {
        self.with_bar(|bar| bar.set_message(format!("{} started", expert.display_name())));
    }

    fn on_expert_finish(&self, expert: ExpertKind, status: SessionStatus) {
        self.with_bar(|bar| {
            let mark = status_mark(status);
            bar.set_message(format!("{} {} ({})", mark, expert.display_name(), status));
            bar.inc(1);
        });
    }

    fn on_phase_complete(&self, phase: &CouncilPhase) {
        let bar = self.phase_bar.lock().ok().and_then(|mut slot| slot.take());
        if let Some(bar) = bar {
            if let Some(len) = bar.length() {
                bar.set_position(len);
            }
            bar.finish_with_message(format!("{} complete", phase.display_name().green()));
        }
    }
}

/// Plain line-based progress on stderr (no fancy UI)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_phase_start(&self, phase: &CouncilPhase, total_tasks: usize) {
        eprintln!("{} {} ({} tasks)", "->".cyan(), phase.display_name().bold(), total_tasks);
    }

    fn on_expert_finish(&self, expert: ExpertKind, status: SessionStatus) {
        eprintln!("  {} {} ({})", status_mark(status), expert.display_name(), status);
    }

    fn on_phase_complete(&self, _phase: &CouncilPhase) {}
}
