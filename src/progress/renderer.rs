//! Single-line terminal progress bar

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Visible width of the status column.
pub const STATUS_WIDTH: usize = 30;
/// Default number of glyphs in the bar.
pub const BAR_WIDTH: usize = 40;

/// Values behind one bar. `current` may be written out of range; it is
/// clamped when read.
#[derive(Debug, Clone)]
pub struct ProgressState {
    current: f64,
    total: f64,
    status: String,
    started: Instant,
}

impl ProgressState {
    pub fn new(total: f64, status: impl Into<String>) -> Self {
        Self {
            current: 0.0,
            total,
            status: status.into(),
            started: Instant::now(),
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Integer percentage, clamped to 0..=100
    pub fn percent(&self) -> u64 {
        if self.total <= 0.0 {
            return 0;
        }
        let pct = (self.current / self.total * 100.0).floor();
        pct.clamp(0.0, 100.0) as u64
    }

    /// Status column: truncated with `...` or right-padded to a fixed width
    pub fn status_text(&self) -> String {
        if self.status.chars().count() > STATUS_WIDTH {
            let head: String = self.status.chars().take(STATUS_WIDTH - 3).collect();
            format!("{head}...")
        } else {
            format!("{:<width$}", self.status, width = STATUS_WIDTH)
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Terminal renderer for a [`ProgressState`].
///
/// Dropping a renderer that was never completed clears its line, so an
/// error printed afterwards is not overdrawn.
pub struct ProgressRenderer {
    state: ProgressState,
    bar: ProgressBar,
}

impl ProgressRenderer {
    /// Bar drawn on stdout (hidden automatically when stdout is not a tty)
    pub fn new(total: f64, status: impl Into<String>) -> Self {
        Self::with_target(total, status, ProgressDrawTarget::stdout())
    }

    /// Bar that tracks state but never draws
    pub fn hidden(total: f64, status: impl Into<String>) -> Self {
        Self::with_target(total, status, ProgressDrawTarget::hidden())
    }

    pub fn with_target(total: f64, status: impl Into<String>, target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(100), target);
        bar.set_style(bar_style(BAR_WIDTH));
        let renderer = Self {
            state: ProgressState::new(total, status),
            bar,
        };
        renderer.render();
        renderer
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn update(&mut self, current: f64, status: &str) {
        self.state.current = current;
        if !status.is_empty() {
            self.state.status = status.to_string();
        }
        self.render();
    }

    pub fn increment(&mut self, status: &str) {
        let next = self.state.current + 1.0;
        self.update(next, status);
    }

    pub fn render(&self) {
        self.bar.set_position(self.state.percent());
        self.bar.set_message(self.state.status_text());
    }

    /// Fill the bar, show `message` and end the line
    pub fn complete(&mut self, message: &str) {
        self.state.current = self.state.total;
        self.state.status = message.to_string();
        self.render();
        self.bar.finish();
    }

    /// Blank the line so the next message starts clean
    pub fn clear(&mut self) {
        self.bar.finish_and_clear();
    }

    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

impl Drop for ProgressRenderer {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

fn bar_style(width: usize) -> ProgressStyle {
    let template = format!("  {{bar:{width}.green}} {{pos:>3}}% | {{elapsed_secs}} | {{msg}}");
    ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key(
            "elapsed_secs",
            |state: &indicatif::ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = write!(w, "{:.1}s", state.elapsed().as_secs_f64());
            },
        )
        .progress_chars("█░")
}
