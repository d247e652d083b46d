//! Percentage estimation from free-form tool output

use super::profiles::{Label, OVERALL_CEILING, ProgressProfile};

/// Which pipe a chunk came from; each keeps its own unfinished line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Turns output chunks and clock ticks into a monotone percentage.
///
/// Both producers go through one `bump` step, so the value only
/// moves forward and stays at or below [`OVERALL_CEILING`] until
/// [`ProgressEstimator::finish_success`].
#[derive(Debug, Clone)]
pub struct ProgressEstimator {
    profile: ProgressProfile,
    current: f64,
    status: String,
    matched_any: bool,
    /// Trailing bytes without a line terminator, per stream
    partial: [Vec<u8>; 2],
}

impl ProgressEstimator {
    pub fn new(profile: ProgressProfile) -> Self {
        let status = profile.initial_status.to_string();
        Self {
            profile,
            current: 0.0,
            status,
            matched_any: false,
            partial: [Vec::new(), Vec::new()],
        }
    }

    pub fn profile(&self) -> &ProgressProfile {
        &self.profile
    }

    pub fn percent(&self) -> f64 {
        self.current
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Raise toward `current + increment`, never above `ceiling`, never down.
    fn bump(&mut self, increment: f64, ceiling: f64) {
        let ceiling = ceiling.min(OVERALL_CEILING);
        let target = (self.current + increment).min(ceiling);
        self.current = self.current.max(target);
    }

    /// Feed a raw chunk of stdout or stderr. Returns true when anything moved.
    ///
    /// A line is only matched once its terminator (`\n` or `\r`) arrives,
    /// so markers split across reads are still seen whole.
    pub fn feed(&mut self, stream: Stream, chunk: &[u8]) -> bool {
        let pending = &mut self.partial[stream as usize];
        pending.extend_from_slice(chunk);
        let Some(end) = pending.iter().rposition(|b| matches!(b, b'\n' | b'\r')) else {
            return false;
        };
        let rest = pending.split_off(end + 1);
        let complete = std::mem::replace(pending, rest);
        self.feed_text(&complete)
    }

    /// Match whatever unterminated text is left on both streams.
    pub fn flush(&mut self) -> bool {
        let mut changed = false;
        for stream in [Stream::Stdout, Stream::Stderr] {
            let rest = std::mem::take(&mut self.partial[stream as usize]);
            changed |= self.feed_text(&rest);
        }
        changed
    }

    fn feed_text(&mut self, bytes: &[u8]) -> bool {
        let text = String::from_utf8_lossy(bytes);
        let mut changed = false;
        for line in text.split(['\n', '\r']) {
            let line = line.trim();
            if !line.is_empty() {
                changed |= self.feed_line(line);
            }
        }
        changed
    }

    fn feed_line(&mut self, line: &str) -> bool {
        let Some(rule) = self.profile.rules.iter().find(|r| r.matches(line)) else {
            return false;
        };
        self.matched_any = true;

        let before = (self.current, self.status.clone());
        match rule.label {
            Label::Keep => {}
            Label::Fixed(text) => text.clone_into(&mut self.status),
            Label::Capture(capture) => {
                if let Some(text) = capture(line) {
                    self.status = text;
                }
            }
        }
        self.bump(rule.increment, rule.ceiling);
        before.0 != self.current || before.1 != self.status
    }

    /// Clock-driven nudge while the tool is quiet
    pub fn tick(&mut self) {
        if self.current >= OVERALL_CEILING {
            return;
        }
        if !self.matched_any {
            self.profile.idle_status.clone_into(&mut self.status);
        }
        self.bump(self.profile.tick_increment, OVERALL_CEILING);
    }

    /// Process exited with status 0
    pub fn finish_success(&mut self) {
        self.current = 100.0;
        self.profile.done_status.clone_into(&mut self.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npm() -> ProgressEstimator {
        ProgressEstimator::new(ProgressProfile::npm_install())
    }

    #[test]
    fn percentage_never_decreases_and_never_passes_cap() {
        let mut est = npm();
        let chunks: &[&[u8]] = &[
            b"npm timing idealTree:init Completed in 2ms\n",
            b"npm timing idealTree Completed in 300ms\nnpm timing idealTree Completed\n",
            b"added 1200 packages in 30s\n",
            // earlier-stage line after the jump must not pull the value down
            b"npm http fetch GET 200 https://registry.npmmirror.com/lodash\n",
            b"npm timing reify:lodash: Completed in 1ms\r",
        ];
        let mut last = est.percent();
        for chunk in chunks {
            est.feed(Stream::Stdout, chunk);
            assert!(est.percent() >= last);
            assert!(est.percent() <= OVERALL_CEILING);
            last = est.percent();
        }
        for _ in 0..1000 {
            est.tick();
            assert!(est.percent() >= last);
            assert!(est.percent() <= OVERALL_CEILING);
            last = est.percent();
        }
        est.finish_success();
        assert_eq!(est.percent(), 100.0);
        assert_eq!(est.status(), "install complete");
    }

    #[test]
    fn stage_ceiling_is_honored() {
        let mut est = npm();
        for _ in 0..100 {
            est.feed(Stream::Stdout, b"npm timing buildIdealTree:#root Completed in 1ms\n");
        }
        // `timing` comes first in the table, so the cap is the overall one
        assert!(est.percent() <= OVERALL_CEILING);

        let mut est = ProgressEstimator::new(ProgressProfile::go());
        for _ in 0..100 {
            est.feed(Stream::Stdout, b"go: finding module for package example.com/x\n");
        }
        assert_eq!(est.percent(), 30.0);
        assert_eq!(est.status(), "resolving modules...");
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut est = npm();
        est.feed(Stream::Stdout, b"npm warn deprecated fetch-polyfill@1.0.0\n");
        assert_eq!(est.percent(), 0.0);
        assert_eq!(est.status(), "preparing...");
    }

    #[test]
    fn ideal_tree_sets_status_and_caps_at_thirty() {
        let mut est = npm();
        for _ in 0..40 {
            est.feed(Stream::Stdout, b"buildIdeal start\n");
        }
        assert_eq!(est.percent(), 30.0);
        assert_eq!(est.status(), "resolving dependency tree...");
    }

    #[test]
    fn go_download_captures_module_name() {
        let mut est = ProgressEstimator::new(ProgressProfile::go());
        assert!(est.feed(Stream::Stdout, b"go: downloading github.com/gin-gonic/gin v1.9.1\n"));
        assert_eq!(est.status(), "gin");
        assert_eq!(est.percent(), 2.0);
    }

    #[test]
    fn vite_jumps_between_stages() {
        let mut est = ProgressEstimator::new(ProgressProfile::vite_build());
        est.feed(Stream::Stdout, b"vite v5.4.0 building for production...\n");
        assert_eq!(est.percent(), 2.0);
        est.feed(Stream::Stdout, b"transforming (412) src/App.jsx\n");
        est.feed(Stream::Stdout, b"\xe2\x9c\x93 2114 modules transformed.\n");
        assert_eq!(est.percent(), 70.0);
        est.feed(Stream::Stdout, b"rendering chunks (12)...\n");
        assert_eq!(est.percent(), 85.0);
        est.feed(Stream::Stdout, b"computing gzip size (3)...\n");
        est.feed(Stream::Stdout, b"\xe2\x9c\x93 built in 21.37s\n");
        assert_eq!(est.percent(), OVERALL_CEILING);
        assert_eq!(est.status(), "bundle written");
    }

    #[test]
    fn unmatched_lines_are_ignored() {
        let mut est = ProgressEstimator::new(ProgressProfile::go());
        assert!(!est.feed(Stream::Stdout, b"\n\r\nsomething unrelated\n"));
        assert_eq!(est.percent(), 0.0);
    }

    #[test]
    fn ticker_uses_idle_status_until_a_rule_matches() {
        let mut est = ProgressEstimator::new(ProgressProfile::go());
        est.tick();
        assert_eq!(est.status(), "compiling...");
        est.feed(Stream::Stdout, b"go: finding module for package x\n");
        est.tick();
        assert_eq!(est.status(), "resolving modules...");
    }

    #[test]
    fn marker_split_across_reads_is_matched_once_complete() {
        let mut est = ProgressEstimator::new(ProgressProfile::go());
        assert!(!est.feed(Stream::Stdout, b"go: down"));
        assert_eq!(est.percent(), 0.0);
        assert!(est.feed(Stream::Stdout, b"loading github.com/gin-gonic/gin v1.9.1\ngo: fin"));
        assert_eq!(est.status(), "gin");
        assert_eq!(est.percent(), 2.0);
        // the tail is held back, not treated as a line of its own
        assert!(est.feed(Stream::Stdout, b"ding module for package x\n"));
        assert_eq!(est.status(), "resolving modules...");
    }

    #[test]
    fn streams_keep_separate_partial_lines() {
        let mut est = ProgressEstimator::new(ProgressProfile::go());
        est.feed(Stream::Stdout, b"go: down");
        est.feed(Stream::Stderr, b"warning: something\n");
        est.feed(Stream::Stdout, b"loading example.com/mod v1\n");
        assert_eq!(est.status(), "mod");
    }

    #[test]
    fn flush_matches_unterminated_tail() {
        let mut est = ProgressEstimator::new(ProgressProfile::go());
        est.feed(Stream::Stderr, b"go: finding module for package x");
        assert_eq!(est.percent(), 0.0);
        assert!(est.flush());
        assert_eq!(est.percent(), 5.0);
        assert!(!est.flush());
    }
}
