//! Keyword tables for the tools we drive
//!
//! None of these tools report a numeric percentage, so each table maps
//! recognisable output lines to a status label and a bounded bump.

use std::time::Duration;

/// Highest value reachable before the process has exited.
pub const OVERALL_CEILING: f64 = 95.0;

/// How a matched line changes the status column.
#[derive(Debug, Clone, Copy)]
pub enum Label {
    /// Leave the status as it is
    Keep,
    Fixed(&'static str),
    /// Derive the status from the line; falls back to keeping it
    Capture(fn(&str) -> Option<String>),
}

/// One row of a keyword table. The first rule with any matching marker wins.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub markers: &'static [&'static str],
    pub label: Label,
    pub increment: f64,
    pub ceiling: f64,
}

impl Rule {
    pub fn matches(&self, line: &str) -> bool {
        self.markers.iter().any(|m| line.contains(m))
    }
}

/// Everything the estimator needs to know about one external tool.
#[derive(Debug, Clone)]
pub struct ProgressProfile {
    pub name: &'static str,
    pub rules: &'static [Rule],
    pub tick_every: Duration,
    pub tick_increment: f64,
    /// Status shown before anything matched
    pub initial_status: &'static str,
    /// Status used by the ticker while nothing matched yet
    pub idle_status: &'static str,
    pub done_status: &'static str,
}

const NPM_INSTALL_RULES: &[Rule] = &[
    Rule {
        markers: &["reify:"],
        label: Label::Capture(capture_reify_target),
        increment: 0.5,
        ceiling: OVERALL_CEILING,
    },
    Rule {
        markers: &["timing"],
        label: Label::Keep,
        increment: 0.3,
        ceiling: OVERALL_CEILING,
    },
    Rule {
        markers: &["added", "packages"],
        label: Label::Fixed("finishing install"),
        increment: OVERALL_CEILING,
        ceiling: OVERALL_CEILING,
    },
    // warnings would otherwise trip the `fetch` row below
    Rule {
        markers: &["npm warn", "npm WARN"],
        label: Label::Keep,
        increment: 0.0,
        ceiling: OVERALL_CEILING,
    },
    Rule {
        markers: &["idealTree", "buildIdeal"],
        label: Label::Fixed("resolving dependency tree..."),
        increment: 2.0,
        ceiling: 30.0,
    },
    Rule {
        markers: &["diffTrees"],
        label: Label::Fixed("computing changes..."),
        increment: 1.0,
        ceiling: 40.0,
    },
    Rule {
        markers: &["fetch"],
        label: Label::Fixed("downloading packages..."),
        increment: 0.2,
        ceiling: 80.0,
    },
];

const GO_RULES: &[Rule] = &[
    Rule {
        markers: &["go: downloading"],
        label: Label::Capture(capture_go_module),
        increment: 2.0,
        ceiling: 90.0,
    },
    Rule {
        markers: &["go: finding"],
        label: Label::Fixed("resolving modules..."),
        increment: 5.0,
        ceiling: 30.0,
    },
];

const VITE_RULES: &[Rule] = &[
    Rule {
        markers: &["building for"],
        label: Label::Fixed("starting bundler..."),
        increment: 2.0,
        ceiling: 10.0,
    },
    Rule {
        markers: &["modules transformed"],
        label: Label::Fixed("modules transformed"),
        increment: OVERALL_CEILING,
        ceiling: 70.0,
    },
    Rule {
        markers: &["transforming"],
        label: Label::Fixed("transforming modules..."),
        increment: 0.5,
        ceiling: 60.0,
    },
    Rule {
        markers: &["rendering chunks"],
        label: Label::Fixed("rendering chunks..."),
        increment: OVERALL_CEILING,
        ceiling: 85.0,
    },
    Rule {
        markers: &["computing gzip size"],
        label: Label::Fixed("computing sizes..."),
        increment: OVERALL_CEILING,
        ceiling: 90.0,
    },
    Rule {
        markers: &["built in"],
        label: Label::Fixed("bundle written"),
        increment: OVERALL_CEILING,
        ceiling: OVERALL_CEILING,
    },
];

impl ProgressProfile {
    pub fn npm_install() -> Self {
        Self {
            name: "npm install",
            rules: NPM_INSTALL_RULES,
            tick_every: Duration::from_millis(200),
            tick_increment: 0.1,
            initial_status: "preparing...",
            idle_status: "installing...",
            done_status: "install complete",
        }
    }

    /// `go mod tidy` and `go build`
    pub fn go() -> Self {
        Self {
            name: "go",
            rules: GO_RULES,
            tick_every: Duration::from_millis(300),
            tick_increment: 0.2,
            initial_status: "preparing...",
            idle_status: "compiling...",
            done_status: "done",
        }
    }

    pub fn vite_build() -> Self {
        Self {
            name: "vite build",
            rules: VITE_RULES,
            tick_every: Duration::from_millis(200),
            tick_increment: 0.1,
            initial_status: "preparing...",
            idle_status: "bundling...",
            done_status: "build complete",
        }
    }
}

/// Longest captured status, in characters.
pub const CAPTURE_WIDTH: usize = 25;

fn clip(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.chars().take(CAPTURE_WIDTH).collect())
}

/// `reify:lodash: timing reifyNode:node_modules/lodash` -> `lodash`
fn capture_reify_target(line: &str) -> Option<String> {
    let (_, rest) = line.split_once("reify:")?;
    clip(rest.split(':').next().unwrap_or(rest))
}

/// `go: downloading github.com/gin-gonic/gin v1.9.1` -> `gin`
fn capture_go_module(line: &str) -> Option<String> {
    let (_, rest) = line.split_once("go: downloading")?;
    let module = rest.split_whitespace().next()?;
    clip(module.rsplit('/').next().unwrap_or(module))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reify_capture_takes_package_name() {
        assert_eq!(
            capture_reify_target("npm timing reify:lodash: Completed in 3ms").as_deref(),
            Some("lodash")
        );
        assert_eq!(capture_reify_target("reify:").as_deref(), None);
    }

    #[test]
    fn go_capture_takes_last_path_segment() {
        assert_eq!(
            capture_go_module("go: downloading github.com/gin-gonic/gin v1.9.1").as_deref(),
            Some("gin")
        );
        assert_eq!(capture_go_module("go: downloading").as_deref(), None);
    }

    #[test]
    fn captures_are_clipped() {
        let line = format!("go: downloading example.com/{} v1", "a".repeat(60));
        assert_eq!(capture_go_module(&line).unwrap().chars().count(), CAPTURE_WIDTH);
    }

    #[test]
    fn every_ceiling_respects_overall_cap() {
        for profile in [
            ProgressProfile::npm_install(),
            ProgressProfile::go(),
            ProgressProfile::vite_build(),
        ] {
            for rule in profile.rules {
                assert!(rule.ceiling <= OVERALL_CEILING, "{}: {:?}", profile.name, rule.markers);
            }
        }
    }
}
