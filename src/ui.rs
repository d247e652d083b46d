//! Styled console output for the build driver
//!
//! User-facing status lines go here; diagnostics go through `log`.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn tagged(color: Color, tag: &str, msg: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)));
    let _ = write!(stdout, "[{tag}]");
    let _ = stdout.reset();
    let _ = writeln!(stdout, " {msg}");
}

pub fn info(msg: impl AsRef<str>) {
    tagged(Color::Blue, "INFO", msg.as_ref());
}

pub fn success(msg: impl AsRef<str>) {
    tagged(Color::Green, "SUCCESS", msg.as_ref());
}

pub fn warn(msg: impl AsRef<str>) {
    tagged(Color::Yellow, "WARN", msg.as_ref());
}

pub fn error(msg: impl AsRef<str>) {
    tagged(Color::Red, "ERROR", msg.as_ref());
}

/// Section header
pub fn title(msg: impl AsRef<str>) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
    let _ = writeln!(stdout, "\n=== {} ===\n", msg.as_ref());
    let _ = stdout.reset();
}

/// Horizontal rule framing a build summary
pub fn rule() {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
    let _ = writeln!(stdout, "{}", "═".repeat(60));
    let _ = stdout.reset();
}

/// Indented, highlighted line (paths, commands to copy)
pub fn highlight(msg: impl AsRef<str>) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = write!(stdout, "  ");
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
    let _ = writeln!(stdout, "{}", msg.as_ref());
    let _ = stdout.reset();
}

/// Raw block of text, printed as-is (subprocess output on failure)
pub fn block(text: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = writeln!(stdout, "{}", text.trim_end());
}
