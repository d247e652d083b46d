//! Interactive menu shown when no sub-command is given

use std::io::Write;

use inquire::{InquireError, Text};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::app;
use crate::cli::Cmd;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::ui;

/// What a menu entry does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Command(Cmd),
    Exit,
    Invalid,
}

const ENTRIES: &[(&str, &str)] = &[
    ("1", "Build frontend"),
    ("2", "Build backend (host platform)"),
    ("3", "Build backend (linux amd64)"),
    ("4", "Build backend (linux arm64)"),
    ("5", "Full build (frontend + backend)"),
    ("6", "Clean build outputs (keep dependencies)"),
    ("7", "Clean everything (including node_modules)"),
    ("8", "Run the backend"),
    ("9", "Show mirror configuration"),
    ("10", "Initialise config.yaml"),
    ("0", "Exit"),
];

pub fn parse_choice(input: &str) -> Choice {
    let backend = |os: &str, arch: &str| {
        Choice::Command(Cmd::Backend {
            os: Some(os.into()),
            arch: Some(arch.into()),
        })
    };
    match input.trim() {
        "1" => Choice::Command(Cmd::Web),
        "2" => Choice::Command(Cmd::Backend { os: None, arch: None }),
        "3" => backend("linux", "amd64"),
        "4" => backend("linux", "arm64"),
        "5" => Choice::Command(Cmd::All),
        "6" => Choice::Command(Cmd::CleanBuild),
        "7" => Choice::Command(Cmd::Clean),
        "8" => Choice::Command(Cmd::Run),
        "9" => Choice::Command(Cmd::Mirrors),
        "10" => Choice::Command(Cmd::InitConfig),
        "0" => Choice::Exit,
        _ => Choice::Invalid,
    }
}

fn show_banner() {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
    let _ = writeln!(stdout, "\n╔══════════════════════════════════════╗");
    let _ = writeln!(stdout, "║       one-hub build tool (mirrors)   ║");
    let _ = writeln!(stdout, "╚══════════════════════════════════════╝");
    let _ = stdout.reset();

    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
    let _ = writeln!(stdout, "\nChoose an action:\n");
    let _ = stdout.reset();

    for (key, label) in ENTRIES {
        let _ = write!(stdout, "  ");
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
        let _ = write!(stdout, "{:<4}", format!("{key}."));
        let _ = stdout.reset();
        let _ = writeln!(stdout, "{label}");
    }
    let _ = writeln!(stdout);
}

/// Loop until the user exits or runs the backend.
pub async fn run(config: &BuildConfig) -> Result<()> {
    loop {
        show_banner();
        let answer = Text::new("Option [0-10]:").prompt();
        let input = match answer {
            Ok(input) => input,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                ui::info("bye!");
                return Ok(());
            }
            Err(e) => {
                log::warn!("menu prompt failed: {e}");
                return Ok(());
            }
        };

        match parse_choice(&input) {
            Choice::Exit => {
                ui::info("bye!");
                return Ok(());
            }
            Choice::Invalid => ui::warn(format!("invalid option: {}", input.trim())),
            Choice::Command(cmd) => {
                let stop_after = cmd == Cmd::Run;
                if let Err(e) = app::dispatch(&cmd, config).await {
                    ui::error(e.to_string());
                }
                if stop_after {
                    return Ok(());
                }
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_entries_map_to_commands() {
        assert_eq!(parse_choice("1"), Choice::Command(Cmd::Web));
        assert_eq!(
            parse_choice(" 4 "),
            Choice::Command(Cmd::Backend {
                os: Some("linux".into()),
                arch: Some("arm64".into())
            })
        );
        assert_eq!(parse_choice("10"), Choice::Command(Cmd::InitConfig));
        assert_eq!(parse_choice("0"), Choice::Exit);
        assert_eq!(parse_choice("11"), Choice::Invalid);
        assert_eq!(parse_choice(""), Choice::Invalid);
    }

    #[test]
    fn every_listed_entry_is_handled() {
        for (key, _) in ENTRIES {
            assert_ne!(parse_choice(key), Choice::Invalid, "entry {key}");
        }
    }
}
