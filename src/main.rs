use anyhow::{Context, Result};
use clap::Parser;
use log::error;

use hub_builder::cli::Args;
use hub_builder::config::BuildConfig;
use hub_builder::{app, menu, ui};

fn main() {
    // Diagnostics only; user-facing output goes through `ui`
    env_logger::Builder::new()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };
    match rt.block_on(real_main()) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{e:#}");
            ui::error(format!("{e:#}"));
            std::process::exit(1);
        }
    }
}

async fn real_main() -> Result<bool> {
    let args = Args::parse();
    let root = std::path::absolute(&args.root)
        .with_context(|| format!("invalid project root {}", args.root.display()))?;
    let config = BuildConfig::load(&root, args.config.as_deref())
        .context("failed to load build configuration")?;

    match args.sub {
        Some(cmd) => Ok(app::dispatch(&cmd, &config).await?),
        None => {
            menu::run(&config).await?;
            Ok(true)
        }
    }
}
