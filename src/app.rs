//! Command dispatch shared by the CLI and the interactive menu

use crate::build::Pipeline;
use crate::cli::Cmd;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::platform::BuildTarget;
use crate::process::ShellRunner;
use crate::tasks;

/// Run one command; `Ok(false)` means it failed and said so on the console.
pub async fn dispatch(cmd: &Cmd, config: &BuildConfig) -> Result<bool> {
    log::debug!("dispatching {cmd:?}");
    let ok = match cmd {
        Cmd::Web => pipeline(config).frontend().await,
        Cmd::Backend { os, arch } => {
            let target = BuildTarget::resolve(os.as_deref(), arch.as_deref())?;
            pipeline(config).backend(target).await
        }
        Cmd::All => pipeline(config).all().await,
        Cmd::Clean => tasks::clean(config),
        Cmd::CleanBuild => tasks::clean_build(config),
        Cmd::Run => tasks::run(config).await,
        Cmd::Mirrors => {
            tasks::show_mirrors(config);
            true
        }
        Cmd::InitConfig => tasks::init_config_command(config),
    };
    Ok(ok)
}

fn pipeline(config: &BuildConfig) -> Pipeline<ShellRunner> {
    Pipeline::new(config.clone(), ShellRunner::new())
}
