//! Unpacking the toolchain archive into the planned root

use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::{BuildError, Result};
use crate::install::privilege::InstallationPlan;

/// Remove any previous `<root>/go` so stale files don't survive an upgrade.
pub async fn remove_previous(plan: &InstallationPlan) -> Result<()> {
    let goroot = plan.goroot();
    if !tokio::fs::try_exists(&goroot).await.unwrap_or(false) {
        return Ok(());
    }
    log::info!("removing existing toolchain at {}", goroot.display());

    if plan.requires_elevation {
        let status = plan
            .command("rm", [std::ffi::OsStr::new("-rf"), goroot.as_os_str()])
            .status()
            .await
            .map_err(|e| BuildError::fs("failed to run sudo rm", &goroot, e))?;
        if !status.success() {
            return Err(BuildError::Subprocess {
                cmd: format!("sudo rm -rf {}", goroot.display()),
            });
        }
        return Ok(());
    }

    tokio::fs::remove_dir_all(&goroot)
        .await
        .map_err(|e| BuildError::fs("failed to remove existing toolchain", &goroot, e))
}

/// Extract a `.tar.gz` archive into the plan's install root.
pub async fn extract_archive(archive: &Path, plan: &InstallationPlan) -> Result<()> {
    let root = plan.install_root.clone();

    if plan.requires_elevation {
        let status = plan
            .command(
                "tar",
                [
                    std::ffi::OsStr::new("-C"),
                    root.as_os_str(),
                    std::ffi::OsStr::new("-xzf"),
                    archive.as_os_str(),
                ],
            )
            .status()
            .await
            .map_err(|e| BuildError::fs("failed to run sudo tar", archive, e))?;
        if !status.success() {
            return Err(BuildError::Subprocess {
                cmd: format!("sudo tar -C {} -xzf {}", root.display(), archive.display()),
            });
        }
        return Ok(());
    }

    tokio::fs::create_dir_all(&root)
        .await
        .map_err(|e| BuildError::fs("failed to create install root", &root, e))?;

    let archive = archive.to_path_buf();
    // Decompression is CPU-bound
    tokio::task::spawn_blocking(move || unpack_tar_gz(&archive, &root))
        .await
        .map_err(|e| BuildError::fs("extraction task failed", "<worker>", std::io::Error::other(e)))?
}

fn unpack_tar_gz(archive: &Path, dest: &Path) -> Result<()> {
    let file = std::fs::File::open(archive)
        .map_err(|e| BuildError::fs("failed to open archive", archive, e))?;
    let mut tar = Archive::new(GzDecoder::new(file));
    tar.set_preserve_permissions(true);
    tar.unpack(dest)
        .map_err(|e| BuildError::fs("failed to extract archive", archive, e))
}
