//! Remote host collaborators
//!
//! The production side of the import workflow: generate a dump on the
//! remote host over SSH, download the artifact over HTTPS, and clean the
//! artifact off the remote host afterwards. All three are opaque external
//! invocations built as [`CommandSpec`]s; this module knows nothing about
//! SSH or HTTP beyond how to phrase the command lines.

use crate::config::RemoteConfig;
use crate::error::{Result, StagingError};
use crate::exec::{CommandRunner, CommandSpec};
use std::path::Path;
use tracing::info;

/// `user@host` form used by ssh
fn ssh_destination(remote: &RemoteConfig) -> String {
    format!("{}@{}", remote.username, remote.host)
}

fn ssh_command(remote: &RemoteConfig, remote_script: String) -> CommandSpec {
    CommandSpec::new("ssh")
        .arg("-i")
        .arg(remote.private_key_path.to_string_lossy())
        .arg("-p")
        .arg(remote.port.to_string())
        .arg(ssh_destination(remote))
        .arg(remote_script)
}

/// Generate a database dump on the remote host
///
/// Runs the export tool inside the remote application root so the dump
/// lands where the web server can serve it for the download step.
pub fn export_remote_database(
    runner: &mut dyn CommandRunner,
    remote: &RemoteConfig,
    artifact: &str,
) -> Result<()> {
    let script = format!("cd {} && wp db export {}", remote.app_path, artifact);
    let output = runner.run(&ssh_command(remote, script))?;
    if !output.success {
        return Err(StagingError::export(format!(
            "remote database export failed: {}",
            output.stderr.trim()
        )));
    }
    info!("Production database backup generated on the remote server");
    Ok(())
}

/// Download the remote artifact into the imports directory
pub fn download_artifact(
    runner: &mut dyn CommandRunner,
    remote_domain: &str,
    artifact: &str,
    destination: &Path,
) -> Result<()> {
    let url = format!("https://{}/{}", remote_domain, artifact);
    let spec = CommandSpec::new("curl")
        .arg("-o")
        .arg(destination.to_string_lossy())
        .args(["--fail", "--silent", "--show-error"])
        .arg("--url")
        .arg(&url);
    let output = runner.run(&spec)?;
    if !output.success {
        return Err(StagingError::transfer(format!(
            "download of {} failed: {}",
            url,
            output.stderr.trim()
        )));
    }
    info!("Production database downloaded to {:?}", destination);
    Ok(())
}

/// Remove the dump from the remote host once it has been fetched
pub fn delete_remote_artifact(
    runner: &mut dyn CommandRunner,
    remote: &RemoteConfig,
    artifact: &str,
) -> Result<()> {
    let script = format!("cd {} && rm -f {}", remote.app_path, artifact);
    let output = runner.run(&ssh_command(remote, script))?;
    if !output.success {
        return Err(StagingError::transfer(format!(
            "failed to delete remote artifact {}: {}",
            artifact,
            output.stderr.trim()
        )));
    }
    info!("Remote backup file deleted");
    Ok(())
}
