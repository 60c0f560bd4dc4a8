use crate::infra::Config;
use std::io;
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to start {bin}: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: io::Error,
    },
}

pub fn session_command(config: &Config, session_id: &str, directory: &Path) -> Command {
    let mut command = Command::new(&config.opencode_bin);
    command.arg("--session").arg(session_id).current_dir(directory);
    command
}

/// Runs OpenCode attached to this terminal and returns its exit code. A child
/// terminated by a signal reports 0.
pub fn launch_session(
    config: &Config,
    session_id: &str,
    directory: &Path,
) -> Result<i32, LaunchError> {
    debug!(session_id, directory = %directory.display(), "launching opencode");
    let status = session_command(config, session_id, directory)
        .status()
        .map_err(|source| LaunchError::Spawn {
            bin: config.opencode_bin.clone(),
            source,
        })?;
    Ok(status.code().unwrap_or(0))
}
