use crate::infra::{Config, OpenCodeClient};
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum EnsureServerError {
    #[error("failed to start `{bin} serve`: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: io::Error,
    },

    #[error("server failed to start within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    WriteOutput(#[from] io::Error),
}

/// Makes sure an OpenCode server answers at the configured url, starting a
/// detached `opencode serve` when nothing does.
pub fn ensure_server_running(
    client: &OpenCodeClient,
    config: &Config,
    out: &mut impl Write,
) -> Result<(), EnsureServerError> {
    if client.ping().is_ok() {
        debug!(url = %client.base_url(), "server already running");
        return Ok(());
    }

    writeln!(out, "Starting OpenCode server...")?;
    out.flush()?;
    spawn_detached_server(config)?;

    wait_until_ready(
        || client.ping().is_ok(),
        config.startup_timeout,
        config.startup_poll_interval,
    )?;
    info!(url = %client.base_url(), "server started");
    Ok(())
}

pub fn serve_command(config: &Config) -> Command {
    let mut command = Command::new(&config.opencode_bin);
    command.arg("serve");
    if let Some(port) = config.server_port() {
        command.arg("--port").arg(port.to_string());
    }
    if let Some(host) = config.server_url.host_str() {
        command.arg("--hostname").arg(host);
    }
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
}

fn spawn_detached_server(config: &Config) -> Result<(), EnsureServerError> {
    let mut command = serve_command(config);

    // Own process group, so the server outlives this launcher and its terminal signals.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let child = command.spawn().map_err(|source| EnsureServerError::Spawn {
        bin: config.opencode_bin.clone(),
        source,
    })?;
    debug!(pid = child.id(), "spawned opencode serve");
    Ok(())
}

/// Polls `probe` every `interval` until it succeeds or `timeout` elapses.
pub fn wait_until_ready(
    mut probe: impl FnMut() -> bool,
    timeout: Duration,
    interval: Duration,
) -> Result<(), EnsureServerError> {
    let started = Instant::now();
    while started.elapsed() < timeout {
        if probe() {
            return Ok(());
        }
        thread::sleep(interval);
    }
    Err(EnsureServerError::Timeout(timeout))
}
