// ABOUTME: Executes export engine processes without a shell
// ABOUTME: Provides the system runner and the engine availability check

use super::engine::{CommandSpec, Engine};
use crate::error::ExporterError;
use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use which::which;

/// How an engine process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
}

impl RunStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes engine invocations and waits for them
pub trait CommandRunner: Send + Sync {
    /// Fail when `engine` cannot be run at all
    fn ensure_available(&self, engine: Engine) -> Result<(), ExporterError>;

    fn run(&self, spec: &CommandSpec) -> Result<RunStatus>;
}

/// Runs commands as child processes, inheriting stdout and stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn ensure_available(&self, engine: Engine) -> Result<(), ExporterError> {
        check_engine_available(engine)
    }

    fn run(&self, spec: &CommandSpec) -> Result<RunStatus> {
        tracing::debug!("Running {:?}", spec);

        let status = Command::new(&spec.program)
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to execute {}", spec.program))?;

        Ok(RunStatus {
            code: status.code(),
        })
    }
}

/// Check that the engine's executable can be found in PATH
pub fn check_engine_available(engine: Engine) -> Result<(), ExporterError> {
    which(engine.program())
        .map(|path| tracing::debug!("Using {} at {}", engine, path.display()))
        .map_err(|_| ExporterError::EngineUnavailable(engine.program().to_string()))
}
