use std::fmt;

use tokio::process::Command;
use tracing::{error, info};

use crate::config::WorkflowCommands;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Success,
    Error,
    Skipped,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Skipped => "skipped",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowReport {
    pub fetch: StepStatus,
    pub send: StepStatus,
    pub parse: StepStatus,
}

impl WorkflowReport {
    pub fn has_error(&self) -> bool {
        [self.fetch, self.send, self.parse].contains(&StepStatus::Error)
    }

    /// The newest signal file is only trusted when parsing did not fail.
    pub fn signal_ready(&self) -> bool {
        self.parse != StepStatus::Error
    }

    /// `fetch:success send:skipped parse:success`
    pub fn detail(&self) -> String {
        format!("fetch:{} send:{} parse:{}", self.fetch, self.send, self.parse)
    }
}

/// Runs fetch, send and parse in order. A failing step does not stop the
/// later ones; each result is reported on its own.
pub async fn run_workflow(commands: &WorkflowCommands) -> WorkflowReport {
    WorkflowReport {
        fetch: run_step("fetch", commands.fetch.as_deref()).await,
        send: run_step("send", commands.send.as_deref()).await,
        parse: run_step("parse", commands.parse.as_deref()).await,
    }
}

pub async fn run_step(name: &str, command: Option<&str>) -> StepStatus {
    let Some(command) = command else {
        return StepStatus::Skipped;
    };

    info!("Running {} step: {}", name, command);
    let result = Command::new("sh").arg("-c").arg(command).output().await;

    match result {
        Ok(output) if output.status.success() => {
            info!("{} step finished", name);
            StepStatus::Success
        }
        Ok(output) => {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("{} step failed with exit code {}", name, code);
            error!("Step stderr: {}", stderr.trim());
            StepStatus::Error
        }
        Err(err) => {
            error!("Failed to execute {} step: {}", name, err);
            StepStatus::Error
        }
    }
}
