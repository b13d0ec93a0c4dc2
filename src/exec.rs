//! Shell Command Executor
//!
//! Production adapter for the [`CommandExecutor`] port backed by
//! `tokio::process`. A non-zero exit status surfaces as
//! [`Error::PartitionToolFailure`] carrying the full command line, so
//! operators can reproduce the failing invocation directly from the error.

use crate::domain::ports::CommandExecutor;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Executor that runs commands on the local node.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, name: &str, command: &str, args: &[String]) -> Result<Output> {
        let command_line = command_line(command, args);
        debug!("{}: running `{}`", name, command_line);

        let output = Command::new(command)
            .args(args)
            .output()
            .await
            .map_err(|e| Error::PartitionToolFailure {
                operation: name.to_string(),
                command: command_line.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::PartitionToolFailure {
                operation: name.to_string(),
                command: command_line,
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, name: &str, command: &str, args: &[String]) -> Result<()> {
        self.run(name, command, args).await?;
        Ok(())
    }

    async fn execute_with_output(
        &self,
        name: &str,
        command: &str,
        args: &[String],
    ) -> Result<String> {
        let output = self.run(name, command, args).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn command_line(command: &str, args: &[String]) -> String {
    if args.is_empty() {
        command.to_string()
    } else {
        format!("{} {}", command, args.join(" "))
    }
}
