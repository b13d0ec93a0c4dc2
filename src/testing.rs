//! Recording fakes for the collaborator ports.
//!
//! Production code depends only on the port traits; tests inject these fakes
//! to observe every external invocation and script probe output.

use crate::domain::ports::{ClusterConnection, CommandExecutor};
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// One command issued through a [`RecordingExecutor`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub with_output: bool,
}

/// Executor fake that records every invocation and replays scripted outputs.
///
/// `execute_with_output` pops the next scripted output, defaulting to an
/// empty string once the script runs out (an unpartitioned, unmounted
/// device).
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<RecordedCall>>,
    outputs: Mutex<VecDeque<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the output returned by the next `execute_with_output` call.
    pub fn push_output(&self, output: &str) {
        self.outputs.lock().push_back(output.to_string());
    }

    /// All recorded invocations, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Recorded `execute` invocations (the destructive ones).
    pub fn exec_calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| !c.with_output)
            .cloned()
            .collect()
    }

    /// Recorded `execute_with_output` invocations (the probes).
    pub fn output_calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.with_output)
            .cloned()
            .collect()
    }

    fn record(&self, name: &str, command: &str, args: &[String], with_output: bool) {
        self.calls.lock().push(RecordedCall {
            name: name.to_string(),
            command: command.to_string(),
            args: args.to_vec(),
            with_output,
        });
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(&self, name: &str, command: &str, args: &[String]) -> Result<()> {
        self.record(name, command, args, false);
        Ok(())
    }

    async fn execute_with_output(
        &self,
        name: &str,
        command: &str,
        args: &[String],
    ) -> Result<String> {
        self.record(name, command, args, true);
        Ok(self.outputs.lock().pop_front().unwrap_or_default())
    }
}

/// Cluster connection fake that answers every mon command with one canned
/// response.
pub struct MockClusterConnection {
    response: serde_json::Value,
    commands: Mutex<Vec<serde_json::Value>>,
}

impl MockClusterConnection {
    pub fn new(response: serde_json::Value) -> Self {
        Self {
            response,
            commands: Mutex::new(Vec::new()),
        }
    }

    /// All mon commands received, in order.
    pub fn commands(&self) -> Vec<serde_json::Value> {
        self.commands.lock().clone()
    }
}

#[async_trait]
impl ClusterConnection for MockClusterConnection {
    async fn mon_command(&self, command: serde_json::Value) -> Result<serde_json::Value> {
        self.commands.lock().push(command);
        Ok(self.response.clone())
    }
}
