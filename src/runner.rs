//! Sandboxed task runner.
//!
//! One task, one sandbox: the runner provisions an isolated execution
//! context from a template, injects the generated agent program, runs
//! it, collects the output, and releases the sandbox on every exit
//! path. Nothing is retried and no state is shared between runs;
//! concurrent tasks each own an independent sandbox.

use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{Config, RunnerConfig, ENV_OAUTH_TOKEN};
use crate::error::RunnerError;
use crate::sandbox::{ExecOutput, Provisioner, SandboxHandle};
use crate::script::{self, AGENT_COMMAND, AGENT_SCRIPT_PATH};

/// One request to run an agent. Built by the caller immediately before
/// a run and discarded after it.
#[derive(Debug, Clone)]
pub(crate) struct Task {
    /// The prompt given to the agent.
    pub prompt: String,
    /// Model identifier passed to the agent SDK.
    pub model: String,
    /// Budget for both provisioning and execution.
    pub timeout: Duration,
    /// Tools the agent may use, in the order they are granted.
    pub allowed_tools: Vec<String>,
    /// Maximum agent turns.
    pub max_turns: u32,
}

impl Task {
    /// Builds a task from a prompt and the loaded configuration.
    pub fn from_config(prompt: impl Into<String>, config: &Config) -> Self {
        Self {
            prompt: prompt.into(),
            model: config.agent.model.clone(),
            timeout: config.timeout(),
            allowed_tools: config.agent.allowed_tools.clone(),
            max_turns: config.agent.max_turns,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub(crate) struct ExecutionResult {
    /// Exit status of the agent program.
    pub exit_code: i32,
    /// The agent's final result, extracted from the tagged output.
    pub result: String,
    /// Raw standard output of the agent program.
    pub stdout: String,
    /// Raw standard error of the agent program.
    pub stderr: String,
}

/// Runs tasks in sandboxes obtained from a provisioner.
pub(crate) struct TaskRunner<P: Provisioner> {
    config: RunnerConfig,
    provisioner: P,
}

impl<P: Provisioner> TaskRunner<P> {
    /// Creates a runner from an already-validated configuration.
    ///
    /// Validation happens once, in [`RunnerConfig::resolve`]; a runner
    /// cannot exist with missing credentials, so no provisioning call
    /// is ever attempted for an unconfigured task.
    pub fn new(config: RunnerConfig, provisioner: P) -> Self {
        Self {
            config,
            provisioner,
        }
    }

    /// Runs one task in one freshly provisioned sandbox.
    ///
    /// The sandbox is released on every exit path; release failures
    /// are logged and never mask the primary error.
    pub async fn run(&self, task: &Task) -> Result<ExecutionResult, RunnerError> {
        let run_id = uuid::Uuid::new_v4();
        info!(%run_id, template = %self.config.template_id, "Provisioning sandbox");

        let mut envs = HashMap::new();
        envs.insert(ENV_OAUTH_TOKEN.to_string(), self.config.oauth_token.clone());

        let handle = self
            .provisioner
            .create(&self.config.template_id, task.timeout, &envs)
            .await
            .map_err(|e| RunnerError::provisioning(format!("{e:#}")))?;

        info!(%run_id, sandbox = %handle.id, "Sandbox ready, running agent");

        let outcome = self.execute(&handle, task).await;

        if let Err(e) = self.provisioner.release(&handle).await {
            warn!(sandbox = %handle.id, "Failed to release sandbox: {e:#}");
        }

        let output = outcome?;
        debug!(
            exit_code = output.exit_code,
            stdout_bytes = output.stdout.len(),
            "Agent finished"
        );

        if output.exit_code != 0 {
            return Err(RunnerError::execution(output.exit_code, output.stderr));
        }

        Ok(ExecutionResult {
            exit_code: output.exit_code,
            result: script::extract_result(&output.stdout),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Steps between provisioning and release: inject the program,
    /// execute it, collect output. Errors here still reach the release
    /// in [`run`].
    async fn execute(
        &self,
        handle: &SandboxHandle,
        task: &Task,
    ) -> Result<ExecOutput, RunnerError> {
        let program = script::render_agent_script(task);

        self.provisioner
            .write_file(handle, AGENT_SCRIPT_PATH, &program)
            .await
            .map_err(|e| RunnerError::execution(-1, format!("payload upload failed: {e:#}")))?;

        // The provider enforces the timeout remotely; the local guard
        // bounds a hung connection to the same budget.
        let run = self.provisioner.run(handle, AGENT_COMMAND, task.timeout);
        match tokio::time::timeout(task.timeout, run).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(RunnerError::execution(
                -1,
                format!("command execution failed: {e:#}"),
            )),
            Err(_) => Err(RunnerError::timeout(task.timeout)),
        }
    }
}
