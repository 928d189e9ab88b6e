//! Remote sandbox provisioning for isolated agent execution.
//!
//! Each task owns exactly one sandbox for its whole lifetime. The
//! provider creates it from a template, executes commands in it, and
//! releases it when the task is done.

mod e2b;
#[cfg(test)]
pub(crate) mod mock;

pub(crate) use e2b::E2bProvisioner;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Opaque handle to a provisioned sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SandboxHandle {
    /// Provider-assigned sandbox id.
    pub id: String,
}

/// Output of a command executed inside a sandbox.
#[derive(Debug, Clone)]
pub(crate) struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Trait for sandbox provisioning services.
///
/// One call each; no retries. The wire format behind these operations
/// is owned entirely by the provider.
#[async_trait]
pub(crate) trait Provisioner: Send + Sync {
    /// Creates a sandbox from a template with the given environment
    /// variables injected.
    async fn create(
        &self,
        template_id: &str,
        timeout: Duration,
        envs: &HashMap<String, String>,
    ) -> Result<SandboxHandle>;

    /// Writes a text file into the sandbox at the given path.
    async fn write_file(&self, handle: &SandboxHandle, path: &str, contents: &str) -> Result<()>;

    /// Runs a command inside the sandbox and waits for it to exit.
    async fn run(
        &self,
        handle: &SandboxHandle,
        command: &str,
        timeout: Duration,
    ) -> Result<ExecOutput>;

    /// Releases the sandbox back to the provider.
    async fn release(&self, handle: &SandboxHandle) -> Result<()>;
}
