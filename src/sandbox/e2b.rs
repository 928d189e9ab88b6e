//! E2B sandbox provisioner.
//!
//! Talks to the E2B control plane to create and release sandboxes, and
//! to the per-sandbox control endpoint for file uploads and command
//! execution. The exact wire format is owned by the provider; this
//! client only depends on the fields it reads.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ExecOutput, Provisioner, SandboxHandle};

/// Port of the in-sandbox control daemon.
const CONTROL_PORT: u16 = 49983;

/// HTTP client for the E2B sandbox API.
pub(crate) struct E2bProvisioner {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    /// Domain used to reach per-sandbox control endpoints.
    sandbox_domain: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest<'a> {
    template_id: &'a str,
    timeout: u64,
    env_vars: &'a HashMap<String, String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    sandbox_id: String,
}

#[derive(Serialize)]
struct RunRequest<'a> {
    cmd: &'a str,
    timeout: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunResponse {
    exit_code: i32,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
}

impl E2bProvisioner {
    /// Creates a provisioner against the given control plane.
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_base: String = api_base.into();
        let sandbox_domain = api_base
            .strip_prefix("https://api.")
            .or_else(|| api_base.strip_prefix("http://api."))
            .map(|d| d.trim_end_matches('/').to_string())
            .ok_or_else(|| anyhow!("Invalid API base URL: {api_base}"))?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("agentbox/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            sandbox_domain,
        })
    }

    /// URL of the control daemon inside a running sandbox.
    fn control_url(&self, handle: &SandboxHandle, path: &str) -> String {
        format!(
            "https://{}-{}.{}{}",
            CONTROL_PORT, handle.id, self.sandbox_domain, path
        )
    }

    async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(anyhow!("{what} failed with status {status}: {body}"))
    }
}

#[async_trait]
impl Provisioner for E2bProvisioner {
    async fn create(
        &self,
        template_id: &str,
        timeout: Duration,
        envs: &HashMap<String, String>,
    ) -> Result<SandboxHandle> {
        info!("Creating sandbox from template: {}", template_id);

        let response = self
            .client
            .post(format!("{}/sandboxes", self.api_base))
            .header("X-API-Key", &self.api_key)
            .json(&CreateRequest {
                template_id,
                timeout: timeout.as_secs(),
                env_vars: envs,
            })
            .send()
            .await
            .context("Failed to reach the sandbox provider")?;

        let response = Self::check_status(response, "Sandbox creation").await?;
        let created: CreateResponse = response
            .json()
            .await
            .context("Failed to decode sandbox creation response")?;

        debug!("Sandbox created: {}", created.sandbox_id);
        Ok(SandboxHandle {
            id: created.sandbox_id,
        })
    }

    async fn write_file(&self, handle: &SandboxHandle, path: &str, contents: &str) -> Result<()> {
        debug!("Uploading {} ({} bytes)", path, contents.len());

        let response = self
            .client
            .post(self.control_url(handle, "/files"))
            .header("X-API-Key", &self.api_key)
            .query(&[("path", path)])
            .body(contents.to_string())
            .send()
            .await
            .context("Failed to reach the sandbox")?;

        Self::check_status(response, "File upload").await?;
        Ok(())
    }

    async fn run(
        &self,
        handle: &SandboxHandle,
        command: &str,
        timeout: Duration,
    ) -> Result<ExecOutput> {
        debug!("Running command in {}: {}", handle.id, command);

        let response = self
            .client
            .post(self.control_url(handle, "/commands"))
            .header("X-API-Key", &self.api_key)
            .timeout(timeout + Duration::from_secs(5))
            .json(&RunRequest {
                cmd: command,
                timeout: timeout.as_secs(),
            })
            .send()
            .await
            .context("Failed to execute command in sandbox")?;

        let response = Self::check_status(response, "Command execution").await?;
        let run: RunResponse = response
            .json()
            .await
            .context("Failed to decode command output")?;

        Ok(ExecOutput {
            exit_code: run.exit_code,
            stdout: run.stdout,
            stderr: run.stderr,
        })
    }

    async fn release(&self, handle: &SandboxHandle) -> Result<()> {
        info!("Releasing sandbox: {}", handle.id);

        let response = self
            .client
            .delete(format!("{}/sandboxes/{}", self.api_base, handle.id))
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .context("Failed to reach the sandbox provider")?;

        if !response.status().is_success() {
            // The sandbox will still expire at its timeout.
            warn!("Sandbox release returned status {}", response.status());
        }
        Ok(())
    }
}
