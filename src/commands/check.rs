//! The `check` command: provision one sandbox from the configured
//! template and verify the agent tooling inside it.

use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::HashMap;

use crate::config::{Config, Credentials, RunnerConfig, ENV_OAUTH_TOKEN};
use crate::sandbox::{E2bProvisioner, Provisioner, SandboxHandle};

/// Commands run inside the sandbox, each with a short label.
const CHECKS: &[(&str, &str)] = &[
    ("agent CLI", "claude --version"),
    (
        "agent SDK",
        "python3 -c 'import claude_agent_sdk; print(claude_agent_sdk.__version__)'",
    ),
    ("command execution", "echo hello from the sandbox"),
];

pub(crate) async fn run() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = Config::load(&cwd)?;
    let credentials = Credentials::from_env();
    let runner_config = RunnerConfig::resolve(&config, &credentials)?;

    println!(
        "{} Starting sandbox (template: {})...",
        "▶".cyan(),
        runner_config.template_id.cyan()
    );

    let provisioner = E2bProvisioner::new(&runner_config.api_base, &runner_config.api_key)?;

    let mut envs = HashMap::new();
    envs.insert(ENV_OAUTH_TOKEN.to_string(), runner_config.oauth_token.clone());

    let handle = provisioner
        .create(&runner_config.template_id, runner_config.timeout, &envs)
        .await
        .context("Failed to create sandbox")?;

    println!("{} Sandbox started: {}", "✔".green(), handle.id.cyan());

    // Release even when a check fails.
    let outcome = run_checks(&provisioner, &handle, runner_config.timeout).await;

    if let Err(e) = provisioner.release(&handle).await {
        eprintln!("{} Failed to release sandbox: {e:#}", "⚠".yellow());
    } else {
        println!("{} Sandbox released", "✔".green());
    }

    outcome?;
    println!("\n{} Sandbox is ready for agents.", "✔".green().bold());
    Ok(())
}

async fn run_checks(
    provisioner: &E2bProvisioner,
    handle: &SandboxHandle,
    timeout: std::time::Duration,
) -> Result<()> {
    for (label, command) in CHECKS {
        let output = provisioner
            .run(handle, command, timeout)
            .await
            .with_context(|| format!("Failed to run {label} check"))?;

        if output.exit_code != 0 {
            anyhow::bail!(
                "{label} check failed (status {}): {}",
                output.exit_code,
                output.stderr.trim()
            );
        }

        println!(
            "  {} {}: {}",
            "✔".green(),
            label,
            output.stdout.trim().cyan()
        );
    }
    Ok(())
}
