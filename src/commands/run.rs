//! The `run` command: execute one agent task in one sandbox.

use anyhow::{Context, Result};
use colored::Colorize;
use std::time::Duration;

use crate::config::{Config, Credentials, RunnerConfig};
use crate::runner::{Task, TaskRunner};
use crate::sandbox::E2bProvisioner;

/// Overrides for task settings taken from the command line.
pub(crate) struct RunArgs {
    pub prompt: String,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub allowed_tools: Option<Vec<String>>,
}

pub(crate) async fn run(args: RunArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config = Config::load(&cwd)?;
    let credentials = Credentials::from_env();
    let runner_config = RunnerConfig::resolve(&config, &credentials)?;

    let mut task = Task::from_config(args.prompt, &config);
    if let Some(model) = args.model {
        task.model = model;
    }
    if let Some(secs) = args.timeout_secs {
        task.timeout = Duration::from_secs(secs);
    }
    if let Some(tools) = args.allowed_tools {
        task.allowed_tools = tools;
    }

    println!(
        "{} Starting sandbox (template: {})...",
        "▶".cyan(),
        runner_config.template_id.cyan()
    );

    let provisioner = E2bProvisioner::new(&runner_config.api_base, &runner_config.api_key)?;
    let runner = TaskRunner::new(runner_config, provisioner);

    let result = runner.run(&task).await?;

    println!("{} Agent finished\n", "✔".green());
    println!("{}", result.result);

    Ok(())
}
