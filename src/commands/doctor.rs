//! The `doctor` command: validate credentials and configuration
//! without provisioning anything.

use anyhow::Result;
use colored::Colorize;

use crate::config::{Config, Credentials, ENV_API_KEY, ENV_OAUTH_TOKEN, ENV_TEMPLATE_ID};

pub(crate) async fn run() -> Result<()> {
    let cwd = std::env::current_dir()?;

    println!("\n{}", "agentbox setup check".bold());
    println!("{}", "━".repeat(40).dimmed());

    let credentials = Credentials::from_env();
    report(ENV_API_KEY, credentials.api_key.is_some());
    report(ENV_OAUTH_TOKEN, credentials.oauth_token.is_some());

    let config = match Config::load(&cwd) {
        Ok(config) => {
            println!("  {} agentbox.toml", "✔".green());
            config
        }
        Err(e) => {
            println!("  {} agentbox.toml: {e:#}", "✘".red());
            Config::default()
        }
    };

    let template = credentials
        .template_id
        .clone()
        .or_else(|| config.sandbox.template.clone());
    report(ENV_TEMPLATE_ID, template.is_some());

    println!("{}", "━".repeat(40).dimmed());
    println!("  Model:    {}", config.agent.model.cyan());
    println!(
        "  Timeout:  {}",
        format!("{}s", config.sandbox.timeout_secs).cyan()
    );
    println!(
        "  Template: {}",
        template.as_deref().unwrap_or("(not set)").cyan()
    );
    println!(
        "  Tools:    {}",
        config.agent.allowed_tools.join(", ").cyan()
    );

    let mut missing = credentials.missing();
    if template.is_none() {
        missing.push(ENV_TEMPLATE_ID);
    }

    if missing.is_empty() {
        println!("\n{} All credentials configured.", "✔".green());
        Ok(())
    } else {
        anyhow::bail!("missing required settings: {}", missing.join(", "));
    }
}

fn report(name: &str, present: bool) {
    if present {
        println!("  {} {}", "✔".green(), name);
    } else {
        println!("  {} {} not set", "✘".red(), name);
    }
}
