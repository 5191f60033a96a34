//! `stackprobe status` / `stackprobe delete` for stacks left behind by a run

use anyhow::{Context, Result};
use stackprobe_models::{StackHandle, StackStatus};
use stackprobe_orchestrations::clients::{HeatClient, StackService};
use stackprobe_orchestrations::names::{outputs, parameters};

use crate::config::Config;

fn heat_client(config: &Config) -> HeatClient {
    HeatClient::new(config.heat_url.clone(), config.credential_provider())
}

pub async fn run_status(stack_url: String, output: String) -> Result<()> {
    let config = Config::load()?;
    let handle = StackHandle::new(stack_url);

    let status = heat_client(&config)
        .stack_status(&handle)
        .await
        .with_context(|| format!("Failed to read status of {}", handle))?;

    if output == "json" {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status_table(&handle, &status);
    }

    Ok(())
}

pub async fn run_delete(stack_url: String) -> Result<()> {
    let config = Config::load()?;
    let handle = StackHandle::new(stack_url);

    heat_client(&config)
        .delete_stack(&handle)
        .await
        .with_context(|| format!("Failed to delete {}", handle))?;

    println!("✓ Delete requested for {}", handle);
    Ok(())
}

fn print_status_table(handle: &StackHandle, status: &StackStatus) {
    println!("Stack: {}", handle);
    println!("{}", "=".repeat(60));
    println!();
    println!("Status:");
    println!("  State:              {}", status.status);
    let reason = if status.reason.is_empty() { "-" } else { &status.reason };
    println!("  Reason:             {}", reason);
    println!("  Created:            {}", status.created_at.as_deref().unwrap_or("-"));
    println!();
    println!("Cluster:");
    println!("  Overlord IP:        {}", status.output_str(outputs::OVERLORD_IP).unwrap_or("-"));
    println!("  Masters:            {}", status.parameter(parameters::MASTER_COUNT).unwrap_or("-"));
    println!("  Minions:            {}", status.parameter(parameters::MINION_COUNT).unwrap_or("-"));

    if !status.outputs.is_empty() {
        println!();
        println!("Outputs:");
        for (key, value) in &status.outputs {
            match value.as_str() {
                Some(text) => println!("  {:<20}{}", key, text),
                None => println!("  {:<20}{}", key, value),
            }
        }
    }
}
