use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stackprobe - Heat stack provisioning and post-deploy validation harness
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Provision a stack, wait for it and validate the deployment
    Run {
        /// Heat template to submit
        #[arg(short, long)]
        template_file: PathBuf,

        /// Minutes to wait for CREATE_COMPLETE
        #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
        stack_timeout_mins: u64,

        /// Minutes to wait for each post-deploy check
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
        test_timeout_mins: u64,

        /// Seconds between status polls
        #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
        poll_interval_secs: u64,

        /// Creation timeout handed to Heat (minutes)
        #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..))]
        creation_timeout_mins: u32,

        /// Ask Heat not to roll back a failed stack
        #[arg(long)]
        disable_rollback: bool,

        /// Delete the stack after a successful run (default: leave it running)
        #[arg(long)]
        cleanup: bool,
    },

    /// Show the status of a stack
    Status {
        /// Stack URL as printed by `run`
        stack_url: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// Delete a stack
    Delete {
        /// Stack URL as printed by `run`
        stack_url: String,
    },
}
