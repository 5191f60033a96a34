use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod config;

use cli::{Args, Mode};
use commands::run::RunArgs;

/// Initialize tracing:
/// 1. Console output (stderr) - always
/// 2. File output ($STACKPROBE_LOG_DIR/stackprobe.log) - when the variable is set
///
/// The returned guard flushes the file writer when dropped.
fn initialize_tracing() -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "info,\
         stackprobe_cli=debug,\
         stackprobe_orchestrations=debug,\
         hyper=warn,\
         reqwest=warn"
            .into()
    });

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match std::env::var("STACKPROBE_LOG_DIR") {
        Ok(dir) => {
            std::fs::create_dir_all(&dir)?;
            let file_appender = tracing_appender::rolling::never(&dir, "stackprobe.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().with_writer(file_writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let guard = initialize_tracing()?;

    let exit_code = match args.mode {
        Mode::Run {
            template_file,
            stack_timeout_mins,
            test_timeout_mins,
            poll_interval_secs,
            creation_timeout_mins,
            disable_rollback,
            cleanup,
        } => {
            commands::run::run(RunArgs {
                template_file,
                stack_timeout_mins,
                test_timeout_mins,
                poll_interval_secs,
                creation_timeout_mins,
                disable_rollback,
                cleanup,
            })
            .await?
        }
        Mode::Status { stack_url, output } => {
            commands::stack::run_status(stack_url, output).await?;
            0
        }
        Mode::Delete { stack_url } => {
            commands::stack::run_delete(stack_url).await?;
            0
        }
    };

    // flush the file writer before exiting
    drop(guard);
    std::process::exit(exit_code)
}
