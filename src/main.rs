//! Devtalk CLI entrypoint: crawl GitHub discussions into CSV tables.

mod cli;

use std::io::{self, Write};
use std::process::ExitCode;

use devtalk::{DevtalkConfig, DevtalkError, OperationMode};
use ortho_config::OrthoConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(code) => code,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode, DevtalkError> {
    let config = load_config()?;
    config.validate()?;

    match config.operation_mode() {
        OperationMode::Download => {
            let report = cli::download::run(&config).await?;
            Ok(if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        OperationMode::Delete => cli::delete::run(&config).map(|()| ExitCode::SUCCESS),
        OperationMode::RateLimit => cli::rate_limit::run(&config)
            .await
            .map(|()| ExitCode::SUCCESS),
        OperationMode::Info => cli::info::run(&config).map(|()| ExitCode::SUCCESS),
    }
}

/// Logs go to stderr so that command output on stdout stays clean.
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("devtalk=info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`DevtalkError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<DevtalkConfig, DevtalkError> {
    DevtalkConfig::load().map_err(|error| DevtalkError::Configuration {
        message: error.to_string(),
    })
}
