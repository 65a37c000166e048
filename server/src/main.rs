//! ragctx entry point
//!
//! Logs go to stderr; stdout carries only JSON.

use clap::Parser;
use ragctx_server::cli::{Cli, Command};
use ragctx_server::{commands, ServerResult};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ragctx=info,ragctx_retrieval=info,ragctx_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli.command).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(command: Command) -> ServerResult<u8> {
    let config = command.index_args().to_config();

    match command {
        Command::Ask { question, k, .. } => {
            let outcome = commands::ask(config, question, k).await?;
            println!("{}", serde_json::to_string_pretty(&outcome.body)?);
            Ok(commands::exit_status(&outcome))
        }
        Command::Serve { .. } => {
            commands::serve(config).await?;
            Ok(0)
        }
        Command::Inspect { .. } => {
            let report = commands::inspect(config).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(0)
        }
    }
}
