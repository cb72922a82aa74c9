//! Dialbook streaming application entry point.

use std::process::ExitCode;

use clap::Parser;
use dialbook_api::config::StreamConfig;
use dialbook_api::error::AppError;
use dialbook_api::stream;
use dialbook_projections::pipeline::PipelineType;
use dialbook_projections::pipelines::PipelineRegistry;
use dialbook_projections::watcher::ShutdownOutcome;

#[derive(Debug, Parser)]
#[command(name = "dialbook-stream")]
#[command(about = "Keeps the dialbook read models up to date from the event store")]
struct Args {
    /// Set of pipelines to run
    #[arg(long = "type", env = "STREAM_TYPE", default_value = "core")]
    pipeline_type: PipelineType,
}

async fn start(args: Args) -> Result<ShutdownOutcome, AppError> {
    let config = StreamConfig::from_env()?;
    let registry = PipelineRegistry::standard();

    let (pools, ctx) = stream::postgres_context(&config, &registry, args.pipeline_type).await?;
    let outcome = stream::run(
        &registry,
        args.pipeline_type,
        &ctx,
        config.shutdown_timeout,
        dialbook_api::shutdown_signal(),
    )
    .await?;

    if outcome == ShutdownOutcome::Graceful {
        pools.close().await;
    }
    Ok(outcome)
}

#[tokio::main]
async fn main() -> ExitCode {
    dialbook_api::init_tracing();
    let args = Args::parse();

    tracing::info!(pipeline_type = %args.pipeline_type, "Starting dialbook streaming application");

    match start(args).await {
        Ok(ShutdownOutcome::Graceful) => {
            tracing::info!("streaming application stopped");
            ExitCode::SUCCESS
        }
        Ok(ShutdownOutcome::TimedOut) => {
            tracing::error!("pipelines did not drain in time, forcing exit");
            std::process::exit(1);
        }
        Err(err) => {
            tracing::error!(error = %err, "streaming application failed");
            ExitCode::FAILURE
        }
    }
}
