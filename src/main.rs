// src/main.rs
use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use netconfig_gen::output::{deliver, render_batch, render_health, render_result, DeliveryTarget};
use netconfig_gen::{
    load_requests, AppError, BackendHealth, BoundedBackend, CommandLineInput, OllamaClient, Pipeline,
    PipelineConfig, PipelineResult, PromptTemplates, Workload,
};
use std::fs;
use std::sync::Arc;

/// Sets up logging configuration. Console logs go to stderr so stdout only
/// ever carries rendered results.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("netconfig_gen.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let console_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Runs whatever the invocation asked for and delivers the rendered output.
async fn execute(config: &PipelineConfig) -> Result<(), AppError> {
    let client = OllamaClient::new(config.backend_settings())?;

    match &config.workload {
        Workload::HealthCheck => {
            let health = client.probe().await;
            deliver_rendered(
                config,
                render_health(&health, client.settings(), config.format)?,
            )?;
            match health {
                BackendHealth::Healthy {
                    model_available: true,
                    ..
                } => Ok(()),
                BackendHealth::Healthy { .. } => Err(AppError::BackendNotReady(format!(
                    "model {} is not installed",
                    config.model
                ))),
                BackendHealth::Degraded { status } => {
                    Err(AppError::BackendNotReady(format!("HTTP {}", status)))
                }
                BackendHealth::Unreachable { reason } => Err(AppError::BackendNotReady(reason)),
            }
        }
        Workload::Single(request) => {
            let pipeline = build_pipeline(config, client)?;
            let result = pipeline
                .run(&request.requirement, request.network_state.as_deref())
                .await;
            deliver_rendered(config, render_result(&result, config.format)?)?;
            check_runs(std::slice::from_ref(&result))
        }
        Workload::Batch(path) => {
            let requests = load_requests(path)?;
            let pipeline = build_pipeline(config, client)?;
            let results = pipeline.run_batch(requests, config.concurrency).await;
            deliver_rendered(config, render_batch(&results, config.format)?)?;
            check_runs(&results)
        }
    }
}

fn build_pipeline(config: &PipelineConfig, client: OllamaClient) -> Result<Pipeline, AppError> {
    let templates = match &config.template_dir {
        Some(dir) => PromptTemplates::from_dir(dir)?,
        None => PromptTemplates::builtin()?,
    };
    log::info!("Using prompt templates {}", templates.version());

    let backend = BoundedBackend::new(Arc::new(client), config.concurrency);
    Ok(Pipeline::new(
        Arc::new(backend),
        Arc::new(templates),
        config.pipeline_settings(),
    ))
}

/// Delivers rendered output to the configured file, or stdout.
fn deliver_rendered(config: &PipelineConfig, rendered: String) -> Result<(), AppError> {
    let target = DeliveryTarget::select(config.output_file.as_deref(), config.pipe);
    deliver(&target, &rendered)?;

    if let DeliveryTarget::File(path) = &target {
        println!("✓ Result saved to {}", path.display());
    }

    Ok(())
}

fn check_runs(results: &[PipelineResult]) -> Result<(), AppError> {
    let failed = results.iter().filter(|r| !r.success()).count();
    if failed > 0 {
        return Err(AppError::RunsFailed {
            failed,
            total: results.len(),
        });
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {}", e))?;

    let config = PipelineConfig::resolve(cli).context("invalid configuration")?;

    execute(&config).await?;

    Ok(())
}
