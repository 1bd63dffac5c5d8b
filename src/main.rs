//! Liora binary
//!
//! Runs the HTTP server or one of the one-shot subcommands.

use clap::Parser;
use liora::cli::{Cli, Command, generate_config_template};
use liora::config::{Config, Credentials};
use liora::coral;
use liora::handlers::{self, AppState, catalog::CatalogResponse};
use liora::resolver::{ResolutionRequest, resolve};
use liora::telemetry;
use liora::tools::{GenAiExecuteTool, is_error_outcome};
use serde_json::{Map, Value, json};
use std::sync::Arc;

type BoxError = Box<dyn std::error::Error>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let Cli { config, command } = Cli::parse();

    match command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await,
        Command::Config { output } => write_template(output.as_deref()),
        Command::Resolve {
            model,
            output,
            with_image,
        } => {
            telemetry::init("warn");
            let resolution =
                resolve(&ResolutionRequest::new(&model, output.into()).with_image_input(with_image));
            println!("{}", resolution.endpoint);
            Ok(())
        }
        Command::Catalog => {
            println!("{}", serde_json::to_string_pretty(&CatalogResponse::current())?);
            Ok(())
        }
        Command::BestPractices { query } => {
            let state = build_state(&config)?;
            let outcome = state
                .tools()
                .execute(
                    "get-best-practices",
                    json!({ "prompt": query.unwrap_or_default() }),
                )
                .await?;
            print_outcome(&outcome)
        }
        Command::Generate {
            model,
            prompt,
            output,
            image_url,
        } => {
            let state = build_state(&config)?;
            let mut input = Map::new();
            input.insert("model".to_string(), Value::String(model));
            input.insert("prompt".to_string(), Value::String(prompt));
            input.insert(
                "outputType".to_string(),
                Value::String(liora::resolver::OutputType::from(output).to_string()),
            );
            if let Some(image_url) = image_url {
                input.insert("imageUrl".to_string(), Value::String(image_url));
            }
            let outcome = state
                .tools()
                .execute(GenAiExecuteTool::NAME, Value::Object(input))
                .await?;
            print_outcome(&outcome)
        }
    }
}

/// Load the config file, apply environment overrides and start logging
fn load_config(path: &str) -> Result<Config, BoxError> {
    let mut config = Config::from_file(path)?;
    config.apply_env_overrides(|name| std::env::var(name).ok())?;
    telemetry::init(&config.observability.log_level);
    Ok(config)
}

fn build_state(path: &str) -> Result<AppState, BoxError> {
    let config = Arc::new(load_config(path)?);
    Ok(AppState::new(config, &Credentials::from_env())?)
}

fn print_outcome(outcome: &Value) -> Result<(), BoxError> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    if is_error_outcome(outcome) {
        return Err("tool reported an error".into());
    }
    Ok(())
}

fn write_template(output: Option<&str>) -> Result<(), BoxError> {
    let template = generate_config_template();
    match output {
        Some(path) => {
            std::fs::write(path, template)?;
            eprintln!("Configuration template written to {}", path);
        }
        None => print!("{}", template),
    }
    Ok(())
}

async fn serve(config_path: &str) -> Result<(), BoxError> {
    let config = Arc::new(load_config(config_path)?);
    let credentials = Credentials::from_env();
    let state = AppState::new(config.clone(), &credentials)?;

    if let Some(sse_url) = credentials.coral_sse_url() {
        let coral_url = coral::connection_url(
            sse_url,
            config.coral.agent_id(),
            config.coral.agent_description(),
        )?;
        tracing::info!(
            coral_url = %coral_url,
            wait_timeout_ms = config.coral.timeout_ms(),
            "Coral agent connection URL"
        );
    }

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        offline = config.services.offline(),
        tools = ?state.tools().names(),
        "Starting Liora server"
    );

    let addr = config.server.socket_addr()?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, handlers::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C; shutting down");
    }
    tracing::info!("Shutdown signal received");
}
