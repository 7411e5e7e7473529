//! Command-line front end for the service connector.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI args ──▶ config (TOML + overrides) ──▶ logging / metrics
//!                                                   │
//!                                                   ▼
//!                                       ┌──────────────────────┐
//!   completion ◀── registry.complete ◀──│   ServiceConnector   │──▶ reqwest ──▶ API
//!       │                               │  (request registry)  │
//!       ▼                               └──────────▲───────────┘
//!   stdout (pretty JSON)                           │
//!                                   Ctrl-C / SIGTERM ──▶ cancel_all()
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tokio::sync::oneshot;

use service_connector::config::{load_config, ConnectorConfig};
use service_connector::config::validation::validate_config;
use service_connector::connector::{ApiResponse, Params, RequestHandle, ServiceConnector};
use service_connector::lifecycle::signals::wait_for_shutdown_signal;
use service_connector::lifecycle::{LifecycleEvent, Shutdown};
use service_connector::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "service-connector")]
#[command(about = "Issue tracked, cancellable HTTP API calls", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL for relative endpoints (overrides the config file).
    #[arg(short, long)]
    base_url: Option<String>,

    /// Token sent in the `authorization` header.
    #[arg(short, long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RequestArgs {
    /// Endpoint, absolute or relative to the base URL.
    endpoint: String,

    /// Parameter as key=value (repeatable).
    #[arg(short, long = "param")]
    params: Vec<String>,

    /// Raw JSON body (object, or array of objects for PUT).
    #[arg(long)]
    body: Option<String>,

    /// Send parameters form-urlencoded.
    #[arg(long)]
    form: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// GET an endpoint
    Get(RequestArgs),
    /// POST to an endpoint
    Post(RequestArgs),
    /// PUT to an endpoint
    Put(RequestArgs),
    /// PATCH an endpoint
    Patch(RequestArgs),
    /// DELETE an endpoint
    Delete(RequestArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ConnectorConfig::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.http.base_url = Some(base_url.clone());
        validate_config(&config).map_err(|errors| {
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })?;
    }

    logging::init(&config.observability);
    LifecycleEvent::Started.log();

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let connector = ServiceConnector::from_config(&config)?;
    let (tx, rx) = oneshot::channel();
    let handle = dispatch(&connector, &cli, move |res| {
        let _ = tx.send(res);
    })?
    .ok_or("request could not be constructed")?;

    tracing::info!(request_id = %handle.id(), method = %handle.method(), "Request dispatched");
    LifecycleEvent::Active.log();

    let shutdown = Shutdown::new();
    let mut shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown.trigger();
    });

    let outcome = tokio::select! {
        res = rx => print_response(res?),
        _ = shutdown_rx.recv() => {
            let cancelled = connector.cancel_all();
            tracing::info!(cancelled, "Outstanding requests cancelled");
            Ok(())
        }
    };

    drop(connector);
    LifecycleEvent::Terminated.log();
    outcome
}

fn dispatch<F>(
    connector: &ServiceConnector,
    cli: &Cli,
    completion: F,
) -> Result<Option<RequestHandle>, Box<dyn std::error::Error>>
where
    F: FnOnce(ApiResponse) + Send + 'static,
{
    let token = cli.token.as_deref();
    let handle = match &cli.command {
        Commands::Get(args) if args.form => {
            let body = parse_params(&args.params)?;
            connector.get_form_with_object_body(&args.endpoint, body, token, completion)
        }
        Commands::Get(args) => {
            let params = optional_params(&args.params)?;
            connector.get(&args.endpoint, params, token, completion)
        }
        Commands::Delete(args) => {
            let params = optional_params(&args.params)?;
            connector.delete(&args.endpoint, params, token, completion)
        }
        Commands::Patch(args) => {
            let params = optional_params(&args.params)?;
            connector.patch(&args.endpoint, params, token, completion)
        }
        Commands::Post(args) => match parse_body(args.body.as_deref())? {
            Some(Value::Object(body)) if args.form => {
                connector.post_form_with_object_body(&args.endpoint, body, token, completion)
            }
            Some(Value::Object(body)) => {
                connector.post_with_object_body(&args.endpoint, body, token, completion)
            }
            Some(_) => return Err("POST body must be a JSON object".into()),
            None if args.form => {
                let body = parse_params(&args.params)?;
                connector.post_form_with_object_body(&args.endpoint, body, token, completion)
            }
            None => {
                let params = optional_params(&args.params)?;
                connector.post(&args.endpoint, params, token, completion)
            }
        },
        Commands::Put(args) => match parse_body(args.body.as_deref())? {
            Some(Value::Object(body)) => {
                connector.put_with_object_body(&args.endpoint, body, token, completion)
            }
            Some(Value::Array(items)) => {
                let body = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(map) => Ok(map),
                        _ => Err("PUT array body must contain only objects"),
                    })
                    .collect::<Result<Vec<Params>, _>>()?;
                connector.put_with_array_object_body(&args.endpoint, body, token, completion)
            }
            Some(_) => return Err("PUT body must be a JSON object or array of objects".into()),
            None => {
                let params = optional_params(&args.params)?;
                connector.put(&args.endpoint, params, token, completion)
            }
        },
    };
    Ok(handle)
}

/// Parse `key=value` pairs into a parameter object.
fn parse_params(pairs: &[String]) -> Result<Params, String> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .ok_or_else(|| format!("parameter '{}' is not key=value", pair))
        })
        .collect()
}

fn optional_params(pairs: &[String]) -> Result<Option<Params>, String> {
    if pairs.is_empty() {
        Ok(None)
    } else {
        parse_params(pairs).map(Some)
    }
}

fn parse_body(raw: Option<&str>) -> Result<Option<Value>, serde_json::Error> {
    raw.map(serde_json::from_str).transpose()
}

fn print_response(res: ApiResponse) -> Result<(), Box<dyn std::error::Error>> {
    match res {
        Ok(payload) => {
            tracing::debug!(
                status = %payload.status,
                elapsed_ms = payload.elapsed.as_millis() as u64,
                "Response received"
            );
            println!("{}", serde_json::to_string_pretty(&payload.body)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(e.into())
        }
    }
}
