//! TourCMS CLI - signed calls against the TourCMS API from the command line.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tourcms_sdk::{
    ApiResponse, Endpoint, EndpointCall, Params, TourCmsClient, TracingLogger, Verb, ENDPOINTS,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "tourcms")]
#[command(about = "Signed command-line client for the TourCMS API")]
struct Cli {
    /// Config file (default: $TOURCMS_CONFIG, then apps/cli/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,
    /// Decode the response element instead of printing the raw body
    #[arg(long, global = true)]
    parsed: bool,
    /// Trace the request and response on stderr (target tourcms::wire)
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the endpoints this client knows about
    Endpoints,
    /// Call an endpoint by name
    Call {
        /// Endpoint name, e.g. show_tour or datesndeals
        endpoint: String,
        /// Channel id (0 = marketplace)
        #[arg(long, default_value_t = 0)]
        channel: u64,
        /// Tour id, booking id or single tour id
        #[arg(long)]
        id: Option<String>,
        /// Extra query parameter, repeatable
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// File holding the XML payload for booking endpoints
        #[arg(long)]
        body_file: Option<PathBuf>,
    },
    /// Print the canonical string and signature for a request
    Sign {
        #[arg(long, default_value_t = 0)]
        channel: u64,
        #[arg(long, default_value = "GET")]
        verb: Verb,
        /// Unix seconds (default: now)
        #[arg(long)]
        timestamp: Option<i64>,
        /// Path plus query, exactly as it goes on the wire
        #[arg(long)]
        path: String,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.debug { "info,tourcms::wire=debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Endpoints => {
            print_endpoints();
            Ok(())
        }
        Commands::Call {
            endpoint,
            channel,
            id,
            params,
            body_file,
        } => {
            let client = build_client(cli.config.as_deref(), cli.parsed, cli.debug)?;
            let endpoint: Endpoint = endpoint.parse()?;

            let mut call = EndpointCall::new(endpoint)
                .channel(channel)
                .params(params.into_iter().collect::<Params>());
            if let Some(id) = id {
                call = call.id(id);
            }
            if let Some(path) = body_file {
                let body = std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                call = call.body(body);
            }

            info!("Calling {} on channel {}", endpoint, channel);
            let response = client.call(call).await?;
            print_response(response)
        }
        Commands::Sign {
            channel,
            verb,
            timestamp,
            path,
        } => {
            let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
            let client_config = config.into_client_config(false, false)?;
            let credentials = &client_config.credentials;

            let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp());
            let ctx = credentials.signing_context(channel, verb, timestamp, &path);
            println!("canonical: {}", ctx.canonical_string());
            println!("signature: {}", credentials.sign(&ctx));
            Ok(())
        }
    }
}

fn build_client(path: Option<&str>, parsed: bool, debug: bool) -> Result<TourCmsClient> {
    let config = Config::load(path).context("Failed to load configuration")?;
    let client_config = config.into_client_config(parsed, debug)?;
    info!(
        "TourCMS marketplace {} at {}",
        client_config.credentials.marketplace_id, client_config.base_url
    );
    let client = TourCmsClient::with_config(client_config)?;
    Ok(if debug {
        client.with_logger(Arc::new(TracingLogger))
    } else {
        client
    })
}

fn print_endpoints() {
    println!("{:<26} {:<5} {:<12} {}", "NAME", "VERB", "IDENTIFIER", "PATHS");
    for spec in ENDPOINTS.iter() {
        let mut paths: Vec<&str> = [spec.marketplace_path, spec.channel_path]
            .into_iter()
            .flatten()
            .collect();
        paths.dedup();
        println!(
            "{:<26} {:<5} {:<12} {}",
            spec.name,
            spec.verb,
            spec.identifier.map(|i| i.key).unwrap_or("-"),
            paths.join(" | ")
        );
    }
}

fn print_response(response: ApiResponse) -> Result<()> {
    match response {
        ApiResponse::Raw(raw) => {
            eprintln!("HTTP {}", raw.status);
            println!("{}", raw.text());
        }
        ApiResponse::Parsed(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}
