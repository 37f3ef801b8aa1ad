use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use bulletin_core::{ApiError, BulletinClient, ClientConfig, FormData};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bulletin")]
#[command(about = "Manage Bulletin lists and subscribers")]
#[command(version)]
struct Cli {
    /// Bulletin API token
    #[arg(long, env = "BULLETIN_API_TOKEN", hide_env_values = true)]
    token: String,

    /// Override the API base URL
    #[arg(long, env = "BULLETIN_ENDPOINT")]
    endpoint: Option<String>,

    /// Connect and total timeout in seconds
    #[arg(long, default_value_t = 3)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show all lists
    Lists,
    /// Subscribe someone to a list
    Subscribe {
        /// List id
        list_id: String,
        /// Subscriber field (KEY=VALUE); repeat a key to send an array
        #[arg(long = "field", short = 'f', value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(payload) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<ApiError>() {
                Some(api) => eprintln!("error ({}): {}", api.code(), api),
                None => eprintln!("error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Value> {
    let timeout = Duration::from_secs(cli.timeout_secs);
    let mut config = ClientConfig::default().with_timeouts(timeout, timeout);
    if let Some(endpoint) = cli.endpoint.as_deref() {
        config = config.with_endpoint(endpoint);
    }
    debug!("using endpoint {}", config.endpoint());
    let client = BulletinClient::with_config(&cli.token, config);

    let payload = match cli.command {
        Commands::Lists => client.get_lists()?,
        Commands::Subscribe { list_id, fields } => {
            if list_id.contains('/') {
                return Err(anyhow!("list id must not contain '/': {list_id}"));
            }
            let data = to_form_data(fields);
            client
                .subscribe(&list_id, &data)
                .with_context(|| format!("subscribing to list {list_id}"))?
        }
    };
    Ok(payload)
}

fn parse_field(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(anyhow!("field name is empty in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Single occurrences become strings; repeated keys become arrays.
fn to_form_data(fields: Vec<(String, String)>) -> FormData {
    let mut data = FormData::new();
    for (key, value) in fields {
        match data.get_mut(&key) {
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                data.insert(key, Value::String(value));
            }
        }
    }
    data
}
