use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mpesa_client::{
    DEFAULT_GRANT_TYPE, GatewayClient, GatewayConfig, GatewayResponse, Operation, Payload, TokenOptions,
    acquire_token,
};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

/// Call the M-Pesa API from the command line
#[derive(Parser)]
#[command(name = "mpesa-cli", version, about)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Environment to target, overriding the configuration
    #[arg(long = "env", global = true)]
    environment: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Request an OAuth access token
    Token {
        #[arg(long, env = "MPESA_CONSUMER_KEY")]
        consumer_key: String,

        #[arg(long, env = "MPESA_CONSUMER_SECRET", hide_env_values = true)]
        consumer_secret: String,

        #[arg(long, default_value = DEFAULT_GRANT_TYPE)]
        grant_type: String,
    },
    /// Invoke one operation with the fields read from a JSON file
    Call {
        /// Operation name, e.g. `c2b_simulate_transaction`
        operation: Operation,

        #[arg(long, env = "MPESA_ACCESS_TOKEN", hide_env_values = true)]
        token: String,

        /// JSON object with the request fields; `-` reads standard input
        #[arg(long)]
        data: PathBuf,
    },
    /// List the operations and the fields each one requires
    Operations,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let mut config = GatewayConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(environment) = cli.environment {
        config.environment = environment;
    }

    match cli.command {
        Command::Token {
            consumer_key,
            consumer_secret,
            grant_type,
        } => {
            let options = TokenOptions::from(&config).with_grant_type(grant_type);
            let response = acquire_token(&consumer_key, &SecretString::from(consumer_secret), &options).await?;
            print_response(&response)
        }
        Command::Call {
            operation,
            token,
            data,
        } => {
            let payload = read_payload(&data)?;
            let client = GatewayClient::new(&SecretString::from(token), config)?;
            let response = client.call(operation, &payload).await?;
            print_response(&response)
        }
        Command::Operations => {
            for op in Operation::ALL {
                println!("{op}: {}", op.required_fields().join(", "));
            }
            Ok(())
        }
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_payload(path: &Path) -> Result<Payload> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read standard input")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&raw).context("request data must be a JSON object")
}

fn print_response(response: &GatewayResponse) -> Result<()> {
    println!("HTTP {}", response.status());
    match response.json::<serde_json::Value>() {
        Ok(body) => println!("{}", serde_json::to_string_pretty(&body)?),
        Err(_) => println!("{}", response.text()?),
    }
    Ok(())
}
