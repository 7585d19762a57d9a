use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use xchain_sdk::config::{load_config, SdkConfig};
use xchain_sdk::observability::logging::init_tracing;
use xchain_sdk::{HttpService, Resource, RpcClient, SdkResult};

#[derive(Parser)]
#[command(name = "xchain-cli")]
#[command(about = "Query and invoke cross-chain resources", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gateway URL (overrides config).
    #[arg(short, long)]
    server: Option<String>,

    /// Signing account (overrides config).
    #[arg(short, long)]
    account: Option<String>,

    /// Per-call deadline in milliseconds (overrides config).
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show resource status
    Status { path: String },
    /// Show resource description
    Info { path: String },
    /// Read-only contract call
    Call {
        path: String,
        method: String,
        args: Vec<String>,
    },
    /// State-mutating contract call
    SendTransaction {
        path: String,
        method: String,
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => SdkConfig::default(),
    };
    init_tracing(&config.observability.log_level);

    match run(cli, config).await {
        Ok(value) => {
            match serde_json::to_string_pretty(&value) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: SdkConfig) -> SdkResult<Value> {
    let server = cli.server.unwrap_or(config.rpc.server);
    let account = cli.account.unwrap_or(config.resource.account);
    let timeout_ms = cli.timeout_ms.unwrap_or(config.rpc.timeout_ms);

    let service = HttpService::new(&server)?;
    let rpc = RpcClient::new(Arc::new(service)).with_timeout(std::time::Duration::from_millis(timeout_ms));
    tracing::debug!(%server, timeout_ms, "Client ready");

    match cli.command {
        Commands::Status { path } => {
            let status = rpc.resource(&path, &account).status().await?;
            Ok(json!({ "path": path, "status": status }))
        }
        Commands::Info { path } => {
            let info = rpc.resource(&path, &account).info().await?;
            Ok(json!(info))
        }
        Commands::Call { path, method, args } => {
            let resource = checked(&rpc, &path, &account)?;
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let result = resource.call(&method, &args).await?;
            Ok(json!({ "result": result }))
        }
        Commands::SendTransaction { path, method, args } => {
            let resource = checked(&rpc, &path, &account)?;
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let result = resource.send_transaction(&method, &args).await?;
            Ok(json!({ "result": result }))
        }
    }
}

fn checked(rpc: &RpcClient, path: &str, account: &str) -> SdkResult<Resource> {
    let resource = rpc.resource(path, account);
    resource.check()?;
    Ok(resource)
}
