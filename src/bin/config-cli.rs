use clap::{Parser, Subcommand};
use serde_json::Value;

use config_service::config::overrides::parse_assignments;

#[derive(Parser)]
#[command(name = "config-cli")]
#[command(about = "Read and update a running config-service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration
    Get {
        /// Print a single key only
        key: Option<String>,
    },
    /// Apply KEY=VALUE updates (values are JSON when they parse as JSON)
    Set {
        #[arg(required = true, value_name = "KEY=VALUE")]
        assignments: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let endpoint = format!("{}/api/v1/config", cli.url.trim_end_matches('/'));

    match cli.command {
        Commands::Get { key } => {
            let res = client.get(&endpoint).send().await?;
            if !res.status().is_success() {
                return report_failure(res).await;
            }
            let config: Value = res.json().await?;
            let shown = match key {
                Some(key) => config.get(&key).cloned().unwrap_or(Value::Null),
                None => config,
            };
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        Commands::Set { assignments } => {
            let fragment = parse_assignments(assignments.iter().map(String::as_str))?;
            let res = client.patch(&endpoint).json(&fragment).send().await?;
            if !res.status().is_success() {
                return report_failure(res).await;
            }
            println!("{}", res.text().await?);
        }
    }

    Ok(())
}

async fn report_failure(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    eprintln!("Error: config-service returned status {}", status);
    if let Ok(text) = res.text().await {
        eprintln!("Response: {}", text);
    }
    std::process::exit(1);
}
