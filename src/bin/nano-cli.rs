use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::process::ExitCode;

use nano_wallet::blockchain::wallet::derive_address;
use nano_wallet::tools::ToolResponse;

#[derive(Parser)]
#[command(name = "nano-cli")]
#[command(about = "Command line client for the Nano wallet tool server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8090")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send Nano from the server's account
    Send {
        destination_address: String,
        /// Amount in Nano
        amount: String,
    },
    /// Show any account's balance, representative and frontier
    AccountInfo { address: String },
    /// Show the server's own account
    MyAccount,
    /// Show a block by hash
    BlockInfo { hash: String },
    /// List the tools the server offers
    Tools,
    /// Print the address for a private key without contacting the server
    DeriveAddress {
        /// 64 hex characters
        private_key: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let (tool, args) = match cli.command {
        Commands::Send {
            destination_address,
            amount,
        } => ("nano_send", json!({ "destination_address": destination_address, "amount": amount })),
        Commands::AccountInfo { address } => ("nano_account_info", json!({ "address": address })),
        Commands::MyAccount => ("nano_my_account_info", json!({})),
        Commands::BlockInfo { hash } => ("block_info", json!({ "hash": hash })),
        Commands::Tools => {
            let res = client.get(format!("{}/tools", cli.url)).send().await?;
            let json: Value = res.error_for_status()?.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
            return Ok(ExitCode::SUCCESS);
        }
        Commands::DeriveAddress { private_key } => {
            println!("{}", derive_address(&private_key)?);
            return Ok(ExitCode::SUCCESS);
        }
    };

    let res = client
        .post(format!("{}/tools/{}", cli.url, tool))
        .json(&args)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    let response: ToolResponse = match serde_json::from_str(&text) {
        Ok(response) => response,
        Err(_) => {
            eprintln!("Error: server returned status {}", status);
            eprintln!("Response: {}", text);
            return Ok(ExitCode::FAILURE);
        }
    };

    let message = response.text_content().unwrap_or_default();
    if response.is_error {
        eprintln!("{}", message);
        Ok(ExitCode::FAILURE)
    } else {
        println!("{}", message);
        Ok(ExitCode::SUCCESS)
    }
}
