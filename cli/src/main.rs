// Copyright (c) 2026 Eyowo Developers. MIT License.
// See LICENSE for details.

//! # Eyowo CLI
//!
//! Entry point for the `eyowo` binary. Parses CLI arguments, initializes
//! logging, configures the client and runs one command.
//!
//! Subcommands:
//!
//! - `envelope`     build and print an encrypted envelope without sending it
//! - `open`         decrypt an `authData` string
//! - `balance`, `bill`, `credit-bank`, `credit-phone`  send a request
//! - `version`      print build version information

mod cli;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value};

use eyowo::envelope;
use eyowo::operation::lookup_by_name;
use eyowo::{Client, ClientConfig, HttpTransport, Operation};

use cli::{Commands, ConfigArgs, EyowoCli, RequestArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = EyowoCli::parse();
    logging::init_logging("eyowo=info,eyowo_cli=info", cli.log_format);

    match cli.command {
        Commands::Envelope(args) => {
            let config = configure(&cli.config)?;
            let spec = lookup_by_name(&args.operation)?;
            let params = args.request.to_params()?;
            let envelope = envelope::construct(&config, &params, spec.operation)?;
            print_json(&serde_json::to_value(&envelope)?)
        }
        Commands::Open(args) => {
            let config = configure(&cli.config)?;
            let payload = envelope::open_auth_data(&config, &args.auth_data)
                .context("could not decrypt authData with this app key and IV")?;
            print_json(&payload)
        }
        Commands::Balance(args) => send(&cli.config, Operation::GetBalance, &args).await,
        Commands::Bill(args) => send(&cli.config, Operation::CreateBill, &args).await,
        Commands::CreditBank(args) => send(&cli.config, Operation::BankTransfer, &args).await,
        Commands::CreditPhone(args) => send(&cli.config, Operation::MobileTransfer, &args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Install the process-wide client configuration from the CLI flags.
fn configure(args: &ConfigArgs) -> Result<Arc<ClientConfig>> {
    let config = eyowo::init(&args.init_params(), args.init_options())
        .context("failed to configure the Eyowo client")?;
    tracing::debug!(?config, "client configured");
    Ok(config)
}

/// Build, send and print one API call.
async fn send(args: &ConfigArgs, operation: Operation, request: &RequestArgs) -> Result<()> {
    let config = configure(args)?;
    let params = request.to_params()?;

    let transport = match &args.base_url {
        Some(base_url) => HttpTransport::with_base_url(&config, base_url)?,
        None => HttpTransport::new(&config)?,
    };
    tracing::info!(%operation, base_url = transport.base_url(), "sending request");

    let client = Client::new(config, transport);
    let response = client
        .execute(operation, &params)
        .await
        .with_context(|| format!("{operation} failed"))?;

    print_json(&json!({ "status": response.status, "body": response.body }))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("eyowo {}", env!("CARGO_PKG_VERSION"));
    println!("api   v{}", eyowo::config::DEFAULT_API_VERSION);
    println!("rustc {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
