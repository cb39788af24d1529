//! bigsdb-rest - command line client for BIGSdb REST databases.
//!
//! Lists typing schemes, downloads allele FASTA files and calls
//! authenticated routes, obtaining and renewing OAuth tokens on the way.

mod cli;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use bigsdb_rest_core::alleles::{download_alleles, DownloadRequest};
use bigsdb_rest_core::catalog::{matching_schemes, SchemeFilter};
use bigsdb_rest_core::{
    ApiClient, ApiError, ClientConfig, CredentialStore, FileCredentialStore,
    KeyringCredentialStore, Payload, TerminalOperator, TokenManager,
};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Command, RequestArgs};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(e),
    }
}

/// Request-level rejections are reported but leave the exit status clean;
/// everything else fails the process.
fn report(err: anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ApiError>() {
        Some(api_err) if !api_err.is_fatal() => {
            eprintln!("{}", api_err);
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::load()?;
    if let Some(url) = cli.rest_url {
        config.rest_url = url;
    }
    if let Some(url) = cli.web_url {
        config.web_url = url;
    }
    debug!(rest_url = %config.rest_url, "Loaded configuration");

    match cli.command {
        Command::Schemes {
            match_term,
            exclude,
        } => list_schemes(&config, match_term.as_deref(), exclude.as_deref()).await,
        Command::DownloadAlleles {
            database,
            dir,
            scheme_id,
        } => {
            let request = DownloadRequest {
                database,
                dir,
                scheme_id,
            };
            download(&config, &request).await
        }
        Command::Request(args) => call_route(config, args).await,
    }
}

async fn list_schemes(config: &ClientConfig, match_term: Option<&str>, exclude: Option<&str>) -> Result<()> {
    let client = ApiClient::new(config)?;
    let filter = SchemeFilter::new(match_term, exclude)?;
    for entry in matching_schemes(&client, &filter).await? {
        println!("{}", entry);
    }
    Ok(())
}

async fn download(config: &ClientConfig, request: &DownloadRequest) -> Result<()> {
    let client = ApiClient::new(config)?;
    let summary = download_alleles(&client, request).await?;
    info!(
        written = summary.written.len(),
        skipped = summary.skipped.len(),
        "Download finished"
    );
    eprintln!(
        "Wrote {} allele file(s) to {}",
        summary.written.len(),
        request.dir.display()
    );
    Ok(())
}

async fn call_route(mut config: ClientConfig, args: RequestArgs) -> Result<()> {
    if let Some(database) = args.database.clone() {
        config.database = database;
    }
    if let Some(dir) = args.token_dir.clone() {
        config.token_dir = dir;
    }

    // Upload files are checked before any token traffic
    let payload = Payload::from_sources(&args.upload_sources())?;

    let store: Box<dyn CredentialStore> = if args.keyring {
        Box::new(KeyringCredentialStore::for_config(&config)?)
    } else {
        Box::new(FileCredentialStore::new(config.token_dir.clone()))
    };
    let operator = TerminalOperator::new(args.prompt);
    let manager = TokenManager::new(config, store, Box::new(operator))?;

    let body = if args.method.has_body() {
        Some(&payload)
    } else {
        if !payload.is_empty() {
            warn!(method = %args.method, "Upload fields are only sent with POST or PUT");
        }
        None
    };
    let response = manager.call(&args.route, args.method, body).await?;
    println!("{}", response);
    Ok(())
}
