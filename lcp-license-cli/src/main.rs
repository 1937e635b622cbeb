//! Command-line demonstrator for the license validation engine.
//!
//! Reads a License or Status Document from disk, wires real (or stubbed)
//! collaborators, and prints the terminal outcome as JSON.
//!
//! Usage:
//!   lcp-license --license publication.lcpl
//!   lcp-license --status status.json --crl-url https://crl.example.com

mod collaborators;
mod parsing;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use lcp_license::net::{HttpCrlService, HttpDeviceService, HttpNetworkClient};
use lcp_license::{
    Authentication, EngineConfig, EngineSettings, Input, LicenseOutcome, Outcome, Sender,
    ValidatedDocuments, ValidationEngine,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use url::Url;

use crate::collaborators::{NullCrlService, NullLcpClient, StdinPassphraseService};
use crate::parsing::{DefaultLicenseParser, DefaultStatusParser};

#[derive(Parser, Debug)]
#[command(name = "lcp-license")]
#[command(about = "Validate a Readium LCP license or status document")]
struct Args {
    /// Path to a License Document JSON file.
    #[arg(long, conflicts_with = "status")]
    license: Option<PathBuf>,

    /// Path to a Status Document JSON file.
    #[arg(long)]
    status: Option<PathBuf>,

    /// CRL endpoint to fetch before integrity validation.
    #[arg(long)]
    crl_url: Option<Url>,

    /// Device id forwarded to the registration endpoint.
    #[arg(long, default_value = "cli-device")]
    device_id: String,

    /// Device name forwarded to the registration endpoint.
    #[arg(long, default_value = "lcp-license-cli")]
    device_name: String,

    /// Path to an `EngineSettings` TOML file (defaults to
    /// `~/.readium/lcp-license.toml`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Disallow interactive passphrase prompting.
    #[arg(long)]
    no_interaction: bool,

    /// Enable verbose debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let settings = match &args.settings {
        Some(path) => EngineSettings::load_from(path),
        None => EngineSettings::load(),
    };

    let network = Arc::new(HttpNetworkClient::new().context("building HTTP client")?);
    let crl: Arc<dyn lcp_license::CrlService> = match &args.crl_url {
        Some(url) => Arc::new(HttpCrlService::new(
            network.clone(),
            url.clone(),
            settings.network_timeout(),
        )),
        None => Arc::new(NullCrlService),
    };
    let device = Arc::new(
        HttpDeviceService::new(args.device_id.clone(), args.device_name.clone())
            .context("building device service")?,
    );

    let config = EngineConfig {
        authentication: Authentication::default(),
        allow_user_interaction: !args.no_interaction,
        sender: Sender::default(),
        settings,
        network,
        crl,
        device,
        passphrases: Arc::new(StdinPassphraseService),
        lcp_client: Arc::new(NullLcpClient),
        license_parser: Arc::new(DefaultLicenseParser),
        status_parser: Arc::new(DefaultStatusParser),
        on_license_validated: Arc::new(|license| {
            tracing::info!(profile = license.profile(), "license validated");
        }),
    };

    let engine = ValidationEngine::new(config);

    let input = match (args.license, args.status) {
        (Some(path), None) => {
            let bytes =
                std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            Input::License(bytes)
        }
        (None, Some(path)) => {
            let bytes =
                std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            Input::Status(bytes)
        }
        _ => anyhow::bail!("exactly one of --license or --status is required"),
    };

    let result: Arc<Mutex<Option<Outcome>>> = Arc::new(Mutex::new(None));
    let slot = result.clone();
    engine
        .validate(
            input,
            Box::new(move |documents, error| {
                let outcome = match (documents, error) {
                    (Some(docs), _) => Outcome::Valid(docs),
                    (None, Some(e)) => Outcome::Failure(e),
                    (None, None) => Outcome::Cancelled,
                };
                *slot.lock().unwrap() = Some(outcome);
            }),
        )
        .await;

    match result.lock().unwrap().take() {
        Some(Outcome::Valid(docs)) => {
            println!("{}", serde_json::to_string_pretty(&summarize(&docs))?);
        }
        Some(Outcome::Failure(error)) => {
            let message = error.user_message();
            eprintln!("validation failed: {}", serde_json::to_string_pretty(&message)?);
            std::process::exit(1);
        }
        Some(Outcome::Cancelled) | None => {
            eprintln!("cancelled");
            std::process::exit(2);
        }
    }

    Ok(())
}

fn summarize(docs: &ValidatedDocuments) -> serde_json::Value {
    let outcome = match &docs.outcome {
        LicenseOutcome::Context(_) => serde_json::json!({ "usable": true }),
        LicenseOutcome::Status(err) => {
            serde_json::json!({ "usable": false, "reason": err.to_string() })
        }
    };
    serde_json::json!({
        "profile": docs.license.profile(),
        "status_attached": docs.status.is_some(),
        "outcome": outcome,
    })
}
