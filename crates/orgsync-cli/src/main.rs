//! orgsync command-line entry point.

use anyhow::{Context, Result};
use clap::Parser;
use secrecy::SecretString;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

use orgsync::inventory::write_csv;
use orgsync::secrets::{resolve_client_secret, CLIENT_ID_ENV_VAR};
use orgsync::{
    ClientConfig, Credentials, DesiredState, DryRun, KubeInventory, Orchestrator, PlatformClient,
    ResourceLoader, SyncReport,
};

mod cli;
mod prompt;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialise logging: {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

/// fmt subscriber filtered by RUST_LOG (default info), with `log` records bridged in.
fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false));

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;
    tracing_log::LogTracer::init().context("Failed to bridge log records")?;
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let resources = ResourceLoader::new(&cli.resources)
        .load()
        .with_context(|| format!("Failed to load resources from {}", cli.resources.display()))?;
    let state = DesiredState::build(&resources).context("Invalid resource definitions")?;
    log::info!(
        "Loaded {} teams, {} applications, {} environments",
        state.teams.len(),
        state.applications.len(),
        state.environments.len()
    );

    let credentials = credentials(&cli)?;
    let mut config = ClientConfig::default();
    if let Some(domain) = cli.api_domain.as_deref().filter(|d| !d.trim().is_empty()) {
        config = config.with_base_url(domain);
    }
    if let Some(ms) = cli.write_delay_ms {
        config = config.with_write_delay(Duration::from_millis(ms));
    }

    let client = PlatformClient::connect(config, &credentials)
        .await
        .context("Failed to connect to the platform")?;

    let options = cli.sync_options();
    let report: SyncReport = if cli.dry_run {
        log::info!("Dry run: writes are logged, not sent");
        let api = DryRun::new(client);
        Orchestrator::new(&api, &state, options).run().await?
    } else {
        Orchestrator::new(&client, &state, options).run().await?
    };
    log::debug!("Report: {:?}", report);

    if !cli.kube_contexts.is_empty() {
        let inventory = KubeInventory::new(cli.kubectl.clone(), cli.kube_contexts.clone());
        let images = inventory.collect().await;
        write_csv(&cli.inventory_csv, &images)
            .with_context(|| format!("Failed to export {}", cli.inventory_csv.display()))?;
    }

    Ok(())
}

/// Argument, then environment, then an interactive prompt.
fn credentials(cli: &Cli) -> Result<Credentials> {
    let client_id = match cli
        .client_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .or_else(|| std::env::var(CLIENT_ID_ENV_VAR).ok().filter(|id| !id.trim().is_empty()))
    {
        Some(id) => id,
        None => prompt::ask("Client ID")?,
    };

    let client_secret = match resolve_client_secret(cli.client_secret.as_deref())? {
        Some(secret) => secret,
        None => SecretString::from(prompt::ask("Client Secret")?),
    };

    Ok(Credentials::new(client_id.trim(), client_secret))
}
