//! Import drug interaction claims from a delimited file.

use anyhow::{Context, Result};
use interaction_bot::cli::Cli;
use interaction_bot::domains::interactions::ClaimImporter;
use interaction_bot::kernel::{HttpFileFetcher, WikibaseAdapter};
use interaction_bot::Config;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wikibase_client::WikibaseClient;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,interaction_bot=debug,wikibase_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse_args();
    let print_json = cli.json;

    let options = match cli.into_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::from(2));
        }
    };

    let config = Config::from_env().context("Failed to load configuration")?;
    let credentials = match config.login_credentials(options.dry_run) {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::from(2));
        }
    };

    let mut client = WikibaseClient::new(config.wikibase_options())
        .context("Failed to create Wikibase client")?;
    if let Some((username, password)) = credentials {
        client
            .login(username, password)
            .await
            .context("Failed to log in to Wikibase")?;
        tracing::info!(username, api = %config.api_url, "Logged in");
    } else {
        tracing::info!(api = %config.api_url, "Running anonymously (dry run)");
    }

    let kb = Arc::new(WikibaseAdapter::new(client, &options.site, &options.lang));
    let fetcher = HttpFileFetcher::new()?;

    if options.dry_run {
        tracing::info!("Bot is set dry, nothing will be changed");
    }

    let importer = ClaimImporter::from_options(kb, &options);
    let report = importer.import(&fetcher, &options).await?;

    if print_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    }

    Ok(ExitCode::SUCCESS)
}
