use anyhow::Context;
use clap::Parser;
use imdb_transfer::{
    read_ratings_csv, read_watchlist_csv, AppConfig, CheckpointStore, Cli, Credential,
    ImdbClient, RunStatus, Transfer, TransferPlan,
};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref());
    let level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("imdb_transfer={}", level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<ExitCode> {
    let credential = Credential::from_file(&cli.cookie)?;

    let store = CheckpointStore::new(
        cli.checkpoint
            .clone()
            .unwrap_or_else(|| config.checkpoint.path.clone()),
    );
    let checkpoint = store.load();
    tracing::info!(
        path = %store.path().display(),
        ratings = checkpoint.ratings.len(),
        watchlist = checkpoint.watchlist.len(),
        "Loaded checkpoint"
    );

    let mut plan = TransferPlan::default();
    if let Some(path) = &cli.ratings {
        let parsed = read_ratings_csv(path)
            .with_context(|| format!("reading ratings from {}", path.display()))?;
        tracing::info!(
            entries = parsed.entries.len(),
            skipped = parsed.skipped.len(),
            "Read ratings export"
        );
        plan.ratings = Some(parsed.entries);
    }
    if let Some(path) = &cli.watchlist {
        let parsed = read_watchlist_csv(path)
            .with_context(|| format!("reading watchlist from {}", path.display()))?;
        tracing::info!(
            entries = parsed.entries.len(),
            skipped = parsed.skipped.len(),
            "Read watchlist export"
        );
        plan.watchlist = Some(parsed.entries);
    }

    let client = ImdbClient::new(config.api, credential)?;
    let summary = Transfer::new(&client, &store).run(&plan, checkpoint).await?;

    for report in &summary.reports {
        tracing::info!(
            category = %report.category,
            submitted = report.submitted,
            outcome = ?report.outcome,
            "Category finished"
        );
    }

    if let RunStatus::Aborted { detail } = &summary.status {
        tracing::error!(detail = %detail, "Transfer aborted");
    }
    Ok(ExitCode::from(summary.status.exit_code()))
}
