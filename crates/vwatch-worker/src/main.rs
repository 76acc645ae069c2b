//! One-shot analysis binary.
//!
//! Usage: `vwatch-analyze <source> [name]`
//!
//! Prints the event list as JSON on stdout. With `SAVE_TO_LIBRARY=1` the
//! completed run is also saved to the video library.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vwatch_media::{display_name, FileVideoSource};
use vwatch_ml_client::HttpEventClassifier;
use vwatch_models::{RunId, RunStatus, VideoRecord};
use vwatch_storage::LibraryStore;
use vwatch_worker::{PipelineConfig, PipelineOrchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();
    init_tracing()?;

    let mut args = std::env::args().skip(1);
    let Some(source) = args.next() else {
        bail!("usage: vwatch-analyze <source> [name]");
    };
    let name = args.next().unwrap_or_else(|| display_name(&source));

    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);

    let classifier = HttpEventClassifier::from_env().context("creating classifier client")?;
    let orchestrator = PipelineOrchestrator::new(config, Arc::new(classifier))?;

    let mut video = FileVideoSource::new(source.as_str());
    let snapshot = orchestrator.run(RunId::new(), &mut video, &name).await;

    if snapshot.status != RunStatus::Completed {
        bail!(
            "analysis failed: {}",
            snapshot.error_message.as_deref().unwrap_or("unknown error")
        );
    }

    println!("{}", serde_json::to_string_pretty(&snapshot.events)?);

    let save = std::env::var("SAVE_TO_LIBRARY")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if save {
        let library = LibraryStore::from_env().await?;
        let record = library.create(VideoRecord::from_run(&snapshot, None)).await?;
        info!(id = %record.id, path = %library.path().display(), "Saved analysis to library");
    }

    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("vwatch=info".parse()?);

    // Logs go to stderr so stdout stays pipeable JSON
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}
