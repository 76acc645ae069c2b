use std::path::Path;
use std::process::Command;

use vwatch_ml_client::ClassifierConfig;
use vwatch_storage::LibraryConfig;
use vwatch_worker::PipelineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = PipelineConfig::from_env();
    let library = LibraryConfig::from_env();

    println!(
        "worker-selfcheck: starting with interval={}s library={}",
        config.sample_interval,
        library.path.display()
    );
    config.validate()?;
    ensure_library_dir(&library.path).await?;
    ensure_tool("ffmpeg")?;
    ensure_tool("ffprobe")?;
    let classifier = ClassifierConfig::from_env()?;
    println!("worker-selfcheck: classifier at {}", classifier.base_url);

    println!("worker-selfcheck: ok");
    Ok(())
}

async fn ensure_library_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

fn ensure_tool(tool: &str) -> anyhow::Result<()> {
    let output = Command::new(tool)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("{} not available: {}", tool, e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "{} -version failed: {:?}",
            tool,
            output.status
        ));
    }
    Ok(())
}
