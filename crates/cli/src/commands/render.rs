//! `perspective render` — Load a schema and print or save its report.

use perspective_config::AppConfig;
use perspective_core::{Document, RenderOptions};
use perspective_fetch::{CloudHealthClient, FileLoader, SchemaLoader};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, info};

pub struct RenderArgs {
    pub input_file: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub api_key: Option<String>,
    pub perspective_id: Option<String>,
}

pub async fn run(args: RenderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let document = match &args.input_file {
        Some(path) => FileLoader::new(path).load().await?,
        None => fetch(&config, args.api_key, args.perspective_id).await?,
    };

    let options = RenderOptions {
        separator_width: config.report.separator_width,
    };
    let report = perspective_core::render(&document, &options);
    debug!(
        group_blocks = report.stats.group_blocks,
        dynamic_groups = report.stats.dynamic_groups,
        suppressed = report.stats.suppressed_groups,
        static_groups = report.stats.static_groups,
        empty = report.stats.empty_static_groups,
        skipped = report.stats.skipped_records,
        "Report rendered"
    );

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, &report.text).await?;
            println!("Output written to {}", path.display());
        }
        None => println!("{}", report.text),
    }

    Ok(())
}

async fn fetch(
    config: &AppConfig,
    api_key: Option<String>,
    perspective_id: Option<String>,
) -> Result<Document, Box<dyn std::error::Error>> {
    // Shared by both prompts; a second reader would miss buffered lines.
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let api_key = match pick(api_key, config.api_key.clone()) {
        Some(key) => key,
        None => prompt(&mut stdin, "CloudHealth API Key").await?,
    };
    let perspective_id = match pick(perspective_id, None) {
        Some(id) => id,
        None => prompt(&mut stdin, "Perspective ID").await?,
    };

    eprintln!("Fetching perspective schema from CloudHealth API...");
    info!(%perspective_id, base_url = %config.api.base_url, "Fetching schema");

    let client = CloudHealthClient::new(api_key, perspective_id)?
        .with_base_url(&config.api.base_url)
        .with_timeout(Duration::from_secs(config.api.timeout_secs))?;

    Ok(client.load().await?)
}

/// First non-blank value: the command-line flag, then the configured one.
fn pick(flag: Option<String>, configured: Option<String>) -> Option<String> {
    flag.into_iter()
        .chain(configured)
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Ask for a value on the terminal.
async fn prompt<R>(lines: &mut Lines<R>, label: &str) -> Result<String, Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
{
    print!("{label}: ");
    std::io::stdout().flush()?;

    let line = lines
        .next_line()
        .await?
        .ok_or_else(|| format!("No {label} provided"))?;
    Ok(line.trim().to_string())
}
