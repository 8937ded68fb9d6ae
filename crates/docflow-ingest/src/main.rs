//! docflow Ingest - document connector tool

use anyhow::{bail, Result};
use clap::Parser;
use docflow_common::logging::{init_logging, LogConfig, LogLevel};
use docflow_ingest::config::{default_download_dir, StandardConnectorConfig, DEFAULT_CONCURRENCY};
use docflow_ingest::google_drive::{GoogleDriveConfig, GoogleDriveConnector};
use docflow_ingest::process::ElementPartitioner;
use docflow_ingest::runner::{run_connector, RunSummary};
use docflow_ingest::slack::{SlackConfig, SlackConnector};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "docflow-ingest")]
#[command(author, version, about = "Fetch and partition documents from external sources")]
struct Cli {
    /// Source to ingest from
    #[command(subcommand)]
    source: Source,

    /// Where fetched files are staged
    #[arg(long, global = true, env = "DOCFLOW_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Where element JSON is written
    #[arg(long, global = true, env = "DOCFLOW_OUTPUT_DIR", default_value = "./docflow-output")]
    output_dir: PathBuf,

    /// Keep staged files after processing
    #[arg(long, global = true, env = "DOCFLOW_PRESERVE_DOWNLOADS")]
    preserve_downloads: bool,

    /// Process documents even if their output already exists
    #[arg(long, global = true, env = "DOCFLOW_REPROCESS")]
    reprocess: bool,

    /// Documents processed at once
    #[arg(long, global = true, env = "DOCFLOW_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Source {
    /// Ingest Slack channel history
    Slack {
        /// Comma separated channel ids
        #[arg(long)]
        channels: String,

        /// Bot or user token
        #[arg(long, env = "SLACK_TOKEN", hide_env_values = true)]
        token: String,

        /// Earliest message time (YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS[+zzzz] or epoch seconds)
        #[arg(long)]
        oldest: Option<String>,

        /// Latest message time, same formats as --oldest
        #[arg(long)]
        latest: Option<String>,
    },

    /// Ingest files from Google Drive
    GoogleDrive {
        /// Drive file or folder id
        #[arg(long)]
        drive_id: String,

        /// OAuth access token
        #[arg(long, env = "GOOGLE_DRIVE_TOKEN", hide_env_values = true)]
        token: String,

        /// Only process files with this extension, e.g. .pdf
        #[arg(long)]
        extension: Option<String>,

        /// Descend into sub-folders
        #[arg(long)]
        recursive: bool,
    },
}

impl Cli {
    fn settings(&self) -> StandardConnectorConfig {
        StandardConnectorConfig::new(
            self.download_dir.clone().unwrap_or_else(default_download_dir),
            self.output_dir.clone(),
        )
        .with_retain_artifacts(self.preserve_downloads)
        .with_reprocess(self.reprocess)
        .with_concurrency(self.concurrency)
        .with_verbose(self.verbose)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("docflow-ingest")
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env()?;

    init_logging(&log_config)?;

    let settings = cli.settings();
    let partitioner = ElementPartitioner::new();

    let summary = match cli.source {
        Source::Slack {
            channels,
            token,
            oldest,
            latest,
        } => {
            info!("Ingesting Slack channels");
            let config = SlackConfig::new(
                SlackConfig::parse_channels(&channels),
                token,
                oldest.as_deref(),
                latest.as_deref(),
            )?
            .with_verbose(cli.verbose);
            let connector = SlackConnector::new(settings, config)?;
            run_connector(&connector, &partitioner).await?
        },
        Source::GoogleDrive {
            drive_id,
            token,
            extension,
            recursive,
        } => {
            info!("Ingesting Google Drive files");
            let config = GoogleDriveConfig::new(drive_id, token, extension.as_deref(), recursive)?;
            let connector = GoogleDriveConnector::new(settings, config)?;
            run_connector(&connector, &partitioner).await?
        },
    };

    report(&summary)
}

fn report(summary: &RunSummary) -> Result<()> {
    for failure in &summary.failures {
        warn!(locator = %failure.locator, error = %failure.error, "Document failed");
    }

    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        elements = summary.elements,
        "Ingestion complete"
    );

    if !summary.is_success() {
        bail!("{} document(s) failed", summary.failed());
    }
    Ok(())
}
