//! docflow Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Connectors that fetch documents from external sources, stage them locally
//! and hand them to a partitioner.
//!
//! # Supported Sources
//!
//! - **Slack**: channel history with thread replies, staged as XML
//! - **Google Drive**: files of a folder (optionally recursive) or a single file
//!
//! # Example
//!
//! ```no_run
//! use docflow_ingest::config::StandardConnectorConfig;
//! use docflow_ingest::process::ElementPartitioner;
//! use docflow_ingest::runner::run_connector;
//! use docflow_ingest::slack::{SlackConfig, SlackConnector};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = StandardConnectorConfig::new("./downloads", "./output");
//!     let channels = SlackConfig::parse_channels("C012AB3CD,C045EF6GH");
//!     let config = SlackConfig::new(channels, "xoxb-token", Some("2023-01-01"), None)?;
//!
//!     let connector = SlackConnector::new(settings, config)?;
//!     let summary = run_connector(&connector, &ElementPartitioner::new()).await?;
//!     println!("{} documents processed", summary.processed);
//!     Ok(())
//! }
//! ```

pub mod cleanup;
pub mod config;
pub mod connector;
pub mod google_drive;
pub mod lifecycle;
pub mod process;
pub mod runner;
pub mod slack;

pub use cleanup::{Cleanup, CleanupGuard};
pub use config::StandardConnectorConfig;
pub use connector::Connector;
pub use lifecycle::{IngestDoc, Materialized, Probe, SourceCollaborator, StagedDoc};
pub use runner::{run_connector, RunSummary};
