//! Ingestion document lifecycle
//!
//! A document goes through `Unknown -> Present | Absent` as the source is
//! probed or fetched. Fetching stages the artifact under the download
//! directory; [`Cleanup`] removes it again.
//!
//! Connectors only supply a [`SourceCollaborator`] (how to probe, download
//! and serialize one remote item); [`StagedDoc`] owns the state machine.

use crate::cleanup::Cleanup;
use crate::config::StandardConnectorConfig;
use async_trait::async_trait;
use docflow_common::checksum::sha256_hex;
use docflow_common::{DocflowError, FileMeta, Result};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Whether the remote artifact is known to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Materialized {
    /// Not checked yet
    #[default]
    Unknown,
    Present,
    Absent,
}

/// Result of a lightweight existence check against the source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Probe {
    pub exists: bool,
    /// Raw timestamps observed in the artifact, in source format
    pub timestamps: Vec<String>,
}

impl Probe {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn present(timestamps: Vec<String>) -> Self {
        Self {
            exists: true,
            timestamps,
        }
    }
}

/// Per-source half of a document: everything that talks to the remote system
#[async_trait]
pub trait SourceCollaborator: Send + Sync {
    /// Downloaded content, before it is written to disk
    type Payload: Send + Sync;

    /// Opaque identifier of the remote item (channel id, file id)
    fn locator(&self) -> &str;

    /// Extension of the staged file, without the leading dot
    fn extension(&self) -> &str;

    async fn probe(&self) -> Result<Probe>;

    async fn download(&self) -> Result<Self::Payload>;

    /// Raw timestamps carried by a payload
    fn timestamps(&self, payload: &Self::Payload) -> Vec<String>;

    /// Serialize a payload into the staged file format
    fn write_staged(&self, payload: &Self::Payload, out: &mut dyn Write) -> Result<()>;
}

/// Lifecycle contract every ingestable document fulfils
#[async_trait]
pub trait IngestDoc: Cleanup + Send + Sync {
    fn locator(&self) -> &str;

    /// `<download_dir>/<locator>.<ext>`
    fn staging_path(&self) -> PathBuf;

    /// `<output_dir>/<locator>.json`
    fn output_path(&self) -> PathBuf;

    fn materialized(&self) -> Materialized;

    /// Metadata if a fetch or probe already computed it
    fn cached_metadata(&self) -> Option<FileMeta>;

    /// Whether the remote artifact exists. Probes the source at most once.
    async fn exists(&mut self) -> Result<bool>;

    /// Stage the artifact locally. No network call when already staged.
    async fn fetch(&mut self) -> Result<()>;

    /// Creation/modification window of the artifact content
    async fn metadata(&mut self) -> Result<FileMeta>;

    /// Forget cached metadata so the next [`IngestDoc::metadata`] call recomputes it
    fn reset_metadata(&mut self);

    fn has_output(&self) -> bool {
        self.output_path().exists()
    }
}

/// Generic document backed by a [`SourceCollaborator`]
pub struct StagedDoc<S: SourceCollaborator> {
    source: S,
    config: Arc<StandardConnectorConfig>,
    materialized: Materialized,
    metadata: Option<FileMeta>,
}

impl<S: SourceCollaborator> StagedDoc<S> {
    pub fn new(source: S, config: Arc<StandardConnectorConfig>) -> Self {
        Self {
            source,
            config,
            materialized: Materialized::Unknown,
            metadata: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &StandardConnectorConfig {
        &self.config
    }

    fn file_stem(&self) -> String {
        safe_file_stem(self.source.locator())
    }

    fn unavailable(&self, err: DocflowError) -> DocflowError {
        if err.is_source_unavailable() {
            err
        } else {
            DocflowError::source_unavailable(self.source.locator(), err)
        }
    }

    async fn probe(&mut self) -> Result<()> {
        let probe = self.source.probe().await.map_err(|e| self.unavailable(e))?;

        // committed together: a bad timestamp leaves the state Unknown
        let (state, meta) = if probe.exists {
            (Materialized::Present, FileMeta::from_timestamps(&probe.timestamps)?)
        } else {
            (Materialized::Absent, FileMeta::empty())
        };
        self.materialized = state;
        self.metadata.get_or_insert(meta);

        debug!(
            locator = self.source.locator(),
            state = ?self.materialized,
            "Probed source"
        );
        Ok(())
    }

    fn stage(&self, payload: &S::Payload) -> Result<PathBuf> {
        let path = self.staging_path();
        let dir = self.config.download_dir();
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            self.source.write_staged(payload, &mut writer)?;
            writer.flush()?;
        }
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(path)
    }
}

#[async_trait]
impl<S: SourceCollaborator> IngestDoc for StagedDoc<S> {
    fn locator(&self) -> &str {
        self.source.locator()
    }

    fn staging_path(&self) -> PathBuf {
        let ext = self.source.extension().trim_start_matches('.');
        let name = if ext.is_empty() {
            self.file_stem()
        } else {
            format!("{}.{}", self.file_stem(), ext)
        };
        self.config.download_dir().join(name)
    }

    fn output_path(&self) -> PathBuf {
        self.config.output_dir().join(format!("{}.json", self.file_stem()))
    }

    fn materialized(&self) -> Materialized {
        self.materialized
    }

    fn cached_metadata(&self) -> Option<FileMeta> {
        self.metadata
    }

    async fn exists(&mut self) -> Result<bool> {
        if self.materialized == Materialized::Unknown {
            self.probe().await?;
        }
        Ok(self.materialized == Materialized::Present)
    }

    async fn fetch(&mut self) -> Result<()> {
        let path = self.staging_path();
        if path.is_file() {
            debug!(locator = self.locator(), path = %path.display(), "Already staged, skipping fetch");
            self.materialized = Materialized::Present;
            return Ok(());
        }

        let payload = match self.source.download().await {
            Ok(payload) => payload,
            Err(e) => {
                self.materialized = Materialized::Absent;
                let err = self.unavailable(e);
                warn!(locator = self.locator(), error = %err, "Fetch failed");
                return Err(err);
            },
        };

        let staged = match self.metadata {
            Some(meta) => Ok(meta),
            None => FileMeta::from_timestamps(self.source.timestamps(&payload)),
        }
        .and_then(|meta| self.stage(&payload).map(|path| (meta, path)));

        match staged {
            Ok((meta, path)) => {
                self.materialized = Materialized::Present;
                self.metadata = Some(meta);
                debug!(locator = self.locator(), path = %path.display(), "Staged artifact");
                Ok(())
            },
            Err(err) => {
                self.materialized = Materialized::Absent;
                warn!(locator = self.locator(), error = %err, "Staging failed");
                Err(err)
            },
        }
    }

    async fn metadata(&mut self) -> Result<FileMeta> {
        if let Some(meta) = self.metadata {
            return Ok(meta);
        }
        self.probe().await?;
        Ok(self.metadata.unwrap_or_else(FileMeta::empty))
    }

    fn reset_metadata(&mut self) {
        self.metadata = None;
    }
}

impl<S: SourceCollaborator> Cleanup for StagedDoc<S> {
    fn cleanup(&self) {
        let path = self.staging_path();
        if self.config.retain_artifacts {
            info!(locator = self.locator(), path = %path.display(), "Preserving staged file");
            return;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => debug!(locator = self.locator(), path = %path.display(), "Removed staged file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => warn!(
                locator = self.locator(),
                path = %path.display(),
                error = %e,
                "Failed to remove staged file"
            ),
        }
    }
}

impl<S: SourceCollaborator> std::fmt::Debug for StagedDoc<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedDoc")
            .field("locator", &self.source.locator())
            .field("materialized", &self.materialized)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Locator as a single path component.
///
/// Separators become `_`. A rewritten locator also gets a short digest of
/// the original, so `a/b` and `a_b` never share a staging or output file.
pub fn safe_file_stem(locator: &str) -> String {
    let stem = locator.replace(['/', '\\'], "_");
    if stem == locator {
        return stem;
    }
    let digest = sha256_hex(locator.as_bytes());
    format!("{stem}-{}", &digest[..STEM_DIGEST_LEN])
}

const STEM_DIGEST_LEN: usize = 8;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::cleanup::CleanupGuard;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Calls {
        probes: Arc<AtomicUsize>,
        downloads: Arc<AtomicUsize>,
    }

    struct FakeSource {
        locator: String,
        exists: bool,
        fail: bool,
        fail_write: bool,
        stamps: Vec<String>,
        calls: Calls,
    }

    impl FakeSource {
        fn new(locator: &str, stamps: &[&str]) -> Self {
            Self {
                locator: locator.to_string(),
                exists: true,
                fail: false,
                fail_write: false,
                stamps: stamps.iter().map(|s| s.to_string()).collect(),
                calls: Calls::default(),
            }
        }
    }

    #[async_trait]
    impl SourceCollaborator for FakeSource {
        type Payload = Vec<String>;

        fn locator(&self) -> &str {
            &self.locator
        }

        fn extension(&self) -> &str {
            "txt"
        }

        async fn probe(&self) -> Result<Probe> {
            self.calls.probes.fetch_add(1, Ordering::SeqCst);
            if self.exists {
                Ok(Probe::present(self.stamps.clone()))
            } else {
                Ok(Probe::absent())
            }
        }

        async fn download(&self) -> Result<Vec<String>> {
            self.calls.downloads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DocflowError::parse("connection reset"));
            }
            Ok(self.stamps.iter().map(|s| format!("message at {s}")).collect())
        }

        fn timestamps(&self, _payload: &Vec<String>) -> Vec<String> {
            self.stamps.clone()
        }

        fn write_staged(&self, payload: &Vec<String>, out: &mut dyn Write) -> Result<()> {
            if self.fail_write {
                return Err(DocflowError::parse("serializer failed"));
            }
            for line in payload {
                writeln!(out, "{line}")?;
            }
            Ok(())
        }
    }

    fn config(temp: &TempDir) -> Arc<StandardConnectorConfig> {
        Arc::new(StandardConnectorConfig::new(
            temp.path().join("downloads"),
            temp.path().join("output"),
        ))
    }

    #[tokio::test]
    async fn test_fetch_stages_file_and_metadata() {
        let temp = TempDir::new().unwrap();
        let mut doc = StagedDoc::new(FakeSource::new("C01", &["100", "500", "250"]), config(&temp));

        doc.fetch().await.unwrap();

        let path = doc.staging_path();
        assert_eq!(path, temp.path().join("downloads/C01.txt"));
        assert!(path.is_file());
        assert_eq!(doc.materialized(), Materialized::Present);

        let meta = doc.cached_metadata().unwrap();
        assert_eq!(meta.created_at.unwrap().timestamp(), 100);
        assert_eq!(meta.modified_at.unwrap().timestamp(), 500);
    }

    #[tokio::test]
    async fn test_second_fetch_skips_download() {
        let temp = TempDir::new().unwrap();
        let source = FakeSource::new("C01", &["100"]);
        let calls = source.calls.clone();
        let mut doc = StagedDoc::new(source, config(&temp));

        doc.fetch().await.unwrap();
        let first = std::fs::read(doc.staging_path()).unwrap();
        doc.fetch().await.unwrap();
        let second = std::fs::read(doc.staging_path()).unwrap();

        assert_eq!(calls.downloads.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_nothing_staged() {
        let temp = TempDir::new().unwrap();
        let mut source = FakeSource::new("C01", &["100"]);
        source.fail = true;
        let mut doc = StagedDoc::new(source, config(&temp));

        let err = doc.fetch().await.unwrap_err();

        assert!(err.is_source_unavailable());
        assert_eq!(doc.materialized(), Materialized::Absent);
        assert!(!doc.staging_path().exists());
        let leftovers = std::fs::read_dir(temp.path().join("downloads"))
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_staging_failure_leaves_doc_absent() {
        let temp = TempDir::new().unwrap();
        let mut source = FakeSource::new("C01", &["100"]);
        source.fail_write = true;
        let mut doc = StagedDoc::new(source, config(&temp));

        let err = doc.fetch().await.unwrap_err();

        assert!(err.to_string().contains("serializer failed"));
        assert_eq!(doc.materialized(), Materialized::Absent);
        assert!(doc.cached_metadata().is_none());
        assert!(!doc.staging_path().exists());
        assert_eq!(std::fs::read_dir(temp.path().join("downloads")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_timestamp_fails_fetch_without_staging() {
        let temp = TempDir::new().unwrap();
        let mut doc = StagedDoc::new(FakeSource::new("C01", &["yesterday"]), config(&temp));

        assert!(doc.fetch().await.is_err());
        assert_eq!(doc.materialized(), Materialized::Absent);
        assert!(!doc.staging_path().exists());
    }

    #[tokio::test]
    async fn test_bad_probe_timestamp_keeps_state_unknown() {
        let temp = TempDir::new().unwrap();
        let source = FakeSource::new("C01", &["yesterday"]);
        let calls = source.calls.clone();
        let mut doc = StagedDoc::new(source, config(&temp));

        assert!(doc.exists().await.is_err());
        assert_eq!(doc.materialized(), Materialized::Unknown);
        assert!(doc.cached_metadata().is_none());

        assert!(doc.exists().await.is_err());
        assert_eq!(calls.probes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exists_probes_once() {
        let temp = TempDir::new().unwrap();
        let source = FakeSource::new("C01", &["7"]);
        let calls = source.calls.clone();
        let mut doc = StagedDoc::new(source, config(&temp));

        assert!(doc.exists().await.unwrap());
        assert!(doc.exists().await.unwrap());

        assert_eq!(calls.probes.load(Ordering::SeqCst), 1);
        assert_eq!(calls.downloads.load(Ordering::SeqCst), 0);
        assert!(doc.cached_metadata().is_some());
    }

    #[tokio::test]
    async fn test_absent_source_has_empty_metadata() {
        let temp = TempDir::new().unwrap();
        let mut source = FakeSource::new("gone", &["7"]);
        source.exists = false;
        let mut doc = StagedDoc::new(source, config(&temp));

        assert!(!doc.exists().await.unwrap());
        assert_eq!(doc.materialized(), Materialized::Absent);
        assert!(doc.metadata().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metadata_is_cached_until_reset() {
        let temp = TempDir::new().unwrap();
        let source = FakeSource::new("C01", &["100", "300"]);
        let calls = source.calls.clone();
        let mut doc = StagedDoc::new(source, config(&temp));

        doc.metadata().await.unwrap();
        doc.metadata().await.unwrap();
        assert_eq!(calls.probes.load(Ordering::SeqCst), 1);

        doc.reset_metadata();
        assert!(doc.cached_metadata().is_none());
        doc.metadata().await.unwrap();
        assert_eq!(calls.probes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cleanup_before_fetch_is_noop() {
        let temp = TempDir::new().unwrap();
        let doc = StagedDoc::new(FakeSource::new("C01", &[]), config(&temp));
        doc.cleanup();
        doc.cleanup();
        assert_eq!(doc.materialized(), Materialized::Unknown);
    }

    #[tokio::test]
    async fn test_cleanup_respects_retain_flag() {
        let temp = TempDir::new().unwrap();
        let retained = Arc::new(
            StandardConnectorConfig::new(temp.path().join("downloads"), temp.path().join("out"))
                .with_retain_artifacts(true),
        );
        let mut doc = StagedDoc::new(FakeSource::new("C01", &["1"]), retained);

        doc.fetch().await.unwrap();
        doc.cleanup();
        assert!(doc.staging_path().exists());
    }

    #[tokio::test]
    async fn test_guard_removes_staged_file_on_error_path() {
        let temp = TempDir::new().unwrap();
        let staged = temp.path().join("downloads/C01.txt");
        let result = async {
            let mut doc =
                CleanupGuard::new(StagedDoc::new(FakeSource::new("C01", &["1"]), config(&temp)));
            doc.fetch().await?;
            assert!(doc.staging_path().exists());
            Err::<(), _>(DocflowError::parse("parser rejected content"))
        }
        .await;

        assert!(result.is_err());
        assert!(!staged.exists());
    }

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("C012AB3CD"), "C012AB3CD");
        assert_eq!(safe_file_stem("a_b"), "a_b");

        let rewritten = safe_file_stem("folder/sub\\file");
        assert!(rewritten.starts_with("folder_sub_file-"));
        assert_eq!(rewritten.len(), "folder_sub_file-".len() + STEM_DIGEST_LEN);
        assert!(!rewritten.contains('/') && !rewritten.contains('\\'));
    }

    #[test]
    fn test_sanitized_locators_do_not_collide() {
        let temp = TempDir::new().unwrap();
        let slashed = StagedDoc::new(FakeSource::new("a/b", &[]), config(&temp));
        let underscored = StagedDoc::new(FakeSource::new("a_b", &[]), config(&temp));

        assert_ne!(slashed.staging_path(), underscored.staging_path());
        assert_ne!(slashed.output_path(), underscored.output_path());
        assert_eq!(slashed.staging_path().parent(), Some(temp.path().join("downloads").as_path()));
    }
}
