//! One Drive file as an ingestable document

use super::client::{DriveClient, DriveFile};
use crate::lifecycle::{Probe, SourceCollaborator};
use async_trait::async_trait;
use docflow_common::Result;
use std::io::Write;

#[derive(Debug, Clone)]
pub struct DriveSource {
    file: DriveFile,
    extension: String,
    client: DriveClient,
}

impl DriveSource {
    pub fn new(file: DriveFile, client: DriveClient) -> Self {
        let extension = file.extension();
        Self {
            file,
            extension,
            client,
        }
    }

    pub fn file(&self) -> &DriveFile {
        &self.file
    }
}

#[async_trait]
impl SourceCollaborator for DriveSource {
    type Payload = Vec<u8>;

    fn locator(&self) -> &str {
        &self.file.id
    }

    fn extension(&self) -> &str {
        &self.extension
    }

    async fn probe(&self) -> Result<Probe> {
        Ok(match self.client.get_file(&self.file.id).await? {
            Some(file) if !file.trashed => Probe::present(file.timestamps()),
            _ => Probe::absent(),
        })
    }

    async fn download(&self) -> Result<Vec<u8>> {
        self.client.download(&self.file).await
    }

    /// Content bytes carry no timestamps; use the listing's
    fn timestamps(&self, _payload: &Vec<u8>) -> Vec<String> {
        self.file.timestamps()
    }

    fn write_staged(&self, payload: &Vec<u8>, out: &mut dyn Write) -> Result<()> {
        out.write_all(payload)?;
        Ok(())
    }
}
