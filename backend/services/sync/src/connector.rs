use async_trait::async_trait;

/// Tally of one sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub source: String,
    /// Records parsed from the device.
    pub fetched: usize,
    /// Check-ins the ERP accepted.
    pub forwarded: usize,
    pub duplicates: usize,
    /// Allowlisted rejections.
    pub ignored: usize,
    pub failed: usize,
}

#[async_trait]
pub trait Connector: Send {
    fn source_name(&self) -> &str;
    async fn sync(&mut self) -> Result<SyncReport, Box<dyn std::error::Error + Send + Sync>>;
}
