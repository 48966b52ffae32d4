use crate::domain::{errors::DomainError, IngestReport};
use async_trait::async_trait;

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Reads every document the source offers. Files that cannot be read
    /// are reported as skipped instead of failing the whole load.
    async fn load(&self) -> Result<IngestReport, DomainError>;
}
