use chrono::NaiveDate;

use super::domain::{
    AvailabilityBlock, AvailabilityBlockId, FeeEarnerId, FeeEarnerSettings, MatterId,
    MatterSnapshot, TenantId,
};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction over per-fee-earner assignment settings.
pub trait SettingsRepository: Send + Sync {
    fn upsert(&self, settings: FeeEarnerSettings) -> Result<FeeEarnerSettings, RepositoryError>;
    fn fetch(
        &self,
        fee_earner_id: &FeeEarnerId,
    ) -> Result<Option<FeeEarnerSettings>, RepositoryError>;
    /// Every configured fee earner for a tenant, the candidate pool for both
    /// selection strategies.
    fn list_for_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<FeeEarnerSettings>, RepositoryError>;
}

/// Read/count/assign surface over the externally owned matter records.
pub trait MatterRepository: Send + Sync {
    fn fetch(&self, matter_id: &MatterId) -> Result<Option<MatterSnapshot>, RepositoryError>;
    /// Matters assigned to the fee earner with an open status (new or active).
    fn count_open_for(&self, fee_earner_id: &FeeEarnerId) -> Result<u32, RepositoryError>;
    /// Matters assigned to the fee earner that were opened on or after `since`.
    fn count_assigned_since(
        &self,
        fee_earner_id: &FeeEarnerId,
        since: NaiveDate,
    ) -> Result<u32, RepositoryError>;
    fn set_assigned_fee_earner(
        &self,
        matter_id: &MatterId,
        fee_earner_id: &FeeEarnerId,
    ) -> Result<(), RepositoryError>;
}

/// Storage abstraction over availability blocks. Reads never return
/// tombstoned rows.
pub trait AvailabilityRepository: Send + Sync {
    fn insert(&self, block: AvailabilityBlock) -> Result<AvailabilityBlock, RepositoryError>;
    fn update(&self, block: AvailabilityBlock) -> Result<(), RepositoryError>;
    fn fetch(
        &self,
        block_id: &AvailabilityBlockId,
    ) -> Result<Option<AvailabilityBlock>, RepositoryError>;
    fn list_for_fee_earner(
        &self,
        fee_earner_id: &FeeEarnerId,
    ) -> Result<Vec<AvailabilityBlock>, RepositoryError>;
}
