use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::access::{AccessError, AccessPolicy, Identity, MANAGER_OR_ABOVE};
use super::domain::{
    AvailabilityBlock, AvailabilityBlockId, AvailabilityType, BlockPhase, FeeEarnerId, TenantId,
};
use super::repository::{AvailabilityRepository, RepositoryError, SettingsRepository};

/// Validation errors raised before anything is persisted.
#[derive(Debug, thiserror::Error)]
pub enum BlockValidationError {
    #[error("end date {end} precedes start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

/// Error raised by the availability block service.
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error(transparent)]
    Validation(#[from] BlockValidationError),
    #[error("availability block {0} not found")]
    BlockNotFound(AvailabilityBlockId),
    #[error("caller may not manage this fee earner's availability")]
    Unauthorized,
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Fields accepted when a block is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAvailabilityBlock {
    pub fee_earner_id: FeeEarnerId,
    pub tenant_id: TenantId,
    pub start_date: NaiveDate,
    /// Inclusive; omit for a single-day block.
    pub end_date: Option<NaiveDate>,
    pub availability_type: AvailabilityType,
    pub notes: Option<String>,
}

/// Partial update; omitted fields keep their stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilityBlockPatch {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub availability_type: Option<AvailabilityType>,
    pub notes: Option<String>,
}

/// Blocks for one fee earner, classified against the request date.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityOverview {
    pub fee_earner_id: FeeEarnerId,
    pub active: Vec<AvailabilityBlock>,
    pub upcoming: Vec<AvailabilityBlock>,
    pub past: Vec<AvailabilityBlock>,
}

static BLOCK_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_block_id() -> AvailabilityBlockId {
    let id = BLOCK_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AvailabilityBlockId(format!("blk-{id:06}"))
}

/// CRUD over diary blocks. The one business rule beyond field checks: the
/// inclusive range must not end before it starts. Overlapping blocks are
/// permitted; overlap cannot change the binary availability outcome.
pub struct AvailabilityBlockService<A, S, P> {
    availability: Arc<A>,
    settings: Arc<S>,
    access: Arc<P>,
}

impl<A, S, P> AvailabilityBlockService<A, S, P>
where
    A: AvailabilityRepository,
    S: SettingsRepository,
    P: AccessPolicy,
{
    pub fn new(availability: Arc<A>, settings: Arc<S>, access: Arc<P>) -> Self {
        Self {
            availability,
            settings,
            access,
        }
    }

    pub fn create(
        &self,
        request: NewAvailabilityBlock,
    ) -> Result<AvailabilityBlock, AvailabilityError> {
        let identity = self.access.require_authenticated()?;
        self.authorize(&identity, &request.fee_earner_id, &request.tenant_id)?;

        let end_date = request.end_date.unwrap_or(request.start_date);
        validate_range(request.start_date, end_date)?;

        let block = AvailabilityBlock {
            id: next_block_id(),
            fee_earner_id: request.fee_earner_id,
            tenant_id: request.tenant_id,
            start_date: request.start_date,
            end_date,
            availability_type: request.availability_type,
            notes: request.notes,
            deleted_at: None,
        };

        let stored = self.availability.insert(block)?;
        Ok(stored)
    }

    pub fn update(
        &self,
        block_id: &AvailabilityBlockId,
        patch: AvailabilityBlockPatch,
    ) -> Result<AvailabilityBlock, AvailabilityError> {
        let identity = self.access.require_authenticated()?;
        let mut block = self
            .availability
            .fetch(block_id)?
            .ok_or_else(|| AvailabilityError::BlockNotFound(block_id.clone()))?;
        self.authorize(&identity, &block.fee_earner_id, &block.tenant_id)?;

        if let Some(start_date) = patch.start_date {
            block.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            block.end_date = end_date;
        }
        if let Some(availability_type) = patch.availability_type {
            block.availability_type = availability_type;
        }
        if let Some(notes) = patch.notes {
            block.notes = Some(notes);
        }
        validate_range(block.start_date, block.end_date)?;

        self.availability.update(block.clone())?;
        Ok(block)
    }

    /// Soft delete: stamps the tombstone and leaves the row in place. The
    /// timestamp is injected so tests can pin the clock.
    pub fn delete(
        &self,
        block_id: &AvailabilityBlockId,
        now: DateTime<Utc>,
    ) -> Result<(), AvailabilityError> {
        let identity = self.access.require_authenticated()?;
        let mut block = self
            .availability
            .fetch(block_id)?
            .ok_or_else(|| AvailabilityError::BlockNotFound(block_id.clone()))?;
        self.authorize(&identity, &block.fee_earner_id, &block.tenant_id)?;

        block.deleted_at = Some(now);
        self.availability.update(block)?;
        Ok(())
    }

    pub fn list(
        &self,
        fee_earner_id: &FeeEarnerId,
        today: NaiveDate,
    ) -> Result<AvailabilityOverview, AvailabilityError> {
        let identity = self.access.require_authenticated()?;
        if !identity.is_fee_earner(fee_earner_id) {
            // The tenant comes from the settings row; without one only the
            // fee earner may read their own diary.
            let tenant_id = self
                .settings
                .fetch(fee_earner_id)?
                .map(|settings| settings.tenant_id);
            let permitted = tenant_id
                .map(|tenant_id| {
                    self.access
                        .current_user_has_role(&tenant_id, &MANAGER_OR_ABOVE)
                })
                .unwrap_or(false);
            if !permitted {
                return Err(AvailabilityError::Unauthorized);
            }
        }

        let mut overview = AvailabilityOverview {
            fee_earner_id: fee_earner_id.clone(),
            active: Vec::new(),
            upcoming: Vec::new(),
            past: Vec::new(),
        };
        for block in self.availability.list_for_fee_earner(fee_earner_id)? {
            match block.phase(today) {
                BlockPhase::Active => overview.active.push(block),
                BlockPhase::Upcoming => overview.upcoming.push(block),
                BlockPhase::Past => overview.past.push(block),
            }
        }
        Ok(overview)
    }

    fn authorize(
        &self,
        identity: &Identity,
        fee_earner_id: &FeeEarnerId,
        tenant_id: &TenantId,
    ) -> Result<(), AvailabilityError> {
        if identity.is_fee_earner(fee_earner_id)
            || self
                .access
                .current_user_has_role(tenant_id, &MANAGER_OR_ABOVE)
        {
            Ok(())
        } else {
            Err(AvailabilityError::Unauthorized)
        }
    }
}

fn validate_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), BlockValidationError> {
    if end_date < start_date {
        return Err(BlockValidationError::EndBeforeStart {
            start: start_date,
            end: end_date,
        });
    }
    Ok(())
}
