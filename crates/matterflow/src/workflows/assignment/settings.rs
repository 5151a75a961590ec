use std::sync::Arc;

use chrono::NaiveTime;

use super::access::{AccessError, AccessPolicy, MANAGER_OR_ABOVE};
use super::domain::{FeeEarnerId, FeeEarnerSettings};
use super::repository::{RepositoryError, SettingsRepository};

/// Validation errors raised before a settings row is persisted.
#[derive(Debug, thiserror::Error)]
pub enum SettingsValidationError {
    #[error("assignment priority {0} outside 1-10")]
    PriorityOutOfRange(u8),
    #[error("working day index {0} outside 0-6")]
    InvalidWorkingDay(u8),
    #[error("working hours end {end} not after start {start}")]
    WorkingHoursInverted { start: NaiveTime, end: NaiveTime },
    #[error("minimum transaction value {min} exceeds maximum {max}")]
    TransactionBoundsInverted { min: u64, max: u64 },
}

/// Error raised by the settings service.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error(transparent)]
    Validation(#[from] SettingsValidationError),
    #[error("caller may not manage assignment settings for this tenant")]
    Unauthorized,
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Upsert/fetch over per-fee-earner assignment settings. Absence of a row
/// means "not configured for assignment"; the engine treats such fee earners
/// as invisible.
pub struct FeeEarnerSettingsService<S, P> {
    settings: Arc<S>,
    access: Arc<P>,
}

impl<S, P> FeeEarnerSettingsService<S, P>
where
    S: SettingsRepository,
    P: AccessPolicy,
{
    pub fn new(settings: Arc<S>, access: Arc<P>) -> Self {
        Self { settings, access }
    }

    pub fn upsert(
        &self,
        settings: FeeEarnerSettings,
    ) -> Result<FeeEarnerSettings, SettingsError> {
        self.access.require_authenticated()?;
        if !self
            .access
            .current_user_has_role(&settings.tenant_id, &MANAGER_OR_ABOVE)
        {
            return Err(SettingsError::Unauthorized);
        }

        validate(&settings)?;
        let stored = self.settings.upsert(settings)?;
        Ok(stored)
    }

    pub fn fetch(
        &self,
        fee_earner_id: &FeeEarnerId,
    ) -> Result<Option<FeeEarnerSettings>, SettingsError> {
        let identity = self.access.require_authenticated()?;
        let settings = self.settings.fetch(fee_earner_id)?;

        if let Some(settings) = &settings {
            let permitted = identity.is_fee_earner(fee_earner_id)
                || self
                    .access
                    .current_user_has_role(&settings.tenant_id, &MANAGER_OR_ABOVE);
            if !permitted {
                return Err(SettingsError::Unauthorized);
            }
        }

        Ok(settings)
    }
}

fn validate(settings: &FeeEarnerSettings) -> Result<(), SettingsValidationError> {
    if !(1..=10).contains(&settings.assignment_priority) {
        return Err(SettingsValidationError::PriorityOutOfRange(
            settings.assignment_priority,
        ));
    }

    if let Some(day) = settings.working_days.iter().find(|day| **day > 6) {
        return Err(SettingsValidationError::InvalidWorkingDay(*day));
    }

    if settings.working_hours_end <= settings.working_hours_start {
        return Err(SettingsValidationError::WorkingHoursInverted {
            start: settings.working_hours_start,
            end: settings.working_hours_end,
        });
    }

    if let (Some(min), Some(max)) = (
        settings.min_transaction_value,
        settings.max_transaction_value,
    ) {
        if min > max {
            return Err(SettingsValidationError::TransactionBoundsInverted { min, max });
        }
    }

    Ok(())
}
