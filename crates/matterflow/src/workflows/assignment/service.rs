use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::access::{AccessError, AccessPolicy, MANAGER_OR_ABOVE};
use super::domain::{FeeEarnerId, MatterId, MatterSnapshot, TenantId};
use super::eligibility::{eligible_in_selection_order, AssignmentCandidate};
use super::repository::{
    AvailabilityRepository, MatterRepository, RepositoryError, SettingsRepository,
};
use super::scoring::{rank, AssignmentRecommendation};
use super::workload::{WorkloadCalculator, WorkloadSnapshot};

/// Error raised by the assignment service.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("matter {0} not found")]
    MatterNotFound(MatterId),
    #[error("caller is not authorized to manage assignments")]
    Unauthorized,
    #[error("no eligible fee earner for automatic assignment")]
    NoEligibleFeeEarner,
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Outcome of a manual assignment. The warnings are advisory: the UI
/// surfaces them, the write is never blocked by them.
#[derive(Debug, Clone, Serialize)]
pub struct ManualAssignmentOutcome {
    pub matter_id: MatterId,
    pub fee_earner_id: FeeEarnerId,
    pub warnings: Vec<String>,
}

/// Registry of per-fee-earner locks so two concurrent auto-assignments
/// cannot both observe stale capacity for the same candidate and jointly
/// exceed their maximum.
#[derive(Default)]
struct AssignmentLocks {
    inner: Mutex<HashMap<FeeEarnerId, Arc<Mutex<()>>>>,
}

impl AssignmentLocks {
    fn for_fee_earner(&self, fee_earner_id: &FeeEarnerId) -> Arc<Mutex<()>> {
        let mut guard = self.inner.lock().expect("lock registry mutex poisoned");
        guard.entry(fee_earner_id.clone()).or_default().clone()
    }
}

/// Assignment executor: workload queries, advisory recommendations, and the
/// two assignment entry points. Both entry points require a manager-or-above
/// capability in the matter's tenant.
pub struct MatterAssignmentService<S, M, A, P> {
    settings: Arc<S>,
    matters: Arc<M>,
    access: Arc<P>,
    calculator: WorkloadCalculator<S, M, A>,
    locks: AssignmentLocks,
}

impl<S, M, A, P> MatterAssignmentService<S, M, A, P>
where
    S: SettingsRepository,
    M: MatterRepository,
    A: AvailabilityRepository,
    P: AccessPolicy,
{
    pub fn new(settings: Arc<S>, matters: Arc<M>, availability: Arc<A>, access: Arc<P>) -> Self {
        let calculator =
            WorkloadCalculator::new(settings.clone(), matters.clone(), availability);
        Self {
            settings,
            matters,
            access,
            calculator,
            locks: AssignmentLocks::default(),
        }
    }

    /// Snapshot for one fee earner. Readable by that fee earner or a manager
    /// in their tenant.
    pub fn workload(
        &self,
        fee_earner_id: &FeeEarnerId,
        today: NaiveDate,
    ) -> Result<WorkloadSnapshot, AssignmentError> {
        let identity = self.access.require_authenticated()?;

        if !identity.is_fee_earner(fee_earner_id) {
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
                return Err(AssignmentError::Unauthorized);
            }
        }

        Ok(self.calculator.compute(fee_earner_id, today)?)
    }

    /// Advisory ranking over every configured fee earner of the matter's
    /// tenant, unavailable and over-capacity ones included.
    pub fn recommendations(
        &self,
        matter_id: &MatterId,
        today: NaiveDate,
    ) -> Result<Vec<AssignmentRecommendation>, AssignmentError> {
        self.access.require_authenticated()?;
        let matter = self.fetch_matter(matter_id)?;
        self.require_manager(&matter.tenant_id)?;

        let candidates = self.candidates_for(&matter.tenant_id, today)?;
        Ok(rank(&candidates, &matter.matter_type, matter.transaction_value))
    }

    /// Automatic assignment: eligibility filter, then selection by priority
    /// and spare capacity. The commit itself is serialized per fee earner
    /// and re-validates capacity, so two concurrent requests cannot both
    /// land on the same candidate's last slot.
    pub fn auto_assign(
        &self,
        matter_id: &MatterId,
        today: NaiveDate,
    ) -> Result<FeeEarnerId, AssignmentError> {
        self.access.require_authenticated()?;
        let matter = self.fetch_matter(matter_id)?;
        self.require_manager(&matter.tenant_id)?;

        let candidates = self.candidates_for(&matter.tenant_id, today)?;
        let ordered =
            eligible_in_selection_order(&candidates, &matter.matter_type, matter.transaction_value);
        if ordered.is_empty() {
            return Err(AssignmentError::NoEligibleFeeEarner);
        }

        for candidate in ordered {
            let fee_earner_id = candidate.fee_earner_id().clone();
            let lock = self.locks.for_fee_earner(&fee_earner_id);
            let _guard = lock.lock().expect("assignment mutex poisoned");

            // Counts may have moved since the snapshot was taken; the write
            // only happens while they still leave headroom.
            let fresh = self.calculator.compute(&fee_earner_id, today)?;
            if !(fresh.is_available
                && fresh.has_concurrent_headroom()
                && fresh.has_weekly_headroom())
            {
                debug!(%fee_earner_id, "candidate failed capacity re-check, trying next");
                continue;
            }

            self.matters.set_assigned_fee_earner(matter_id, &fee_earner_id)?;
            info!(%matter_id, %fee_earner_id, "matter auto-assigned");
            return Ok(fee_earner_id);
        }

        Err(AssignmentError::NoEligibleFeeEarner)
    }

    /// Manual assignment bypasses eligibility and capacity by design; a
    /// human may knowingly exceed them. Returns advisory warnings for the
    /// chosen fee earner instead of blocking.
    pub fn manual_assign(
        &self,
        matter_id: &MatterId,
        fee_earner_id: &FeeEarnerId,
        today: NaiveDate,
    ) -> Result<ManualAssignmentOutcome, AssignmentError> {
        self.access.require_authenticated()?;
        let matter = self.fetch_matter(matter_id)?;
        self.require_manager(&matter.tenant_id)?;

        let snapshot = self.calculator.compute(fee_earner_id, today)?;
        let warnings = manual_warnings(&snapshot);

        self.matters.set_assigned_fee_earner(matter_id, fee_earner_id)?;
        info!(%matter_id, %fee_earner_id, "matter manually assigned");

        Ok(ManualAssignmentOutcome {
            matter_id: matter_id.clone(),
            fee_earner_id: fee_earner_id.clone(),
            warnings,
        })
    }

    fn fetch_matter(&self, matter_id: &MatterId) -> Result<MatterSnapshot, AssignmentError> {
        self.matters
            .fetch(matter_id)?
            .ok_or_else(|| AssignmentError::MatterNotFound(matter_id.clone()))
    }

    fn require_manager(&self, tenant_id: &TenantId) -> Result<(), AssignmentError> {
        if self
            .access
            .current_user_has_role(tenant_id, &MANAGER_OR_ABOVE)
        {
            Ok(())
        } else {
            Err(AssignmentError::Unauthorized)
        }
    }

    fn candidates_for(
        &self,
        tenant_id: &TenantId,
        today: NaiveDate,
    ) -> Result<Vec<AssignmentCandidate>, AssignmentError> {
        let mut candidates = Vec::new();
        for settings in self.settings.list_for_tenant(tenant_id)? {
            let workload = self.calculator.compute(&settings.fee_earner_id, today)?;
            candidates.push(AssignmentCandidate { settings, workload });
        }
        Ok(candidates)
    }
}

fn manual_warnings(snapshot: &WorkloadSnapshot) -> Vec<String> {
    if !snapshot.settings_configured {
        return vec!["Fee earner has no assignment settings".to_string()];
    }

    let mut warnings = Vec::new();
    if !snapshot.is_available {
        warnings.push("Fee earner is currently unavailable".to_string());
    }
    if !snapshot.has_concurrent_headroom() {
        warnings.push("Fee earner is at or over concurrent capacity".to_string());
    }
    if !snapshot.has_weekly_headroom() {
        warnings.push("Weekly intake limit reached".to_string());
    }
    warnings
}
