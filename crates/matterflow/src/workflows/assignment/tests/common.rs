use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveTime};

use crate::workflows::assignment::access::{AccessError, AccessPolicy, Identity, StaffRole};
use crate::workflows::assignment::availability::AvailabilityBlockService;
use crate::workflows::assignment::domain::{
    AvailabilityBlock, AvailabilityBlockId, AvailabilityType, FeeEarnerId, FeeEarnerSettings,
    MatterId, MatterSnapshot, MatterStatus, TenantId,
};
use crate::workflows::assignment::eligibility::AssignmentCandidate;
use crate::workflows::assignment::repository::{
    AvailabilityRepository, MatterRepository, RepositoryError, SettingsRepository,
};
use crate::workflows::assignment::router::AssignmentState;
use crate::workflows::assignment::service::MatterAssignmentService;
use crate::workflows::assignment::settings::FeeEarnerSettingsService;
use crate::workflows::assignment::workload::{WorkloadCalculator, WorkloadSnapshot};

/// Fixed reference date for deterministic tests: Wednesday 2026-03-11, whose
/// week started on Sunday 2026-03-08.
pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 11).expect("valid date")
}

pub(super) fn sunday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 8).expect("valid date")
}

pub(super) fn tenant() -> TenantId {
    TenantId("firm-caledonia".to_string())
}

pub(super) fn fee_earner(id: &str) -> FeeEarnerId {
    FeeEarnerId(id.to_string())
}

pub(super) fn settings(id: &str) -> FeeEarnerSettings {
    FeeEarnerSettings {
        fee_earner_id: fee_earner(id),
        tenant_id: tenant(),
        max_concurrent_matters: 10,
        max_new_matters_per_week: 5,
        matter_types: Default::default(),
        min_transaction_value: None,
        max_transaction_value: None,
        accepts_auto_assignment: true,
        assignment_priority: 5,
        working_days: [1, 2, 3, 4, 5].into_iter().collect(),
        working_hours_start: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
        working_hours_end: NaiveTime::from_hms_opt(17, 30, 0).expect("valid time"),
    }
}

pub(super) fn matter(id: &str) -> MatterSnapshot {
    MatterSnapshot {
        matter_id: MatterId(id.to_string()),
        tenant_id: tenant(),
        matter_type: "purchase".to_string(),
        transaction_value: 245_000,
        status: MatterStatus::New,
        opened_on: today(),
        assigned_fee_earner_id: None,
    }
}

pub(super) fn availability_block(
    id: &str,
    fee_earner_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> AvailabilityBlock {
    AvailabilityBlock {
        id: AvailabilityBlockId(id.to_string()),
        fee_earner_id: fee_earner(fee_earner_id),
        tenant_id: tenant(),
        start_date: start,
        end_date: end,
        availability_type: AvailabilityType::Holiday,
        notes: None,
        deleted_at: None,
    }
}

/// Candidate with a live snapshot derived from the given counts; available
/// unless stated otherwise.
pub(super) fn candidate(
    id: &str,
    priority: u8,
    active: u32,
    max_concurrent: u32,
) -> AssignmentCandidate {
    let mut settings = settings(id);
    settings.assignment_priority = priority;
    settings.max_concurrent_matters = max_concurrent;
    let workload = WorkloadSnapshot::from_counts(&settings, active, 0, true);
    AssignmentCandidate { settings, workload }
}

#[derive(Default)]
pub(super) struct MemorySettings {
    rows: Mutex<HashMap<FeeEarnerId, FeeEarnerSettings>>,
}

impl SettingsRepository for MemorySettings {
    fn upsert(&self, settings: FeeEarnerSettings) -> Result<FeeEarnerSettings, RepositoryError> {
        let mut guard = self.rows.lock().expect("settings mutex poisoned");
        guard.insert(settings.fee_earner_id.clone(), settings.clone());
        Ok(settings)
    }

    fn fetch(
        &self,
        fee_earner_id: &FeeEarnerId,
    ) -> Result<Option<FeeEarnerSettings>, RepositoryError> {
        let guard = self.rows.lock().expect("settings mutex poisoned");
        Ok(guard.get(fee_earner_id).cloned())
    }

    fn list_for_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<FeeEarnerSettings>, RepositoryError> {
        let guard = self.rows.lock().expect("settings mutex poisoned");
        let mut rows: Vec<FeeEarnerSettings> = guard
            .values()
            .filter(|row| &row.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.fee_earner_id.cmp(&b.fee_earner_id));
        Ok(rows)
    }
}

#[derive(Default)]
pub(super) struct MemoryMatters {
    rows: Mutex<HashMap<MatterId, MatterSnapshot>>,
}

impl MemoryMatters {
    pub(super) fn insert(&self, matter: MatterSnapshot) {
        let mut guard = self.rows.lock().expect("matters mutex poisoned");
        guard.insert(matter.matter_id.clone(), matter);
    }

    pub(super) fn assigned_to(&self, matter_id: &MatterId) -> Option<FeeEarnerId> {
        let guard = self.rows.lock().expect("matters mutex poisoned");
        guard
            .get(matter_id)
            .and_then(|matter| matter.assigned_fee_earner_id.clone())
    }
}

impl MatterRepository for MemoryMatters {
    fn fetch(&self, matter_id: &MatterId) -> Result<Option<MatterSnapshot>, RepositoryError> {
        let guard = self.rows.lock().expect("matters mutex poisoned");
        Ok(guard.get(matter_id).cloned())
    }

    fn count_open_for(&self, fee_earner_id: &FeeEarnerId) -> Result<u32, RepositoryError> {
        let guard = self.rows.lock().expect("matters mutex poisoned");
        Ok(guard
            .values()
            .filter(|matter| {
                matter.status.is_open()
                    && matter.assigned_fee_earner_id.as_ref() == Some(fee_earner_id)
            })
            .count() as u32)
    }

    fn count_assigned_since(
        &self,
        fee_earner_id: &FeeEarnerId,
        since: NaiveDate,
    ) -> Result<u32, RepositoryError> {
        let guard = self.rows.lock().expect("matters mutex poisoned");
        Ok(guard
            .values()
            .filter(|matter| {
                matter.opened_on >= since
                    && matter.assigned_fee_earner_id.as_ref() == Some(fee_earner_id)
            })
            .count() as u32)
    }

    fn set_assigned_fee_earner(
        &self,
        matter_id: &MatterId,
        fee_earner_id: &FeeEarnerId,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.rows.lock().expect("matters mutex poisoned");
        let matter = guard.get_mut(matter_id).ok_or(RepositoryError::NotFound)?;
        matter.assigned_fee_earner_id = Some(fee_earner_id.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryAvailability {
    rows: Mutex<HashMap<AvailabilityBlockId, AvailabilityBlock>>,
}

impl MemoryAvailability {
    pub(super) fn seed(&self, block: AvailabilityBlock) {
        let mut guard = self.rows.lock().expect("availability mutex poisoned");
        guard.insert(block.id.clone(), block);
    }

    /// Raw row including tombstoned ones, for asserting soft-delete behavior.
    pub(super) fn raw(&self, block_id: &AvailabilityBlockId) -> Option<AvailabilityBlock> {
        let guard = self.rows.lock().expect("availability mutex poisoned");
        guard.get(block_id).cloned()
    }

    pub(super) fn len(&self) -> usize {
        let guard = self.rows.lock().expect("availability mutex poisoned");
        guard.len()
    }
}

impl AvailabilityRepository for MemoryAvailability {
    fn insert(&self, block: AvailabilityBlock) -> Result<AvailabilityBlock, RepositoryError> {
        let mut guard = self.rows.lock().expect("availability mutex poisoned");
        if guard.contains_key(&block.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(block.id.clone(), block.clone());
        Ok(block)
    }

    fn update(&self, block: AvailabilityBlock) -> Result<(), RepositoryError> {
        let mut guard = self.rows.lock().expect("availability mutex poisoned");
        if guard.contains_key(&block.id) {
            guard.insert(block.id.clone(), block);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(
        &self,
        block_id: &AvailabilityBlockId,
    ) -> Result<Option<AvailabilityBlock>, RepositoryError> {
        let guard = self.rows.lock().expect("availability mutex poisoned");
        Ok(guard
            .get(block_id)
            .filter(|block| !block.is_deleted())
            .cloned())
    }

    fn list_for_fee_earner(
        &self,
        fee_earner_id: &FeeEarnerId,
    ) -> Result<Vec<AvailabilityBlock>, RepositoryError> {
        let guard = self.rows.lock().expect("availability mutex poisoned");
        let mut blocks: Vec<AvailabilityBlock> = guard
            .values()
            .filter(|block| &block.fee_earner_id == fee_earner_id && !block.is_deleted())
            .cloned()
            .collect();
        blocks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(blocks)
    }
}

/// Access policy with a fixed identity and a fixed set of tenants the caller
/// manages.
pub(super) struct StaticAccess {
    identity: Option<Identity>,
    manages: HashSet<TenantId>,
}

impl StaticAccess {
    pub(super) fn manager() -> Self {
        Self {
            identity: Some(Identity {
                user_id: "usr-ops".to_string(),
                fee_earner_id: None,
            }),
            manages: [tenant()].into_iter().collect(),
        }
    }

    pub(super) fn fee_earner(id: &str) -> Self {
        Self {
            identity: Some(Identity {
                user_id: format!("usr-{id}"),
                fee_earner_id: Some(fee_earner(id)),
            }),
            manages: HashSet::new(),
        }
    }

    pub(super) fn anonymous() -> Self {
        Self {
            identity: None,
            manages: HashSet::new(),
        }
    }
}

impl AccessPolicy for StaticAccess {
    fn require_authenticated(&self) -> Result<Identity, AccessError> {
        self.identity.clone().ok_or(AccessError::Unauthenticated)
    }

    fn current_user_has_role(&self, tenant_id: &TenantId, roles: &[StaffRole]) -> bool {
        self.manages.contains(tenant_id)
            && roles
                .iter()
                .any(|role| matches!(role, StaffRole::Manager | StaffRole::Admin))
    }
}

/// One set of in-memory repositories shared by every service under test.
pub(super) struct TestEnv {
    pub(super) settings: Arc<MemorySettings>,
    pub(super) matters: Arc<MemoryMatters>,
    pub(super) availability: Arc<MemoryAvailability>,
}

impl TestEnv {
    pub(super) fn new() -> Self {
        Self {
            settings: Arc::new(MemorySettings::default()),
            matters: Arc::new(MemoryMatters::default()),
            availability: Arc::new(MemoryAvailability::default()),
        }
    }

    pub(super) fn seed_settings(&self, settings: FeeEarnerSettings) {
        self.settings
            .upsert(settings)
            .expect("settings upsert succeeds");
    }

    /// Seed `count` open matters assigned to the fee earner, opened before
    /// the current week so they do not count toward weekly intake.
    pub(super) fn seed_backlog(&self, fee_earner_id: &str, count: u32) {
        for index in 0..count {
            let mut matter = matter(&format!("mat-{fee_earner_id}-{index}"));
            matter.status = MatterStatus::Active;
            matter.opened_on = sunday() - chrono::Duration::days(7);
            matter.assigned_fee_earner_id = Some(fee_earner(fee_earner_id));
            self.matters.insert(matter);
        }
    }

    pub(super) fn calculator(
        &self,
    ) -> WorkloadCalculator<MemorySettings, MemoryMatters, MemoryAvailability> {
        WorkloadCalculator::new(
            self.settings.clone(),
            self.matters.clone(),
            self.availability.clone(),
        )
    }

    pub(super) fn assignment_service(
        &self,
        access: StaticAccess,
    ) -> MatterAssignmentService<MemorySettings, MemoryMatters, MemoryAvailability, StaticAccess>
    {
        MatterAssignmentService::new(
            self.settings.clone(),
            self.matters.clone(),
            self.availability.clone(),
            Arc::new(access),
        )
    }

    pub(super) fn availability_service(
        &self,
        access: StaticAccess,
    ) -> AvailabilityBlockService<MemoryAvailability, MemorySettings, StaticAccess> {
        AvailabilityBlockService::new(
            self.availability.clone(),
            self.settings.clone(),
            Arc::new(access),
        )
    }

    pub(super) fn settings_service(
        &self,
        access: StaticAccess,
    ) -> FeeEarnerSettingsService<MemorySettings, StaticAccess> {
        FeeEarnerSettingsService::new(self.settings.clone(), Arc::new(access))
    }

    pub(super) fn state(
        &self,
        access: StaticAccess,
    ) -> Arc<AssignmentState<MemorySettings, MemoryMatters, MemoryAvailability, StaticAccess>>
    {
        Arc::new(AssignmentState::new(
            self.settings.clone(),
            self.matters.clone(),
            self.availability.clone(),
            Arc::new(access),
        ))
    }
}
