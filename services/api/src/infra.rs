use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;

use matterflow::workflows::assignment::{
    AccessError, AccessPolicy, AssignmentState, AvailabilityBlock, AvailabilityBlockId,
    AvailabilityRepository, FeeEarnerId, FeeEarnerSettings, Identity, MatterId, MatterRepository,
    MatterSnapshot, RepositoryError, SettingsRepository, StaffRole, TenantId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ApiAssignmentState = AssignmentState<
    InMemorySettingsStore,
    InMemoryMatterStore,
    InMemoryAvailabilityStore,
    DevAccessPolicy,
>;

pub(crate) struct ApiStores {
    pub(crate) settings: Arc<InMemorySettingsStore>,
    pub(crate) matters: Arc<InMemoryMatterStore>,
    pub(crate) state: Arc<ApiAssignmentState>,
}

/// In-memory adapters standing in for the hosted relational store until the
/// persistence integration fronts this service.
pub(crate) fn build_stores() -> ApiStores {
    let settings = Arc::new(InMemorySettingsStore::default());
    let matters = Arc::new(InMemoryMatterStore::default());
    let availability = Arc::new(InMemoryAvailabilityStore::default());
    let state = Arc::new(AssignmentState::new(
        settings.clone(),
        matters.clone(),
        availability,
        Arc::new(DevAccessPolicy),
    ));
    ApiStores {
        settings,
        matters,
        state,
    }
}

#[derive(Default)]
pub(crate) struct InMemorySettingsStore {
    rows: Mutex<HashMap<FeeEarnerId, FeeEarnerSettings>>,
}

impl SettingsRepository for InMemorySettingsStore {
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
pub(crate) struct InMemoryMatterStore {
    rows: Mutex<HashMap<MatterId, MatterSnapshot>>,
}

impl InMemoryMatterStore {
    pub(crate) fn insert(&self, matter: MatterSnapshot) {
        let mut guard = self.rows.lock().expect("matters mutex poisoned");
        guard.insert(matter.matter_id.clone(), matter);
    }

    pub(crate) fn get(&self, matter_id: &MatterId) -> Option<MatterSnapshot> {
        let guard = self.rows.lock().expect("matters mutex poisoned");
        guard.get(matter_id).cloned()
    }
}

impl MatterRepository for InMemoryMatterStore {
    fn fetch(&self, matter_id: &MatterId) -> Result<Option<MatterSnapshot>, RepositoryError> {
        Ok(self.get(matter_id))
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
pub(crate) struct InMemoryAvailabilityStore {
    rows: Mutex<HashMap<AvailabilityBlockId, AvailabilityBlock>>,
}

impl AvailabilityRepository for InMemoryAvailabilityStore {
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
        Ok(guard
            .values()
            .filter(|block| &block.fee_earner_id == fee_earner_id && !block.is_deleted())
            .cloned()
            .collect())
    }
}

/// Development stand-in for the platform auth subsystem: a single operations
/// identity holding the manager role in every tenant.
pub(crate) struct DevAccessPolicy;

impl AccessPolicy for DevAccessPolicy {
    fn require_authenticated(&self) -> Result<Identity, AccessError> {
        Ok(Identity {
            user_id: "usr-dev-ops".to_string(),
            fee_earner_id: None,
        })
    }

    fn current_user_has_role(&self, _tenant_id: &TenantId, roles: &[StaffRole]) -> bool {
        roles
            .iter()
            .any(|role| matches!(role, StaffRole::Manager | StaffRole::Admin))
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
