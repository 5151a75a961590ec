use serde::{Deserialize, Serialize};

use super::domain::{FeeEarnerId, TenantId};

/// Roles recognised by the engine's capability checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    FeeEarner,
    Manager,
    Admin,
}

impl StaffRole {
    pub const fn label(self) -> &'static str {
        match self {
            StaffRole::FeeEarner => "fee_earner",
            StaffRole::Manager => "manager",
            StaffRole::Admin => "admin",
        }
    }
}

/// Roles allowed to commit assignments and manage other people's diaries.
pub const MANAGER_OR_ABOVE: [StaffRole; 2] = [StaffRole::Manager, StaffRole::Admin];

/// Authenticated caller as resolved by the surrounding auth subsystem. Staff
/// who can own matters carry their fee-earner identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub fee_earner_id: Option<FeeEarnerId>,
}

impl Identity {
    pub fn is_fee_earner(&self, fee_earner_id: &FeeEarnerId) -> bool {
        self.fee_earner_id.as_ref() == Some(fee_earner_id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("caller is not authenticated")]
    Unauthenticated,
}

/// Capability checks implemented elsewhere; this engine only consumes the
/// answers.
pub trait AccessPolicy: Send + Sync {
    fn require_authenticated(&self) -> Result<Identity, AccessError>;
    /// Whether the current user holds any of `roles` within the tenant.
    fn current_user_has_role(&self, tenant_id: &TenantId, roles: &[StaffRole]) -> bool;
}
