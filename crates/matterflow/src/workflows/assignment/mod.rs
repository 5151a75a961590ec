//! Capacity-aware fee-earner assignment for conveyancing matters.
//!
//! Two selection strategies are deliberately kept apart: automatic
//! assignment filters on hard constraints and prefers priority then spare
//! capacity, while the advisory ranking scores every configured fee earner
//! for a human picker. Their top picks can disagree, and that divergence is
//! intentional.

pub mod access;
pub mod availability;
pub mod domain;
pub mod eligibility;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod settings;
pub mod workload;

#[cfg(test)]
mod tests;

pub use access::{AccessError, AccessPolicy, Identity, StaffRole, MANAGER_OR_ABOVE};
pub use availability::{
    AvailabilityBlockPatch, AvailabilityBlockService, AvailabilityError, AvailabilityOverview,
    BlockValidationError, NewAvailabilityBlock,
};
pub use domain::{
    AvailabilityBlock, AvailabilityBlockId, AvailabilityType, BlockPhase, FeeEarnerId,
    FeeEarnerSettings, MatterId, MatterSnapshot, MatterStatus, TenantId,
};
pub use eligibility::{filter_eligible, is_eligible, AssignmentCandidate};
pub use repository::{
    AvailabilityRepository, MatterRepository, RepositoryError, SettingsRepository,
};
pub use router::{assignment_router, AssignmentState};
pub use scoring::{rank, AssignmentRecommendation};
pub use service::{AssignmentError, ManualAssignmentOutcome, MatterAssignmentService};
pub use settings::{FeeEarnerSettingsService, SettingsError, SettingsValidationError};
pub use workload::{week_start, WorkloadCalculator, WorkloadSnapshot};
