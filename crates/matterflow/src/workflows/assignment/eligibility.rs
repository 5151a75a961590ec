//! Hard-constraint filtering and the automatic selection ordering.
//!
//! Automatic assignment and the advisory ranking are deliberately separate
//! strategies. This module decides who *may* take a matter and which eligible
//! candidate the engine prefers; `scoring` produces the human-facing ranked
//! list. Their top picks are not guaranteed to agree.

use super::domain::{FeeEarnerId, FeeEarnerSettings};
use super::workload::WorkloadSnapshot;

/// One fee earner's settings paired with a freshly computed workload
/// snapshot.
#[derive(Debug, Clone)]
pub struct AssignmentCandidate {
    pub settings: FeeEarnerSettings,
    pub workload: WorkloadSnapshot,
}

impl AssignmentCandidate {
    pub fn fee_earner_id(&self) -> &FeeEarnerId {
        &self.settings.fee_earner_id
    }

    /// An empty matter-type set accepts everything.
    pub fn handles_matter_type(&self, matter_type: &str) -> bool {
        self.settings.matter_types.is_empty() || self.settings.matter_types.contains(matter_type)
    }

    /// An absent bound always satisfies its side.
    pub fn value_within_bounds(&self, transaction_value: u64) -> bool {
        let above_min = self
            .settings
            .min_transaction_value
            .map_or(true, |min| transaction_value >= min);
        let below_max = self
            .settings
            .max_transaction_value
            .map_or(true, |max| transaction_value <= max);
        above_min && below_max
    }
}

/// All eight hard constraints. Capacity thresholds compare the unrounded
/// fractions, never the display percentages.
pub fn is_eligible(
    candidate: &AssignmentCandidate,
    matter_type: &str,
    transaction_value: u64,
) -> bool {
    let workload = &candidate.workload;
    workload.settings_configured
        && workload.accepts_auto_assignment
        && workload.is_available
        && candidate.handles_matter_type(matter_type)
        && candidate.value_within_bounds(transaction_value)
        && workload.has_concurrent_headroom()
        && workload.has_weekly_headroom()
}

/// Fee earners able to take the matter. Used only by automatic assignment;
/// the advisory ranking scores everyone instead.
pub fn filter_eligible(
    candidates: &[AssignmentCandidate],
    matter_type: &str,
    transaction_value: u64,
) -> Vec<FeeEarnerId> {
    eligible_in_selection_order(candidates, matter_type, transaction_value)
        .into_iter()
        .map(|candidate| candidate.fee_earner_id().clone())
        .collect()
}

/// Eligible candidates in automatic-selection preference: highest assignment
/// priority first, ties broken by lowest concurrent load, then by fee-earner
/// id so repeated runs are deterministic.
pub fn eligible_in_selection_order<'a>(
    candidates: &'a [AssignmentCandidate],
    matter_type: &str,
    transaction_value: u64,
) -> Vec<&'a AssignmentCandidate> {
    let mut eligible: Vec<&AssignmentCandidate> = candidates
        .iter()
        .filter(|candidate| is_eligible(candidate, matter_type, transaction_value))
        .collect();

    eligible.sort_by(|a, b| {
        b.workload
            .assignment_priority
            .cmp(&a.workload.assignment_priority)
            .then_with(|| {
                a.workload
                    .capacity_fraction()
                    .total_cmp(&b.workload.capacity_fraction())
            })
            .then_with(|| a.fee_earner_id().cmp(b.fee_earner_id()))
    });

    eligible
}
