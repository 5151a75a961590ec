//! Advisory weighted ranking for the manual-assignment picker.
//!
//! Every configured fee earner is scored, including unavailable or
//! over-capacity ones, so the requester can see *why* someone is a poor
//! match. This is a different strategy from automatic selection and its top
//! pick may disagree with the auto-assignment pick.

use serde::{Deserialize, Serialize};

use super::domain::FeeEarnerId;
use super::eligibility::AssignmentCandidate;
use super::workload::WorkloadSnapshot;

const PRIORITY_WEIGHT: i32 = 10;
const AVAILABLE_POINTS: i32 = 50;
const WEEKLY_HEADROOM_POINTS: i32 = 20;
const TYPE_MATCH_POINTS: i32 = 20;
const VALUE_FIT_POINTS: i32 = 15;

/// Scored recommendation with its rationale tokens in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecommendation {
    pub fee_earner_id: FeeEarnerId,
    pub score: i32,
    pub reasons: Vec<String>,
    pub workload: WorkloadSnapshot,
}

impl AssignmentRecommendation {
    /// The human-readable reason string shown next to the recommendation.
    pub fn reason_summary(&self) -> String {
        self.reasons.join(", ")
    }
}

/// Rank candidates for advisory display: score descending, ties by
/// fee-earner id so output is stable across runs. Fee earners with no
/// settings row never enter the list.
pub fn rank(
    candidates: &[AssignmentCandidate],
    matter_type: &str,
    transaction_value: u64,
) -> Vec<AssignmentRecommendation> {
    let mut recommendations: Vec<AssignmentRecommendation> = candidates
        .iter()
        .filter(|candidate| candidate.workload.settings_configured)
        .map(|candidate| score_candidate(candidate, matter_type, transaction_value))
        .collect();

    recommendations.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.fee_earner_id.cmp(&b.fee_earner_id))
    });

    recommendations
}

fn score_candidate(
    candidate: &AssignmentCandidate,
    matter_type: &str,
    transaction_value: u64,
) -> AssignmentRecommendation {
    let workload = &candidate.workload;
    let mut score = 0i32;
    let mut reasons = Vec::new();

    score += i32::from(workload.assignment_priority) * PRIORITY_WEIGHT;
    reasons.push(format!(
        "Assignment priority {}",
        workload.assignment_priority
    ));

    if workload.is_available {
        score += AVAILABLE_POINTS;
        reasons.push("Available now".to_string());
    } else {
        reasons.push("Currently unavailable".to_string());
    }

    // Bands compare the unrounded fraction, same policy as the eligibility
    // filter.
    let capacity = workload.capacity_fraction();
    let (band_points, band_reason) = if capacity < 50.0 {
        (30, "Light caseload")
    } else if capacity < 75.0 {
        (20, "Moderate caseload")
    } else if capacity < 90.0 {
        (10, "Nearly at capacity")
    } else {
        (0, "At full capacity")
    };
    score += band_points;
    reasons.push(band_reason.to_string());

    if workload.weekly_capacity_fraction() < 100.0 {
        score += WEEKLY_HEADROOM_POINTS;
        reasons.push("Weekly intake open".to_string());
    } else {
        reasons.push("Weekly limit reached".to_string());
    }

    if candidate.handles_matter_type(matter_type) {
        score += TYPE_MATCH_POINTS;
        reasons.push("Handles this matter type".to_string());
    } else {
        reasons.push("Outside usual matter types".to_string());
    }

    if candidate.value_within_bounds(transaction_value) {
        score += VALUE_FIT_POINTS;
        reasons.push("Transaction value within range".to_string());
    } else {
        reasons.push("Transaction value outside range".to_string());
    }

    AssignmentRecommendation {
        fee_earner_id: candidate.fee_earner_id().clone(),
        score,
        reasons,
        workload: workload.clone(),
    }
}
