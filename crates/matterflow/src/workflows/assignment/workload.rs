use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::{FeeEarnerId, FeeEarnerSettings};
use super::repository::{
    AvailabilityRepository, MatterRepository, RepositoryError, SettingsRepository,
};

/// Point-in-time capacity picture for one fee earner. Recomputed on every
/// request and never persisted or cached; callers must not reuse a snapshot
/// across requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSnapshot {
    pub fee_earner_id: FeeEarnerId,
    pub active_matter_count: u32,
    pub max_concurrent_matters: u32,
    pub new_matters_this_week: u32,
    pub max_new_matters_per_week: u32,
    /// Rounded to the nearest integer for display. Threshold comparisons go
    /// through `capacity_fraction` instead so a 99.6% load does not read as
    /// full.
    pub capacity_percentage: u32,
    pub weekly_capacity_percentage: u32,
    pub is_available: bool,
    pub accepts_auto_assignment: bool,
    pub assignment_priority: u8,
    pub settings_configured: bool,
}

impl WorkloadSnapshot {
    /// Snapshot for a fee earner with no settings row: all counts zero,
    /// unavailable, and invisible to both selection strategies.
    pub fn unconfigured(fee_earner_id: FeeEarnerId) -> Self {
        Self {
            fee_earner_id,
            active_matter_count: 0,
            max_concurrent_matters: 0,
            new_matters_this_week: 0,
            max_new_matters_per_week: 0,
            capacity_percentage: 0,
            weekly_capacity_percentage: 0,
            is_available: false,
            accepts_auto_assignment: false,
            assignment_priority: 0,
            settings_configured: false,
        }
    }

    pub fn from_counts(
        settings: &FeeEarnerSettings,
        active_matter_count: u32,
        new_matters_this_week: u32,
        is_available: bool,
    ) -> Self {
        let capacity = percentage_of(active_matter_count, settings.max_concurrent_matters);
        let weekly = percentage_of(new_matters_this_week, settings.max_new_matters_per_week);

        Self {
            fee_earner_id: settings.fee_earner_id.clone(),
            active_matter_count,
            max_concurrent_matters: settings.max_concurrent_matters,
            new_matters_this_week,
            max_new_matters_per_week: settings.max_new_matters_per_week,
            capacity_percentage: capacity.round() as u32,
            weekly_capacity_percentage: weekly.round() as u32,
            is_available,
            accepts_auto_assignment: settings.accepts_auto_assignment,
            assignment_priority: settings.assignment_priority,
            settings_configured: true,
        }
    }

    /// Unrounded concurrent load as a percentage; 0 when no maximum is set.
    pub fn capacity_fraction(&self) -> f64 {
        percentage_of(self.active_matter_count, self.max_concurrent_matters)
    }

    pub fn weekly_capacity_fraction(&self) -> f64 {
        percentage_of(self.new_matters_this_week, self.max_new_matters_per_week)
    }

    pub fn has_concurrent_headroom(&self) -> bool {
        self.capacity_fraction() < 100.0
    }

    pub fn has_weekly_headroom(&self) -> bool {
        self.weekly_capacity_fraction() < 100.0
    }
}

fn percentage_of(count: u32, max: u32) -> f64 {
    if max == 0 {
        0.0
    } else {
        f64::from(count) / f64::from(max) * 100.0
    }
}

/// Most recent day-of-week 0 (Sunday) on or before `today`; the boundary for
/// the weekly intake count.
pub fn week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(today.weekday().num_days_from_sunday()))
}

/// Derives capacity snapshots from persisted settings, matter counts, and
/// diary blocks.
pub struct WorkloadCalculator<S, M, A> {
    settings: Arc<S>,
    matters: Arc<M>,
    availability: Arc<A>,
}

impl<S, M, A> WorkloadCalculator<S, M, A>
where
    S: SettingsRepository,
    M: MatterRepository,
    A: AvailabilityRepository,
{
    pub fn new(settings: Arc<S>, matters: Arc<M>, availability: Arc<A>) -> Self {
        Self {
            settings,
            matters,
            availability,
        }
    }

    /// Compute the snapshot for one fee earner as of `today`. Callers inject
    /// the date so tests can pin the clock.
    pub fn compute(
        &self,
        fee_earner_id: &FeeEarnerId,
        today: NaiveDate,
    ) -> Result<WorkloadSnapshot, RepositoryError> {
        let Some(settings) = self.settings.fetch(fee_earner_id)? else {
            return Ok(WorkloadSnapshot::unconfigured(fee_earner_id.clone()));
        };

        let active_matter_count = self.matters.count_open_for(fee_earner_id)?;
        let new_matters_this_week = self
            .matters
            .count_assigned_since(fee_earner_id, week_start(today))?;

        // Any covering, non-deleted block removes availability; the block
        // type and the number of overlapping blocks do not matter.
        let blocks = self.availability.list_for_fee_earner(fee_earner_id)?;
        let is_available = !blocks.iter().any(|block| block.covers(today));

        Ok(WorkloadSnapshot::from_counts(
            &settings,
            active_matter_count,
            new_matters_this_week,
            is_available,
        ))
    }
}
