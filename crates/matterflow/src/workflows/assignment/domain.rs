use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for a tenant (a law firm on the platform).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub String);

/// Identifier wrapper for a fee earner (a staff member who can own matters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeeEarnerId(pub String);

/// Identifier wrapper for a conveyancing matter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatterId(pub String);

/// Identifier wrapper for an availability block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AvailabilityBlockId(pub String);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for FeeEarnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for MatterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for AvailabilityBlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-fee-earner assignment configuration, one row per fee earner per
/// tenant. A fee earner without a row is invisible to both automatic
/// assignment and the advisory ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEarnerSettings {
    pub fee_earner_id: FeeEarnerId,
    pub tenant_id: TenantId,
    pub max_concurrent_matters: u32,
    pub max_new_matters_per_week: u32,
    /// Matter types this fee earner takes; empty means all types accepted.
    pub matter_types: BTreeSet<String>,
    /// Transaction-value bounds in whole pounds; an absent bound is open.
    pub min_transaction_value: Option<u64>,
    pub max_transaction_value: Option<u64>,
    pub accepts_auto_assignment: bool,
    /// 1 (lowest) to 10 (highest).
    pub assignment_priority: u8,
    /// Day-of-week indexes, 0 = Sunday through 6 = Saturday.
    pub working_days: BTreeSet<u8>,
    pub working_hours_start: NaiveTime,
    pub working_hours_end: NaiveTime,
}

/// Reason a fee earner is away from new work for a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityType {
    Holiday,
    SickLeave,
    Training,
    ReducedCapacity,
}

impl AvailabilityType {
    pub const fn label(self) -> &'static str {
        match self {
            AvailabilityType::Holiday => "Holiday",
            AvailabilityType::SickLeave => "Sick Leave",
            AvailabilityType::Training => "Training",
            AvailabilityType::ReducedCapacity => "Reduced Capacity",
        }
    }
}

/// Read-time classification of a block against a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockPhase {
    Active,
    Upcoming,
    Past,
}

impl BlockPhase {
    pub const fn label(self) -> &'static str {
        match self {
            BlockPhase::Active => "active",
            BlockPhase::Upcoming => "upcoming",
            BlockPhase::Past => "past",
        }
    }
}

/// Date-ranged unavailability record. Deleted rows keep their tombstone
/// timestamp; they are never removed from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityBlock {
    pub id: AvailabilityBlockId,
    pub fee_earner_id: FeeEarnerId,
    pub tenant_id: TenantId,
    pub start_date: NaiveDate,
    /// Inclusive end of the range; equal to `start_date` for one-day blocks.
    pub end_date: NaiveDate,
    pub availability_type: AvailabilityType,
    pub notes: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AvailabilityBlock {
    /// Whether `today` falls within the inclusive date range. The block type
    /// is irrelevant: any covering block removes availability.
    pub fn covers(&self, today: NaiveDate) -> bool {
        self.start_date <= today && today <= self.end_date
    }

    pub fn phase(&self, today: NaiveDate) -> BlockPhase {
        if self.covers(today) {
            BlockPhase::Active
        } else if self.start_date > today {
            BlockPhase::Upcoming
        } else {
            BlockPhase::Past
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Lifecycle state of a matter as tracked by the surrounding matter
/// management subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatterStatus {
    New,
    Active,
    Completed,
    Cancelled,
}

impl MatterStatus {
    pub const fn label(self) -> &'static str {
        match self {
            MatterStatus::New => "new",
            MatterStatus::Active => "active",
            MatterStatus::Completed => "completed",
            MatterStatus::Cancelled => "cancelled",
        }
    }

    /// Counts toward a fee earner's concurrent workload.
    pub const fn is_open(self) -> bool {
        matches!(self, MatterStatus::New | MatterStatus::Active)
    }
}

/// The slice of an externally owned matter record this engine reads. Only
/// the assigned fee earner is ever written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatterSnapshot {
    pub matter_id: MatterId,
    pub tenant_id: TenantId,
    pub matter_type: String,
    /// Transaction value in whole pounds, as produced by the tax calculators.
    pub transaction_value: u64,
    pub status: MatterStatus,
    pub opened_on: NaiveDate,
    pub assigned_fee_earner_id: Option<FeeEarnerId>,
}
