use super::common::*;
use crate::workflows::assignment::domain::{AvailabilityType, MatterStatus};
use crate::workflows::assignment::workload::{week_start, WorkloadSnapshot};
use chrono::{Duration, NaiveDate, Utc};

#[test]
fn week_start_returns_most_recent_sunday() {
    assert_eq!(week_start(today()), sunday());
    assert_eq!(week_start(sunday()), sunday());
    let saturday = NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date");
    assert_eq!(week_start(saturday), sunday());
}

#[test]
fn unconfigured_fee_earner_gets_zeroed_snapshot() {
    let env = TestEnv::new();
    let snapshot = env
        .calculator()
        .compute(&fee_earner("fe-ghost"), today())
        .expect("computes");

    assert!(!snapshot.settings_configured);
    assert!(!snapshot.is_available);
    assert!(!snapshot.accepts_auto_assignment);
    assert_eq!(snapshot.active_matter_count, 0);
    assert_eq!(snapshot.capacity_percentage, 0);
}

#[test]
fn counts_open_matters_and_weekly_intake_separately() {
    let env = TestEnv::new();
    env.seed_settings(settings("fe-burns"));

    // Two open matters opened this week, one older backlog matter, and a
    // completed one opened last week that should not count as open work.
    for (index, opened) in [today(), sunday()].iter().enumerate() {
        let mut m = matter(&format!("mat-week-{index}"));
        m.opened_on = *opened;
        m.assigned_fee_earner_id = Some(fee_earner("fe-burns"));
        env.matters.insert(m);
    }
    env.seed_backlog("fe-burns", 1);
    let mut closed = matter("mat-closed");
    closed.status = MatterStatus::Completed;
    closed.opened_on = sunday() - Duration::days(3);
    closed.assigned_fee_earner_id = Some(fee_earner("fe-burns"));
    env.matters.insert(closed);

    let snapshot = env
        .calculator()
        .compute(&fee_earner("fe-burns"), today())
        .expect("computes");

    assert_eq!(snapshot.active_matter_count, 3);
    assert_eq!(snapshot.new_matters_this_week, 2);
    assert_eq!(snapshot.capacity_percentage, 30);
    assert_eq!(snapshot.weekly_capacity_percentage, 40);
    assert!(snapshot.is_available);
}

#[test]
fn any_active_block_removes_availability_regardless_of_type() {
    let env = TestEnv::new();
    env.seed_settings(settings("fe-burns"));

    let mut block = availability_block("blk-a", "fe-burns", today() - Duration::days(1), today());
    block.availability_type = AvailabilityType::Training;
    env.availability.seed(block);

    let snapshot = env
        .calculator()
        .compute(&fee_earner("fe-burns"), today())
        .expect("computes");
    assert!(!snapshot.is_available);
}

#[test]
fn overlapping_active_blocks_still_yield_single_unavailability() {
    let env = TestEnv::new();
    env.seed_settings(settings("fe-burns"));
    env.availability.seed(availability_block(
        "blk-a",
        "fe-burns",
        today() - Duration::days(2),
        today() + Duration::days(2),
    ));
    env.availability.seed(availability_block(
        "blk-b",
        "fe-burns",
        today(),
        today() + Duration::days(5),
    ));

    let snapshot = env
        .calculator()
        .compute(&fee_earner("fe-burns"), today())
        .expect("computes");
    assert!(!snapshot.is_available);
}

#[test]
fn tombstoned_blocks_do_not_affect_availability() {
    let env = TestEnv::new();
    env.seed_settings(settings("fe-burns"));

    let mut block = availability_block("blk-a", "fe-burns", today(), today());
    block.deleted_at = Some(Utc::now());
    env.availability.seed(block);

    let snapshot = env
        .calculator()
        .compute(&fee_earner("fe-burns"), today())
        .expect("computes");
    assert!(snapshot.is_available);
}

#[test]
fn upcoming_block_leaves_today_available() {
    let env = TestEnv::new();
    env.seed_settings(settings("fe-burns"));
    env.availability.seed(availability_block(
        "blk-a",
        "fe-burns",
        today() + Duration::days(3),
        today() + Duration::days(10),
    ));

    let snapshot = env
        .calculator()
        .compute(&fee_earner("fe-burns"), today())
        .expect("computes");
    assert!(snapshot.is_available);
}

#[test]
fn capacity_is_zero_when_no_maximum_is_configured() {
    let mut configured = settings("fe-burns");
    configured.max_concurrent_matters = 0;
    configured.max_new_matters_per_week = 0;

    let snapshot = WorkloadSnapshot::from_counts(&configured, 3, 2, true);
    assert_eq!(snapshot.capacity_percentage, 0);
    assert_eq!(snapshot.weekly_capacity_percentage, 0);
    assert_eq!(snapshot.capacity_fraction(), 0.0);
    assert!(snapshot.has_concurrent_headroom());
    assert!(snapshot.has_weekly_headroom());
}

#[test]
fn capacity_is_monotone_in_active_count() {
    let configured = settings("fe-burns");
    let mut previous = -1.0f64;
    for active in 0..=12 {
        let snapshot = WorkloadSnapshot::from_counts(&configured, active, 0, true);
        let fraction = snapshot.capacity_fraction();
        assert!(fraction >= previous);
        previous = fraction;
    }
}

#[test]
fn display_rounds_while_thresholds_use_the_unrounded_value() {
    let mut configured = settings("fe-burns");
    configured.max_concurrent_matters = 250;

    // 249/250 = 99.6%: shown as 100, still under the eligibility threshold.
    let snapshot = WorkloadSnapshot::from_counts(&configured, 249, 0, true);
    assert_eq!(snapshot.capacity_percentage, 100);
    assert!(snapshot.has_concurrent_headroom());

    let full = WorkloadSnapshot::from_counts(&configured, 250, 0, true);
    assert_eq!(full.capacity_percentage, 100);
    assert!(!full.has_concurrent_headroom());
}
