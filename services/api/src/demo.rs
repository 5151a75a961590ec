use chrono::{Duration, Local, NaiveDate, NaiveTime};
use clap::Args;

use crate::infra::{build_stores, parse_date, ApiStores};
use matterflow::error::AppError;
use matterflow::workflows::assignment::{
    AvailabilityType, FeeEarnerId, FeeEarnerSettings, MatterId, MatterSnapshot, MatterStatus,
    NewAvailabilityBlock, SettingsRepository, TenantId,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the reference date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

const DEMO_TENANT: &str = "firm-caledonia";

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let stores = build_stores();
    seed_demo_firm(&stores, today);

    println!("Fee-earner assignment demo ({DEMO_TENANT})");
    println!("Evaluated {today}");

    println!("\nWorkload snapshots");
    for id in ["fe-adair", "fe-burns", "fe-scott"] {
        match stores
            .state
            .assignments
            .workload(&FeeEarnerId(id.to_string()), today)
        {
            Ok(snapshot) => println!(
                "- {}: {}/{} active ({}%), {}/{} this week ({}%), available: {}",
                id,
                snapshot.active_matter_count,
                snapshot.max_concurrent_matters,
                snapshot.capacity_percentage,
                snapshot.new_matters_this_week,
                snapshot.max_new_matters_per_week,
                snapshot.weekly_capacity_percentage,
                snapshot.is_available,
            ),
            Err(err) => println!("- {id}: workload unavailable: {err}"),
        }
    }

    let matter_id = MatterId("mat-dem-001".to_string());
    println!("\nAdvisory ranking for {matter_id} (purchase, 245,000)");
    match stores.state.assignments.recommendations(&matter_id, today) {
        Ok(recommendations) => {
            for recommendation in &recommendations {
                println!(
                    "- {}: score {} | {}",
                    recommendation.fee_earner_id,
                    recommendation.score,
                    recommendation.reason_summary()
                );
            }
        }
        Err(err) => println!("  Ranking unavailable: {err}"),
    }

    println!("\nAutomatic assignment");
    match stores.state.assignments.auto_assign(&matter_id, today) {
        Ok(chosen) => println!("- {matter_id} assigned to {chosen}"),
        Err(err) => println!("- Automatic assignment refused: {err}"),
    }

    // A manual override onto the blocked senior shows the advisory warnings
    // without stopping the write.
    let override_matter = MatterId("mat-dem-002".to_string());
    println!("\nManual override of {override_matter} onto fe-adair");
    match stores.state.assignments.manual_assign(
        &override_matter,
        &FeeEarnerId("fe-adair".to_string()),
        today,
    ) {
        Ok(outcome) => {
            println!("- Assigned to {}", outcome.fee_earner_id);
            if outcome.warnings.is_empty() {
                println!("- No warnings raised");
            } else {
                for warning in &outcome.warnings {
                    println!("- Warning: {warning}");
                }
            }
        }
        Err(err) => println!("- Manual assignment failed: {err}"),
    }

    if let Some(assigned) = stores.matters.get(&matter_id) {
        println!(
            "\nMatter record now shows assignee: {}",
            assigned
                .assigned_fee_earner_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
    }

    Ok(())
}

fn demo_settings(id: &str, priority: u8, max_concurrent: u32) -> FeeEarnerSettings {
    FeeEarnerSettings {
        fee_earner_id: FeeEarnerId(id.to_string()),
        tenant_id: TenantId(DEMO_TENANT.to_string()),
        max_concurrent_matters: max_concurrent,
        max_new_matters_per_week: 5,
        matter_types: Default::default(),
        min_transaction_value: None,
        max_transaction_value: None,
        accepts_auto_assignment: true,
        assignment_priority: priority,
        working_days: [1, 2, 3, 4, 5].into_iter().collect(),
        working_hours_start: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
        working_hours_end: NaiveTime::from_hms_opt(17, 30, 0).expect("valid time"),
    }
}

fn seed_demo_firm(stores: &ApiStores, today: NaiveDate) {
    // A senior on leave, a specialist with a busy caseload, and a junior
    // with room to take work.
    let mut senior = demo_settings("fe-adair", 9, 8);
    senior.matter_types = ["purchase".to_string(), "sale".to_string()]
        .into_iter()
        .collect();
    stores.settings.upsert(senior).expect("seed settings");

    let mut specialist = demo_settings("fe-burns", 7, 8);
    specialist.min_transaction_value = Some(100_000);
    stores.settings.upsert(specialist).expect("seed settings");

    stores
        .settings
        .upsert(demo_settings("fe-scott", 5, 10))
        .expect("seed settings");

    stores
        .state
        .availability
        .create(NewAvailabilityBlock {
            fee_earner_id: FeeEarnerId("fe-adair".to_string()),
            tenant_id: TenantId(DEMO_TENANT.to_string()),
            start_date: today - Duration::days(1),
            end_date: Some(today + Duration::days(4)),
            availability_type: AvailabilityType::Holiday,
            notes: Some("Annual leave".to_string()),
        })
        .expect("seed block");

    for index in 0..6 {
        stores.matters.insert(MatterSnapshot {
            matter_id: MatterId(format!("mat-bl-{index}")),
            tenant_id: TenantId(DEMO_TENANT.to_string()),
            matter_type: "purchase".to_string(),
            transaction_value: 180_000,
            status: MatterStatus::Active,
            opened_on: today - Duration::days(30),
            assigned_fee_earner_id: Some(FeeEarnerId("fe-burns".to_string())),
        });
    }

    for id in ["mat-dem-001", "mat-dem-002"] {
        stores.matters.insert(MatterSnapshot {
            matter_id: MatterId(id.to_string()),
            tenant_id: TenantId(DEMO_TENANT.to_string()),
            matter_type: "purchase".to_string(),
            transaction_value: 245_000,
            status: MatterStatus::New,
            opened_on: today,
            assigned_fee_earner_id: None,
        });
    }
}
