use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Router,
};
use chrono::{Local, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::access::AccessPolicy;
use super::availability::{
    AvailabilityBlockPatch, AvailabilityBlockService, AvailabilityError, NewAvailabilityBlock,
};
use super::domain::{AvailabilityBlockId, FeeEarnerId, FeeEarnerSettings, MatterId, TenantId};
use super::repository::{
    AvailabilityRepository, MatterRepository, RepositoryError, SettingsRepository,
};
use super::scoring::AssignmentRecommendation;
use super::service::{AssignmentError, MatterAssignmentService};
use super::settings::{FeeEarnerSettingsService, SettingsError};
use super::workload::WorkloadSnapshot;

/// Shared state for the assignment endpoints: the three services over one
/// set of repositories.
pub struct AssignmentState<S, M, A, P> {
    pub assignments: MatterAssignmentService<S, M, A, P>,
    pub availability: AvailabilityBlockService<A, S, P>,
    pub settings: FeeEarnerSettingsService<S, P>,
}

impl<S, M, A, P> AssignmentState<S, M, A, P>
where
    S: SettingsRepository,
    M: MatterRepository,
    A: AvailabilityRepository,
    P: AccessPolicy,
{
    pub fn new(settings: Arc<S>, matters: Arc<M>, availability: Arc<A>, access: Arc<P>) -> Self {
        Self {
            assignments: MatterAssignmentService::new(
                settings.clone(),
                matters,
                availability.clone(),
                access.clone(),
            ),
            availability: AvailabilityBlockService::new(
                availability,
                settings.clone(),
                access.clone(),
            ),
            settings: FeeEarnerSettingsService::new(settings, access),
        }
    }
}

/// Router builder exposing the assignment engine's HTTP surface.
pub fn assignment_router<S, M, A, P>(state: Arc<AssignmentState<S, M, A, P>>) -> Router
where
    S: SettingsRepository + 'static,
    M: MatterRepository + 'static,
    A: AvailabilityRepository + 'static,
    P: AccessPolicy + 'static,
{
    Router::new()
        .route(
            "/api/v1/assignment/fee-earners/:fee_earner_id/workload",
            get(workload_handler::<S, M, A, P>),
        )
        .route(
            "/api/v1/assignment/fee-earners/:fee_earner_id/settings",
            put(upsert_settings_handler::<S, M, A, P>),
        )
        .route(
            "/api/v1/assignment/fee-earners/:fee_earner_id/availability-blocks",
            get(list_blocks_handler::<S, M, A, P>),
        )
        .route(
            "/api/v1/assignment/matters/:matter_id/recommendations",
            get(recommendations_handler::<S, M, A, P>),
        )
        .route(
            "/api/v1/assignment/matters/:matter_id/auto-assign",
            post(auto_assign_handler::<S, M, A, P>),
        )
        .route(
            "/api/v1/assignment/matters/:matter_id/assignee",
            post(manual_assign_handler::<S, M, A, P>),
        )
        .route(
            "/api/v1/assignment/availability-blocks",
            post(create_block_handler::<S, M, A, P>),
        )
        .route(
            "/api/v1/assignment/availability-blocks/:block_id",
            patch(update_block_handler::<S, M, A, P>)
                .delete(delete_block_handler::<S, M, A, P>),
        )
        .with_state(state)
}

/// Optional reference-date override so callers (and tests) can pin the
/// clock; defaults to the local calendar date.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AssignmentDateQuery {
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

impl AssignmentDateQuery {
    fn resolve(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ManualAssignRequest {
    pub(crate) fee_earner_id: String,
}

/// Settings payload; the fee-earner identity comes from the path.
#[derive(Debug, Deserialize)]
pub(crate) struct UpsertSettingsRequest {
    pub(crate) tenant_id: TenantId,
    pub(crate) max_concurrent_matters: u32,
    pub(crate) max_new_matters_per_week: u32,
    #[serde(default)]
    pub(crate) matter_types: BTreeSet<String>,
    #[serde(default)]
    pub(crate) min_transaction_value: Option<u64>,
    #[serde(default)]
    pub(crate) max_transaction_value: Option<u64>,
    pub(crate) accepts_auto_assignment: bool,
    pub(crate) assignment_priority: u8,
    pub(crate) working_days: BTreeSet<u8>,
    pub(crate) working_hours_start: NaiveTime,
    pub(crate) working_hours_end: NaiveTime,
}

impl UpsertSettingsRequest {
    fn into_settings(self, fee_earner_id: FeeEarnerId) -> FeeEarnerSettings {
        FeeEarnerSettings {
            fee_earner_id,
            tenant_id: self.tenant_id,
            max_concurrent_matters: self.max_concurrent_matters,
            max_new_matters_per_week: self.max_new_matters_per_week,
            matter_types: self.matter_types,
            min_transaction_value: self.min_transaction_value,
            max_transaction_value: self.max_transaction_value,
            accepts_auto_assignment: self.accepts_auto_assignment,
            assignment_priority: self.assignment_priority,
            working_days: self.working_days,
            working_hours_start: self.working_hours_start,
            working_hours_end: self.working_hours_end,
        }
    }
}

/// Recommendation plus the joined reason string the picker displays.
#[derive(Debug, Serialize)]
pub(crate) struct RecommendationView {
    pub(crate) fee_earner_id: FeeEarnerId,
    pub(crate) score: i32,
    pub(crate) reason: String,
    pub(crate) reasons: Vec<String>,
    pub(crate) workload: WorkloadSnapshot,
}

impl From<AssignmentRecommendation> for RecommendationView {
    fn from(recommendation: AssignmentRecommendation) -> Self {
        let reason = recommendation.reason_summary();
        Self {
            fee_earner_id: recommendation.fee_earner_id,
            score: recommendation.score,
            reason,
            reasons: recommendation.reasons,
            workload: recommendation.workload,
        }
    }
}

pub(crate) async fn workload_handler<S, M, A, P>(
    State(state): State<Arc<AssignmentState<S, M, A, P>>>,
    Path(fee_earner_id): Path<String>,
    Query(query): Query<AssignmentDateQuery>,
) -> Response
where
    S: SettingsRepository + 'static,
    M: MatterRepository + 'static,
    A: AvailabilityRepository + 'static,
    P: AccessPolicy + 'static,
{
    let fee_earner_id = FeeEarnerId(fee_earner_id);
    match state.assignments.workload(&fee_earner_id, query.resolve()) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => assignment_error_response(error),
    }
}

pub(crate) async fn recommendations_handler<S, M, A, P>(
    State(state): State<Arc<AssignmentState<S, M, A, P>>>,
    Path(matter_id): Path<String>,
    Query(query): Query<AssignmentDateQuery>,
) -> Response
where
    S: SettingsRepository + 'static,
    M: MatterRepository + 'static,
    A: AvailabilityRepository + 'static,
    P: AccessPolicy + 'static,
{
    let matter_id = MatterId(matter_id);
    match state.assignments.recommendations(&matter_id, query.resolve()) {
        Ok(recommendations) => {
            let views: Vec<RecommendationView> =
                recommendations.into_iter().map(Into::into).collect();
            let payload = json!({
                "matter_id": matter_id,
                "recommendations": views,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => assignment_error_response(error),
    }
}

pub(crate) async fn auto_assign_handler<S, M, A, P>(
    State(state): State<Arc<AssignmentState<S, M, A, P>>>,
    Path(matter_id): Path<String>,
    Query(query): Query<AssignmentDateQuery>,
) -> Response
where
    S: SettingsRepository + 'static,
    M: MatterRepository + 'static,
    A: AvailabilityRepository + 'static,
    P: AccessPolicy + 'static,
{
    let matter_id = MatterId(matter_id);
    match state.assignments.auto_assign(&matter_id, query.resolve()) {
        Ok(fee_earner_id) => {
            let payload = json!({
                "matter_id": matter_id,
                "assigned_fee_earner_id": fee_earner_id,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => assignment_error_response(error),
    }
}

pub(crate) async fn manual_assign_handler<S, M, A, P>(
    State(state): State<Arc<AssignmentState<S, M, A, P>>>,
    Path(matter_id): Path<String>,
    Query(query): Query<AssignmentDateQuery>,
    axum::Json(request): axum::Json<ManualAssignRequest>,
) -> Response
where
    S: SettingsRepository + 'static,
    M: MatterRepository + 'static,
    A: AvailabilityRepository + 'static,
    P: AccessPolicy + 'static,
{
    let matter_id = MatterId(matter_id);
    let fee_earner_id = FeeEarnerId(request.fee_earner_id);
    match state
        .assignments
        .manual_assign(&matter_id, &fee_earner_id, query.resolve())
    {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => assignment_error_response(error),
    }
}

pub(crate) async fn upsert_settings_handler<S, M, A, P>(
    State(state): State<Arc<AssignmentState<S, M, A, P>>>,
    Path(fee_earner_id): Path<String>,
    axum::Json(request): axum::Json<UpsertSettingsRequest>,
) -> Response
where
    S: SettingsRepository + 'static,
    M: MatterRepository + 'static,
    A: AvailabilityRepository + 'static,
    P: AccessPolicy + 'static,
{
    let settings = request.into_settings(FeeEarnerId(fee_earner_id));
    match state.settings.upsert(settings) {
        Ok(stored) => (StatusCode::OK, axum::Json(stored)).into_response(),
        Err(error) => settings_error_response(error),
    }
}

pub(crate) async fn create_block_handler<S, M, A, P>(
    State(state): State<Arc<AssignmentState<S, M, A, P>>>,
    axum::Json(request): axum::Json<NewAvailabilityBlock>,
) -> Response
where
    S: SettingsRepository + 'static,
    M: MatterRepository + 'static,
    A: AvailabilityRepository + 'static,
    P: AccessPolicy + 'static,
{
    match state.availability.create(request) {
        Ok(block) => (StatusCode::CREATED, axum::Json(block)).into_response(),
        Err(error) => availability_error_response(error),
    }
}

pub(crate) async fn update_block_handler<S, M, A, P>(
    State(state): State<Arc<AssignmentState<S, M, A, P>>>,
    Path(block_id): Path<String>,
    axum::Json(patch): axum::Json<AvailabilityBlockPatch>,
) -> Response
where
    S: SettingsRepository + 'static,
    M: MatterRepository + 'static,
    A: AvailabilityRepository + 'static,
    P: AccessPolicy + 'static,
{
    let block_id = AvailabilityBlockId(block_id);
    match state.availability.update(&block_id, patch) {
        Ok(block) => (StatusCode::OK, axum::Json(block)).into_response(),
        Err(error) => availability_error_response(error),
    }
}

pub(crate) async fn delete_block_handler<S, M, A, P>(
    State(state): State<Arc<AssignmentState<S, M, A, P>>>,
    Path(block_id): Path<String>,
) -> Response
where
    S: SettingsRepository + 'static,
    M: MatterRepository + 'static,
    A: AvailabilityRepository + 'static,
    P: AccessPolicy + 'static,
{
    let block_id = AvailabilityBlockId(block_id);
    match state.availability.delete(&block_id, Utc::now()) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => availability_error_response(error),
    }
}

pub(crate) async fn list_blocks_handler<S, M, A, P>(
    State(state): State<Arc<AssignmentState<S, M, A, P>>>,
    Path(fee_earner_id): Path<String>,
    Query(query): Query<AssignmentDateQuery>,
) -> Response
where
    S: SettingsRepository + 'static,
    M: MatterRepository + 'static,
    A: AvailabilityRepository + 'static,
    P: AccessPolicy + 'static,
{
    let fee_earner_id = FeeEarnerId(fee_earner_id);
    match state.availability.list(&fee_earner_id, query.resolve()) {
        Ok(overview) => (StatusCode::OK, axum::Json(overview)).into_response(),
        Err(error) => availability_error_response(error),
    }
}

fn assignment_error_response(error: AssignmentError) -> Response {
    let status = match &error {
        AssignmentError::MatterNotFound(_) => StatusCode::NOT_FOUND,
        AssignmentError::Unauthorized => StatusCode::FORBIDDEN,
        // Distinct from not-found and unauthorized so the UI can offer the
        // manual-assignment fallback.
        AssignmentError::NoEligibleFeeEarner => StatusCode::CONFLICT,
        AssignmentError::Access(_) => StatusCode::UNAUTHORIZED,
        AssignmentError::Repository(error) => repository_status(error),
    };
    error_body(status, &error.to_string())
}

fn availability_error_response(error: AvailabilityError) -> Response {
    let status = match &error {
        AvailabilityError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AvailabilityError::BlockNotFound(_) => StatusCode::NOT_FOUND,
        AvailabilityError::Unauthorized => StatusCode::FORBIDDEN,
        AvailabilityError::Access(_) => StatusCode::UNAUTHORIZED,
        AvailabilityError::Repository(error) => repository_status(error),
    };
    error_body(status, &error.to_string())
}

fn settings_error_response(error: SettingsError) -> Response {
    let status = match &error {
        SettingsError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SettingsError::Unauthorized => StatusCode::FORBIDDEN,
        SettingsError::Access(_) => StatusCode::UNAUTHORIZED,
        SettingsError::Repository(error) => repository_status(error),
    };
    error_body(status, &error.to_string())
}

fn repository_status(error: &RepositoryError) -> StatusCode {
    match error {
        RepositoryError::Conflict => StatusCode::CONFLICT,
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}
