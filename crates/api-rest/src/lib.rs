//! # API REST
//!
//! REST API implementation for WardOps.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, error-to-status mapping)
//!
//! Uses `api-shared` for request/response types. The domain store is synchronous; handlers
//! take a `tokio::sync::Mutex` around it so exactly one request mutates it at a time.

#![warn(rust_2018_idioms)]

use api_shared::{
    AdmitReq, ConsentFormDto, DashboardSummaryRes, ErrorRes, HealthRes, HealthService,
    ListConsentsRes, ListResourcesRes, ListTransitionsRes, OccupantDto, ResourceDto, ResourceQuery,
    ReviewReq, SignItemReq, SignItemRes, SubmitTransitionReq, TransitionDto, TransitionQuery,
};
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use wardops_core::{
    ConsentSummary, HospitalStore, NewTransition, Occupant, OccupancySummary, ResourceCategory,
    ResourceFilter, ResourceStateKind, TransitionState, TransitionSummary, WardError,
};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<HospitalStore>>,
}

impl AppState {
    pub fn new(store: HospitalStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        dashboard_summary,
        list_resources,
        get_resource,
        allocate_resource,
        admit_resource,
        release_resource,
        maintain_resource,
        return_resource,
        list_transitions,
        get_transition,
        submit_transition,
        approve_transition,
        reject_transition,
        execute_transition,
        complete_transition,
        list_consents,
        get_consent,
        sign_consent_item,
        complete_consent,
        expire_consent,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorRes,
        api_shared::BadgeDto,
        api_shared::OccupantDto,
        api_shared::ResourceDto,
        api_shared::ListResourcesRes,
        api_shared::CareSettingDto,
        api_shared::PriorityDto,
        api_shared::SubmitTransitionReq,
        api_shared::ReviewReq,
        api_shared::TransitionDto,
        api_shared::ListTransitionsRes,
        api_shared::ConsentItemDto,
        api_shared::ConsentProgressDto,
        api_shared::ConsentFormDto,
        api_shared::ListConsentsRes,
        api_shared::SignItemReq,
        api_shared::SignItemRes,
        api_shared::WardOccupancyDto,
        api_shared::CategoryCountDto,
        api_shared::OccupancyDto,
        api_shared::TransitionSummaryDto,
        api_shared::ConsentSummaryDto,
        api_shared::DashboardSummaryRes,
    ))
)]
pub struct ApiDoc;

/// Error returned by every fallible handler.
///
/// Not found maps to 404, an action from the wrong state to 409, bad input and incomplete
/// consents to 422. Anything else is logged and reported as 500.
#[derive(Debug)]
pub struct ApiError(WardError);

impl From<WardError> for ApiError {
    fn from(err: WardError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WardError::NotFound { .. } => StatusCode::NOT_FOUND,
            WardError::InvalidTransition { .. } => StatusCode::CONFLICT,
            WardError::Validation(_) | WardError::IncompleteConsents { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {:?}", self.0);
            "Internal error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(ErrorRes { error: message })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Build the REST router over `store`, including Swagger UI and permissive CORS.
pub fn router(store: HospitalStore) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/dashboard/summary", get(dashboard_summary))
        .route("/resources", get(list_resources))
        .route("/resources/:id", get(get_resource))
        .route("/resources/:id/allocate", post(allocate_resource))
        .route("/resources/:id/admit", post(admit_resource))
        .route("/resources/:id/release", post(release_resource))
        .route("/resources/:id/maintenance", post(maintain_resource))
        .route("/resources/:id/return", post(return_resource))
        .route(
            "/transitions",
            get(list_transitions).post(submit_transition),
        )
        .route("/transitions/:id", get(get_transition))
        .route("/transitions/:id/approve", post(approve_transition))
        .route("/transitions/:id/reject", post(reject_transition))
        .route("/transitions/:id/execute", post(execute_transition))
        .route("/transitions/:id/complete", post(complete_transition))
        .route("/consents", get(list_consents))
        .route("/consents/:id", get(get_consent))
        .route(
            "/consents/:id/items/:item_id/sign",
            post(sign_consent_item),
        )
        .route("/consents/:id/complete", post(complete_consent))
        .route("/consents/:id/expire", post(expire_consent))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(store))
}

/// Bind `addr` and serve the REST API until the server stops.
///
/// # Errors
/// Returns an error if the address cannot be bound or the HTTP server fails while running.
pub async fn serve(addr: &str, store: HospitalStore) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("-- WardOps REST API listening on {}", addr);
    axum::serve(listener, router(store)).await?;
    Ok(())
}

// ============================================================================
// Health and dashboard
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/dashboard/summary",
    responses(
        (status = 200, description = "Summary cards for the operations dashboard", body = DashboardSummaryRes)
    )
)]
/// Occupancy, transition and consent summaries computed from the current store.
#[axum::debug_handler]
async fn dashboard_summary(State(state): State<AppState>) -> Json<DashboardSummaryRes> {
    let store = state.store.lock().await;
    Json(DashboardSummaryRes {
        facility: store.facility_name().to_owned(),
        occupancy: (&OccupancySummary::compute(store.resources())).into(),
        transitions: (&TransitionSummary::compute(store.transitions())).into(),
        consents: (&ConsentSummary::compute(store.consents())).into(),
    })
}

// ============================================================================
// Resources
// ============================================================================

#[utoipa::path(
    get,
    path = "/resources",
    params(ResourceQuery),
    responses(
        (status = 200, description = "Beds matching the filter", body = ListResourcesRes),
        (status = 422, description = "Unknown category or state", body = ErrorRes)
    )
)]
/// List beds, optionally filtered by ward, category and state.
#[axum::debug_handler]
async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
) -> ApiResult<ListResourcesRes> {
    let filter = ResourceFilter {
        ward: query.ward.filter(|w| !w.trim().is_empty()),
        category: query
            .category
            .as_deref()
            .map(str::parse::<ResourceCategory>)
            .transpose()?,
        state: query
            .state
            .as_deref()
            .map(str::parse::<ResourceStateKind>)
            .transpose()?,
    };

    let store = state.store.lock().await;
    let resources = store
        .resources()
        .list(&filter)
        .map(ResourceDto::from)
        .collect();
    Ok(Json(ListResourcesRes { resources }))
}

#[utoipa::path(
    get,
    path = "/resources/{id}",
    responses(
        (status = 200, description = "Bed", body = ResourceDto),
        (status = 404, description = "Unknown bed", body = ErrorRes)
    )
)]
async fn get_resource(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<ResourceDto> {
    let store = state.store.lock().await;
    Ok(Json(store.resources().get(&id)?.into()))
}

#[utoipa::path(
    post,
    path = "/resources/{id}/allocate",
    responses(
        (status = 200, description = "Bed reserved", body = ResourceDto),
        (status = 404, description = "Unknown bed", body = ErrorRes),
        (status = 409, description = "Bed is not available", body = ErrorRes)
    )
)]
/// Reserve an available bed. The bed has no occupant until a patient is admitted.
#[axum::debug_handler]
async fn allocate_resource(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<ResourceDto> {
    let mut store = state.store.lock().await;
    Ok(Json(store.resources_mut().allocate(&id)?.into()))
}

#[utoipa::path(
    post,
    path = "/resources/{id}/admit",
    request_body = OccupantDto,
    responses(
        (status = 200, description = "Patient admitted", body = ResourceDto),
        (status = 404, description = "Unknown bed", body = ErrorRes),
        (status = 409, description = "Bed is occupied or under maintenance", body = ErrorRes),
        (status = 422, description = "Missing patient details, or the patient already has a bed", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn admit_resource(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<AdmitReq>,
) -> ApiResult<ResourceDto> {
    let occupant = Occupant {
        patient_id: req.patient_id,
        patient_name: req.patient_name,
    };
    let mut store = state.store.lock().await;
    Ok(Json(store.resources_mut().admit(&id, occupant)?.into()))
}

#[utoipa::path(
    post,
    path = "/resources/{id}/release",
    responses(
        (status = 200, description = "Bed released", body = ResourceDto),
        (status = 404, description = "Unknown bed", body = ErrorRes),
        (status = 409, description = "Bed is neither occupied nor reserved", body = ErrorRes)
    )
)]
async fn release_resource(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<ResourceDto> {
    let mut store = state.store.lock().await;
    Ok(Json(store.resources_mut().release(&id)?.into()))
}

#[utoipa::path(
    post,
    path = "/resources/{id}/maintenance",
    responses(
        (status = 200, description = "Bed taken out of service", body = ResourceDto),
        (status = 404, description = "Unknown bed", body = ErrorRes)
    )
)]
async fn maintain_resource(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<ResourceDto> {
    let mut store = state.store.lock().await;
    Ok(Json(store.resources_mut().mark_maintenance(&id)?.into()))
}

#[utoipa::path(
    post,
    path = "/resources/{id}/return",
    responses(
        (status = 200, description = "Bed back in service", body = ResourceDto),
        (status = 404, description = "Unknown bed", body = ErrorRes),
        (status = 409, description = "Bed is not under maintenance", body = ErrorRes)
    )
)]
async fn return_resource(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<ResourceDto> {
    let mut store = state.store.lock().await;
    Ok(Json(store.resources_mut().return_to_service(&id)?.into()))
}

// ============================================================================
// Transitions
// ============================================================================

#[utoipa::path(
    get,
    path = "/transitions",
    params(TransitionQuery),
    responses(
        (status = 200, description = "Transition requests", body = ListTransitionsRes),
        (status = 422, description = "Unknown state", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn list_transitions(
    State(state): State<AppState>,
    Query(query): Query<TransitionQuery>,
) -> ApiResult<ListTransitionsRes> {
    let filter = query
        .state
        .as_deref()
        .map(str::parse::<TransitionState>)
        .transpose()?;
    let store = state.store.lock().await;
    let transitions = store
        .transitions()
        .list(filter)
        .map(TransitionDto::from)
        .collect();
    Ok(Json(ListTransitionsRes { transitions }))
}

#[utoipa::path(
    get,
    path = "/transitions/{id}",
    responses(
        (status = 200, description = "Transition request", body = TransitionDto),
        (status = 404, description = "Unknown request", body = ErrorRes)
    )
)]
async fn get_transition(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<TransitionDto> {
    let store = state.store.lock().await;
    Ok(Json(store.transitions().get(&id)?.into()))
}

#[utoipa::path(
    post,
    path = "/transitions",
    request_body = SubmitTransitionReq,
    responses(
        (status = 200, description = "Request submitted as pending", body = TransitionDto),
        (status = 422, description = "Invalid request", body = ErrorRes)
    )
)]
/// Submit a new care-setting transition request.
#[axum::debug_handler]
async fn submit_transition(
    State(state): State<AppState>,
    Json(req): Json<SubmitTransitionReq>,
) -> ApiResult<TransitionDto> {
    let new = NewTransition {
        patient_id: req.patient_id,
        patient_name: req.patient_name,
        current: req.current.into(),
        requested: req.requested.into(),
        priority: req.priority.into(),
        reason: req.reason,
    };
    let mut store = state.store.lock().await;
    Ok(Json(store.transitions_mut().submit(new)?.into()))
}

#[utoipa::path(
    post,
    path = "/transitions/{id}/approve",
    request_body = ReviewReq,
    responses(
        (status = 200, description = "Request approved", body = TransitionDto),
        (status = 404, description = "Unknown request", body = ErrorRes),
        (status = 409, description = "Request is not pending", body = ErrorRes)
    )
)]
async fn approve_transition(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<ReviewReq>,
) -> ApiResult<TransitionDto> {
    let mut store = state.store.lock().await;
    Ok(Json(
        store.transitions_mut().approve(&id, &req.reviewer)?.into(),
    ))
}

#[utoipa::path(
    post,
    path = "/transitions/{id}/reject",
    request_body = ReviewReq,
    responses(
        (status = 200, description = "Request rejected", body = TransitionDto),
        (status = 404, description = "Unknown request", body = ErrorRes),
        (status = 409, description = "Request is not pending", body = ErrorRes)
    )
)]
async fn reject_transition(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<ReviewReq>,
) -> ApiResult<TransitionDto> {
    let mut store = state.store.lock().await;
    Ok(Json(
        store.transitions_mut().reject(&id, &req.reviewer)?.into(),
    ))
}

#[utoipa::path(
    post,
    path = "/transitions/{id}/execute",
    responses(
        (status = 200, description = "Transition in progress", body = TransitionDto),
        (status = 404, description = "Unknown request", body = ErrorRes),
        (status = 409, description = "Request is not approved", body = ErrorRes)
    )
)]
async fn execute_transition(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<TransitionDto> {
    let mut store = state.store.lock().await;
    Ok(Json(store.transitions_mut().execute(&id)?.into()))
}

#[utoipa::path(
    post,
    path = "/transitions/{id}/complete",
    responses(
        (status = 200, description = "Transition completed", body = TransitionDto),
        (status = 404, description = "Unknown request", body = ErrorRes),
        (status = 409, description = "Request is not in progress", body = ErrorRes)
    )
)]
async fn complete_transition(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<TransitionDto> {
    let mut store = state.store.lock().await;
    Ok(Json(store.transitions_mut().complete(&id)?.into()))
}

// ============================================================================
// Consent
// ============================================================================

#[utoipa::path(
    get,
    path = "/consents",
    responses(
        (status = 200, description = "Consent forms with signing progress", body = ListConsentsRes)
    )
)]
async fn list_consents(State(state): State<AppState>) -> Json<ListConsentsRes> {
    let store = state.store.lock().await;
    let consents = store.consents().list().map(ConsentFormDto::from).collect();
    Json(ListConsentsRes { consents })
}

#[utoipa::path(
    get,
    path = "/consents/{id}",
    responses(
        (status = 200, description = "Consent form", body = ConsentFormDto),
        (status = 404, description = "Unknown form", body = ErrorRes)
    )
)]
async fn get_consent(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<ConsentFormDto> {
    let store = state.store.lock().await;
    Ok(Json(store.consents().get(&id)?.into()))
}

#[utoipa::path(
    post,
    path = "/consents/{id}/items/{item_id}/sign",
    request_body = SignItemReq,
    responses(
        (status = 200, description = "Item signed, or already signed", body = SignItemRes),
        (status = 404, description = "Unknown form or item", body = ErrorRes),
        (status = 409, description = "Form is completed or expired", body = ErrorRes),
        (status = 422, description = "Blank signer", body = ErrorRes)
    )
)]
/// Sign one consent item. Re-signing reports `already_signed` and keeps the first signature.
#[axum::debug_handler]
async fn sign_consent_item(
    State(state): State<AppState>,
    AxumPath((id, item_id)): AxumPath<(String, String)>,
    Json(req): Json<SignItemReq>,
) -> ApiResult<SignItemRes> {
    let mut store = state.store.lock().await;
    let consents = store.consents_mut();
    let outcome = consents.sign_item(&id, &item_id, &req.signer)?;
    Ok(Json(SignItemRes::new(outcome, consents.get(&id)?)))
}

#[utoipa::path(
    post,
    path = "/consents/{id}/complete",
    responses(
        (status = 200, description = "Form completed", body = ConsentFormDto),
        (status = 404, description = "Unknown form", body = ErrorRes),
        (status = 409, description = "Form is already completed or expired", body = ErrorRes),
        (status = 422, description = "Required items are unsigned", body = ErrorRes)
    )
)]
async fn complete_consent(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<ConsentFormDto> {
    let mut store = state.store.lock().await;
    Ok(Json(store.consents_mut().complete_form(&id)?.into()))
}

#[utoipa::path(
    post,
    path = "/consents/{id}/expire",
    responses(
        (status = 200, description = "Form expired", body = ConsentFormDto),
        (status = 404, description = "Unknown form", body = ErrorRes),
        (status = 409, description = "Form is already completed or expired", body = ErrorRes)
    )
)]
async fn expire_consent(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<ConsentFormDto> {
    let mut store = state.store.lock().await;
    Ok(Json(store.consents_mut().expire(&id)?.into()))
}
