// REST API with Axum
//
// JSON-over-HTTP surface for the profile registry, service catalog,
// address-change workflow, notification ledger and service suggestions.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::book::AddressBook;
use crate::error::AppError;
use crate::profiles::{ProfileDraft, ProfilePatch, ServiceLink, ServicePatch};
use crate::suggestions::{ProfileSummary, ServiceSuggester};

/// Shared application state
///
/// Document work happens under the book lock; the suggestion call never
/// holds it.
#[derive(Clone)]
pub struct AppState {
    book: Arc<Mutex<AddressBook>>,
    suggester: Arc<ServiceSuggester>,
}

impl AppState {
    pub fn new(book: AddressBook, suggester: ServiceSuggester) -> Self {
        Self {
            book: Arc::new(Mutex::new(book)),
            suggester: Arc::new(suggester),
        }
    }

    fn book(&self) -> Result<MutexGuard<'_, AddressBook>, AppError> {
        self.book
            .lock()
            .map_err(|_| AppError::Storage(anyhow::anyhow!("address book lock poisoned")))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            AppError::Storage(err) => {
                tracing::error!(error = %format!("{err:#}"), "storage failure");
                "Internal storage error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, AppError>;

// ============================================================================
// Extractors
// ============================================================================

/// JSON body whose rejections answer with the `{"error": ..}` shape.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections answer with the `{"error": ..}` shape.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::invalid(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::invalid(rejection.body_text())
    }
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AttachServiceRequest {
    pub service_key: Option<String>,
    pub service_details: Option<ServiceLink>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChangeAddressRequest {
    pub new_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NotificationQuery {
    pub profile_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SuggestRequest {
    pub profile: ProfileSummary,
    pub current_services: Vec<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

/// GET /api/profiles
async fn list_profiles(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let profiles = state.book()?.profiles.list()?;
    Ok(Json(profiles))
}

/// POST /api/profiles
async fn create_profile(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<ProfileDraft>,
) -> ApiResult<impl IntoResponse> {
    let profile = state.book()?.profiles.create(draft)?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /api/profiles/:id
async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let profile = state.book()?.profiles.get(&id)?;
    Ok(Json(profile))
}

/// PUT /api/profiles/:id
async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ProfilePatch>,
) -> ApiResult<impl IntoResponse> {
    let profile = state.book()?.profiles.update(&id, patch)?;
    Ok(Json(profile))
}

/// DELETE /api/profiles/:id
async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.book()?.profiles.delete(&id)?;
    Ok(Json(json!({ "message": "Profile deleted" })))
}

/// GET /api/services - Service catalog
async fn list_services(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let catalog = state.book()?.catalog.list()?;
    Ok(Json(catalog))
}

/// POST /api/profiles/:id/services
async fn attach_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AttachServiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let key = request.service_key.unwrap_or_default();
    let details = request.service_details.unwrap_or_default();

    let profile = state.book()?.profiles.attach_service(&id, &key, details)?;
    Ok(Json(profile))
}

/// PUT /api/profiles/:id/services/:key
async fn update_service(
    State(state): State<AppState>,
    Path((id, key)): Path<(String, String)>,
    ApiJson(patch): ApiJson<ServicePatch>,
) -> ApiResult<impl IntoResponse> {
    let profile = state.book()?.profiles.update_service(&id, &key, patch)?;
    Ok(Json(profile))
}

/// DELETE /api/profiles/:id/services/:key
async fn detach_service(
    State(state): State<AppState>,
    Path((id, key)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let profile = state.book()?.profiles.detach_service(&id, &key)?;
    Ok(Json(profile))
}

/// POST /api/profiles/:id/change-address
async fn change_address(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ChangeAddressRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_address = request.new_address.unwrap_or_default();
    let change = state.book()?.moves.change_address(&id, &new_address)?;
    Ok(Json(change))
}

/// GET /api/notifications?profile_id=...
async fn list_notifications(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NotificationQuery>,
) -> ApiResult<impl IntoResponse> {
    let profile_id = query.profile_id.as_deref().filter(|id| !id.is_empty());
    let notifications = state.book()?.notifications.list(profile_id)?;
    Ok(Json(notifications))
}

/// POST /api/ai/suggest-services
async fn suggest_services(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SuggestRequest>,
) -> ApiResult<impl IntoResponse> {
    let suggestions = state
        .suggester
        .suggest(&request.profile, &request.current_services)
        .await?;
    Ok(Json(json!({ "suggestions": suggestions })))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/profiles", get(list_profiles).post(create_profile))
        .route(
            "/profiles/:id",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .route("/profiles/:id/services", post(attach_service))
        .route(
            "/profiles/:id/services/:key",
            put(update_service).delete(detach_service),
        )
        .route("/profiles/:id/change-address", post(change_address))
        .route("/services", get(list_services))
        .route("/notifications", get(list_notifications))
        .route("/ai/suggest-services", post(suggest_services))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
