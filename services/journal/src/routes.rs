//! HTTP routes of the journal service

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult, JsonBody, QueryParams},
    media::{Removal, Upload},
    middleware::{AuthUser, auth_middleware},
    models::{CreateAccountRequest, EntryRequest, FavouriteRequest, LoginRequest},
    services::ServiceError,
};

/// Create the router for the journal service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/get-user", get(get_user))
        .route("/add-journal-entry", post(add_entry))
        .route("/get-all-entries", get(get_all_entries))
        .route("/edit-entry/:id", put(edit_entry))
        .route("/delete-entry/:id", delete(delete_entry))
        .route("/update-is-favourite/:id", put(update_is_favourite))
        .route("/search", get(search_entries))
        .route("/journal-entries/filter", get(filter_entries))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/create-account", post(create_account))
        .route("/login", post(login))
        .route(
            "/image-upload",
            post(upload_image).layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .route("/delete-image", delete(delete_image))
        .nest_service("/uploads", ServeDir::new(state.media.upload_dir()))
        .nest_service("/assets", ServeDir::new(&state.config.assets_dir))
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Parse an entry ID path segment; a malformed ID cannot name an entry
fn entry_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| ServiceError::NotFound("Journal entry not found".to_string()).into())
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "journal-service"
    }))
}

/// Create account endpoint
pub async fn create_account(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateAccountRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = state
        .auth
        .register(&payload.full_name, &payload.email, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "error": false,
            "user": session.user,
            "accessToken": session.access_token,
            "message": "Registration Successful",
        })),
    ))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = state.auth.login(&payload.email, &payload.password).await?;

    Ok(Json(json!({
        "error": false,
        "message": "Login Successful",
        "user": session.user,
        "accessToken": session.access_token,
    })))
}

/// Profile of the authenticated user
pub async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let profile = state.auth.get_profile(user.id).await?;

    Ok(Json(json!({
        "user": profile,
        "message": "",
    })))
}

/// Image upload endpoint (multipart field `image`)
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let mut multipart = multipart?;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        // An empty file input still sends a part; treat it as no file
        if bytes.is_empty() && file_name.as_deref().unwrap_or_default().is_empty() {
            continue;
        }

        upload = Some(Upload {
            bytes,
            content_type,
            file_name,
        });
    }

    let image_url = state
        .media
        .store_upload(upload)
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(json!({ "imageUrl": image_url })))
}

/// Query of the image deletion endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImageQuery {
    pub image_url: Option<String>,
}

/// Delete an uploaded image by URL
pub async fn delete_image(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<DeleteImageQuery>,
) -> ApiResult<impl IntoResponse> {
    let image_url = query
        .image_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("imageUrl parameter is required".to_string()))?;

    let outcome = state
        .media
        .remove_by_url(&image_url)
        .await
        .map_err(ServiceError::from)?;

    let body = match outcome {
        Removal::Removed => json!({ "message": "Image deleted successfully" }),
        Removal::NotFound | Removal::Skipped => {
            json!({ "error": true, "message": "Image not found" })
        }
    };

    Ok(Json(body))
}

/// Add a journal entry
pub async fn add_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(payload): JsonBody<EntryRequest>,
) -> ApiResult<impl IntoResponse> {
    let entry = state.entries.create(user.id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "entry": entry,
            "message": "Added Successfully",
        })),
    ))
}

/// All entries of the authenticated user, favourites first
pub async fn get_all_entries(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let entries = state.entries.list(user.id).await?;

    Ok(Json(json!({ "entries": entries })))
}

/// Edit a journal entry
pub async fn edit_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<EntryRequest>,
) -> ApiResult<impl IntoResponse> {
    let entry = state.entries.update(user.id, entry_id(&id)?, payload).await?;

    Ok(Json(json!({
        "entry": entry,
        "message": "Update Successful",
    })))
}

/// Delete a journal entry
pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.entries.delete(user.id, entry_id(&id)?).await?;

    Ok(Json(json!({
        "message": "Journal entry deleted successfully",
    })))
}

/// Mark or unmark an entry as favourite
pub async fn update_is_favourite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<FavouriteRequest>,
) -> ApiResult<impl IntoResponse> {
    let entry = state
        .entries
        .set_favourite(user.id, entry_id(&id)?, payload.is_favourite)
        .await?;

    Ok(Json(json!({
        "entry": entry,
        "message": "Update Successful",
    })))
}

/// Query of the search endpoint
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// Search the authenticated user's entries
pub async fn search_entries(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    QueryParams(params): QueryParams<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let query = params.query.unwrap_or_default();
    let stories = state.entries.search(user.id, &query).await?;

    info!("Search by user {} matched {} entries", user.id, stories.len());
    Ok(Json(json!({ "stories": stories })))
}

/// Query of the date filter endpoint, bounds in epoch milliseconds
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn parse_millis(value: Option<&str>, name: &str) -> ApiResult<i64> {
    value
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| {
            ApiError::BadRequest(format!("{} must be a timestamp in milliseconds", name))
        })
}

/// Entries whose journal date lies in the given range
pub async fn filter_entries(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    QueryParams(range): QueryParams<DateRangeQuery>,
) -> ApiResult<impl IntoResponse> {
    let start = parse_millis(range.start_date.as_deref(), "startDate")?;
    let end = parse_millis(range.end_date.as_deref(), "endDate")?;

    let entries = state
        .entries
        .filter_by_date_range(user.id, start, end)
        .await?;

    Ok(Json(json!({ "entries": entries })))
}
