pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::image_upload::ImageUploadService;
use crate::services::sheets::SheetsService;
use crate::services::storage::StorageService;
use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::branches::create_branch,
        api::handlers::images::list_branch_images,
        api::handlers::images::get_image_metadata,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            models::CreateBranchRequest,
            models::CreateBranchResponse,
            models::BranchData,
            models::ImageUrls,
            models::AppendValuesResponse,
            models::UpdateValuesResponse,
            models::BranchImagesResponse,
            models::StoredImage,
            models::ImageMetadataResponse,
        )
    ),
    tags(
        (name = "system", description = "Service status"),
        (name = "branches", description = "Branch submissions"),
        (name = "images", description = "Stored branch images")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageService>,
    pub image_upload: Arc<ImageUploadService>,
    pub sheets: Arc<dyn SheetsService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn StorageService>,
        sheets: Arc<dyn SheetsService>,
        config: AppConfig,
    ) -> Self {
        Self {
            image_upload: Arc::new(ImageUploadService::new(storage.clone())),
            storage,
            sheets,
            config,
        }
    }
}

/// Unknown paths and known paths hit with an unsupported method both get the
/// 404 envelope.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/health",
            get(api::handlers::health::health_check).fallback(api::error::not_found),
        )
        .route(
            "/api/branches",
            post(api::handlers::branches::create_branch).fallback(api::error::not_found),
        )
        .route(
            "/api/branches/:branch_id/images",
            get(api::handlers::images::list_branch_images).fallback(api::error::not_found),
        )
        .route(
            "/api/images/metadata",
            get(api::handlers::images::get_image_metadata).fallback(api::error::not_found),
        )
        .fallback(api::error::not_found)
        .layer(axum::extract::DefaultBodyLimit::max(state.config.max_body_size))
        .layer(CatchPanicLayer::custom(api::error::handle_panic))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
