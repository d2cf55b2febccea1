use crate::AppState;
use crate::api::error::AppError;
use crate::models::{BranchImagesResponse, ImageMetadataQuery, ImageMetadataResponse, StoredImage};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};

#[utoipa::path(
    get,
    path = "/api/branches/{branch_id}/images",
    params(
        ("branch_id" = String, Path, description = "Branch identifier")
    ),
    responses(
        (status = 200, description = "Images stored for the branch", body = BranchImagesResponse),
        (status = 500, description = "Storage listing failed")
    ),
    tag = "branches"
)]
pub async fn list_branch_images(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
) -> Result<Json<BranchImagesResponse>, AppError> {
    let prefix = format!("branches/{}/", branch_id);
    let objects = state
        .storage
        .list_objects(&prefix)
        .await
        .map_err(|e| AppError::Storage("Failed to list branch images", e))?;

    let images = objects
        .into_iter()
        .map(|object| StoredImage {
            url: state.storage.public_url(&object.key),
            key: object.key,
            size: object.size,
            last_modified: object.last_modified,
        })
        .collect();

    Ok(Json(BranchImagesResponse {
        success: true,
        branch_id,
        images,
    }))
}

#[utoipa::path(
    get,
    path = "/api/images/metadata",
    params(ImageMetadataQuery),
    responses(
        (status = 200, description = "Stored object metadata", body = ImageMetadataResponse),
        (status = 400, description = "Missing `url` or URL does not point at a stored object"),
        (status = 500, description = "Storage lookup failed")
    ),
    tag = "images"
)]
pub async fn get_image_metadata(
    State(state): State<AppState>,
    query: Result<Query<ImageMetadataQuery>, QueryRejection>,
) -> Result<Json<ImageMetadataResponse>, AppError> {
    let Query(query) = query?;
    let key = state
        .storage
        .key_from_url(&query.url)
        .ok_or_else(|| AppError::BadRequest("Invalid image URL".to_string()))?;

    let head = state
        .storage
        .get_object_metadata(&key)
        .await
        .map_err(|e| AppError::Storage("Failed to get image metadata", e))?;

    Ok(Json(ImageMetadataResponse {
        success: true,
        metadata: head.metadata,
        last_modified: head.last_modified,
        content_length: head.content_length,
        content_type: head.content_type,
        etag: head.etag,
    }))
}
