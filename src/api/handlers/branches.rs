use crate::AppState;
use crate::api::error::AppError;
use crate::models::{BranchData, CreateBranchRequest, CreateBranchResponse, SheetRow};
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use chrono::{SecondsFormat, Utc};
use tracing::info;

fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[utoipa::path(
    post,
    path = "/api/branches",
    request_body = CreateBranchRequest,
    responses(
        (status = 200, description = "Images stored and row appended", body = CreateBranchResponse),
        (status = 400, description = "Missing required fields"),
        (status = 500, description = "Image upload or sheet append failed")
    ),
    tag = "branches"
)]
pub async fn create_branch(
    State(state): State<AppState>,
    payload: Result<Json<CreateBranchRequest>, JsonRejection>,
) -> Result<Json<CreateBranchResponse>, AppError> {
    let Json(payload) = payload?;
    let submission = payload
        .into_submission()
        .map_err(AppError::MissingFields)?;

    info!("🏢 Branch submission received: {}", submission.branch_id);

    let urls = state
        .image_upload
        .upload_branch_images(
            &submission.branch_id,
            &submission.images,
            &submission.metadata(),
        )
        .await?;

    let timestamp = iso_now();
    let row = SheetRow::new(&submission, &urls, &timestamp);
    let sheet_update = state.sheets.append_row(&row).await?;

    Ok(Json(CreateBranchResponse {
        success: true,
        message: "Branch data appended successfully".to_string(),
        data: BranchData {
            branch_id: submission.branch_id,
            branch_name: submission.branch_name,
            latitude: submission.latitude,
            longitude: submission.longitude,
            timestamp,
            images: urls,
        },
        sheet_update,
    }))
}
