use branch_data_api::config::AppConfig;
use branch_data_api::infrastructure::{sheets, storage};
use branch_data_api::models::{BranchImages, BranchSubmission, Coordinate, SheetRow};
use branch_data_api::services::image_upload::ImageUploadService;
use branch_data_api::services::sheets::SheetsService;
use chrono::{SecondsFormat, Utc};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 1×1 white JPEG
const SAMPLE_JPEG: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAQEAYABgAAD/2wBDAAYEBQYFBAYGBQYHBwYIChAKCgkJChQODwwQFxQYGBcUFhYaHSUfGhsjHBYWICwgIyYnKSopGR8tMC0oMCUoKSj/2wBDAQcHBwoIChMKChMoGhYaKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCj/wAARCAABAAEDASIAAhEBAxEB/8QAFQABAQAAAAAAAAAAAAAAAAAAAAv/xAAUEAEAAAAAAAAAAAAAAAAAAAAA/8QAFQEBAQAAAAAAAAAAAAAAAAAAAAX/xAAUEQEAAAAAAAAAAAAAAAAAAAAA/9oADAMBAAIRAxEAPwCdABmX/9k=";

fn status(value: &Option<String>) -> &'static str {
    if value.is_some() { "✅ Set" } else { "❌ Missing" }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "check_integration=info,branch_data_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🧪 Testing S3 and Google Sheets integration...");

    // 1. Environment
    let config = AppConfig::from_env();
    info!("AWS_ACCESS_KEY_ID: {}", status(&config.storage.access_key_id));
    info!("AWS_SECRET_ACCESS_KEY: {}", status(&config.storage.secret_access_key));
    info!("AWS_S3_BUCKET_NAME: {}", status(&config.storage.bucket));
    info!("AWS_REGION: {}", config.storage.region);
    info!("GOOGLE_SHEETS_SERVICE_ACCOUNT: {}", status(&config.sheets.service_account));
    info!("GOOGLE_SHEETS_PRIVATE_KEY: {}", status(&config.sheets.private_key));
    info!("SPREADSHEET_ID: {}", status(&config.sheets.spreadsheet_id));

    // 2. Provider configuration
    let storage = match storage::setup_storage(&config.storage).await {
        Ok(storage) => storage,
        Err(e) => {
            error!("❌ S3 environment validation failed: {}", e);
            std::process::exit(1);
        }
    };
    info!("✅ S3 environment validation passed (bucket {})", storage.bucket());

    let sheets = match sheets::setup_sheets(&config.sheets) {
        Ok(sheets) => sheets,
        Err(e) => {
            error!("❌ Google Sheets environment validation failed: {}", e);
            std::process::exit(1);
        }
    };
    info!("✅ Google Sheets environment validation passed");

    // 3. Sample submission
    let submission = BranchSubmission {
        branch_id: format!("test-{}", Utc::now().timestamp_millis()),
        branch_name: "Test Branch".to_string(),
        latitude: Coordinate::Text("37.7749".to_string()),
        longitude: Coordinate::Text("-122.4194".to_string()),
        images: BranchImages {
            notice_board: Some(SAMPLE_JPEG.to_string()),
            ..Default::default()
        },
    };

    info!("📤 Testing S3 upload for {}...", submission.branch_id);
    let uploader = ImageUploadService::new(storage);
    let urls = uploader
        .upload_branch_images(
            &submission.branch_id,
            &submission.images,
            &submission.metadata(),
        )
        .await?;
    info!("S3 upload results: {:?}", urls);

    // 4. Sheet append
    let row = SheetRow::new(
        &submission,
        &urls,
        &Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    );
    info!("📊 Row data to write: {:?}", row.cells());
    let result = sheets.append_row(&row).await?;
    info!("Google Sheets result: {:?}", result);

    info!("✅ All checks completed successfully!");
    Ok(())
}
