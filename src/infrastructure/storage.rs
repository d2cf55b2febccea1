use crate::config::{ConfigError, StorageConfig};
use crate::services::storage::S3StorageService;
use aws_sdk_s3::config::{Credentials, Region};
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &StorageConfig) -> Result<Arc<S3StorageService>, ConfigError> {
    let credentials = config.credentials()?;
    let bucket = credentials.bucket;

    info!(
        "☁️  S3 Storage: region={} (Bucket: {})",
        config.region, bucket
    );

    let mut loader = aws_config::from_env()
        .region(Region::new(config.region.clone()))
        .credentials_provider(Credentials::new(
            credentials.access_key_id,
            credentials.secret_access_key,
            None,
            None,
            "static",
        ));

    if let Some(endpoint_url) = &config.endpoint_url {
        info!("🔌 Using custom S3 endpoint: {}", endpoint_url);
        loader = loader.endpoint_url(endpoint_url);
    }

    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.endpoint_url.is_some())
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

    Ok(Arc::new(
        S3StorageService::new(s3_client, bucket, config.region.clone())
            .with_endpoint(config.endpoint_url.clone()),
    ))
}
