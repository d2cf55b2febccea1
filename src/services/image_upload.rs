use crate::models::{BranchImages, BranchMetadata, ImageRole, ImageUrls};
use crate::services::storage::{PutObject, StorageService};
use crate::utils::content_type::{file_extension, sniff_content_type, strip_data_url_prefix};
use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD};
use base64::engine::DecodePaddingMode;
use chrono::{SecondsFormat, Utc};
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Standard alphabet, accepting payloads with or without trailing `=`.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Error, Debug)]
#[error("Failed to upload {role} for branch {branch_id} to S3: {source}")]
pub struct UploadError {
    pub role: ImageRole,
    pub branch_id: String,
    #[source]
    pub source: anyhow::Error,
}

/// Decodes a base64 payload that may carry a data-URL header.
pub fn decode_image(base64: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let cleaned: String = strip_data_url_prefix(base64)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    LENIENT_BASE64.decode(cleaned)
}

/// `branches/<branchId>/<role>-<epochMillis>.<ext>`
pub fn object_key(branch_id: &str, role: ImageRole, epoch_millis: i64, extension: &str) -> String {
    format!("branches/{}/{}", branch_id, file_name(role, epoch_millis, extension))
}

fn file_name(role: ImageRole, epoch_millis: i64, extension: &str) -> String {
    format!("{}-{}.{}", role, epoch_millis, extension)
}

pub struct ImageUploadService {
    storage: Arc<dyn StorageService>,
}

impl ImageUploadService {
    pub fn new(storage: Arc<dyn StorageService>) -> Self {
        Self { storage }
    }

    /// Uploads one image and returns its public URL.
    ///
    /// An empty or whitespace-only payload is skipped and yields `Ok(None)`.
    pub async fn upload_base64_image(
        &self,
        base64: &str,
        branch_id: &str,
        role: ImageRole,
        branch: &BranchMetadata,
    ) -> Result<Option<String>, UploadError> {
        if base64.trim().is_empty() {
            return Ok(None);
        }

        let wrap = |source: anyhow::Error| {
            error!(
                "❌ Error uploading {} for branch {} to S3: {:#}",
                role, branch_id, source
            );
            UploadError {
                role,
                branch_id: branch_id.to_string(),
                source,
            }
        };

        let content_type = sniff_content_type(base64);
        let extension = file_extension(content_type);

        let now = Utc::now();
        let filename = file_name(role, now.timestamp_millis(), extension);
        let key = object_key(branch_id, role, now.timestamp_millis(), extension);

        let buffer = decode_image(base64)
            .map_err(|e| wrap(anyhow::Error::new(e).context("invalid base64 image data")))?;

        let metadata = HashMap::from([
            ("branch-id".to_string(), branch_id.to_string()),
            ("branch-name".to_string(), branch.branch_name.clone()),
            ("image-type".to_string(), role.as_str().to_string()),
            ("latitude".to_string(), branch.latitude.clone()),
            ("longitude".to_string(), branch.longitude.clone()),
            (
                "upload-timestamp".to_string(),
                now.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            ("original-filename".to_string(), filename.clone()),
            ("content-type".to_string(), content_type.to_string()),
            ("file-size".to_string(), buffer.len().to_string()),
        ]);
        debug!("Object metadata for {}: {:?}", key, metadata);

        self.storage
            .put_object(PutObject {
                key: key.clone(),
                body: buffer,
                content_type: content_type.to_string(),
                metadata,
                public_read: true,
            })
            .await
            .map_err(wrap)?;

        let public_url = self.storage.public_url(&key);
        info!(
            "✅ Uploaded {} for branch {} to S3: {}",
            role, branch_id, public_url
        );

        Ok(Some(public_url))
    }

    /// Uploads every present image of a branch concurrently.
    ///
    /// All-or-nothing: the first failure fails the whole batch and no URLs
    /// are returned.
    pub async fn upload_branch_images(
        &self,
        branch_id: &str,
        images: &BranchImages,
        branch: &BranchMetadata,
    ) -> Result<ImageUrls, UploadError> {
        let roles = images.present_roles();
        info!(
            "📤 Starting upload for branch {} ({} image(s): {:?})",
            branch_id,
            roles.len(),
            roles.iter().map(ImageRole::as_str).collect::<Vec<_>>()
        );

        let uploads = roles.into_iter().map(|role| async move {
            let payload = images.get(role).unwrap_or_default();
            let url = self
                .upload_base64_image(payload, branch_id, role, branch)
                .await?;
            Ok::<_, UploadError>((role, url))
        });

        let results = try_join_all(uploads).await?;

        let mut urls = ImageUrls::default();
        for (role, url) in results {
            if let Some(url) = url {
                debug!("{}: {}", role.url_field(), url);
                urls.set(role, url);
            }
        }

        info!("🏁 All uploads completed for branch {}", branch_id);
        Ok(urls)
    }
}
