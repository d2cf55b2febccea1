use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::{ByteStream, DateTime};
use aws_sdk_s3::types::ObjectCannedAcl;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use url::Url;

/// A single object write.
#[derive(Debug, Clone)]
pub struct PutObject {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub metadata: HashMap<String, String>,
    /// Grant anonymous read access (`public-read` canned ACL)
    pub public_read: bool,
}

#[derive(Debug, Clone)]
pub struct ObjectSummary {
    pub key: String,
    pub size: Option<i64>,
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectMetadata {
    pub metadata: HashMap<String, String>,
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
    pub content_length: Option<i64>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
}

#[async_trait]
pub trait StorageService: Send + Sync {
    async fn put_object(&self, object: PutObject) -> Result<()>;
    /// Publicly resolvable, unsigned URL for `key`.
    fn public_url(&self, key: &str) -> String;

    /// Inverse of `public_url`: the object key is the URL path.
    fn key_from_url(&self, public_url: &str) -> Option<String> {
        let url = Url::parse(public_url).ok()?;
        let key = percent_decode_str(url.path().trim_start_matches('/'))
            .decode_utf8()
            .ok()?
            .into_owned();
        (!key.is_empty()).then_some(key)
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>>;
    async fn get_object_metadata(&self, key: &str) -> Result<ObjectMetadata>;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String, region: String) -> Self {
        Self {
            client,
            bucket,
            region,
            endpoint_url: None,
        }
    }

    /// Public URLs use path style against a custom endpoint (MinIO and friends).
    pub fn with_endpoint(mut self, endpoint_url: Option<String>) -> Self {
        self.endpoint_url = endpoint_url;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn to_chrono(d: &DateTime) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(d.secs(), d.subsec_nanos()).unwrap_or_default()
}

/// Virtual-hosted-style URL of an object in an AWS region.
pub fn virtual_hosted_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key)
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn put_object(&self, object: PutObject) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&object.key)
            .body(ByteStream::from(object.body))
            .content_type(object.content_type)
            .set_metadata(Some(object.metadata));

        if object.public_read {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }

        if let Err(e) = request.send().await {
            tracing::error!(
                "S3 put_object failed: bucket={}, key={}, error={:?}",
                self.bucket,
                object.key,
                e
            );
            return Err(e.into());
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        match &self.endpoint_url {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => virtual_hosted_url(&self.bucket, &self.region, key),
        }
    }

    fn key_from_url(&self, public_url: &str) -> Option<String> {
        let url = Url::parse(public_url).ok()?;
        let path = percent_decode_str(url.path().trim_start_matches('/'))
            .decode_utf8()
            .ok()?
            .into_owned();

        // Path-style URLs lead with the bucket name
        let key = match &self.endpoint_url {
            Some(_) => path.strip_prefix(&format!("{}/", self.bucket))?.to_string(),
            None => path,
        };
        (!key.is_empty()).then_some(key)
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let res = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await?;

            if let Some(contents) = res.contents {
                for object in contents {
                    if let Some(key) = object.key {
                        objects.push(ObjectSummary {
                            key,
                            size: object.size,
                            last_modified: object.last_modified.as_ref().map(to_chrono),
                        });
                    }
                }
            }

            if res.is_truncated.unwrap_or(false) {
                continuation_token = res.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn get_object_metadata(&self, key: &str) -> Result<ObjectMetadata> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;

        Ok(ObjectMetadata {
            metadata: res.metadata.unwrap_or_default(),
            last_modified: res.last_modified.as_ref().map(to_chrono),
            content_length: res.content_length,
            content_type: res.content_type,
            etag: res.e_tag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_hosted_url() {
        assert_eq!(
            virtual_hosted_url("branch-images", "ap-south-1", "branches/b1/notice-board-1.jpg"),
            "https://branch-images.s3.ap-south-1.amazonaws.com/branches/b1/notice-board-1.jpg"
        );
    }

    struct UrlOnly;

    #[async_trait]
    impl StorageService for UrlOnly {
        async fn put_object(&self, _object: PutObject) -> Result<()> {
            Ok(())
        }
        fn public_url(&self, key: &str) -> String {
            virtual_hosted_url("bucket", "us-east-1", key)
        }
        async fn list_objects(&self, _prefix: &str) -> Result<Vec<ObjectSummary>> {
            Ok(vec![])
        }
        async fn get_object_metadata(&self, _key: &str) -> Result<ObjectMetadata> {
            Ok(ObjectMetadata::default())
        }
    }

    #[test]
    fn test_key_from_url_round_trips_public_url() {
        let storage = UrlOnly;
        let url = storage.public_url("branches/b1/waiting-area-42.png");
        assert_eq!(
            storage.key_from_url(&url).as_deref(),
            Some("branches/b1/waiting-area-42.png")
        );
        assert_eq!(storage.key_from_url("not a url"), None);
        assert_eq!(storage.key_from_url("https://bucket.s3.us-east-1.amazonaws.com/"), None);
    }

    #[test]
    fn test_to_chrono() {
        let d = DateTime::from_secs(1_700_000_000);
        assert_eq!(to_chrono(&d).timestamp(), 1_700_000_000);
    }
}
