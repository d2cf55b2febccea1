#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use branch_data_api::config::AppConfig;
use branch_data_api::models::{AppendValuesResponse, SheetRow, UpdateValuesResponse};
use branch_data_api::services::sheets::{SheetError, SheetsService};
use branch_data_api::services::storage::{
    ObjectMetadata, ObjectSummary, PutObject, StorageService, virtual_hosted_url,
};
use branch_data_api::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const TEST_BUCKET: &str = "test-bucket";

/// Smallest valid JPEG we bother carrying around (SOI + EOI markers).
pub const TINY_JPEG_BASE64: &str = "/9j/2Q==";

pub struct MockStorageService {
    pub objects: Mutex<Vec<PutObject>>,
    fail_key_containing: Option<String>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(Vec::new()),
            fail_key_containing: None,
        }
    }

    /// Every put whose key contains `needle` fails like an S3 outage would.
    pub fn failing_on(needle: &str) -> Self {
        Self {
            objects: Mutex::new(Vec::new()),
            fail_key_containing: Some(needle.to_string()),
        }
    }

    pub fn stored(&self) -> Vec<PutObject> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn put_object(&self, object: PutObject) -> anyhow::Result<()> {
        if let Some(needle) = &self.fail_key_containing {
            if object.key.contains(needle.as_str()) {
                return Err(anyhow::anyhow!("simulated S3 outage for {}", object.key));
            }
        }
        self.objects.lock().unwrap().push(object);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        virtual_hosted_url(TEST_BUCKET, "us-east-1", key)
    }

    async fn list_objects(&self, prefix: &str) -> anyhow::Result<Vec<ObjectSummary>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.key.starts_with(prefix))
            .map(|o| ObjectSummary {
                key: o.key.clone(),
                size: Some(o.body.len() as i64),
                last_modified: None,
            })
            .collect())
    }

    async fn get_object_metadata(&self, key: &str) -> anyhow::Result<ObjectMetadata> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.key == key)
            .map(|o| ObjectMetadata {
                metadata: o.metadata.clone(),
                last_modified: None,
                content_length: Some(o.body.len() as i64),
                content_type: Some(o.content_type.clone()),
                etag: Some("\"mock-etag\"".to_string()),
            })
            .ok_or_else(|| anyhow::anyhow!("NotFound: {}", key))
    }
}

pub struct MockSheetsService {
    pub rows: Mutex<Vec<SheetRow>>,
    fail: bool,
}

impl MockSheetsService {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn appended(&self) -> Vec<SheetRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SheetsService for MockSheetsService {
    async fn append_row(&self, row: &SheetRow) -> Result<AppendValuesResponse, SheetError> {
        if self.fail {
            return Err(SheetError::Api {
                status: 403,
                message: "The caller does not have permission".to_string(),
            });
        }
        self.rows.lock().unwrap().push(row.clone());
        Ok(AppendValuesResponse {
            spreadsheet_id: Some("sheet-123".to_string()),
            table_range: Some("Sheet1!A1:H1".to_string()),
            updates: UpdateValuesResponse {
                spreadsheet_id: Some("sheet-123".to_string()),
                updated_range: Some("Sheet1!A2:H2".to_string()),
                updated_rows: Some(1),
                updated_columns: Some(8),
                updated_cells: Some(8),
            },
        })
    }
}

pub fn test_app(storage: Arc<MockStorageService>, sheets: Arc<MockSheetsService>) -> Router {
    create_app(AppState::new(storage, sheets, AppConfig::default()))
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}
