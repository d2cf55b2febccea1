use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use utoipa::{IntoParams, ToSchema};

/// Fields that must be present (and truthy) on every branch submission.
pub const REQUIRED_FIELDS: [&str; 4] = ["branchId", "branchName", "latitude", "longitude"];

/// A latitude or longitude as submitted by the client.
///
/// Clients send either a JSON number or a numeric string; both are echoed
/// back untouched and rendered into the sheet the way they arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(serde_json::Number),
    Text(String),
}

impl Coordinate {
    /// Zero and the empty string count as absent.
    pub fn is_truthy(&self) -> bool {
        match self {
            Coordinate::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Coordinate::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coordinate::Number(n) => {
                if let Some(i) = n.as_i64() {
                    write!(f, "{}", i)
                } else if let Some(u) = n.as_u64() {
                    write!(f, "{}", u)
                } else {
                    // f64 Display drops a zero fraction: 77.0 -> "77"
                    write!(f, "{}", n.as_f64().unwrap_or_default())
                }
            }
            Coordinate::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageRole {
    NoticeBoard,
    WaitingArea,
    BranchBoard,
}

impl ImageRole {
    pub const ALL: [ImageRole; 3] = [
        ImageRole::NoticeBoard,
        ImageRole::WaitingArea,
        ImageRole::BranchBoard,
    ];

    /// Tag used in storage keys and object metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageRole::NoticeBoard => "notice-board",
            ImageRole::WaitingArea => "waiting-area",
            ImageRole::BranchBoard => "branch-board",
        }
    }

    pub fn url_field(&self) -> &'static str {
        match self {
            ImageRole::NoticeBoard => "noticeBoardUrl",
            ImageRole::WaitingArea => "waitingAreaUrl",
            ImageRole::BranchBoard => "branchBoardUrl",
        }
    }
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchRequest {
    pub branch_id: Option<String>,
    pub branch_name: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub latitude: Option<Coordinate>,
    #[schema(value_type = Option<f64>)]
    pub longitude: Option<Coordinate>,
    /// Base64 image, optionally prefixed with a `data:image/...;base64,` header
    pub notice_board_base64: Option<String>,
    pub waiting_area_base64: Option<String>,
    pub branch_board_base64: Option<String>,
}

/// The base64 payloads of a submission, one slot per role.
#[derive(Debug, Clone, Default)]
pub struct BranchImages {
    pub notice_board: Option<String>,
    pub waiting_area: Option<String>,
    pub branch_board: Option<String>,
}

impl BranchImages {
    pub fn get(&self, role: ImageRole) -> Option<&str> {
        match role {
            ImageRole::NoticeBoard => self.notice_board.as_deref(),
            ImageRole::WaitingArea => self.waiting_area.as_deref(),
            ImageRole::BranchBoard => self.branch_board.as_deref(),
        }
    }

    /// Roles carrying a non-empty payload.
    pub fn present_roles(&self) -> Vec<ImageRole> {
        ImageRole::ALL
            .into_iter()
            .filter(|role| self.get(*role).is_some_and(|s| !s.is_empty()))
            .collect()
    }
}

/// Descriptive fields copied into object metadata.
#[derive(Debug, Clone, Default)]
pub struct BranchMetadata {
    pub branch_name: String,
    pub latitude: String,
    pub longitude: String,
}

/// A submission that passed required-field validation.
#[derive(Debug, Clone)]
pub struct BranchSubmission {
    pub branch_id: String,
    pub branch_name: String,
    pub latitude: Coordinate,
    pub longitude: Coordinate,
    pub images: BranchImages,
}

impl BranchSubmission {
    pub fn metadata(&self) -> BranchMetadata {
        BranchMetadata {
            branch_name: self.branch_name.clone(),
            latitude: self.latitude.to_string(),
            longitude: self.longitude.to_string(),
        }
    }
}

impl CreateBranchRequest {
    /// Names of required fields that are absent or falsy.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let present = [
            self.branch_id.as_deref().is_some_and(|s| !s.is_empty()),
            self.branch_name.as_deref().is_some_and(|s| !s.is_empty()),
            self.latitude.as_ref().is_some_and(Coordinate::is_truthy),
            self.longitude.as_ref().is_some_and(Coordinate::is_truthy),
        ];

        REQUIRED_FIELDS
            .into_iter()
            .zip(present)
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name)
            .collect()
    }

    /// Returns the missing field names when validation fails.
    pub fn into_submission(self) -> Result<BranchSubmission, Vec<&'static str>> {
        let missing = self.missing_fields();
        match (self.branch_id, self.branch_name, self.latitude, self.longitude) {
            (Some(branch_id), Some(branch_name), Some(latitude), Some(longitude))
                if missing.is_empty() =>
            {
                Ok(BranchSubmission {
                    branch_id,
                    branch_name,
                    latitude,
                    longitude,
                    images: BranchImages {
                        notice_board: self.notice_board_base64,
                        waiting_area: self.waiting_area_base64,
                        branch_board: self.branch_board_base64,
                    },
                })
            }
            _ => Err(missing),
        }
    }
}

/// Public URLs of the uploaded images, keyed by role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice_board_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting_area_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_board_url: Option<String>,
}

impl ImageUrls {
    pub fn get(&self, role: ImageRole) -> Option<&str> {
        match role {
            ImageRole::NoticeBoard => self.notice_board_url.as_deref(),
            ImageRole::WaitingArea => self.waiting_area_url.as_deref(),
            ImageRole::BranchBoard => self.branch_board_url.as_deref(),
        }
    }

    pub fn set(&mut self, role: ImageRole, url: String) {
        let slot = match role {
            ImageRole::NoticeBoard => &mut self.notice_board_url,
            ImageRole::WaitingArea => &mut self.waiting_area_url,
            ImageRole::BranchBoard => &mut self.branch_board_url,
        };
        *slot = Some(url);
    }

    pub fn is_empty(&self) -> bool {
        ImageRole::ALL.iter().all(|role| self.get(*role).is_none())
    }
}

/// One spreadsheet line, columns A through H:
/// branch id, name, latitude, longitude, three image URLs, timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetRow([String; 8]);

impl SheetRow {
    pub fn new(submission: &BranchSubmission, urls: &ImageUrls, timestamp: &str) -> Self {
        let url = |role| urls.get(role).unwrap_or_default().to_string();
        Self([
            submission.branch_id.clone(),
            submission.branch_name.clone(),
            submission.latitude.to_string(),
            submission.longitude.to_string(),
            url(ImageRole::NoticeBoard),
            url(ImageRole::WaitingArea),
            url(ImageRole::BranchBoard),
            timestamp.to_string(),
        ])
    }

    pub fn cells(&self) -> &[String; 8] {
        &self.0
    }
}

/// `updates` block of a Sheets `values.append` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_rows: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_columns: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_cells: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppendValuesResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_range: Option<String>,
    #[serde(default)]
    pub updates: UpdateValuesResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BranchData {
    pub branch_id: String,
    pub branch_name: String,
    #[schema(value_type = f64)]
    pub latitude: Coordinate,
    #[schema(value_type = f64)]
    pub longitude: Coordinate,
    pub timestamp: String,
    pub images: ImageUrls,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchResponse {
    pub success: bool,
    pub message: String,
    pub data: BranchData,
    pub sheet_update: AppendValuesResponse,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub key: String,
    pub url: String,
    pub size: Option<i64>,
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BranchImagesResponse {
    pub success: bool,
    pub branch_id: String,
    pub images: Vec<StoredImage>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImageMetadataQuery {
    /// Public URL previously returned by `POST /api/branches`
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadataResponse {
    pub success: bool,
    pub metadata: HashMap<String, String>,
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
    pub content_length: Option<i64>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> CreateBranchRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_coordinate_rendering() {
        let c: Coordinate = serde_json::from_value(json!(12.5)).unwrap();
        assert_eq!(c.to_string(), "12.5");
        let c: Coordinate = serde_json::from_value(json!(-122)).unwrap();
        assert_eq!(c.to_string(), "-122");
        let c: Coordinate = serde_json::from_value(json!(77.0)).unwrap();
        assert_eq!(c.to_string(), "77");
        let c: Coordinate = serde_json::from_value(json!("37.7749")).unwrap();
        assert_eq!(c.to_string(), "37.7749");
    }

    #[test]
    fn test_zero_coordinate_is_missing() {
        let req = request(json!({
            "branchId": "b1",
            "branchName": "Main",
            "latitude": 0,
            "longitude": 0.0
        }));
        assert_eq!(req.missing_fields(), vec!["latitude", "longitude"]);
    }

    #[test]
    fn test_empty_strings_are_missing() {
        let req = request(json!({
            "branchId": "",
            "branchName": "Main",
            "latitude": "",
            "longitude": "0"
        }));
        // "0" is a non-empty string and therefore present
        assert_eq!(req.missing_fields(), vec!["branchId", "latitude"]);
    }

    #[test]
    fn test_into_submission() {
        let req = request(json!({
            "branchId": "b1",
            "branchName": "Main",
            "latitude": 12.5,
            "longitude": 77.5,
            "waitingAreaBase64": "abcd",
            "branchBoardBase64": ""
        }));
        let submission = req.into_submission().unwrap();
        assert_eq!(submission.branch_id, "b1");
        assert_eq!(submission.images.present_roles(), vec![ImageRole::WaitingArea]);
        assert_eq!(submission.metadata().latitude, "12.5");
    }

    #[test]
    fn test_sheet_row_uses_empty_cells_for_absent_urls() {
        let submission = request(json!({
            "branchId": "b1",
            "branchName": "Main",
            "latitude": 12.5,
            "longitude": 77.5
        }))
        .into_submission()
        .unwrap();
        let mut urls = ImageUrls::default();
        urls.set(ImageRole::WaitingArea, "https://x/y.jpg".to_string());

        let row = SheetRow::new(&submission, &urls, "2024-01-01T00:00:00.000Z");
        assert_eq!(
            row.cells(),
            &[
                "b1",
                "Main",
                "12.5",
                "77.5",
                "",
                "https://x/y.jpg",
                "",
                "2024-01-01T00:00:00.000Z"
            ]
            .map(String::from)
        );
    }

    #[test]
    fn test_image_urls_serialization_omits_absent_roles() {
        let mut urls = ImageUrls::default();
        assert!(urls.is_empty());
        urls.set(ImageRole::BranchBoard, "u".to_string());
        assert_eq!(serde_json::to_value(&urls).unwrap(), json!({"branchBoardUrl": "u"}));
    }
}
