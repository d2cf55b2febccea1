use crate::config::{ConfigError, SheetsConfig};
use crate::models::{AppendValuesResponse, SheetRow};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info};

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create Google Auth: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("Failed to obtain Google access token: {0}")]
    Auth(String),

    #[error("Failed to append to sheet: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to append to sheet: Google API returned {status}: {message}")]
    Api { status: u16, message: String },
}

#[async_trait]
pub trait SheetsService: Send + Sync {
    /// Appends one row to columns A–H and returns the provider's update summary.
    async fn append_row(&self, row: &SheetRow) -> Result<AppendValuesResponse, SheetError>;
}

/// Undoes the damage a PEM key picks up when squeezed into one `.env` line:
/// surrounding quotes, a trailing JSON comma, and `\n` escapes.
pub fn normalize_private_key(raw: &str) -> String {
    let mut key = raw.trim();

    if let Some(rest) = key.strip_prefix('"') {
        key = rest;
    }

    if let Some(rest) = key.strip_suffix("\",") {
        key = rest;
    } else if let Some(rest) = key.strip_suffix('"') {
        key = rest;
    }

    key.replace("\\n", "\n").trim().to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceAccountClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub struct GoogleSheetsService {
    http: reqwest::Client,
    client_email: String,
    encoding_key: EncodingKey,
    spreadsheet_id: String,
    sheet_name: String,
    token_uri: String,
    api_base: String,
}

impl GoogleSheetsService {
    /// Fails before any network traffic when credentials are missing or the
    /// private key cannot be parsed.
    pub fn new(config: &SheetsConfig) -> Result<Self, SheetError> {
        let account = config.service_account()?;
        let private_key = normalize_private_key(&account.private_key);
        let encoding_key =
            EncodingKey::from_rsa_pem(private_key.as_bytes()).map_err(SheetError::InvalidKey)?;

        info!(
            "📊 Google Sheets: spreadsheet={} sheet={} (as {})",
            account.spreadsheet_id, config.sheet_name, account.client_email
        );

        Ok(Self {
            http: reqwest::Client::new(),
            client_email: account.client_email,
            encoding_key,
            spreadsheet_id: account.spreadsheet_id,
            sheet_name: config.sheet_name.clone(),
            token_uri: GOOGLE_TOKEN_URI.to_string(),
            api_base: SHEETS_API_BASE.to_string(),
        })
    }

    /// Points the client at alternative OAuth and Sheets hosts.
    pub fn with_endpoints(mut self, token_uri: impl Into<String>, api_base: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// A1 range covering the eight row columns, e.g. `Sheet1!A:H`.
    pub fn range(&self) -> String {
        format!("{}!A:H", self.sheet_name)
    }

    pub fn append_url(&self) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}:append?valueInputOption=USER_ENTERED",
            self.api_base,
            utf8_percent_encode(&self.spreadsheet_id, NON_ALPHANUMERIC),
            utf8_percent_encode(&self.range(), NON_ALPHANUMERIC)
        )
    }

    fn signed_assertion(&self) -> Result<String, SheetError> {
        let iat = Utc::now().timestamp();
        let claims = ServiceAccountClaims {
            iss: self.client_email.clone(),
            scope: SHEETS_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(SheetError::InvalidKey)
    }

    async fn access_token(&self) -> Result<String, SheetError> {
        let assertion = self.signed_assertion()?;
        let form = serde_urlencoded::to_string(&[
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ])
        .map_err(|e| SheetError::Auth(e.to_string()))?;

        let res = self
            .http
            .post(&self.token_uri)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(form)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => format!("{} {}", status, body),
            };
            return Err(SheetError::Auth(message));
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| SheetError::Auth(e.to_string()))?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl SheetsService for GoogleSheetsService {
    async fn append_row(&self, row: &SheetRow) -> Result<AppendValuesResponse, SheetError> {
        let result: Result<AppendValuesResponse, SheetError> = async {
            let token = self.access_token().await?;
            debug!("🔑 Obtained Google access token");

            let res = self
                .http
                .post(self.append_url())
                .bearer_auth(token)
                .json(&json!({ "values": [row.cells()] }))
                .send()
                .await?;

            let status = res.status();
            if !status.is_success() {
                let body = res.text().await?;
                let message = serde_json::from_str::<ApiErrorBody>(&body)
                    .map(|b| b.error.message)
                    .unwrap_or(body);
                return Err(SheetError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            Ok(res.json::<AppendValuesResponse>().await?)
        }
        .await;

        match &result {
            Ok(response) => info!(
                "{} cells appended.",
                response.updates.updated_cells.unwrap_or_default()
            ),
            Err(e) => error!("❌ Error appending to sheet: {}", e),
        }

        result
    }
}
