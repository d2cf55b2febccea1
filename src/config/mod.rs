use std::env;
use thiserror::Error;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";
pub const DEFAULT_PORT: u16 = 3000;
/// Maximum accepted request body: 10 MB
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// S3 storage configuration
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket: Option<String>,
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, localstack)
    pub endpoint_url: Option<String>,
}

/// Google Sheets service-account configuration
#[derive(Debug, Clone, Default)]
pub struct SheetsConfig {
    pub service_account: Option<String>,
    pub private_key: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub sheet_name: String,
}

/// Validated S3 credentials.
#[derive(Debug, Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
}

/// Validated Google service-account settings.
#[derive(Debug, Clone)]
pub struct ServiceAccount {
    pub client_email: String,
    /// Raw key as configured; see `services::sheets::normalize_private_key`
    pub private_key: String,
    pub spreadsheet_id: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub sheets: SheetsConfig,

    /// HTTP listen port (default: 3000)
    pub port: u16,

    /// Request body ceiling in bytes (default: 10 MB)
    pub max_body_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                region: DEFAULT_REGION.to_string(),
                ..Default::default()
            },
            sheets: SheetsConfig {
                sheet_name: DEFAULT_SHEET_NAME.to_string(),
                ..Default::default()
            },
            port: DEFAULT_PORT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// Reads a variable, treating empty values as unset.
fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            storage: StorageConfig {
                access_key_id: non_empty("AWS_ACCESS_KEY_ID"),
                secret_access_key: non_empty("AWS_SECRET_ACCESS_KEY"),
                bucket: non_empty("AWS_S3_BUCKET_NAME"),
                region: non_empty("AWS_REGION").unwrap_or(default.storage.region),
                endpoint_url: non_empty("AWS_ENDPOINT_URL"),
            },

            sheets: SheetsConfig {
                service_account: non_empty("GOOGLE_SHEETS_SERVICE_ACCOUNT"),
                private_key: non_empty("GOOGLE_SHEETS_PRIVATE_KEY"),
                spreadsheet_id: non_empty("SPREADSHEET_ID"),
                sheet_name: non_empty("SHEET_NAME").unwrap_or(default.sheets.sheet_name),
            },

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            max_body_size: env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_body_size),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<&'static str> = [
            ("AWS_ACCESS_KEY_ID", &self.access_key_id),
            ("AWS_SECRET_ACCESS_KEY", &self.secret_access_key),
            ("AWS_S3_BUCKET_NAME", &self.bucket),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }

    pub fn credentials(&self) -> Result<S3Credentials, ConfigError> {
        self.validate()?;
        Ok(S3Credentials {
            access_key_id: self.access_key_id.clone().unwrap_or_default(),
            secret_access_key: self.secret_access_key.clone().unwrap_or_default(),
            bucket: self.bucket.clone().unwrap_or_default(),
        })
    }
}

impl SheetsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<&'static str> = [
            ("GOOGLE_SHEETS_SERVICE_ACCOUNT", &self.service_account),
            ("GOOGLE_SHEETS_PRIVATE_KEY", &self.private_key),
            ("SPREADSHEET_ID", &self.spreadsheet_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }

    pub fn service_account(&self) -> Result<ServiceAccount, ConfigError> {
        self.validate()?;
        Ok(ServiceAccount {
            client_email: self.service_account.clone().unwrap_or_default(),
            private_key: self.private_key.clone().unwrap_or_default(),
            spreadsheet_id: self.spreadsheet_id.clone().unwrap_or_default(),
        })
    }
}
