use crate::config::SheetsConfig;
use crate::services::sheets::{GoogleSheetsService, SheetError};
use std::sync::Arc;

pub fn setup_sheets(config: &SheetsConfig) -> Result<Arc<GoogleSheetsService>, SheetError> {
    let service = GoogleSheetsService::new(config)?;
    tracing::info!("✅ Google Sheets client ready (range {})", service.range());
    Ok(Arc::new(service))
}
