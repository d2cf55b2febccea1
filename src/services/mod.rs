pub mod image_upload;
pub mod sheets;
pub mod storage;
