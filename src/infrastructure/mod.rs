pub mod sheets;
pub mod storage;
