/// Database model definitions.
pub mod models;
/// Score and description storage backends.
pub mod score_store;
/// Storage abstraction layer for database operations.
pub mod storage;
