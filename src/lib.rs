pub mod config;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod models;
pub mod output;
pub mod sources;
pub mod summary;
pub mod table;
pub mod validate;
