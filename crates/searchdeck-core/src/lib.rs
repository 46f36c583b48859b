pub mod analytics;
pub mod config;
pub mod error;
pub mod export;
pub mod intent;
pub mod layout;
pub mod reconcile;
pub mod report;
pub mod timerange;
