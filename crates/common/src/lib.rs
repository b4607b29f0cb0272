pub mod config;
pub mod error;
pub mod explorer;
pub mod observability;
pub mod types;
