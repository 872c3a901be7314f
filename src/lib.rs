pub mod catalog;
pub mod ddl;
pub mod error;
pub mod exporter;
pub mod monitoring;
pub mod seed_check;
pub mod types;
