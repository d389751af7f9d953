pub mod config;
pub mod dossiers;
pub mod error;
pub mod telemetry;
