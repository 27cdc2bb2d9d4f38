// Shared roster and rotation library used by the API

pub mod config;
pub mod db;
pub mod errors;
pub mod import_export;
pub mod models;
pub mod planning;
pub mod rotation;
pub mod telemetry;
