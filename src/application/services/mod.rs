pub mod analysis_service;
pub mod execution_service;
pub mod monitor_service;
