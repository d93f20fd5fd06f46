pub mod cluster;
pub mod config;
pub mod constants;
pub mod eks;
pub mod inventory;
pub mod kubernetes;
pub mod response;
pub mod telemetry;
