pub mod config;
pub mod host;
pub mod logging;
pub mod report;
pub mod update;
