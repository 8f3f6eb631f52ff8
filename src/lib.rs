pub mod api;
pub mod app;
pub mod config;
pub mod recorder;
pub mod storage;
#[cfg(feature = "desktop")]
pub mod ui;
