pub mod app;
pub mod cache;
pub mod config;
pub mod export;
pub mod importers;
pub mod legacy;
pub mod logs;
pub mod model;
pub mod overlay;
pub mod persist;
pub mod state;
pub mod store;
pub mod timeline;
pub mod views;
