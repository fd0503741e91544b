//! AgriGuru HTTP server: configuration and API surface

pub mod api;
pub mod config;
