pub mod api;
pub mod config;
pub mod date_utils;
