pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod geocoding;
pub mod models;
pub mod services;
pub mod state;
pub mod stats;
