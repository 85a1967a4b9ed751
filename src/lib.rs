pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod db;
pub mod models;
pub mod scrape;
pub mod service;
pub mod workers;
