pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod ratelimit;
pub mod rating;
pub mod telemetry;
