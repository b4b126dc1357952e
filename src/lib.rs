// Library exports for Gazette
// Integration tests drive the router through these modules

pub mod auth;
pub mod blog;
pub mod cache;
pub mod config;
pub mod db;
pub mod display;
pub mod error;
pub mod events;
pub mod extractors;
pub mod filters;
pub mod forms;
pub mod media;
pub mod pagination;
pub mod routes;
pub mod state;
