// src/lib.rs

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod remote;
pub mod services;

pub use config::{AppState, Config};
pub use handlers::router;
