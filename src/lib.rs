pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod insight;
pub mod llm;
pub mod metrics;
pub mod models;
pub mod session;
