// Fusion JWT client - library root for testing

pub mod auth;
pub mod config;
pub mod error;
pub mod query;
