// Public API for integration tests and the server binary

pub mod api;
pub mod catalog;
pub mod config;
pub mod export;
pub mod state;
pub mod store;
pub mod types;
