pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod router;
pub mod services;
pub mod state;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use router::app;
pub use state::AppState;
